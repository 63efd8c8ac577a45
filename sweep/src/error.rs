use crate::coverage::Axis;
use bno055::ParseError;
use imu_traits::ImuError;
use thiserror::Error;

/// Errors produced while calibrating and tracking a sweep.
#[derive(Error, Debug)]
pub enum SweepError {
    /// A marked record could not be decoded. Callers skip the line.
    #[error("malformed record: {0}")]
    Parse(#[from] ParseError),

    /// The stream ended or was cancelled before the calibration budget was met.
    #[error("calibration aborted after {collected} of {required} samples")]
    CalibrationAborted {
        /// Samples gathered before the stream stopped.
        collected: usize,
        /// Samples the calibration run needed.
        required: usize,
    },

    /// Transport failure; fatal to the current run.
    #[error("transport error: {0}")]
    Transport(#[from] ImuError),

    /// The axis samples fit none of the wraparound conventions.
    #[error("no well-defined extremes on the {axis} axis")]
    DegenerateAxis {
        /// The offending axis.
        axis: Axis,
    },

    /// Live checking was requested before any extremes were mapped.
    #[error("no mapped extremes to check coverage against")]
    NoExtremes,

    /// Configuration validation failure.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Row export failure.
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;
