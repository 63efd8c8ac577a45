use crate::calibrator::HomeReference;
use crate::coverage::{CoverageState, Extremes};
use imu_traits::Vector3;

/// Commands accepted by a running [`crate::StreamDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepCommand {
    /// Re-run calibration; the new home replaces the old one.
    StartCalibration,
    StartMapping,
    /// Finish the mapping sweep and compute its extremes.
    StopMapping,
    StartLive,
    StopLive,
    Stop,
}

/// Progress reported by the reading loop to whoever presents it.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepEvent {
    CalibrationStarted,
    /// Calibration completion, 0 through 100 percent.
    CalibrationProgress(u8),
    CalibrationComplete(HomeReference),
    /// Latest windowed home-relative angles.
    Angles(Vector3),
    MappingStarted,
    ExtremesComputed(Extremes),
    LiveStarted,
    Coverage(CoverageState),
    /// Every axis reached both mapped extremes; the live sweep is over.
    CoverageComplete,
    /// A marked line could not be decoded and was skipped.
    LineRejected(String),
    /// A command could not be carried out in the current state.
    Rejected {
        command: SweepCommand,
        reason: String,
    },
    Stopped,
    Failed(String),
}
