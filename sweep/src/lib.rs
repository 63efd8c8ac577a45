//! Home calibration and sweep coverage tracking for a BNO055 line stream.
//!
//! Lines from a [`LineTransport`] are parsed into [`Sample`]s, calibrated
//! against a [`HomeReference`], smoothed by a [`RollingAverager`] and handed
//! to a [`CoverageTracker`]. [`StreamDriver`] runs that pipeline in the
//! calling thread; [`SweepReader`] runs it in the background.

pub mod acquisition;
pub mod averager;
pub mod calibrator;
pub mod config;
pub mod coverage;
pub mod driver;
pub mod error;
pub mod events;
pub mod export;
pub mod reader;

pub use acquisition::{distance_row, parse_distance, DistanceAcquisition};
pub use averager::RollingAverager;
pub use calibrator::{Calibrator, HomeReference};
pub use config::SweepConfig;
pub use coverage::{Axis, AxisExtremes, CoverageState, CoverageTracker, Extremes, Indicator};
pub use driver::{Mode, StreamDriver, WindowedAverage};
pub use error::{Result, SweepError};
pub use events::{SweepCommand, SweepEvent};
pub use export::{extremes_row, home_row, CsvRowSink, RowSink};
pub use imu_traits::{Float, ImuError, LineTransport, Sample, Vector3};
pub use reader::SweepReader;
