pub use bno055::{
    format_line, parse_line, LineParser, ParseError, PortConfig, ScriptedRead, ScriptedTransport,
    SerialLineTransport,
};
pub use imu_traits::*;
pub use sweep;
pub use sweep::{
    CoverageTracker, HomeReference, StreamDriver, SweepCommand, SweepConfig, SweepError,
    SweepEvent, SweepReader,
};
