pub mod line;
pub mod transport;

pub use imu_traits::{Float, ImuError, LineTransport, Sample, Vector3, SAMPLE_WIDTH};
pub use line::{format_line, parse_line, LineParser, ParseError, RECORD_MARKER};
pub use transport::{PortConfig, ScriptedRead, ScriptedTransport, SerialLineTransport};
