use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::ops::Sub;
use std::sync::mpsc;

#[cfg(feature = "high_precision")]
pub type Float = f64;
#[cfg(not(feature = "high_precision"))]
pub type Float = f32;

// --- Basic Types ---
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Vector3 {
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [Float; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[Float; 3]> for Vector3 {
    fn from(v: [Float; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3(x={}, y={}, z={})", self.x, self.y, self.z)
    }
}

/// Number of values carried by one [`Sample`]: three angles, three accelerations.
pub const SAMPLE_WIDTH: usize = 6;

/// One combined orientation + acceleration reading.
///
/// Layout is `[angle_x, angle_y, angle_z, acc_x, acc_y, acc_z]`; angles in
/// degrees, accelerations in m/s². `seq` increases by one per accepted line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub seq: u64,
    pub values: [Float; SAMPLE_WIDTH],
}

impl Sample {
    pub fn new(seq: u64, values: [Float; SAMPLE_WIDTH]) -> Self {
        Self { seq, values }
    }

    pub fn from_parts(seq: u64, angles: Vector3, acceleration: Vector3) -> Self {
        Self::new(
            seq,
            [
                angles.x,
                angles.y,
                angles.z,
                acceleration.x,
                acceleration.y,
                acceleration.z,
            ],
        )
    }

    pub fn angles(&self) -> Vector3 {
        Vector3::new(self.values[0], self.values[1], self.values[2])
    }

    pub fn acceleration(&self) -> Vector3 {
        Vector3::new(self.values[3], self.values[4], self.values[5])
    }
}

// --- Standard Error Type ---
#[derive(Debug)]
pub enum ImuError {
    /// Error originating from the underlying device (opening the port, IO)
    DeviceError(String),
    /// Error reading data from the device
    ReadError(String),
    /// Error writing to or flushing the device
    WriteError(String),
    /// Error during device configuration or setup
    ConfigurationError(String),
    /// The device went away mid-session
    Disconnected,
    /// Error sending a command to the reader thread
    CommandSendError(String),
}

impl fmt::Display for ImuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImuError::DeviceError(s) => write!(f, "Device error: {}", s),
            ImuError::ReadError(s) => write!(f, "Read error: {}", s),
            ImuError::WriteError(s) => write!(f, "Write error: {}", s),
            ImuError::ConfigurationError(s) => write!(f, "Configuration error: {}", s),
            ImuError::Disconnected => write!(f, "Device disconnected"),
            ImuError::CommandSendError(s) => write!(f, "Command send error: {}", s),
        }
    }
}

impl StdError for ImuError {}

impl From<io::Error> for ImuError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::UnexpectedEof => ImuError::Disconnected,
            _ => ImuError::DeviceError(err.to_string()),
        }
    }
}

#[cfg(feature = "std")]
impl From<serialport::Error> for ImuError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => ImuError::Disconnected,
            serialport::ErrorKind::InvalidInput => ImuError::ConfigurationError(err.to_string()),
            _ => ImuError::DeviceError(err.to_string()),
        }
    }
}

impl<T> From<mpsc::SendError<T>> for ImuError {
    fn from(err: mpsc::SendError<T>) -> Self {
        ImuError::CommandSendError(err.to_string())
    }
}

impl From<mpsc::RecvError> for ImuError {
    fn from(err: mpsc::RecvError) -> Self {
        ImuError::CommandSendError(err.to_string())
    }
}

/// A line-oriented byte channel to an IMU (serial port, replay file, test script).
///
/// Implementations own their read timeout: a read that times out without a
/// complete line returns `Ok(None)`, which is not an error.
pub trait LineTransport {
    /// Reads the next complete line, without its terminator.
    fn read_line(&mut self) -> Result<Option<String>, ImuError>;

    /// Drops anything received but not yet read, and anything queued for output.
    fn clear_buffers(&mut self) -> Result<(), ImuError>;

    fn close(&mut self) -> Result<(), ImuError>;
}

impl<T: LineTransport + ?Sized> LineTransport for Box<T> {
    fn read_line(&mut self) -> Result<Option<String>, ImuError> {
        (**self).read_line()
    }

    fn clear_buffers(&mut self) -> Result<(), ImuError> {
        (**self).clear_buffers()
    }

    fn close(&mut self) -> Result<(), ImuError> {
        (**self).close()
    }
}
