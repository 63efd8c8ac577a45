use imu_traits::{ImuError, LineTransport};
use log::{debug, info};
use serialport::{ClearBuffer, SerialPort};
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader};
use std::time::Duration;

pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct PortConfig {
    pub device: String,
    pub baud_rate: u32,
    /// A read that sees no complete line within this window returns nothing.
    pub read_timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Line reader over a serial port.
pub struct SerialLineTransport {
    reader: Option<BufReader<Box<dyn SerialPort>>>,
    // Bytes of a line whose terminator has not arrived yet.
    pending: Vec<u8>,
}

impl SerialLineTransport {
    pub fn open(config: &PortConfig) -> Result<Self, ImuError> {
        if config.baud_rate == 0 {
            return Err(ImuError::ConfigurationError(
                "baud rate must be non-zero".to_string(),
            ));
        }

        let port = serialport::new(&config.device, config.baud_rate)
            .timeout(config.read_timeout)
            .open()?;
        info!(
            "Opened {} at {} baud (timeout {:?})",
            config.device, config.baud_rate, config.read_timeout
        );

        Ok(SerialLineTransport {
            reader: Some(BufReader::new(port)),
            pending: Vec::with_capacity(128),
        })
    }

    fn reader(&mut self) -> Result<&mut BufReader<Box<dyn SerialPort>>, ImuError> {
        self.reader.as_mut().ok_or(ImuError::Disconnected)
    }
}

impl LineTransport for SerialLineTransport {
    fn read_line(&mut self) -> Result<Option<String>, ImuError> {
        let mut pending = std::mem::take(&mut self.pending);
        let result = self.reader()?.read_until(b'\n', &mut pending);

        match result {
            Ok(0) => {
                self.pending = pending;
                Err(ImuError::Disconnected)
            }
            Ok(_) if pending.ends_with(b"\n") => {
                let line = String::from_utf8_lossy(&pending)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                Ok(Some(line))
            }
            Ok(_) => {
                // Partial line without terminator; keep it for the next call.
                self.pending = pending;
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                self.pending = pending;
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                self.pending = pending;
                Ok(None)
            }
            Err(e) => Err(ImuError::from(e)),
        }
    }

    fn clear_buffers(&mut self) -> Result<(), ImuError> {
        let reader = self.reader()?;
        let buffered = reader.buffer().len();
        reader.consume(buffered);
        reader
            .get_ref()
            .clear(ClearBuffer::All)
            .map_err(|e| ImuError::WriteError(e.to_string()))?;
        self.pending.clear();
        debug!("Discarded {} buffered bytes", buffered);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ImuError> {
        if self.reader.take().is_some() {
            debug!("Serial port closed");
        }
        self.pending.clear();
        Ok(())
    }
}

/// One scripted outcome of [`ScriptedTransport::read_line`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedRead {
    Line(String),
    Timeout,
    Fail(String),
}

/// In-memory transport that replays a fixed script of reads.
///
/// Once the script runs out the transport reports [`ImuError::Disconnected`],
/// just like a serial port whose cable was pulled.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: VecDeque<ScriptedRead>,
    clears: usize,
    closed: bool,
}

impl ScriptedTransport {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = ScriptedRead>,
    {
        Self {
            script: script.into_iter().collect(),
            clears: 0,
            closed: false,
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(|l| ScriptedRead::Line(l.into())))
    }

    /// Replays a capture, such as the output of `read_bno055`, line by line.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ImuError> {
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_lines(lines))
    }

    pub fn push(&mut self, read: ScriptedRead) {
        self.script.push_back(read);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// How many times `clear_buffers` was called.
    pub fn clears(&self) -> usize {
        self.clears
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl LineTransport for ScriptedTransport {
    fn read_line(&mut self) -> Result<Option<String>, ImuError> {
        if self.closed {
            return Err(ImuError::Disconnected);
        }
        match self.script.pop_front() {
            Some(ScriptedRead::Line(line)) => Ok(Some(line)),
            Some(ScriptedRead::Timeout) => Ok(None),
            Some(ScriptedRead::Fail(reason)) => Err(ImuError::ReadError(reason)),
            None => Err(ImuError::Disconnected),
        }
    }

    fn clear_buffers(&mut self) -> Result<(), ImuError> {
        self.clears += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ImuError> {
        self.closed = true;
        Ok(())
    }
}
