use crate::config::SweepConfig;
use crate::driver::StreamDriver;
use crate::error::{Result, SweepError};
use crate::events::{SweepCommand, SweepEvent};
use bno055::{PortConfig, SerialLineTransport};
use imu_traits::{ImuError, LineTransport};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Runs a [`StreamDriver`] on a background thread.
///
/// The thread owns the transport and all tracking state. Commands go in
/// over one channel and [`SweepEvent`]s come back over another.
pub struct SweepReader {
    events: mpsc::Receiver<SweepEvent>,
    command_tx: mpsc::Sender<SweepCommand>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<Result<()>>>,
}

impl SweepReader {
    /// Opens the serial port on the reading thread and starts calibrating.
    pub fn new(port: &PortConfig, config: SweepConfig) -> Result<Self> {
        let port = port.clone();
        Self::start_reading_thread(move || SerialLineTransport::open(&port), config)
    }

    /// Starts the reading thread over an already opened transport.
    pub fn with_transport<T>(transport: T, config: SweepConfig) -> Result<Self>
    where
        T: LineTransport + Send + 'static,
    {
        Self::start_reading_thread(move || Ok(transport), config)
    }

    fn start_reading_thread<T, F>(open: F, config: SweepConfig) -> Result<Self>
    where
        T: LineTransport + Send + 'static,
        F: FnOnce() -> std::result::Result<T, ImuError> + Send + 'static,
    {
        config.validate()?;

        let (event_tx, events) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let (init_tx, init_rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::spawn(move || -> Result<()> {
            // Open the transport inside the thread and report back
            let transport = match open() {
                Ok(transport) => transport,
                Err(e) => {
                    let message = e.to_string();
                    let _ = init_tx.send(Err(e));
                    return Err(SweepError::Transport(ImuError::DeviceError(message)));
                }
            };

            let mut driver = match StreamDriver::new(transport, config, event_tx) {
                Ok(driver) => driver.with_running_flag(thread_running),
                Err(e) => {
                    let _ = init_tx.send(Err(ImuError::ConfigurationError(e.to_string())));
                    return Err(e);
                }
            };
            let _ = init_tx.send(Ok(()));

            debug!("Sweep reading thread started");
            let result = driver.run(&command_rx);
            debug!("Sweep reading thread exiting");
            result
        });

        // Wait for initialization result before returning
        init_rx
            .recv()
            .map_err(|e| SweepError::Transport(ImuError::from(e)))?
            .map_err(SweepError::Transport)?;

        Ok(SweepReader {
            events,
            command_tx,
            running,
            handle: Some(handle),
        })
    }

    pub fn send(&self, command: SweepCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| SweepError::Transport(ImuError::from(e)))
    }

    /// A sender for issuing commands from another thread.
    pub fn command_sender(&self) -> mpsc::Sender<SweepCommand> {
        self.command_tx.clone()
    }

    pub fn start_calibration(&self) -> Result<()> {
        self.send(SweepCommand::StartCalibration)
    }

    pub fn start_mapping(&self) -> Result<()> {
        self.send(SweepCommand::StartMapping)
    }

    pub fn stop_mapping(&self) -> Result<()> {
        self.send(SweepCommand::StopMapping)
    }

    pub fn start_live(&self) -> Result<()> {
        self.send(SweepCommand::StartLive)
    }

    pub fn stop_live(&self) -> Result<()> {
        self.send(SweepCommand::StopLive)
    }

    pub fn events(&self) -> &mpsc::Receiver<SweepEvent> {
        &self.events
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_event(&self, timeout: Duration) -> Option<SweepEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Asks the reading thread to stop. Blocking reads finish first.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.command_tx.send(SweepCommand::Stop);
    }

    /// Stops the reading thread and waits for its outcome.
    pub fn join(mut self) -> Result<()> {
        self.stop();
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                Err(SweepError::Transport(ImuError::DeviceError(
                    "reading thread panicked".to_string(),
                )))
            }),
            None => Ok(()),
        }
    }
}

impl Drop for SweepReader {
    fn drop(&mut self) {
        self.stop();
    }
}
