//! The reading loop.
//!
//! [`StreamDriver`] owns the transport and every piece of model state. It
//! pulls lines one at a time, turns them into home-relative windowed
//! averages and feeds those to the coverage tracker according to the
//! current [`Mode`]. Results leave the loop only as [`SweepEvent`] values.

use crate::averager::RollingAverager;
use crate::calibrator::{Calibrator, HomeReference};
use crate::config::SweepConfig;
use crate::coverage::{CoverageTracker, Extremes};
use crate::error::Result;
use crate::events::{SweepCommand, SweepEvent};
use bno055::LineParser;
use imu_traits::{Float, LineTransport, Sample, SAMPLE_WIDTH};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;

/// Mean of the rolling window: three angles followed by three accelerations.
pub type WindowedAverage = [Float; SAMPLE_WIDTH];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Angles are reported but not recorded.
    Tracking,
    /// Windowed angles are recorded into a mapping sweep.
    Mapping,
    /// Windowed angles are checked against the mapped extremes.
    ///
    /// Full coverage emits `CoverageComplete` and drops back to `Tracking`.
    /// The loop itself keeps reading; stopping is left to the caller.
    Live,
}

pub struct StreamDriver<T: LineTransport> {
    transport: T,
    config: SweepConfig,
    parser: LineParser,
    averager: RollingAverager<SAMPLE_WIDTH>,
    tracker: CoverageTracker,
    home: Option<HomeReference>,
    mode: Mode,
    events: Sender<SweepEvent>,
    running: Arc<AtomicBool>,
}

impl<T: LineTransport> StreamDriver<T> {
    pub fn new(transport: T, config: SweepConfig, events: Sender<SweepEvent>) -> Result<Self> {
        config.validate()?;
        Ok(StreamDriver {
            transport,
            parser: LineParser::new(),
            averager: RollingAverager::new(config.window_size, config.sample_delay),
            tracker: CoverageTracker::new(),
            home: None,
            mode: Mode::Tracking,
            events,
            running: Arc::new(AtomicBool::new(true)),
            config,
        })
    }

    /// Replaces the cancellation flag, so that another thread can stop the loop.
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Flag checked on every iteration; clearing it stops the loop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn home(&self) -> Option<HomeReference> {
        self.home
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tracker(&self) -> &CoverageTracker {
        &self.tracker
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn emit(&self, event: SweepEvent) {
        if self.events.send(event).is_err() {
            debug!("No event listener left");
        }
    }

    fn reject(&self, command: SweepCommand, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("{:?} rejected: {}", command, reason);
        self.emit(SweepEvent::Rejected { command, reason });
    }

    /// Runs a calibration and installs the resulting home reference.
    ///
    /// On failure the previous reference, if any, stays in place.
    pub fn calibrate(&mut self) -> Result<HomeReference> {
        self.emit(SweepEvent::CalibrationStarted);

        let events = self.events.clone();
        let home = Calibrator::new(&self.config).run_calibration(
            &mut self.transport,
            &mut self.parser,
            &self.running,
            |progress| {
                let _ = events.send(SweepEvent::CalibrationProgress(progress));
            },
        )?;

        self.home = Some(home);
        self.averager.reset();
        self.mode = Mode::Tracking;
        self.emit(SweepEvent::CalibrationComplete(home));
        Ok(home)
    }

    pub fn start_mapping(&mut self) {
        if self.home.is_none() {
            self.reject(SweepCommand::StartMapping, "not calibrated");
            return;
        }
        info!("Mapping sweep started");
        self.tracker.start_mapping();
        self.mode = Mode::Mapping;
        self.emit(SweepEvent::MappingStarted);
    }

    /// Ends the mapping sweep. A degenerate sweep is reported and leaves the
    /// previously mapped extremes in place.
    pub fn stop_mapping(&mut self) -> Option<Extremes> {
        if self.mode != Mode::Mapping {
            self.reject(SweepCommand::StopMapping, "no mapping sweep in progress");
            return None;
        }
        self.mode = Mode::Tracking;

        let recorded = self.tracker.sweep_len();
        match self.tracker.finalize_extremes() {
            Ok(extremes) => {
                info!("Extremes computed from {} windowed samples", recorded);
                self.emit(SweepEvent::ExtremesComputed(extremes));
                Some(extremes)
            }
            Err(e) => {
                self.reject(SweepCommand::StopMapping, e.to_string());
                None
            }
        }
    }

    pub fn start_live(&mut self) {
        if let Err(e) = self.tracker.start_live() {
            self.reject(SweepCommand::StartLive, e.to_string());
            return;
        }
        info!("Live coverage sweep started");
        self.mode = Mode::Live;
        self.emit(SweepEvent::LiveStarted);
        self.emit(SweepEvent::Coverage(self.tracker.state()));
    }

    pub fn stop_live(&mut self) {
        if self.mode == Mode::Live {
            info!("Live coverage sweep stopped");
            self.mode = Mode::Tracking;
        }
    }

    /// Applies one command. Returns `false` once the loop should stop.
    pub fn handle_command(&mut self, command: SweepCommand) -> Result<bool> {
        debug!("Command: {:?}", command);
        match command {
            SweepCommand::StartCalibration => {
                self.calibrate()?;
            }
            SweepCommand::StartMapping => self.start_mapping(),
            SweepCommand::StopMapping => {
                self.stop_mapping();
            }
            SweepCommand::StartLive => self.start_live(),
            SweepCommand::StopLive => self.stop_live(),
            SweepCommand::Stop => return Ok(false),
        }
        Ok(true)
    }

    /// Reads and processes one line. Returns the windowed average when the
    /// line completed one.
    pub fn step(&mut self) -> Result<Option<WindowedAverage>> {
        let line = match self.transport.read_line()? {
            Some(line) => line,
            None => return Ok(None),
        };

        let sample = match self.parser.parse(&line) {
            Ok(Some(sample)) => sample,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.emit(SweepEvent::LineRejected(e.to_string()));
                return Ok(None);
            }
        };

        let relative = match &self.home {
            Some(home) => home.relative(&sample),
            None => sample,
        };

        let average = match self.averager.push(relative.values) {
            Some(average) => average,
            None => return Ok(None),
        };
        self.on_window(Sample::new(relative.seq, average))?;
        Ok(Some(average))
    }

    fn on_window(&mut self, window: Sample) -> Result<()> {
        let angles = window.angles();
        self.emit(SweepEvent::Angles(angles));

        match self.mode {
            Mode::Tracking => {}
            Mode::Mapping => self.tracker.record_sweep(angles),
            Mode::Live => {
                let (state, done) = self.tracker.check_live_sample(angles)?;
                self.emit(SweepEvent::Coverage(state));
                if done {
                    info!("Coverage complete at sample {}", window.seq);
                    self.mode = Mode::Tracking;
                    self.emit(SweepEvent::CoverageComplete);
                }
            }
        }
        Ok(())
    }

    /// Calibrates if needed, then processes lines and commands until
    /// stopped. The transport is closed on every exit path.
    pub fn run(&mut self, commands: &Receiver<SweepCommand>) -> Result<()> {
        let result = self.run_loop(commands);
        if let Err(e) = self.transport.close() {
            warn!("Failed to close transport: {}", e);
        }
        match &result {
            Ok(()) => info!("Reading loop stopped"),
            Err(e) => {
                error!("Reading loop failed: {}", e);
                self.emit(SweepEvent::Failed(e.to_string()));
            }
        }
        self.emit(SweepEvent::Stopped);
        result
    }

    fn run_loop(&mut self, commands: &Receiver<SweepCommand>) -> Result<()> {
        if self.home.is_none() {
            self.calibrate()?;
        }

        while self.running.load(Ordering::SeqCst) {
            loop {
                match commands.try_recv() {
                    Ok(command) => {
                        if !self.handle_command(command)? {
                            return Ok(());
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Ok(()),
                }
            }

            self.step()?;
        }
        Ok(())
    }
}
