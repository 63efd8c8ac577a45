//! Home pose calibration.
//!
//! The sensor is held still while a fixed number of raw records is read.
//! The first `warmup_count` records are thrown away (the bridge board and
//! the serial buffer take a moment to settle); the rest are averaged into
//! the [`HomeReference`] that later readings are measured against.

use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use bno055::LineParser;
use imu_traits::{Float, ImuError, LineTransport, Sample, Vector3, SAMPLE_WIDTH};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Zero point of the tracked pose: mean angles and accelerations at rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomeReference {
    values: [Float; SAMPLE_WIDTH],
}

impl HomeReference {
    pub fn new(values: [Float; SAMPLE_WIDTH]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> [Float; SAMPLE_WIDTH] {
        self.values
    }

    pub fn angles(&self) -> Vector3 {
        Vector3::new(self.values[0], self.values[1], self.values[2])
    }

    pub fn acceleration(&self) -> Vector3 {
        Vector3::new(self.values[3], self.values[4], self.values[5])
    }

    /// Expresses a sample relative to home, element by element.
    pub fn relative(&self, sample: &Sample) -> Sample {
        Sample::from_parts(
            sample.seq,
            sample.angles() - self.angles(),
            sample.acceleration() - self.acceleration(),
        )
    }
}

/// State of one calibration run.
///
/// Sums are kept in `f64` so long runs do not lose precision.
#[derive(Debug, Clone)]
pub struct Calibrator {
    warmup_count: usize,
    required: usize,
    settle_delay: Duration,
    collected: usize,
    angle_sum: [f64; 3],
    acc_sum: [f64; 3],
}

impl Calibrator {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            warmup_count: config.warmup_count,
            required: config.calibration_samples(),
            settle_delay: config.settle_delay,
            collected: 0,
            angle_sum: [0.0; 3],
            acc_sum: [0.0; 3],
        }
    }

    /// Adds one raw sample. Samples beyond the budget are ignored.
    pub fn add(&mut self, sample: &Sample) {
        if self.is_complete() {
            return;
        }
        self.collected += 1;
        if self.collected <= self.warmup_count {
            return;
        }

        let angles = sample.angles().to_array();
        let acc = sample.acceleration().to_array();
        for i in 0..3 {
            self.angle_sum[i] += f64::from(angles[i]);
            self.acc_sum[i] += f64::from(acc[i]);
        }
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn is_complete(&self) -> bool {
        self.collected >= self.required
    }

    /// Completion in percent, 0 through 100.
    pub fn progress(&self) -> u8 {
        if self.required == 0 {
            return 100;
        }
        ((self.collected.min(self.required) * 100) / self.required) as u8
    }

    /// Computes the home reference. Fails unless the full budget was collected.
    pub fn finish(self) -> Result<HomeReference> {
        let averaged = self.collected.saturating_sub(self.warmup_count);
        if !self.is_complete() || averaged == 0 {
            return Err(SweepError::CalibrationAborted {
                collected: self.collected,
                required: self.required,
            });
        }

        let n = averaged as f64;
        let angles = self.angle_sum.map(|s| (s / n) as Float);
        let acc = self.acc_sum.map(|s| (s / n) as Float);
        Ok(HomeReference::new([
            angles[0], angles[1], angles[2], acc[0], acc[1], acc[2],
        ]))
    }

    /// Reads raw records from `transport` until the budget is met.
    ///
    /// Stale data is flushed first. `on_progress` is called whenever the
    /// completion percentage changes. Clearing `running`, or the stream
    /// ending, aborts the run without producing a reference.
    pub fn run_calibration<T, F>(
        mut self,
        transport: &mut T,
        parser: &mut LineParser,
        running: &AtomicBool,
        mut on_progress: F,
    ) -> Result<HomeReference>
    where
        T: LineTransport + ?Sized,
        F: FnMut(u8),
    {
        info!(
            "Calibrating: collecting {} samples ({} warm-up)",
            self.required, self.warmup_count
        );

        thread::sleep(self.settle_delay);
        transport.clear_buffers()?;
        debug!("Transport buffers cleared");

        let mut reported = self.progress();
        on_progress(reported);

        while !self.is_complete() {
            if !running.load(Ordering::SeqCst) {
                info!("Calibration cancelled");
                return Err(self.aborted());
            }

            let line = match transport.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => continue,
                Err(ImuError::Disconnected) => {
                    info!("Stream ended during calibration");
                    return Err(self.aborted());
                }
                Err(e) => return Err(e.into()),
            };

            // Malformed records were already logged by the parser.
            if let Ok(Some(sample)) = parser.parse(&line) {
                self.add(&sample);
                let progress = self.progress();
                if progress != reported {
                    reported = progress;
                    on_progress(progress);
                }
            }
        }

        let home = self.finish()?;
        info!(
            "Calibration complete: home angles {}, acceleration {}",
            home.angles(),
            home.acceleration()
        );
        Ok(home)
    }

    fn aborted(&self) -> SweepError {
        SweepError::CalibrationAborted {
            collected: self.collected,
            required: self.required,
        }
    }
}
