//! Timed acquisition of a single-value distance stream (time-of-flight
//! verification runs).
//!
//! The sensor sends one number per line. Readings go through the same
//! rolling window as the IMU stream and the window means are collected
//! until the measurement time runs out.

use crate::averager::RollingAverager;
use crate::config::SweepConfig;
use crate::error::Result;
use imu_traits::{Float, LineTransport};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Parses a distance line; anything but a single finite number is `None`.
pub fn parse_distance(line: &str) -> Option<Float> {
    line.trim()
        .parse::<Float>()
        .ok()
        .filter(|distance| distance.is_finite())
}

/// Result row of one run: setup parameters followed by every window mean.
pub fn distance_row(distance: Float, angle: Float, averages: &[Float]) -> Vec<Float> {
    let mut row = Vec::with_capacity(averages.len() + 2);
    row.push(distance);
    row.push(angle);
    row.extend_from_slice(averages);
    row
}

#[derive(Debug, Clone)]
pub struct DistanceAcquisition {
    window_size: usize,
    sample_delay: usize,
    settle_delay: Duration,
    measurement_time: Duration,
    max_samples: Option<usize>,
}

impl DistanceAcquisition {
    pub fn new(config: &SweepConfig, measurement_time: Duration) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window_size: config.window_size,
            sample_delay: config.sample_delay,
            settle_delay: config.settle_delay,
            measurement_time,
            max_samples: None,
        })
    }

    /// Also stop after this many accepted readings.
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = Some(max_samples);
        self
    }

    /// Reads until the measurement time (or sample limit) is reached and
    /// returns the window means in arrival order.
    pub fn run<T>(&self, transport: &mut T, running: &AtomicBool) -> Result<Vec<Float>>
    where
        T: LineTransport + ?Sized,
    {
        thread::sleep(self.settle_delay);
        transport.clear_buffers()?;

        let mut averager = RollingAverager::<1>::new(self.window_size, self.sample_delay);
        let mut averages = Vec::new();
        let mut accepted = 0;
        let deadline = Instant::now() + self.measurement_time;

        while Instant::now() < deadline && running.load(Ordering::SeqCst) {
            if self.max_samples.is_some_and(|max| accepted >= max) {
                break;
            }

            let line = match transport.read_line()? {
                Some(line) => line,
                None => continue,
            };
            let distance = match parse_distance(&line) {
                Some(distance) => distance,
                None => {
                    warn!("Skipping non-numeric distance line {:?}", line);
                    continue;
                }
            };
            accepted += 1;

            if let Some([avg]) = averager.push([distance]) {
                debug!("Rolling avg: {:.3}", avg);
                averages.push(avg);
            }
        }

        info!(
            "Distance acquisition finished: {} readings, {} averages",
            accepted,
            averages.len()
        );
        Ok(averages)
    }
}
