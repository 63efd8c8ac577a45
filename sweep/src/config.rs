//! Tuning parameters for calibration and rolling-window smoothing.

use crate::error::{Result, SweepError};
use std::time::Duration;

/// Parameters of one tracking session.
///
/// The defaults match a BNO055 streaming at 100 Hz.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Records per second sent by the sensor.
    pub sampling_rate: usize,
    /// Number of vectors averaged by the rolling window.
    pub window_size: usize,
    /// Seconds of data averaged into the home reference.
    pub calibration_length: usize,
    /// Emit one windowed average every this many accepted samples.
    pub sample_delay: usize,
    /// Leading calibration samples discarded while the sensor settles.
    pub warmup_count: usize,
    /// Wait before flushing the transport so that stale data has arrived.
    pub settle_delay: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 100,
            window_size: 10,
            calibration_length: 3,
            sample_delay: 10,
            warmup_count: 100,
            settle_delay: Duration::from_millis(500),
        }
    }
}

impl SweepConfig {
    /// Total number of raw samples collected by one calibration run.
    pub fn calibration_samples(&self) -> usize {
        self.calibration_length * self.sampling_rate + self.warmup_count
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(SweepError::InvalidConfig(
                "window_size must be greater than 0".to_string(),
            ));
        }
        if self.sample_delay == 0 {
            return Err(SweepError::InvalidConfig(
                "sample_delay must be greater than 0".to_string(),
            ));
        }
        if self.calibration_length * self.sampling_rate == 0 {
            return Err(SweepError::InvalidConfig(format!(
                "calibration needs at least one sample after warm-up \
                 (calibration_length={}, sampling_rate={})",
                self.calibration_length, self.sampling_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget() {
        let config = SweepConfig::default();
        assert_eq!(config.calibration_samples(), 400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_window_is_invalid() {
        let config = SweepConfig {
            window_size: 0,
            ..SweepConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SweepError::InvalidConfig(_))
        ));
    }

    #[test]
    fn calibration_without_post_warmup_samples_is_invalid() {
        let config = SweepConfig {
            calibration_length: 0,
            ..SweepConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
