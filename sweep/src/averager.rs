//! Sliding-window mean with decimation.
//!
//! Smoothing and downsampling happen in one step: the window holds the most
//! recent `window_size` vectors and a mean is emitted only once the window is
//! full and only on every `sample_delay`-th accepted push.

use imu_traits::Float;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingAverager<const N: usize> {
    window: VecDeque<[Float; N]>,
    window_size: usize,
    sample_delay: usize,
    accepted: u64,
}

impl<const N: usize> RollingAverager<N> {
    /// # Panics
    /// Panics if `window_size` or `sample_delay` is zero.
    pub fn new(window_size: usize, sample_delay: usize) -> Self {
        assert!(window_size > 0, "window_size must be greater than 0");
        assert!(sample_delay > 0, "sample_delay must be greater than 0");
        Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
            sample_delay,
            accepted: 0,
        }
    }

    /// Adds a vector, returning the window mean when one is due.
    pub fn push(&mut self, vector: [Float; N]) -> Option<[Float; N]> {
        if self.window.len() >= self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(vector);
        self.accepted += 1;

        if self.is_full() && self.accepted % self.sample_delay as u64 == 0 {
            Some(self.mean())
        } else {
            None
        }
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.window_size
    }

    /// Accepted pushes since creation or the last reset.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.accepted = 0;
    }

    fn mean(&self) -> [Float; N] {
        let mut sum = [0.0; N];
        for vector in &self.window {
            for (acc, v) in sum.iter_mut().zip(vector) {
                *acc += *v;
            }
        }
        let count = self.window.len() as Float;
        sum.map(|s| s / count)
    }
}
