//! Angular extremes mapping and live coverage checking.
//!
//! A *mapping sweep* records home-relative angles while the operator moves
//! the sensor through its full range. Each axis is then classified by the
//! sign of what was seen:
//!
//! * values on both sides of zero: [`Indicator::PosNeg`], plain min/max;
//! * only non-negative values: [`Indicator::PosOnly`], the axis wrapped
//!   around near 360° and the extremes are the value just above 180° and
//!   the value just below it;
//! * only negative values: [`Indicator::NegOnly`], the mirror image near
//!   -360°.
//!
//! A *live sweep* then latches, per axis and direction, whether the stream
//! has reached the mapped extreme again. Coverage is complete when all six
//! flags are set.

use crate::error::{Result, SweepError};
use imu_traits::{Float, Vector3};
use log::{debug, info};
use std::fmt;

const HALF_TURN: Float = 180.0;
const FULL_TURN: Float = 360.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    fn component(self, angles: Vector3) -> Float {
        match self {
            Axis::X => angles.x,
            Axis::Y => angles.y,
            Axis::Z => angles.z,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Which angle convention an axis sweep follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// The sweep crossed zero.
    PosNeg,
    /// All angles were non-negative; wraps near 360°.
    PosOnly,
    /// All angles were negative; wraps near -360°.
    NegOnly,
}

/// Mapped extremes of one axis.
///
/// For the wrapping conventions `min` is the extreme on the far side of the
/// half turn (nearer ±360°) and `max` the one nearer zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisExtremes {
    pub axis: Axis,
    pub indicator: Indicator,
    pub min: Float,
    pub max: Float,
    /// Angular span between the two extremes, unwrapped.
    pub extremes_diff: Float,
}

/// Extremes of all three axes, indexed by [`Axis::index`].
pub type Extremes = [AxisExtremes; 3];

impl AxisExtremes {
    /// Classifies the values one axis took over a mapping sweep.
    pub fn classify(axis: Axis, values: &[Float]) -> Result<Self> {
        let degenerate = || SweepError::DegenerateAxis { axis };
        if values.is_empty() {
            return Err(degenerate());
        }

        let any_non_negative = values.iter().any(|v| *v >= 0.0);
        let any_negative = values.iter().any(|v| *v < 0.0);
        let any_positive = values.iter().any(|v| *v > 0.0);

        if any_non_negative && any_negative {
            let min = values.iter().copied().fold(Float::INFINITY, Float::min);
            let max = values.iter().copied().fold(Float::NEG_INFINITY, Float::max);
            Ok(Self {
                axis,
                indicator: Indicator::PosNeg,
                min,
                max,
                extremes_diff: max - min,
            })
        } else if !any_negative {
            let min = values
                .iter()
                .copied()
                .filter(|v| *v > HALF_TURN)
                .reduce(Float::min)
                .ok_or_else(degenerate)?;
            let max = values
                .iter()
                .copied()
                .filter(|v| *v < HALF_TURN)
                .reduce(Float::max)
                .ok_or_else(degenerate)?;
            Ok(Self {
                axis,
                indicator: Indicator::PosOnly,
                min,
                max,
                extremes_diff: (max - (min - FULL_TURN)).abs(),
            })
        } else if !any_positive {
            let min = values
                .iter()
                .copied()
                .filter(|v| *v < -HALF_TURN)
                .reduce(Float::max)
                .ok_or_else(degenerate)?;
            let max = values
                .iter()
                .copied()
                .filter(|v| *v > -HALF_TURN)
                .reduce(Float::min)
                .ok_or_else(degenerate)?;
            Ok(Self {
                axis,
                indicator: Indicator::NegOnly,
                min,
                max,
                extremes_diff: (max - (min + FULL_TURN)).abs(),
            })
        } else {
            Err(degenerate())
        }
    }

    pub fn touches_max(&self, angle: Float) -> bool {
        match self.indicator {
            Indicator::PosNeg => angle >= self.max,
            Indicator::PosOnly => angle < HALF_TURN && angle >= self.max,
            Indicator::NegOnly => angle > -HALF_TURN && angle <= self.max,
        }
    }

    pub fn touches_min(&self, angle: Float) -> bool {
        match self.indicator {
            Indicator::PosNeg => angle <= self.min,
            Indicator::PosOnly => angle > HALF_TURN && angle <= self.min,
            Indicator::NegOnly => angle < -HALF_TURN && angle >= self.min,
        }
    }
}

/// Which mapped extremes a live sweep has reached so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageState {
    min_touched: [bool; 3],
    max_touched: [bool; 3],
}

impl CoverageState {
    pub fn min_touched(&self, axis: Axis) -> bool {
        self.min_touched[axis.index()]
    }

    pub fn max_touched(&self, axis: Axis) -> bool {
        self.max_touched[axis.index()]
    }

    pub fn axis_covered(&self, axis: Axis) -> bool {
        self.min_touched(axis) && self.max_touched(axis)
    }

    pub fn is_complete(&self) -> bool {
        Axis::ALL.iter().all(|axis| self.axis_covered(*axis))
    }

    /// Number of latched flags, 0 through 6.
    pub fn touched_count(&self) -> usize {
        self.min_touched
            .iter()
            .chain(self.max_touched.iter())
            .filter(|t| **t)
            .count()
    }
}

impl fmt::Display for CoverageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |t: bool| if t { '#' } else { '.' };
        for (i, axis) in Axis::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(
                f,
                "{}[{}{}]",
                axis,
                mark(self.min_touched(*axis)),
                mark(self.max_touched(*axis))
            )?;
        }
        Ok(())
    }
}

/// Records mapping sweeps and checks live sweeps against them.
#[derive(Debug, Clone, Default)]
pub struct CoverageTracker {
    sweep: [Vec<Float>; 3],
    extremes: Option<Extremes>,
    state: CoverageState,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets any partially recorded mapping sweep.
    pub fn start_mapping(&mut self) {
        for values in self.sweep.iter_mut() {
            values.clear();
        }
    }

    pub fn record_sweep(&mut self, angles: Vector3) {
        for axis in Axis::ALL {
            self.sweep[axis.index()].push(axis.component(angles));
        }
    }

    /// Windowed samples recorded in the current mapping sweep.
    pub fn sweep_len(&self) -> usize {
        self.sweep[0].len()
    }

    /// Classifies the recorded sweep and caches the result.
    ///
    /// The recorded values are consumed either way. On error the previously
    /// cached extremes stay in place.
    pub fn finalize_extremes(&mut self) -> Result<Extremes> {
        let sweep = std::mem::take(&mut self.sweep);
        let extremes = [
            AxisExtremes::classify(Axis::X, &sweep[0])?,
            AxisExtremes::classify(Axis::Y, &sweep[1])?,
            AxisExtremes::classify(Axis::Z, &sweep[2])?,
        ];
        for e in &extremes {
            info!(
                "Axis {}: {:?} min={:.3} max={:.3} span={:.3}",
                e.axis, e.indicator, e.min, e.max, e.extremes_diff
            );
        }
        self.extremes = Some(extremes);
        Ok(extremes)
    }

    pub fn extremes(&self) -> Option<&Extremes> {
        self.extremes.as_ref()
    }

    /// Begins a live sweep with every coverage flag cleared.
    pub fn start_live(&mut self) -> Result<()> {
        if self.extremes.is_none() {
            return Err(SweepError::NoExtremes);
        }
        self.state = CoverageState::default();
        Ok(())
    }

    /// Latches the extremes `angles` reaches. Returns the updated state and
    /// whether every axis has now reached both extremes.
    pub fn check_live_sample(&mut self, angles: Vector3) -> Result<(CoverageState, bool)> {
        let extremes = self.extremes.as_ref().ok_or(SweepError::NoExtremes)?;

        for e in extremes {
            let i = e.axis.index();
            let angle = e.axis.component(angles);
            if !self.state.min_touched[i] && e.touches_min(angle) {
                self.state.min_touched[i] = true;
                debug!("Axis {} reached min at {:.3}", e.axis, angle);
            }
            if !self.state.max_touched[i] && e.touches_max(angle) {
                self.state.max_touched[i] = true;
                debug!("Axis {} reached max at {:.3}", e.axis, angle);
            }
        }

        Ok((self.state, self.state.is_complete()))
    }

    pub fn state(&self) -> CoverageState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn straddling_zero_is_pos_neg() {
        let e = AxisExtremes::classify(Axis::X, &[-10.0, -5.0, 0.0, 5.0, 10.0]).unwrap();
        assert_eq!(e.indicator, Indicator::PosNeg);
        assert_eq!(e.min, -10.0);
        assert_eq!(e.max, 10.0);
        assert_relative_eq!(e.extremes_diff, 20.0);
    }

    #[test]
    fn wrap_near_full_turn_is_pos_only() {
        let e = AxisExtremes::classify(Axis::Y, &[350.0, 355.0, 359.0, 1.0, 2.0]).unwrap();
        assert_eq!(e.indicator, Indicator::PosOnly);
        assert_eq!(e.min, 350.0);
        assert_eq!(e.max, 2.0);
        assert_relative_eq!(e.extremes_diff, 12.0);
    }

    #[test]
    fn wrap_near_negative_full_turn_is_neg_only() {
        let e = AxisExtremes::classify(Axis::Z, &[-350.0, -355.0, -359.0, -1.0, -2.0]).unwrap();
        assert_eq!(e.indicator, Indicator::NegOnly);
        assert_eq!(e.min, -350.0);
        assert_eq!(e.max, -2.0);
        assert_relative_eq!(e.extremes_diff, 12.0);
    }

    #[test]
    fn zero_only_axis_is_degenerate() {
        assert!(matches!(
            AxisExtremes::classify(Axis::Y, &[0.0, 0.0, 0.0]),
            Err(SweepError::DegenerateAxis { axis: Axis::Y })
        ));
    }

    #[test]
    fn pos_only_without_a_wrapped_side_is_degenerate() {
        assert!(matches!(
            AxisExtremes::classify(Axis::X, &[1.0, 20.0, 90.0]),
            Err(SweepError::DegenerateAxis { axis: Axis::X })
        ));
        assert!(matches!(
            AxisExtremes::classify(Axis::X, &[180.0, 200.0]),
            Err(SweepError::DegenerateAxis { .. })
        ));
    }

    #[test]
    fn empty_sweep_is_degenerate() {
        assert!(matches!(
            AxisExtremes::classify(Axis::Z, &[]),
            Err(SweepError::DegenerateAxis { axis: Axis::Z })
        ));
    }

    #[test]
    fn wrapped_touch_conditions() {
        let pos = AxisExtremes::classify(Axis::X, &[350.0, 355.0, 1.0, 2.0]).unwrap();
        assert!(pos.touches_min(349.0));
        assert!(pos.touches_min(350.0));
        assert!(!pos.touches_min(351.0));
        assert!(!pos.touches_min(100.0));
        assert!(pos.touches_max(2.0));
        assert!(pos.touches_max(90.0));
        assert!(!pos.touches_max(1.0));
        assert!(!pos.touches_max(355.0));

        let neg = AxisExtremes::classify(Axis::X, &[-350.0, -355.0, -1.0, -2.0]).unwrap();
        assert!(neg.touches_min(-350.0));
        assert!(neg.touches_min(-300.0));
        assert!(!neg.touches_min(-351.0));
        assert!(neg.touches_max(-2.0));
        assert!(neg.touches_max(-90.0));
        assert!(!neg.touches_max(-1.0));
        assert!(!neg.touches_max(-200.0));
    }

    fn mapped_tracker() -> CoverageTracker {
        let mut tracker = CoverageTracker::new();
        tracker.start_mapping();
        for v in [-10.0, -5.0, 0.0, 5.0, 10.0] {
            tracker.record_sweep(Vector3::new(v, v, v));
        }
        tracker.finalize_extremes().unwrap();
        tracker.start_live().unwrap();
        tracker
    }

    #[test]
    fn done_exactly_on_the_completing_sample() {
        let mut tracker = mapped_tracker();
        let sequence = [
            Vector3::new(-10.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(0.0, -10.0, 0.0),
            Vector3::new(0.0, 10.0, 0.0),
            Vector3::new(0.0, 0.0, -10.0),
        ];
        for angles in sequence {
            let (_, done) = tracker.check_live_sample(angles).unwrap();
            assert!(!done);
        }
        let (state, done) = tracker.check_live_sample(Vector3::new(0.0, 0.0, 10.0)).unwrap();
        assert!(done);
        assert!(state.is_complete());
        assert_eq!(state.touched_count(), 6);
    }

    #[test]
    fn flags_latch_once_touched() {
        let mut tracker = mapped_tracker();
        let (state, _) = tracker.check_live_sample(Vector3::new(-12.0, 11.0, 0.0)).unwrap();
        assert!(state.min_touched(Axis::X));
        assert!(state.max_touched(Axis::Y));

        let (state, done) = tracker.check_live_sample(Vector3::new(0.0, 0.0, 0.0)).unwrap();
        assert!(state.min_touched(Axis::X));
        assert!(state.max_touched(Axis::Y));
        assert!(!state.axis_covered(Axis::X));
        assert!(!done);
        assert_eq!(state.to_string(), "X[#.] Y[.#] Z[..]");
    }

    #[test]
    fn starting_live_resets_coverage() {
        let mut tracker = mapped_tracker();
        tracker.check_live_sample(Vector3::new(-10.0, -10.0, -10.0)).unwrap();
        assert_eq!(tracker.state().touched_count(), 3);
        tracker.start_live().unwrap();
        assert_eq!(tracker.state(), CoverageState::default());
    }

    #[test]
    fn live_requires_mapped_extremes() {
        let mut tracker = CoverageTracker::new();
        assert!(matches!(tracker.start_live(), Err(SweepError::NoExtremes)));
        assert!(matches!(
            tracker.check_live_sample(Vector3::default()),
            Err(SweepError::NoExtremes)
        ));
    }

    #[test]
    fn degenerate_sweep_keeps_previous_extremes() {
        let mut tracker = mapped_tracker();
        let before = *tracker.extremes().unwrap();

        tracker.start_mapping();
        for _ in 0..5 {
            tracker.record_sweep(Vector3::new(1.0, 0.0, 0.0));
        }
        assert!(matches!(
            tracker.finalize_extremes(),
            Err(SweepError::DegenerateAxis { axis: Axis::X })
        ));
        assert_eq!(tracker.extremes(), Some(&before));
        assert_eq!(tracker.sweep_len(), 0);
    }

    #[test]
    fn new_sweep_replaces_extremes() {
        let mut tracker = mapped_tracker();
        tracker.start_mapping();
        for v in [-20.0, 30.0] {
            tracker.record_sweep(Vector3::new(v, v, v));
        }
        let extremes = tracker.finalize_extremes().unwrap();
        assert_eq!(extremes[Axis::Z.index()].min, -20.0);
        assert_eq!(extremes[Axis::Z.index()].max, 30.0);
    }
}
