use std::time::Duration;

use crate::config::MotionTuning;

#[derive(Clone, Debug, Default)]
pub struct Time {
    pub elapsed: Duration,
    pub total: Duration,
}

impl Time {
    /// Builds a tick from the host's raw float delta. Negative or non-finite deltas become zero.
    pub fn from_delta(delta_seconds: f32, total: Duration) -> Time {
        let elapsed = Duration::try_from_secs_f32(delta_seconds).unwrap_or(Duration::ZERO);
        Time { elapsed, total }
    }

    ///
    /// delta_seconds
    ///
    /// Delta used by the motion model. Near-zero deltas are replaced by a nominal frame time
    /// so velocity estimates never divide by (almost) nothing.
    pub fn delta_seconds(&self, tuning: &MotionTuning) -> f32 {
        let delta = self.elapsed.as_secs_f32();
        if delta <= tuning.min_delta_time {
            tuning.nominal_delta_time
        } else {
            delta
        }
    }
}
