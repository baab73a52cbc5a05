use cgmath::{Quaternion, Vector3};

use crate::{
    config::MotionTuning,
    kinematics::{has_tumble, integrate_rotation, lerp_exact, slerp_exact},
};

///
/// RecallBlend
///
/// Time-based blend bringing a thrown saber back to the hand. The target is re-read every tick,
/// so the saber chases a moving hand instead of flying to where the hand used to be.
// Fraction of a tick
const FINISH_TOLERANCE: f32 = 0.01;

#[derive(Copy, Clone, Debug)]
pub struct RecallBlend {
    pub elapsed: f32,
    pub release_position: Vector3<f32>,
    pub release_rotation: Quaternion<f32>,
}

#[derive(Copy, Clone, Debug)]
pub struct RecallFrame {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub t: f32,
    pub complete: bool,
}

impl RecallBlend {
    pub fn start(release_position: Vector3<f32>, release_rotation: Quaternion<f32>) -> RecallBlend {
        RecallBlend {
            elapsed: 0.0,
            release_position,
            release_rotation,
        }
    }

    pub fn progress(&self, duration: f32, tuning: &MotionTuning) -> f32 {
        let duration = duration.max(tuning.min_return_duration);
        (self.elapsed / duration).clamp(0.0, 1.0)
    }

    // Summed f32 deltas can fall just short of the duration; within a hundredth of a tick is done
    fn progress_after_tick(&self, delta_time: f32, duration: f32, tuning: &MotionTuning) -> f32 {
        let duration = duration.max(tuning.min_return_duration);
        if self.elapsed >= duration - delta_time * FINISH_TOLERANCE {
            1.0
        } else {
            self.progress(duration, tuning)
        }
    }

    ///
    /// advance
    ///
    /// Steps the blend by one tick. While the saber is still tumbling and the blend is young,
    /// the tumble keeps integrating and is pulled toward the target with a cubic ease-in, so the
    /// spin dominates early and the hand late. Past the cutoff (or without tumble) the rotation is
    /// a plain slerp from the release rotation, which lands exactly on the target at t = 1.
    #[allow(clippy::too_many_arguments)]
    pub fn advance(
        &mut self,
        delta_time: f32,
        duration: f32,
        current_rotation: Quaternion<f32>,
        angular_velocity: Vector3<f32>,
        target_position: Vector3<f32>,
        target_rotation: Quaternion<f32>,
        tuning: &MotionTuning,
    ) -> RecallFrame {
        self.elapsed += delta_time;
        let t = self.progress_after_tick(delta_time, duration, tuning);

        let position = lerp_exact(self.release_position, target_position, t);

        let rotation = if has_tumble(angular_velocity, tuning) && t < tuning.tumble_blend_cutoff {
            let tumbled = integrate_rotation(current_rotation, angular_velocity, delta_time, tuning);
            slerp_exact(tumbled, target_rotation, t * t * t)
        } else {
            slerp_exact(self.release_rotation, target_rotation, t)
        };

        RecallFrame {
            position,
            rotation,
            t,
            complete: t >= 1.0,
        }
    }
}
