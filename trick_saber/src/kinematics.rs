// Free-flight kinematics for a thrown saber.
// Everything here is pure: it works on world-space vectors handed in by the controller,
// which keeps the throw maths testable without a scene graph.

use cgmath::{vec3, InnerSpace, Quaternion, Rad, Rotation3, Vector3};

use crate::config::MotionTuning;

// Local axes of a saber: it points down +Z, and spins about +X
pub const FORWARD: Vector3<f32> = vec3(0.0, 0.0, 1.0);
pub const RIGHT: Vector3<f32> = vec3(1.0, 0.0, 0.0);

/// A player-driven spin that was running when the saber got thrown.
#[derive(Copy, Clone, Debug)]
pub struct PlayerSpin {
    // World-space spin axis (the saber's right axis)
    pub axis: Vector3<f32>,
    // Signed, already multiplied by the spin direction
    pub degrees_per_second: f32,
}

///
/// derive_throw_spin
///
/// Angular velocity (rad/s, world space) given to a saber at the moment it is thrown.
/// A saber that was being spun keeps that exact spin. Otherwise a 'natural' tumble is made up
/// from the throw: gentle tosses only roll about the blade, real throws tumble end over end
/// about the axis perpendicular to both the blade and the throw direction.
pub fn derive_throw_spin(
    linear_velocity: Vector3<f32>,
    saber_forward: Vector3<f32>,
    player_spin: Option<PlayerSpin>,
    tuning: &MotionTuning,
) -> Vector3<f32> {
    if let Some(spin) = player_spin {
        return spin.axis * spin.degrees_per_second.to_radians();
    }

    let speed = linear_velocity.magnitude();
    if speed < tuning.gentle_throw_speed || speed <= f32::EPSILON {
        return saber_forward * (speed * tuning.min_natural_rotation);
    }

    let throw_direction = linear_velocity / speed;
    let cross = saber_forward.cross(throw_direction);

    // Thrown (almost) straight along the blade, there is no sensible perpendicular axis
    let axis = if cross.magnitude2() < tuning.degenerate_axis_threshold {
        saber_forward
    } else {
        cross.normalize()
    };

    let from_velocity = (speed * tuning.velocity_to_rotation_scale).min(tuning.max_velocity_rotation);
    axis * (tuning.min_natural_rotation + from_velocity)
}

pub fn has_tumble(angular_velocity: Vector3<f32>, tuning: &MotionTuning) -> bool {
    angular_velocity.magnitude2() > tuning.angular_velocity_epsilon
}

///
/// integrate_rotation
///
/// Advances a world rotation by one tick of angular velocity. The delta is applied in world
/// space (pre-multiplied), so the tumble axis stays fixed while the saber turns.
pub fn integrate_rotation(
    rotation: Quaternion<f32>,
    angular_velocity: Vector3<f32>,
    delta_time: f32,
    tuning: &MotionTuning,
) -> Quaternion<f32> {
    if !has_tumble(angular_velocity, tuning) {
        return rotation;
    }

    let angle = Rad(angular_velocity.magnitude() * delta_time);
    let delta = Quaternion::from_axis_angle(angular_velocity.normalize(), angle);
    (delta * rotation).normalize()
}

/// Linear interpolation that lands exactly on the endpoints
pub fn lerp_exact(from: Vector3<f32>, to: Vector3<f32>, t: f32) -> Vector3<f32> {
    if t >= 1.0 {
        to
    } else if t <= 0.0 {
        from
    } else {
        from + (to - from) * t
    }
}

/// Spherical interpolation that lands exactly on the endpoints
pub fn slerp_exact(from: Quaternion<f32>, to: Quaternion<f32>, t: f32) -> Quaternion<f32> {
    if t >= 1.0 {
        to
    } else if t <= 0.0 {
        from
    } else {
        from.slerp(to, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, One, Rotation, Zero};

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-4, "{:?} vs {:?}", a, b);
    }

    #[test]
    fn test_gentle_throw_rolls_about_blade() {
        let tuning = MotionTuning::default();

        let spin = derive_throw_spin(vec3(0.5, 0.0, 0.0), FORWARD, None, &tuning);

        assert_close(spin.normalize(), FORWARD);
        assert!((spin.magnitude() - 0.5 * tuning.min_natural_rotation).abs() < 1e-5);
    }

    #[test]
    fn test_zero_velocity_throw_has_no_spin() {
        let tuning = MotionTuning::default();

        let spin = derive_throw_spin(Vector3::zero(), FORWARD, None, &tuning);

        assert_eq!(spin, Vector3::zero());
    }

    #[test]
    fn test_fast_perpendicular_throw_tumbles() {
        // Given a throw at 10 m/s straight up, perpendicular to the blade
        let tuning = MotionTuning::default();
        let velocity = vec3(0.0, 10.0, 0.0);

        let spin = derive_throw_spin(velocity, FORWARD, None, &tuning);

        // Then the axis is blade x direction and the speed is baseline + velocity term
        let expected_speed = tuning.min_natural_rotation
            + (10.0 * tuning.velocity_to_rotation_scale).min(tuning.max_velocity_rotation);
        assert_close(spin.normalize(), FORWARD.cross(vec3(0.0, 1.0, 0.0)));
        assert!((spin.magnitude() - expected_speed).abs() < 1e-4);
    }

    #[test]
    fn test_velocity_term_is_capped() {
        let tuning = MotionTuning::default();

        let spin = derive_throw_spin(vec3(100.0, 0.0, 0.0), FORWARD, None, &tuning);

        let expected_speed = tuning.min_natural_rotation + tuning.max_velocity_rotation;
        assert!((spin.magnitude() - expected_speed).abs() < 1e-3);
    }

    #[test]
    fn test_throw_along_blade_falls_back_to_roll() {
        let tuning = MotionTuning::default();

        let spin = derive_throw_spin(vec3(0.1, 0.0, 5.0), FORWARD, None, &tuning);

        assert_close(spin.normalize(), FORWARD);
    }

    #[test]
    fn test_player_spin_is_continued() {
        let tuning = MotionTuning::default();
        let player_spin = PlayerSpin {
            axis: RIGHT,
            degrees_per_second: -180.0,
        };

        let spin = derive_throw_spin(vec3(0.0, 10.0, 0.0), FORWARD, Some(player_spin), &tuning);

        assert_close(spin, RIGHT * -std::f32::consts::PI);
    }

    #[test]
    fn test_integrate_rotation_in_world_space() {
        // Given a saber already turned about X, tumbling about world Y at pi rad/s
        let tuning = MotionTuning::default();
        let start = Quaternion::from_angle_x(Deg(30.0));
        let angular_velocity = vec3(0.0, std::f32::consts::PI, 0.0);

        // When half a second passes
        let rotation = integrate_rotation(start, angular_velocity, 0.5, &tuning);

        // Then the world Y rotation is applied on the outside
        let expected = Quaternion::from_angle_y(Deg(90.0)) * start;
        assert!(rotation.dot(expected).abs() > 0.9999);
    }

    #[test]
    fn test_negligible_tumble_is_ignored() {
        let tuning = MotionTuning::default();
        let start = Quaternion::from_angle_z(Deg(10.0));

        let rotation = integrate_rotation(start, vec3(0.001, 0.0, 0.0), 1.0, &tuning);

        assert_eq!(rotation, start);
    }

    #[test]
    fn test_interpolation_hits_endpoints_exactly() {
        let from = vec3(0.1, 0.2, 0.3);
        let to = vec3(-7.3, 1.9, 4.4);
        let from_rot = Quaternion::from_angle_y(Deg(170.0));
        let to_rot = Quaternion::from_angle_x(Deg(-35.0));

        assert_eq!(lerp_exact(from, to, 1.0), to);
        assert_eq!(lerp_exact(from, to, 0.0), from);
        assert_eq!(slerp_exact(from_rot, to_rot, 1.0), to_rot);
        assert_eq!(slerp_exact(from_rot, to_rot, 0.0), from_rot);

        let halfway = slerp_exact(Quaternion::one(), Quaternion::from_angle_y(Deg(90.0)), 0.5);
        assert_close(
            halfway.rotate_vector(FORWARD),
            Quaternion::from_angle_y(Deg(45.0)).rotate_vector(FORWARD),
        );
    }
}
