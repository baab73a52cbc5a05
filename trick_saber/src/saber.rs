// Per-saber state machine: held in the hand, flying after a throw, or flying back.
// One controller exists per hand; the two never share state.

use cgmath::{Deg, Quaternion, Vector3, Zero};
use engine::{NodeId, SceneGraph};
use tracing::{error, info, span, trace, Level};

use crate::{
    config::{MotionTuning, SaberConfig},
    input_context::{Handedness, InputSource},
    kinematics::{derive_throw_spin, has_tumble, integrate_rotation, PlayerSpin, FORWARD, RIGHT},
    recall::RecallBlend,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SaberState {
    Held,
    Thrown,
    Returning,
}

// Motion plus the data that only exists in that motion.
// Spinning is part of `Held`, so a saber can't be spinning in any other state.
#[derive(Copy, Clone, Debug)]
enum Motion {
    Held { spinning: bool },
    Thrown,
    Returning(RecallBlend),
}

/// Local pose of the saber relative to its home parent, captured when it is bound
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RestPose {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl RestPose {
    fn apply(&self, scene: &mut dyn SceneGraph, node: NodeId) {
        scene.set_local_position(node, self.position);
        scene.set_local_rotation(node, self.rotation);
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SaberBinding {
    pub saber: NodeId,
    pub hand: NodeId,
    pub home_parent: NodeId,
    pub rest: RestPose,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SaberEvent {
    Bound {
        handedness: Handedness,
    },
    ThrowInitiated {
        handedness: Handedness,
        linear_velocity: Vector3<f32>,
        angular_velocity: Vector3<f32>,
    },
    RecallInitiated {
        handedness: Handedness,
    },
    ReturnedToHand {
        handedness: Handedness,
    },
    SpinActivated {
        handedness: Handedness,
    },
    SpinDeactivated {
        handedness: Handedness,
    },
    // Saber was found outside its home parent while held and got snapped back
    Reparented {
        handedness: Handedness,
    },
    // Forced back to held by a menu return or by the mod being disabled
    StateReset {
        handedness: Handedness,
    },
    // A node went away while the saber was in flight or spinning
    BindingLost {
        handedness: Handedness,
    },
}

pub struct SaberController {
    handedness: Handedness,
    binding: Option<SaberBinding>,
    motion: Motion,
    throw_pressed_last_tick: bool,

    hand_velocity: Vector3<f32>,
    prev_hand_position: Vector3<f32>,

    // Only meaningful from a throw until the saber is back in the hand
    linear_velocity: Vector3<f32>,
    angular_velocity: Vector3<f32>,
}

impl SaberController {
    pub fn new(handedness: Handedness) -> SaberController {
        SaberController {
            handedness,
            binding: None,
            motion: Motion::Held { spinning: false },
            throw_pressed_last_tick: false,
            hand_velocity: Vector3::zero(),
            prev_hand_position: Vector3::zero(),
            linear_velocity: Vector3::zero(),
            angular_velocity: Vector3::zero(),
        }
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn state(&self) -> SaberState {
        match self.motion {
            Motion::Held { .. } => SaberState::Held,
            Motion::Thrown => SaberState::Thrown,
            Motion::Returning(_) => SaberState::Returning,
        }
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.motion, Motion::Held { spinning: true })
    }

    pub fn binding(&self) -> Option<&SaberBinding> {
        self.binding.as_ref()
    }

    pub fn hand_velocity(&self) -> Vector3<f32> {
        self.hand_velocity
    }

    pub fn linear_velocity(&self) -> Vector3<f32> {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> Vector3<f32> {
        self.angular_velocity
    }

    pub fn recall(&self) -> Option<&RecallBlend> {
        match &self.motion {
            Motion::Returning(recall) => Some(recall),
            _ => None,
        }
    }

    ///
    /// bind
    ///
    /// Attaches the controller to a (possibly re-created) saber node. The rest pose is captured
    /// from the node's current local transform, and its current parent becomes home.
    /// The hand defaults to the home parent. Any in-flight motion is discarded.
    pub fn bind(
        &mut self,
        scene: &dyn SceneGraph,
        saber: NodeId,
        hand: Option<NodeId>,
    ) -> Option<SaberEvent> {
        let _span = span!(Level::INFO, "saber", hand = ?self.handedness).entered();

        if !scene.is_alive(saber) {
            error!("bind: saber node {:?} is dead, ignoring", saber);
            return None;
        }

        self.motion = Motion::Held { spinning: false };
        self.hand_velocity = Vector3::zero();
        self.linear_velocity = Vector3::zero();
        self.angular_velocity = Vector3::zero();

        let Some(home_parent) = scene.parent(saber) else {
            error!("bind: saber node {:?} has no parent, leaving unbound", saber);
            self.binding = None;
            return None;
        };

        let hand = hand.filter(|h| scene.is_alive(*h)).unwrap_or(home_parent);

        self.binding = Some(SaberBinding {
            saber,
            hand,
            home_parent,
            rest: RestPose {
                position: scene.local_position(saber),
                rotation: scene.local_rotation(saber),
            },
        });
        self.prev_hand_position = scene.position(hand);

        info!("found/updated saber {:?}", saber);
        Some(SaberEvent::Bound {
            handedness: self.handedness,
        })
    }

    ///
    /// reset_to_rest
    ///
    /// Forces the saber back into the hand at its rest pose. No-op if it is already held still.
    pub fn reset_to_rest(&mut self, scene: &mut dyn SceneGraph) -> Option<SaberEvent> {
        if matches!(self.motion, Motion::Held { spinning: false }) {
            return None;
        }

        let _span = span!(Level::INFO, "saber", hand = ?self.handedness).entered();

        if let Some(binding) = self.binding {
            if scene.is_alive(binding.saber) && scene.is_alive(binding.home_parent) {
                scene.set_parent(binding.saber, Some(binding.home_parent), false);
                binding.rest.apply(scene, binding.saber);
            }
        }

        self.motion = Motion::Held { spinning: false };
        info!("state reset to held");
        Some(SaberEvent::StateReset {
            handedness: self.handedness,
        })
    }

    ///
    /// update
    ///
    /// One physics tick: sample hand velocity, handle throw/recall and spin buttons,
    /// then move the saber according to its state.
    pub fn update(
        &mut self,
        scene: &mut dyn SceneGraph,
        input: &dyn InputSource,
        config: &SaberConfig,
        tuning: &MotionTuning,
        delta_time: f32,
    ) -> Vec<SaberEvent> {
        let _span = span!(Level::TRACE, "saber", hand = ?self.handedness).entered();
        let mut events = Vec::new();

        self.sample_hand_velocity(scene, delta_time);

        let throw_pressed = config.throw_button.is_assigned()
            && input.is_pressed(config.throw_button, self.handedness);
        let throw_was_pressed = std::mem::replace(&mut self.throw_pressed_last_tick, throw_pressed);

        match self.live_binding(scene) {
            Some(binding) => {
                self.handle_throw_button(
                    scene,
                    &binding,
                    config,
                    tuning,
                    throw_pressed,
                    throw_was_pressed,
                    &mut events,
                );
                self.handle_spin_button(scene, &binding, input, config, &mut events);
                self.apply_motion(scene, &binding, config, tuning, delta_time, &mut events);
            }
            None => {
                if !matches!(self.motion, Motion::Held { spinning: false }) {
                    error!("saber became invalid while not held, resetting state");
                    self.motion = Motion::Held { spinning: false };
                    events.push(SaberEvent::BindingLost {
                        handedness: self.handedness,
                    });
                }
            }
        }

        events
    }

    fn live_binding(&self, scene: &dyn SceneGraph) -> Option<SaberBinding> {
        self.binding.filter(|b| {
            scene.is_alive(b.saber) && scene.is_alive(b.hand) && scene.is_alive(b.home_parent)
        })
    }

    fn sample_hand_velocity(&mut self, scene: &dyn SceneGraph, delta_time: f32) {
        let Some(hand) = self.binding.map(|b| b.hand).filter(|h| scene.is_alive(*h)) else {
            return;
        };

        let hand_position = scene.position(hand);
        self.hand_velocity = (hand_position - self.prev_hand_position) / delta_time;
        self.prev_hand_position = hand_position;
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_throw_button(
        &mut self,
        scene: &mut dyn SceneGraph,
        binding: &SaberBinding,
        config: &SaberConfig,
        tuning: &MotionTuning,
        pressed: bool,
        was_pressed: bool,
        events: &mut Vec<SaberEvent>,
    ) {
        match self.motion {
            Motion::Held { spinning } if pressed && !was_pressed => {
                let player_spin = spinning.then(|| PlayerSpin {
                    axis: scene.transform_direction(binding.saber, RIGHT),
                    degrees_per_second: config.spin_direction() * config.spin_speed,
                });
                let saber_forward = scene.transform_direction(binding.saber, FORWARD);

                scene.set_parent(binding.saber, None, true);

                self.linear_velocity = self.hand_velocity * config.throw_velocity_multiplier;
                self.angular_velocity =
                    derive_throw_spin(self.linear_velocity, saber_forward, player_spin, tuning);
                self.motion = Motion::Thrown;

                info!(
                    "throw initiated: velocity {:?} angular velocity {:?}",
                    self.linear_velocity, self.angular_velocity
                );
                events.push(SaberEvent::ThrowInitiated {
                    handedness: self.handedness,
                    linear_velocity: self.linear_velocity,
                    angular_velocity: self.angular_velocity,
                });
            }
            Motion::Thrown if !pressed && was_pressed => {
                self.motion = Motion::Returning(RecallBlend::start(
                    scene.position(binding.saber),
                    scene.rotation(binding.saber),
                ));

                info!("recall initiated");
                events.push(SaberEvent::RecallInitiated {
                    handedness: self.handedness,
                });
            }
            _ => (),
        }
    }

    fn handle_spin_button(
        &mut self,
        scene: &mut dyn SceneGraph,
        binding: &SaberBinding,
        input: &dyn InputSource,
        config: &SaberConfig,
        events: &mut Vec<SaberEvent>,
    ) {
        let Motion::Held { spinning } = self.motion else {
            return;
        };

        // An unassigned button reads as released, which also covers the button being
        // unassigned in the settings while a spin is running
        let pressed = config.spin_button.is_assigned()
            && input.is_pressed(config.spin_button, self.handedness);

        if pressed && !spinning {
            self.motion = Motion::Held { spinning: true };
            info!("spin activated");
            events.push(SaberEvent::SpinActivated {
                handedness: self.handedness,
            });
        } else if !pressed && spinning {
            self.motion = Motion::Held { spinning: false };
            binding.rest.apply(scene, binding.saber);
            info!("spin deactivated, restoring position");
            events.push(SaberEvent::SpinDeactivated {
                handedness: self.handedness,
            });
        }
    }

    fn apply_motion(
        &mut self,
        scene: &mut dyn SceneGraph,
        binding: &SaberBinding,
        config: &SaberConfig,
        tuning: &MotionTuning,
        delta_time: f32,
        events: &mut Vec<SaberEvent>,
    ) {
        let saber = binding.saber;

        match self.motion {
            Motion::Held { spinning } => {
                if scene.parent(saber) != Some(binding.home_parent) {
                    scene.set_parent(saber, Some(binding.home_parent), false);
                    binding.rest.apply(scene, saber);
                    info!("re-parented and reset in held state");
                    events.push(SaberEvent::Reparented {
                        handedness: self.handedness,
                    });
                }

                if spinning {
                    let pivot = scene.transform_point(saber, FORWARD * config.spin_anchor_z_offset);
                    let axis = scene.transform_direction(saber, RIGHT);
                    let angle = Deg(config.spin_direction() * config.spin_speed * delta_time);
                    scene.rotate_around(saber, pivot, axis, angle);
                } else {
                    // Re-applied every tick so nothing can drift the saber out of the hand
                    binding.rest.apply(scene, saber);
                }
            }
            Motion::Thrown => {
                let position = scene.position(saber) + self.linear_velocity * delta_time;
                scene.set_position(saber, position);

                if has_tumble(self.angular_velocity, tuning) {
                    let rotation = integrate_rotation(
                        scene.rotation(saber),
                        self.angular_velocity,
                        delta_time,
                        tuning,
                    );
                    scene.set_rotation(saber, rotation);
                }
            }
            Motion::Returning(mut recall) => {
                let target_position = scene.transform_point(binding.hand, binding.rest.position);
                let target_rotation = scene.rotation(binding.hand) * binding.rest.rotation;

                let frame = recall.advance(
                    delta_time,
                    config.return_duration,
                    scene.rotation(saber),
                    self.angular_velocity,
                    target_position,
                    target_rotation,
                    tuning,
                );
                scene.set_position(saber, frame.position);
                scene.set_rotation(saber, frame.rotation);
                trace!("returning: t = {}", frame.t);

                if frame.complete {
                    // Parenting and the final local pose are handled by the next held tick
                    self.motion = Motion::Held { spinning: false };
                    info!("returned to hand");
                    events.push(SaberEvent::ReturnedToHand {
                        handedness: self.handedness,
                    });
                } else {
                    self.motion = Motion::Returning(recall);
                }
            }
        }
    }
}
