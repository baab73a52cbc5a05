// Shared scene setup for the controller tests: a player with two hands, each holding a saber.

use std::time::Duration;

use cgmath::{vec3, Deg, InnerSpace, Quaternion, Rotation3, Vector3, Zero};
use engine::{NodeId, SceneGraph, TransformTree};

use crate::{
    ButtonBinding, Handedness, HostHooks, InputContext, SaberBound, SaberEvent, Time, TrickSaber,
    TrickSaberConfig,
};

pub fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
    assert!(
        (a - b).magnitude() < 1e-4 * (1.0 + b.magnitude()),
        "{:?} vs {:?}",
        a,
        b
    );
}

pub struct Rig {
    pub scene: TransformTree,
    pub input: InputContext,
    pub delta: f32,
    hands: [NodeId; 2],
    sabers: [NodeId; 2],
    hand_steps: [Vector3<f32>; 2],
    rest: [(Vector3<f32>, Quaternion<f32>); 2],
    total: Duration,
}

impl Rig {
    pub fn new() -> Rig {
        let mut scene = TransformTree::new();
        let player = scene.create_node("player", None);
        scene.set_local_position(player, vec3(0.0, 1.2, -0.5));
        scene.set_local_rotation(player, Quaternion::from_angle_y(Deg(25.0)));

        let mut hands = [player; 2];
        let mut sabers = [player; 2];
        let mut rest = [(Vector3::zero(), Quaternion::from_angle_x(Deg(0.0))); 2];

        for handedness in Handedness::ALL {
            let (name, side) = match handedness {
                Handedness::Left => ("left", -1.0),
                Handedness::Right => ("right", 1.0),
            };
            let hand = scene.create_node(&format!("{name}_hand"), Some(player));
            scene.set_local_position(hand, vec3(0.3 * side, 0.0, 0.4));
            scene.set_local_rotation(hand, Quaternion::from_angle_z(Deg(15.0 * side)));

            let saber = scene.create_node(&format!("{name}_saber"), Some(hand));
            let rest_position = vec3(0.01 * side, -0.02, 0.05);
            let rest_rotation = Quaternion::from_angle_x(Deg(-12.5));
            scene.set_local_position(saber, rest_position);
            scene.set_local_rotation(saber, rest_rotation);

            hands[handedness.index()] = hand;
            sabers[handedness.index()] = saber;
            rest[handedness.index()] = (rest_position, rest_rotation);
        }

        Rig {
            scene,
            input: InputContext::default(),
            delta: 1.0 / 64.0,
            hands,
            sabers,
            hand_steps: [Vector3::zero(); 2],
            rest,
            total: Duration::ZERO,
        }
    }

    pub fn bound_driver(&self) -> TrickSaber {
        let mut trick_saber = TrickSaber::new();
        for handedness in Handedness::ALL {
            let events = trick_saber.saber_bound(
                &self.scene,
                SaberBound {
                    handedness,
                    saber: self.saber(handedness),
                    hand: None,
                },
            );
            assert_eq!(events, vec![SaberEvent::Bound { handedness }]);
        }
        trick_saber
    }

    pub fn hand(&self, handedness: Handedness) -> NodeId {
        self.hands[handedness.index()]
    }

    pub fn saber(&self, handedness: Handedness) -> NodeId {
        self.sabers[handedness.index()]
    }

    pub fn rest(&self, handedness: Handedness) -> (Vector3<f32>, Quaternion<f32>) {
        self.rest[handedness.index()]
    }

    pub fn press(&mut self, handedness: Handedness, binding: ButtonBinding, pressed: bool) {
        self.input.hand_mut(handedness).set_pressed(binding, pressed);
    }

    /// Hand moves by `step` (in player space) every following tick
    pub fn move_hand(&mut self, handedness: Handedness, step: Vector3<f32>) {
        self.hand_steps[handedness.index()] = step;
    }

    pub fn tick(
        &mut self,
        trick_saber: &mut TrickSaber,
        config: &TrickSaberConfig,
    ) -> Vec<SaberEvent> {
        for handedness in Handedness::ALL {
            let hand = self.hand(handedness);
            let position = self.scene.local_position(hand) + self.hand_steps[handedness.index()];
            self.scene.set_local_position(hand, position);
        }

        self.total += Duration::from_secs_f32(self.delta);
        let time = Time::from_delta(self.delta, self.total);
        trick_saber.fixed_update(&mut self.scene, &self.input, config, &time)
    }

    pub fn saber_position(&self, handedness: Handedness) -> Vector3<f32> {
        self.scene.position(self.saber(handedness))
    }

    pub fn saber_parent(&self, handedness: Handedness) -> Option<NodeId> {
        self.scene.parent(self.saber(handedness))
    }

    pub fn assert_at_rest(&self, handedness: Handedness) {
        let saber = self.saber(handedness);
        let (rest_position, rest_rotation) = self.rest(handedness);
        assert_eq!(self.scene.parent(saber), Some(self.hand(handedness)));
        assert_eq!(self.scene.local_position(saber), rest_position);
        assert_eq!(self.scene.local_rotation(saber), rest_rotation);
    }
}
