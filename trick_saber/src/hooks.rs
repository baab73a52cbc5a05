// The host game calls into the mod through three hooks: a saber got created, the main menu was
// shown, and a physics tick ran. How the host intercepts those is its own business; the core
// only implements the receiving side.

use engine::{NodeId, SceneGraph};

use crate::{
    config::TrickSaberConfig,
    input_context::{Handedness, InputSource},
    saber::SaberEvent,
    time::Time,
};

#[derive(Copy, Clone, Debug)]
pub struct SaberBound {
    pub handedness: Handedness,
    pub saber: NodeId,
    // Defaults to the saber's parent when not given
    pub hand: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub enum HostEvent {
    SaberBound(SaberBound),
    MenuActivated { first_activation: bool },
    FixedUpdate(Time),
}

pub trait HostHooks {
    fn saber_bound(&mut self, _scene: &dyn SceneGraph, _bound: SaberBound) -> Vec<SaberEvent> {
        Vec::new()
    }

    fn menu_activated(
        &mut self,
        _scene: &mut dyn SceneGraph,
        _first_activation: bool,
    ) -> Vec<SaberEvent> {
        Vec::new()
    }

    fn fixed_update(
        &mut self,
        _scene: &mut dyn SceneGraph,
        _input: &dyn InputSource,
        _config: &TrickSaberConfig,
        _time: &Time,
    ) -> Vec<SaberEvent> {
        Vec::new()
    }
}

/// Host-side switch for leaderboard submission; modded play must not submit scores
pub trait ScoreSubmission {
    fn set_score_submission(&mut self, mod_id: &str, enabled: bool);
}

///
/// dispatch
///
/// Routes one queued host event to its hook. Events are dispatched one at a time, so bind and
/// menu events always land strictly between ticks.
pub fn dispatch(
    hooks: &mut dyn HostHooks,
    event: HostEvent,
    scene: &mut dyn SceneGraph,
    input: &dyn InputSource,
    config: &TrickSaberConfig,
) -> Vec<SaberEvent> {
    match event {
        HostEvent::SaberBound(bound) => hooks.saber_bound(scene, bound),
        HostEvent::MenuActivated { first_activation } => {
            hooks.menu_activated(scene, first_activation)
        }
        HostEvent::FixedUpdate(time) => hooks.fixed_update(scene, input, config, &time),
    }
}
