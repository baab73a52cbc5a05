pub mod config;
pub mod hooks;
pub mod input_context;
pub mod kinematics;
pub mod recall;
pub mod saber;
pub mod time;

#[cfg(test)]
mod test_rig;

pub use config::{ButtonBinding, ConfigError, MotionTuning, SaberConfig, TrickSaberConfig};
pub use hooks::{dispatch, HostEvent, HostHooks, SaberBound, ScoreSubmission};
pub use input_context::{ControllerButtons, Hand, Handedness, InputContext, InputSource};
pub use saber::{SaberController, SaberEvent, SaberState};
pub use time::Time;

use engine::SceneGraph;
use tracing::{info, span, Level};

pub const MOD_ID: &str = "trick_saber";

///
/// TrickSaber
///
/// Owns both saber controllers. Lives exactly as long as the mod is active:
/// create it on activation, drop it (after `deactivate`) when the mod goes away.
pub struct TrickSaber {
    sabers: [saber::SaberController; 2],
    menu_loaded: bool,
}

impl Default for TrickSaber {
    fn default() -> Self {
        Self::new()
    }
}

impl TrickSaber {
    pub fn new() -> TrickSaber {
        TrickSaber {
            sabers: Handedness::ALL.map(SaberController::new),
            menu_loaded: false,
        }
    }

    pub fn saber(&self, handedness: Handedness) -> &SaberController {
        &self.sabers[handedness.index()]
    }

    pub fn menu_loaded(&self) -> bool {
        self.menu_loaded
    }

    pub fn activate(&mut self, scores: &mut dyn ScoreSubmission) {
        info!("activating, disabling score submission");
        scores.set_score_submission(MOD_ID, false);
    }

    pub fn deactivate(
        &mut self,
        scene: &mut dyn SceneGraph,
        scores: &mut dyn ScoreSubmission,
    ) -> Vec<SaberEvent> {
        info!("deactivating, restoring sabers and score submission");
        let events = self.reset_all(scene);
        scores.set_score_submission(MOD_ID, true);
        events
    }

    fn reset_all(&mut self, scene: &mut dyn SceneGraph) -> Vec<SaberEvent> {
        self.sabers
            .iter_mut()
            .filter_map(|saber| saber.reset_to_rest(scene))
            .collect()
    }
}

impl HostHooks for TrickSaber {
    fn saber_bound(&mut self, scene: &dyn SceneGraph, bound: SaberBound) -> Vec<SaberEvent> {
        self.sabers[bound.handedness.index()]
            .bind(scene, bound.saber, bound.hand)
            .into_iter()
            .collect()
    }

    fn menu_activated(
        &mut self,
        scene: &mut dyn SceneGraph,
        first_activation: bool,
    ) -> Vec<SaberEvent> {
        if first_activation {
            self.menu_loaded = true;
        }
        self.reset_all(scene)
    }

    fn fixed_update(
        &mut self,
        scene: &mut dyn SceneGraph,
        input: &dyn InputSource,
        config: &TrickSaberConfig,
        time: &Time,
    ) -> Vec<SaberEvent> {
        let _span = span!(Level::TRACE, "fixed_update").entered();

        if !config.mod_enabled {
            return self.reset_all(scene);
        }

        let delta_time = time.delta_seconds(&config.tuning);
        let mut events = Vec::new();
        for saber in self.sabers.iter_mut() {
            let saber_config = config.saber(saber.handedness());
            events.extend(saber.update(scene, input, saber_config, &config.tuning, delta_time));
        }
        events
    }
}
