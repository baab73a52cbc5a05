use std::{
    fs,
    io::{self, ErrorKind},
    path::Path,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::input_context::Handedness;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to access config file: {0}")]
    Io(#[from] io::Error),

    #[error("unable to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

///
/// ButtonBinding
///
/// Logical button a trick is bound to. Stored as the settings index (0..=4); index 0 means
/// unassigned, and any unknown index also reads as unassigned rather than failing the load.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ButtonBinding {
    #[default]
    None,
    One,
    Two,
    IndexTrigger,
    HandTrigger,
}

const LEFT_BUTTON_LABELS: [&str; 5] = ["None", "X", "Y", "Left Trigger", "Left Grip"];
const RIGHT_BUTTON_LABELS: [&str; 5] = ["None", "A", "B", "Right Trigger", "Right Grip"];

impl ButtonBinding {
    pub const ALL: [ButtonBinding; 5] = [
        ButtonBinding::None,
        ButtonBinding::One,
        ButtonBinding::Two,
        ButtonBinding::IndexTrigger,
        ButtonBinding::HandTrigger,
    ];

    pub fn index(self) -> i32 {
        match self {
            ButtonBinding::None => 0,
            ButtonBinding::One => 1,
            ButtonBinding::Two => 2,
            ButtonBinding::IndexTrigger => 3,
            ButtonBinding::HandTrigger => 4,
        }
    }

    pub fn is_assigned(self) -> bool {
        self != ButtonBinding::None
    }

    /// Name shown on the settings screen for this button on the given controller
    pub fn label(self, hand: Handedness) -> &'static str {
        let labels = match hand {
            Handedness::Left => &LEFT_BUTTON_LABELS,
            Handedness::Right => &RIGHT_BUTTON_LABELS,
        };
        labels[self.index() as usize]
    }

    pub fn from_label(label: &str, hand: Handedness) -> Option<ButtonBinding> {
        ButtonBinding::ALL
            .into_iter()
            .find(|binding| binding.label(hand) == label)
    }
}

impl From<i32> for ButtonBinding {
    fn from(index: i32) -> Self {
        match index {
            1 => ButtonBinding::One,
            2 => ButtonBinding::Two,
            3 => ButtonBinding::IndexTrigger,
            4 => ButtonBinding::HandTrigger,
            _ => ButtonBinding::None,
        }
    }
}

impl From<ButtonBinding> for i32 {
    fn from(binding: ButtonBinding) -> Self {
        binding.index()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaberConfig {
    pub spin_button: ButtonBinding,
    pub throw_button: ButtonBinding,
    pub spin_clockwise: bool,
    // Degrees per second
    pub spin_speed: f32,
    // Offset along the saber's length for the spin pivot, positive is towards the tip
    pub spin_anchor_z_offset: f32,
    pub throw_velocity_multiplier: f32,
    // Seconds
    pub return_duration: f32,
}

impl Default for SaberConfig {
    fn default() -> Self {
        Self {
            spin_button: ButtonBinding::None,
            throw_button: ButtonBinding::None,
            spin_clockwise: true,
            spin_speed: 2000.0,
            spin_anchor_z_offset: -0.2,
            throw_velocity_multiplier: 3.0,
            return_duration: 0.2,
        }
    }
}

pub const SPIN_SPEED_RANGE: (f32, f32) = (100.0, 10000.0);
pub const SPIN_ANCHOR_Z_OFFSET_RANGE: (f32, f32) = (-1.0, 1.0);
pub const THROW_VELOCITY_MULTIPLIER_RANGE: (f32, f32) = (0.5, 5.0);
pub const RETURN_DURATION_RANGE: (f32, f32) = (0.02, 1.5);

impl SaberConfig {
    pub fn spin_direction(&self) -> f32 {
        if self.spin_clockwise {
            1.0
        } else {
            -1.0
        }
    }

    ///
    /// sanitized
    ///
    /// Clamps every scalar into the range the settings screen allows.
    /// Non-finite values fall back to the default for that field.
    pub fn sanitized(&self, hand: Handedness) -> SaberConfig {
        let defaults = SaberConfig::default();
        SaberConfig {
            spin_speed: clamp_field(
                hand,
                "spin_speed",
                self.spin_speed,
                defaults.spin_speed,
                SPIN_SPEED_RANGE,
            ),
            spin_anchor_z_offset: clamp_field(
                hand,
                "spin_anchor_z_offset",
                self.spin_anchor_z_offset,
                defaults.spin_anchor_z_offset,
                SPIN_ANCHOR_Z_OFFSET_RANGE,
            ),
            throw_velocity_multiplier: clamp_field(
                hand,
                "throw_velocity_multiplier",
                self.throw_velocity_multiplier,
                defaults.throw_velocity_multiplier,
                THROW_VELOCITY_MULTIPLIER_RANGE,
            ),
            return_duration: clamp_field(
                hand,
                "return_duration",
                self.return_duration,
                defaults.return_duration,
                RETURN_DURATION_RANGE,
            ),
            ..self.clone()
        }
    }
}

fn clamp_field(
    hand: Handedness,
    name: &str,
    value: f32,
    default: f32,
    range: (f32, f32),
) -> f32 {
    let (min, max) = range;
    let clamped = if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    };

    if clamped != value {
        warn!(
            "config: {:?} {} = {} outside [{}, {}], using {}",
            hand, name, value, min, max, clamped
        );
    }
    clamped
}

///
/// MotionTuning
///
/// Tuned constants of the motion model. None of these have a derivation beyond 'looks right',
/// so they are kept adjustable instead of being baked into the algorithms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    // Baseline tumble of any natural throw, rad/s (about half a rotation per second)
    pub min_natural_rotation: f32,
    // How much throw speed (m/s) contributes to tumble speed (rad/s)
    pub velocity_to_rotation_scale: f32,
    // Cap on the speed-proportional part of the tumble, rad/s
    pub max_velocity_rotation: f32,
    // Throws slower than this only roll about the saber's length
    pub gentle_throw_speed: f32,
    // Squared magnitude below which forward x throw direction is considered degenerate
    pub degenerate_axis_threshold: f32,
    // Squared angular velocity magnitude below which the saber is considered not tumbling
    pub angular_velocity_epsilon: f32,
    // Recall progress after which the tumble is no longer blended in
    pub tumble_blend_cutoff: f32,
    pub min_return_duration: f32,
    pub min_delta_time: f32,
    pub nominal_delta_time: f32,
}

#[allow(clippy::approx_constant)]
pub const MIN_NATURAL_ROTATION_RAD_PER_SEC: f32 = 3.14;
pub const THROW_VELOCITY_TO_ROTATION_SCALE: f32 = 2.5;
pub const MAX_NATURAL_ROTATION_FROM_VELOCITY_RAD_PER_SEC: f32 = 70.0;

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            min_natural_rotation: MIN_NATURAL_ROTATION_RAD_PER_SEC,
            velocity_to_rotation_scale: THROW_VELOCITY_TO_ROTATION_SCALE,
            max_velocity_rotation: MAX_NATURAL_ROTATION_FROM_VELOCITY_RAD_PER_SEC,
            gentle_throw_speed: 1.0,
            degenerate_axis_threshold: 0.1,
            angular_velocity_epsilon: 1e-4,
            tumble_blend_cutoff: 0.95,
            min_return_duration: 0.01,
            min_delta_time: 1e-5,
            nominal_delta_time: 1.0 / 90.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrickSaberConfig {
    pub mod_enabled: bool,
    pub left: SaberConfig,
    pub right: SaberConfig,
    pub tuning: MotionTuning,
}

impl Default for TrickSaberConfig {
    fn default() -> Self {
        Self {
            mod_enabled: true,
            left: SaberConfig::default(),
            right: SaberConfig::default(),
            tuning: MotionTuning::default(),
        }
    }
}

impl TrickSaberConfig {
    pub fn saber(&self, hand: Handedness) -> &SaberConfig {
        match hand {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }

    pub fn saber_mut(&mut self, hand: Handedness) -> &mut SaberConfig {
        match hand {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    pub fn sanitized(&self) -> TrickSaberConfig {
        TrickSaberConfig {
            left: self.left.sanitized(Handedness::Left),
            right: self.right.sanitized(Handedness::Right),
            ..self.clone()
        }
    }

    pub fn from_json(json: &str) -> Result<TrickSaberConfig, ConfigError> {
        let config: TrickSaberConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<TrickSaberConfig, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config = TrickSaberConfig::from_json(&json)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Loads the config, writing out the defaults first if the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<TrickSaberConfig, ConfigError> {
        match TrickSaberConfig::load(path) {
            Err(ConfigError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                info!("no config at {}, writing defaults", path.display());
                let config = TrickSaberConfig::default();
                config.save(path)?;
                Ok(config)
            }
            other => other,
        }
    }
}
