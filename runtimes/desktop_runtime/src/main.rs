use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use cgmath::{vec3, Deg, Quaternion, Rotation3, Vector3};
use clap::{Parser, ValueEnum};
use engine::{NodeId, SceneGraph, TransformTree};
use tracing::{error, info, warn, Level};
use trick_saber::{
    dispatch, ButtonBinding, Handedness, HostEvent, InputContext, SaberBound, SaberEvent,
    ScoreSubmission, Time, TrickSaber, TrickSaberConfig,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Swing the right hand and throw, then recall halfway through
    Throw,
    /// Hold the spin button on the left hand
    Spin,
    /// Spin the right saber, then throw it mid-spin
    SpinThrow,
    /// Throw the right saber, then switch the mod off while it flies
    Disable,
    /// Throw the right saber, then have the game re-create it
    Rebind,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file; created with defaults if missing
    #[arg(short, long, default_value = None)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Scenario::Throw)]
    scenario: Scenario,

    #[arg(short, long, default_value_t = 180)]
    ticks: u32,

    /// Seconds per physics tick
    #[arg(short, long, default_value_t = 1.0 / 90.0)]
    delta: f32,

    #[arg(short, long)]
    verbose: bool,
}

struct Rig {
    scene: TransformTree,
    hands: [NodeId; 2],
    sabers: [NodeId; 2],
}

impl Rig {
    pub fn new() -> Rig {
        let mut scene = TransformTree::new();
        let player = scene.create_node("player", None);
        scene.set_local_position(player, vec3(0.0, 1.0, 0.0));

        let mut hands = [player; 2];
        let mut sabers = [player; 2];
        for hand in Handedness::ALL {
            let hand_node = scene.create_node(&format!("{:?} hand", hand), Some(player));
            let saber = scene.create_node(&format!("{:?} saber", hand), Some(hand_node));
            scene.set_local_rotation(saber, Quaternion::from_angle_x(Deg(-10.0)));
            hands[hand.index()] = hand_node;
            sabers[hand.index()] = saber;
        }

        let mut rig = Rig {
            scene,
            hands,
            sabers,
        };
        rig.move_hands(0.0);
        rig
    }

    pub fn saber_bound(&self, hand: Handedness) -> HostEvent {
        HostEvent::SaberBound(SaberBound {
            handedness: hand,
            saber: self.sabers[hand.index()],
            hand: Some(self.hands[hand.index()]),
        })
    }

    /// Hands sweep along arcs in front of the player
    pub fn move_hands(&mut self, seconds: f32) {
        for hand in Handedness::ALL {
            let side = match hand {
                Handedness::Left => -1.0,
                Handedness::Right => 1.0,
            };
            let phase = seconds * 3.0 + side;
            let position = vec3(
                side * (0.25 + 0.15 * phase.cos()),
                0.2 * phase.sin(),
                0.4 + 0.1 * phase.sin(),
            );
            let node = self.hands[hand.index()];
            self.scene.set_local_position(node, position);
            self.scene
                .set_local_rotation(node, Quaternion::from_angle_z(Deg(side * 20.0 * phase.sin())));
        }
    }

    /// The game drops the old saber object and spawns a fresh one in the hand
    pub fn recreate_saber(&mut self, hand: Handedness) -> HostEvent {
        self.scene.destroy_node(self.sabers[hand.index()]);
        let saber = self
            .scene
            .create_node(&format!("{:?} saber", hand), Some(self.hands[hand.index()]));
        self.scene
            .set_local_rotation(saber, Quaternion::from_angle_x(Deg(-10.0)));
        self.sabers[hand.index()] = saber;
        self.saber_bound(hand)
    }
}

struct Leaderboard {
    enabled: bool,
}

impl ScoreSubmission for Leaderboard {
    fn set_score_submission(&mut self, mod_id: &str, enabled: bool) {
        info!("score submission for {}: {}", mod_id, enabled);
        self.enabled = enabled;
    }
}

struct Script {
    scenario: Scenario,
    ticks: u32,
}

impl Script {
    fn throw_hand(&self) -> Handedness {
        match self.scenario {
            Scenario::Spin => Handedness::Left,
            _ => Handedness::Right,
        }
    }

    /// Buttons held during `tick`
    fn input(&self, tick: u32) -> InputContext {
        let mut input = InputContext::default();
        let half = self.ticks / 2;
        let hand = self.throw_hand();

        match self.scenario {
            Scenario::Throw | Scenario::Disable | Scenario::Rebind => {
                let throwing = (10..half).contains(&tick);
                input
                    .hand_mut(hand)
                    .set_pressed(ButtonBinding::IndexTrigger, throwing);
            }
            Scenario::Spin => {
                let spinning = (5..self.ticks / 4 * 3).contains(&tick);
                input
                    .hand_mut(hand)
                    .set_pressed(ButtonBinding::HandTrigger, spinning);
            }
            Scenario::SpinThrow => {
                input
                    .hand_mut(hand)
                    .set_pressed(ButtonBinding::HandTrigger, tick >= 5);
                input
                    .hand_mut(hand)
                    .set_pressed(ButtonBinding::IndexTrigger, (20..half).contains(&tick));
            }
        }

        input
    }
}

fn load_config(path: Option<&PathBuf>) -> TrickSaberConfig {
    let Some(path) = path else {
        let mut config = TrickSaberConfig::default();
        for hand in Handedness::ALL {
            config.saber_mut(hand).throw_button = ButtonBinding::IndexTrigger;
            config.saber_mut(hand).spin_button = ButtonBinding::HandTrigger;
        }
        return config;
    };

    match TrickSaberConfig::load_or_default(path) {
        Ok(config) => {
            for hand in Handedness::ALL {
                let saber = config.saber(hand);
                if !saber.throw_button.is_assigned() || !saber.spin_button.is_assigned() {
                    warn!(
                        "{:?}: throw button {} / spin button {}",
                        hand,
                        saber.throw_button.label(hand),
                        saber.spin_button.label(hand)
                    );
                }
            }
            config
        }
        Err(err) => {
            error!("unable to load config from {}: {}", path.display(), err);
            TrickSaberConfig::default()
        }
    }
}

fn log_event(tick: u32, event: &SaberEvent) {
    info!("[{}] {:?}", tick, event);
}

pub fn main() {
    let args = Args::parse();
    let max_level = if args.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(max_level).init();

    let mut config = load_config(args.config.as_ref());
    let script = Script {
        scenario: args.scenario,
        ticks: args.ticks,
    };
    let delta = args.delta;

    let mut rig = Rig::new();
    let mut leaderboard = Leaderboard { enabled: true };
    let mut trick_saber = TrickSaber::new();
    trick_saber.activate(&mut leaderboard);

    let mut pending: VecDeque<HostEvent> = Handedness::ALL
        .into_iter()
        .map(|hand| rig.saber_bound(hand))
        .collect();
    pending.push_back(HostEvent::MenuActivated {
        first_activation: true,
    });

    let mut total = Duration::ZERO;
    for tick in 0..args.ticks {
        if tick == args.ticks / 2 {
            match script.scenario {
                Scenario::Disable => {
                    info!("disabling mod");
                    config.mod_enabled = false;
                }
                Scenario::Rebind => pending.push_back(rig.recreate_saber(script.throw_hand())),
                _ => (),
            }
        }

        let input = script.input(tick);

        // Host events land between ticks
        while let Some(event) = pending.pop_front() {
            for saber_event in dispatch(&mut trick_saber, event, &mut rig.scene, &input, &config) {
                log_event(tick, &saber_event);
            }
        }

        let time = Time::from_delta(delta, total);
        total += time.elapsed;
        rig.move_hands(total.as_secs_f32());

        let events = dispatch(
            &mut trick_saber,
            HostEvent::FixedUpdate(time),
            &mut rig.scene,
            &input,
            &config,
        );
        for event in events.iter() {
            log_event(tick, event);
        }
    }

    for hand in Handedness::ALL {
        let saber = trick_saber.saber(hand);
        let node = rig.sabers[hand.index()];
        let position: Vector3<f32> = rig.scene.position(node);
        info!(
            "{:?}: state {:?} spinning {} parent {:?} position {:?}",
            hand,
            saber.state(),
            saber.is_spinning(),
            rig.scene.parent(node).and_then(|p| rig.scene.name(p)),
            position
        );
    }

    for event in trick_saber.deactivate(&mut rig.scene, &mut leaderboard) {
        log_event(args.ticks, &event);
    }
    info!("score submission enabled: {}", leaderboard.enabled);
}
