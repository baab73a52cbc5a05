// Input context is an abstraction layer over the motion controllers that the host provides.
// The controllers only matter here as a set of digital buttons per hand; hand poses come from
// the scene graph instead.

use bitflags::bitflags;

use crate::config::ButtonBinding;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub const ALL: [Handedness; 2] = [Handedness::Left, Handedness::Right];

    pub fn index(self) -> usize {
        match self {
            Handedness::Left => 0,
            Handedness::Right => 1,
        }
    }
}

bitflags! {
    pub struct ControllerButtons: u8 {
        // A on the right controller, X on the left
        const ONE = 0b0001;
        // B on the right controller, Y on the left
        const TWO = 0b0010;
        const INDEX_TRIGGER = 0b0100;
        const HAND_TRIGGER = 0b1000;
    }
}

impl ControllerButtons {
    pub fn from_binding(binding: ButtonBinding) -> ControllerButtons {
        match binding {
            ButtonBinding::None => ControllerButtons::empty(),
            ButtonBinding::One => ControllerButtons::ONE,
            ButtonBinding::Two => ControllerButtons::TWO,
            ButtonBinding::IndexTrigger => ControllerButtons::INDEX_TRIGGER,
            ButtonBinding::HandTrigger => ControllerButtons::HAND_TRIGGER,
        }
    }
}

pub trait InputSource {
    fn is_pressed(&self, binding: ButtonBinding, hand: Handedness) -> bool;
}

#[derive(Debug, Clone)]
pub struct InputContext {
    pub left_hand: Hand,
    pub right_hand: Hand,
}

impl InputContext {
    pub fn default() -> InputContext {
        InputContext {
            left_hand: Hand::default(),
            right_hand: Hand::default(),
        }
    }

    pub fn hand(&self, hand: Handedness) -> &Hand {
        match hand {
            Handedness::Left => &self.left_hand,
            Handedness::Right => &self.right_hand,
        }
    }

    pub fn hand_mut(&mut self, hand: Handedness) -> &mut Hand {
        match hand {
            Handedness::Left => &mut self.left_hand,
            Handedness::Right => &mut self.right_hand,
        }
    }
}

impl InputSource for InputContext {
    fn is_pressed(&self, binding: ButtonBinding, hand: Handedness) -> bool {
        let mask = ControllerButtons::from_binding(binding);
        // An empty mask is trivially 'contained', so unassigned has to be ruled out first
        !mask.is_empty() && self.hand(hand).buttons.contains(mask)
    }
}

// Context for an individual hand (motion controller)
#[derive(Debug, Clone)]
pub struct Hand {
    pub buttons: ControllerButtons,
}

impl Hand {
    pub fn default() -> Hand {
        Hand {
            buttons: ControllerButtons::empty(),
        }
    }

    pub fn set_pressed(&mut self, binding: ButtonBinding, pressed: bool) {
        self.buttons
            .set(ControllerButtons::from_binding(binding), pressed);
    }
}
