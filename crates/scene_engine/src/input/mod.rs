//! Input collaborator
//!
//! Behaviours poll an [`InputProvider`] once per frame. Window and device
//! polling live outside the engine; a host adapts its backend to this trait.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

/// Keyboard keys the built-in behaviours understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// Q key
    Q,
    /// E key
    E,
    /// O key
    O,
    /// Space bar
    Space,
    /// Escape key
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

impl Key {
    /// Canonical name, as used in scene files
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::W => "W",
            Self::A => "A",
            Self::S => "S",
            Self::D => "D",
            Self::Q => "Q",
            Self::E => "E",
            Self::O => "O",
            Self::Space => "Space",
            Self::Escape => "Escape",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned for an unknown key name
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown key `{0}`")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.to_ascii_lowercase().as_str() {
            "w" => Self::W,
            "a" => Self::A,
            "s" => Self::S,
            "d" => Self::D,
            "q" => Self::Q,
            "e" => Self::E,
            "o" => Self::O,
            "space" => Self::Space,
            "escape" | "esc" => Self::Escape,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            _ => return Err(UnknownKey(s.to_string())),
        };
        Ok(key)
    }
}

/// Current input-device state
pub trait InputProvider {
    /// Called by the world once at the start of every update
    fn begin_frame(&mut self) {}

    /// Whether the key is held this frame
    fn is_key_down(&self, key: Key) -> bool;

    /// Whether the key went down this frame
    fn is_key_pressed(&self, key: Key) -> bool;
}

/// Provider with every key released
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputProvider for NoInput {
    fn is_key_down(&self, _key: Key) -> bool {
        false
    }

    fn is_key_pressed(&self, _key: Key) -> bool {
        false
    }
}

/// Provider that replays a fixed list of held-key sets, one per frame
///
/// After the script runs out every key reads as released.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    frames: VecDeque<HashSet<Key>>,
    current: HashSet<Key>,
    previous: HashSet<Key>,
}

impl ScriptedInput {
    /// Create an empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame holding `keys`
    #[must_use]
    pub fn then_hold(mut self, keys: &[Key]) -> Self {
        self.frames.push_back(keys.iter().copied().collect());
        self
    }

    /// Append `count` frames holding `keys`
    #[must_use]
    pub fn then_hold_for(mut self, keys: &[Key], count: usize) -> Self {
        for _ in 0..count {
            self.frames.push_back(keys.iter().copied().collect());
        }
        self
    }

    /// Frames left in the script
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputProvider for ScriptedInput {
    fn begin_frame(&mut self) {
        self.previous = std::mem::take(&mut self.current);
        self.current = self.frames.pop_front().unwrap_or_default();
    }

    fn is_key_down(&self, key: Key) -> bool {
        self.current.contains(&key)
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        self.current.contains(&key) && !self.previous.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_round_trip() {
        for key in [Key::W, Key::Space, Key::Escape, Key::Left] {
            assert_eq!(key.name().parse::<Key>(), Ok(key));
        }
        assert_eq!("esc".parse::<Key>(), Ok(Key::Escape));
        assert!("F13".parse::<Key>().is_err());
    }

    #[test]
    fn test_scripted_input_reports_presses_once() {
        let mut input = ScriptedInput::new()
            .then_hold_for(&[Key::O], 2)
            .then_hold(&[]);

        input.begin_frame();
        assert!(input.is_key_down(Key::O));
        assert!(input.is_key_pressed(Key::O));

        input.begin_frame();
        assert!(input.is_key_down(Key::O));
        assert!(!input.is_key_pressed(Key::O));

        input.begin_frame();
        assert!(!input.is_key_down(Key::O));
        assert_eq!(input.remaining(), 0);
    }
}
