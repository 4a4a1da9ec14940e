use crate::error::{Chip8Error, Result};

pub const KEY_COUNT: usize = 16;

/// Pressed state of the hex keys 0-F.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Keypad {
        Keypad::default()
    }

    pub fn is_pressed(&self, key: usize) -> Result<bool> {
        self.keys
            .get(key)
            .copied()
            .ok_or(Chip8Error::InvalidKey { key })
    }

    pub fn set(&mut self, key: usize, pressed: bool) -> Result<()> {
        let slot = self.keys.get_mut(key).ok_or(Chip8Error::InvalidKey { key })?;
        *slot = pressed;
        Ok(())
    }

    /// Lowest key that is down now but was up in `previous`.
    pub fn newly_pressed(&self, previous: &Keypad) -> Option<u8> {
        (0..KEY_COUNT)
            .find(|&k| self.keys[k] && !previous.keys[k])
            .map(|k| k as u8)
    }
}
