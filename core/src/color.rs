use std::str::FromStr;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

pub const DEFAULT_BACKGROUND_COLOR: Chip8Color = Chip8Color::new(0, 0, 0);
pub const DEFAULT_FOREGROUND_COLOR: Chip8Color = Chip8Color::new(255, 255, 255);

/// One framebuffer pixel, laid out as a little endian RGBX8888 word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct Chip8Color {
    padding: u8,
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Chip8Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Chip8Color {
        Chip8Color { r, g, b, padding: 0 }
    }

    /// View a framebuffer as raw bytes for texture upload.
    pub fn as_bytes(frame: &[Chip8Color]) -> &[u8] {
        bytemuck::cast_slice(frame)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse hex color {0:?}, expected RRGGBB or 0xRRGGBB")]
pub struct ColorParseError(String);

impl FromStr for Chip8Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Chip8Color, ColorParseError> {
        let err = || ColorParseError(s.to_string());
        let hex = s.strip_prefix("0x").unwrap_or(s);

        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| err())
        };

        Ok(Chip8Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}
