/// Interpreter variants with differing instruction behaviour.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Chip8Mode {
    COSMAC_VIP,
    CHIP_48,
}

/// Behaviour that differs between historical interpreters. The default is the
/// common modern behaviour with sprites wrapping at the screen edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// Bitwise shift (8XY6 and 8XYE): copy VY into VX before shifting (COSMAC VIP)
    pub shift_uses_vy: bool,
    /// Jump with offset (BNNN/BXNN): jump to XNN plus VX (CHIP-48),
    /// instead of NNN plus V0 (COSMAC VIP)
    pub jump_with_vx: bool,
    /// Store and load memory (FX55/FX65): I is left at I + X + 1 (COSMAC VIP)
    pub load_store_increments_index: bool,
    /// Logic operations (8XY1, 8XY2, 8XY3) reset VF to 0 (COSMAC VIP)
    pub logic_resets_vf: bool,
    /// Sprites are clipped at the screen edges instead of wrapping
    pub clip_sprites: bool,
}

impl From<Chip8Mode> for Quirks {
    fn from(mode: Chip8Mode) -> Quirks {
        match mode {
            Chip8Mode::COSMAC_VIP => Quirks {
                shift_uses_vy: true,
                jump_with_vx: false,
                load_store_increments_index: true,
                logic_resets_vf: true,
                clip_sprites: true,
            },
            Chip8Mode::CHIP_48 => Quirks {
                shift_uses_vy: false,
                jump_with_vx: true,
                load_store_increments_index: false,
                logic_resets_vf: false,
                clip_sprites: true,
            },
        }
    }
}
