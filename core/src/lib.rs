//! CHIP-8 virtual machine core: machine state, instruction decoder, executor
//! and cycle driver. Rendering, input polling and wall-clock pacing are left
//! to the frontend.

mod chip8;
mod color;
mod display;
mod error;
mod executor;
mod instruction;
mod keypad;
mod machine;
mod memory;
mod pacer;
mod quirks;
mod rng;

pub use chip8::{Chip8, Chip8Builder, RunReport, RunState, StepOutcome, StopHandle};
pub use color::{Chip8Color, ColorParseError, DEFAULT_BACKGROUND_COLOR, DEFAULT_FOREGROUND_COLOR};
pub use display::{Display, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use error::{Chip8Error, Fault, Result};
pub use executor::{execute, Effect};
pub use instruction::{Addr, Instruction, Reg};
pub use keypad::{Keypad, KEY_COUNT};
pub use machine::{Machine, Stack, Timers, FLAG_REGISTER, REGISTER_COUNT, STACK_DEPTH};
pub use memory::{
    Memory, DEFAULT_FONT, FONT_GLYPH_SIZE, FONT_START, MAX_PROGRAM_SIZE, MEMORY_SIZE,
    PROGRAM_START,
};
pub use pacer::{Pace, Pacer, DEFAULT_IPS, DEFAULT_TIMER_HZ};
pub use quirks::{Chip8Mode, Quirks};
pub use rng::{default_source, RandomSource};
