use crate::display::Display;
use crate::error::{Chip8Error, Result};
use crate::keypad::Keypad;
use crate::memory::{Memory, PROGRAM_START};

pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;
/// VF doubles as carry, borrow and collision flag
pub const FLAG_REGISTER: usize = 0xF;

/// Fixed depth call stack of return addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stack {
    entries: [u16; STACK_DEPTH],
    sp: usize,
}

impl Stack {
    pub fn push(&mut self, addr: u16) -> Result<()> {
        if self.sp >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow);
        }
        self.entries[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.entries[self.sp])
    }

    pub fn is_full(&self) -> bool {
        self.sp == STACK_DEPTH
    }

    pub fn len(&self) -> usize {
        self.sp
    }

    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    /// Return addresses, oldest first.
    pub fn as_slice(&self) -> &[u16] {
        &self.entries[..self.sp]
    }
}

/// Delay and sound countdown timers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    /// Count both timers down by one, stopping at zero.
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    pub fn tone_active(&self) -> bool {
        self.sound > 0
    }
}

/// Complete CHIP-8 machine state. Holds no instruction semantics.
#[derive(Debug, Clone)]
pub struct Machine {
    /// General purpose registers V0-VF
    regs: [u8; REGISTER_COUNT],
    /// Index register
    pub index: u16,
    /// Program counter
    pub pc: u16,
    pub stack: Stack,
    pub timers: Timers,
    pub memory: Memory,
    pub display: Display,
    pub keypad: Keypad,
}

impl Machine {
    pub fn new(memory: Memory) -> Machine {
        Machine {
            regs: [0u8; REGISTER_COUNT],
            index: 0,
            pc: PROGRAM_START as u16,
            stack: Stack::default(),
            timers: Timers::default(),
            memory,
            display: Display::new(),
            keypad: Keypad::new(),
        }
    }

    pub fn reg(&self, index: usize) -> Result<u8> {
        self.regs
            .get(index)
            .copied()
            .ok_or(Chip8Error::InvalidRegister { index })
    }

    pub fn set_reg(&mut self, index: usize, value: u8) -> Result<()> {
        let reg = self
            .regs
            .get_mut(index)
            .ok_or(Chip8Error::InvalidRegister { index })?;
        *reg = value;
        Ok(())
    }

    pub fn regs(&self) -> &[u8; REGISTER_COUNT] {
        &self.regs
    }

    /// Registers indexed by a decoded nibble; the index is always in range.
    pub(crate) fn v(&self, x: u8) -> u8 {
        self.regs[(x & 0xF) as usize]
    }

    pub(crate) fn v_mut(&mut self, x: u8) -> &mut u8 {
        &mut self.regs[(x & 0xF) as usize]
    }

    pub(crate) fn set_flag(&mut self, flag: bool) {
        self.regs[FLAG_REGISTER] = flag as u8;
    }
}
