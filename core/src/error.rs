use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Fatal conditions raised by the machine substrate or the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("unknown opcode {opcode:#06X}")]
    UnknownOpcode { opcode: u16 },

    #[error("memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("stack overflow: subroutine nesting exceeds 16 levels")]
    StackOverflow,

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("program is too large ({size} bytes), max size is {max_size} bytes")]
    ProgramTooLarge { size: usize, max_size: usize },

    #[error("register index {index} is out of range")]
    InvalidRegister { index: usize },

    #[error("key {key} is out of range")]
    InvalidKey { key: usize },

    #[error("font sprite must be 80 bytes, got {size}")]
    InvalidFont { size: usize },
}

/// A fatal error together with the instruction that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{error} (pc {pc:#06X}, opcode {opcode:#06X})")]
pub struct Fault {
    /// Fetch address of the failing instruction
    pub pc: u16,
    /// Raw instruction word
    pub opcode: u16,
    #[source]
    pub error: Chip8Error,
}
