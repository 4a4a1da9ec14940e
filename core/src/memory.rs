use log::info;

use crate::error::{Chip8Error, Result};

pub const MEMORY_SIZE: usize = 0x1000;
/// Programs are loaded here, everything below belongs to the interpreter.
pub const PROGRAM_START: usize = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START;
/// Location of the hex font sprites
pub const FONT_START: usize = 0x050;
/// Height in bytes of a single font glyph
pub const FONT_GLYPH_SIZE: usize = 5;

pub static DEFAULT_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// 4 KiB of byte addressable memory. Every access is range checked.
#[derive(Clone)]
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Memory {
    /// Zeroed memory with the given font copied to [`FONT_START`].
    pub fn with_font(font: &[u8]) -> Result<Memory> {
        if font.len() != DEFAULT_FONT.len() {
            return Err(Chip8Error::InvalidFont { size: font.len() });
        }

        let mut memory = Memory {
            bytes: Box::new([0u8; MEMORY_SIZE]),
        };
        memory.write_slice(FONT_START, font)?;
        Ok(memory)
    }

    /// Copy a program image into memory starting at [`PROGRAM_START`].
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max_size: MAX_PROGRAM_SIZE,
            });
        }

        self.write_slice(PROGRAM_START, program)?;
        info!("Loaded program [size: {}]", program.len());
        Ok(())
    }

    pub fn read_u8(&self, addr: usize) -> Result<u8> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })
    }

    pub fn write_u8(&mut self, addr: usize, data: u8) -> Result<()> {
        let byte = self
            .bytes
            .get_mut(addr)
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })?;
        *byte = data;
        Ok(())
    }

    /// Big endian instruction word at `addr`.
    pub fn read_u16_be(&self, addr: usize) -> Result<u16> {
        let hi = self.read_u8(addr)?;
        let lo = self.read_u8(addr + 1)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    pub fn read_slice(&self, addr: usize, len: usize) -> Result<&[u8]> {
        self.check_range(addr, len)?;
        Ok(&self.bytes[addr..addr + len])
    }

    /// Writes the whole slice or nothing.
    pub fn write_slice(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;
        self.bytes[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Fails with the first address past the end of memory, if any.
    pub fn check_range(&self, addr: usize, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let last = addr + len - 1;
        if addr >= MEMORY_SIZE {
            Err(Chip8Error::MemoryOutOfBounds { address: addr })
        } else if last >= MEMORY_SIZE {
            Err(Chip8Error::MemoryOutOfBounds { address: MEMORY_SIZE })
        } else {
            Ok(())
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory {
            bytes: Box::new([0u8; MEMORY_SIZE]),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory").field("size", &MEMORY_SIZE).finish()
    }
}
