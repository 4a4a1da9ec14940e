use std::fmt;

/// 12-bit memory address
pub type Addr = u16;
/// Register index 0x0-0xF
pub type Reg = u8;

/// A decoded CHIP-8 instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /* 0NNN */ Sys(Addr),
    /* 00E0 */ Cls,
    /* 00EE */ Ret,
    /* 1NNN */ Jump(Addr),
    /* 2NNN */ Call(Addr),
    /* 3XNN */ SkipEqImm(Reg, u8),
    /* 4XNN */ SkipNeImm(Reg, u8),
    /* 5XY0 */ SkipEqReg(Reg, Reg),
    /* 6XNN */ LoadImm(Reg, u8),
    /* 7XNN */ AddImm(Reg, u8),
    /* 8XY0 */ Move(Reg, Reg),
    /* 8XY1 */ Or(Reg, Reg),
    /* 8XY2 */ And(Reg, Reg),
    /* 8XY3 */ Xor(Reg, Reg),
    /* 8XY4 */ Add(Reg, Reg),
    /* 8XY5 */ Sub(Reg, Reg), // VX = VX - VY
    /* 8XY6 */ Shr(Reg, Reg),
    /* 8XY7 */ SubN(Reg, Reg), // VX = VY - VX
    /* 8XYE */ Shl(Reg, Reg),
    /* 9XY0 */ SkipNeReg(Reg, Reg),
    /* ANNN */ LoadIndex(Addr),
    /* BNNN */ JumpOffset(Addr, Reg), // X is only used by the BXNN quirk
    /* CXNN */ Random(Reg, u8),
    /* DXYN */ Draw(Reg, Reg, u8),
    /* EX9E */ SkipKey(Reg),
    /* EXA1 */ SkipNotKey(Reg),
    /* FX07 */ LoadDelay(Reg),
    /* FX0A */ WaitKey(Reg),
    /* FX15 */ SetDelay(Reg),
    /* FX18 */ SetSound(Reg),
    /* FX1E */ AddIndex(Reg),
    /* FX29 */ LoadFont(Reg),
    /* FX33 */ Bcd(Reg),
    /* FX55 */ Store(Reg),
    /* FX65 */ Load(Reg),
    /// Bit pattern outside the instruction set
    Unknown(u16),
}

impl Instruction {
    /// Decode a big endian instruction word.
    pub fn decode(word: u16) -> Instruction {
        use Instruction::*;

        // Instruction split into nibbles(4bits) 1-4
        let n1 = ((word >> 12) & 0xF) as u8;
        let x = ((word >> 8) & 0xF) as u8;
        let y = ((word >> 4) & 0xF) as u8;
        let n = (word & 0xF) as u8;
        let nn = (word & 0xFF) as u8;
        let nnn = word & 0x0FFF;

        match (n1, x, y, n) {
            (0x0, 0x0, 0xE, 0x0) => Cls,
            (0x0, 0x0, 0xE, 0xE) => Ret,
            (0x0, _, _, _) => Sys(nnn),
            (0x1, _, _, _) => Jump(nnn),
            (0x2, _, _, _) => Call(nnn),
            (0x3, _, _, _) => SkipEqImm(x, nn),
            (0x4, _, _, _) => SkipNeImm(x, nn),
            (0x5, _, _, 0x0) => SkipEqReg(x, y),
            (0x6, _, _, _) => LoadImm(x, nn),
            (0x7, _, _, _) => AddImm(x, nn),
            (0x8, _, _, 0x0) => Move(x, y),
            (0x8, _, _, 0x1) => Or(x, y),
            (0x8, _, _, 0x2) => And(x, y),
            (0x8, _, _, 0x3) => Xor(x, y),
            (0x8, _, _, 0x4) => Add(x, y),
            (0x8, _, _, 0x5) => Sub(x, y),
            (0x8, _, _, 0x6) => Shr(x, y),
            (0x8, _, _, 0x7) => SubN(x, y),
            (0x8, _, _, 0xE) => Shl(x, y),
            (0x9, _, _, 0x0) => SkipNeReg(x, y),
            (0xA, _, _, _) => LoadIndex(nnn),
            (0xB, _, _, _) => JumpOffset(nnn, x),
            (0xC, _, _, _) => Random(x, nn),
            (0xD, _, _, _) => Draw(x, y, n),
            (0xE, _, 0x9, 0xE) => SkipKey(x),
            (0xE, _, 0xA, 0x1) => SkipNotKey(x),
            (0xF, _, 0x0, 0x7) => LoadDelay(x),
            (0xF, _, 0x0, 0xA) => WaitKey(x),
            (0xF, _, 0x1, 0x5) => SetDelay(x),
            (0xF, _, 0x1, 0x8) => SetSound(x),
            (0xF, _, 0x1, 0xE) => AddIndex(x),
            (0xF, _, 0x2, 0x9) => LoadFont(x),
            (0xF, _, 0x3, 0x3) => Bcd(x),
            (0xF, _, 0x5, 0x5) => Store(x),
            (0xF, _, 0x6, 0x5) => Load(x),
            _ => Unknown(word),
        }
    }
}

impl From<u16> for Instruction {
    fn from(word: u16) -> Instruction {
        Instruction::decode(word)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            Sys(addr) => write!(f, "SYS 0x{:03x}", addr),
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jump(addr) => write!(f, "JP 0x{:03x}", addr),
            Call(addr) => write!(f, "CALL 0x{:03x}", addr),
            SkipEqImm(x, nn) => write!(f, "SE V{:x}, 0x{:02x}", x, nn),
            SkipNeImm(x, nn) => write!(f, "SNE V{:x}, 0x{:02x}", x, nn),
            SkipEqReg(x, y) => write!(f, "SE V{:x}, V{:x}", x, y),
            LoadImm(x, nn) => write!(f, "LD V{:x}, 0x{:02x}", x, nn),
            AddImm(x, nn) => write!(f, "ADD V{:x}, 0x{:02x}", x, nn),
            Move(x, y) => write!(f, "LD V{:x}, V{:x}", x, y),
            Or(x, y) => write!(f, "OR V{:x}, V{:x}", x, y),
            And(x, y) => write!(f, "AND V{:x}, V{:x}", x, y),
            Xor(x, y) => write!(f, "XOR V{:x}, V{:x}", x, y),
            Add(x, y) => write!(f, "ADD V{:x}, V{:x}", x, y),
            Sub(x, y) => write!(f, "SUB V{:x}, V{:x}", x, y),
            Shr(x, y) => write!(f, "SHR V{:x}, V{:x}", x, y),
            SubN(x, y) => write!(f, "SUBN V{:x}, V{:x}", x, y),
            Shl(x, y) => write!(f, "SHL V{:x}, V{:x}", x, y),
            SkipNeReg(x, y) => write!(f, "SNE V{:x}, V{:x}", x, y),
            LoadIndex(addr) => write!(f, "LD I, 0x{:03x}", addr),
            JumpOffset(addr, _) => write!(f, "JP V0, 0x{:03x}", addr),
            Random(x, nn) => write!(f, "RND V{:x}, 0x{:02x}", x, nn),
            Draw(x, y, n) => write!(f, "DRW V{:x}, V{:x}, {}", x, y, n),
            SkipKey(x) => write!(f, "SKP V{:x}", x),
            SkipNotKey(x) => write!(f, "SKNP V{:x}", x),
            LoadDelay(x) => write!(f, "LD V{:x}, DT", x),
            WaitKey(x) => write!(f, "LD V{:x}, K", x),
            SetDelay(x) => write!(f, "LD DT, V{:x}", x),
            SetSound(x) => write!(f, "LD ST, V{:x}", x),
            AddIndex(x) => write!(f, "ADD I, V{:x}", x),
            LoadFont(x) => write!(f, "LD F, V{:x}", x),
            Bcd(x) => write!(f, "LD B, V{:x}", x),
            Store(x) => write!(f, "LD [I], V{:x}", x),
            Load(x) => write!(f, "LD V{:x}, [I]", x),
            Unknown(word) => write!(f, "??? 0x{:04x}", word),
        }
    }
}
