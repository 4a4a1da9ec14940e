use log::trace;

use crate::error::{Chip8Error, Result};
use crate::instruction::Instruction;
use crate::machine::Machine;
use crate::memory::{FONT_GLYPH_SIZE, FONT_START};
use crate::quirks::Quirks;
use crate::rng::RandomSource;

/// Observable side effect of a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// The display buffer changed
    DisplayUpdated,
    /// Sound timer was loaded with a non-zero value
    ToneOn,
    /// Sound timer was loaded with zero
    ToneOff,
    /// FX0A: block until a key is pressed, storing it in the register
    KeyWait(u8),
}

/// Apply one instruction to the machine.
///
/// The program counter must already point past the instruction. Either the
/// instruction completes or an error is returned with the machine untouched.
pub fn execute(
    machine: &mut Machine,
    inst: Instruction,
    quirks: &Quirks,
    rng: &mut dyn RandomSource,
) -> Result<Effect> {
    use Instruction::*;

    match inst {
        // 0NNN: machine code routine, not supported by interpreters
        Sys(addr) => {
            trace!("sys: ignoring call to 0x{:03x}", addr);
        }
        // 00E0: Clear screen
        Cls => {
            machine.display.clear();
            return Ok(Effect::DisplayUpdated);
        }
        // 00EE: Return from subroutine
        Ret => {
            machine.pc = machine.stack.pop()?;
            trace!("ret: set PC to 0x{:03x}", machine.pc);
        }
        // 1NNN: Jump to NNN
        Jump(addr) => {
            machine.pc = addr;
        }
        // 2NNN: Call subroutine at NNN
        Call(addr) => {
            machine.stack.push(machine.pc)?;
            machine.pc = addr;
            trace!("call: pushed return address, depth {}", machine.stack.len());
        }
        // 3XNN: Skip next instruction if VX == NN
        SkipEqImm(x, nn) => machine.pc += skip(machine.v(x) == nn),
        // 4XNN: Skip next instruction if VX != NN
        SkipNeImm(x, nn) => machine.pc += skip(machine.v(x) != nn),
        // 5XY0: Skip next instruction if VX == VY
        SkipEqReg(x, y) => machine.pc += skip(machine.v(x) == machine.v(y)),
        // 9XY0: Skip next instruction if VX != VY
        SkipNeReg(x, y) => machine.pc += skip(machine.v(x) != machine.v(y)),
        // 6XNN: Set VX to NN
        LoadImm(x, nn) => *machine.v_mut(x) = nn,
        // 7XNN: Add NN to VX, VF untouched
        AddImm(x, nn) => {
            let res = machine.v(x).wrapping_add(nn);
            *machine.v_mut(x) = res;
        }
        // 8XY0: Set VX to VY
        Move(x, y) => *machine.v_mut(x) = machine.v(y),
        // 8XY1, 8XY2, 8XY3: Binary OR, AND, XOR
        Or(x, y) => logic(machine, quirks, x, y, |a, b| a | b),
        And(x, y) => logic(machine, quirks, x, y, |a, b| a & b),
        Xor(x, y) => logic(machine, quirks, x, y, |a, b| a ^ b),
        // 8XY4: VX += VY, VF is the carry
        Add(x, y) => {
            let (res, carry) = machine.v(x).overflowing_add(machine.v(y));
            *machine.v_mut(x) = res;
            machine.set_flag(carry);
        }
        // 8XY5: VX -= VY, VF is set when there is no borrow
        Sub(x, y) => {
            let (res, borrow) = machine.v(x).overflowing_sub(machine.v(y));
            *machine.v_mut(x) = res;
            machine.set_flag(!borrow);
        }
        // 8XY7: VX = VY - VX, VF is set when there is no borrow
        SubN(x, y) => {
            let (res, borrow) = machine.v(y).overflowing_sub(machine.v(x));
            *machine.v_mut(x) = res;
            machine.set_flag(!borrow);
        }
        // 8XY6: Shift right, VF is the bit shifted out
        Shr(x, y) => {
            let src = if quirks.shift_uses_vy { machine.v(y) } else { machine.v(x) };
            *machine.v_mut(x) = src >> 1;
            machine.set_flag(src & 0x01 != 0);
        }
        // 8XYE: Shift left, VF is the bit shifted out
        Shl(x, y) => {
            let src = if quirks.shift_uses_vy { machine.v(y) } else { machine.v(x) };
            *machine.v_mut(x) = src << 1;
            machine.set_flag(src & 0x80 != 0);
        }
        // ANNN: Set I to NNN
        LoadIndex(addr) => machine.index = addr,
        // BNNN: Jump to NNN + V0, or XNN + VX with the quirk
        JumpOffset(addr, x) => {
            let offset = if quirks.jump_with_vx { machine.v(x) } else { machine.v(0) };
            machine.pc = addr + offset as u16;
            trace!("jump_with_offset: set PC to 0x{:03x}", machine.pc);
        }
        // CXNN: VX = random byte AND NN
        Random(x, nn) => *machine.v_mut(x) = rng.next_byte() & nn,
        // DXYN: XOR an N byte sprite from I onto the screen at (VX, VY)
        Draw(x, y, n) => {
            let (vx, vy) = (machine.v(x), machine.v(y));
            let rows = machine.memory.read_slice(machine.index as usize, n as usize)?;
            let collision = machine.display.draw_sprite(vx, vy, rows, quirks.clip_sprites);
            machine.set_flag(collision);
            return Ok(Effect::DisplayUpdated);
        }
        // EX9E: Skip next instruction if key VX is pressed
        SkipKey(x) => {
            let pressed = machine.keypad.is_pressed((machine.v(x) & 0xF) as usize)?;
            machine.pc += skip(pressed);
        }
        // EXA1: Skip next instruction if key VX is not pressed
        SkipNotKey(x) => {
            let pressed = machine.keypad.is_pressed((machine.v(x) & 0xF) as usize)?;
            machine.pc += skip(!pressed);
        }
        // FX07: VX = delay timer
        LoadDelay(x) => *machine.v_mut(x) = machine.timers.delay,
        // FX0A: Wait for a key press, the cycle driver stores the key
        WaitKey(x) => return Ok(Effect::KeyWait(x)),
        // FX15: delay timer = VX
        SetDelay(x) => machine.timers.delay = machine.v(x),
        // FX18: sound timer = VX
        SetSound(x) => {
            machine.timers.sound = machine.v(x);
            return Ok(if machine.timers.tone_active() {
                Effect::ToneOn
            } else {
                Effect::ToneOff
            });
        }
        // FX1E: I += VX
        AddIndex(x) => machine.index = machine.index.wrapping_add(machine.v(x) as u16),
        // FX29: Point I at the font glyph for the low nibble of VX
        LoadFont(x) => {
            let glyph = (machine.v(x) & 0xF) as usize;
            machine.index = (FONT_START + glyph * FONT_GLYPH_SIZE) as u16;
        }
        // FX33: Store the decimal digits of VX at I, I+1, I+2
        Bcd(x) => {
            let v = machine.v(x);
            machine
                .memory
                .write_slice(machine.index as usize, &[v / 100, (v / 10) % 10, v % 10])?;
        }
        // FX55: Store V0-VX at I..=I+X
        Store(x) => {
            let count = x as usize + 1;
            let regs = machine.regs()[..count].to_vec();
            machine.memory.write_slice(machine.index as usize, &regs)?;
            if quirks.load_store_increments_index {
                machine.index += count as u16;
            }
        }
        // FX65: Load V0-VX from I..=I+X
        Load(x) => {
            let count = x as usize + 1;
            let data = machine.memory.read_slice(machine.index as usize, count)?.to_vec();
            for (i, byte) in data.into_iter().enumerate() {
                *machine.v_mut(i as u8) = byte;
            }
            if quirks.load_store_increments_index {
                machine.index += count as u16;
            }
        }
        Unknown(opcode) => return Err(Chip8Error::UnknownOpcode { opcode }),
    }

    Ok(Effect::None)
}

/// Extra program counter advance for a skip instruction.
fn skip(condition: bool) -> u16 {
    if condition {
        2
    } else {
        0
    }
}

fn logic(machine: &mut Machine, quirks: &Quirks, x: u8, y: u8, op: fn(u8, u8) -> u8) {
    let res = op(machine.v(x), machine.v(y));
    *machine.v_mut(x) = res;
    if quirks.logic_resets_vf {
        machine.set_flag(false);
    }
}

#[cfg(test)]
mod tests {
    use crate::chip8::{Chip8, Chip8Builder};
    use crate::display::{SCREEN_HEIGHT, SCREEN_WIDTH};
    use crate::error::Chip8Error;
    use crate::executor::Effect;
    use crate::instruction::Instruction;
    use crate::quirks::Quirks;
    use crate::rng::RandomSource;
    use crate::StepOutcome;

    /// Replays a fixed byte sequence
    struct Sequence(Vec<u8>, usize);

    impl RandomSource for Sequence {
        fn next_byte(&mut self) -> u8 {
            let b = self.0[self.1 % self.0.len()];
            self.1 += 1;
            b
        }
    }

    fn assert_stack(chip: &Chip8, expected: &[u16]) {
        assert_eq!(chip.machine().stack.as_slice(), expected, "Unexpected stack content");
    }

    fn assert_regs(chip: &Chip8, non_zero_regs: &[(u8, u8)]) {
        for reg in 0..16u8 {
            let expected = non_zero_regs
                .iter()
                .find(|v| v.0 == reg)
                .map(|v| v.1)
                .unwrap_or(0);
            assert_eq!(
                chip.machine().regs()[reg as usize], expected,
                "Expected register 0x{:x} to contain 0x{:02x}",
                reg, expected
            );
        }
    }

    fn setup_with_quirks(rom: &[u8], quirks: Quirks) -> Chip8 {
        Chip8Builder::new()
            .with_rom(rom.to_vec())
            .with_random_source(Sequence(vec![0x3C, 0xDB, 0xA1], 0))
            .with_quirks(quirks)
            .build()
            .unwrap()
    }

    fn setup(rom: &[u8]) -> Chip8 {
        setup_with_quirks(rom, Quirks::default())
    }

    fn step(chip: &mut Chip8) -> Effect {
        match chip.step().unwrap() {
            StepOutcome::Executed(_, effect) => effect,
            other => panic!("Unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_clear_screen() {
        // Arrange: Setup chip8 emulator
        let mut chip = setup(&[0x00, 0xe0]);
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                chip.machine_mut().display.set_pixel(x, y, true);
            }
        }

        // Act: Step CPU Instruction
        let effect = step(&mut chip);

        // Assert: CPU State
        assert_eq!(effect, Effect::DisplayUpdated);
        assert_regs(&chip, &[]);
        assert_eq!(chip.machine().pc, 0x202);
        assert!(chip.display().pixels().iter().all(|&p| !p));
    }

    #[test]
    fn test_sys_is_ignored() {
        let mut chip = setup(&[0x03, 0x45]);

        let effect = step(&mut chip);

        assert_eq!(effect, Effect::None);
        assert_regs(&chip, &[]);
        assert_eq!(chip.machine().pc, 0x202);
        assert_stack(&chip, &[]);
    }

    #[test]
    fn test_jump() {
        // Arrange: Setup chip8 emulator
        let mut chip = setup(&[0x1A, 0xB0]);

        // Act: Step CPU Instruction
        step(&mut chip);

        // Assert: CPU State
        assert_regs(&chip, &[]);
        assert_eq!(chip.machine().index, 0);
        assert_eq!(chip.machine().pc, 0xAB0);
        assert_stack(&chip, &[]);
    }

    #[test]
    fn test_call_subroutine() {
        // Arrange: Setup chip8 emulator
        let mut chip = setup(&[0x2A, 0xBA]);

        // Act: Step CPU Instruction
        step(&mut chip);

        // Assert: CPU State
        assert_eq!(chip.machine().pc, 0x0ABA);
        assert_stack(&chip, &[0x202]);
    }

    #[test]
    fn test_call_and_return() {
        // Arrange: CALL 0x206; CLS; padding; RET
        let mut chip = setup(&[0x22, 0x06, 0x00, 0xE0, 0x00, 0x00, 0x00, 0xEE]);

        // Act: Step CALL and RET
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x206);
        step(&mut chip);

        // Assert: Back after the call
        assert_eq!(chip.machine().pc, 0x202);
        assert_stack(&chip, &[]);
    }

    #[test]
    fn test_return_empty_stack() {
        let mut chip = setup(&[0x00, 0xEE]);

        let fault = chip.step().unwrap_err();

        assert_eq!(fault.error, Chip8Error::StackUnderflow);
        assert_eq!(fault.pc, 0x200);
        assert_eq!(fault.opcode, 0x00EE);
    }

    #[test]
    fn test_call_stack_overflow() {
        // Arrange: Subroutine at 0x200 calling itself
        let mut chip = setup(&[0x22, 0x00]);
        for _ in 0..16 {
            step(&mut chip);
        }
        assert_eq!(chip.machine().stack.len(), 16);

        // Act: 17th nested call
        let fault = chip.step().unwrap_err();

        // Assert: Nothing was pushed
        assert_eq!(fault.error, Chip8Error::StackOverflow);
        assert_eq!(chip.machine().stack.len(), 16);
        assert_eq!(chip.machine().pc, 0x200);
    }

    #[test]
    fn test_skip_eq_immediate() {
        // Arrange: Setup chip8 emulator
        let mut chip = setup(&[0x30, 0xAA]);
        chip.machine_mut().set_reg(0x0, 0xAA).unwrap();

        // Act: Step CPU Instruction
        step(&mut chip);

        // Assert: CPU State
        assert_regs(&chip, &[(0x0, 0xAA)]);
        assert_eq!(chip.machine().pc, 0x0204);
    }

    #[test]
    fn test_skip_eq_immediate_not_taken() {
        let mut chip = setup(&[0x30, 0xAA]);

        step(&mut chip);

        assert_eq!(chip.machine().pc, 0x0202);
    }

    #[test]
    fn test_skip_neq_immediate() {
        let mut chip = setup(&[0x41, 0xAA]);
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x0204);

        let mut chip = setup(&[0x41, 0xAA]);
        chip.machine_mut().set_reg(0x1, 0xAA).unwrap();
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x0202);
    }

    #[test]
    fn test_skip_eq_reg() {
        let mut chip = setup(&[0x5A, 0xB0]);
        chip.machine_mut().set_reg(0xA, 0xDD).unwrap();
        chip.machine_mut().set_reg(0xB, 0xDD).unwrap();
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x0204);

        let mut chip = setup(&[0x5A, 0xB0]);
        chip.machine_mut().set_reg(0xA, 0xCC).unwrap();
        chip.machine_mut().set_reg(0xB, 0xDD).unwrap();
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x0202);
    }

    #[test]
    fn test_skip_neq_reg() {
        let mut chip = setup(&[0x9A, 0xB0]);
        chip.machine_mut().set_reg(0xA, 0xDD).unwrap();
        chip.machine_mut().set_reg(0xB, 0xDD).unwrap();
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x0202);

        let mut chip = setup(&[0x9A, 0xB0]);
        chip.machine_mut().set_reg(0xA, 0xCC).unwrap();
        chip.machine_mut().set_reg(0xB, 0xDD).unwrap();
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x0204);
    }

    #[test]
    fn test_set_immediate() {
        let mut chip = setup(&[0x64, 0xAB]);

        step(&mut chip);

        assert_regs(&chip, &[(0x4, 0xAB)]);
        assert_eq!(chip.machine().pc, 0x202);
    }

    #[test]
    fn test_add_immediate_wraps_without_flag() {
        // Arrange: Setup chip8 emulator
        let mut chip = setup(&[0x79, 0xBA]);
        chip.machine_mut().set_reg(0x9, 0xAB).unwrap();

        // Act: Step CPU Instruction
        step(&mut chip);

        // Assert: CPU State
        assert_regs(&chip, &[(0x9, 0x65)]);
    }

    #[test]
    fn test_move() {
        let mut chip = setup(&[0x81, 0x20]);
        chip.machine_mut().set_reg(0x2, 0x5A).unwrap();

        step(&mut chip);

        assert_regs(&chip, &[(0x1, 0x5A), (0x2, 0x5A)]);
    }

    #[test]
    fn test_binary_ops() {
        let cases = [
            (0x21, 0xF0, 0x0F, 0xFF),
            (0x22, 0xF1, 0x0F, 0x01),
            (0x23, 0xAB, 0xBA, 0x11),
        ];

        for (low, a, b, expected) in cases {
            let mut chip = setup(&[0x81, low]);
            chip.machine_mut().set_reg(0x1, a).unwrap();
            chip.machine_mut().set_reg(0x2, b).unwrap();
            chip.machine_mut().set_reg(0xF, 0x7).unwrap();

            step(&mut chip);

            assert_regs(&chip, &[(0x1, expected), (0x2, b), (0xF, 0x7)]);
        }
    }

    #[test]
    fn test_binary_ops_reset_vf_quirk() {
        let quirks = Quirks { logic_resets_vf: true, ..Quirks::default() };
        let mut chip = setup_with_quirks(&[0x81, 0x21], quirks);
        chip.machine_mut().set_reg(0x1, 0xF0).unwrap();
        chip.machine_mut().set_reg(0xF, 0x7).unwrap();

        step(&mut chip);

        assert_regs(&chip, &[(0x1, 0xF0)]);
    }

    #[test]
    fn test_add_reg_no_carry() {
        let mut chip = setup(&[0x84, 0x54]);
        chip.machine_mut().set_reg(0x4, 0x8B).unwrap();
        chip.machine_mut().set_reg(0x5, 0x4F).unwrap();

        step(&mut chip);

        assert_regs(&chip, &[(0x4, 0xDA), (0x5, 0x4F)]);
    }

    #[test]
    fn test_add_reg_carry() {
        let mut chip = setup(&[0x84, 0x54]);
        chip.machine_mut().set_reg(0x4, 0xFF).unwrap();
        chip.machine_mut().set_reg(0x5, 0x02).unwrap();

        step(&mut chip);

        assert_regs(&chip, &[(0x4, 0x01), (0x5, 0x02), (0xF, 0x01)]);
    }

    #[test]
    fn test_add_into_vf_keeps_flag() {
        // 8FE4: the flag write wins over the sum
        let mut chip = setup(&[0x8F, 0xE4]);
        chip.machine_mut().set_reg(0xF, 0x10).unwrap();
        chip.machine_mut().set_reg(0xE, 0x10).unwrap();

        step(&mut chip);

        assert_regs(&chip, &[(0xE, 0x10), (0xF, 0x00)]);
    }

    #[test]
    fn test_sub_reg_xy() {
        let cases = [
            (0xFF, 0xEE, 0x11, 1),
            (0xFF, 0xFF, 0x00, 1),
            (0xEE, 0xFF, 0xEF, 0),
        ];

        for (a, b, expected, flag) in cases {
            let mut chip = setup(&[0x81, 0x25]);
            chip.machine_mut().set_reg(0x1, a).unwrap();
            chip.machine_mut().set_reg(0x2, b).unwrap();

            step(&mut chip);

            assert_regs(&chip, &[(0x1, expected), (0x2, b), (0xF, flag)]);
        }
    }

    #[test]
    fn test_sub_reg_yx() {
        let cases = [
            (0xEE, 0xFF, 0x11, 1),
            (0xFF, 0xFF, 0x00, 1),
            (0xFF, 0xEE, 0xEF, 0),
        ];

        for (a, b, expected, flag) in cases {
            let mut chip = setup(&[0x81, 0x27]);
            chip.machine_mut().set_reg(0x1, a).unwrap();
            chip.machine_mut().set_reg(0x2, b).unwrap();

            step(&mut chip);

            assert_regs(&chip, &[(0x1, expected), (0x2, b), (0xF, flag)]);
        }
    }

    #[test]
    fn test_shr() {
        let mut chip = setup(&[0x81, 0x26]);
        chip.machine_mut().set_reg(0x1, 0x4).unwrap();
        step(&mut chip);
        assert_regs(&chip, &[(0x1, 0x2)]);

        let mut chip = setup(&[0x81, 0x26]);
        chip.machine_mut().set_reg(0x1, 0xFF).unwrap();
        step(&mut chip);
        assert_regs(&chip, &[(0x1, 0x7F), (0xF, 0x1)]);
    }

    #[test]
    fn test_shr_vy_quirk() {
        let quirks = Quirks { shift_uses_vy: true, ..Quirks::default() };
        let mut chip = setup_with_quirks(&[0x81, 0x26], quirks);
        chip.machine_mut().set_reg(0x1, 0x44).unwrap();
        chip.machine_mut().set_reg(0x2, 0xFF).unwrap();

        step(&mut chip);

        assert_regs(&chip, &[(0x1, 0x7F), (0x2, 0xFF), (0xF, 0x1)]);
    }

    #[test]
    fn test_shl() {
        let mut chip = setup(&[0x81, 0x2E]);
        chip.machine_mut().set_reg(0x1, 0x2).unwrap();
        step(&mut chip);
        assert_regs(&chip, &[(0x1, 0x4)]);

        let mut chip = setup(&[0x81, 0x2E]);
        chip.machine_mut().set_reg(0x1, 0xFF).unwrap();
        step(&mut chip);
        assert_regs(&chip, &[(0x1, 0xFE), (0xF, 0x1)]);
    }

    #[test]
    fn test_shl_vy_quirk() {
        let quirks = Quirks { shift_uses_vy: true, ..Quirks::default() };
        let mut chip = setup_with_quirks(&[0x81, 0x2E], quirks);
        chip.machine_mut().set_reg(0x1, 0x44).unwrap();
        chip.machine_mut().set_reg(0x2, 0x81).unwrap();

        step(&mut chip);

        assert_regs(&chip, &[(0x1, 0x02), (0x2, 0x81), (0xF, 0x1)]);
    }

    #[test]
    fn test_set_index_immediate() {
        let mut chip = setup(&[0xAB, 0xCD]);

        step(&mut chip);

        assert_regs(&chip, &[]);
        assert_eq!(chip.machine().index, 0x0BCD);
        assert_eq!(chip.machine().pc, 0x0202);
    }

    #[test]
    fn test_jmp_with_offset() {
        let mut chip = setup(&[0xB4, 0x00]);
        chip.machine_mut().set_reg(0x0, 0xF0).unwrap();
        chip.machine_mut().set_reg(0x4, 0x10).unwrap();

        step(&mut chip);

        assert_eq!(chip.machine().pc, 0x04F0);
    }

    #[test]
    fn test_jmp_with_offset_vx_quirk() {
        let quirks = Quirks { jump_with_vx: true, ..Quirks::default() };
        let mut chip = setup_with_quirks(&[0xB4, 0x00], quirks);
        chip.machine_mut().set_reg(0x0, 0x10).unwrap();
        chip.machine_mut().set_reg(0x4, 0xF0).unwrap();

        step(&mut chip);

        assert_eq!(chip.machine().pc, 0x04F0);
    }

    #[test]
    fn test_rng() {
        // Arrange: Setup chip8 emulator
        let mut chip = setup(&[0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0x0F, 0xC3, 0x0]);

        // Act: Step CPU Instruction
        for _ in 0..4 {
            step(&mut chip);
        }

        // Assert: CPU State
        assert_regs(&chip, &[(0x0, 0x3C), (0x1, 0xDB), (0x2, 0x01)]);
        assert_eq!(chip.machine().pc, 0x208);
    }

    #[test]
    fn test_draw_sets_collision() {
        // Arrange: I at the "0" glyph, draw it twice at (2, 3)
        let mut chip = setup(&[0xA0, 0x50, 0xD0, 0x15, 0xD0, 0x15]);
        chip.machine_mut().set_reg(0x0, 2).unwrap();
        chip.machine_mut().set_reg(0x1, 3).unwrap();
        step(&mut chip);

        // Act: First draw
        assert_eq!(step(&mut chip), Effect::DisplayUpdated);
        assert_eq!(chip.machine().regs()[0xF], 0);
        assert!(chip.display().get_pixel(2, 3));
        assert!(chip.display().get_pixel(5, 7));
        assert!(!chip.display().get_pixel(3, 4));

        // Act: Second draw erases it
        step(&mut chip);
        assert_eq!(chip.machine().regs()[0xF], 1);
        assert!(chip.display().pixels().iter().all(|&p| !p));
    }

    #[test]
    fn test_draw_out_of_bounds() {
        let mut chip = setup(&[0xAF, 0xFE, 0xD0, 0x05]);
        step(&mut chip);
        chip.machine_mut().set_reg(0xF, 0x9).unwrap();

        let fault = chip.step().unwrap_err();

        assert_eq!(fault.error, Chip8Error::MemoryOutOfBounds { address: 0x1000 });
        assert_eq!(chip.machine().regs()[0xF], 0x9);
        assert!(chip.display().pixels().iter().all(|&p| !p));
    }

    #[test]
    fn test_skip_key() {
        let mut chip = setup(&[0xE5, 0x9E]);
        chip.machine_mut().set_reg(0x5, 0xB).unwrap();
        chip.set_key(0xB, true).unwrap();
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x204);

        let mut chip = setup(&[0xE5, 0x9E]);
        chip.machine_mut().set_reg(0x5, 0xB).unwrap();
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x202);
    }

    #[test]
    fn test_skip_not_key() {
        let mut chip = setup(&[0xE5, 0xA1]);
        chip.machine_mut().set_reg(0x5, 0x2).unwrap();
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x204);

        let mut chip = setup(&[0xE5, 0xA1]);
        chip.machine_mut().set_reg(0x5, 0x2).unwrap();
        chip.set_key(0x2, true).unwrap();
        step(&mut chip);
        assert_eq!(chip.machine().pc, 0x202);
    }

    #[test]
    fn test_timer_registers() {
        // LD V1, 0x20; LD DT, V1; LD V2, DT; LD ST, V1
        let mut chip = setup(&[0x61, 0x20, 0xF1, 0x15, 0xF2, 0x07, 0xF1, 0x18]);

        step(&mut chip);
        step(&mut chip);
        assert_eq!(chip.machine().timers.delay, 0x20);
        chip.tick_timers();
        step(&mut chip);
        assert_eq!(step(&mut chip), Effect::ToneOn);

        assert_regs(&chip, &[(0x1, 0x20), (0x2, 0x1F)]);
        assert_eq!(chip.machine().timers.sound, 0x20);
        assert!(chip.tone_active());
    }

    #[test]
    fn test_sound_off() {
        let mut chip = setup(&[0xF3, 0x18]);
        chip.machine_mut().timers.sound = 5;

        assert_eq!(step(&mut chip), Effect::ToneOff);
        assert!(!chip.tone_active());
    }

    #[test]
    fn test_add_index() {
        let mut chip = setup(&[0xF3, 0x1E]);
        chip.machine_mut().index = 0x300;
        chip.machine_mut().set_reg(0x3, 0x25).unwrap();
        chip.machine_mut().set_reg(0xF, 0x1).unwrap();

        step(&mut chip);

        assert_eq!(chip.machine().index, 0x325);
        assert_regs(&chip, &[(0x3, 0x25), (0xF, 0x1)]);
    }

    #[test]
    fn test_load_font() {
        let mut chip = setup(&[0xF3, 0x29]);
        chip.machine_mut().set_reg(0x3, 0xA).unwrap();

        step(&mut chip);

        assert_eq!(chip.machine().index, 0x050 + 0xA * 5);
        assert_eq!(chip.machine().memory.read_u8(0x050 + 0xA * 5).unwrap(), 0xF0);
    }

    #[test]
    fn test_bcd() {
        let mut chip = setup(&[0xF3, 0x33]);
        chip.machine_mut().index = 0x300;
        chip.machine_mut().set_reg(0x3, 234).unwrap();

        step(&mut chip);

        let memory = &chip.machine().memory;
        assert_eq!(memory.read_slice(0x300, 3).unwrap(), &[2, 3, 4]);
        assert_eq!(chip.machine().index, 0x300);
    }

    #[test]
    fn test_bcd_out_of_bounds() {
        let mut chip = setup(&[0xF3, 0x33]);
        chip.machine_mut().index = 0xFFE;
        chip.machine_mut().set_reg(0x3, 234).unwrap();

        let fault = chip.step().unwrap_err();

        assert_eq!(fault.error, Chip8Error::MemoryOutOfBounds { address: 0x1000 });
        assert_eq!(chip.machine().memory.read_u8(0xFFE).unwrap(), 0);
    }

    #[test]
    fn test_store() {
        // Arrange: Setup chip8 emulator
        let mut chip = setup(&[0xFF, 0x55]);
        chip.machine_mut().index = 0x400;
        chip.machine_mut().set_reg(0x2, 0x22).unwrap();
        chip.machine_mut().set_reg(0x4, 0x44).unwrap();
        chip.machine_mut().set_reg(0xA, 0xAA).unwrap();
        chip.machine_mut().set_reg(0xF, 0xFF).unwrap();

        // Act: Step CPU Instruction
        step(&mut chip);

        // Assert: CPU State
        assert_eq!(chip.machine().index, 0x400);
        let memory = &chip.machine().memory;
        assert_eq!(0x22, memory.read_u8(0x402).unwrap());
        assert_eq!(0x44, memory.read_u8(0x404).unwrap());
        assert_eq!(0xAA, memory.read_u8(0x40A).unwrap());
        assert_eq!(0xFF, memory.read_u8(0x40F).unwrap());
        assert_eq!(0x00, memory.read_u8(0x410).unwrap());
    }

    #[test]
    fn test_store_increments_index_quirk() {
        let quirks = Quirks { load_store_increments_index: true, ..Quirks::default() };
        let mut chip = setup_with_quirks(&[0xF3, 0x55], quirks);
        chip.machine_mut().index = 0x400;

        step(&mut chip);

        assert_eq!(chip.machine().index, 0x404);
    }

    #[test]
    fn test_load() {
        // Arrange: Setup chip8 emulator
        let mut chip = setup(&[0xFF, 0x65]);
        chip.machine_mut().index = 0x400;
        let memory = &mut chip.machine_mut().memory;
        memory.write_u8(0x402, 0x22).unwrap();
        memory.write_u8(0x404, 0x44).unwrap();
        memory.write_u8(0x40A, 0xAA).unwrap();
        memory.write_u8(0x40F, 0xFF).unwrap();

        // Act: Step CPU Instruction
        step(&mut chip);

        // Assert: CPU State
        assert_regs(&chip, &[(0x2, 0x22), (0x4, 0x44), (0xA, 0xAA), (0xF, 0xFF)]);
        assert_eq!(chip.machine().index, 0x400);
        assert_eq!(chip.machine().pc, 0x202);
    }

    #[test]
    fn test_load_out_of_bounds_leaves_registers() {
        let mut chip = setup(&[0xFF, 0x65]);
        chip.machine_mut().index = 0xFF8;
        chip.machine_mut().set_reg(0x0, 0x12).unwrap();

        let fault = chip.step().unwrap_err();

        assert_eq!(fault.error, Chip8Error::MemoryOutOfBounds { address: 0x1000 });
        assert_regs(&chip, &[(0x0, 0x12)]);
    }

    #[test]
    fn test_unknown_opcode() {
        let mut chip = setup(&[0x81, 0x2F]);

        let fault = chip.step().unwrap_err();

        assert_eq!(fault.error, Chip8Error::UnknownOpcode { opcode: 0x812F });
        assert_eq!(fault.opcode, 0x812F);
        assert_eq!(fault.pc, 0x200);
        assert!(chip.is_halted());
    }

    #[test]
    fn test_wait_key_effect() {
        let mut chip = setup(&[0xF4, 0x0A]);

        let outcome = chip.step().unwrap();

        assert_eq!(
            outcome,
            StepOutcome::Executed(Instruction::WaitKey(0x4), Effect::KeyWait(0x4))
        );
    }
}
