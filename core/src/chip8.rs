// CHIP-8 emulator
//
// Useful links:
// * [Guide to making a CHIP-8 emulator](https://tobiasvl.github.io/blog/write-a-chip-8-emulator/)
// * [Building a CHIP-8 Emulator](https://austinmorlan.com/posts/chip8_emulator/)
// * [high-level assembler for the Chip8 virtual machine](https://github.com/JohnEarnest/Octo/blob/gh-pages/js/emulator.js)
//

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, error, info, trace};

use crate::color::{Chip8Color, DEFAULT_BACKGROUND_COLOR, DEFAULT_FOREGROUND_COLOR};
use crate::display::Display;
use crate::error::{Chip8Error, Fault, Result};
use crate::executor::{execute, Effect};
use crate::instruction::{Instruction, Reg};
use crate::keypad::Keypad;
use crate::machine::Machine;
use crate::memory::{Memory, DEFAULT_FONT};
use crate::pacer::Pace;
use crate::quirks::{Chip8Mode, Quirks};
use crate::rng::{default_source, RandomSource};

/// Cycle driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Blocked on FX0A. `keys` is the keypad as last observed, a key counts
    /// once it goes from released to pressed.
    WaitingForKey { register: Reg, keys: Keypad },
    /// Terminal
    Halted,
}

/// Result of a single driver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(Instruction, Effect),
    /// Still blocked on FX0A, no instruction ran
    WaitingForKey,
    /// The machine is halted, no instruction ran
    Halted,
}

/// Summary of a batch of cycles run by [`Chip8::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub cycles: u32,
    pub display_updated: bool,
    pub halted: bool,
}

/// Requests a halt from outside the driver. Takes effect at the next
/// instruction boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Chip8Builder {
    /// ROM
    rom: Option<Vec<u8>>,
    /// Font sprite
    font: Option<Vec<u8>>,
    /// PRNG Seed
    rng_seed: Option<u64>,
    /// Injected random source, takes precedence over the seed
    rng: Option<Box<dyn RandomSource + Send>>,
    foreground: Chip8Color,
    background: Chip8Color,
    quirks: Quirks,
}

pub struct Chip8 {
    machine: Machine,
    quirks: Quirks,
    state: RunState,
    stop: StopHandle,
    /// PRNG Generator
    rng: Box<dyn RandomSource + Send>,
    foreground: Chip8Color,
    background: Chip8Color,
}

impl Chip8Builder {
    pub fn new() -> Chip8Builder {
        Chip8Builder {
            rom: None,
            font: None,
            rng_seed: None,
            rng: None,
            foreground: DEFAULT_FOREGROUND_COLOR,
            background: DEFAULT_BACKGROUND_COLOR,
            quirks: Quirks::default(),
        }
    }

    pub fn with_rom(mut self, rom: Vec<u8>) -> Self {
        self.rom = Some(rom);
        self
    }

    pub fn with_font(mut self, font: Vec<u8>) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_random_source(mut self, rng: impl RandomSource + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn with_foreground(mut self, color: Chip8Color) -> Self {
        self.foreground = color;
        self
    }

    pub fn with_background(mut self, color: Chip8Color) -> Self {
        self.background = color;
        self
    }

    pub fn with_mode(mut self, mode: Chip8Mode) -> Self {
        self.quirks = Quirks::from(mode);
        self
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn build(self) -> Result<Chip8> {
        // Create memory with the font in place
        let font = self.font.as_deref().unwrap_or(&DEFAULT_FONT[..]);
        let mut memory = Memory::with_font(font)?;

        // Copy rom to memory
        if let Some(rom) = &self.rom {
            memory.load_program(rom)?;
        }

        let rng = match self.rng {
            Some(rng) => rng,
            None => default_source(self.rng_seed),
        };

        info!("Built CHIP-8 machine [quirks: {:?}]", self.quirks);

        Ok(Chip8 {
            machine: Machine::new(memory),
            quirks: self.quirks,
            state: RunState::Running,
            stop: StopHandle::default(),
            rng,
            foreground: self.foreground,
            background: self.background,
        })
    }
}

impl Default for Chip8Builder {
    fn default() -> Chip8Builder {
        Chip8Builder::new()
    }
}

impl Chip8 {
    /// Load a program image at 0x200.
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        self.machine.memory.load_program(program)
    }

    /// Run one driver cycle: fetch, decode and execute a single instruction,
    /// or poll for the key an FX0A is waiting on.
    ///
    /// A fatal error halts the machine and is returned once; every later call
    /// returns [`StepOutcome::Halted`].
    pub fn step(&mut self) -> std::result::Result<StepOutcome, Fault> {
        if self.stop.is_stopped() && self.state != RunState::Halted {
            info!("Stop requested, halting at 0x{:03x}", self.machine.pc);
            self.state = RunState::Halted;
        }

        match self.state {
            RunState::Halted => Ok(StepOutcome::Halted),
            RunState::WaitingForKey { register, keys } => Ok(self.poll_key(register, keys)),
            RunState::Running => self.cycle(),
        }
    }

    fn cycle(&mut self) -> std::result::Result<StepOutcome, Fault> {
        let pc = self.machine.pc;

        // Fetch
        let opcode = match self.machine.memory.read_u16_be(pc as usize) {
            Ok(opcode) => opcode,
            Err(error) => return Err(self.halt(pc, 0, error)),
        };
        self.machine.pc += 2;

        // Decode
        let inst = Instruction::decode(opcode);
        debug!("0x{:03x}: {:04x} {}", pc, opcode, inst);

        // Execute
        match execute(&mut self.machine, inst, &self.quirks, self.rng.as_mut()) {
            Ok(Effect::KeyWait(register)) => {
                // Park on the instruction until a key arrives
                self.machine.pc = pc;
                self.state = RunState::WaitingForKey {
                    register,
                    keys: self.machine.keypad,
                };
                Ok(StepOutcome::Executed(inst, Effect::KeyWait(register)))
            }
            Ok(effect) => {
                trace!("Registers: {:?}", self.machine.regs());
                Ok(StepOutcome::Executed(inst, effect))
            }
            Err(error) => Err(self.halt(pc, opcode, error)),
        }
    }

    fn poll_key(&mut self, register: Reg, previous: Keypad) -> StepOutcome {
        let keys = self.machine.keypad;
        match keys.newly_pressed(&previous) {
            Some(key) => {
                debug!("Key 0x{:x} pressed, stored in V{:x}", key, register);
                *self.machine.v_mut(register) = key;
                self.machine.pc += 2;
                self.state = RunState::Running;
                StepOutcome::Executed(Instruction::WaitKey(register), Effect::None)
            }
            None => {
                self.state = RunState::WaitingForKey { register, keys };
                StepOutcome::WaitingForKey
            }
        }
    }

    fn halt(&mut self, pc: u16, opcode: u16, error: Chip8Error) -> Fault {
        self.machine.pc = pc;
        self.state = RunState::Halted;
        let fault = Fault { pc, opcode, error };
        error!("Halted: {}", fault);
        fault
    }

    /// Run `pace.cycles` instructions with `pace.ticks` timer ticks spread
    /// evenly between them. Stops early if the machine halts.
    pub fn run(&mut self, pace: Pace) -> std::result::Result<RunReport, Fault> {
        let mut report = RunReport::default();
        let mut ticked = 0;

        for cycle in 0..pace.cycles {
            let outcome = self.step()?;
            report.cycles += 1;

            match outcome {
                StepOutcome::Executed(_, Effect::DisplayUpdated) => report.display_updated = true,
                StepOutcome::Halted => {
                    report.halted = true;
                    break;
                }
                _ => {}
            }

            let due = (cycle as u64 + 1) * pace.ticks as u64 / pace.cycles as u64;
            while (ticked as u64) < due {
                self.tick_timers();
                ticked += 1;
            }
        }

        // Timers keep running when no cycles were due or the machine halted
        while ticked < pace.ticks {
            self.tick_timers();
            ticked += 1;
        }

        Ok(report)
    }

    /// One 60 Hz timer tick. Runs independently of instruction execution and
    /// continues while waiting for a key.
    pub fn tick_timers(&mut self) {
        self.machine.timers.tick();
    }

    /// Sound timer is non-zero
    pub fn tone_active(&self) -> bool {
        self.machine.timers.tone_active()
    }

    pub fn set_key(&mut self, key: usize, pressed: bool) -> Result<()> {
        self.machine.keypad.set(key, pressed)
    }

    pub fn stop(&mut self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == RunState::Halted
    }

    pub fn display(&self) -> &Display {
        &self.machine.display
    }

    /// Render the display with the configured colors and clear its dirty flag.
    pub fn frame(&mut self) -> Vec<Chip8Color> {
        self.machine.display.render(self.foreground, self.background)
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn quirks(&self) -> &Quirks {
        &self.quirks
    }
}
