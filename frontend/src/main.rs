use std::{
    error::Error,
    path::PathBuf,
    time::{Duration, Instant},
};

use chip_8_core::{
    Chip8Builder, Chip8Color, Chip8Mode, Pacer, DEFAULT_IPS, DEFAULT_TIMER_HZ, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};
use clap::{Parser, ValueEnum};
use log::{debug, error, info};
use sdl2::{
    event::Event,
    keyboard::Keycode,
    pixels::{Color, PixelFormatEnum},
};

mod keymap;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Original COSMAC VIP behaviour
    Vip,
    /// CHIP-48 behaviour
    Chip48,
}

impl From<Mode> for Chip8Mode {
    fn from(mode: Mode) -> Chip8Mode {
        match mode {
            Mode::Vip => Chip8Mode::COSMAC_VIP,
            Mode::Chip48 => Chip8Mode::CHIP_48,
        }
    }
}

/// CHIP-8 Emulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Filepath to Chip-8 ROM file that will be executed
    #[clap(index = 1)]
    rom: PathBuf,

    /// Filepath to font file
    #[clap(long)]
    font: Option<PathBuf>,

    /// Background Color as HEX 0xAABBFF [default: 0x000000]
    #[clap(long)]
    background: Option<Chip8Color>,

    /// Foreground Color as HEX 0xAABBFF [default: 0xFFFFFF]
    #[clap(long)]
    foreground: Option<Chip8Color>,

    /// Display scaling factor
    #[clap(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    scale: u32,

    /// Instructions per second
    #[clap(short, long, default_value_t = DEFAULT_IPS, value_parser = clap::value_parser!(u32).range(1..=1_000_000))]
    ips: u32,

    /// Delay and sound timer rate in Hz
    #[clap(long, default_value_t = DEFAULT_TIMER_HZ, value_parser = clap::value_parser!(u32).range(1..=1000))]
    timer_hz: u32,

    /// Interpreter quirks to emulate [default: modern, sprites wrap]
    #[clap(long, value_enum)]
    mode: Option<Mode>,

    /// PRNG seed
    #[clap(long)]
    seed: Option<u64>,

    /// Print debug information
    #[clap(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut builder = Chip8Builder::new();

    let rom_data = std::fs::read(&args.rom)
        .map_err(|err| format!("failed to read ROM file {}: {}", args.rom.display(), err))?;
    builder = builder.with_rom(rom_data);

    if let Some(font) = &args.font {
        let font_data = std::fs::read(font)
            .map_err(|err| format!("failed to read font file {}: {}", font.display(), err))?;
        builder = builder.with_font(font_data);
    }

    if let Some(foreground) = args.foreground {
        builder = builder.with_foreground(foreground);
    }

    if let Some(background) = args.background {
        builder = builder.with_background(background);
    }

    if let Some(mode) = args.mode {
        builder = builder.with_mode(mode.into());
    }

    if let Some(seed) = args.seed {
        builder = builder.with_rng_seed(seed);
    }

    let mut chip = builder.build()?;
    info!("Running {} at {} ips", args.rom.display(), args.ips);

    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;

    let window = video_subsystem
        .window(
            "chip8-emulator",
            SCREEN_WIDTH as u32 * args.scale,
            SCREEN_HEIGHT as u32 * args.scale,
        )
        .position_centered()
        .build()?;

    let mut canvas = window.into_canvas().build()?;

    canvas.set_draw_color(Color::RGB(0, 0, 0));
    canvas.clear();
    canvas.present();

    let texture_creator = canvas.texture_creator();
    let mut texture = texture_creator.create_texture_streaming(
        PixelFormatEnum::RGBX8888,
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    )?;

    let mut event_pump = sdl_context.event_pump()?;

    let mut pacer = Pacer::new(args.ips, args.timer_hz);
    let mut last = Instant::now();
    let mut tone = false;

    'running: loop {
        // Process events
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => chip.stop(),
                Event::KeyDown {
                    keycode: Some(keycode),
                    repeat: false,
                    ..
                } => {
                    if let Some(key) = keymap::keypad_index(keycode) {
                        chip.set_key(key, true)?;
                    }
                }
                Event::KeyUp {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(key) = keymap::keypad_index(keycode) {
                        chip.set_key(key, false)?;
                    }
                }
                _ => {}
            }
        }

        // Run the instructions and timer ticks due since the last frame
        let now = Instant::now();
        let pace = pacer.advance(now - last);
        last = now;

        let report = chip.run(pace)?;
        if report.halted {
            info!("Machine halted");
            break 'running;
        }

        if chip.tone_active() != tone {
            tone = chip.tone_active();
            debug!("Tone {}", if tone { "on" } else { "off" });
        }

        // If display buffer was changed then draw changes on canvas
        if chip.display().dirty() {
            let frame = chip.frame();

            // Copy CHIP-8 display buffer into GPU texture
            texture.update(None, Chip8Color::as_bytes(&frame), SCREEN_WIDTH * 4)?;

            // Copy texture to Canvas
            canvas.copy(&texture, None, None)?;

            // present canvas on screen
            canvas.present();
        }

        // Wait until next update, waking at least once per frame for input
        let wait = pacer
            .until_next_cycle()
            .clamp(Duration::from_millis(1), Duration::from_millis(16));
        std::thread::sleep(wait);
    }

    Ok(())
}
