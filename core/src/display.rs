use crate::color::Chip8Color;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// 64x32 monochrome pixel buffer.
#[derive(Clone)]
pub struct Display {
    pixels: [bool; SCREEN_WIDTH * SCREEN_HEIGHT],
    /// Set on every mutation, cleared by the renderer
    dirty: bool,
}

impl Display {
    pub fn new() -> Display {
        Display {
            pixels: [false; SCREEN_WIDTH * SCREEN_HEIGHT],
            dirty: true,
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % SCREEN_HEIGHT) * SCREEN_WIDTH + (x % SCREEN_WIDTH)]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        self.pixels[(y % SCREEN_HEIGHT) * SCREEN_WIDTH + (x % SCREEN_WIDTH)] = on;
        self.dirty = true;
    }

    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = false);
        self.dirty = true;
    }

    /// XOR a sprite onto the screen with its origin at (`x`, `y`). Each byte in
    /// `rows` is one 8 pixel row, most significant bit leftmost. The origin
    /// always wraps; the sprite body wraps too unless `clip` is set.
    ///
    /// Returns true if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8], clip: bool) -> bool {
        let ox = x as usize % SCREEN_WIDTH;
        let oy = y as usize % SCREEN_HEIGHT;
        let mut collision = false;

        for (row, data) in rows.iter().enumerate() {
            let mut py = oy + row;
            if py >= SCREEN_HEIGHT {
                if clip {
                    break;
                }
                py %= SCREEN_HEIGHT;
            }

            for column in 0..8 {
                if data & (0x80 >> column) == 0 {
                    continue;
                }

                let mut px = ox + column;
                if px >= SCREEN_WIDTH {
                    if clip {
                        break;
                    }
                    px %= SCREEN_WIDTH;
                }

                let idx = py * SCREEN_WIDTH + px;
                collision |= self.pixels[idx];
                self.pixels[idx] ^= true;
            }
        }

        self.dirty = true;
        collision
    }

    /// Read-only snapshot of the pixel state, row major.
    pub fn pixels(&self) -> &[bool] {
        &self.pixels[..]
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Render the pixel state into an RGBX framebuffer and clear the dirty flag.
    pub fn render(&mut self, foreground: Chip8Color, background: Chip8Color) -> Vec<Chip8Color> {
        self.dirty = false;
        self.pixels
            .iter()
            .map(|&on| if on { foreground } else { background })
            .collect()
    }
}

impl Default for Display {
    fn default() -> Display {
        Display::new()
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.pixels.chunks(SCREEN_WIDTH) {
            let line: String = row.iter().map(|&p| if p { '█' } else { ' ' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
