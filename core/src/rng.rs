use rand::{rngs::StdRng, RngCore, SeedableRng};

/// Source of random bytes for CXNN.
pub trait RandomSource {
    fn next_byte(&mut self) -> u8;
}

impl RandomSource for StdRng {
    fn next_byte(&mut self) -> u8 {
        self.next_u32() as u8
    }
}

/// Seeded PRNG, or one seeded from the OS when no seed is given.
pub fn default_source(seed: Option<u64>) -> Box<dyn RandomSource + Send> {
    match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(StdRng::from_entropy()),
    }
}
