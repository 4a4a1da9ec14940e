use std::time::Duration;

pub const DEFAULT_IPS: u32 = 700;
pub const DEFAULT_TIMER_HZ: u32 = 60;

/// Work due for an elapsed slice of wall-clock time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pace {
    /// Instruction cycles to run
    pub cycles: u32,
    /// Timer ticks to apply
    pub ticks: u32,
}

/// Converts elapsed wall-clock time into instruction cycles and timer ticks
/// at two independent rates. Leftover time carries over to the next call.
#[derive(Debug, Clone)]
pub struct Pacer {
    cycle_period: Duration,
    tick_period: Duration,
    cycle_debt: Duration,
    tick_debt: Duration,
    /// Elapsed time is clamped to this so a stall does not cause a burst
    max_step: Duration,
}

impl Pacer {
    /// Rates are clamped to at least 1 Hz.
    pub fn new(ips: u32, timer_hz: u32) -> Pacer {
        Pacer {
            cycle_period: period(ips),
            tick_period: period(timer_hz),
            cycle_debt: Duration::ZERO,
            tick_debt: Duration::ZERO,
            max_step: Duration::from_millis(250),
        }
    }

    pub fn advance(&mut self, elapsed: Duration) -> Pace {
        let elapsed = elapsed.min(self.max_step);
        self.cycle_debt += elapsed;
        self.tick_debt += elapsed;

        Pace {
            cycles: drain(&mut self.cycle_debt, self.cycle_period),
            ticks: drain(&mut self.tick_debt, self.tick_period),
        }
    }

    /// Time until the next instruction cycle is due.
    pub fn until_next_cycle(&self) -> Duration {
        self.cycle_period.saturating_sub(self.cycle_debt)
    }
}

impl Default for Pacer {
    fn default() -> Pacer {
        Pacer::new(DEFAULT_IPS, DEFAULT_TIMER_HZ)
    }
}

fn period(hz: u32) -> Duration {
    (Duration::from_secs(1) / hz.max(1)).max(Duration::from_nanos(1))
}

fn drain(debt: &mut Duration, period: Duration) -> u32 {
    let count = (debt.as_nanos() / period.as_nanos()) as u32;
    *debt -= period * count;
    count
}
