/// A repeating trigger counted in host ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Every {
    period: u64,
    next: u64,
}

impl Every {
    /// Fires first at `first`, then every `period` ticks. A zero period
    /// never fires.
    pub fn new(first: u64, period: u64) -> Self {
        Self { period, next: first }
    }

    pub fn disabled() -> Self {
        Self { period: 0, next: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.period > 0
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// True once per elapsed period. Missed periods collapse into one firing.
    pub fn due(&mut self, tick: u64) -> bool {
        if self.period == 0 || tick < self.next {
            return false;
        }
        while self.next <= tick {
            self.next += self.period;
        }
        true
    }
}

/// A trigger that fires once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Once {
    at: Option<u64>,
}

impl Once {
    pub fn at(tick: u64) -> Self {
        Self { at: Some(tick) }
    }

    pub fn due(&mut self, tick: u64) -> bool {
        match self.at {
            Some(at) if tick >= at => {
                self.at = None;
                true
            }
            _ => false,
        }
    }
}
