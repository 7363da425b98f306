use super::Signal;
use crate::bits::Bits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    /// Derive the edge between two consecutive levels.
    pub fn between(previous: bool, current: bool) -> Option<Self> {
        match (previous, current) {
            (false, true) => Some(Edge::Rising),
            (true, false) => Some(Edge::Falling),
            _ => None,
        }
    }
}

/// Free-running square wave. The level flips every `half_period` ticks.
#[derive(Debug)]
pub struct Clock {
    signal: Signal,
    level: bool,
    previous: bool,
    half_period: u32,
    count: u32,
    running: bool,
}

impl Clock {
    pub fn new(half_period: u32) -> Self {
        Self {
            signal: Signal::with_value("clock", Bits::from_bool(false)),
            level: false,
            previous: false,
            half_period: half_period.max(1),
            count: 0,
            running: true,
        }
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn level(&self) -> bool {
        self.level
    }

    pub fn rising(&self) -> bool {
        Edge::between(self.previous, self.level) == Some(Edge::Rising)
    }

    pub fn falling(&self) -> bool {
        Edge::between(self.previous, self.level) == Some(Edge::Falling)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn half_period(&self) -> u32 {
        self.half_period
    }

    /// Change the clock speed. A zero period is treated as one tick.
    pub fn set_half_period(&mut self, ticks: u32) {
        self.half_period = ticks.max(1);
        self.count = self.count.min(self.half_period - 1);
    }

    /// Advance one tick and report the edge it produced, if any. A stopped
    /// clock holds its level.
    pub fn advance(&mut self) -> Option<Edge> {
        self.previous = self.level;
        if self.running {
            self.count += 1;
            if self.count >= self.half_period {
                self.count = 0;
                self.level = !self.level;
            }
        }
        // the signal has width 1 from construction, the write cannot fail
        let _ = self.signal.drive(Bits::from_bool(self.level));
        Edge::between(self.previous, self.level)
    }

    /// Back to low with no pending edge.
    pub fn reset(&mut self) {
        self.level = false;
        self.previous = false;
        self.count = 0;
        self.signal.reset(1);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(1)
    }
}
