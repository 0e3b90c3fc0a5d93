use std::time::Duration;

const MIN_TICK: Duration = Duration::from_millis(1);

/// What a single timer tick observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Still under the ceiling
    Running(Duration),
    /// The ceiling was reached on this tick; elapsed is clamped to the ceiling.
    /// Reported exactly once.
    Exceeded(Duration),
    /// Ticks after the ceiling was reached carry no information
    Expired,
}

/// Accumulates fixed increments toward a recording ceiling
#[derive(Debug, Clone)]
pub struct RecordingTimer {
    tick: Duration,
    ceiling: Duration,
    elapsed: Duration,
    exceeded: bool,
}

impl RecordingTimer {
    pub fn new(tick: Duration, ceiling: Duration) -> Self {
        Self {
            tick: tick.max(MIN_TICK),
            ceiling,
            elapsed: Duration::ZERO,
            exceeded: false,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn advance(&mut self) -> TimerTick {
        if self.exceeded {
            return TimerTick::Expired;
        }

        self.elapsed += self.tick;
        if self.elapsed >= self.ceiling {
            self.elapsed = self.ceiling;
            self.exceeded = true;
            TimerTick::Exceeded(self.ceiling)
        } else {
            TimerTick::Running(self.elapsed)
        }
    }
}
