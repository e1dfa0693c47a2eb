use chrono::{DateTime, Duration, Local, Utc};

/// Time source for the session, fixed in tests
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Local calendar date of `now`, e.g. `10/14/2026`
    pub fn local_date(&self) -> String {
        self.now().with_timezone(&Local).format("%m/%d/%Y").to_string()
    }

    /// Moves a fixed clock forward; no effect on the system clock
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Milliseconds from `start` to `end`, clamped at zero
pub fn millis_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}
