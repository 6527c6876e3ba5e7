use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Source of "now" on the local wall clock. Rules take `now` as a parameter
/// and never read the system time themselves.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// The real clock, read on the wall of `zone`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: Tz,
}

impl SystemClock {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.zone).naive_local()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
