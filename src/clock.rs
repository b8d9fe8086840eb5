use chrono::NaiveDateTime;

/// Source of capture timestamps for new records.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

// Wall clock in the user's local time zone
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
