use std::sync::Mutex;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Time capability. The rolling express window and past-date checks depend
/// on "now", so the engine never reads the OS clock directly.
pub trait Clock: Send + Sync {
    /// Current local calendar date.
    fn today(&self) -> NaiveDate;

    /// Current local time of day, minute granularity.
    fn time_now(&self) -> NaiveTime;

    /// Current local date and time.
    fn now(&self) -> NaiveDateTime {
        self.today().and_time(self.time_now())
    }
}

/// Production clock backed by the OS local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn time_now(&self) -> NaiveTime {
        let t = Local::now().time();
        t.with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(t)
    }
}

/// Settable clock for deterministic tests and tooling.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            instant: Mutex::new(at),
        }
    }

    /// Move the clock to a new instant. Affects every holder of this clock.
    pub fn set(&self, at: NaiveDateTime) {
        *self.instant.lock().unwrap() = at;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.instant.lock().unwrap().date()
    }

    fn time_now(&self) -> NaiveTime {
        self.instant.lock().unwrap().time()
    }
}
