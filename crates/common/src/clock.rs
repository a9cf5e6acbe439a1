//! Wall-clock access.
//!
//! Export file names and "now" display times are derived from the wall
//! clock. Components take a [`Clock`] instead of calling `chrono::Local`
//! directly so tests can pin time.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Current time with the local UTC offset attached.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current local date and time, without offset.
    fn now_local(&self) -> NaiveDateTime {
        self.now().naive_local()
    }
}

/// The real system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }

    /// Build a fixed clock from calendar fields in the given UTC offset
    /// (seconds east of UTC). Returns `None` for invalid fields.
    pub fn at(
        offset_secs: i32,
        date: (i32, u32, u32),
        time: (u32, u32, u32),
    ) -> Option<Self> {
        let offset = FixedOffset::east_opt(offset_secs)?;
        let naive = NaiveDate::from_ymd_opt(date.0, date.1, date.2)?
            .and_hms_opt(time.0, time.1, time.2)?;
        let instant = offset.from_local_datetime(&naive).single()?;
        Some(Self { instant })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.instant
    }
}
