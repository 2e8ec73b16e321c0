//! The core value types and the partial records that feed them.

pub mod calendar;
pub mod date;
pub mod datetime;
pub mod duration;
pub mod month_day;
pub mod timezone;

#[doc(inline)]
pub use date::CivilDate;
#[doc(inline)]
pub use datetime::CivilDateTime;
#[doc(inline)]
pub use duration::Duration;
#[doc(inline)]
pub use month_day::MonthDay;

use crate::builtins::calendar::CalendarLike;
use crate::MonthCode;

/// A partial date record: the date members of a property bag, each one
/// optional.
#[derive(Debug, Default, Clone)]
pub struct PartialDate {
    pub year: Option<i32>,
    pub month: Option<u8>,
    pub month_code: Option<MonthCode>,
    pub day: Option<u8>,
    /// The bag's calendar designator, if one was provided.
    pub calendar: Option<CalendarLike>,
}

impl PartialDate {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            year: None,
            month: None,
            month_code: None,
            day: None,
            calendar: None,
        }
    }

    #[must_use]
    pub const fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    #[must_use]
    pub const fn with_month(mut self, month: Option<u8>) -> Self {
        self.month = month;
        self
    }

    #[must_use]
    pub const fn with_month_code(mut self, month_code: Option<MonthCode>) -> Self {
        self.month_code = month_code;
        self
    }

    #[must_use]
    pub const fn with_day(mut self, day: Option<u8>) -> Self {
        self.day = day;
        self
    }

    #[must_use]
    pub fn with_calendar(mut self, calendar: Option<CalendarLike>) -> Self {
        self.calendar = calendar;
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.month_code.is_none() && self.day.is_none()
    }
}

/// A partial wall-clock time record.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartialTime {
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub millisecond: Option<u16>,
    pub microsecond: Option<u16>,
    pub nanosecond: Option<u16>,
}

/// A partial date-time record.
#[derive(Debug, Default, Clone)]
pub struct PartialDateTime {
    pub date: PartialDate,
    pub time: PartialTime,
}
