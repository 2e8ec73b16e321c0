//! The `civil_rs` crate is a civil calendar and date/time computation
//! engine with pluggable calendar support.
//!
//! ```rust
//! use civil_rs::{Calendar, CivilDate};
//! use core::str::FromStr;
//!
//! // Create a date bound to the ISO 8601 calendar
//! let date = CivilDate::try_new(2025, 3, 3, Calendar::default()).unwrap();
//! assert_eq!(date.month_code().as_str(), "M03");
//!
//! // Dates can also be parsed from ISO 8601 strings
//! let parsed = CivilDate::from_str("2025-03-03").unwrap();
//! assert_eq!(date, parsed);
//! ```
//!
//! The crate represents calendar dates, wall-clock date-times, durations,
//! and time zones, and performs calendar-aware arithmetic. Calendar
//! specific rules (month lengths, field names, date arithmetic) are
//! delegated to the [`CalendarProtocol`] capability set rather than being
//! hard-coded, with `iso8601` provided as the built-in reference calendar.
#![no_std]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![allow(
    clippy::module_name_repetitions,
    clippy::redundant_pub_crate,
    clippy::too_many_lines,
    clippy::cognitive_complexity,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
)]

extern crate alloc;
extern crate core;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod fields;
pub mod iso;
pub mod options;
pub mod parsers;

mod builtins;

#[doc(hidden)]
pub(crate) mod rounding;

use core::cmp::Ordering;

/// Re-export of `TinyAsciiStr` from `tinystr`.
pub use tinystr::TinyAsciiStr;

#[doc(inline)]
pub use error::{CivilError, ErrorKind};

/// The crate-wide result type.
pub type CivilResult<T> = Result<T, CivilError>;

pub mod partial {
    //! Partial date/time component records.
    //!
    //! Partial records are the crate's property-bag inputs: field sets
    //! with every member optional, consumed by `from_partial` style
    //! constructors and the calendar capability operations.
    pub use crate::builtins::{PartialDate, PartialDateTime, PartialTime};
}

pub use crate::builtins::{
    calendar::{Calendar, CalendarLike, CalendarProtocol, CalendarSlot},
    timezone::{TimeZone, TimeZoneLike, TimeZoneSlot},
    CivilDate, CivilDateTime, Duration, MonthDay,
};
pub use crate::fields::MonthCode;
pub use crate::options::RelativeTo;

/// A library specific trait for unwrapping assertions.
pub(crate) trait CivilUnwrap {
    type Output;

    /// Assertion-style unwrapping. Panics in debug builds, returns an
    /// assertion error at runtime.
    fn civil_unwrap(self) -> CivilResult<Self::Output>;
}

impl<T> CivilUnwrap for Option<T> {
    type Output = T;

    fn civil_unwrap(self) -> CivilResult<Self::Output> {
        debug_assert!(self.is_some());
        self.ok_or(CivilError::assert())
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! civil_assert {
    ($condition:expr $(,)*) => {
        if !$condition {
            return Err(CivilError::assert());
        }
    };
    ($condition:expr, $($args:tt)+) => {
        if !$condition {
            #[cfg(feature = "log")]
            log::error!($($args)+);
            return Err(CivilError::assert());
        }
    };
}

/// A general Sign type.
#[repr(i8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Sign {
    #[default]
    Positive = 1,
    Zero = 0,
    Negative = -1,
}

impl From<i8> for Sign {
    fn from(value: i8) -> Self {
        match value.cmp(&0) {
            Ordering::Greater => Self::Positive,
            Ordering::Equal => Self::Zero,
            Ordering::Less => Self::Negative,
        }
    }
}

impl Sign {
    /// Coerces the current `Sign` to be either negative or positive.
    pub(crate) fn as_sign_multiplier(&self) -> i8 {
        if matches!(self, Self::Zero) {
            return 1;
        }
        *self as i8
    }
}

// Relevant numeric constants
/// Nanoseconds per day constant: 8.64e+13
pub const NS_PER_DAY: u64 = MS_PER_DAY as u64 * 1_000_000;
/// Milliseconds per day constant: 8.64e+7
pub const MS_PER_DAY: u32 = 24 * 60 * 60 * 1000;
