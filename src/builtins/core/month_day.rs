//! This module implements `MonthDay`, a calendar month and day without
//! a year.

use core::{fmt, str::FromStr};
use tinystr::tinystr;

use crate::{
    builtins::{calendar::Calendar, CivilDate, PartialDate},
    fields::MonthCode,
    iso::IsoDate,
    options::Overflow,
    parsers::{parse_month_day, FormattableCalendar, FormattableDate, FormattableMonthDay},
    CivilError, CivilResult,
};

/// The reference year backing a `MonthDay`'s ISO record. 1972 is the
/// first leap year of the Unix epoch, so every valid month-day pair is
/// representable in it.
pub(crate) const REFERENCE_YEAR: i32 = 1972;

/// A calendar month-day: a month and day bound to a calendar, backed
/// by a reference-year ISO date.
#[non_exhaustive]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MonthDay {
    pub(crate) iso: IsoDate,
    calendar: Calendar,
}

impl MonthDay {
    #[inline]
    #[must_use]
    pub(crate) fn new_unchecked(iso: IsoDate, calendar: Calendar) -> Self {
        Self { iso, calendar }
    }

    /// Creates a new `MonthDay`, regulating out-of-range fields per the
    /// overflow behavior against the reference year.
    pub fn new_with_overflow(
        month: u8,
        day: u8,
        calendar: Calendar,
        overflow: Overflow,
    ) -> CivilResult<Self> {
        let iso =
            IsoDate::new_with_overflow(REFERENCE_YEAR, i32::from(month), i32::from(day), overflow)?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    #[inline]
    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    #[must_use]
    pub fn month_code(&self) -> MonthCode {
        MonthCode::from_month(self.iso.month).unwrap_or(MonthCode(tinystr!(4, "M01")))
    }

    #[inline]
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.iso.day
    }

    /// Anchors the month-day to a year through the bound calendar's
    /// date construction.
    pub fn to_civil_date(&self, year: Option<i32>) -> CivilResult<CivilDate> {
        let year = year.ok_or_else(|| {
            CivilError::value().with_message("a year is required to build a date from a month-day")
        })?;
        let fields = PartialDate::new()
            .with_year(Some(year))
            .with_month_code(Some(self.month_code()))
            .with_day(Some(self.day()));
        let iso = self.calendar.date_from_fields(&fields, Overflow::Constrain)?;
        Ok(CivilDate::new_unchecked(iso, self.calendar.clone()))
    }

    /// Parses a `MonthDay` from a UTF-8 byte string.
    ///
    /// Both the `--MM-DD` form and full annotated date strings are
    /// accepted, but only with the ISO calendar; a month-day in any
    /// other calendar is not representable without its reference year.
    pub fn from_utf8(source: &[u8]) -> CivilResult<Self> {
        let record = parse_month_day(source)?;
        if let Some(calendar) = &record.calendar {
            if !calendar.eq_ignore_ascii_case("iso8601") {
                return Err(CivilError::value()
                    .with_message("month-day strings must use the iso8601 calendar"));
            }
        }
        Self::new_with_overflow(
            record.month,
            record.day,
            Calendar::default(),
            Overflow::Reject,
        )
    }
}

impl FromStr for MonthDay {
    type Err = CivilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_utf8(s.as_bytes())
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        FormattableMonthDay {
            date: FormattableDate(self.iso.year, self.iso.month, self.iso.day),
            calendar: FormattableCalendar(self.calendar.identifier()),
        }
        .fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn parsing_accepts_both_forms() {
        let month_day = MonthDay::from_str("--12-25").unwrap();
        assert_eq!(month_day.month_code().as_str(), "M12");
        assert_eq!(month_day.day(), 25);

        let month_day = MonthDay::from_str("2024-05-15").unwrap();
        assert_eq!(month_day.month_code().as_str(), "M05");
        assert_eq!(month_day.day(), 15);

        // February 29 exists in the reference year.
        let month_day = MonthDay::from_str("--02-29").unwrap();
        assert_eq!(month_day.day(), 29);

        assert!(MonthDay::from_str("--02-30").is_err());
        assert!(MonthDay::from_str("--13-01").is_err());
        assert!(MonthDay::from_str("2024-05-15[u-ca=notreal]").is_err());
    }

    #[test]
    fn overflow_regulates_against_reference_year() {
        let month_day =
            MonthDay::new_with_overflow(2, 31, Calendar::default(), Overflow::Constrain).unwrap();
        assert_eq!(month_day.day(), 29);

        let err =
            MonthDay::new_with_overflow(2, 31, Calendar::default(), Overflow::Reject).unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn to_civil_date_requires_a_year() {
        let month_day = MonthDay::from_str("--02-29").unwrap();
        let err = month_day.to_civil_date(None).unwrap_err();
        assert!(err.is_value_error());

        let date = month_day.to_civil_date(Some(2023)).unwrap();
        // Constrained into the non-leap target year.
        assert_eq!((date.year(), date.month(), date.day()), (2023, 2, 28));

        let date = month_day.to_civil_date(Some(2024)).unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 2, 29));
    }

    #[test]
    fn display_uses_bare_iso_form() {
        assert_eq!(MonthDay::from_str("--12-25").unwrap().to_string(), "12-25");
        assert_eq!(MonthDay::from_str("2024-02-29").unwrap().to_string(), "02-29");
    }
}
