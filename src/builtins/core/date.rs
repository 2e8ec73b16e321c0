//! This module implements `CivilDate` and its calendar-aware
//! operations.

use core::{fmt, str::FromStr};
use tinystr::tinystr;

use crate::{
    builtins::{
        calendar::Calendar,
        month_day::MonthDay,
        Duration, PartialDate,
    },
    fields::{FieldKey, MonthCode, DATE_FIELD_KEYS, MONTH_DAY_FIELD_KEYS},
    iso::{iso_days_in_month, iso_days_in_year, is_leap_year, DateDurationRecord, IsoDate},
    options::{Overflow, Unit},
    parsers::{parse_date_time, FormattableCalendar, FormattableDate},
    CivilError, CivilResult, CivilUnwrap, NS_PER_DAY,
};

/// A calendar date: an ISO date record bound to a calendar.
#[non_exhaustive]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CivilDate {
    pub(crate) iso: IsoDate,
    calendar: Calendar,
}

// ==== Private API ====

impl CivilDate {
    /// Creates a new `CivilDate` from validated parts.
    #[inline]
    #[must_use]
    pub(crate) fn new_unchecked(iso: IsoDate, calendar: Calendar) -> Self {
        Self { iso, calendar }
    }

    /// Difference of two dates bound to the same calendar, expressed in
    /// units no larger than `largest_unit`.
    pub(crate) fn internal_diff(&self, other: &Self, largest_unit: Unit) -> CivilResult<Duration> {
        if self.iso == other.iso {
            return Ok(Duration::default());
        }
        if largest_unit.max(Unit::Day) == Unit::Day {
            let record = DateDurationRecord {
                days: self.days_until(other),
                ..Default::default()
            };
            return Ok(Duration::from_date_duration(&record));
        }
        self.calendar.date_until(&self.iso, &other.iso, largest_unit)
    }
}

// ==== Public API ====

impl CivilDate {
    /// Creates a new `CivilDate`, rejecting any out-of-range field.
    pub fn try_new(year: i32, month: i32, day: i32, calendar: Calendar) -> CivilResult<Self> {
        let iso = IsoDate::new_with_overflow(year, month, day, Overflow::Reject)?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    /// Creates a new `CivilDate`, regulating out-of-range fields per
    /// the overflow behavior.
    pub fn new_with_overflow(
        year: i32,
        month: i32,
        day: i32,
        calendar: Calendar,
        overflow: Overflow,
    ) -> CivilResult<Self> {
        let iso = IsoDate::new_with_overflow(year, month, day, overflow)?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    /// Creates a `CivilDate` from a partial record.
    ///
    /// The record's calendar designator is resolved first (defaulting
    /// to `iso8601`), the calendar's field enumeration is consulted
    /// once, and the date is built from the enumerated fields.
    pub fn from_partial(partial: &PartialDate, overflow: Option<Overflow>) -> CivilResult<Self> {
        if partial.is_empty() {
            return Err(
                CivilError::protocol().with_message("partial record has no date fields")
            );
        }
        let calendar = match &partial.calendar {
            Some(designator) => designator.resolve()?,
            None => Calendar::default(),
        };

        let keys = calendar.resolved_fields(&DATE_FIELD_KEYS)?;
        let mut filtered = PartialDate::new();
        for key in keys {
            match key {
                FieldKey::Year => filtered.year = partial.year,
                FieldKey::Month => filtered.month = partial.month,
                FieldKey::MonthCode => filtered.month_code = partial.month_code,
                FieldKey::Day => filtered.day = partial.day,
                _ => {}
            }
        }

        let iso = calendar.date_from_fields(&filtered, overflow.unwrap_or_default())?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    /// Returns a reference to the bound calendar.
    #[inline]
    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    #[inline]
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.iso.year
    }

    #[inline]
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.iso.month
    }

    #[must_use]
    pub fn month_code(&self) -> MonthCode {
        // A stored date always carries a month in the range 1-12.
        MonthCode::from_month(self.iso.month).unwrap_or(MonthCode(tinystr!(4, "M01")))
    }

    #[inline]
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.iso.day
    }

    /// ISO day of week, Monday (1) through Sunday (7).
    #[must_use]
    pub fn day_of_week(&self) -> u8 {
        self.iso.day_of_week()
    }

    /// Ordinal day of the year, starting at 1.
    #[must_use]
    pub fn day_of_year(&self) -> u16 {
        self.iso.day_of_year()
    }

    #[must_use]
    pub fn days_in_month(&self) -> u8 {
        iso_days_in_month(self.iso.year, self.iso.month)
    }

    #[must_use]
    pub fn days_in_year(&self) -> u16 {
        iso_days_in_year(self.iso.year)
    }

    #[must_use]
    pub fn in_leap_year(&self) -> bool {
        is_leap_year(self.iso.year)
    }

    #[must_use]
    pub const fn months_in_year(&self) -> u16 {
        12
    }

    /// The number of whole days from this date to `other`.
    #[inline]
    #[must_use]
    pub fn days_until(&self, other: &Self) -> i64 {
        other.iso.to_epoch_days() - self.iso.to_epoch_days()
    }

    /// Adds a duration to the date.
    ///
    /// Calendar units route through the bound calendar; a duration of
    /// days (including whole days carried by its time portion) uses
    /// plain epoch-day arithmetic.
    pub fn add(&self, duration: &Duration, overflow: Option<Overflow>) -> CivilResult<Self> {
        let overflow = overflow.unwrap_or_default();
        if duration.years() != 0 || duration.months() != 0 || duration.weeks() != 0 {
            let iso = self.calendar.date_add(&self.iso, duration, overflow)?;
            return Ok(Self::new_unchecked(iso, self.calendar.clone()));
        }

        let time_days = (duration.time_nanoseconds() / i128::from(NS_PER_DAY)) as i64;
        let days = duration
            .days()
            .checked_add(time_days)
            .ok_or_else(|| CivilError::value().with_message("duration days are out of range"))?;
        let record = DateDurationRecord {
            days,
            ..Default::default()
        };
        let iso = self.iso.add_date_duration(&record, overflow)?;
        Ok(Self::new_unchecked(iso, self.calendar.clone()))
    }

    /// Subtracts a duration from the date.
    pub fn subtract(&self, duration: &Duration, overflow: Option<Overflow>) -> CivilResult<Self> {
        self.add(&duration.negated(), overflow)
    }

    /// Returns the duration from this date until `other`, expressed in
    /// units no larger than `largest_unit` (days when unset).
    pub fn until(&self, other: &Self, largest_unit: Option<Unit>) -> CivilResult<Duration> {
        if self.calendar != other.calendar {
            return Err(CivilError::value()
                .with_message("calendars of the two dates are not the same"));
        }
        self.internal_diff(other, largest_unit.unwrap_or(Unit::Day))
    }

    /// Projects the date onto a month-day through the bound calendar.
    ///
    /// The calendar's field enumeration is consulted once, and its
    /// month-day construction is invoked exactly once with no options
    /// value.
    pub fn to_month_day(&self) -> CivilResult<MonthDay> {
        let keys = self.calendar.resolved_fields(&MONTH_DAY_FIELD_KEYS)?;
        let mut fields = PartialDate::new();
        for key in keys {
            match key {
                FieldKey::MonthCode => fields.month_code = Some(self.month_code()),
                FieldKey::Day => fields.day = Some(self.day()),
                FieldKey::Year => fields.year = Some(self.year()),
                FieldKey::Month => fields.month = Some(self.month()),
                _ => {}
            }
        }
        let iso = self.calendar.month_day_from_fields(&fields, None)?;
        Ok(MonthDay::new_unchecked(iso, self.calendar.clone()))
    }

    /// Rebinds the date to a different calendar.
    #[must_use]
    pub fn with_calendar(&self, calendar: Calendar) -> Self {
        Self::new_unchecked(self.iso, calendar)
    }

    /// Parses a `CivilDate` from a UTF-8 byte string.
    pub fn from_utf8(source: &[u8]) -> CivilResult<Self> {
        let record = parse_date_time(source)?;
        let calendar = Calendar::from_str(record.calendar_identifier())?;

        // A date segment is mandatory in every accepted format.
        let date = record.date.civil_unwrap()?;
        let iso = IsoDate::new_with_overflow(
            date.year,
            i32::from(date.month),
            i32::from(date.day),
            Overflow::Reject,
        )?;
        Ok(Self::new_unchecked(iso, calendar))
    }
}

impl FromStr for CivilDate {
    type Err = CivilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_utf8(s.as_bytes())
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        FormattableDate(self.iso.year, self.iso.month, self.iso.day).fmt(f)?;
        FormattableCalendar(self.calendar.identifier()).fmt(f)
    }
}
