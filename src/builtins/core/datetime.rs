//! This module implements `CivilDateTime`, a wall-clock date and time
//! bound to a calendar.

use core::{fmt, str::FromStr};

use crate::{
    builtins::{calendar::Calendar, CivilDate, Duration},
    iso::{DateDurationRecord, IsoDate, IsoDateTime, IsoTime},
    options::{Overflow, Unit},
    parsers::{
        parse_date_time, FormattableCalendar, FormattableDate, FormattableDateTime,
        FormattableTime,
    },
    CivilError, CivilResult, CivilUnwrap, NS_PER_DAY,
};

/// A wall-clock date and time without a time zone offset.
#[non_exhaustive]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CivilDateTime {
    pub(crate) iso: IsoDateTime,
    calendar: Calendar,
}

// ==== Private API ====

impl CivilDateTime {
    #[inline]
    #[must_use]
    pub(crate) fn new_unchecked(iso: IsoDateTime, calendar: Calendar) -> Self {
        Self { iso, calendar }
    }
}

// ==== Public API ====

impl CivilDateTime {
    /// Creates a new `CivilDateTime`, rejecting any out-of-range field.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
        millisecond: i32,
        microsecond: i32,
        nanosecond: i32,
        calendar: Calendar,
    ) -> CivilResult<Self> {
        let date = IsoDate::new_with_overflow(year, month, day, Overflow::Reject)?;
        let time = IsoTime::new_with_overflow(
            hour,
            minute,
            second,
            millisecond,
            microsecond,
            nanosecond,
            Overflow::Reject,
        )?;
        Ok(Self::new_unchecked(
            IsoDateTime::new_unchecked(date, time),
            calendar,
        ))
    }

    /// Creates a `CivilDateTime` at midnight of the given date.
    #[must_use]
    pub fn from_civil_date(date: &CivilDate) -> Self {
        Self::new_unchecked(
            IsoDateTime::new_unchecked(date.iso, IsoTime::default()),
            date.calendar().clone(),
        )
    }

    #[inline]
    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// The date portion as a `CivilDate` bound to the same calendar.
    #[must_use]
    pub fn civil_date(&self) -> CivilDate {
        CivilDate::new_unchecked(self.iso.date, self.calendar.clone())
    }

    #[inline]
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.iso.date.year
    }

    #[inline]
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.iso.date.month
    }

    #[inline]
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.iso.date.day
    }

    #[inline]
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.iso.time.hour
    }

    #[inline]
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.iso.time.minute
    }

    #[inline]
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.iso.time.second
    }

    #[inline]
    #[must_use]
    pub const fn millisecond(&self) -> u16 {
        self.iso.time.millisecond
    }

    #[inline]
    #[must_use]
    pub const fn microsecond(&self) -> u16 {
        self.iso.time.microsecond
    }

    #[inline]
    #[must_use]
    pub const fn nanosecond(&self) -> u16 {
        self.iso.time.nanosecond
    }

    /// Adds a duration, carrying whole days from the time portion into
    /// the calendar's date arithmetic.
    pub fn add(&self, duration: &Duration, overflow: Option<Overflow>) -> CivilResult<Self> {
        let overflow = overflow.unwrap_or_default();
        let (day_carry, time) = self.iso.time.add(duration.time_nanoseconds());
        let days = duration
            .days()
            .checked_add(day_carry)
            .ok_or_else(|| CivilError::value().with_message("duration days are out of range"))?;
        let record = DateDurationRecord {
            years: duration.years(),
            months: duration.months(),
            weeks: duration.weeks(),
            days,
        };
        let date = self
            .civil_date()
            .add(&Duration::from_date_duration(&record), Some(overflow))?;
        Ok(Self::new_unchecked(
            IsoDateTime::new_unchecked(date.iso, time),
            self.calendar.clone(),
        ))
    }

    /// Subtracts a duration.
    pub fn subtract(&self, duration: &Duration, overflow: Option<Overflow>) -> CivilResult<Self> {
        self.add(&duration.negated(), overflow)
    }

    /// Returns the duration from this date-time until `other`,
    /// expressed in units no larger than `largest_unit` (days when
    /// unset).
    pub fn until(&self, other: &Self, largest_unit: Option<Unit>) -> CivilResult<Duration> {
        if self.calendar != other.calendar {
            return Err(CivilError::value()
                .with_message("calendars of the two date-times are not the same"));
        }
        let largest = match largest_unit {
            None | Some(Unit::Auto) => Unit::Day,
            Some(unit) => unit,
        };
        if self.iso == other.iso {
            return Ok(Duration::default());
        }

        let mut time_ns =
            i128::from(other.iso.time.to_nanoseconds()) - i128::from(self.iso.time.to_nanoseconds());

        if !largest.is_calendar_unit() {
            let day_span =
                i128::from(other.iso.date.to_epoch_days() - self.iso.date.to_epoch_days());
            return Duration::from_normalized(day_span * i128::from(NS_PER_DAY) + time_ns, largest);
        }

        // When the time portion runs against the date direction, borrow
        // a day from the date difference before the calendar sees it.
        let date_sign = (other.iso.date.to_epoch_days() - self.iso.date.to_epoch_days()).signum();
        let mut end_date = other.iso.date;
        if date_sign != 0 && time_ns != 0 && time_ns.signum() != i128::from(date_sign) {
            end_date = IsoDate::from_epoch_days(end_date.to_epoch_days() - date_sign);
            time_ns += i128::from(date_sign) * i128::from(NS_PER_DAY);
        }

        let date_part = self.calendar.date_until(&self.iso.date, &end_date, largest)?;
        let time_part = Duration::from_normalized(time_ns, Unit::Hour)?;
        Duration::new(
            date_part.years(),
            date_part.months(),
            date_part.weeks(),
            date_part.days(),
            time_part.hours(),
            time_part.minutes(),
            time_part.seconds(),
            time_part.milliseconds(),
            time_part.microseconds(),
            time_part.nanoseconds(),
        )
    }

    /// Replaces the date portion, consolidating the calendars of the
    /// two values.
    pub fn with_civil_date(&self, date: &CivilDate) -> CivilResult<Self> {
        let calendar = Calendar::consolidate(&self.calendar, date.calendar())?;
        Ok(Self::new_unchecked(
            IsoDateTime::new_unchecked(date.iso, self.iso.time),
            calendar,
        ))
    }

    /// Parses a `CivilDateTime` from a UTF-8 byte string. A missing
    /// time segment defaults to midnight.
    pub fn from_utf8(source: &[u8]) -> CivilResult<Self> {
        let record = parse_date_time(source)?;
        let calendar = Calendar::from_str(record.calendar_identifier())?;

        let date = record.date.civil_unwrap()?;
        let iso_date = IsoDate::new_with_overflow(
            date.year,
            i32::from(date.month),
            i32::from(date.day),
            Overflow::Reject,
        )?;

        // A leap second was already folded into second 59 by the lexer.
        let iso_time = match record.time {
            Some(time) => IsoTime::new_with_overflow(
                i32::from(time.hour),
                i32::from(time.minute),
                i32::from(time.second),
                (time.nanosecond / 1_000_000) as i32,
                (time.nanosecond / 1_000 % 1_000) as i32,
                (time.nanosecond % 1_000) as i32,
                Overflow::Reject,
            )?,
            None => IsoTime::default(),
        };

        Ok(Self::new_unchecked(
            IsoDateTime::new_unchecked(iso_date, iso_time),
            calendar,
        ))
    }
}

impl FromStr for CivilDateTime {
    type Err = CivilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_utf8(s.as_bytes())
    }
}

impl fmt::Display for CivilDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self.iso.time;
        let nanosecond = u32::from(time.millisecond) * 1_000_000
            + u32::from(time.microsecond) * 1_000
            + u32::from(time.nanosecond);
        FormattableDateTime {
            date: FormattableDate(self.iso.date.year, self.iso.date.month, self.iso.date.day),
            time: FormattableTime {
                hour: time.hour,
                minute: time.minute,
                second: time.second,
                nanosecond,
            },
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
    fn separator_forms_are_equivalent() {
        let reference = CivilDateTime::from_str("2020-05-02T15:23:30.5").unwrap();
        for s in ["2020-05-02t15:23:30.5", "2020-05-02 15:23:30.5"] {
            assert_eq!(CivilDateTime::from_str(s).unwrap(), reference, "{s}");
        }
        assert_eq!(reference.hour(), 15);
        assert_eq!(reference.millisecond(), 500);
    }

    #[test]
    fn missing_time_defaults_to_midnight() {
        let result = CivilDateTime::from_str("2020-05-02").unwrap();
        assert_eq!((result.hour(), result.minute(), result.second()), (0, 0, 0));
    }

    #[test]
    fn leap_second_folds_to_fifty_nine() {
        let result = CivilDateTime::from_str("2016-12-31T23:59:60").unwrap();
        assert_eq!(result.second(), 59);

        // Inside a bracketed annotation a leap second stays an error.
        let err = CivilDateTime::from_str("2016-12-31T23:59:59[+23:59:60]").unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn add_carries_time_into_date() {
        let base = CivilDateTime::from_str("2023-12-31T23:30:00").unwrap();
        let result = base
            .add(&Duration::from_str("PT45M").unwrap(), None)
            .unwrap();
        assert_eq!(result.to_string(), "2024-01-01T00:15:00");

        let result = base
            .add(&Duration::from_str("P1M").unwrap(), None)
            .unwrap();
        assert_eq!(result.to_string(), "2024-01-31T23:30:00");

        let result = base
            .subtract(&Duration::from_str("PT24H30M").unwrap(), None)
            .unwrap();
        assert_eq!(result.to_string(), "2023-12-30T23:00:00");
    }

    #[test]
    fn until_balances_time_against_dates() {
        let one = CivilDateTime::from_str("2023-01-01T12:00:00").unwrap();
        let two = CivilDateTime::from_str("2023-01-03T06:00:00").unwrap();

        let result = one.until(&two, None).unwrap();
        assert_eq!((result.days(), result.hours()), (1, 18));

        let result = one.until(&two, Some(Unit::Hour)).unwrap();
        assert_eq!(result.hours(), 42);

        // The time portion borrows a day when it runs against the date
        // direction.
        let one = CivilDateTime::from_str("2023-01-31T23:00:00").unwrap();
        let two = CivilDateTime::from_str("2023-03-01T01:00:00").unwrap();
        let result = one.until(&two, Some(Unit::Month)).unwrap();
        assert_eq!(
            (result.months(), result.days(), result.hours()),
            (1, 0, 2)
        );
    }

    #[test]
    fn with_civil_date_replaces_date_portion() {
        let base = CivilDateTime::from_str("2020-01-01T06:30:15").unwrap();
        let date = CivilDate::from_str("1999-12-31").unwrap();
        let result = base.with_civil_date(&date).unwrap();
        assert_eq!(result.to_string(), "1999-12-31T06:30:15");
    }

    #[test]
    fn display_trims_fraction() {
        let result = CivilDateTime::from_str("2020-05-02T15:23:30.123456").unwrap();
        assert_eq!(result.to_string(), "2020-05-02T15:23:30.123456");

        let result = CivilDateTime::from_str("2020-05-02T15:23:30").unwrap();
        assert_eq!(result.to_string(), "2020-05-02T15:23:30");
    }
}
