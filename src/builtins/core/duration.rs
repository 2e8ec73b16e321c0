//! This module implements `Duration` and the arithmetic, rounding, and
//! total operations defined over it.

use core::{fmt, str::FromStr};

use crate::{
    builtins::{calendar::Calendar, CivilDate, PartialDate},
    fields::{FieldKey, DATE_TIME_FIELD_KEYS},
    iso::DateDurationRecord,
    options::{Overflow, RelativeTo, ResolvedRoundingOptions, RoundingOptions, Unit},
    parsers::{parse_duration, DurationParseRecord, FormattableDuration},
    rounding::IncrementRounder,
    civil_assert, CivilError, CivilResult, CivilUnwrap, Sign, NS_PER_DAY,
};

/// A duration of calendar and clock time, held as ten signed
/// components.
///
/// All non-zero components of a valid duration share one sign.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    years: i64,
    months: i64,
    weeks: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
    milliseconds: i64,
    microseconds: i64,
    nanoseconds: i64,
}

// ==== Private API ====

impl Duration {
    /// Builds a date-only duration from an internal record, bypassing
    /// sign validation.
    pub(crate) fn from_date_duration(record: &DateDurationRecord) -> Self {
        Self {
            years: record.years,
            months: record.months,
            weeks: record.weeks,
            days: record.days,
            ..Default::default()
        }
    }

    /// The time portion in nanoseconds.
    pub(crate) fn time_nanoseconds(&self) -> i128 {
        i128::from(self.hours) * 3_600_000_000_000
            + i128::from(self.minutes) * 60_000_000_000
            + i128::from(self.seconds) * 1_000_000_000
            + i128::from(self.milliseconds) * 1_000_000
            + i128::from(self.microseconds) * 1_000
            + i128::from(self.nanoseconds)
    }

    /// The day and time portions combined, in nanoseconds.
    fn norm_with_days(&self) -> i128 {
        i128::from(self.days) * i128::from(NS_PER_DAY) + self.time_nanoseconds()
    }

    /// Balances a nanosecond value into a duration whose largest
    /// populated unit is at most `largest_unit` (clamped to days).
    pub(crate) fn from_normalized(nanoseconds: i128, largest_unit: Unit) -> CivilResult<Self> {
        let largest = if largest_unit == Unit::Auto || largest_unit > Unit::Day {
            Unit::Day
        } else {
            largest_unit
        };

        const STEPS: [(Unit, i128); 6] = [
            (Unit::Day, NS_PER_DAY as i128),
            (Unit::Hour, 3_600_000_000_000),
            (Unit::Minute, 60_000_000_000),
            (Unit::Second, 1_000_000_000),
            (Unit::Millisecond, 1_000_000),
            (Unit::Microsecond, 1_000),
        ];

        let mut remainder = nanoseconds;
        let mut values = [0i128; 6];
        for (value, (unit, size)) in values.iter_mut().zip(STEPS.iter()) {
            if *unit <= largest {
                *value = remainder / size;
                remainder %= size;
            }
        }

        let as_field = |value: i128| -> CivilResult<i64> {
            i64::try_from(value)
                .map_err(|_| CivilError::value().with_message("duration field is out of range"))
        };
        Ok(Self {
            days: as_field(values[0])?,
            hours: as_field(values[1])?,
            minutes: as_field(values[2])?,
            seconds: as_field(values[3])?,
            milliseconds: as_field(values[4])?,
            microseconds: as_field(values[5])?,
            nanoseconds: as_field(remainder)?,
            ..Default::default()
        })
    }

    /// A duration holding a single calendar unit.
    fn from_unit_value(unit: Unit, value: i64) -> Self {
        match unit {
            Unit::Year => Self {
                years: value,
                ..Default::default()
            },
            Unit::Month => Self {
                months: value,
                ..Default::default()
            },
            Unit::Week => Self {
                weeks: value,
                ..Default::default()
            },
            _ => Self {
                days: value,
                ..Default::default()
            },
        }
    }

    fn is_valid(&self) -> bool {
        let mut sign = 0i64;
        for value in self.fields() {
            if value == 0 {
                continue;
            }
            let value_sign = value.signum();
            if sign == 0 {
                sign = value_sign;
            } else if value_sign != sign {
                return false;
            }
        }
        true
    }

    /// The component values ordered years through nanoseconds.
    pub(crate) fn fields(&self) -> [i64; 10] {
        [
            self.years,
            self.months,
            self.weeks,
            self.days,
            self.hours,
            self.minutes,
            self.seconds,
            self.milliseconds,
            self.microseconds,
            self.nanoseconds,
        ]
    }

    fn total_relative(&self, unit: Unit, relative: &CivilDate) -> CivilResult<f64> {
        let date_part = Self {
            hours: 0,
            minutes: 0,
            seconds: 0,
            milliseconds: 0,
            microseconds: 0,
            nanoseconds: 0,
            ..*self
        };
        let end = relative.add(&date_part, None)?;
        let time_ns = self.time_nanoseconds();

        if !unit.is_calendar_unit() {
            let unit_ns = unit.as_nanoseconds().civil_unwrap()?;
            let total =
                i128::from(relative.days_until(&end)) * i128::from(NS_PER_DAY) + time_ns;
            return Ok(total as f64 / unit_ns as f64);
        }

        // The whole-unit span between the anchor and the end, plus the
        // fractional progress toward the next unit boundary.
        let whole_duration = relative.until(&end, Some(unit))?;
        let whole = match unit {
            Unit::Year => whole_duration.years,
            Unit::Month => whole_duration.months,
            Unit::Week => whole_duration.weeks,
            _ => return Err(CivilError::assert()),
        };

        let sign = i64::from(self.sign().as_sign_multiplier());
        let anchor = relative.add(&Self::from_unit_value(unit, whole), None)?;
        let next = relative.add(&Self::from_unit_value(unit, whole + sign), None)?;

        let numerator =
            i128::from(anchor.days_until(&end)) * i128::from(NS_PER_DAY) + time_ns;
        let denominator = i128::from(anchor.days_until(&next)) * i128::from(NS_PER_DAY);
        civil_assert!(
            denominator != 0,
            "zero-length unit span between anchor dates"
        );
        Ok(whole as f64 + numerator as f64 / denominator as f64)
    }
}

/// Resolves a relative-date argument, routing property bags through the
/// designated calendar's field enumeration.
fn resolve_relative_date(relative: &RelativeTo) -> CivilResult<CivilDate> {
    match relative {
        RelativeTo::Date(date) => Ok(date.clone()),
        RelativeTo::Bag(bag) => {
            let calendar = match &bag.date.calendar {
                Some(designator) => designator.resolve()?,
                None => Calendar::default(),
            };

            // One fields call for the full date-time key set, fully
            // drained, even though only date members anchor the total.
            let keys = calendar.resolved_fields(&DATE_TIME_FIELD_KEYS)?;
            let mut filtered = PartialDate::new();
            for key in keys {
                match key {
                    FieldKey::Year => filtered.year = bag.date.year,
                    FieldKey::Month => filtered.month = bag.date.month,
                    FieldKey::MonthCode => filtered.month_code = bag.date.month_code,
                    FieldKey::Day => filtered.day = bag.date.day,
                    _ => {}
                }
            }

            let iso = calendar.date_from_fields(&filtered, Overflow::Constrain)?;
            Ok(CivilDate::new_unchecked(iso, calendar))
        }
    }
}

// ==== Public API ====

impl Duration {
    /// Creates a new `Duration`, validating that all components share
    /// one sign.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        years: i64,
        months: i64,
        weeks: i64,
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
        milliseconds: i64,
        microseconds: i64,
        nanoseconds: i64,
    ) -> CivilResult<Self> {
        let duration = Self {
            years,
            months,
            weeks,
            days,
            hours,
            minutes,
            seconds,
            milliseconds,
            microseconds,
            nanoseconds,
        };
        if !duration.is_valid() {
            return Err(
                CivilError::value().with_message("duration components must have a uniform sign")
            );
        }
        Ok(duration)
    }

    #[inline]
    #[must_use]
    pub const fn years(&self) -> i64 {
        self.years
    }

    #[inline]
    #[must_use]
    pub const fn months(&self) -> i64 {
        self.months
    }

    #[inline]
    #[must_use]
    pub const fn weeks(&self) -> i64 {
        self.weeks
    }

    #[inline]
    #[must_use]
    pub const fn days(&self) -> i64 {
        self.days
    }

    #[inline]
    #[must_use]
    pub const fn hours(&self) -> i64 {
        self.hours
    }

    #[inline]
    #[must_use]
    pub const fn minutes(&self) -> i64 {
        self.minutes
    }

    #[inline]
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    #[inline]
    #[must_use]
    pub const fn milliseconds(&self) -> i64 {
        self.milliseconds
    }

    #[inline]
    #[must_use]
    pub const fn microseconds(&self) -> i64 {
        self.microseconds
    }

    #[inline]
    #[must_use]
    pub const fn nanoseconds(&self) -> i64 {
        self.nanoseconds
    }

    /// The sign shared by the duration's non-zero components.
    #[must_use]
    pub fn sign(&self) -> Sign {
        for value in self.fields() {
            if value != 0 {
                return Sign::from(value.signum() as i8);
            }
        }
        Sign::Zero
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.sign() == Sign::Zero
    }

    /// The duration with every component negated.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self {
            years: -self.years,
            months: -self.months,
            weeks: -self.weeks,
            days: -self.days,
            hours: -self.hours,
            minutes: -self.minutes,
            seconds: -self.seconds,
            milliseconds: -self.milliseconds,
            microseconds: -self.microseconds,
            nanoseconds: -self.nanoseconds,
        }
    }

    /// The duration with every component made non-negative.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            years: self.years.abs(),
            months: self.months.abs(),
            weeks: self.weeks.abs(),
            days: self.days.abs(),
            hours: self.hours.abs(),
            minutes: self.minutes.abs(),
            seconds: self.seconds.abs(),
            milliseconds: self.milliseconds.abs(),
            microseconds: self.microseconds.abs(),
            nanoseconds: self.nanoseconds.abs(),
        }
    }

    /// The largest populated unit, nanoseconds for a zero duration.
    #[must_use]
    pub fn default_largest_unit(&self) -> Unit {
        self.fields()
            .iter()
            .position(|value| *value != 0)
            .map_or(Unit::Nanosecond, |index| Unit::from(10 - index))
    }

    /// Adds two durations of day and time units.
    ///
    /// Calendar units have no fixed length, so durations carrying them
    /// cannot be combined without a relative date.
    pub fn add(&self, other: &Self) -> CivilResult<Self> {
        let largest = self
            .default_largest_unit()
            .max(other.default_largest_unit());
        if largest.is_calendar_unit() {
            return Err(CivilError::value()
                .with_message("durations with calendar units cannot be added without a relative date"));
        }
        Self::from_normalized(self.norm_with_days() + other.norm_with_days(), largest)
    }

    /// Subtracts a duration.
    pub fn subtract(&self, other: &Self) -> CivilResult<Self> {
        self.add(&other.negated())
    }

    /// Rounds the duration's day and time portion to an increment of
    /// the requested smallest unit, rebalancing up to the largest unit.
    ///
    /// Calendar components pass through untouched; rounding *to* a
    /// calendar unit is not supported here, since those lengths are
    /// only defined against a relative date (see [`Duration::total`]).
    pub fn round(&self, options: RoundingOptions) -> CivilResult<Self> {
        let resolved =
            ResolvedRoundingOptions::from_duration_options(options, self.default_largest_unit())?;
        if resolved.smallest_unit.is_calendar_unit() {
            return Err(CivilError::value()
                .with_message("rounding to calendar units requires a relative date; use total"));
        }
        let increment_ns = resolved
            .increment
            .as_unit_nanoseconds(resolved.smallest_unit)?;
        let rounded = IncrementRounder::from_signed_num(self.norm_with_days(), increment_ns)?
            .round(resolved.rounding_mode)?;

        let largest = if resolved.largest_unit.is_calendar_unit() {
            Unit::Day
        } else {
            resolved.largest_unit
        };
        let balanced = Self::from_normalized(rounded, largest)?;
        Self::new(
            self.years,
            self.months,
            self.weeks,
            balanced.days,
            balanced.hours,
            balanced.minutes,
            balanced.seconds,
            balanced.milliseconds,
            balanced.microseconds,
            balanced.nanoseconds,
        )
    }

    /// The duration's total length expressed as a fractional count of
    /// `unit`.
    ///
    /// Calendar units, and durations carrying calendar components,
    /// require a relative date; a bag argument is resolved through its
    /// calendar's field enumeration first.
    pub fn total(&self, unit: Unit, relative_to: Option<&RelativeTo>) -> CivilResult<f64> {
        if unit == Unit::Auto {
            return Err(CivilError::value().with_message("total requires a concrete unit"));
        }

        let needs_relative =
            unit.is_calendar_unit() || self.years != 0 || self.months != 0 || self.weeks != 0;
        if !needs_relative {
            let unit_ns = unit.as_nanoseconds().civil_unwrap()?;
            return Ok(self.norm_with_days() as f64 / unit_ns as f64);
        }

        let relative = relative_to.ok_or_else(|| {
            CivilError::value()
                .with_message("a relative date is required to total calendar units")
        })?;
        let relative = resolve_relative_date(relative)?;
        self.total_relative(unit, &relative)
    }
}

impl FromStr for Duration {
    type Err = CivilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let record = parse_duration(s.as_bytes())?;
        Self::new(
            record.years,
            record.months,
            record.weeks,
            record.days,
            record.hours,
            record.minutes,
            record.seconds,
            record.milliseconds,
            record.microseconds,
            record.nanoseconds,
        )
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        FormattableDuration(DurationParseRecord {
            years: self.years,
            months: self.months,
            weeks: self.weeks,
            days: self.days,
            hours: self.hours,
            minutes: self.minutes,
            seconds: self.seconds,
            milliseconds: self.milliseconds,
            microseconds: self.microseconds,
            nanoseconds: self.nanoseconds,
        })
        .fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::calendar::{CalendarLike, CalendarProtocol, IsoCalendar};
    use crate::builtins::{PartialDateTime, PartialTime};
    use crate::iso::IsoDate;
    use crate::options::{RoundingIncrement, RoundingMode};
    use alloc::boxed::Box;
    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn construction_requires_uniform_sign() {
        assert!(Duration::new(1, 2, 3, 4, 5, 6, 7, 8, 9, 10).is_ok());
        assert!(Duration::new(-1, 0, 0, 0, 0, 0, 0, 0, 0, -10).is_ok());

        let err = Duration::new(1, 0, 0, 0, 0, 0, 0, 0, 0, -1).unwrap_err();
        assert!(err.is_value_error());
        assert!(Duration::from_str("PT1H").unwrap().sign() == Sign::Positive);
        assert!(Duration::from_str("-PT1H").unwrap().sign() == Sign::Negative);
        assert!(Duration::default().is_zero());
    }

    #[test]
    fn largest_unit_and_negation() {
        let duration = Duration::from_str("P1Y2M3DT4H").unwrap();
        assert_eq!(duration.default_largest_unit(), Unit::Year);
        assert_eq!(Duration::from_str("PT5M").unwrap().default_largest_unit(), Unit::Minute);

        let negated = duration.negated();
        assert_eq!(negated.years(), -1);
        assert_eq!(negated.hours(), -4);
        assert_eq!(negated.abs(), duration);
    }

    #[test]
    fn add_balances_time_units() {
        let one = Duration::from_str("PT1H30M").unwrap();
        let two = Duration::from_str("PT30M").unwrap();
        let result = one.add(&two).unwrap();
        assert_eq!((result.hours(), result.minutes()), (2, 0));

        let result = one.subtract(&Duration::from_str("PT2H").unwrap()).unwrap();
        assert_eq!(result.minutes(), -30);

        let days = Duration::from_str("P1DT12H").unwrap();
        let result = days.add(&Duration::from_str("PT12H").unwrap()).unwrap();
        assert_eq!((result.days(), result.hours()), (2, 0));

        let err = Duration::from_str("P1M").unwrap().add(&two).unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn string_round_trips() {
        for s in [
            "P1Y2M3W4DT5H6M7.000000008S",
            "-PT90M",
            "PT0S",
            "P2W",
            "PT1.5H",
        ] {
            let duration = Duration::from_str(s).unwrap();
            let normalized = duration.to_string();
            assert_eq!(Duration::from_str(&normalized).unwrap(), duration, "{s}");
        }
        assert_eq!(Duration::from_str("-PT90M").unwrap().to_string(), "-PT90M");
        assert_eq!(Duration::default().to_string(), "PT0S");
    }

    #[test]
    fn round_to_increments() {
        let duration = Duration::from_str("P1DT12H").unwrap();
        let options = RoundingOptions {
            smallest_unit: Some(Unit::Day),
            ..Default::default()
        };
        let result = duration.round(options).unwrap();
        assert_eq!(result.days(), 2);
        assert_eq!(result.hours(), 0);

        let duration = Duration::from_str("PT1H47M").unwrap();
        let options = RoundingOptions {
            smallest_unit: Some(Unit::Minute),
            increment: Some(RoundingIncrement::try_new(30).unwrap()),
            ..Default::default()
        };
        let result = duration.round(options).unwrap();
        assert_eq!((result.hours(), result.minutes()), (2, 0));

        let options = RoundingOptions {
            smallest_unit: Some(Unit::Minute),
            increment: Some(RoundingIncrement::try_new(30).unwrap()),
            rounding_mode: Some(RoundingMode::Trunc),
            ..Default::default()
        };
        let result = duration.round(options).unwrap();
        assert_eq!((result.hours(), result.minutes()), (1, 30));

        // A largest unit alone rebalances without changing the length.
        let duration = Duration::from_str("PT90M").unwrap();
        let options = RoundingOptions {
            largest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        let result = duration.round(options).unwrap();
        assert_eq!((result.hours(), result.minutes()), (1, 30));
    }

    #[test]
    fn round_preserves_calendar_components() {
        let duration = Duration::from_str("P1Y2MT25H").unwrap();
        let options = RoundingOptions {
            smallest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        let result = duration.round(options).unwrap();
        assert_eq!(
            (result.years(), result.months(), result.days(), result.hours()),
            (1, 2, 1, 1)
        );

        let options = RoundingOptions {
            smallest_unit: Some(Unit::Month),
            ..Default::default()
        };
        let err = duration.round(options).unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn total_of_fixed_units() {
        let duration = Duration::from_str("P1DT12H").unwrap();
        assert_eq!(duration.total(Unit::Day, None).unwrap(), 1.5);
        assert_eq!(duration.total(Unit::Hour, None).unwrap(), 36.0);

        let err = duration.total(Unit::Auto, None).unwrap_err();
        assert!(err.is_value_error());

        // Calendar components need an anchor.
        let err = Duration::from_str("P1M").unwrap().total(Unit::Day, None).unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn total_against_relative_date() {
        let relative = RelativeTo::Date(CivilDate::from_str("2024-01-01").unwrap());

        let one_month = Duration::from_str("P1M").unwrap();
        assert_eq!(one_month.total(Unit::Day, Some(&relative)).unwrap(), 31.0);
        assert_eq!(one_month.total(Unit::Month, Some(&relative)).unwrap(), 1.0);

        let duration = Duration::from_str("P1Y6M").unwrap();
        let total = duration.total(Unit::Year, Some(&relative)).unwrap();
        let expected = 1.0 + 181.0 / 365.0;
        assert!((total - expected).abs() < 1e-12, "{total} != {expected}");

        let negative = Duration::from_str("-P1M").unwrap();
        assert_eq!(negative.total(Unit::Day, Some(&relative)).unwrap(), -31.0);
    }

    /// Counts field-enumeration traffic and records the requested keys.
    #[derive(Debug, Default)]
    struct FieldTrackingCalendar {
        fields_calls: AtomicUsize,
        yielded: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl CalendarProtocol for FieldTrackingCalendar {
        fn identifier(&self) -> &str {
            "iso8601"
        }

        fn fields(
            &self,
            requested: &[FieldKey],
        ) -> CivilResult<Box<dyn Iterator<Item = CivilResult<FieldKey>> + '_>> {
            self.fields_calls.fetch_add(1, Ordering::SeqCst);
            *self.requested.lock().unwrap() =
                requested.iter().map(|key| key.name().to_string()).collect();
            let keys: Vec<FieldKey> = requested.to_vec();
            Ok(Box::new(keys.into_iter().map(|key| {
                self.yielded.fetch_add(1, Ordering::SeqCst);
                Ok(key)
            })))
        }

        fn date_from_fields(
            &self,
            fields: &PartialDate,
            overflow: Overflow,
        ) -> CivilResult<IsoDate> {
            IsoCalendar.date_from_fields(fields, overflow)
        }

        fn month_day_from_fields(
            &self,
            fields: &PartialDate,
            options: Option<Overflow>,
        ) -> CivilResult<IsoDate> {
            IsoCalendar.month_day_from_fields(fields, options)
        }

        fn date_add(
            &self,
            date: &IsoDate,
            duration: &Duration,
            overflow: Overflow,
        ) -> CivilResult<IsoDate> {
            IsoCalendar.date_add(date, duration, overflow)
        }

        fn date_until(
            &self,
            one: &IsoDate,
            two: &IsoDate,
            largest_unit: Unit,
        ) -> CivilResult<Duration> {
            IsoCalendar.date_until(one, two, largest_unit)
        }
    }

    #[test]
    fn total_resolves_bag_through_one_fields_call() {
        let tracking = Arc::new(FieldTrackingCalendar::default());
        let bag = PartialDateTime {
            date: PartialDate::new()
                .with_year(Some(2024))
                .with_month(Some(1))
                .with_day(Some(1))
                .with_calendar(Some(CalendarLike::Object(Calendar::Custom(
                    tracking.clone(),
                )))),
            time: PartialTime::default(),
        };
        let relative = RelativeTo::from(bag);

        let total = Duration::from_str("P1M")
            .unwrap()
            .total(Unit::Day, Some(&relative))
            .unwrap();
        assert_eq!(total, 31.0);

        assert_eq!(tracking.fields_calls.load(Ordering::SeqCst), 1);
        assert_eq!(tracking.yielded.load(Ordering::SeqCst), 10);
        assert_eq!(
            *tracking.requested.lock().unwrap(),
            [
                "day",
                "hour",
                "microsecond",
                "millisecond",
                "minute",
                "month",
                "monthCode",
                "nanosecond",
                "second",
                "year"
            ]
        );
    }
}
