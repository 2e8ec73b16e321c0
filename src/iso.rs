//! Implementation of the internal ISO record types.
//!
//! The three main types of records are `IsoDate`, `IsoTime`, and
//! `IsoDateTime`. These records hold the raw proleptic Gregorian field
//! values that back the public value types, and implement the epoch-day
//! arithmetic the built-in `iso8601` calendar is defined in terms of.

use crate::{
    error::CivilError,
    options::{Overflow, Unit},
    CivilResult, NS_PER_DAY,
};

/// The max epoch day span supported by the record types.
pub(crate) const MAX_EPOCH_DAYS: i64 = 100_000_000;

/// A record of a parsed or computed proleptic Gregorian date.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IsoDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl IsoDate {
    /// Creates a new `IsoDate` without validating any of the fields.
    #[inline]
    pub(crate) const fn new_unchecked(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Creates a new `IsoDate` while applying the provided overflow
    /// behavior to out-of-range month/day values.
    pub(crate) fn new_with_overflow(
        year: i32,
        month: i32,
        day: i32,
        overflow: Overflow,
    ) -> CivilResult<Self> {
        match overflow {
            Overflow::Constrain => {
                let month = month.clamp(1, 12) as u8;
                let day = day.clamp(1, i32::from(iso_days_in_month(year, month))) as u8;
                let date = Self::new_unchecked(year, month, day);
                if !date.is_within_limits() {
                    return Err(
                        CivilError::value().with_message("date is outside the supported range")
                    );
                }
                Ok(date)
            }
            Overflow::Reject => {
                if !(1..=12).contains(&month) {
                    return Err(
                        CivilError::value().with_message("month must be in a range of 1-12")
                    );
                }
                let month = month as u8;
                if !(1..=i32::from(iso_days_in_month(year, month))).contains(&day) {
                    return Err(
                        CivilError::value().with_message("day is not valid for the given month")
                    );
                }
                let date = Self::new_unchecked(year, month, day as u8);
                if !date.is_within_limits() {
                    return Err(
                        CivilError::value().with_message("date is outside the supported range")
                    );
                }
                Ok(date)
            }
        }
    }

    /// Returns whether the record holds a valid ISO date.
    pub(crate) fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && (1..=iso_days_in_month(self.year, self.month)).contains(&self.day)
            && self.is_within_limits()
    }

    pub(crate) fn is_within_limits(&self) -> bool {
        self.to_epoch_days().unsigned_abs() <= MAX_EPOCH_DAYS as u64
    }

    /// Returns the number of days since the Unix epoch (1970-01-01).
    pub(crate) fn to_epoch_days(&self) -> i64 {
        epoch_days_from_gregorian(self.year, self.month, self.day)
    }

    /// Balances an epoch day count back into a date record.
    pub(crate) fn from_epoch_days(days: i64) -> Self {
        let (year, month, day) = gregorian_from_epoch_days(days);
        Self::new_unchecked(year, month, day)
    }

    /// ISO day of week, Monday (1) through Sunday (7).
    pub(crate) fn day_of_week(&self) -> u8 {
        ((self.to_epoch_days() + 3).rem_euclid(7) + 1) as u8
    }

    /// Ordinal day of the year, starting at 1.
    pub(crate) fn day_of_year(&self) -> u16 {
        let mut days = u16::from(self.day);
        for month in 1..self.month {
            days += u16::from(iso_days_in_month(self.year, month));
        }
        days
    }

    /// Adds a date duration record to the date, per the overflow behavior.
    ///
    /// Years and months are applied first by balancing the year/month
    /// pair and regulating the day, then weeks and days are applied
    /// through epoch-day arithmetic.
    pub(crate) fn add_date_duration(
        &self,
        duration: &DateDurationRecord,
        overflow: Overflow,
    ) -> CivilResult<Self> {
        let (year, month) = balance_iso_year_month(
            i64::from(self.year) + duration.years,
            i64::from(self.month) + duration.months,
        )?;
        let regulated =
            Self::new_with_overflow(year, i32::from(month), i32::from(self.day), overflow)?;

        let days = duration
            .days
            .checked_add(duration.weeks.checked_mul(7).ok_or_else(day_range_error)?)
            .ok_or_else(day_range_error)?;
        let epoch_days = regulated
            .to_epoch_days()
            .checked_add(days)
            .ok_or_else(day_range_error)?;
        if epoch_days.unsigned_abs() > MAX_EPOCH_DAYS as u64 {
            return Err(day_range_error());
        }
        Ok(Self::from_epoch_days(epoch_days))
    }

    /// Computes the difference between two dates as a date duration
    /// record expressed in units no larger than `largest_unit`.
    pub(crate) fn diff(&self, other: &Self, largest_unit: Unit) -> CivilResult<DateDurationRecord> {
        if self == other {
            return Ok(DateDurationRecord::default());
        }
        let sign: i64 = if other > self { 1 } else { -1 };

        if matches!(largest_unit, Unit::Year | Unit::Month) {
            let mut years = i64::from(other.year) - i64::from(self.year);
            let mut intermediate = self.add_years_months(years, 0)?;
            while sign * i64::from(intermediate.cmp(other) as i8) > 0 {
                years -= sign;
                intermediate = self.add_years_months(years, 0)?;
            }

            let mut months = (i64::from(other.year) - i64::from(intermediate.year)) * 12
                + i64::from(other.month)
                - i64::from(intermediate.month);
            let mut intermediate = self.add_years_months(years, months)?;
            while sign * i64::from(intermediate.cmp(other) as i8) > 0 {
                months -= sign;
                intermediate = self.add_years_months(years, months)?;
            }

            let days = other.to_epoch_days() - intermediate.to_epoch_days();
            if largest_unit == Unit::Month {
                months += years * 12;
                years = 0;
            }
            return Ok(DateDurationRecord {
                years,
                months,
                weeks: 0,
                days,
            });
        }

        let days = other.to_epoch_days() - self.to_epoch_days();
        if largest_unit == Unit::Week {
            return Ok(DateDurationRecord {
                years: 0,
                months: 0,
                weeks: days / 7,
                days: days % 7,
            });
        }
        Ok(DateDurationRecord {
            years: 0,
            months: 0,
            weeks: 0,
            days,
        })
    }

    fn add_years_months(&self, years: i64, months: i64) -> CivilResult<Self> {
        let (year, month) = balance_iso_year_month(
            i64::from(self.year) + years,
            i64::from(self.month) + months,
        )?;
        Self::new_with_overflow(
            year,
            i32::from(month),
            i32::from(self.day),
            Overflow::Constrain,
        )
    }
}

fn day_range_error() -> CivilError {
    CivilError::value().with_message("date arithmetic exceeded the supported range")
}

/// An internal date duration record of raw signed component values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateDurationRecord {
    pub(crate) years: i64,
    pub(crate) months: i64,
    pub(crate) weeks: i64,
    pub(crate) days: i64,
}

/// A record of a wall-clock time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IsoTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
    pub microsecond: u16,
    pub nanosecond: u16,
}

impl IsoTime {
    #[inline]
    pub(crate) const fn new_unchecked(
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        microsecond: u16,
        nanosecond: u16,
    ) -> Self {
        Self {
            hour,
            minute,
            second,
            millisecond,
            microsecond,
            nanosecond,
        }
    }

    /// Creates a new `IsoTime`, regulating each field per the overflow
    /// behavior.
    pub(crate) fn new_with_overflow(
        hour: i32,
        minute: i32,
        second: i32,
        millisecond: i32,
        microsecond: i32,
        nanosecond: i32,
        overflow: Overflow,
    ) -> CivilResult<Self> {
        match overflow {
            Overflow::Constrain => Ok(Self::new_unchecked(
                hour.clamp(0, 23) as u8,
                minute.clamp(0, 59) as u8,
                second.clamp(0, 59) as u8,
                millisecond.clamp(0, 999) as u16,
                microsecond.clamp(0, 999) as u16,
                nanosecond.clamp(0, 999) as u16,
            )),
            Overflow::Reject => {
                if !(0..=23).contains(&hour)
                    || !(0..=59).contains(&minute)
                    || !(0..=59).contains(&second)
                    || !(0..=999).contains(&millisecond)
                    || !(0..=999).contains(&microsecond)
                    || !(0..=999).contains(&nanosecond)
                {
                    return Err(CivilError::value().with_message("invalid time field value"));
                }
                Ok(Self::new_unchecked(
                    hour as u8,
                    minute as u8,
                    second as u8,
                    millisecond as u16,
                    microsecond as u16,
                    nanosecond as u16,
                ))
            }
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.hour <= 23
            && self.minute <= 59
            && self.second <= 59
            && self.millisecond <= 999
            && self.microsecond <= 999
            && self.nanosecond <= 999
    }

    /// Returns the time as nanoseconds within a day.
    pub(crate) fn to_nanoseconds(self) -> u64 {
        u64::from(self.hour) * 3_600_000_000_000
            + u64::from(self.minute) * 60_000_000_000
            + u64::from(self.second) * 1_000_000_000
            + u64::from(self.millisecond) * 1_000_000
            + u64::from(self.microsecond) * 1_000
            + u64::from(self.nanosecond)
    }

    /// Balances a day-relative nanosecond value into a day carry and a
    /// wall-clock time.
    pub(crate) fn from_day_nanoseconds(nanoseconds: i128) -> (i64, Self) {
        let days = nanoseconds.div_euclid(NS_PER_DAY as i128);
        let mut rem = nanoseconds.rem_euclid(NS_PER_DAY as i128) as u64;

        let hour = rem / 3_600_000_000_000;
        rem %= 3_600_000_000_000;
        let minute = rem / 60_000_000_000;
        rem %= 60_000_000_000;
        let second = rem / 1_000_000_000;
        rem %= 1_000_000_000;
        let millisecond = rem / 1_000_000;
        rem %= 1_000_000;
        let microsecond = rem / 1_000;
        let nanosecond = rem % 1_000;

        (
            days as i64,
            Self::new_unchecked(
                hour as u8,
                minute as u8,
                second as u8,
                millisecond as u16,
                microsecond as u16,
                nanosecond as u16,
            ),
        )
    }

    /// Adds a nanosecond delta to this time, returning the day carry and
    /// the balanced time.
    pub(crate) fn add(self, nanoseconds: i128) -> (i64, Self) {
        Self::from_day_nanoseconds(self.to_nanoseconds() as i128 + nanoseconds)
    }
}

/// A record of a date and wall-clock time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IsoDateTime {
    pub date: IsoDate,
    pub time: IsoTime,
}

impl IsoDateTime {
    #[inline]
    pub(crate) const fn new_unchecked(date: IsoDate, time: IsoTime) -> Self {
        Self { date, time }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.date.is_valid() && self.time.is_valid()
    }
}

// ==== ISO calendar helpers ====

/// Returns whether the year is a leap year in the proleptic Gregorian
/// calendar.
pub(crate) fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

pub(crate) fn iso_days_in_year(year: i32) -> u16 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

pub(crate) fn iso_days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Balances an unconstrained year/month pair into a valid year and a
/// month in the range 1-12.
pub(crate) fn balance_iso_year_month(year: i64, month: i64) -> CivilResult<(i32, u8)> {
    let year = year + (month - 1).div_euclid(12);
    let month = ((month - 1).rem_euclid(12) + 1) as u8;
    let year = i32::try_from(year)
        .map_err(|_| CivilError::value().with_message("year is outside the supported range"))?;
    Ok((year, month))
}

// Epoch day conversions use the standard civil-from-days decomposition
// over 400-year eras.

fn epoch_days_from_gregorian(year: i32, month: u8, day: u8) -> i64 {
    let year = i64::from(year) - i64::from(month <= 2);
    let era = if year >= 0 { year } else { year - 399 } / 400;
    let year_of_era = year - era * 400;
    let month = i64::from(month);
    let day_of_year = (153 * ((month + 9) % 12) + 2) / 5 + i64::from(day) - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}

fn gregorian_from_epoch_days(days: i64) -> (i32, u8, u8) {
    let days = days + 719_468;
    let era = if days >= 0 { days } else { days - 146_096 } / 146_097;
    let day_of_era = days - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let year = year_of_era + era * 400;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    ((year + i64::from(month <= 2)) as i32, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_day_round_trips() {
        let cases = [
            (1970, 1, 1, 0),
            (1969, 12, 31, -1),
            (2000, 2, 29, 11_016),
            (2016, 12, 31, 17_166),
            (1600, 1, 1, -135_140),
            (-1, 12, 31, -719_529),
        ];
        for (year, month, day, expected) in cases {
            let date = IsoDate::new_unchecked(year, month, day);
            assert_eq!(date.to_epoch_days(), expected, "{year}-{month}-{day}");
            assert_eq!(IsoDate::from_epoch_days(expected), date);
        }
    }

    #[test]
    fn leap_year_rules() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert_eq!(iso_days_in_month(2024, 2), 29);
        assert_eq!(iso_days_in_month(2023, 2), 28);
    }

    #[test]
    fn overflow_constrain_clamps_day() {
        let date = IsoDate::new_with_overflow(2021, 2, 31, Overflow::Constrain).unwrap();
        assert_eq!(date, IsoDate::new_unchecked(2021, 2, 28));

        let err = IsoDate::new_with_overflow(2021, 2, 31, Overflow::Reject).unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn add_months_balances_year() {
        let date = IsoDate::new_unchecked(2023, 11, 30);
        let duration = DateDurationRecord {
            months: 3,
            ..Default::default()
        };
        let result = date
            .add_date_duration(&duration, Overflow::Constrain)
            .unwrap();
        assert_eq!(result, IsoDate::new_unchecked(2024, 2, 29));
    }

    #[test]
    fn diff_largest_year_handles_clamped_ends() {
        let one = IsoDate::new_unchecked(2023, 3, 30);
        let two = IsoDate::new_unchecked(2024, 2, 28);
        let result = one.diff(&two, Unit::Year).unwrap();
        assert_eq!(
            result,
            DateDurationRecord {
                years: 0,
                months: 10,
                weeks: 0,
                days: 29,
            }
        );
    }

    #[test]
    fn diff_weeks_splits_remainder() {
        let one = IsoDate::new_unchecked(2021, 1, 1);
        let two = IsoDate::new_unchecked(2021, 1, 18);
        let result = one.diff(&two, Unit::Week).unwrap();
        assert_eq!(result.weeks, 2);
        assert_eq!(result.days, 3);
    }

    #[test]
    fn time_balances_through_days() {
        let time = IsoTime::new_unchecked(23, 30, 0, 0, 0, 0);
        let (carry, result) = time.add(3_600_000_000_000);
        assert_eq!(carry, 1);
        assert_eq!(result.hour, 0);
        assert_eq!(result.minute, 30);

        let (carry, result) = time.add(-86_400_000_000_000);
        assert_eq!(carry, -1);
        assert_eq!(result, time);
    }

    #[test]
    fn day_of_week_is_iso_numbered() {
        // 1970-01-01 was a Thursday
        assert_eq!(IsoDate::new_unchecked(1970, 1, 1).day_of_week(), 4);
        // 2024-01-01 was a Monday
        assert_eq!(IsoDate::new_unchecked(2024, 1, 1).day_of_week(), 1);
        assert_eq!(IsoDate::new_unchecked(2024, 12, 31).day_of_year(), 366);
    }
}
