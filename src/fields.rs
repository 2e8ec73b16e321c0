//! Calendar field keys and month codes.
//!
//! The engine's property-bag protocol is defined over a fixed set of
//! field names. `FieldKey` is the typed form of those names and
//! `FieldMap` tracks which keys a bag provided.

use crate::{options::Overflow, CivilError, CivilResult};
use bitflags::bitflags;
use core::{fmt, str::FromStr};
use tinystr::{tinystr, TinyAsciiStr};

bitflags! {
    /// A bitmap of the field keys present in a property bag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldMap: u16 {
        const YEAR = 0b0000_0000_0000_0001;
        const MONTH = 0b0000_0000_0000_0010;
        const MONTH_CODE = 0b0000_0000_0000_0100;
        const DAY = 0b0000_0000_0000_1000;
        const HOUR = 0b0000_0000_0001_0000;
        const MINUTE = 0b0000_0000_0010_0000;
        const SECOND = 0b0000_0000_0100_0000;
        const MILLISECOND = 0b0000_0000_1000_0000;
        const MICROSECOND = 0b0000_0001_0000_0000;
        const NANOSECOND = 0b0000_0010_0000_0000;
    }
}

/// The recognized property-bag field keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Year,
    Month,
    MonthCode,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl FieldKey {
    /// The key's canonical property name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::MonthCode => "monthCode",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Millisecond => "millisecond",
            Self::Microsecond => "microsecond",
            Self::Nanosecond => "nanosecond",
        }
    }

    pub(crate) const fn as_map(&self) -> FieldMap {
        match self {
            Self::Year => FieldMap::YEAR,
            Self::Month => FieldMap::MONTH,
            Self::MonthCode => FieldMap::MONTH_CODE,
            Self::Day => FieldMap::DAY,
            Self::Hour => FieldMap::HOUR,
            Self::Minute => FieldMap::MINUTE,
            Self::Second => FieldMap::SECOND,
            Self::Millisecond => FieldMap::MILLISECOND,
            Self::Microsecond => FieldMap::MICROSECOND,
            Self::Nanosecond => FieldMap::NANOSECOND,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

impl FromStr for FieldKey {
    type Err = CivilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "monthCode" => Ok(Self::MonthCode),
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            "minute" => Ok(Self::Minute),
            "second" => Ok(Self::Second),
            "millisecond" => Ok(Self::Millisecond),
            "microsecond" => Ok(Self::Microsecond),
            "nanosecond" => Ok(Self::Nanosecond),
            _ => Err(CivilError::value().with_message("unrecognized field key")),
        }
    }
}

/// The date field keys, in canonical sorted (alphabetical) order.
pub(crate) const DATE_FIELD_KEYS: [FieldKey; 4] = [
    FieldKey::Day,
    FieldKey::Month,
    FieldKey::MonthCode,
    FieldKey::Year,
];

/// The month-day field keys, in canonical sorted order.
pub(crate) const MONTH_DAY_FIELD_KEYS: [FieldKey; 2] = [FieldKey::Day, FieldKey::MonthCode];

/// All date and time field keys, in canonical sorted order.
pub(crate) const DATE_TIME_FIELD_KEYS: [FieldKey; 10] = [
    FieldKey::Day,
    FieldKey::Hour,
    FieldKey::Microsecond,
    FieldKey::Millisecond,
    FieldKey::Minute,
    FieldKey::Month,
    FieldKey::MonthCode,
    FieldKey::Nanosecond,
    FieldKey::Second,
    FieldKey::Year,
];

/// A validated month code.
///
/// Month codes are `M` followed by a two-digit month number, with an
/// `L` suffix reserved for leap months in calendars that carry them
/// (the built-in ISO calendar does not).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthCode(pub(crate) TinyAsciiStr<4>);

impl MonthCode {
    /// Validates a `MonthCode` from a raw `TinyAsciiStr<4>`.
    pub fn try_new(code: TinyAsciiStr<4>) -> CivilResult<Self> {
        let bytes = code.all_bytes();
        let valid = bytes[0] == b'M'
            && bytes[1].is_ascii_digit()
            && bytes[2].is_ascii_digit()
            && (bytes[3] == 0 || bytes[3] == b'L');
        if !valid {
            return Err(CivilError::value().with_message("invalid month code"));
        }
        let number = (bytes[1] - b'0') * 10 + (bytes[2] - b'0');
        if number == 0 || number > 13 {
            return Err(CivilError::value().with_message("month code is out of range"));
        }
        Ok(Self(code))
    }

    /// Creates a non-leap `MonthCode` from a month number.
    pub(crate) fn from_month(month: u8) -> CivilResult<Self> {
        let code = match month {
            1 => tinystr!(4, "M01"),
            2 => tinystr!(4, "M02"),
            3 => tinystr!(4, "M03"),
            4 => tinystr!(4, "M04"),
            5 => tinystr!(4, "M05"),
            6 => tinystr!(4, "M06"),
            7 => tinystr!(4, "M07"),
            8 => tinystr!(4, "M08"),
            9 => tinystr!(4, "M09"),
            10 => tinystr!(4, "M10"),
            11 => tinystr!(4, "M11"),
            12 => tinystr!(4, "M12"),
            13 => tinystr!(4, "M13"),
            _ => return Err(CivilError::value().with_message("month not representable")),
        };
        Ok(Self(code))
    }

    /// The month number this code names.
    #[must_use]
    pub fn to_month_integer(&self) -> u8 {
        let bytes = self.0.all_bytes();
        (bytes[1] - b'0') * 10 + (bytes[2] - b'0')
    }

    /// Returns whether the code names a leap month.
    #[must_use]
    pub fn is_leap_month(&self) -> bool {
        self.0.len() == 4
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MonthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MonthCode {
    type Err = CivilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = TinyAsciiStr::<4>::try_from_str(s)
            .map_err(|_| CivilError::value().with_message("invalid month code"))?;
        Self::try_new(code)
    }
}

/// Resolves a bag's `month`/`monthCode` pair into an ISO month number.
///
/// A bag may carry either key; when both are present they must agree.
pub(crate) fn resolve_iso_month(
    month: Option<u8>,
    month_code: Option<MonthCode>,
    overflow: Overflow,
) -> CivilResult<u8> {
    match (month, month_code) {
        (None, None) => {
            Err(CivilError::value().with_message("a month or monthCode field is required"))
        }
        (Some(month), None) => {
            if overflow == Overflow::Constrain {
                return Ok(month.clamp(1, 12));
            }
            if !(1..=12).contains(&month) {
                return Err(CivilError::value().with_message("month value is out of range"));
            }
            Ok(month)
        }
        (None, Some(code)) => {
            if code.is_leap_month() || code.to_month_integer() > 12 {
                return Err(
                    CivilError::value().with_message("monthCode is not valid for this calendar")
                );
            }
            Ok(code.to_month_integer())
        }
        (Some(month), Some(code)) => {
            if i32::from(month) != i32::from(code.to_month_integer()) {
                return Err(
                    CivilError::value().with_message("month and monthCode must agree")
                );
            }
            if code.is_leap_month() || code.to_month_integer() > 12 {
                return Err(
                    CivilError::value().with_message("monthCode is not valid for this calendar")
                );
            }
            Ok(code.to_month_integer())
        }
    }
}
