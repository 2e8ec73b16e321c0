//! Option types consumed by the engine's operations.
//!
//! Operations that round, difference, or construct values take caller
//! options describing units, overflow behavior, and rounding modes.

use crate::{builtins::PartialDateTime, CivilDate, CivilError, CivilResult, CivilUnwrap, NS_PER_DAY};
use alloc::boxed::Box;
use core::num::{NonZeroU128, NonZeroU32};
use core::{fmt, str::FromStr};

// ==== RoundingOptions ====

/// Rounding options for `Duration` rounding operations.
#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub struct RoundingOptions {
    pub largest_unit: Option<Unit>,
    pub smallest_unit: Option<Unit>,
    pub rounding_mode: Option<RoundingMode>,
    pub increment: Option<RoundingIncrement>,
}

// Note: a default with both largest and smallest unit unset would
// always reject, so largest defaults to Auto.
impl Default for RoundingOptions {
    fn default() -> Self {
        Self {
            largest_unit: Some(Unit::Auto),
            smallest_unit: None,
            rounding_mode: None,
            increment: None,
        }
    }
}

/// Internal options object that represents the resolved rounding options.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedRoundingOptions {
    pub(crate) largest_unit: Unit,
    pub(crate) smallest_unit: Unit,
    pub(crate) increment: RoundingIncrement,
    pub(crate) rounding_mode: RoundingMode,
}

impl ResolvedRoundingOptions {
    pub(crate) fn from_duration_options(
        options: RoundingOptions,
        existing_largest: Unit,
    ) -> CivilResult<Self> {
        if options.largest_unit.is_none() && options.smallest_unit.is_none() {
            return Err(CivilError::value()
                .with_message("smallestUnit and largestUnit cannot both be None."));
        }

        let increment = options.increment.unwrap_or_default();
        let rounding_mode = options.rounding_mode.unwrap_or_default();
        let smallest_unit = options.smallest_unit.unwrap_or(Unit::Nanosecond);

        let default_largest = existing_largest.max(smallest_unit);
        let largest_unit = match options.largest_unit {
            Some(Unit::Auto) | None => default_largest,
            Some(unit) => unit,
        };

        if largest_unit.max(smallest_unit) != largest_unit {
            return Err(CivilError::value().with_message(
                "largestUnit when rounding Duration was not the largest provided unit",
            ));
        }

        if let Some(max) = smallest_unit.to_maximum_rounding_increment() {
            increment.validate(max.into(), false)?;
        }

        Ok(Self {
            largest_unit,
            smallest_unit,
            increment,
            rounding_mode,
        })
    }
}

// ==== RelativeTo ====

/// The relative date argument accepted by `Duration` operations that
/// need a calendar anchor.
///
/// A bag variant is resolved through the bound calendar's field
/// enumeration before use; an already-constructed date is used as-is.
#[derive(Debug, Clone)]
pub enum RelativeTo {
    /// A resolved civil date.
    Date(CivilDate),
    /// An unresolved property bag.
    Bag(Box<PartialDateTime>),
}

impl From<CivilDate> for RelativeTo {
    fn from(value: CivilDate) -> Self {
        Self::Date(value)
    }
}

impl From<PartialDateTime> for RelativeTo {
    fn from(value: PartialDateTime) -> Self {
        Self::Bag(Box::new(value))
    }
}

// ==== Options enums and methods ====

/// The relevant unit that should be used for the operation that this
/// option is provided as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Unit {
    /// The `Auto` unit
    Auto = 0,
    /// The `Nanosecond` unit
    Nanosecond,
    /// The `Microsecond` unit
    Microsecond,
    /// The `Millisecond` unit
    Millisecond,
    /// The `Second` unit
    Second,
    /// The `Minute` unit
    Minute,
    /// The `Hour` unit
    Hour,
    /// The `Day` unit
    Day,
    /// The `Week` unit
    Week,
    /// The `Month` unit
    Month,
    /// The `Year` unit
    Year,
}

impl Unit {
    /// Returns the maximum rounding increment for the current unit.
    #[inline]
    #[must_use]
    pub fn to_maximum_rounding_increment(self) -> Option<u32> {
        use Unit::{
            Auto, Day, Hour, Microsecond, Millisecond, Minute, Month, Nanosecond, Second, Week,
            Year,
        };
        let max = match self {
            Auto | Year | Month | Week | Day => return None,
            Hour => 24,
            Minute | Second => 60,
            Millisecond | Microsecond | Nanosecond => 1000,
        };
        Some(max)
    }

    /// Returns the nanosecond length of a fixed-length unit.
    #[must_use]
    pub fn as_nanoseconds(&self) -> Option<u64> {
        use Unit::{
            Auto, Day, Hour, Microsecond, Millisecond, Minute, Month, Nanosecond, Second, Week,
            Year,
        };
        match self {
            Year | Month | Week | Auto => None,
            Day => Some(NS_PER_DAY),
            Hour => Some(3_600_000_000_000),
            Minute => Some(60_000_000_000),
            Second => Some(1_000_000_000),
            Millisecond => Some(1_000_000),
            Microsecond => Some(1_000),
            Nanosecond => Some(1),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_calendar_unit(&self) -> bool {
        use Unit::{Month, Week, Year};
        matches!(self, Year | Month | Week)
    }

    #[inline]
    #[must_use]
    pub fn is_time_unit(&self) -> bool {
        use Unit::{Hour, Microsecond, Millisecond, Minute, Nanosecond, Second};
        matches!(
            self,
            Hour | Minute | Second | Millisecond | Microsecond | Nanosecond
        )
    }
}

impl From<usize> for Unit {
    fn from(value: usize) -> Self {
        match value {
            10 => Self::Year,
            9 => Self::Month,
            8 => Self::Week,
            7 => Self::Day,
            6 => Self::Hour,
            5 => Self::Minute,
            4 => Self::Second,
            3 => Self::Millisecond,
            2 => Self::Microsecond,
            1 => Self::Nanosecond,
            _ => Self::Auto,
        }
    }
}

/// A parsing error for `Unit`.
#[derive(Debug, Clone, Copy)]
pub struct ParseUnitError;

impl fmt::Display for ParseUnitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("provided string was not a valid unit")
    }
}

impl FromStr for Unit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "year" | "years" => Ok(Self::Year),
            "month" | "months" => Ok(Self::Month),
            "week" | "weeks" => Ok(Self::Week),
            "day" | "days" => Ok(Self::Day),
            "hour" | "hours" => Ok(Self::Hour),
            "minute" | "minutes" => Ok(Self::Minute),
            "second" | "seconds" => Ok(Self::Second),
            "millisecond" | "milliseconds" => Ok(Self::Millisecond),
            "microsecond" | "microseconds" => Ok(Self::Microsecond),
            "nanosecond" | "nanoseconds" => Ok(Self::Nanosecond),
            _ => Err(ParseUnitError),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Auto => "auto",
            Self::Year => "year",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Millisecond => "millisecond",
            Self::Microsecond => "microsecond",
            Self::Nanosecond => "nanosecond",
        }
        .fmt(f)
    }
}

/// The overflow policy applied when out-of-range field combinations are
/// regulated during date construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Constrain option
    #[default]
    Constrain,
    /// Reject option
    Reject,
}

/// A parsing error for `Overflow`.
#[derive(Debug, Clone, Copy)]
pub struct ParseOverflowError;

impl fmt::Display for ParseOverflowError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("provided string was not a valid overflow value")
    }
}

impl FromStr for Overflow {
    type Err = ParseOverflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constrain" => Ok(Self::Constrain),
            "reject" => Ok(Self::Reject),
            _ => Err(ParseOverflowError),
        }
    }
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Constrain => "constrain",
            Self::Reject => "reject",
        }
        .fmt(f)
    }
}

/// Declares the specified `RoundingMode` for the operation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RoundingMode {
    /// Ceil RoundingMode
    Ceil,
    /// Floor RoundingMode
    Floor,
    /// Expand RoundingMode
    Expand,
    /// Truncate RoundingMode
    Trunc,
    /// HalfCeil RoundingMode
    HalfCeil,
    /// HalfFloor RoundingMode
    HalfFloor,
    /// HalfExpand RoundingMode - Default
    #[default]
    HalfExpand,
    /// HalfTruncate RoundingMode
    HalfTrunc,
    /// HalfEven RoundingMode
    HalfEven,
}

/// The `UnsignedRoundingMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsignedRoundingMode {
    /// `Infinity` `RoundingMode`
    Infinity,
    /// `Zero` `RoundingMode`
    Zero,
    /// `HalfInfinity` `RoundingMode`
    HalfInfinity,
    /// `HalfZero` `RoundingMode`
    HalfZero,
    /// `HalfEven` `RoundingMode`
    HalfEven,
}

impl RoundingMode {
    /// Negates the current `RoundingMode`.
    #[inline]
    #[must_use]
    pub const fn negate(self) -> Self {
        use RoundingMode::{
            Ceil, Expand, Floor, HalfCeil, HalfEven, HalfExpand, HalfFloor, HalfTrunc, Trunc,
        };
        match self {
            Ceil => Self::Floor,
            Floor => Self::Ceil,
            HalfCeil => Self::HalfFloor,
            HalfFloor => Self::HalfCeil,
            Trunc => Self::Trunc,
            Expand => Self::Expand,
            HalfTrunc => Self::HalfTrunc,
            HalfExpand => Self::HalfExpand,
            HalfEven => Self::HalfEven,
        }
    }

    /// Returns the `UnsignedRoundingMode` for the sign of the value
    /// being rounded.
    #[inline]
    #[must_use]
    pub const fn get_unsigned_round_mode(self, is_positive: bool) -> UnsignedRoundingMode {
        use RoundingMode::{
            Ceil, Expand, Floor, HalfCeil, HalfEven, HalfExpand, HalfFloor, HalfTrunc, Trunc,
        };
        match self {
            Ceil if is_positive => UnsignedRoundingMode::Infinity,
            Ceil => UnsignedRoundingMode::Zero,
            Floor if is_positive => UnsignedRoundingMode::Zero,
            Floor => UnsignedRoundingMode::Infinity,
            Expand => UnsignedRoundingMode::Infinity,
            Trunc => UnsignedRoundingMode::Zero,
            HalfCeil if is_positive => UnsignedRoundingMode::HalfInfinity,
            HalfCeil => UnsignedRoundingMode::HalfZero,
            HalfFloor if is_positive => UnsignedRoundingMode::HalfZero,
            HalfFloor => UnsignedRoundingMode::HalfInfinity,
            HalfExpand => UnsignedRoundingMode::HalfInfinity,
            HalfTrunc => UnsignedRoundingMode::HalfZero,
            HalfEven => UnsignedRoundingMode::HalfEven,
        }
    }
}

impl FromStr for RoundingMode {
    type Err = CivilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ceil" => Ok(Self::Ceil),
            "floor" => Ok(Self::Floor),
            "expand" => Ok(Self::Expand),
            "trunc" => Ok(Self::Trunc),
            "halfCeil" => Ok(Self::HalfCeil),
            "halfFloor" => Ok(Self::HalfFloor),
            "halfExpand" => Ok(Self::HalfExpand),
            "halfTrunc" => Ok(Self::HalfTrunc),
            "halfEven" => Ok(Self::HalfEven),
            _ => Err(CivilError::value().with_message("RoundingMode not an accepted value.")),
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ceil => "ceil",
            Self::Floor => "floor",
            Self::Expand => "expand",
            Self::Trunc => "trunc",
            Self::HalfCeil => "halfCeil",
            Self::HalfFloor => "halfFloor",
            Self::HalfExpand => "halfExpand",
            Self::HalfTrunc => "halfTrunc",
            Self::HalfEven => "halfEven",
        }
        .fmt(f)
    }
}

// ==== RoundingIncrement ====

/// A validated rounding increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingIncrement(NonZeroU32);

impl Default for RoundingIncrement {
    fn default() -> Self {
        Self::ONE
    }
}

impl RoundingIncrement {
    /// An increment of one, the default.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Creates a `RoundingIncrement` from a `u32`.
    pub fn try_new(value: u32) -> CivilResult<Self> {
        NonZeroU32::new(value)
            .map(Self)
            .ok_or_else(|| CivilError::value().with_message("rounding increment cannot be zero"))
    }

    #[inline]
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }

    /// Validates the increment against the dividend of the unit being
    /// rounded.
    pub(crate) fn validate(&self, dividend: u64, inclusive: bool) -> CivilResult<()> {
        let max = if inclusive { dividend } else { dividend - 1 };
        let increment = u64::from(self.get());
        if increment > max {
            return Err(CivilError::value().with_message("rounding increment exceeds maximum"));
        }
        if dividend % increment != 0 {
            return Err(CivilError::value()
                .with_message("rounding increment must divide evenly into the unit maximum"));
        }
        Ok(())
    }

    /// Returns the increment scaled to the nanosecond length of a unit.
    pub(crate) fn as_unit_nanoseconds(&self, unit: Unit) -> CivilResult<NonZeroU128> {
        let unit_ns = unit.as_nanoseconds().civil_unwrap()?;
        NonZeroU128::new(u128::from(unit_ns) * u128::from(self.get()))
            .civil_unwrap()
    }
}

impl TryFrom<u32> for RoundingIncrement {
    type Error = CivilError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_ordering_and_parsing() {
        assert!(Unit::Year > Unit::Month);
        assert!(Unit::Day > Unit::Hour);
        assert_eq!(Unit::from_str("minutes").unwrap(), Unit::Minute);
        assert!(Unit::from_str("fortnight").is_err());
        assert!(Unit::Week.is_calendar_unit());
        assert!(!Unit::Day.is_calendar_unit());
    }

    #[test]
    fn resolved_options_require_a_unit() {
        let options = RoundingOptions {
            largest_unit: None,
            smallest_unit: None,
            rounding_mode: None,
            increment: None,
        };
        let err = ResolvedRoundingOptions::from_duration_options(options, Unit::Day).unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn increment_validation() {
        let thirty = RoundingIncrement::try_new(30).unwrap();
        assert!(thirty.validate(60, false).is_ok());
        // 45 does not evenly divide 60
        let forty_five = RoundingIncrement::try_new(45).unwrap();
        assert!(forty_five.validate(60, false).is_err());
        // 60 is only valid when inclusive
        let sixty = RoundingIncrement::try_new(60).unwrap();
        assert!(sixty.validate(60, false).is_err());
        assert!(sixty.validate(60, true).is_ok());
        assert!(RoundingIncrement::try_new(0).is_err());
    }
}
