//! This module implements the calendar capability set along with the
//! built-in `iso8601` calendar and the designator resolution rules.
//!
//! Calendar-specific behavior is reached exclusively through
//! [`CalendarProtocol`]: field enumeration, date construction from
//! fields, month-day construction, and date arithmetic. The engine
//! never falls back to a different calendar when a bound calendar's
//! operation fails; collaborator errors propagate unchanged.

use alloc::{boxed::Box, string::String, sync::Arc, vec::Vec};
use core::{fmt, str::FromStr};

use crate::{
    builtins::{month_day, Duration, PartialDate},
    fields::{resolve_iso_month, FieldKey, FieldMap},
    iso::{DateDurationRecord, IsoDate},
    options::{Overflow, Unit},
    parsers::parse_allowed_calendar_formats,
    CivilError, CivilResult, NS_PER_DAY,
};

/// The capability set a calendar must implement.
///
/// Implementations may be stateful and are shared behind an `Arc`, so
/// the operations take `&self`.
pub trait CalendarProtocol: fmt::Debug + Send + Sync {
    /// The calendar's identifier.
    fn identifier(&self) -> &str;

    /// Returns the calendar's field-key sequence for a requested key
    /// set.
    ///
    /// The engine calls this exactly once per logical request and fully
    /// drains the returned iterator. The iterator must be finite and
    /// must not yield a key twice.
    fn fields(
        &self,
        requested: &[FieldKey],
    ) -> CivilResult<Box<dyn Iterator<Item = CivilResult<FieldKey>> + '_>>;

    /// Builds an ISO date from a partial field record.
    fn date_from_fields(&self, fields: &PartialDate, overflow: Overflow) -> CivilResult<IsoDate>;

    /// Builds the reference ISO date backing a month-day from a partial
    /// field record.
    ///
    /// `options` is `None` when the caller provided no options value;
    /// implementations apply their own default in that case.
    fn month_day_from_fields(
        &self,
        fields: &PartialDate,
        options: Option<Overflow>,
    ) -> CivilResult<IsoDate>;

    /// Adds a duration to a date.
    fn date_add(
        &self,
        date: &IsoDate,
        duration: &Duration,
        overflow: Overflow,
    ) -> CivilResult<IsoDate>;

    /// Returns the difference between two dates in units no larger than
    /// `largest_unit`.
    fn date_until(&self, one: &IsoDate, two: &IsoDate, largest_unit: Unit)
        -> CivilResult<Duration>;
}

/// A calendar slot value: the built-in `iso8601` calendar or a shared
/// custom protocol implementation.
#[derive(Debug, Clone)]
pub enum Calendar {
    /// The built-in ISO 8601 calendar.
    Iso(IsoCalendar),
    /// A custom calendar implementing the capability set.
    Custom(Arc<dyn CalendarProtocol>),
}

impl Default for Calendar {
    fn default() -> Self {
        Self::Iso(IsoCalendar)
    }
}

// Calendars are compared by identifier.
impl PartialEq for Calendar {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier()
    }
}

impl Eq for Calendar {}

impl Calendar {
    fn protocol(&self) -> &dyn CalendarProtocol {
        match self {
            Self::Iso(iso) => iso,
            Self::Custom(custom) => custom.as_ref(),
        }
    }

    /// The bound calendar's identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.protocol().identifier()
    }

    /// Returns whether this is the built-in ISO 8601 calendar.
    #[must_use]
    pub fn is_iso(&self) -> bool {
        matches!(self, Self::Iso(_))
    }

    /// Calls the calendar's field enumeration once and drains it into a
    /// key list.
    pub(crate) fn resolved_fields(&self, requested: &[FieldKey]) -> CivilResult<Vec<FieldKey>> {
        let iter = self.protocol().fields(requested)?;
        let mut seen = FieldMap::empty();
        let mut keys = Vec::new();
        for key in iter {
            let key = key?;
            if seen.contains(key.as_map()) {
                return Err(CivilError::protocol()
                    .with_message("calendar field enumeration yielded a duplicate key"));
            }
            seen.insert(key.as_map());
            keys.push(key);
        }
        Ok(keys)
    }

    pub(crate) fn date_from_fields(
        &self,
        fields: &PartialDate,
        overflow: Overflow,
    ) -> CivilResult<IsoDate> {
        self.protocol().date_from_fields(fields, overflow)
    }

    pub(crate) fn month_day_from_fields(
        &self,
        fields: &PartialDate,
        options: Option<Overflow>,
    ) -> CivilResult<IsoDate> {
        self.protocol().month_day_from_fields(fields, options)
    }

    pub(crate) fn date_add(
        &self,
        date: &IsoDate,
        duration: &Duration,
        overflow: Overflow,
    ) -> CivilResult<IsoDate> {
        self.protocol().date_add(date, duration, overflow)
    }

    pub(crate) fn date_until(
        &self,
        one: &IsoDate,
        two: &IsoDate,
        largest_unit: Unit,
    ) -> CivilResult<Duration> {
        self.protocol().date_until(one, two, largest_unit)
    }

    /// Parses a calendar from a UTF-8 byte string, accepting the same
    /// forms as [`Calendar::from_str`].
    pub fn try_from_utf8(source: &[u8]) -> CivilResult<Self> {
        let s = core::str::from_utf8(source)
            .map_err(|_| CivilError::value().with_message("calendar string is not valid UTF-8"))?;
        Self::from_str(s)
    }

    /// Consolidates the calendars of two values being combined. The ISO
    /// calendar yields to any other calendar; distinct non-ISO
    /// calendars cannot be combined.
    pub fn consolidate(one: &Self, two: &Self) -> CivilResult<Self> {
        if one.is_iso() {
            return Ok(two.clone());
        }
        if two.is_iso() || one.identifier() == two.identifier() {
            return Ok(one.clone());
        }
        Err(CivilError::value().with_message("calendars of the combined values are not the same"))
    }
}

impl FromStr for Calendar {
    type Err = CivilError;

    /// Accepts a calendar identifier or any annotated ISO 8601 string,
    /// in which case the annotation (or its absence) names the
    /// calendar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("iso8601") {
            return Ok(Self::default());
        }
        if is_calendar_identifier(s) {
            return Err(CivilError::value().with_message("unknown calendar identifier"));
        }
        match parse_allowed_calendar_formats(s) {
            Some(id) if id.eq_ignore_ascii_case("iso8601") => Ok(Self::default()),
            Some(_) => Err(CivilError::value().with_message("unknown calendar identifier")),
            None => Err(CivilError::value().with_message("string is not a valid calendar")),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.identifier().fmt(f)
    }
}

/// A Unicode calendar key is one or more `-`-separated alphanumeric
/// subtags of 3 to 8 characters.
fn is_calendar_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.split('-')
            .all(|part| (3..=8).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_alphanumeric()))
}

// ==== Designator resolution ====

/// The forms a caller-supplied calendar designator can take, as seen at
/// the collaborator boundary.
#[derive(Debug, Clone)]
pub enum CalendarLike {
    /// A string value: a calendar identifier or an annotated ISO string.
    Identifier(String),
    /// A primitive that was coerced to a string representation.
    CoercedPrimitive(String),
    /// A primitive with no string representation.
    Uncoercible,
    /// An object implementing the calendar capability set.
    Object(Calendar),
    /// An object carrying a `calendar` property, holding that
    /// property's value.
    Bag(CalendarSlot),
    /// An object with neither the capability set nor a `calendar`
    /// property.
    Inert,
}

/// The value of a bag's `calendar` property.
#[derive(Debug, Clone)]
pub enum CalendarSlot {
    /// The property was present but undefined.
    Undefined,
    /// The property held a designator value.
    Value(Box<CalendarLike>),
}

impl CalendarLike {
    /// Resolves the designator to a bound calendar.
    ///
    /// A bag's `calendar` property is unwrapped and the inner value is
    /// re-resolved by this same algorithm, so `{calendar: x}` and
    /// `{calendar: {calendar: x}}` resolve identically. An undefined
    /// `calendar` property is a value-domain error at any depth.
    pub fn resolve(&self) -> CivilResult<Calendar> {
        match self {
            Self::Identifier(s) | Self::CoercedPrimitive(s) => Calendar::from_str(s),
            Self::Object(calendar) => Ok(calendar.clone()),
            Self::Uncoercible => Err(CivilError::protocol()
                .with_message("calendar designator cannot be converted to a string")),
            Self::Inert => Err(CivilError::protocol()
                .with_message("object does not implement the calendar capability set")),
            Self::Bag(CalendarSlot::Undefined) => {
                Err(CivilError::value().with_message("calendar property is undefined"))
            }
            Self::Bag(CalendarSlot::Value(inner)) => inner.resolve(),
        }
    }
}

// ==== The built-in ISO 8601 calendar ====

/// The built-in `iso8601` calendar.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IsoCalendar;

impl CalendarProtocol for IsoCalendar {
    fn identifier(&self) -> &str {
        "iso8601"
    }

    fn fields(
        &self,
        requested: &[FieldKey],
    ) -> CivilResult<Box<dyn Iterator<Item = CivilResult<FieldKey>> + '_>> {
        let mut seen = FieldMap::empty();
        let mut keys: Vec<FieldKey> = Vec::with_capacity(requested.len());
        for key in requested {
            if seen.contains(key.as_map()) {
                continue;
            }
            seen.insert(key.as_map());
            keys.push(*key);
        }
        keys.sort_unstable_by_key(|key| key.name());
        Ok(Box::new(keys.into_iter().map(Ok)))
    }

    fn date_from_fields(&self, fields: &PartialDate, overflow: Overflow) -> CivilResult<IsoDate> {
        let year = fields
            .year
            .ok_or_else(|| CivilError::value().with_message("a year field is required"))?;
        let month = resolve_iso_month(fields.month, fields.month_code, overflow)?;
        let day = fields
            .day
            .ok_or_else(|| CivilError::value().with_message("a day field is required"))?;
        IsoDate::new_with_overflow(year, i32::from(month), i32::from(day), overflow)
    }

    fn month_day_from_fields(
        &self,
        fields: &PartialDate,
        options: Option<Overflow>,
    ) -> CivilResult<IsoDate> {
        let overflow = options.unwrap_or_default();
        let month = resolve_iso_month(fields.month, fields.month_code, overflow)?;
        let day = fields
            .day
            .ok_or_else(|| CivilError::value().with_message("a day field is required"))?;
        IsoDate::new_with_overflow(
            month_day::REFERENCE_YEAR,
            i32::from(month),
            i32::from(day),
            overflow,
        )
    }

    fn date_add(
        &self,
        date: &IsoDate,
        duration: &Duration,
        overflow: Overflow,
    ) -> CivilResult<IsoDate> {
        // Whole days carried by the time portion participate in date
        // arithmetic; the sub-day remainder does not.
        let time_days = (duration.time_nanoseconds() / i128::from(NS_PER_DAY)) as i64;
        let days = duration
            .days()
            .checked_add(time_days)
            .ok_or_else(|| CivilError::value().with_message("duration days are out of range"))?;
        let record = DateDurationRecord {
            years: duration.years(),
            months: duration.months(),
            weeks: duration.weeks(),
            days,
        };
        date.add_date_duration(&record, overflow)
    }

    fn date_until(
        &self,
        one: &IsoDate,
        two: &IsoDate,
        largest_unit: Unit,
    ) -> CivilResult<Duration> {
        let largest = if largest_unit == Unit::Auto {
            Unit::Day
        } else {
            largest_unit
        };
        let record = one.diff(two, largest)?;
        Ok(Duration::from_date_duration(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::DATE_TIME_FIELD_KEYS;
    use alloc::string::ToString;

    #[test]
    fn identifier_parsing() {
        assert!(Calendar::from_str("iso8601").unwrap().is_iso());
        assert!(Calendar::from_str("ISO8601").unwrap().is_iso());

        let err = Calendar::from_str("japanese").unwrap_err();
        assert!(err.is_value_error());

        // An annotated ISO string names its calendar.
        assert!(Calendar::from_str("2020-01-01[u-ca=iso8601]").unwrap().is_iso());
        assert!(Calendar::from_str("2020-01-01").unwrap().is_iso());
        assert!(Calendar::from_str("--12-25").unwrap().is_iso());
        assert!(Calendar::from_str("2020-01-01[u-ca=notexist]").is_err());
        assert!(Calendar::from_str("not a calendar").is_err());

        assert!(Calendar::try_from_utf8(b"iso8601").unwrap().is_iso());
        assert!(Calendar::try_from_utf8(b"\xff").is_err());
    }

    #[test]
    fn designator_resolution() {
        // Strings resolve through identifier parsing.
        let calendar = CalendarLike::Identifier("iso8601".to_string())
            .resolve()
            .unwrap();
        assert!(calendar.is_iso());

        // A coerced primitive that is not a usable identifier is a
        // value-domain failure.
        let err = CalendarLike::CoercedPrimitive("1n".to_string())
            .resolve()
            .unwrap_err();
        assert!(err.is_value_error());

        // A primitive with no string form cannot participate at all.
        let err = CalendarLike::Uncoercible.resolve().unwrap_err();
        assert!(err.is_protocol_error());

        // A plain object without the capability set is unusable.
        let err = CalendarLike::Inert.resolve().unwrap_err();
        assert!(err.is_protocol_error());
    }

    fn bag(inner: CalendarLike) -> CalendarLike {
        CalendarLike::Bag(CalendarSlot::Value(Box::new(inner)))
    }

    #[test]
    fn bag_unwrapping_re_resolves_the_inner_value() {
        // { calendar: <calendar object> } unwraps to the object.
        let object = CalendarLike::Object(Calendar::default());
        assert!(bag(object).resolve().unwrap().is_iso());

        // { calendar: "iso8601" } unwraps to the string designator.
        let identifier = CalendarLike::Identifier("iso8601".to_string());
        assert!(bag(identifier.clone()).resolve().unwrap().is_iso());

        // { calendar: x } and { calendar: { calendar: x } } resolve
        // identically.
        assert!(bag(bag(identifier)).resolve().unwrap().is_iso());

        // { calendar: undefined } is a value-domain failure at any
        // depth.
        let err = CalendarLike::Bag(CalendarSlot::Undefined).resolve().unwrap_err();
        assert!(err.is_value_error());
        let err = bag(CalendarLike::Bag(CalendarSlot::Undefined))
            .resolve()
            .unwrap_err();
        assert!(err.is_value_error());

        // An unwrapped object without a calendar property is used
        // directly, and fails on the missing capability set.
        let err = bag(CalendarLike::Inert).resolve().unwrap_err();
        assert!(err.is_protocol_error());
    }

    #[test]
    fn iso_fields_are_sorted_and_deduped() {
        let calendar = Calendar::default();
        let keys = calendar
            .resolved_fields(&[FieldKey::Year, FieldKey::Day, FieldKey::Year, FieldKey::Month])
            .unwrap();
        assert_eq!(keys, alloc::vec![FieldKey::Day, FieldKey::Month, FieldKey::Year]);

        let keys = calendar.resolved_fields(&DATE_TIME_FIELD_KEYS).unwrap();
        let names: Vec<&str> = keys.iter().map(FieldKey::name).collect();
        assert_eq!(
            names,
            alloc::vec![
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

    #[test]
    fn iso_date_from_fields() {
        let calendar = Calendar::default();
        let partial = PartialDate::new()
            .with_year(Some(2024))
            .with_month(Some(2))
            .with_day(Some(31));

        let constrained = calendar
            .date_from_fields(&partial, Overflow::Constrain)
            .unwrap();
        assert_eq!(constrained, IsoDate::new_unchecked(2024, 2, 29));

        let err = calendar
            .date_from_fields(&partial, Overflow::Reject)
            .unwrap_err();
        assert!(err.is_value_error());

        let missing = PartialDate::new().with_month(Some(2)).with_day(Some(1));
        assert!(calendar.date_from_fields(&missing, Overflow::Constrain).is_err());
    }

    #[test]
    fn iso_date_until_largest_units() {
        let calendar = Calendar::default();
        let one = IsoDate::new_unchecked(2021, 1, 30);
        let two = IsoDate::new_unchecked(2022, 3, 1);

        let result = calendar.date_until(&one, &two, Unit::Year).unwrap();
        assert_eq!((result.years(), result.months(), result.days()), (1, 1, 1));

        let result = calendar.date_until(&one, &two, Unit::Month).unwrap();
        assert_eq!((result.years(), result.months(), result.days()), (0, 13, 1));

        let result = calendar.date_until(&one, &two, Unit::Day).unwrap();
        assert_eq!(result.days(), 395);

        // Candidate adjustment runs from the start date, so the
        // reverse difference is not a plain negation.
        let result = calendar.date_until(&two, &one, Unit::Year).unwrap();
        assert_eq!((result.years(), result.months(), result.days()), (-1, -1, -2));
    }

    #[test]
    fn consolidation_prefers_non_iso() {
        let iso = Calendar::default();
        assert!(Calendar::consolidate(&iso, &iso).unwrap().is_iso());
    }
}
