//! This module implements `TimeZone` and the designator resolution
//! rules for time zone annotations and identifiers.

use alloc::{boxed::Box, string::String, string::ToString};
use core::{fmt, str::FromStr};

use crate::{
    parsers::{
        parse_date_time,
        timezone::{is_valid_iana_identifier, parse_offset_identifier},
        FormattableOffset, TimeZoneRecord, UtcOffsetOrZ,
    },
    CivilError, CivilResult,
};

/// The zone names the engine recognizes, in canonical casing.
///
/// The engine models zone identity only; it carries no transition data,
/// so the registry is a fixed identifier list rather than a database.
const ZONE_REGISTRY: &[&str] = &[
    "UTC",
    "Africa/Cairo",
    "America/Argentina/Buenos_Aires",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "America/New_York",
    "America/Sao_Paulo",
    "Asia/Kolkata",
    "Asia/Shanghai",
    "Asia/Tokyo",
    "Australia/Sydney",
    "Europe/Berlin",
    "Europe/London",
    "Europe/Madrid",
    "Europe/Paris",
    "Pacific/Auckland",
];

fn canonicalize(identifier: &str) -> Option<&'static str> {
    ZONE_REGISTRY
        .iter()
        .find(|zone| zone.eq_ignore_ascii_case(identifier))
        .copied()
}

/// A resolved time zone: a canonical named identifier or a fixed
/// offset in minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeZone {
    /// A named identifier from the registry.
    IanaIdentifier(String),
    /// A fixed offset from UTC in signed minutes.
    OffsetMinutes(i16),
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::IanaIdentifier(String::from("UTC"))
    }
}

impl TimeZone {
    /// The zone's identifier string.
    #[must_use]
    pub fn identifier(&self) -> String {
        match self {
            Self::IanaIdentifier(name) => name.clone(),
            Self::OffsetMinutes(minutes) => FormattableOffset(*minutes).to_string(),
        }
    }

    /// Resolves a time zone from a string.
    ///
    /// Accepted forms are the `Z` designator, an offset identifier, a
    /// registered zone name, or any annotated date-time string carrying
    /// zone information. An annotation naming an unregistered zone
    /// falls back to the string's numeric offset when one is present.
    pub fn try_from_str(source: &str) -> CivilResult<Self> {
        if source.is_empty() {
            return Err(CivilError::value().with_message("time zone string is empty"));
        }
        if source.eq_ignore_ascii_case("z") {
            return Ok(Self::default());
        }
        if source.starts_with(['+', '-']) {
            return Ok(Self::OffsetMinutes(parse_offset_identifier(source)?));
        }
        if let Some(canonical) = canonicalize(source) {
            return Ok(Self::IanaIdentifier(String::from(canonical)));
        }
        if is_valid_iana_identifier(source) {
            return Err(CivilError::value().with_message("unrecognized time zone name"));
        }

        let record = parse_date_time(source.as_bytes())?;
        let offset_fallback = match record.offset {
            Some(UtcOffsetOrZ::Z) => Some(Self::default()),
            Some(UtcOffsetOrZ::Offset(offset)) => Some(Self::OffsetMinutes(offset.minutes())),
            None => None,
        };

        match record.tz.map(|annotation| annotation.zone) {
            Some(TimeZoneRecord::Named(name)) => match canonicalize(&name) {
                Some(canonical) => Ok(Self::IanaIdentifier(String::from(canonical))),
                None => offset_fallback.ok_or_else(|| {
                    CivilError::value().with_message("unrecognized time zone name")
                }),
            },
            Some(TimeZoneRecord::Offset(offset)) => Ok(Self::OffsetMinutes(offset.minutes())),
            None => offset_fallback.ok_or_else(|| {
                CivilError::value().with_message("string carries no time zone designator")
            }),
        }
    }
}

impl FromStr for TimeZone {
    type Err = CivilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_str(s)
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IanaIdentifier(name) => name.fmt(f),
            Self::OffsetMinutes(minutes) => FormattableOffset(*minutes).fmt(f),
        }
    }
}

// ==== Designator resolution ====

/// The forms a caller-supplied time zone designator can take.
#[derive(Debug, Clone)]
pub enum TimeZoneLike {
    /// A string designator.
    Identifier(String),
    /// A primitive that was coerced to a string representation.
    CoercedPrimitive(String),
    /// A primitive with no string representation.
    Uncoercible,
    /// A resolved time zone object.
    Object(TimeZone),
    /// An object carrying a `timeZone` property, holding that
    /// property's value.
    Bag(TimeZoneSlot),
    /// An object with neither zone capability nor a `timeZone`
    /// property.
    Inert,
}

/// The value of a bag's `timeZone` property.
#[derive(Debug, Clone)]
pub enum TimeZoneSlot {
    /// The property was present but undefined.
    Undefined,
    /// The property held a designator value.
    Value(Box<TimeZoneLike>),
}

impl TimeZoneLike {
    /// Resolves the designator to a time zone. A bag's `timeZone`
    /// property is unwrapped and the inner value re-resolved by this
    /// same algorithm; an undefined property is a value-domain error at
    /// any depth.
    pub fn resolve(&self) -> CivilResult<TimeZone> {
        match self {
            Self::Identifier(s) | Self::CoercedPrimitive(s) => TimeZone::try_from_str(s),
            Self::Object(zone) => Ok(zone.clone()),
            Self::Uncoercible => Err(CivilError::protocol()
                .with_message("time zone designator cannot be converted to a string")),
            Self::Inert => Err(CivilError::protocol()
                .with_message("object does not implement the time zone capability")),
            Self::Bag(TimeZoneSlot::Undefined) => {
                Err(CivilError::value().with_message("timeZone property is undefined"))
            }
            Self::Bag(TimeZoneSlot::Value(inner)) => inner.resolve(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_forms() {
        assert_eq!(TimeZone::try_from_str("Z").unwrap(), TimeZone::default());
        assert_eq!(
            TimeZone::try_from_str("utc").unwrap().identifier(),
            "UTC"
        );
        assert_eq!(
            TimeZone::try_from_str("america/new_york").unwrap().identifier(),
            "America/New_York"
        );
        assert_eq!(
            TimeZone::try_from_str("+05:30").unwrap(),
            TimeZone::OffsetMinutes(330)
        );
        assert_eq!(
            TimeZone::try_from_str("-0800").unwrap(),
            TimeZone::OffsetMinutes(-480)
        );
        // Sub-minute offset identifiers are not representable.
        assert!(TimeZone::try_from_str("+05:30:00").is_err());
        assert!(TimeZone::try_from_str("").is_err());

        // A well-formed but unregistered name gets a dedicated error.
        let err = TimeZone::try_from_str("Not/AZone").unwrap_err();
        assert!(err.is_value_error());
        assert!(err.message().contains("unrecognized"));
    }

    #[test]
    fn annotated_strings_resolve_zone_information() {
        let zone = TimeZone::try_from_str("2016-12-31T23:59:60+00:00[UTC]").unwrap();
        assert_eq!(zone.identifier(), "UTC");

        let zone = TimeZone::try_from_str("2020-06-01T12:00-04:00[America/New_York]").unwrap();
        assert_eq!(zone.identifier(), "America/New_York");

        let zone = TimeZone::try_from_str("2020-06-01T12:00+05:30[+05:30]").unwrap();
        assert_eq!(zone, TimeZone::OffsetMinutes(330));

        // An unregistered name falls back to the numeric offset.
        let zone = TimeZone::try_from_str("2020-06-01T12:00+09:30[Australia/Eucla]").unwrap();
        assert_eq!(zone, TimeZone::OffsetMinutes(570));

        let zone = TimeZone::try_from_str("2020-06-01T12:00Z").unwrap();
        assert_eq!(zone.identifier(), "UTC");

        // No zone information at all.
        assert!(TimeZone::try_from_str("2020-06-01T12:00").is_err());
    }

    #[test]
    fn leap_second_in_bracketed_offset_is_rejected() {
        let err = TimeZone::try_from_str("2021-08-19T17:30:45.123456789+23:59[+23:59:60]")
            .unwrap_err();
        assert!(err.is_value_error());
        assert!(err.message().contains("annotation"));
    }

    #[test]
    fn designator_resolution_mirrors_calendar_rules() {
        let like = TimeZoneLike::Identifier(String::from("UTC"));
        assert_eq!(like.resolve().unwrap(), TimeZone::default());

        assert!(TimeZoneLike::Uncoercible.resolve().unwrap_err().is_protocol_error());
        assert!(TimeZoneLike::Inert.resolve().unwrap_err().is_protocol_error());
        assert!(TimeZoneLike::Bag(TimeZoneSlot::Undefined)
            .resolve()
            .unwrap_err()
            .is_value_error());

        // A bag's timeZone property is re-resolved.
        let inner = TimeZoneLike::Object(TimeZone::OffsetMinutes(0));
        let bag = TimeZoneLike::Bag(TimeZoneSlot::Value(Box::new(inner)));
        assert_eq!(bag.resolve().unwrap(), TimeZone::OffsetMinutes(0));

        // An undefined timeZone property fails at any depth.
        let nested = TimeZoneLike::Bag(TimeZoneSlot::Value(Box::new(TimeZoneLike::Bag(
            TimeZoneSlot::Undefined,
        ))));
        assert!(nested.resolve().unwrap_err().is_value_error());
    }

    #[test]
    fn display_formats_offsets() {
        assert_eq!(TimeZone::OffsetMinutes(-330).identifier(), "-05:30");
        assert_eq!(TimeZone::default().identifier(), "UTC");
    }
}
