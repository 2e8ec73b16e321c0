//! Byte-cursor grammar for ISO 8601 extended date/time strings.
//!
//! The lexer walks the source a byte at a time, producing the typed
//! records in the parent module. The date/time separator may be `T`,
//! `t`, or a single space; the three forms produce identical records.
//!
//! A seconds value of `60` is tolerated only in the primary time
//! segment, where it is normalized to `59` with the record's leap
//! second flag set. The same digits inside a bracketed annotation
//! always fail with a value-domain error.

use alloc::string::String;

use super::{
    timezone::{is_tz_char, is_tz_leading_char},
    DateRecord, DurationParseRecord, ParsedDateTime, ParsedMonthDay, TimeRecord,
    TimeZoneAnnotation, TimeZoneRecord, UtcOffsetOrZ, UtcOffsetRecord,
};
use crate::{iso::iso_days_in_month, CivilError, CivilResult};

/// The position a time or offset segment appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Primary,
    Annotation,
}

pub(crate) struct Cursor<'a> {
    source: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(source: &'a [u8]) -> Self {
        Self { source, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn next(&mut self) -> Option<u8> {
        let byte = self.peek();
        self.pos += 1;
        byte
    }

    fn is_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Returns whether `needle` appears before `stop` in the remaining
    /// source.
    fn contains_before(&self, needle: u8, stop: u8) -> bool {
        for byte in &self.source[self.pos.min(self.source.len())..] {
            if *byte == needle {
                return true;
            }
            if *byte == stop {
                return false;
            }
        }
        false
    }
}

fn abrupt_end() -> CivilError {
    CivilError::value().with_message("unexpected end of input while parsing")
}

fn non_digit() -> CivilError {
    CivilError::value().with_message("expected an ascii digit")
}

fn parse_digit_pair(cursor: &mut Cursor<'_>) -> CivilResult<u8> {
    let first = cursor.next().ok_or_else(abrupt_end)?;
    let second = cursor.next().ok_or_else(abrupt_end)?;
    if !first.is_ascii_digit() || !second.is_ascii_digit() {
        return Err(non_digit());
    }
    Ok((first - b'0') * 10 + (second - b'0'))
}

fn is_ascii_sign(byte: u8) -> bool {
    byte == b'+' || byte == b'-'
}

fn is_date_time_separator(byte: u8) -> bool {
    byte == b'T' || byte == b't' || byte == b' '
}

// ==== Date ====

fn parse_date(cursor: &mut Cursor<'_>) -> CivilResult<DateRecord> {
    let year = parse_year(cursor)?;
    let has_separator = cursor.peek() == Some(b'-');
    if has_separator {
        cursor.advance();
    }
    let month = parse_digit_pair(cursor)?;
    if has_separator {
        if cursor.peek() != Some(b'-') {
            return Err(CivilError::value().with_message("inconsistent date separators"));
        }
        cursor.advance();
    }
    let day = parse_digit_pair(cursor)?;

    if !(1..=12).contains(&month) {
        return Err(CivilError::value().with_message("parsed month value not in a valid range"));
    }
    if !(1..=iso_days_in_month(year, month)).contains(&day) {
        return Err(CivilError::value().with_message("parsed day value not in a valid range"));
    }
    Ok(DateRecord { year, month, day })
}

fn parse_year(cursor: &mut Cursor<'_>) -> CivilResult<i32> {
    if cursor.peek().is_some_and(is_ascii_sign) {
        let sign: i32 = if cursor.next() == Some(b'+') { 1 } else { -1 };
        let mut year: i32 = 0;
        for _ in 0..6 {
            let digit = cursor.next().ok_or_else(abrupt_end)?;
            if !digit.is_ascii_digit() {
                return Err(non_digit());
            }
            year = year * 10 + i32::from(digit - b'0');
        }
        if sign == -1 && year == 0 {
            return Err(CivilError::value().with_message("year zero cannot be negative"));
        }
        return Ok(sign * year);
    }
    let mut year: i32 = 0;
    for _ in 0..4 {
        let digit = cursor.next().ok_or_else(abrupt_end)?;
        if !digit.is_ascii_digit() {
            return Err(non_digit());
        }
        year = year * 10 + i32::from(digit - b'0');
    }
    Ok(year)
}

// ==== Time ====

fn parse_time(cursor: &mut Cursor<'_>, segment: Segment) -> CivilResult<TimeRecord> {
    let hour = parse_digit_pair(cursor)?;
    if hour > 23 {
        return Err(CivilError::value().with_message("parsed hour value not in a valid range"));
    }

    let has_separator = cursor.peek() == Some(b':');
    let mut minute = 0;
    let mut second = 0;
    let mut leap_second = false;
    let mut nanosecond = 0;
    let mut has_minute = false;

    if has_separator {
        cursor.advance();
        minute = parse_digit_pair(cursor)?;
        has_minute = true;
    } else if cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
        minute = parse_digit_pair(cursor)?;
        has_minute = true;
    }
    if minute > 59 {
        return Err(CivilError::value().with_message("parsed minute value not in a valid range"));
    }

    let has_second = if has_minute && has_separator && cursor.peek() == Some(b':') {
        cursor.advance();
        true
    } else {
        has_minute && !has_separator && cursor.peek().is_some_and(|b| b.is_ascii_digit())
    };
    if has_second {
        second = parse_digit_pair(cursor)?;
        if second == 60 {
            // Leap second tolerance applies to the primary segment only.
            if segment == Segment::Annotation {
                return Err(CivilError::value()
                    .with_message("leap second is not permitted inside a bracketed annotation"));
            }
            second = 59;
            leap_second = true;
        } else if second > 59 {
            return Err(
                CivilError::value().with_message("parsed second value not in a valid range")
            );
        }
        nanosecond = parse_fraction(cursor)?.unwrap_or(0);
    }

    Ok(TimeRecord {
        hour,
        minute,
        second,
        nanosecond,
        leap_second,
    })
}

/// Parses an optional fractional component of up to nine digits,
/// returning it scaled to nanoseconds.
fn parse_fraction(cursor: &mut Cursor<'_>) -> CivilResult<Option<u32>> {
    if !matches!(cursor.peek(), Some(b'.') | Some(b',')) {
        return Ok(None);
    }
    cursor.advance();
    let mut value: u32 = 0;
    let mut digits = 0;
    while cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
        if digits == 9 {
            return Err(
                CivilError::value().with_message("fraction exceeds nanosecond precision")
            );
        }
        value = value * 10 + u32::from(cursor.next().ok_or_else(abrupt_end)? - b'0');
        digits += 1;
    }
    if digits == 0 {
        return Err(CivilError::value().with_message("fraction must have at least one digit"));
    }
    while digits < 9 {
        value *= 10;
        digits += 1;
    }
    Ok(Some(value))
}

// ==== UTC offset ====

fn parse_utc_offset(cursor: &mut Cursor<'_>, segment: Segment) -> CivilResult<UtcOffsetRecord> {
    let sign: i8 = if cursor.next() == Some(b'+') { 1 } else { -1 };
    let hour = parse_digit_pair(cursor)?;
    if hour > 23 {
        return Err(CivilError::value().with_message("offset hour not in a valid range"));
    }

    let has_separator = cursor.peek() == Some(b':');
    let mut minute = 0;
    let mut second = 0;
    let mut nanosecond = 0;
    let mut has_minute = false;

    if has_separator {
        cursor.advance();
        minute = parse_digit_pair(cursor)?;
        has_minute = true;
    } else if cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
        minute = parse_digit_pair(cursor)?;
        has_minute = true;
    }
    if minute > 59 {
        return Err(CivilError::value().with_message("offset minute not in a valid range"));
    }

    let has_second = if has_minute && has_separator && cursor.peek() == Some(b':') {
        cursor.advance();
        true
    } else {
        has_minute && !has_separator && cursor.peek().is_some_and(|b| b.is_ascii_digit())
    };
    if has_second {
        second = parse_digit_pair(cursor)?;
        if second == 60 {
            // The leap second asymmetry: tolerated as a time value in the
            // primary segment, never as an offset component.
            return Err(if segment == Segment::Annotation {
                CivilError::value()
                    .with_message("leap second is not permitted inside a bracketed annotation")
            } else {
                CivilError::value().with_message("offset second not in a valid range")
            });
        }
        if second > 59 {
            return Err(CivilError::value().with_message("offset second not in a valid range"));
        }
        if segment == Segment::Annotation {
            return Err(CivilError::value()
                .with_message("sub-minute precision is not allowed in a bracketed offset"));
        }
        nanosecond = parse_fraction(cursor)?.unwrap_or(0);
    }

    Ok(UtcOffsetRecord {
        sign,
        hour,
        minute,
        second,
        nanosecond,
    })
}

// ==== Annotations ====

fn parse_annotations(cursor: &mut Cursor<'_>, parsed: &mut ParsedDateTime) -> CivilResult<()> {
    let mut calendar_critical = false;
    while cursor.peek() == Some(b'[') {
        cursor.advance();
        let critical = cursor.peek() == Some(b'!');
        if critical {
            cursor.advance();
        }

        if cursor.contains_before(b'=', b']') {
            let (key, value) = parse_key_value(cursor)?;
            if key == "u-ca" {
                if parsed.calendar.is_none() {
                    parsed.calendar = Some(value);
                    calendar_critical = critical;
                } else if critical || calendar_critical {
                    return Err(CivilError::value()
                        .with_message("duplicate critical calendar annotation"));
                }
            } else if critical {
                return Err(
                    CivilError::value().with_message("unrecognized critical annotation key")
                );
            }
        } else {
            if parsed.tz.is_some() {
                return Err(
                    CivilError::value().with_message("multiple time zone annotations provided")
                );
            }
            let zone = parse_time_zone_annotation(cursor)?;
            parsed.tz = Some(TimeZoneAnnotation { critical, zone });
        }

        if cursor.next() != Some(b']') {
            return Err(CivilError::value().with_message("unclosed annotation bracket"));
        }
    }
    Ok(())
}

fn parse_key_value(cursor: &mut Cursor<'_>) -> CivilResult<(String, String)> {
    let mut key = String::new();
    while cursor
        .peek()
        .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        key.push(cursor.next().ok_or_else(abrupt_end)? as char);
    }
    if key.is_empty() || cursor.next() != Some(b'=') {
        return Err(CivilError::value().with_message("invalid annotation key"));
    }
    let mut value = String::new();
    while cursor
        .peek()
        .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        value.push(cursor.next().ok_or_else(abrupt_end)? as char);
    }
    if value.is_empty() {
        return Err(CivilError::value().with_message("invalid annotation value"));
    }
    Ok((key, value))
}

fn parse_time_zone_annotation(cursor: &mut Cursor<'_>) -> CivilResult<TimeZoneRecord> {
    if cursor.peek().is_some_and(is_ascii_sign) {
        let offset = parse_utc_offset(cursor, Segment::Annotation)?;
        return Ok(TimeZoneRecord::Offset(offset));
    }
    let mut name = String::new();
    loop {
        if !cursor.peek().is_some_and(|b| is_tz_leading_char(b as char)) {
            return Err(CivilError::value().with_message("invalid time zone annotation"));
        }
        name.push(cursor.next().ok_or_else(abrupt_end)? as char);
        while cursor.peek().is_some_and(|b| is_tz_char(b as char)) {
            name.push(cursor.next().ok_or_else(abrupt_end)? as char);
        }
        if cursor.peek() == Some(b'/') {
            cursor.advance();
            name.push('/');
            continue;
        }
        break;
    }
    Ok(TimeZoneRecord::Named(name))
}

// ==== Entry points ====

pub(crate) fn parse_annotated_date_time(source: &[u8]) -> CivilResult<ParsedDateTime> {
    let mut cursor = Cursor::new(source);
    let date = parse_date(&mut cursor)?;

    let mut parsed = ParsedDateTime {
        date: Some(date),
        time: None,
        offset: None,
        tz: None,
        calendar: None,
    };

    if cursor.peek().is_some_and(is_date_time_separator) {
        cursor.advance();
        parsed.time = Some(parse_time(&mut cursor, Segment::Primary)?);

        match cursor.peek() {
            Some(b'Z') | Some(b'z') => {
                cursor.advance();
                parsed.offset = Some(UtcOffsetOrZ::Z);
            }
            Some(byte) if is_ascii_sign(byte) => {
                let offset = parse_utc_offset(&mut cursor, Segment::Primary)?;
                parsed.offset = Some(UtcOffsetOrZ::Offset(offset));
            }
            _ => {}
        }
    }

    parse_annotations(&mut cursor, &mut parsed)?;

    if !cursor.is_end() {
        return Err(CivilError::value().with_message("unexpected character after parsing"));
    }
    Ok(parsed)
}

pub(crate) fn parse_annotated_month_day(source: &[u8]) -> CivilResult<ParsedMonthDay> {
    if source.starts_with(b"--") {
        let mut cursor = Cursor::new(source);
        cursor.advance();
        cursor.advance();
        let month = parse_digit_pair(&mut cursor)?;
        if cursor.peek() == Some(b'-') {
            cursor.advance();
        }
        let day = parse_digit_pair(&mut cursor)?;

        let mut parsed = ParsedDateTime {
            date: None,
            time: None,
            offset: None,
            tz: None,
            calendar: None,
        };
        parse_annotations(&mut cursor, &mut parsed)?;
        if !cursor.is_end() {
            return Err(CivilError::value().with_message("unexpected character after parsing"));
        }

        if !(1..=12).contains(&month) {
            return Err(
                CivilError::value().with_message("parsed month value not in a valid range")
            );
        }
        // 1972 is the first leap year in the Unix epoch, covering all
        // valid month/day combinations.
        if !(1..=iso_days_in_month(1972, month)).contains(&day) {
            return Err(CivilError::value().with_message("parsed day value not in a valid range"));
        }
        return Ok(ParsedMonthDay {
            month,
            day,
            calendar: parsed.calendar,
        });
    }

    let parsed = parse_annotated_date_time(source)?;
    let date = parsed
        .date
        .ok_or_else(|| CivilError::value().with_message("month-day string requires a date"))?;
    Ok(ParsedMonthDay {
        month: date.month,
        day: date.day,
        calendar: parsed.calendar,
    })
}

// ==== Duration grammar ====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FractionPosition {
    Hour,
    Minute,
    Second,
}

fn parse_duration_component(cursor: &mut Cursor<'_>) -> CivilResult<(i64, Option<u32>)> {
    let mut value: i64 = 0;
    let mut digits = 0;
    while cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
        if digits == 16 {
            return Err(CivilError::value().with_message("duration component too large"));
        }
        value = value * 10 + i64::from(cursor.next().ok_or_else(abrupt_end)? - b'0');
        digits += 1;
    }
    if digits == 0 {
        return Err(non_digit());
    }
    let fraction = parse_fraction(cursor)?;
    Ok((value, fraction))
}

pub(crate) fn parse_duration(source: &[u8]) -> CivilResult<DurationParseRecord> {
    let mut cursor = Cursor::new(source);

    let sign: i64 = match cursor.peek() {
        Some(b'+') => {
            cursor.advance();
            1
        }
        Some(b'-') => {
            cursor.advance();
            -1
        }
        _ => 1,
    };

    if !matches!(cursor.next(), Some(b'P') | Some(b'p')) {
        return Err(CivilError::value().with_message("duration must begin with a P designator"));
    }

    let mut record = DurationParseRecord::default();
    let mut any_component = false;

    // Date components, enforced in Y M W D order.
    let mut next_designators: &[u8] = b"YMWD";
    while cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
        let (value, fraction) = parse_duration_component(&mut cursor)?;
        if fraction.is_some() {
            return Err(
                CivilError::value().with_message("date components cannot carry a fraction")
            );
        }
        let designator = cursor
            .next()
            .ok_or_else(abrupt_end)?
            .to_ascii_uppercase();
        let index = next_designators
            .iter()
            .position(|d| *d == designator)
            .ok_or_else(|| {
                CivilError::value().with_message("unexpected duration date designator")
            })?;
        match designator {
            b'Y' => record.years = value,
            b'M' => record.months = value,
            b'W' => record.weeks = value,
            b'D' => record.days = value,
            _ => return Err(CivilError::value().with_message("invalid duration designator")),
        }
        next_designators = &next_designators[index + 1..];
        any_component = true;
    }

    if matches!(cursor.peek(), Some(b'T') | Some(b't')) {
        cursor.advance();
        let mut fraction_ns: u64 = 0;
        let mut fraction_position = None;
        let mut next_designators: &[u8] = b"HMS";
        while cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
            if fraction_position.is_some() {
                return Err(CivilError::value()
                    .with_message("fraction is only allowed on the smallest time component"));
            }
            let (value, fraction) = parse_duration_component(&mut cursor)?;
            let designator = cursor
                .next()
                .ok_or_else(abrupt_end)?
                .to_ascii_uppercase();
            let index = next_designators
                .iter()
                .position(|d| *d == designator)
                .ok_or_else(|| {
                    CivilError::value().with_message("unexpected duration time designator")
                })?;
            match designator {
                b'H' => {
                    record.hours = value;
                    if let Some(f) = fraction {
                        fraction_ns = u64::from(f) * 3600;
                        fraction_position = Some(FractionPosition::Hour);
                    }
                }
                b'M' => {
                    record.minutes = value;
                    if let Some(f) = fraction {
                        fraction_ns = u64::from(f) * 60;
                        fraction_position = Some(FractionPosition::Minute);
                    }
                }
                b'S' => {
                    record.seconds = value;
                    if let Some(f) = fraction {
                        fraction_ns = u64::from(f);
                        fraction_position = Some(FractionPosition::Second);
                    }
                }
                _ => return Err(CivilError::value().with_message("invalid duration designator")),
            }
            next_designators = &next_designators[index + 1..];
            any_component = true;
        }

        // Cascade a fraction into the smaller components.
        match fraction_position {
            Some(FractionPosition::Hour) => {
                record.minutes = fraction_ns as i64 / 60_000_000_000;
                let rem = fraction_ns % 60_000_000_000;
                record.seconds = rem as i64 / 1_000_000_000;
                let rem = rem % 1_000_000_000;
                record.milliseconds = rem as i64 / 1_000_000;
                let rem = rem % 1_000_000;
                record.microseconds = rem as i64 / 1_000;
                record.nanoseconds = rem as i64 % 1_000;
            }
            Some(FractionPosition::Minute) => {
                record.seconds = fraction_ns as i64 / 1_000_000_000;
                let rem = fraction_ns % 1_000_000_000;
                record.milliseconds = rem as i64 / 1_000_000;
                let rem = rem % 1_000_000;
                record.microseconds = rem as i64 / 1_000;
                record.nanoseconds = rem as i64 % 1_000;
            }
            Some(FractionPosition::Second) => {
                record.milliseconds = fraction_ns as i64 / 1_000_000;
                let rem = fraction_ns % 1_000_000;
                record.microseconds = rem as i64 / 1_000;
                record.nanoseconds = rem as i64 % 1_000;
            }
            None => {}
        }
    }

    if !cursor.is_end() {
        return Err(CivilError::value().with_message("unexpected character after parsing"));
    }
    if !any_component {
        return Err(
            CivilError::value().with_message("duration requires at least one component")
        );
    }

    record.years *= sign;
    record.months *= sign;
    record.weeks *= sign;
    record.days *= sign;
    record.hours *= sign;
    record.minutes *= sign;
    record.seconds *= sign;
    record.milliseconds *= sign;
    record.microseconds *= sign;
    record.nanoseconds *= sign;
    Ok(record)
}
