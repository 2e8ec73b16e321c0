//! This module implements parsing for ISO 8601 grammars.
//!
//! The submodules provide the byte-cursor grammar itself; this module
//! owns the parse records the grammar produces, the public entry
//! points, and the `Writeable` formatters used to render values back
//! to their string forms.

use alloc::string::String;
use core::fmt;

use writeable::{impl_display_with_writeable, Writeable};

use crate::CivilResult;

pub(crate) mod grammar;
pub(crate) mod timezone;

// ==== Parse records ====

/// A parsed date segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRecord {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

/// A parsed time segment.
///
/// A leap second in the source is normalized away before the record is
/// produced: `second` is always in the range 0-59 and `leap_second`
/// marks that the raw input carried a `60`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRecord {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanosecond: u32,
    pub leap_second: bool,
}

/// A parsed UTC offset segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffsetRecord {
    pub sign: i8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanosecond: u32,
}

impl UtcOffsetRecord {
    /// The offset in signed minutes, truncating sub-minute components.
    #[must_use]
    pub fn minutes(&self) -> i16 {
        (i16::from(self.hour) * 60 + i16::from(self.minute)) * i16::from(self.sign)
    }
}

/// A parsed UTC offset or the `Z` designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtcOffsetOrZ {
    Z,
    Offset(UtcOffsetRecord),
}

/// A parsed bracketed time zone annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZoneAnnotation {
    pub critical: bool,
    pub zone: TimeZoneRecord,
}

/// The body of a time zone annotation: a named identifier or an offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeZoneRecord {
    Named(String),
    Offset(UtcOffsetRecord),
}

/// The record of a parsed, annotated date-time string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDateTime {
    pub date: Option<DateRecord>,
    pub time: Option<TimeRecord>,
    pub offset: Option<UtcOffsetOrZ>,
    pub tz: Option<TimeZoneAnnotation>,
    pub calendar: Option<String>,
}

impl ParsedDateTime {
    /// The annotated calendar identifier, defaulting to `iso8601`.
    #[must_use]
    pub fn calendar_identifier(&self) -> &str {
        self.calendar.as_deref().unwrap_or("iso8601")
    }
}

/// The record of a parsed month-day string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMonthDay {
    pub month: u8,
    pub day: u8,
    pub calendar: Option<String>,
}

/// Raw signed duration components produced by the duration grammar.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DurationParseRecord {
    pub(crate) years: i64,
    pub(crate) months: i64,
    pub(crate) weeks: i64,
    pub(crate) days: i64,
    pub(crate) hours: i64,
    pub(crate) minutes: i64,
    pub(crate) seconds: i64,
    pub(crate) milliseconds: i64,
    pub(crate) microseconds: i64,
    pub(crate) nanoseconds: i64,
}

// ==== Entry points ====

/// Parses an annotated ISO 8601 date or date-time string.
pub fn parse_date_time(source: &[u8]) -> CivilResult<ParsedDateTime> {
    grammar::parse_annotated_date_time(source)
}

/// Parses a month-day string, either the `--MM-DD` form or a full
/// date-time string.
pub fn parse_month_day(source: &[u8]) -> CivilResult<ParsedMonthDay> {
    grammar::parse_annotated_month_day(source)
}

pub(crate) fn parse_duration(source: &[u8]) -> CivilResult<DurationParseRecord> {
    grammar::parse_duration(source)
}

/// Extracts a calendar identifier from any of the accepted annotated
/// string formats, defaulting to `iso8601` when a string parses but
/// carries no calendar annotation.
pub(crate) fn parse_allowed_calendar_formats(s: &str) -> Option<String> {
    if let Ok(record) = parse_date_time(s.as_bytes()) {
        return Some(String::from(record.calendar_identifier()));
    }
    if let Ok(record) = parse_month_day(s.as_bytes()) {
        return Some(record.calendar.unwrap_or_else(|| String::from("iso8601")));
    }
    None
}

// ==== Formatting ====

fn write_padded_u8<W: fmt::Write + ?Sized>(value: u8, sink: &mut W) -> fmt::Result {
    write!(sink, "{value:02}")
}

fn write_year<W: fmt::Write + ?Sized>(year: i32, sink: &mut W) -> fmt::Result {
    if (0..=9999).contains(&year) {
        return write!(sink, "{year:04}");
    }
    let sign = if year < 0 { '-' } else { '+' };
    write!(sink, "{sign}{:06}", year.unsigned_abs())
}

/// Writes a nine-digit nanosecond fraction with trailing zeros trimmed.
fn write_fraction<W: fmt::Write + ?Sized>(nanosecond: u32, sink: &mut W) -> fmt::Result {
    if nanosecond == 0 {
        return Ok(());
    }
    sink.write_char('.')?;
    let mut divisor = 100_000_000;
    let mut remaining = nanosecond;
    while remaining > 0 {
        write!(sink, "{}", remaining / divisor)?;
        remaining %= divisor;
        divisor /= 10;
    }
    Ok(())
}

/// A formattable ISO date: year, month, day.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormattableDate(pub(crate) i32, pub(crate) u8, pub(crate) u8);

impl Writeable for FormattableDate {
    fn write_to<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        write_year(self.0, sink)?;
        sink.write_char('-')?;
        write_padded_u8(self.1, sink)?;
        sink.write_char('-')?;
        write_padded_u8(self.2, sink)
    }
}

impl_display_with_writeable!(FormattableDate);

/// A formattable wall-clock time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormattableTime {
    pub(crate) hour: u8,
    pub(crate) minute: u8,
    pub(crate) second: u8,
    pub(crate) nanosecond: u32,
}

impl Writeable for FormattableTime {
    fn write_to<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        write_padded_u8(self.hour, sink)?;
        sink.write_char(':')?;
        write_padded_u8(self.minute, sink)?;
        sink.write_char(':')?;
        write_padded_u8(self.second, sink)?;
        write_fraction(self.nanosecond, sink)
    }
}

impl_display_with_writeable!(FormattableTime);

/// A formattable fixed offset in signed minutes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormattableOffset(pub(crate) i16);

impl Writeable for FormattableOffset {
    fn write_to<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let minutes = self.0.unsigned_abs();
        sink.write_char(sign)?;
        write_padded_u8((minutes / 60) as u8, sink)?;
        sink.write_char(':')?;
        write_padded_u8((minutes % 60) as u8, sink)
    }
}

impl_display_with_writeable!(FormattableOffset);

/// A formattable calendar annotation suffix. Writes nothing for the
/// built-in ISO calendar.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormattableCalendar<'a>(pub(crate) &'a str);

impl Writeable for FormattableCalendar<'_> {
    fn write_to<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        if self.0 == "iso8601" {
            return Ok(());
        }
        write!(sink, "[u-ca={}]", self.0)
    }
}

impl_display_with_writeable!(FormattableCalendar<'_>);

/// A formattable date-time with calendar suffix.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormattableDateTime<'a> {
    pub(crate) date: FormattableDate,
    pub(crate) time: FormattableTime,
    pub(crate) calendar: FormattableCalendar<'a>,
}

impl Writeable for FormattableDateTime<'_> {
    fn write_to<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        self.date.write_to(sink)?;
        sink.write_char('T')?;
        self.time.write_to(sink)?;
        self.calendar.write_to(sink)
    }
}

impl_display_with_writeable!(FormattableDateTime<'_>);

/// A formattable month-day. The ISO form is bare `MM-DD`; other
/// calendars render the full reference date with an annotation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormattableMonthDay<'a> {
    pub(crate) date: FormattableDate,
    pub(crate) calendar: FormattableCalendar<'a>,
}

impl Writeable for FormattableMonthDay<'_> {
    fn write_to<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        if self.calendar.0 == "iso8601" {
            write_padded_u8(self.date.1, sink)?;
            sink.write_char('-')?;
            return write_padded_u8(self.date.2, sink);
        }
        self.date.write_to(sink)?;
        self.calendar.write_to(sink)
    }
}

impl_display_with_writeable!(FormattableMonthDay<'_>);

/// A formattable duration over raw signed components.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormattableDuration(pub(crate) DurationParseRecord);

impl Writeable for FormattableDuration {
    fn write_to<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        let record = &self.0;
        let negative = [
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
        ]
        .iter()
        .any(|v| *v < 0);
        if negative {
            sink.write_char('-')?;
        }
        sink.write_char('P')?;

        if record.years != 0 {
            write!(sink, "{}Y", record.years.unsigned_abs())?;
        }
        if record.months != 0 {
            write!(sink, "{}M", record.months.unsigned_abs())?;
        }
        if record.weeks != 0 {
            write!(sink, "{}W", record.weeks.unsigned_abs())?;
        }
        if record.days != 0 {
            write!(sink, "{}D", record.days.unsigned_abs())?;
        }

        let second_fraction = record.milliseconds.unsigned_abs() * 1_000_000
            + record.microseconds.unsigned_abs() * 1_000
            + record.nanoseconds.unsigned_abs();
        let has_time = record.hours != 0
            || record.minutes != 0
            || record.seconds != 0
            || second_fraction != 0;
        let all_zero = !has_time
            && record.years == 0
            && record.months == 0
            && record.weeks == 0
            && record.days == 0;

        if has_time || all_zero {
            sink.write_char('T')?;
        }
        if record.hours != 0 {
            write!(sink, "{}H", record.hours.unsigned_abs())?;
        }
        if record.minutes != 0 {
            write!(sink, "{}M", record.minutes.unsigned_abs())?;
        }
        if record.seconds != 0 || second_fraction != 0 || all_zero {
            // The sub-second components fold into one fraction, carrying
            // whole seconds into the seconds position.
            let seconds = record.seconds.unsigned_abs() + second_fraction / 1_000_000_000;
            write!(sink, "{seconds}")?;
            write_fraction((second_fraction % 1_000_000_000) as u32, sink)?;
            sink.write_char('S')?;
        }
        Ok(())
    }
}

impl_display_with_writeable!(FormattableDuration);
