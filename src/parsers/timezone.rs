//! Time zone identifier parsing.

use core::{iter::Peekable, str::Chars};

use crate::{CivilError, CivilResult};

#[inline]
pub(crate) fn parse_offset_identifier(source: &str) -> CivilResult<i16> {
    let mut cursor = source.chars().peekable();
    let minutes = parse_offset(&mut cursor)?;
    if cursor.peek().is_some() {
        return Err(
            CivilError::value().with_message("unexpected character in offset identifier")
        );
    }
    Ok(minutes)
}

/// Parses a `±HH[:MM]` offset into signed minutes.
pub(crate) fn parse_offset(chars: &mut Peekable<Chars<'_>>) -> CivilResult<i16> {
    let sign = chars.next().map_or(1, |c| if c == '+' { 1 } else { -1 });
    let hours = parse_digit_pair(chars)?;
    if hours > 23 {
        return Err(CivilError::value().with_message("offset hour not in a valid range"));
    }

    let sep = chars.peek().is_some_and(|ch| *ch == ':');
    if sep {
        let _ = chars.next();
    }

    let digit_peek = chars.peek().map(|ch| ch.is_ascii_digit());
    let minutes = match digit_peek {
        Some(true) => parse_digit_pair(chars)?,
        Some(false) => return Err(non_ascii_digit()),
        None if sep => return Err(abrupt_end()),
        None => 0,
    };
    if minutes > 59 {
        return Err(CivilError::value().with_message("offset minute not in a valid range"));
    }

    Ok((hours * 60 + minutes) * sign)
}

fn parse_digit_pair(chars: &mut Peekable<Chars<'_>>) -> CivilResult<i16> {
    let mut pair = 0;
    for _ in 0..2 {
        let valid = chars
            .peek()
            .map_or(Err(abrupt_end()), |ch| Ok(ch.is_ascii_digit()))?;
        if !valid {
            return Err(non_ascii_digit());
        }
        let digit = chars.next().ok_or_else(abrupt_end)?;
        pair = pair * 10 + digit.to_digit(10).unwrap_or(0) as i16;
    }
    Ok(pair)
}

/// Validates that the source is a well-formed IANA-style identifier of
/// one or more `/`-separated components.
pub(crate) fn is_valid_iana_identifier(source: &str) -> bool {
    let mut chars = source.chars().peekable();
    parse_iana_component(&mut chars)
}

fn parse_iana_component(chars: &mut Peekable<Chars<'_>>) -> bool {
    // Confirm leading Tz char
    if !chars.peek().copied().is_some_and(is_tz_leading_char) {
        return false;
    }
    chars.next();

    // Move and check that chars are an expected tz char
    while chars.peek().copied().is_some_and(is_tz_char) {
        chars.next();
    }

    // Check for sub component and parse
    if chars.peek() == Some(&'/') {
        chars.next();
        return parse_iana_component(chars);
    }

    // Confirm full source text has been parsed.
    chars.peek().is_none()
}

fn abrupt_end() -> CivilError {
    CivilError::value().with_message("abrupt end while parsing offset string")
}

fn non_ascii_digit() -> CivilError {
    CivilError::value().with_message("non ascii digit found while parsing offset string")
}

pub(crate) fn is_tz_leading_char(ch: char) -> bool {
    ch.is_alphabetic() || ch == '.' || ch == '_'
}

pub(crate) fn is_tz_char(ch: char) -> bool {
    is_tz_leading_char(ch) || ch.is_ascii_digit() || ch == '+' || ch == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_identifier_parsing() {
        assert_eq!(parse_offset_identifier("+05:30").unwrap(), 330);
        assert_eq!(parse_offset_identifier("-0800").unwrap(), -480);
        assert_eq!(parse_offset_identifier("+14").unwrap(), 840);
        assert!(parse_offset_identifier("+24:00").is_err());
        assert!(parse_offset_identifier("+05:").is_err());
        assert!(parse_offset_identifier("+05:30:00").is_err());
    }

    #[test]
    fn iana_identifier_shapes() {
        assert!(is_valid_iana_identifier("UTC"));
        assert!(is_valid_iana_identifier("America/New_York"));
        assert!(is_valid_iana_identifier("America/Argentina/Buenos_Aires"));
        assert!(is_valid_iana_identifier("Etc/GMT+8"));
        assert!(!is_valid_iana_identifier("1Foo"));
        assert!(!is_valid_iana_identifier("America/"));
        assert!(!is_valid_iana_identifier(""));
    }
}
