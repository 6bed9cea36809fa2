//! # VE.Direct Line Codec
//!
//! Stateless helpers that take one decoded text line (`TAG<TAB>VALUE`, CRLF
//! already stripped) apart and convert the value token. The `nom` crate does
//! the splitting; conversions never panic and report failure as `None`.
//!
//! Scaling to physical units is left to the caller (see
//! [`FieldRegistry::get_scaled`](crate::vedirect::registry::FieldRegistry::get_scaled)).
//!
//! ```rust
//! use vedirect_bridge::vedirect::codec::{parse_int, parse_onoff, parse_tagged_value};
//!
//! assert_eq!(parse_tagged_value("V\t12488", "V"), Some("12488"));
//! assert_eq!(parse_tagged_value("VS\t12909", "V"), None);
//! assert_eq!(parse_int("0xA381"), Some(0xA381));
//! assert_eq!(parse_int("---"), None);
//! assert!(parse_onoff("ON"));
//! ```

use crate::constants::{ON_TOKEN, UNDEFINED_TOKEN, VEDIRECT_TAB};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{char, digit1, hex_digit1},
    combinator::{map_res, opt},
    sequence::separated_pair,
    IResult,
};

/// Parses `TAG<TAB>VALUE` into its two tokens.
///
/// The value ends at the next tab, if any; anything after it is ignored. Both
/// tokens must be non-empty.
pub fn parse_line(input: &str) -> IResult<&str, (&str, &str)> {
    const TAB: char = VEDIRECT_TAB as char;
    separated_pair(take_till1(|c: char| c == TAB), char(TAB), take_till1(|c: char| c == TAB))(input)
}

/// Splits a line into `(tag, value)`, or `None` if it is not a tagged line.
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    parse_line(line).ok().map(|(_, pair)| pair)
}

/// Returns the raw value token of `line` if its tag is exactly `tag`.
pub fn parse_tagged_value<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    match split_line(line) {
        Some((found, value)) if found == tag => Some(value),
        _ => None,
    }
}

/// Decimal or `0x`-prefixed hexadecimal, with an optional sign.
fn signed_integer(input: &str) -> IResult<&str, i64> {
    let (input, sign) = opt(alt((char('-'), char('+'))))(input)?;
    let (input, hex_prefix) = opt(alt((tag("0x"), tag("0X"))))(input)?;
    let (rest, magnitude) = if hex_prefix.is_some() {
        map_res(hex_digit1, |d: &str| i64::from_str_radix(d, 16))(input)?
    } else {
        map_res(digit1, |d: &str| d.parse::<i64>())(input)?
    };

    let value = if sign == Some('-') { -magnitude } else { magnitude };
    Ok((rest, value))
}

/// Converts a numeric token.
///
/// `"---"` is the wire format's "undefined" marker and yields `None`, as does
/// any token that is not a complete integer.
pub fn parse_int(token: &str) -> Option<i64> {
    let token = token.trim();
    if token == UNDEFINED_TOKEN {
        return None;
    }
    match signed_integer(token) {
        Ok((rest, value)) if rest.is_empty() => Some(value),
        _ => None,
    }
}

/// `true` iff the token is exactly `"ON"`; everything else reads as `false`.
pub fn parse_onoff(token: &str) -> bool {
    token.trim() == ON_TOKEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line() {
        assert_eq!(split_line("SOC\t196"), Some(("SOC", "196")));
        assert_eq!(split_line("BMV\t712 Smart"), Some(("BMV", "712 Smart")));
        assert_eq!(split_line("no tab here"), None);
        assert_eq!(split_line("\t12"), None);
        assert_eq!(split_line("V\t"), None);
    }

    #[test]
    fn test_only_first_pair_is_consulted() {
        assert_eq!(parse_tagged_value("V\t1\t2", "V"), Some("1"));
        assert_eq!(parse_tagged_value("X\tV\t2", "V"), None);
    }

    #[test]
    fn test_tag_must_match_exactly() {
        assert_eq!(parse_tagged_value("VS\t12909", "V"), None);
        assert_eq!(parse_tagged_value("V\t12909", "VS"), None);
        assert_eq!(parse_tagged_value("v\t12909", "V"), None);
    }

    #[test]
    fn test_parse_int_forms() {
        assert_eq!(parse_int("12488"), Some(12488));
        assert_eq!(parse_int("-220375"), Some(-220375));
        assert_eq!(parse_int("+5"), Some(5));
        assert_eq!(parse_int("0xA381"), Some(0xA381));
        assert_eq!(parse_int("0X0203"), Some(0x0203));
        assert_eq!(parse_int("0413"), Some(413));
        assert_eq!(parse_int("-1"), Some(-1));
    }

    #[test]
    fn test_parse_int_rejects() {
        assert_eq!(parse_int("---"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("12a"), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("OFF"), None);
        assert_eq!(parse_int("99999999999999999999"), None);
    }

    #[test]
    fn test_parse_onoff() {
        assert!(parse_onoff("ON"));
        assert!(!parse_onoff("OFF"));
        assert!(!parse_onoff("GARBAGE"));
        assert!(!parse_onoff("on"));
    }
}
