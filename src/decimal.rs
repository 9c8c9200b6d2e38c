//! Parsing of the decimal literals used in PHC parameter values.
//!
//! PHC requires decimals to be written in their minimal form: `0`, `-[1-9][0-9]*` or
//! `[1-9][0-9]*`. Leading zeros, a `+` sign and `-0` all have a shorter spelling and are
//! therefore rejected.

use crate::error::DecimalError;

use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

/// Parses a signed PHC decimal (`0 | -[1-9][0-9]* | [1-9][0-9]*`).
pub fn parse_decimal(input: &str) -> Result<i64, DecimalError> {
    parse_integer(input, true)
}

/// Parses a positive PHC decimal (`0 | [1-9][0-9]*`).
pub fn parse_positive_decimal(input: &str) -> Result<u64, DecimalError> {
    if input.starts_with('-') {
        return Err(DecimalError::Malformed(input.to_owned()));
    }

    parse_integer(input, true)
}

/// Parses `input` into the integer type `T`, whose width and signedness bound the accepted
/// range.
///
/// With `strict` set the input must be the minimal decimal encoding of the number. Without
/// it, anything [`str::parse`] accepts for `T` is allowed (e.g. `007` or `+7`).
pub fn parse_integer<T>(input: &str, strict: bool) -> Result<T, DecimalError>
where
    T: FromStr<Err = ParseIntError>,
{
    if strict {
        check_minimal(input)?;
    }

    input.parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::Empty => DecimalError::Empty,
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            DecimalError::OutOfRange(input.to_owned())
        }
        _ => DecimalError::Malformed(input.to_owned()),
    })
}

fn check_minimal(input: &str) -> Result<(), DecimalError> {
    if input.is_empty() {
        return Err(DecimalError::Empty);
    }

    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecimalError::Malformed(input.to_owned()));
    }

    // "0" is the only numeral allowed to start with a zero
    if digits.starts_with('0') && (negative || digits.len() > 1) {
        return Err(DecimalError::NonMinimal(input.to_owned()));
    }

    Ok(())
}
