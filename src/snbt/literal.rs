//! Unquoted SNBT token grammars.
//!
//! An unquoted token is classified by trying each literal grammar in a fixed
//! precedence order: float suffix, byte, long, short, bare int, double,
//! boolean, and finally plain string. Integer literals reject leading zeros;
//! doubles accept a `d` suffix, a decimal point, or an exponent.

use nom::branch::alt;
use nom::character::complete::{char, digit0, digit1, one_of};
use nom::combinator::{all_consuming, opt, recognize};
use nom::sequence::{pair, terminated, tuple};
use nom::IResult;

use crate::Tag;

/// `[-+]?(0|[1-9][0-9]*)`
fn integer(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(pair(one_of("123456789"), digit0)),
            recognize(char('0')),
        )),
    ))(input)
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

/// Digits with an optional fraction, or a bare fraction, with an optional
/// exponent. Covers `123`, `123.`, `123.45`, `.5`, `1e5`, `1.2e-3`.
fn decimal(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(exponent),
    )))(input)
}

fn suffixed<'a>(
    body: fn(&'a str) -> IResult<&'a str, &'a str>,
    suffixes: &'static str,
    input: &'a str,
) -> bool {
    all_consuming(terminated(body, one_of(suffixes)))(input).is_ok()
}

pub(crate) fn matches_byte(token: &str) -> bool {
    suffixed(integer, "bB", token)
}

pub(crate) fn matches_short(token: &str) -> bool {
    suffixed(integer, "sS", token)
}

pub(crate) fn matches_int(token: &str) -> bool {
    all_consuming(integer)(token).is_ok()
}

pub(crate) fn matches_long(token: &str) -> bool {
    suffixed(integer, "lL", token)
}

pub(crate) fn matches_float(token: &str) -> bool {
    suffixed(decimal, "fF", token)
}

pub(crate) fn matches_double(token: &str) -> bool {
    all_consuming(terminated(decimal, opt(one_of("dD"))))(token).is_ok()
}

pub(crate) fn parse_bool(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("true") {
        Some(true)
    } else if token.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Strip a trailing type-suffix letter, leaving what the host numeric parser
/// accepts.
pub(crate) fn strip_suffix(token: &str) -> &str {
    token
        .strip_suffix(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(token)
}

/// Classify an unquoted token. Empty tokens have no type.
pub(crate) fn classify(token: &str) -> Option<Tag> {
    if token.is_empty() {
        None
    } else if matches_float(token) {
        Some(Tag::Float)
    } else if matches_byte(token) {
        Some(Tag::Byte)
    } else if matches_long(token) {
        Some(Tag::Long)
    } else if matches_short(token) {
        Some(Tag::Short)
    } else if matches_int(token) {
        Some(Tag::Int)
    } else if matches_double(token) {
        Some(Tag::Double)
    } else if parse_bool(token).is_some() {
        Some(Tag::Byte)
    } else {
        Some(Tag::String)
    }
}
