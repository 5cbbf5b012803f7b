//! Shape checks for the individual values printed on the card.
//!
//! Every function here is a total predicate or parser: a token that does not
//! fit simply yields `false`/`None`, since most OCR tokens are noise.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{Gender, CARD_DATE_FORMAT};

pub const IDENTITY_NO_LEN: usize = 11;
pub const DOCUMENT_NO_LEN: usize = 9;

const GENDER_MARKS: [&str; 6] = ["e/m", "k/f", "e", "m", "k", "f"];

lazy_static! {
    // Day and month may lose their leading zero in OCR output, the year never does.
    static ref CARD_DATE: Regex = Regex::new(r"^[0-9]{1,2}\.[0-9]{1,2}\.[0-9]{4}$").unwrap();
}

/// Result of reading a gender box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderMark {
    Known(Gender),
    /// A lone `M` or `F`: recognised as the gender box but not mapped to a value.
    Unresolved,
}

/// Returns the trimmed token if it is an 11-digit national identity number.
pub fn identity_no(token: &str) -> Option<&str> {
    let value = token.trim();
    (value.len() == IDENTITY_NO_LEN && value.bytes().all(|b| b.is_ascii_digit())).then_some(value)
}

/// Returns the trimmed token if it has the document-number layout:
/// letter, two digits, letter, then digits up to the last character, which
/// is left unchecked (e.g. `A12B34567`).
pub fn document_no(token: &str) -> Option<&str> {
    let value = token.trim();
    let chars: Vec<char> = value.chars().collect();
    if chars.len() != DOCUMENT_NO_LEN {
        return None;
    }

    let valid = chars[0].is_alphabetic()
        && chars[1..3].iter().all(|c| c.is_numeric())
        && chars[3].is_alphabetic()
        && chars[4..chars.len() - 1].iter().all(|c| c.is_numeric());

    valid.then_some(value)
}

/// Parses a `DD.MM.YYYY` date. Malformed text and impossible calendar dates
/// both give `None`.
pub fn card_date(token: &str) -> Option<NaiveDate> {
    let value = token.trim();
    if !CARD_DATE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, CARD_DATE_FORMAT).ok()
}

pub fn gender_mark(token: &str) -> Option<GenderMark> {
    let normalized: String = token
        .trim()
        .chars()
        .filter(|c| *c != ' ')
        .collect::<String>()
        .to_lowercase();

    if !GENDER_MARKS.contains(&normalized.as_str()) {
        return None;
    }

    let mark = if normalized.contains('e') {
        GenderMark::Known(Gender::Male)
    } else if normalized.contains('k') {
        GenderMark::Known(Gender::Female)
    } else {
        GenderMark::Unresolved
    };
    Some(mark)
}

/// Parental names on the back are printed as a single upper-case word.
pub fn upper_case_word(token: &str) -> Option<&str> {
    let value = token.trim();
    let valid = !value.is_empty()
        && value.chars().all(char::is_alphabetic)
        && value.chars().any(char::is_uppercase)
        && !value.chars().any(char::is_lowercase);

    valid.then_some(value)
}
