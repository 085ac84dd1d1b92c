//! Shot and damage strings: a bare integer or `NdM` dice notation.

use std::sync::OnceLock;

use regex::Regex;

use crate::collection::PmfCollection;
use crate::error::ParseError;
use crate::numbers::within_limit;
use crate::pmf::Pmf;

fn notation_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+)?d(\d+)$").ok())
        .as_ref()
}

/// Parse `"3"`, `"d6"` or `"2D3"` into one distribution per die.
///
/// A bare integer becomes a single point mass. Counts, faces and fixed values
/// are capped at [`crate::numbers::INPUT_LIMIT`].
///
/// # Errors
///
/// Returns `ParseError::InvalidDiceNotation` when the input is neither form
/// or a number is out of range.
pub fn parse_dice(input: &str) -> Result<PmfCollection, ParseError> {
    let trimmed = input.trim();
    let invalid = || ParseError::InvalidDiceNotation {
        input: input.to_string(),
    };
    if trimmed.bytes().all(|b| b.is_ascii_digit()) && !trimmed.is_empty() {
        return trimmed
            .parse::<usize>()
            .ok()
            .filter(|&fixed| within_limit(fixed))
            .map(|fixed| PmfCollection::new(vec![Pmf::constant(fixed)]))
            .ok_or_else(invalid);
    }
    let caps = notation_regex()
        .and_then(|re| re.captures(trimmed))
        .ok_or_else(invalid)?;
    let count = match caps.get(1) {
        Some(m) => m
            .as_str()
            .parse::<usize>()
            .ok()
            .filter(|&count| within_limit(count))
            .ok_or_else(invalid)?,
        None => 1,
    };
    let faces = caps
        .get(2)
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|&faces| within_limit(faces))
        .ok_or_else(invalid)?;
    Ok(PmfCollection::mdn(count, faces))
}
