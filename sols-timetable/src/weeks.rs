use std::ops::RangeInclusive;

use crate::{Error, Result};

/// Highest week number a specification may name.
pub const MAX_WEEK: u32 = 53;

/// Expands a week specification such as `"1-3,14,21,24"` into the listed
/// week numbers, in the order written.
pub fn expand_weeks(spec: &str) -> Result<Vec<u32>> {
    let mut weeks = Vec::new();

    for token in week_tokens(spec) {
        weeks.extend(token?);
    }

    Ok(weeks)
}

/// Parses each comma-separated token of `spec` on its own, so callers can
/// keep the valid tokens of a partly malformed specification.
pub fn week_tokens(spec: &str) -> impl Iterator<Item = Result<RangeInclusive<u32>>> + '_ {
    spec.split(',').map(str::trim).map(parse_token)
}

fn parse_token(token: &str) -> Result<RangeInclusive<u32>> {
    let malformed = || Error::MalformedWeekSpec {
        token: token.to_string(),
    };

    let (start, end) = match token.split_once('-') {
        Some((start, end)) => (parse_week(start), parse_week(end)),
        None => (parse_week(token), parse_week(token)),
    };

    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok(start..=end),
        _ => Err(malformed()),
    }
}

fn parse_week(s: &str) -> Option<u32> {
    let s = s.trim();

    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    s.parse().ok().filter(|week| *week <= MAX_WEEK)
}
