//! Input validation for CLI arguments.
//!
//! Availability values accept the canonical names plus the shorthand staff
//! actually type (`ok`, `ng`, `maybe`). Resolution is three-tier: exact
//! match → synonym lookup → error with the closest suggestion.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use chrono::NaiveDate;

use crate::model::{Availability, SubmissionDetail, YearMonth};

// ── Valid value sets ─────────────────────────────────────────

pub static VALID_AVAILABILITIES: LazyLock<HashSet<&str>> = LazyLock::new(|| {
    ["available", "unavailable", "tentative"]
        .into_iter()
        .collect()
});

pub static AVAILABILITY_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("ok", "available"),
        ("yes", "available"),
        ("y", "available"),
        ("free", "available"),
        ("ng", "unavailable"),
        ("no", "unavailable"),
        ("n", "unavailable"),
        ("off", "unavailable"),
        ("busy", "unavailable"),
        ("maybe", "tentative"),
        ("partial", "tentative"),
        ("tbd", "tentative"),
    ]
    .into_iter()
    .collect()
});

/// Normalize an availability string via exact match or synonym lookup.
///
/// Returns the canonical value, or the original input and an optional
/// suggestion.
pub fn normalize_availability(input: &str) -> Result<Availability, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    // Tier 1: exact match
    if VALID_AVAILABILITIES.contains(lower.as_str()) {
        return lower.parse().map_err(|_| (input.to_string(), None));
    }

    // Tier 2: synonym lookup
    if let Some(&canonical) = AVAILABILITY_SYNONYMS.get(lower.as_str()) {
        return canonical.parse().map_err(|_| (input.to_string(), None));
    }

    // Tier 3: find closest suggestion
    let suggestion = find_closest_match(&lower, &VALID_AVAILABILITIES, &AVAILABILITY_SYNONYMS);
    Err((input.to_string(), suggestion))
}

/// Parse one `--entry` value of the form `DATE=AVAILABILITY[@TIME_RANGE]`.
///
/// The date must be ISO (`2026-03-14`) and fall inside `month`.
pub fn parse_entry(input: &str, month: YearMonth) -> Result<SubmissionDetail, String> {
    let (date, rest) = input
        .split_once('=')
        .ok_or_else(|| format!("Invalid entry '{input}': expected DATE=AVAILABILITY[@TIME_RANGE]"))?;

    let (availability, time_range) = match rest.split_once('@') {
        Some((a, memo)) => (a, Some(memo.to_string()).filter(|m| !m.is_empty())),
        None => (rest, None),
    };

    let target_date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{date}': expected YYYY-MM-DD"))?;
    if !month.contains(target_date) {
        return Err(format!("Date {target_date} is outside {month}"));
    }

    let availability = normalize_availability(availability).map_err(|(value, suggestion)| {
        match suggestion {
            Some(s) => format!("Invalid availability '{value}' (did you mean '{s}'?)"),
            None => format!("Invalid availability '{value}'"),
        }
    })?;

    Ok(SubmissionDetail {
        id: 0,
        target_date,
        availability,
        time_range,
    })
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            // For synonyms, show what it maps to
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Use single-row optimization (O(min(m,n)) space)
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}
