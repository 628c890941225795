use std::ops::RangeInclusive;

use crate::SelectError;

/// Tolerant parse of a range spec such as `"1-3, 7, 12-10"`.
///
/// Well-formed tokens land in `accepted` (descending pairs already flipped);
/// anything else is kept verbatim in `skipped` so callers can report it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedRangeSpec {
    pub accepted: Vec<RangeInclusive<u32>>,
    pub skipped: Vec<String>,
}

impl ParsedRangeSpec {
    pub fn into_selection(self, spec: &str) -> Result<RangeSelection, SelectError> {
        if self.accepted.is_empty() {
            return Err(SelectError::InvalidSpec {
                spec: spec.to_string(),
            });
        }
        Ok(RangeSelection::from_ranges(self.accepted))
    }
}

pub fn parse_range_spec(spec: &str) -> ParsedRangeSpec {
    let mut parsed = ParsedRangeSpec::default();
    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match parse_token(token) {
            Some(range) => parsed.accepted.push(range),
            None => parsed.skipped.push(token.to_string()),
        }
    }
    parsed
}

fn parse_token(token: &str) -> Option<RangeInclusive<u32>> {
    match token.split_once('-') {
        Some((start, end)) => {
            let start = parse_positive(start)?;
            let end = parse_positive(end)?;
            Some(start.min(end)..=start.max(end))
        }
        None => parse_positive(token).map(|index| index..=index),
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|value| *value > 0)
}

/// Set of selected original indices, stored as sorted disjoint ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelection {
    ranges: Vec<RangeInclusive<u32>>,
}

impl RangeSelection {
    /// Parse a spec and fail with `InvalidSpec` when nothing usable remains.
    pub fn from_spec(spec: &str) -> Result<Self, SelectError> {
        parse_range_spec(spec).into_selection(spec)
    }

    fn from_ranges(mut ranges: Vec<RangeInclusive<u32>>) -> Self {
        ranges.sort_by_key(|range| *range.start());
        let mut merged: Vec<RangeInclusive<u32>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            if let Some(last) = merged.last_mut() {
                if *range.start() <= last.end().saturating_add(1) {
                    if range.end() > last.end() {
                        *last = *last.start()..=*range.end();
                    }
                    continue;
                }
            }
            merged.push(range);
        }
        Self { ranges: merged }
    }

    pub fn contains(&self, index: u32) -> bool {
        self.ranges.iter().any(|range| range.contains(&index))
    }

    /// Number of selected indices.
    pub fn len(&self) -> u64 {
        self.ranges
            .iter()
            .map(|range| u64::from(*range.end() - *range.start()) + 1)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[RangeInclusive<u32>] {
        &self.ranges
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.ranges.iter().flat_map(|range| range.clone())
    }
}
