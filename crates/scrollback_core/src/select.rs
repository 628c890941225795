use std::collections::BTreeSet;

use crate::range_spec::{parse_range_spec, RangeSelection};
use crate::{Category, CategoryTotals, Content, NumberedRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("range spec {spec:?} selects no indices")]
    InvalidSpec { spec: String },
}

/// Position of a record within a cropped selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCounter {
    pub position: u32,
    pub total: u32,
}

/// A numbered record as recovered from its persisted form.
///
/// Counters are optional because an upstream writer may have lost them; the
/// selector never recomputes `global_index`, it only reads it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub identity: Option<String>,
    pub category: Category,
    pub group_id: Option<String>,
    pub content: Content,
    pub attachments: BTreeSet<String>,
    pub global_index: Option<u32>,
    pub category_index: Option<u32>,
    pub running_totals: Option<CategoryTotals>,
    pub selection: Option<SelectionCounter>,
}

impl From<NumberedRecord> for StoredRecord {
    fn from(numbered: NumberedRecord) -> Self {
        let record = numbered.record;
        Self {
            identity: Some(record.identity),
            category: record.category,
            group_id: Some(record.group_id),
            content: record.content,
            attachments: record.attachments,
            global_index: Some(numbered.global_index),
            category_index: numbered.category_index,
            running_totals: Some(numbered.running_totals),
            selection: None,
        }
    }
}

/// A record that survived cropping, with its new selection counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRecord {
    pub record: StoredRecord,
    pub selection: SelectionCounter,
    /// Kept only because its original index could not be recovered.
    pub missing_original_index: bool,
}

impl From<SelectedRecord> for StoredRecord {
    fn from(selected: SelectedRecord) -> Self {
        StoredRecord {
            selection: Some(selected.selection),
            ..selected.record
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionStats {
    pub total: usize,
    pub kept: usize,
    pub removed: usize,
    pub missing_original_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub kept: Vec<SelectedRecord>,
    pub stats: SelectionStats,
    /// Spec tokens that were ignored as malformed.
    pub skipped_tokens: Vec<String>,
}

/// Crop `records` to the original indices named by `spec`.
///
/// Records whose original index is unknown are kept and flagged rather than
/// dropped. Relative order is preserved and a fresh `(position, total)`
/// counter is attached to every kept record.
pub fn select_subset(
    records: impl IntoIterator<Item = StoredRecord>,
    spec: &str,
) -> Result<Selection, SelectError> {
    let parsed = parse_range_spec(spec);
    let skipped_tokens = parsed.skipped.clone();
    let wanted: RangeSelection = parsed.into_selection(spec)?;

    let mut stats = SelectionStats::default();
    let mut survivors = Vec::new();
    for record in records {
        stats.total += 1;
        match record.global_index {
            Some(index) if wanted.contains(index) => survivors.push((record, false)),
            Some(_) => stats.removed += 1,
            None => {
                stats.missing_original_index += 1;
                survivors.push((record, true));
            }
        }
    }
    stats.kept = survivors.len();

    let total = u32::try_from(survivors.len()).unwrap_or(u32::MAX);
    let kept = survivors
        .into_iter()
        .zip(1u32..)
        .map(|((record, missing), position)| SelectedRecord {
            record,
            selection: SelectionCounter { position, total },
            missing_original_index: missing,
        })
        .collect();

    Ok(Selection {
        kept,
        stats,
        skipped_tokens,
    })
}
