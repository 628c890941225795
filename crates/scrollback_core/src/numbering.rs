use crate::{Category, Record};

/// Cumulative per-category counts at a position in the flattened sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryTotals {
    pub user: u32,
    pub assistant: u32,
}

impl CategoryTotals {
    pub fn new(user: u32, assistant: u32) -> Self {
        Self { user, assistant }
    }

    fn bump(&mut self, category: Category) -> Option<u32> {
        if !category.is_primary() {
            return None;
        }
        let slot = if category == Category::User {
            &mut self.user
        } else {
            &mut self.assistant
        };
        *slot += 1;
        Some(*slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedRecord {
    pub record: Record,
    /// 1-based position in the flattened sequence.
    pub global_index: u32,
    /// 1-based position among records of the same primary category.
    pub category_index: Option<u32>,
    pub running_totals: CategoryTotals,
}

/// Number records in the given order with a single forward pass.
///
/// Records without content or attachments are dropped before numbering so the
/// global index stays contiguous.
pub fn number_records(records: impl IntoIterator<Item = Record>) -> Vec<NumberedRecord> {
    let mut totals = CategoryTotals::default();
    records
        .into_iter()
        .filter(Record::has_payload)
        .zip(1u32..)
        .map(|(record, global_index)| {
            let category_index = totals.bump(record.category);
            NumberedRecord {
                record,
                global_index,
                category_index,
                running_totals: totals,
            }
        })
        .collect()
}
