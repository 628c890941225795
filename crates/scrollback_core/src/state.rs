use std::collections::{BTreeMap, HashMap};

use crate::numbering::{number_records, NumberedRecord};
use crate::{FinishReason, RawRecord, Record};

/// Loop bounds for one harvest session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarvestLimits {
    /// Consecutive empty passes after which the session gives up.
    pub retry_ceiling: u32,
    /// Consecutive empty passes at the end boundary that confirm convergence.
    pub confirm_threshold: u32,
    /// Fraction of the window height to advance per materialization request.
    pub step_fraction: f64,
    /// Slack, in source units, when deciding whether the boundary is at its end.
    pub end_tolerance: u64,
}

impl Default for HarvestLimits {
    fn default() -> Self {
        Self {
            retry_ceiling: 30,
            confirm_threshold: 3,
            step_fraction: 0.85,
            end_tolerance: 2,
        }
    }
}

/// A turn: records sharing a `group_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub order: Option<u64>,
    pub discovery_order: u64,
    /// Records in first-observed order.
    pub records: Vec<Record>,
}

impl Group {
    fn new(id: String, order: Option<u64>, discovery_order: u64) -> Self {
        Self {
            id,
            order,
            discovery_order,
            records: Vec::new(),
        }
    }

    fn adopt_order(&mut self, order: Option<u64>) {
        if self.order.is_none() {
            self.order = order;
        }
    }

    /// Records flattened in category precedence, first-observed within a category.
    fn flattened(&self) -> impl Iterator<Item = &Record> {
        let mut refs: Vec<&Record> = self.records.iter().collect();
        refs.sort_by_key(|record| record.category.precedence());
        refs.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub created: usize,
    pub updated: usize,
}

impl MergeOutcome {
    pub fn added(&self) -> usize {
        self.created + self.updated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HarvestStats {
    pub passes: u32,
    pub groups: usize,
    /// Records that carry content or attachments, i.e. the ones numbering keeps.
    pub records: usize,
    pub stall: u32,
    pub finished: Option<FinishReason>,
}

/// Accumulated store and counters of a single harvest session.
///
/// Every session owns its own state; nothing here is shared across sessions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarvestState {
    limits: HarvestLimits,
    groups: BTreeMap<String, Group>,
    index: HashMap<String, String>,
    next_discovery: u64,
    stall: u32,
    passes: u32,
    finished: Option<FinishReason>,
}

impl HarvestState {
    pub fn new(limits: HarvestLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> &HarvestLimits {
        &self.limits
    }

    pub fn stall(&self) -> u32 {
        self.stall
    }

    pub fn finished(&self) -> Option<FinishReason> {
        self.finished
    }

    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.get(group_id)
    }

    pub fn record(&self, identity: &str) -> Option<&Record> {
        let group_id = self.index.get(identity)?;
        self.groups
            .get(group_id)?
            .records
            .iter()
            .find(|record| record.identity == identity)
    }

    pub fn stats(&self) -> HarvestStats {
        HarvestStats {
            passes: self.passes,
            groups: self.groups.len(),
            records: self
                .groups
                .values()
                .flat_map(|group| &group.records)
                .filter(|record| record.has_payload())
                .count(),
            stall: self.stall,
            finished: self.finished,
        }
    }

    /// Merge a batch of observations into the store.
    pub fn merge(&mut self, raws: Vec<RawRecord>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for raw in raws {
            let identity = raw.identity_key();
            if let Some(group_id) = self.index.get(&identity) {
                let Some(group) = self.groups.get_mut(group_id) else {
                    continue;
                };
                group.adopt_order(raw.group_order);
                let Some(record) = group.records.iter_mut().find(|r| r.identity == identity)
                else {
                    continue;
                };
                if record.merge(raw) {
                    outcome.updated += 1;
                }
                continue;
            }

            let next_discovery = &mut self.next_discovery;
            let group = self.groups.entry(raw.group_id.clone()).or_insert_with(|| {
                let discovery = *next_discovery;
                *next_discovery += 1;
                Group::new(raw.group_id.clone(), raw.group_order, discovery)
            });
            group.adopt_order(raw.group_order);
            self.index.insert(identity.clone(), raw.group_id.clone());
            group.records.push(Record::from_raw(identity, raw));
            outcome.created += 1;
        }
        outcome
    }

    pub(crate) fn record_pass(&mut self, outcome: MergeOutcome) {
        self.passes += 1;
        if outcome.added() == 0 {
            self.stall += 1;
        } else {
            self.stall = 0;
        }
    }

    pub(crate) fn finish(&mut self, reason: FinishReason) {
        self.finished = Some(reason);
    }

    /// Groups in final order: ordered groups ascending, then unordered groups by discovery.
    pub fn ordered_groups(&self) -> Vec<&Group> {
        let mut groups: Vec<&Group> = self.groups.values().collect();
        groups.sort_by_key(|group| (group.order.is_none(), group.order, group.discovery_order));
        groups
    }

    /// Flatten the store and assign the three counter families.
    pub fn numbered(&self) -> Vec<NumberedRecord> {
        number_records(
            self.ordered_groups()
                .into_iter()
                .flat_map(|group| group.flattened().cloned().collect::<Vec<_>>()),
        )
    }
}
