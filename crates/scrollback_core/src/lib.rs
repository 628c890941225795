//! Scrollback core: pure harvest state machine, record numbering and selection.
mod effect;
mod identity;
mod msg;
mod numbering;
mod range_spec;
mod record;
mod select;
mod state;
mod update;
mod viewport;

pub use effect::{Effect, FinishReason};
pub use identity::{derive_identity, fingerprint, normalize_text, FINGERPRINT_EDGE_CHARS};
pub use msg::Msg;
pub use numbering::{number_records, CategoryTotals, NumberedRecord};
pub use range_spec::{parse_range_spec, ParsedRangeSpec, RangeSelection};
pub use record::{Category, Content, RawRecord, Record};
pub use select::{
    select_subset, SelectError, SelectedRecord, Selection, SelectionCounter, SelectionStats,
    StoredRecord,
};
pub use state::{Group, HarvestLimits, HarvestState, HarvestStats, MergeOutcome};
pub use update::update;
pub use viewport::Viewport;
