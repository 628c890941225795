use crate::{RawRecord, Viewport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Records that were already materialized before the first advance.
    InitialPass(Vec<RawRecord>),
    /// Records extracted after a settle, plus the boundary state at that moment.
    Pass {
        records: Vec<RawRecord>,
        at_end: bool,
        viewport: Viewport,
    },
    /// Last extraction once convergence is confirmed.
    FinalPass(Vec<RawRecord>),
}
