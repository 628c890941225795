#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the source to advance its boundary by `step` from `position`, then settle.
    MaterializeMore { position: u64, step: u64 },
    /// The source is confirmed at its end: extract one last time.
    RunFinalPass,
    /// Stop harvesting.
    Finish { reason: FinishReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The source reached its end and stayed quiet for the confirmation window.
    Converged,
    /// The stall counter hit the retry ceiling; the result is best effort.
    RetryCeiling,
}
