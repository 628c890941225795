use scrollback_core::{RawRecord, Viewport};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("materialization failed: {0}")]
    Materialization(String),
}

/// A virtualized document that only materializes a window of its content.
///
/// Implementations own the rendering side (a browser tab, a replayed set of
/// snapshots, ...). The harvester never issues two calls concurrently.
#[async_trait::async_trait]
pub trait VirtualSource: Send {
    /// Records currently materialized in the window.
    async fn extract_visible(&mut self) -> Result<Vec<RawRecord>, SourceError>;

    /// Current boundary geometry.
    async fn viewport(&mut self) -> Result<Viewport, SourceError>;

    /// Advance the boundary by `step` from `position`. May be a no-op at the end.
    async fn materialize_more(&mut self, position: u64, step: u64) -> Result<(), SourceError>;

    /// Whether the boundary is at its maximum extent.
    async fn at_end(&mut self) -> Result<bool, SourceError> {
        Ok(self.viewport().await?.at_end(0))
    }
}
