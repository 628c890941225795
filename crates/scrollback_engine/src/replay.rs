use std::fs;
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_info};
use scrollback_core::{RawRecord, Viewport};

use crate::decode::{decode_snapshot, DecodeError};
use crate::extract::SnapshotExtractor;
use crate::source::{SourceError, VirtualSource};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("io error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("no .html snapshots found in {0:?}")]
    Empty(PathBuf),
}

/// Replays saved HTML windows of a scroll container as a [`VirtualSource`].
///
/// Frame `k` is treated as the window at position `k * window_height`; the
/// last frame is the end of the content.
pub struct SnapshotReplaySource {
    frames: Vec<String>,
    current: usize,
    window_height: u64,
    extractor: SnapshotExtractor,
}

impl SnapshotReplaySource {
    pub fn new(frames: Vec<String>, window_height: u64, extractor: SnapshotExtractor) -> Self {
        Self {
            frames,
            current: 0,
            window_height: window_height.max(1),
            extractor,
        }
    }

    /// Load every `*.html` file in `dir`, in filename order.
    pub fn from_dir(
        dir: &Path,
        window_height: u64,
        extractor: SnapshotExtractor,
    ) -> Result<Self, ReplayError> {
        let io_err = |source| ReplayError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
            })
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(ReplayError::Empty(dir.to_path_buf()));
        }

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path).map_err(|source| ReplayError::Io {
                path: path.clone(),
                source,
            })?;
            let decoded =
                decode_snapshot(&bytes, None).map_err(|source| ReplayError::Decode {
                    path: path.clone(),
                    source,
                })?;
            engine_debug!("loaded snapshot {:?} ({})", path, decoded.encoding_label);
            frames.push(decoded.html);
        }
        engine_info!("replaying {} snapshots from {:?}", frames.len(), dir);
        Ok(Self::new(frames, window_height, extractor))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    fn current_viewport(&self) -> Viewport {
        let frames = self.frames.len().max(1) as u64;
        Viewport::new(
            self.current as u64 * self.window_height,
            self.window_height,
            frames * self.window_height,
        )
    }
}

#[async_trait::async_trait]
impl VirtualSource for SnapshotReplaySource {
    async fn extract_visible(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        let frame = self
            .frames
            .get(self.current)
            .ok_or_else(|| SourceError::Unavailable("no snapshots loaded".to_string()))?;
        Ok(self.extractor.extract(frame))
    }

    async fn viewport(&mut self) -> Result<Viewport, SourceError> {
        Ok(self.current_viewport())
    }

    async fn materialize_more(&mut self, position: u64, step: u64) -> Result<(), SourceError> {
        let target = position.saturating_add(step).div_ceil(self.window_height);
        let last = self.frames.len().saturating_sub(1);
        self.current = usize::try_from(target).unwrap_or(last).min(last).max(self.current);
        Ok(())
    }
}
