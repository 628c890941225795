use engine_logging::{engine_debug, engine_info, engine_warn};
use scrollback_core::{select_subset, SelectError, SelectionStats};

use crate::transcript::{TranscriptFile, TranscriptRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropOutput {
    pub transcript: TranscriptFile,
    pub stats: SelectionStats,
    pub skipped_tokens: Vec<String>,
}

/// Keep the records of `file` whose original index is named by `spec`.
///
/// The cropped transcript carries the source metadata over and records the
/// applied spec. Only an empty selection is an error.
pub fn crop_transcript(file: &TranscriptFile, spec: &str) -> Result<CropOutput, SelectError> {
    let selection = select_subset(file.stored_records(), spec)?;
    let stats = selection.stats;

    if !selection.skipped_tokens.is_empty() {
        engine_debug!("ignored range tokens: {:?}", selection.skipped_tokens);
    }
    if stats.missing_original_index > 0 {
        engine_warn!(
            "{} of {} records had no recoverable original index and were kept unconditionally",
            stats.missing_original_index,
            stats.total
        );
    }
    engine_info!(
        "crop {:?}: kept {} removed {} of {}",
        spec,
        stats.kept,
        stats.removed,
        stats.total
    );

    let transcript = TranscriptFile {
        format_version: file.format_version,
        title: file.title.clone(),
        source: file.source.clone(),
        harvested_utc: file.harvested_utc.clone(),
        selection_spec: Some(spec.trim().to_string()),
        records: selection
            .kept
            .into_iter()
            .map(TranscriptRecord::from)
            .collect(),
    };

    Ok(CropOutput {
        transcript,
        stats,
        skipped_tokens: selection.skipped_tokens,
    })
}
