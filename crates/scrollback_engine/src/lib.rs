//! Scrollback engine: harvest driving, snapshot extraction, transcript
//! persistence and export.
mod crop;
mod decode;
mod export;
mod extract;
mod filename;
mod harvest;
mod persist;
mod progress;
mod replay;
mod source;
mod transcript;

pub use crop::{crop_transcript, CropOutput};
pub use decode::{decode_snapshot, DecodeError, DecodedSnapshot};
pub use export::{build_markdown_transcript, ExportOptions};
pub use extract::{parse_group_order, ExtractError, SnapshotExtractor, SnapshotSelectors};
pub use filename::deterministic_filename;
pub use harvest::{HarvestReport, HarvestSettings, Harvester};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use progress::{HarvestEvent, LoggingProgressSink, ProgressSink};
pub use replay::{ReplayError, SnapshotReplaySource};
pub use source::{SourceError, VirtualSource};
pub use transcript::{
    load_transcript, save_transcript, write_output, TranscriptError, TranscriptFile, TranscriptRecord,
    TranscriptSelection, TranscriptTotals, TRANSCRIPT_FORMAT_VERSION,
};
