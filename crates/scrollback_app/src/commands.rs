use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use engine_logging::{engine_info, engine_warn};
use scrollback_engine::{
    build_markdown_transcript, crop_transcript, deterministic_filename, load_transcript,
    save_transcript, write_output, ExportOptions, Harvester, LoggingProgressSink,
    SnapshotExtractor, SnapshotReplaySource, SnapshotSelectors, TranscriptFile,
};

use crate::cli::{Cli, Command};
use crate::config::load_config;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Harvest {
            snapshots,
            out,
            title,
            config,
        } => harvest(&snapshots, out, title, config.as_deref()),
        Command::Crop {
            transcript,
            ranges,
            out,
            markdown,
        } => crop(&transcript, &ranges, out, markdown),
    }
}

fn now_utc() -> String {
    Utc::now().to_rfc3339()
}

fn harvest(
    snapshots: &Path,
    out: Option<PathBuf>,
    title: Option<String>,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let extractor = SnapshotExtractor::new(SnapshotSelectors::default())?;
    let mut source = SnapshotReplaySource::from_dir(snapshots, config.viewport_height, extractor)?;
    let harvester = Harvester::new(config.harvest_settings());

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let report = runtime.block_on(harvester.run(&mut source, &LoggingProgressSink));
    if !report.converged() {
        engine_warn!(
            "source did not converge after {} passes; writing the partial result",
            report.stats.passes
        );
    }

    let source_label = snapshots.display().to_string();
    let mut file = TranscriptFile::from_harvest(report.records);
    file.title = title;
    file.source = Some(source_label.clone());
    file.harvested_utc = Some(now_utc());

    let out = out.unwrap_or_else(|| {
        PathBuf::from(deterministic_filename(
            file.title.as_deref(),
            &source_label,
            "json",
        ))
    });
    let written = save_transcript(&out, &file)?;
    println!(
        "harvested {} records ({:?}) -> {}",
        file.records.len(),
        report.reason,
        written.display()
    );
    Ok(())
}

fn crop(input: &Path, ranges: &str, out: Option<PathBuf>, markdown: bool) -> anyhow::Result<()> {
    let file = load_transcript(input)?;
    let output = crop_transcript(&file, ranges)?;
    let stats = output.stats;

    let extension = if markdown { "md" } else { "json" };
    let out = out.unwrap_or_else(|| default_crop_path(input, extension));
    let written = if markdown {
        let options = ExportOptions {
            exported_utc: now_utc(),
            ..ExportOptions::default()
        };
        write_output(&out, &build_markdown_transcript(&output.transcript, &options))?
    } else {
        save_transcript(&out, &output.transcript)?
    };
    engine_info!("cropped transcript written to {:?}", written);

    println!(
        "kept {} of {} records (removed {}, kept without original index {}) -> {}",
        stats.kept,
        stats.total,
        stats.removed,
        stats.missing_original_index,
        written.display()
    );
    Ok(())
}

fn default_crop_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("transcript");
    input.with_file_name(format!("{stem}-cropped.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_output_sits_next_to_the_input() {
        assert_eq!(
            default_crop_path(Path::new("/tmp/chat.json"), "md"),
            PathBuf::from("/tmp/chat-cropped.md")
        );
        assert_eq!(
            default_crop_path(Path::new("chat.json"), "json"),
            PathBuf::from("chat-cropped.json")
        );
    }
}
