use std::fmt::Write;

use scrollback_core::Category;

use crate::transcript::{TranscriptFile, TranscriptRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Timestamp written to the frontmatter; supplied by the caller's clock.
    pub exported_utc: String,
    /// Render the rich HTML payload as markdown instead of using plain text.
    pub convert_rich: bool,
    pub include_attachments: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            exported_utc: String::new(),
            convert_rich: true,
            include_attachments: true,
        }
    }
}

/// Render a transcript as a markdown document with a YAML-ish frontmatter and
/// one section per record, headed by the record's counters.
pub fn build_markdown_transcript(file: &TranscriptFile, options: &ExportOptions) -> String {
    let mut doc = String::new();
    doc.push_str("---\n");
    let _ = writeln!(doc, "title: {}", file.title.as_deref().unwrap_or("untitled"));
    if let Some(source) = file.source.as_deref() {
        let _ = writeln!(doc, "source: {source}");
    }
    if let Some(harvested) = file.harvested_utc.as_deref() {
        let _ = writeln!(doc, "harvested_utc: {harvested}");
    }
    let _ = writeln!(doc, "exported_utc: {}", options.exported_utc);
    let _ = writeln!(doc, "record_count: {}", file.records.len());
    if let Some(spec) = file.selection_spec.as_deref() {
        let _ = writeln!(doc, "selection: {spec}");
    }
    doc.push_str("---\n");

    for record in &file.records {
        let _ = write!(doc, "\n## {}\n\n", heading(record));
        let body = render_body(record, options.convert_rich);
        if !body.is_empty() {
            doc.push_str(&body);
            doc.push('\n');
        }
        if options.include_attachments && !record.attachments.is_empty() {
            if !body.is_empty() {
                doc.push('\n');
            }
            let _ = writeln!(doc, "Attachments: {}", record.attachments.join(", "));
        }
    }
    doc
}

fn heading(record: &TranscriptRecord) -> String {
    let category = Category::from_role(&record.role);
    let mut heading = match record.index {
        Some(index) => format!("#{index}"),
        None => "#?".to_string(),
    };
    let _ = write!(heading, " {}", title_case(category.as_str()));
    if let Some(role_index) = record.role_index {
        let _ = write!(heading, " {role_index}");
    }
    if let Some(totals) = record.totals {
        let _ = write!(heading, " (user {}, assistant {})", totals.user, totals.assistant);
    }
    if let Some(selection) = record.selection {
        let _ = write!(heading, " [{}/{}]", selection.position, selection.total);
    }
    if record.missing_original_index {
        heading.push_str(" (original index unknown)");
    }
    heading
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_body(record: &TranscriptRecord, convert_rich: bool) -> String {
    if convert_rich && !record.html.trim().is_empty() {
        let markdown = html2md::parse_html(&record.html);
        let markdown = markdown.trim();
        if !markdown.is_empty() {
            return markdown.to_string();
        }
    }
    record.text.trim().to_string()
}
