use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;
use scrollback_core::{Category, FinishReason, HarvestLimits, HarvestState};
use scrollback_engine::{
    HarvestSettings, Harvester, LoggingProgressSink, SnapshotExtractor, SnapshotReplaySource,
    SnapshotSelectors,
};
use tempfile::TempDir;

fn turn(n: u32, body: &str) -> String {
    format!(
        r#"<article data-testid="conversation-turn-{n}">
             <div data-message-author-role="user" data-message-id="u{n}">
               <div class="whitespace-pre-wrap">question {n}</div>
             </div>
             <div data-message-author-role="assistant" data-message-id="a{n}">
               <div class="markdown"><p>{body}</p></div>
             </div>
           </article>"#
    )
}

fn page(turns: &[String]) -> String {
    format!(
        "<html><body><main>{}</main></body></html>",
        turns.concat()
    )
}

fn extractor() -> SnapshotExtractor {
    SnapshotExtractor::new(SnapshotSelectors::default()).unwrap()
}

#[test]
fn extractor_reads_turns_roles_ids_and_attachments() {
    let html = page(&[
        turn(2, "answer <b>two</b>"),
        r#"<article data-testid="conversation-turn-3">
             <div data-message-author-role="user" data-message-id="u3">
               <div data-attachment-name="report.pdf">report.pdf</div>
               <div class="whitespace-pre-wrap">see   the
                 report</div>
             </div>
           </article>"#
            .to_string(),
    ]);

    let records = extractor().extract(&html);
    let summary: Vec<_> = records
        .iter()
        .map(|r| {
            (
                r.identity.clone().unwrap(),
                r.category,
                r.group_order,
                r.plain_text.clone(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("u2".to_string(), Category::User, Some(2), "question 2".to_string()),
            ("a2".to_string(), Category::Assistant, Some(2), "answer two".to_string()),
            ("u3".to_string(), Category::User, Some(3), "see the report".to_string()),
        ]
    );
    assert!(records[1].rich_content.contains("<b>two</b>"));
    assert_eq!(records[2].attachment_names, vec!["report.pdf".to_string()]);
}

#[test]
fn messages_without_ids_fall_back_to_fingerprints_downstream() {
    let html = page(&[r#"<article data-testid="conversation-turn-1">
           <div data-message-author-role="tool"><p>tool call</p></div>
         </article>"#
        .to_string()]);
    let records = extractor().extract(&html);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identity, None);
    assert_eq!(records[0].category, Category::Other);
    assert!(records[0].identity_key().starts_with("fp-"));
}

#[test]
fn turns_without_ids_keep_discovery_order_across_windows() {
    let extractor = SnapshotExtractor::new(SnapshotSelectors {
        turn: "article".to_string(),
        ..SnapshotSelectors::default()
    })
    .unwrap();
    let with_id = |id: &str, text: &str| {
        format!(
            r#"<article><div data-message-author-role="user" data-message-id="{id}">{text}</div></article>"#
        )
    };
    let without_id = |text: &str| {
        format!(r#"<article><div data-message-author-role="assistant">{text}</div></article>"#)
    };
    let first = page(&[with_id("m1", "x1"), without_id("x2")]);
    let second = page(&[without_id("x2"), with_id("m3", "x3"), without_id("x4")]);

    let mut state = HarvestState::new(HarvestLimits::default());
    for frame in [&first, &second] {
        let records = extractor.extract(frame);
        assert!(records.iter().all(|r| r.group_order.is_none()));
        state.merge(records);
    }

    let texts: Vec<_> = state
        .numbered()
        .into_iter()
        .map(|n| n.record.content.plain)
        .collect();
    assert_eq!(texts, vec!["x1", "x2", "x3", "x4"]);
    assert_eq!(state.stats().groups, 4);
    assert!(state.group("turn-of-m1").is_some());
}

#[tokio::test]
async fn replayed_snapshots_harvest_into_one_ordered_transcript() {
    let dir = TempDir::new().unwrap();
    // Overlapping windows; filename order is scroll order.
    let frames = [
        page(&[turn(1, "one"), turn(2, "two")]),
        page(&[turn(2, "two, now longer"), turn(3, "three")]),
        page(&[turn(3, "three"), turn(4, "four")]),
    ];
    for (i, frame) in frames.iter().enumerate() {
        fs::write(dir.path().join(format!("frame-{i:03}.html")), frame).unwrap();
    }
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let mut source = SnapshotReplaySource::from_dir(dir.path(), 1000, extractor()).unwrap();
    assert_eq!(source.frame_count(), 3);

    let settings = HarvestSettings {
        limits: HarvestLimits {
            confirm_threshold: 2,
            ..HarvestLimits::default()
        },
        settle_delay: Duration::ZERO,
    };
    let report = Harvester::new(settings)
        .run(&mut source, &LoggingProgressSink)
        .await;

    assert_eq!(report.reason, FinishReason::Converged);
    assert_eq!(source.current_frame(), 2);
    let ids: Vec<_> = report
        .records
        .iter()
        .map(|n| n.record.identity.as_str())
        .collect();
    assert_eq!(ids, vec!["u1", "a1", "u2", "a2", "u3", "a3", "u4", "a4"]);

    let a2 = &report.records[3].record;
    assert_eq!(a2.content.plain, "two, now longer");
}

#[test]
fn empty_snapshot_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(SnapshotReplaySource::from_dir(dir.path(), 1000, extractor()).is_err());
}
