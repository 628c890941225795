use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use pretty_assertions::assert_eq;
use scrollback_core::{Category, FinishReason, HarvestLimits, RawRecord, Viewport};
use scrollback_engine::{
    HarvestEvent, HarvestSettings, Harvester, ProgressSink, SourceError, VirtualSource,
};

const ROW: u64 = 100;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn settings(retry_ceiling: u32) -> HarvestSettings {
    HarvestSettings {
        limits: HarvestLimits {
            retry_ceiling,
            confirm_threshold: 2,
            ..HarvestLimits::default()
        },
        settle_delay: Duration::ZERO,
    }
}

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<HarvestEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<HarvestEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: HarvestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A conversation of `turns` user/assistant pairs where only `window` rows
/// are materialized at once.
struct ScrollingConversation {
    rows: Vec<RawRecord>,
    window: usize,
    position: u64,
    fail_extractions: usize,
    /// 1-based call numbers on which `viewport()` fails.
    failing_viewport_calls: Vec<usize>,
    /// 1-based call numbers on which `materialize_more()` fails.
    failing_materialize_calls: Vec<usize>,
    viewport_calls: usize,
    materialize_calls: usize,
}

impl ScrollingConversation {
    fn new(turns: u64, window: usize) -> Self {
        let rows = (1..=turns)
            .flat_map(|turn| {
                let group = format!("conversation-turn-{turn}");
                [
                    RawRecord::new(group.clone(), Category::User)
                        .with_identity(format!("u{turn}"))
                        .with_group_order(turn)
                        .with_content(format!("<p>question {turn}</p>"), format!("question {turn}")),
                    RawRecord::new(group, Category::Assistant)
                        .with_identity(format!("a{turn}"))
                        .with_group_order(turn)
                        .with_content(format!("<p>answer {turn}</p>"), format!("answer {turn}")),
                ]
            })
            .collect();
        Self {
            rows,
            window,
            position: 0,
            fail_extractions: 0,
            failing_viewport_calls: Vec::new(),
            failing_materialize_calls: Vec::new(),
            viewport_calls: 0,
            materialize_calls: 0,
        }
    }

    fn first_row(&self) -> usize {
        (self.position / ROW) as usize
    }
}

#[async_trait::async_trait]
impl VirtualSource for ScrollingConversation {
    async fn extract_visible(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        if self.fail_extractions > 0 {
            self.fail_extractions -= 1;
            return Err(SourceError::Extraction("renderer busy".to_string()));
        }
        let start = self.first_row().min(self.rows.len());
        let end = (start + self.window).min(self.rows.len());
        // Newest rows render first, like a chat view.
        Ok(self.rows[start..end].iter().rev().cloned().collect())
    }

    async fn viewport(&mut self) -> Result<Viewport, SourceError> {
        self.viewport_calls += 1;
        if self.failing_viewport_calls.contains(&self.viewport_calls) {
            return Err(SourceError::Unavailable("layout pending".to_string()));
        }
        Ok(Viewport::new(
            self.position,
            self.window as u64 * ROW,
            self.rows.len() as u64 * ROW,
        ))
    }

    async fn materialize_more(&mut self, position: u64, step: u64) -> Result<(), SourceError> {
        self.materialize_calls += 1;
        if self.failing_materialize_calls.contains(&self.materialize_calls) {
            return Err(SourceError::Materialization("scroll rejected".to_string()));
        }
        let max = (self.rows.len() as u64 * ROW).saturating_sub(self.window as u64 * ROW);
        self.position = (position + step).min(max);
        Ok(())
    }
}

/// Never reports an end: each advance reveals at most the remaining rows,
/// then nothing new.
struct EndlessFeed {
    inner: ScrollingConversation,
}

#[async_trait::async_trait]
impl VirtualSource for EndlessFeed {
    async fn extract_visible(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        self.inner.extract_visible().await
    }

    async fn viewport(&mut self) -> Result<Viewport, SourceError> {
        let position = self.inner.position;
        Ok(Viewport::new(position, 400, position + 10_000))
    }

    async fn materialize_more(&mut self, position: u64, step: u64) -> Result<(), SourceError> {
        self.inner.position = position + step;
        Ok(())
    }

    async fn at_end(&mut self) -> Result<bool, SourceError> {
        Ok(false)
    }
}

#[tokio::test]
async fn scrolling_harvest_collects_every_row_once_in_order() {
    init_logging();
    let mut source = ScrollingConversation::new(12, 5);
    let sink = TestSink::default();

    let report = Harvester::new(settings(30)).run(&mut source, &sink).await;

    assert_eq!(report.reason, FinishReason::Converged);
    assert!(report.converged());
    let ids: Vec<_> = report
        .records
        .iter()
        .map(|n| n.record.identity.as_str())
        .collect();
    let expected: Vec<String> = (1..=12)
        .flat_map(|t| [format!("u{t}"), format!("a{t}")])
        .collect();
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());

    let globals: Vec<u32> = report.records.iter().map(|n| n.global_index).collect();
    assert_eq!(globals, (1..=24).collect::<Vec<_>>());

    let last = report.records.last().unwrap();
    assert_eq!(last.category_index, Some(12));
    assert_eq!(last.running_totals.user, 12);

    let events = sink.take();
    assert!(matches!(
        events.last(),
        Some(HarvestEvent::Finished {
            reason: FinishReason::Converged,
            records: 24,
            ..
        })
    ));
}

#[tokio::test]
async fn endless_source_stops_at_the_retry_ceiling_with_partial_result() {
    init_logging();
    let mut source = EndlessFeed {
        inner: ScrollingConversation::new(3, 2),
    };

    let report = Harvester::new(settings(5)).run(&mut source, &TestSink::default()).await;

    assert_eq!(report.reason, FinishReason::RetryCeiling);
    assert!(!report.records.is_empty());
    assert_eq!(report.stats.stall, 5);
    let globals: Vec<u32> = report.records.iter().map(|n| n.global_index).collect();
    assert_eq!(globals, (1..=report.records.len() as u32).collect::<Vec<_>>());
}

#[tokio::test]
async fn failed_extractions_count_as_empty_passes() {
    init_logging();
    let mut source = ScrollingConversation::new(4, 8);
    source.fail_extractions = 1;

    let report = Harvester::new(settings(30)).run(&mut source, &TestSink::default()).await;

    assert_eq!(report.reason, FinishReason::Converged);
    assert_eq!(report.records.len(), 8);
}

#[tokio::test]
async fn failed_viewport_queries_and_scrolls_do_not_abort_the_session() {
    init_logging();
    let mut source = ScrollingConversation::new(12, 5);
    source.failing_viewport_calls = vec![2, 3, 6];
    source.failing_materialize_calls = vec![1, 4];

    let report = Harvester::new(settings(30)).run(&mut source, &TestSink::default()).await;

    assert_eq!(report.reason, FinishReason::Converged);
    assert!(source.viewport_calls > 6);
    assert!(source.materialize_calls > 4);
    let globals: Vec<u32> = report.records.iter().map(|n| n.global_index).collect();
    assert_eq!(globals, (1..=24).collect::<Vec<_>>());
    let ids: Vec<_> = report
        .records
        .iter()
        .map(|n| n.record.identity.as_str())
        .collect();
    assert_eq!(ids.first(), Some(&"u1"));
    assert_eq!(ids.last(), Some(&"a12"));
}
