use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use scrollback_core::{
    update, Effect, FinishReason, HarvestLimits, HarvestState, HarvestStats, Msg, NumberedRecord,
    RawRecord, Viewport,
};

use crate::progress::{HarvestEvent, ProgressSink};
use crate::source::VirtualSource;

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSettings {
    pub limits: HarvestLimits,
    /// Wait after each materialization request so asynchronous rendering can land.
    pub settle_delay: Duration,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            limits: HarvestLimits::default(),
            settle_delay: Duration::from_millis(350),
        }
    }
}

/// Ordered, numbered output of one harvest session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub records: Vec<NumberedRecord>,
    pub stats: HarvestStats,
    pub reason: FinishReason,
}

impl HarvestReport {
    pub fn converged(&self) -> bool {
        self.reason == FinishReason::Converged
    }
}

/// Drives a [`VirtualSource`] until it converges or the stall ceiling is hit.
///
/// Collaborator failures never abort a session: a failed extraction counts as
/// an empty pass and a failed materialization is skipped.
#[derive(Debug, Clone, Default)]
pub struct Harvester {
    settings: HarvestSettings,
}

impl Harvester {
    pub fn new(settings: HarvestSettings) -> Self {
        Self { settings }
    }

    pub async fn run(
        &self,
        source: &mut dyn VirtualSource,
        sink: &dyn ProgressSink,
    ) -> HarvestReport {
        let limits = self.settings.limits;
        let mut state = HarvestState::new(limits);
        let mut last_viewport = Viewport::default();

        let initial = extract(source).await;
        engine_info!("harvest initial pass extracted {} records", initial.len());
        state = update(state, Msg::InitialPass(initial)).0;

        let reason = loop {
            let records = extract(source).await;
            let viewport = match source.viewport().await {
                Ok(viewport) => viewport,
                Err(err) => {
                    engine_warn!("viewport query failed, reusing last: {}", err);
                    last_viewport
                }
            };
            last_viewport = viewport;
            let source_at_end = source.at_end().await.unwrap_or_else(|err| {
                engine_warn!("end-of-source query failed: {}", err);
                false
            });
            let at_end = source_at_end || viewport.at_end(limits.end_tolerance);

            let (next, effects) = update(
                state,
                Msg::Pass {
                    records,
                    at_end,
                    viewport,
                },
            );
            state = next;
            let stats = state.stats();
            sink.emit(HarvestEvent::Pass {
                pass: stats.passes,
                records: stats.records,
                stall: stats.stall,
                at_end,
            });

            let mut finished = None;
            for effect in effects {
                match effect {
                    Effect::MaterializeMore { position, step } => {
                        if let Err(err) = source.materialize_more(position, step).await {
                            engine_warn!("materialize at {} (+{}) failed: {}", position, step, err);
                        }
                        if !self.settings.settle_delay.is_zero() {
                            tokio::time::sleep(self.settings.settle_delay).await;
                        }
                    }
                    Effect::RunFinalPass => {
                        let last = extract(source).await;
                        let (next, _) = update(state, Msg::FinalPass(last));
                        state = next;
                        finished = Some(FinishReason::Converged);
                    }
                    Effect::Finish { reason } => finished = Some(reason),
                }
            }
            if let Some(reason) = finished {
                break reason;
            }
        };

        let stats = state.stats();
        if reason == FinishReason::RetryCeiling {
            engine_warn!(
                "harvest stopped at the retry ceiling ({} stalled passes); result may be partial",
                limits.retry_ceiling
            );
        }
        sink.emit(HarvestEvent::Finished {
            reason,
            passes: stats.passes,
            records: stats.records,
        });

        HarvestReport {
            records: state.numbered(),
            stats,
            reason,
        }
    }
}

async fn extract(source: &mut dyn VirtualSource) -> Vec<RawRecord> {
    match source.extract_visible().await {
        Ok(records) => records,
        Err(err) => {
            engine_warn!("extraction failed, treating pass as empty: {}", err);
            Vec::new()
        }
    }
}
