use engine_logging::{engine_debug, engine_info};
use scrollback_core::FinishReason;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    /// One extraction pass was merged.
    Pass {
        pass: u32,
        records: usize,
        stall: u32,
        at_end: bool,
    },
    /// The session stopped.
    Finished {
        reason: FinishReason,
        passes: u32,
        records: usize,
    },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Forwards progress to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProgressSink;

impl ProgressSink for LoggingProgressSink {
    fn emit(&self, event: HarvestEvent) {
        match event {
            HarvestEvent::Pass {
                pass,
                records,
                stall,
                at_end,
            } => {
                engine_debug!(
                    "harvest pass={} records={} stall={} at_end={}",
                    pass,
                    records,
                    stall,
                    at_end
                );
            }
            HarvestEvent::Finished {
                reason,
                passes,
                records,
            } => {
                engine_info!(
                    "harvest finished reason={:?} passes={} records={}",
                    reason,
                    passes,
                    records
                );
            }
        }
    }
}
