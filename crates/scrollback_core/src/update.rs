use crate::{Effect, FinishReason, HarvestState, Msg};

/// Pure update function: applies a harvest observation to state and returns
/// the next effects for the driver to execute.
pub fn update(mut state: HarvestState, msg: Msg) -> (HarvestState, Vec<Effect>) {
    if state.finished().is_some() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::InitialPass(records) => {
            state.merge(records);
            Vec::new()
        }
        Msg::Pass {
            records,
            at_end,
            viewport,
        } => {
            let outcome = state.merge(records);
            state.record_pass(outcome);
            let limits = *state.limits();
            if at_end && state.stall() >= limits.confirm_threshold {
                vec![Effect::RunFinalPass]
            } else if state.stall() >= limits.retry_ceiling {
                state.finish(FinishReason::RetryCeiling);
                vec![Effect::Finish {
                    reason: FinishReason::RetryCeiling,
                }]
            } else {
                vec![Effect::MaterializeMore {
                    position: viewport.position,
                    step: viewport.step(limits.step_fraction),
                }]
            }
        }
        Msg::FinalPass(records) => {
            state.merge(records);
            state.finish(FinishReason::Converged);
            vec![Effect::Finish {
                reason: FinishReason::Converged,
            }]
        }
    };

    (state, effects)
}
