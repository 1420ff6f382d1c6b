use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::PipelineSnapshot;
use crate::state::ProgressConfig;

/// Owned handle to the cosmetic progress timer. The timer task is aborted when
/// the handle is stopped or dropped, so no exit path of a run can leak it.
pub struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    pub fn start(state: Arc<watch::Sender<PipelineSnapshot>>, config: &ProgressConfig) -> Self {
        let step = config.step;
        let cap = config.cap;
        let period = config.interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                state.send_if_modified(|snap| snap.advance(step, cap));
            }
        });

        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
