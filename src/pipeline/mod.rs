pub mod ticker;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::types::{ContextDocument, GenerateResponse};
use crate::api::LegalApi;
use crate::citations::{self, Citation};
use crate::map::VisualizationPayload;
use crate::state::ProgressConfig;
use ticker::ProgressTicker;

pub const STAGE_RETRIEVING: &str = "Veritabanı taranıyor...";
pub const STAGE_NO_CONTEXT: &str = "Doğrudan bilgi bulunamadı, genel cevap üretiliyor...";
pub const STAGE_DONE: &str = "İşlem Tamamlandı.";
/// The only thing a user ever sees about a failed run.
pub const FAILURE_NOTICE: &str = "Bir hata oluştu. Lütfen tekrar deneyin.";

fn stage_found(count: usize) -> String {
    format!(
        "İlgili {} madde bulundu. Cevap ve Harita üretiliyor...",
        count
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    RetrievingContext,
    GeneratingAnswer,
    Succeeded,
    Failed,
}

/// Final outcome of a successful run. Citations are the retrieval result, in
/// retrieval order, regardless of what generation returned.
#[derive(Debug)]
pub struct AnswerResult {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub visualization: Option<VisualizationPayload>,
}

impl AnswerResult {
    fn assemble(generated: GenerateResponse, context: &[ContextDocument]) -> Self {
        Self {
            answer: generated.answer,
            citations: citations::from_retrieval(context),
            visualization: generated
                .vis_data
                .and_then(VisualizationPayload::from_vis_data),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Phase {
    Idle,
    RetrievingContext,
    GeneratingAnswer {
        context_count: usize,
    },
    /// `delivered` flips once the pacing delay has elapsed and the view may
    /// show the result.
    Succeeded {
        result: Arc<AnswerResult>,
        delivered: bool,
    },
    Failed,
}

impl Phase {
    pub fn status(&self) -> PipelineStatus {
        match self {
            Phase::Idle => PipelineStatus::Idle,
            Phase::RetrievingContext => PipelineStatus::RetrievingContext,
            Phase::GeneratingAnswer { .. } => PipelineStatus::GeneratingAnswer,
            Phase::Succeeded { .. } => PipelineStatus::Succeeded,
            Phase::Failed => PipelineStatus::Failed,
        }
    }

    /// Waiting on the network.
    pub fn is_running(&self) -> bool {
        matches!(self, Phase::RetrievingContext | Phase::GeneratingAnswer { .. })
    }

    /// A run is over once its result has been delivered (or it failed).
    pub fn accepts_submission(&self) -> bool {
        match self {
            Phase::Idle | Phase::Failed => true,
            Phase::Succeeded { delivered, .. } => *delivered,
            Phase::RetrievingContext | Phase::GeneratingAnswer { .. } => false,
        }
    }
}

/// What the view observes: one immutable value per change.
#[derive(Debug, Clone)]
pub struct PipelineSnapshot {
    pub phase: Phase,
    /// Displayed progress, 0..=100.
    pub progress: u8,
    pub stage: String,
    /// Bumped each time a submission is accepted. Snapshots of one run share
    /// it, so a watcher can tell a new run apart even when intermediate
    /// phases were coalesced away.
    pub run: u64,
}

impl Default for PipelineSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            progress: 0,
            stage: String::new(),
            run: 0,
        }
    }
}

impl PipelineSnapshot {
    pub fn status(&self) -> PipelineStatus {
        self.phase.status()
    }

    pub fn delivered_result(&self) -> Option<&Arc<AnswerResult>> {
        match &self.phase {
            Phase::Succeeded {
                result,
                delivered: true,
            } => Some(result),
            _ => None,
        }
    }

    /// One ticker step. Only moves while a network phase is pending.
    fn advance(&mut self, step: u8, cap: u8) -> bool {
        if step == 0 || !self.phase.is_running() || self.progress >= cap {
            return false;
        }
        self.progress = self.progress.saturating_add(step).min(cap);
        true
    }
}

#[derive(Debug)]
pub enum Submission {
    /// Empty question, or a run was already in flight.
    Ignored,
    Succeeded(Arc<AnswerResult>),
    Failed,
}

pub struct QueryPipeline {
    api: Arc<dyn LegalApi>,
    progress: ProgressConfig,
    state: Arc<watch::Sender<PipelineSnapshot>>,
}

impl QueryPipeline {
    pub fn new(api: Arc<dyn LegalApi>, progress: ProgressConfig) -> Self {
        let (state, _) = watch::channel(PipelineSnapshot::default());
        Self {
            api,
            progress,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.state.subscribe()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> PipelineStatus {
        self.state.borrow().status()
    }

    pub fn accepts_submission(&self) -> bool {
        self.state.borrow().phase.accepts_submission()
    }

    /// Run retrieve → generate for one question. Ignored when the question is
    /// blank or another run has not finished yet.
    pub async fn submit(&self, question: &str) -> Submission {
        if question.trim().is_empty() {
            debug!("Blank question ignored");
            return Submission::Ignored;
        }

        // Check and claim in one step so two submissions cannot both start.
        let accepted = self.state.send_if_modified(|snap| {
            if !snap.phase.accepts_submission() {
                return false;
            }
            *snap = PipelineSnapshot {
                phase: Phase::RetrievingContext,
                progress: 0,
                stage: STAGE_RETRIEVING.to_string(),
                run: snap.run + 1,
            };
            true
        });
        if !accepted {
            debug!(status = ?self.status(), "Run in flight, submission ignored");
            return Submission::Ignored;
        }

        info!(question, "Query started");
        let ticker = ProgressTicker::start(self.state.clone(), &self.progress);

        match self.run(question, ticker).await {
            Ok(result) => {
                info!(
                    citations = result.citations.len(),
                    has_map = result.visualization.is_some(),
                    answer_len = result.answer.len(),
                    "Query complete"
                );
                Submission::Succeeded(result)
            }
            Err(e) => {
                warn!("Query failed: {:#}", e);
                self.state.send_modify(|snap| {
                    snap.phase = Phase::Failed;
                    snap.stage = FAILURE_NOTICE.to_string();
                });
                Submission::Failed
            }
        }
    }

    /// The ticker is owned by this frame; any early return drops and aborts it.
    async fn run(&self, question: &str, ticker: ProgressTicker) -> Result<Arc<AnswerResult>> {
        let context = self
            .api
            .retrieve(question)
            .await
            .context("Retrieval phase failed")?;

        let context_count = context.len();
        debug!(context_count, "Context retrieved");
        self.state.send_modify(|snap| {
            snap.phase = Phase::GeneratingAnswer { context_count };
            snap.progress = 50;
            snap.stage = if context_count > 0 {
                stage_found(context_count)
            } else {
                STAGE_NO_CONTEXT.to_string()
            };
        });

        let generated = self
            .api
            .generate(question, &context)
            .await
            .context("Generation phase failed")?;
        ticker.stop();

        let result = Arc::new(AnswerResult::assemble(generated, &context));
        self.state.send_modify(|snap| {
            snap.phase = Phase::Succeeded {
                result: result.clone(),
                delivered: false,
            };
            snap.progress = 100;
            snap.stage = STAGE_DONE.to_string();
        });

        // Let the full bar be seen before the result replaces it.
        tokio::time::sleep(self.progress.result_delay).await;
        self.state.send_modify(|snap| {
            if let Phase::Succeeded { delivered, .. } = &mut snap.phase {
                *delivered = true;
            }
        });

        Ok(result)
    }
}
