use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::view::{map_summary, progress_line, reader_panel, result_panel};
use super::{Command, HELP};
use crate::api::types::Article;
use crate::map::EmbeddingMapView;
use crate::pipeline::{
    AnswerResult, Phase, PipelineSnapshot, PipelineStatus, Submission, FAILURE_NOTICE,
};
use crate::reader::{fetch_articles, LegislationReader, LookupTicket};
use crate::state::AppState;

type Lookup = (LookupTicket, Vec<Article>);

/// Terminal front end: one task multiplexing user input, pipeline snapshots
/// and reader lookups.
pub struct Session {
    state: AppState,
    reader: LegislationReader,
    map: Option<EmbeddingMapView>,
    shown: Option<Arc<AnswerResult>>,
    last_status: PipelineStatus,
    /// Run whose snapshots are being shown.
    current_run: u64,
    /// Run the failure notice was last printed for.
    failure_noticed: Option<u64>,
    lookups_tx: mpsc::UnboundedSender<Lookup>,
    lookups_rx: Option<mpsc::UnboundedReceiver<Lookup>>,
}

impl Session {
    pub fn new(state: AppState) -> Self {
        let (lookups_tx, lookups_rx) = mpsc::unbounded_channel();
        Self {
            state,
            reader: LegislationReader::default(),
            map: None,
            shown: None,
            last_status: PipelineStatus::Idle,
            current_run: 0,
            failure_noticed: None,
            lookups_tx,
            lookups_rx: Some(lookups_rx),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut lookups = self
            .lookups_rx
            .take()
            .context("Session is already running")?;
        let mut snapshots = self.state.pipeline.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("Türk Anayasası mevzuatına yapay zeka desteğiyle erişin.");
        println!("{}\n", HELP);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        break;
                    };
                    if !self.handle(Command::parse(&line)) {
                        break;
                    }
                }
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snap = snapshots.borrow_and_update().clone();
                    self.on_snapshot(&snap);
                }
                Some((ticket, articles)) = lookups.recv() => {
                    self.on_lookup(ticket, articles);
                }
            }
        }

        info!("Session closed");
        Ok(())
    }

    /// Returns false when the session should end.
    fn handle(&mut self, cmd: Command) -> bool {
        debug!(cmd = ?cmd, "Command");
        match cmd {
            Command::Ask(question) => self.ask(question),
            Command::Open(index) => self.open_citation(index),
            Command::Close => {
                if self.reader.is_open() {
                    self.reader.close();
                    println!("Okuyucu kapatıldı.");
                }
            }
            Command::ZoomIn => self.with_map(|map| {
                if !map.zoom_in() {
                    println!("Yakınlaştırma sınırında.");
                }
            }),
            Command::ZoomOut => self.with_map(|map| {
                if !map.zoom_out() {
                    println!("Uzaklaştırma sınırında.");
                }
            }),
            Command::Reset => self.with_map(|map| map.reset()),
            Command::Drag { from, to } => self.with_map(|map| {
                map.pointer_down(from);
                map.pointer_move(to);
                // Releasing off the canvas is a pointer leave.
                if map.contains(to) {
                    map.pointer_up();
                } else {
                    map.pointer_leave();
                }
                debug_assert!(!map.is_dragging());
            }),
            Command::ExportMap(path) => match &self.map {
                Some(map) => match map.export_svg(&path) {
                    Ok(()) => println!("Harita kaydedildi: {}", path.display()),
                    Err(e) => {
                        warn!("Map export failed: {:#}", e);
                        println!("Harita kaydedilemedi: {}", e);
                    }
                },
                None => println!("Gösterilecek harita yok."),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
            Command::Invalid(msg) => println!("{}", msg),
        }
        true
    }

    fn ask(&mut self, question: String) {
        if question.trim().is_empty() {
            return;
        }
        if !self.state.pipeline.accepts_submission() {
            debug!("Question ignored while a run is in flight");
            return;
        }
        let pipeline = self.state.pipeline.clone();
        tokio::spawn(async move {
            if let Submission::Succeeded(result) = pipeline.submit(&question).await {
                debug!(citations = result.citations.len(), "Result delivered");
            }
        });
    }

    fn open_citation(&mut self, index: usize) {
        let Some(result) = &self.shown else {
            println!("Önce bir soru sorun.");
            return;
        };
        let Some(citation) = index.checked_sub(1).and_then(|i| result.citations.get(i)) else {
            println!(
                "{} numaralı kaynak yok (toplam {}).",
                index,
                result.citations.len()
            );
            return;
        };

        let target = citation.reader_target();
        info!(
            article = %target.article_id,
            source = %target.source_name,
            score = citation.score,
            "Citation opened"
        );
        if let Some(ticket) = self.reader.open(target) {
            let api = self.state.api.clone();
            let tx = self.lookups_tx.clone();
            tokio::spawn(async move {
                let articles = fetch_articles(api.as_ref(), &ticket.source_name).await;
                // The session may already be gone.
                let _ = tx.send((ticket, articles));
            });
        }
        print!("{}", reader_panel(&self.reader));
    }

    fn with_map(&mut self, f: impl FnOnce(&mut EmbeddingMapView)) {
        match self.map.as_mut() {
            Some(map) => {
                f(map);
                println!("{}", map_summary(map));
            }
            None => println!("Gösterilecek harita yok."),
        }
    }

    fn on_lookup(&mut self, ticket: LookupTicket, articles: Vec<Article>) {
        if self.reader.complete(ticket, articles) {
            print!("{}", reader_panel(&self.reader));
        }
    }

    fn on_snapshot(&mut self, snap: &PipelineSnapshot) {
        if snap.run != self.current_run {
            // A new run discards whatever was on screen, even when all we
            // get to see of it is its final phase.
            self.current_run = snap.run;
            self.shown = None;
            self.map = None;
            self.last_status = PipelineStatus::Idle;
        }

        let status = snap.status();
        match &snap.phase {
            Phase::Idle => {}
            Phase::RetrievingContext | Phase::GeneratingAnswer { .. } => {
                if let Phase::GeneratingAnswer { context_count } = snap.phase {
                    if self.last_status != PipelineStatus::GeneratingAnswer {
                        debug!(context_count, "Generating answer");
                    }
                }
                print!("\r{}", progress_line(snap));
                let _ = std::io::stdout().flush();
            }
            Phase::Succeeded { .. } => match snap.delivered_result() {
                Some(result) => {
                    let already_shown = self
                        .shown
                        .as_ref()
                        .is_some_and(|shown| Arc::ptr_eq(shown, result));
                    if !already_shown {
                        self.install(result.clone());
                    }
                }
                None => {
                    print!("\r{}", progress_line(snap));
                    let _ = std::io::stdout().flush();
                }
            },
            Phase::Failed => {
                if self.failure_noticed != Some(snap.run) {
                    self.failure_noticed = Some(snap.run);
                    println!("\n{}", FAILURE_NOTICE);
                }
            }
        }
        self.last_status = status;
    }

    /// Show a delivered result. The map gets a fresh view, and so a fresh
    /// viewport.
    fn install(&mut self, result: Arc<AnswerResult>) {
        self.map = result
            .visualization
            .clone()
            .map(|payload| EmbeddingMapView::new(payload, self.state.config.canvas));
        println!("\n\n{}", result_panel(&result, self.map.as_ref()));
        self.shown = Some(result);
    }
}
