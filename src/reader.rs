use tracing::{debug, warn};

use crate::api::types::Article;
use crate::api::LegalApi;
use crate::citations::ReaderTarget;

pub const EMPTY_NOTICE: &str = "Bu belge için içerik bulunamadı.";
pub const LOADING_NOTICE: &str = "Yükleniyor...";

/// Identifies one issued lookup. Only the latest ticket may fill the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    seq: u64,
    pub source_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderContent {
    Loading,
    Loaded(Vec<Article>),
}

/// Full-text legislation panel opened from a citation.
#[derive(Debug, Default)]
pub struct LegislationReader {
    target: Option<ReaderTarget>,
    content: Option<ReaderContent>,
    /// Source whose articles are currently held in `content`.
    loaded_source: Option<String>,
    seq: u64,
}

impl LegislationReader {
    pub fn target(&self) -> Option<&ReaderTarget> {
        self.target.as_ref()
    }

    pub fn content(&self) -> Option<&ReaderContent> {
        self.content.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    /// Point the reader at a target. Returns a ticket when the source's
    /// articles have to be fetched; re-targeting within an already loaded
    /// source only moves the highlight.
    pub fn open(&mut self, target: ReaderTarget) -> Option<LookupTicket> {
        let same_source = self.loaded_source.as_deref() == Some(target.source_name.as_str())
            && matches!(self.content, Some(ReaderContent::Loaded(_)));
        let source_name = target.source_name.clone();
        self.target = Some(target);

        if same_source {
            debug!(source = %source_name, "Reader retargeted within loaded source");
            return None;
        }

        // A newer lookup supersedes whatever is still in flight.
        self.seq += 1;
        self.content = Some(ReaderContent::Loading);
        self.loaded_source = None;
        Some(LookupTicket {
            seq: self.seq,
            source_name,
        })
    }

    pub fn close(&mut self) {
        self.target = None;
        self.content = None;
        self.loaded_source = None;
        // Invalidate any lookup still in flight.
        self.seq += 1;
    }

    /// Install a lookup's articles. Stale tickets are dropped.
    pub fn complete(&mut self, ticket: LookupTicket, articles: Vec<Article>) -> bool {
        if ticket.seq != self.seq || self.target.is_none() {
            debug!(source = %ticket.source_name, "Stale legislation response dropped");
            return false;
        }
        self.loaded_source = Some(ticket.source_name);
        self.content = Some(ReaderContent::Loaded(articles));
        true
    }

    /// Index of the highlighted article in the loaded list.
    pub fn target_index(&self) -> Option<usize> {
        let target = self.target.as_ref()?;
        match &self.content {
            Some(ReaderContent::Loaded(articles)) => {
                articles.iter().position(|a| a.id == target.article_id)
            }
            _ => None,
        }
    }
}

/// Fetch a source's articles. Failures never reach the caller: they are
/// logged and the reader falls back to its empty state.
pub async fn fetch_articles(api: &dyn LegalApi, source_name: &str) -> Vec<Article> {
    match api.legislation(source_name).await {
        Ok(articles) => {
            debug!(source = source_name, count = articles.len(), "Legislation loaded");
            articles
        }
        Err(e) => {
            warn!(source = source_name, "Failed to load legislation: {:#}", e);
            Vec::new()
        }
    }
}

/// Article body without its leading `KONU: ...` line.
pub fn clean_text(text: &str) -> &str {
    if text.starts_with("KONU:") {
        match text.find('\n') {
            Some(i) => &text[i + 1..],
            None => text,
        }
    } else {
        text
    }
}
