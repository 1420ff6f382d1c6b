use crate::api::types::{ContextDocument, Ordinal};

/// Source name of the primary constitutional document. Excerpts without a
/// source belong to it.
pub const PRIMARY_SOURCE: &str = "Anayasa";

/// Which article the reader should open, and in which legislation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderTarget {
    pub article_id: String,
    pub source_name: String,
}

/// A displayed reference to one retrieved excerpt.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub article: Ordinal,
    pub text: String,
    pub source_name: String,
    pub page: Option<Ordinal>,
    pub topic: Option<String>,
    pub score: f64,
}

impl Citation {
    pub fn from_context(doc: &ContextDocument) -> Self {
        let source_name = doc
            .metadata
            .source
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(PRIMARY_SOURCE)
            .to_string();

        Self {
            article: doc.madde_no.clone(),
            text: doc.text.clone(),
            source_name,
            page: doc.metadata.page.clone(),
            topic: doc.metadata.konu.clone(),
            score: doc.score,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.source_name == PRIMARY_SOURCE
    }

    /// Card heading: `MADDE 10` for the constitution, `TIHEK Kanunu Md. 3`
    /// for everything else.
    pub fn title(&self) -> String {
        if self.is_primary() {
            format!("MADDE {}", self.article)
        } else {
            format!("{} Md. {}", self.source_name, self.article)
        }
    }

    pub fn page_label(&self) -> String {
        match &self.page {
            Some(page) => format!("Sayfa {} (Oku)", page),
            None => "Sayfa ? (Oku)".to_string(),
        }
    }

    /// The reader target a click on this citation opens.
    pub fn reader_target(&self) -> ReaderTarget {
        ReaderTarget {
            article_id: article_anchor(&self.source_name, &self.article),
            source_name: self.source_name.clone(),
        }
    }
}

/// Article ids as the legislation service assigns them: `MADDE 3` for the
/// constitution, `TIHEK Kanunu MADDE 3` for other sources.
pub fn article_anchor(source_name: &str, article: &Ordinal) -> String {
    if source_name == PRIMARY_SOURCE {
        format!("MADDE {}", article)
    } else {
        format!("{} MADDE {}", source_name, article)
    }
}

/// Citation cards, in retrieval order.
pub fn from_retrieval(context: &[ContextDocument]) -> Vec<Citation> {
    context.iter().map(Citation::from_context).collect()
}
