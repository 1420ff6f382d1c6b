use std::fmt;

use serde::{Deserialize, Serialize};

/// Article numbers and page numbers arrive as integers, but the retrieval
/// service falls back to `"?"` when the chunk carries no number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ordinal {
    Number(i64),
    Text(String),
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ordinal::Number(n) => write!(f, "{}", n),
            Ordinal::Text(s) => f.write_str(s),
        }
    }
}

impl Default for Ordinal {
    fn default() -> Self {
        Ordinal::Text("?".to_string())
    }
}

/// Source metadata attached to a retrieved excerpt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Ordinal>,
    /// Topic tag (`konu`) of the article.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub konu: Option<String>,
    /// Everything else the service sends; echoed back untouched in the
    /// generate request.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One retrieved statute excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    #[serde(default)]
    pub madde_no: Ordinal,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: SourceMetadata,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct RetrieveRequest<'a> {
    pub question: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default)]
    pub context_docs: Vec<ContextDocument>,
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub question: &'a str,
    pub context_docs: &'a [ContextDocument],
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub vis_data: Option<VisData>,
}

/// Raw `vis_data` block of the generate response.
#[derive(Debug, Clone, Deserialize)]
pub struct VisData {
    #[serde(default)]
    pub map_points: Option<Vec<MapPoint>>,
    #[serde(default)]
    pub query_point: Option<QueryPoint>,
}

/// A document projected into the 2-D map, coordinates normalized to [0,1].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub madde: Ordinal,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct QueryPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub struct LegislationResponse {
    /// Missing when the service reports `{"error": ...}` instead.
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// A full article as served to the reader.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Article {
    pub id: String,
    #[serde(default)]
    pub madde_no: Ordinal,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: ArticleMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArticleMetadata {
    #[serde(default)]
    pub konu: Option<String>,
}
