use crate::citations::Citation;
use crate::map::EmbeddingMapView;
use crate::pipeline::{AnswerResult, PipelineSnapshot};
use crate::reader::{clean_text, LegislationReader, ReaderContent, EMPTY_NOTICE, LOADING_NOTICE};

pub const MAP_UNAVAILABLE: &str =
    "⚠️ Anlamsal Analiz Haritası verisi yüklenemedi. (Backend veri dönüşü boş)";

const BAR_WIDTH: usize = 30;
const EXCERPT_LINES: usize = 4;
const EXCERPT_LINE_CHARS: usize = 96;

pub fn progress_line(snap: &PipelineSnapshot) -> String {
    let progress = usize::from(snap.progress.min(100));
    let filled = progress * BAR_WIDTH / 100;
    format!(
        "{} [{}{}] %{}",
        snap.stage,
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        progress
    )
}

/// Answer, citation cards, then the map summary or its fallback notice.
pub fn result_panel(result: &AnswerResult, map: Option<&EmbeddingMapView>) -> String {
    let mut out = String::from("── Yanıt ──\n");
    out.push_str(result.answer.trim_end());
    out.push('\n');

    if !result.citations.is_empty() {
        out.push_str("\n── Kaynak Maddeler ──\n");
        for (i, citation) in result.citations.iter().enumerate() {
            out.push_str(&citation_card(i + 1, citation));
        }
        out.push_str("(Okumak için :open N)\n");
    }

    out.push('\n');
    match map {
        Some(map) => out.push_str(&map_summary(map)),
        None => out.push_str(MAP_UNAVAILABLE),
    }
    out.push('\n');
    out
}

pub fn citation_card(index: usize, citation: &Citation) -> String {
    let mut card = format!("[{}] {}  ·  {}\n", index, citation.title(), citation.page_label());
    if !citation.is_primary() {
        card.push_str(&format!("    <{}>\n", citation.source_name));
    }
    if let Some(topic) = &citation.topic {
        card.push_str(&format!("    {}\n", topic));
    }
    for line in clamp_lines(&citation.text) {
        card.push_str("    ");
        card.push_str(&line);
        card.push('\n');
    }
    card
}

pub fn map_summary(map: &EmbeddingMapView) -> String {
    let pan = map.viewport().pan;
    format!(
        "── Anlamsal Analiz Haritası ── {} işaret · Ölçek: {} · Kaydırma: ({:.0}, {:.0}) (:map DOSYA ile SVG kaydedin)",
        map.payload().marker_count(),
        map.scale_label(),
        pan.x,
        pan.y
    )
}

pub fn reader_panel(reader: &LegislationReader) -> String {
    let Some(target) = reader.target() else {
        return String::new();
    };
    let mut out = format!("── {} - Mevzuat Okuyucu ──\n", target.source_name);

    match reader.content() {
        None | Some(ReaderContent::Loading) => {
            out.push_str(LOADING_NOTICE);
            out.push('\n');
        }
        Some(ReaderContent::Loaded(articles)) if articles.is_empty() => {
            out.push_str(EMPTY_NOTICE);
            out.push('\n');
        }
        Some(ReaderContent::Loaded(articles)) => {
            let highlighted = reader.target_index();
            for (i, article) in articles.iter().enumerate() {
                let marker = if highlighted == Some(i) { "▶" } else { " " };
                out.push_str(&format!("{} MADDE {}", marker, article.madde_no));
                if let Some(konu) = &article.metadata.konu {
                    out.push_str(&format!("  {}", konu.to_uppercase()));
                }
                out.push('\n');
                for line in clean_text(&article.text).lines() {
                    out.push_str("  │ ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            if highlighted.is_some() {
                out.push_str("İlgili madde otomatik olarak vurgulanmıştır.\n");
            }
        }
    }
    out
}

/// At most four display lines of an excerpt, wrapped on whitespace.
fn clamp_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut truncated = false;

    for word in text.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + 1;
        if !current.is_empty() && needed > EXCERPT_LINE_CHARS {
            lines.push(std::mem::take(&mut current));
            if lines.len() == EXCERPT_LINES {
                truncated = true;
                break;
            }
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !truncated && !current.is_empty() {
        lines.push(current);
    }
    if truncated {
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{
        Article, ArticleMetadata, ContextDocument, MapPoint, Ordinal, QueryPoint, SourceMetadata,
    };
    use crate::citations::{self, ReaderTarget};
    use crate::map::viewport::CanvasSize;
    use crate::map::VisualizationPayload;
    use crate::pipeline::Phase;

    fn result(with_map: bool) -> AnswerResult {
        let context = vec![
            ContextDocument {
                madde_no: Ordinal::Number(10),
                text: "Herkes kanun önünde eşittir.".to_string(),
                metadata: SourceMetadata {
                    page: Some(Ordinal::Number(5)),
                    ..SourceMetadata::default()
                },
                score: 0.9,
            },
            ContextDocument {
                madde_no: Ordinal::Number(3),
                text: "Ayrımcılık yasaktır.".to_string(),
                metadata: SourceMetadata {
                    source: Some("TIHEK Kanunu".to_string()),
                    ..SourceMetadata::default()
                },
                score: 0.7,
            },
        ];
        AnswerResult {
            answer: "Eşitlik ilkesi.".to_string(),
            citations: citations::from_retrieval(&context),
            visualization: with_map.then(|| VisualizationPayload {
                points: vec![
                    MapPoint {
                        x: 0.1,
                        y: 0.2,
                        madde: Ordinal::Number(10),
                        source: "Anayasa".to_string(),
                    },
                    MapPoint {
                        x: 0.8,
                        y: 0.6,
                        madde: Ordinal::Number(3),
                        source: "TIHEK Kanunu".to_string(),
                    },
                ],
                query: Some(QueryPoint { x: 0.3, y: 0.3 }),
            }),
        }
    }

    #[test]
    fn test_result_panel_with_map() {
        let result = result(true);
        let map = result
            .visualization
            .clone()
            .map(|p| EmbeddingMapView::new(p, CanvasSize::default()));
        let panel = result_panel(&result, map.as_ref());

        let first = panel.find("[1] MADDE 10").unwrap();
        let second = panel.find("[2] TIHEK Kanunu Md. 3").unwrap();
        assert!(first < second);
        assert!(panel.contains("Sayfa 5 (Oku)"));
        assert!(panel.contains("<TIHEK Kanunu>"));
        assert!(panel.contains("3 işaret"));
        assert!(panel.contains("Ölçek: 1.0x"));
        assert!(panel.contains("Kaydırma: (0, 0)"));
        assert!(!panel.contains(MAP_UNAVAILABLE));
    }

    #[test]
    fn test_result_panel_without_map_shows_notice() {
        let result = result(false);
        let panel = result_panel(&result, None);
        assert!(panel.contains("Eşitlik ilkesi."));
        assert!(panel.contains("[2] TIHEK Kanunu Md. 3"));
        assert!(panel.contains(MAP_UNAVAILABLE));
    }

    #[test]
    fn test_progress_line() {
        let snap = PipelineSnapshot {
            phase: Phase::RetrievingContext,
            progress: 50,
            stage: "Veritabanı taranıyor...".to_string(),
            run: 1,
        };
        let line = progress_line(&snap);
        assert!(line.starts_with("Veritabanı taranıyor... ["));
        assert!(line.ends_with("] %50"));
        assert_eq!(line.matches('█').count(), 15);
    }

    #[test]
    fn test_excerpt_clamped_to_four_lines() {
        let text = "kelime ".repeat(200);
        let lines = clamp_lines(&text);
        assert_eq!(lines.len(), 4);
        assert!(lines[3].ends_with('…'));
        assert_eq!(clamp_lines("kısa metin"), vec!["kısa metin".to_string()]);
    }

    #[test]
    fn test_reader_panel_states() {
        let mut reader = LegislationReader::default();
        assert!(reader_panel(&reader).is_empty());

        let ticket = reader
            .open(ReaderTarget {
                article_id: "MADDE 2".to_string(),
                source_name: "Anayasa".to_string(),
            })
            .unwrap();
        assert!(reader_panel(&reader).contains(LOADING_NOTICE));

        reader.complete(ticket, vec![]);
        assert!(reader_panel(&reader).contains(EMPTY_NOTICE));
    }

    #[test]
    fn test_reader_panel_highlights_target() {
        let mut reader = LegislationReader::default();
        let ticket = reader
            .open(ReaderTarget {
                article_id: "MADDE 2".to_string(),
                source_name: "Anayasa".to_string(),
            })
            .unwrap();
        let articles = vec![
            Article {
                id: "MADDE 1".to_string(),
                madde_no: Ordinal::Number(1),
                text: "KONU: Devletin şekli\nTürkiye Devleti bir Cumhuriyettir.".to_string(),
                metadata: ArticleMetadata {
                    konu: Some("Devletin şekli".to_string()),
                },
            },
            Article {
                id: "MADDE 2".to_string(),
                madde_no: Ordinal::Number(2),
                text: "Türkiye Cumhuriyeti... bir hukuk Devletidir.".to_string(),
                metadata: ArticleMetadata::default(),
            },
        ];
        reader.complete(ticket, articles);
        let panel = reader_panel(&reader);
        assert!(panel.contains("  MADDE 1  DEVLETIN ŞEKLI"));
        assert!(panel.contains("▶ MADDE 2"));
        assert!(!panel.contains("KONU:"));
    }
}
