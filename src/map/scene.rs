use std::borrow::Cow;
use std::fmt;

use super::viewport::{CanvasSize, Vec2, Viewport};
use super::VisualizationPayload;
use crate::citations::PRIMARY_SOURCE;

pub const PRIMARY_COLOR: &str = "#ef4444";
pub const SECONDARY_COLOR: &str = "#3b82f6";
const QUERY_COLOR: &str = "#000000";
const GRID_COLOR: &str = "#dddddd";

/// Document labels appear only above this scale.
pub const LABEL_MIN_SCALE: f64 = 1.5;

const POINT_RADIUS: f64 = 3.0;
const POINT_FONT: f64 = 12.0;
const QUERY_RADIUS: f64 = 4.0;
const QUERY_RING_RADIUS: f64 = 12.0;
const QUERY_FONT: f64 = 10.0;
pub const QUERY_LABEL: &str = "Sorgu Konumu";

/// Color of a document marker, decided by its source name.
pub fn source_color(source: &str) -> &'static str {
    if source.contains(PRIMARY_SOURCE) {
        PRIMARY_COLOR
    } else {
        SECONDARY_COLOR
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    Document { color: &'static str },
    /// Filled center plus a dashed outer ring.
    Query { ring_radius: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    /// Offset from the marker center, in logical units.
    pub offset: Vec2,
    pub font_size: f64,
    pub halo_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    /// Logical position (before the viewport transform).
    pub at: Vec2,
    pub radius: f64,
    pub stroke_width: f64,
    pub label: Option<Label>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLine {
    pub from: Vec2,
    pub to: Vec2,
    pub stroke_width: f64,
}

/// Everything needed to draw one frame of the map. Grid and markers live in
/// logical space under the viewport transform; the legend and the scale
/// indicator are drawn in screen space.
#[derive(Debug, Clone)]
pub struct MapScene {
    pub canvas: CanvasSize,
    pub viewport: Viewport,
    pub grid: Vec<GridLine>,
    pub markers: Vec<Marker>,
    pub scale_label: String,
}

impl MapScene {
    pub fn build(payload: &VisualizationPayload, canvas: CanvasSize, viewport: Viewport) -> Self {
        let s = viewport.scale;
        let center = canvas.center();

        let grid = vec![
            GridLine {
                from: Vec2::new(0.0, center.y),
                to: Vec2::new(canvas.width, center.y),
                stroke_width: 1.0 / s,
            },
            GridLine {
                from: Vec2::new(center.x, 0.0),
                to: Vec2::new(center.x, canvas.height),
                stroke_width: 1.0 / s,
            },
        ];

        let show_labels = s > LABEL_MIN_SCALE;
        let mut markers: Vec<Marker> = payload
            .points
            .iter()
            .map(|p| Marker {
                kind: MarkerKind::Document {
                    color: source_color(&p.source),
                },
                at: canvas.place(p.x, p.y),
                radius: POINT_RADIUS / s.sqrt(),
                stroke_width: 0.0,
                label: show_labels.then(|| Label {
                    text: p.madde.to_string(),
                    offset: Vec2::new(4.0 / s, 2.0 / s),
                    font_size: POINT_FONT / s,
                    halo_width: 1.0 / s,
                }),
                title: Some(format!("{} - Madde {}", p.source, p.madde)),
            })
            .collect();

        // Query marker goes last so it is drawn on top.
        if let Some(q) = payload.query {
            markers.push(Marker {
                kind: MarkerKind::Query {
                    ring_radius: QUERY_RING_RADIUS / s,
                },
                at: canvas.place(q.x, q.y),
                radius: QUERY_RADIUS / s,
                stroke_width: 1.5 / s,
                label: Some(Label {
                    text: QUERY_LABEL.to_string(),
                    offset: Vec2::new(8.0 / s, 4.0 / s),
                    font_size: QUERY_FONT / s,
                    halo_width: 2.0 / s,
                }),
                title: None,
            });
        }

        Self {
            canvas,
            viewport,
            grid,
            markers,
            scale_label: viewport.scale_label(),
        }
    }

    pub fn to_svg(&self) -> String {
        self.to_string()
    }
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn write_label(f: &mut fmt::Formatter<'_>, label: &Label, fill: &str) -> fmt::Result {
    writeln!(
        f,
        r##"      <text x="{}" y="{}" font-size="{}" font-weight="bold" fill="{}" stroke="#ffffff" stroke-width="{}" paint-order="stroke" pointer-events="none">{}</text>"##,
        label.offset.x,
        label.offset.y,
        label.font_size,
        fill,
        label.halo_width,
        escape(&label.text)
    )
}

impl fmt::Display for MapScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = (self.canvas.width, self.canvas.height);
        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#
        )?;
        writeln!(f, r##"  <rect width="{w}" height="{h}" fill="#f9fafb"/>"##)?;

        writeln!(
            f,
            r#"  <g transform="translate({}, {}) scale({})">"#,
            self.viewport.pan.x, self.viewport.pan.y, self.viewport.scale
        )?;
        for line in &self.grid {
            writeln!(
                f,
                r#"    <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" stroke-dasharray="4 4"/>"#,
                line.from.x, line.from.y, line.to.x, line.to.y, GRID_COLOR, line.stroke_width
            )?;
        }

        for marker in &self.markers {
            writeln!(
                f,
                r#"    <g transform="translate({}, {})">"#,
                marker.at.x, marker.at.y
            )?;
            match &marker.kind {
                MarkerKind::Document { color } => {
                    writeln!(
                        f,
                        r#"      <circle r="{}" fill="{}" opacity="0.6"/>"#,
                        marker.radius, color
                    )?;
                    if let Some(label) = &marker.label {
                        write_label(f, label, "#333333")?;
                    }
                }
                MarkerKind::Query { ring_radius } => {
                    writeln!(
                        f,
                        r##"      <circle r="{}" fill="{}" stroke="#ffffff" stroke-width="{}"/>"##,
                        marker.radius, QUERY_COLOR, marker.stroke_width
                    )?;
                    writeln!(
                        f,
                        r#"      <circle r="{}" fill="none" stroke="{}" stroke-width="{}" opacity="0.3" stroke-dasharray="2 2"/>"#,
                        ring_radius,
                        QUERY_COLOR,
                        marker.stroke_width / 1.5
                    )?;
                    if let Some(label) = &marker.label {
                        write_label(f, label, QUERY_COLOR)?;
                    }
                }
            }
            if let Some(title) = &marker.title {
                writeln!(f, "      <title>{}</title>", escape(title))?;
            }
            writeln!(f, "    </g>")?;
        }
        writeln!(f, "  </g>")?;

        // Legend, fixed in screen space.
        writeln!(f, r#"  <g transform="translate(20, 20)">"#)?;
        writeln!(
            f,
            r##"    <rect x="-5" y="-5" width="100" height="60" fill="#ffffff" opacity="0.8" rx="4"/>"##
        )?;
        writeln!(
            f,
            r##"    <circle cx="0" cy="0" r="4" fill="{}" opacity="0.6"/><text x="10" y="4" font-size="10" fill="#666666">Anayasa</text>"##,
            PRIMARY_COLOR
        )?;
        writeln!(
            f,
            r##"    <circle cx="0" cy="15" r="4" fill="{}" opacity="0.6"/><text x="10" y="19" font-size="10" fill="#666666">İnsan Hakları</text>"##,
            SECONDARY_COLOR
        )?;
        writeln!(
            f,
            r##"    <circle cx="0" cy="35" r="3" fill="{}" stroke="#ffffff" stroke-width="1"/><text x="12" y="38" font-size="10" font-weight="bold" fill="#000000">Sorgu</text>"##,
            QUERY_COLOR
        )?;
        writeln!(f, "  </g>")?;

        writeln!(
            f,
            r##"  <text x="{}" y="{}" text-anchor="end" font-size="10" fill="#9ca3af">Scale: {}</text>"##,
            w - 8.0,
            h - 8.0,
            self.scale_label
        )?;
        writeln!(f, "</svg>")
    }
}
