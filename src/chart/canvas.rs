use std::fmt::Write as FmtWrite;

use resvg::tiny_skia;
use resvg::usvg::{self, fontdb};

use crate::color::ChartColor;
use crate::error::{RenderError, RenderResult};

// ---------------------------------------------------------------------------
// Styles
// ---------------------------------------------------------------------------

/// Fill + stroke for closed shapes.
#[derive(Debug, Clone, Default)]
pub struct Style {
    pub fill: Option<ChartColor>,
    pub stroke: Option<ChartColor>,
    pub stroke_width: f64,
}

impl Style {
    pub fn filled(color: ChartColor) -> Self {
        Self { fill: Some(color), ..Default::default() }
    }

    pub fn stroked(color: ChartColor, width: f64) -> Self {
        Self { stroke: Some(color), stroke_width: width, ..Default::default() }
    }

    pub fn with_stroke(mut self, color: ChartColor, width: f64) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(&self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size: f64,
    pub color: ChartColor,
    pub bold: bool,
    pub anchor: Anchor,
}

impl TextStyle {
    pub fn new(size: f64, color: ChartColor) -> Self {
        Self { size, color, bold: false, anchor: Anchor::Start }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Rough advance width; the embedded sans face averages ~0.56 em.
    pub fn estimate_width(&self, content: &str) -> f64 {
        let em = if self.bold { 0.6 } else { 0.56 };
        content.chars().count() as f64 * self.size * em
    }
}

// ---------------------------------------------------------------------------
// Canvas – one figure, owned by a single render call
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Element {
    Rect { x: f64, y: f64, w: f64, h: f64, rx: f64, style: Style },
    Circle { cx: f64, cy: f64, r: f64, style: Style },
    Line { x1: f64, y1: f64, x2: f64, y2: f64, color: ChartColor, width: f64 },
    Polygon { points: Vec<(f64, f64)>, style: Style },
    Text { x: f64, y: f64, content: String, style: TextStyle },
}

/// Retained-mode SVG scene. Coordinates are y-down user units; the figure
/// is rasterised and dropped by [`Canvas::into_png`].
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    background: ChartColor,
    elements: Vec<Element>,
}

impl Canvas {
    pub fn new(width: f64, height: f64, background: ChartColor) -> Self {
        Self { width, height, background, elements: Vec::new() }
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        self.elements.push(Element::Rect { x, y, w, h, rx: 0.0, style: style.clone() });
    }

    pub fn rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rx: f64, style: &Style) {
        self.elements.push(Element::Rect { x, y, w, h, rx, style: style.clone() });
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) {
        self.elements.push(Element::Circle { cx, cy, r, style: style.clone() });
    }

    pub fn line(&mut self, (x1, y1): (f64, f64), (x2, y2): (f64, f64), color: ChartColor, width: f64) {
        self.elements.push(Element::Line { x1, y1, x2, y2, color, width });
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], style: &Style) {
        self.elements.push(Element::Polygon { points: points.to_vec(), style: style.clone() });
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.elements.push(Element::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
        });
    }

    /// Text centred on `(x, y)` over a padded box.
    pub fn boxed_label(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, frame: &Style) {
        let w = style.estimate_width(content);
        let pad = style.size * 0.25;
        self.rect(x - w / 2.0 - pad, y - style.size * 0.7 - pad, w + 2.0 * pad, style.size * 1.4 + 2.0 * pad, frame);
        let centred = style.clone().anchored(Anchor::Middle);
        self.text(x, y + style.size * 0.35, content, &centred);
    }

    /// Multi-line text block inside a rounded frame. `(x, y)` is the bottom
    /// corner on the side given by the anchor (`Start` = left, `End` = right).
    pub fn text_block(&mut self, x: f64, y: f64, lines: &[String], style: &TextStyle, frame: &Style) {
        let line_h = style.size * 1.4;
        let pad = style.size;
        let w = lines.iter().map(|l| style.estimate_width(l)).fold(0.0, f64::max) + 2.0 * pad;
        let h = line_h * lines.len() as f64 + 2.0 * pad;
        let left = match style.anchor {
            Anchor::End => x - w,
            Anchor::Middle => x - w / 2.0,
            Anchor::Start => x,
        };
        let top = y - h;
        self.rounded_rect(left, top, w, h, pad * 0.6, frame);

        let text_style = style.clone().anchored(Anchor::Start);
        for (i, line) in lines.iter().enumerate() {
            let baseline = top + pad + line_h * (i as f64 + 0.75);
            self.text(left + pad, baseline, line, &text_style);
        }
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(16 * 1024);
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );
        let _ = writeln!(
            out,
            r#"<rect width="{}" height="{}" fill="{}" />"#,
            self.width,
            self.height,
            self.background.to_svg()
        );
        for elem in &self.elements {
            write_element(&mut out, elem);
        }
        out.push_str("</svg>\n");
        out
    }

    /// Rasterise at `scale` and encode as PNG. Consumes the figure.
    pub fn into_png(self, scale: f64) -> RenderResult<Vec<u8>> {
        svg_to_png(&self.to_svg(), scale)
    }
}

fn write_element(out: &mut String, elem: &Element) {
    match elem {
        Element::Rect { x, y, w, h, rx, style } => {
            let _ = write!(out, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#);
            if *rx > 0.0 {
                let _ = write!(out, r#" rx="{rx:.2}""#);
            }
            write_style(out, style);
        }
        Element::Circle { cx, cy, r, style } => {
            let _ = write!(out, r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}""#);
            write_style(out, style);
        }
        Element::Line { x1, y1, x2, y2, color, width } => {
            let _ = write!(
                out,
                r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{}" stroke-opacity="{:.3}" stroke-width="{width:.2}" />"#,
                color.to_svg(),
                color.a,
            );
            out.push('\n');
        }
        Element::Polygon { points, style } => {
            out.push_str(r#"<polygon points=""#);
            for (i, (x, y)) in points.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{x:.2},{y:.2}");
            }
            out.push('"');
            out.push_str(r#" stroke-linejoin="round""#);
            write_style(out, style);
        }
        Element::Text { x, y, content, style } => {
            let _ = write!(
                out,
                r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{:.1}" fill="{}" fill-opacity="{:.3}" text-anchor="{}""#,
                style.size,
                style.color.to_svg(),
                style.color.a,
                style.anchor.as_str(),
            );
            if style.bold {
                out.push_str(r#" font-weight="bold""#);
            }
            out.push('>');
            escape_xml(out, content);
            out.push_str("</text>\n");
        }
    }
}

fn write_style(out: &mut String, style: &Style) {
    match style.fill {
        Some(c) => {
            let _ = write!(out, r#" fill="{}" fill-opacity="{:.3}""#, c.to_svg(), c.a);
        }
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(c) = style.stroke {
        let _ = write!(
            out,
            r#" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.2}""#,
            c.to_svg(),
            c.a,
            style.stroke_width
        );
    }
    out.push_str(" />\n");
}

fn escape_xml(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

// ---------------------------------------------------------------------------
// Fonts and rasterisation
// ---------------------------------------------------------------------------

/// Load the faces bundled with egui and return the text family name.
/// The emoji faces only serve as fallback for glyphs such as ⚠.
pub fn load_chart_fonts(db: &mut fontdb::Database) -> RenderResult<String> {
    db.load_font_data(epaint_default_fonts::UBUNTU_LIGHT.to_vec());
    let family = db
        .faces()
        .next()
        .and_then(|face| face.families.first())
        .map(|(name, _)| name.clone())
        .ok_or_else(|| RenderError::Font("embedded text face did not load".into()))?;
    db.load_font_data(epaint_default_fonts::NOTO_EMOJI_REGULAR.to_vec());
    db.load_font_data(epaint_default_fonts::EMOJI_ICON.to_vec());
    db.set_sans_serif_family(family.clone());
    Ok(family)
}

/// Convert an SVG document to PNG bytes, scaling user units by `scale`.
pub fn svg_to_png(svg: &str, scale: f64) -> RenderResult<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.font_family = load_chart_fonts(opt.fontdb_mut())?;

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

    let scale = scale as f32;
    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;
    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| RenderError::Png(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_has_background_and_escaped_text() {
        let mut canvas = Canvas::new(100.0, 50.0, ChartColor::BLACK);
        canvas.text(1.0, 2.0, "a<b & \"c\"", &TextStyle::new(10.0, ChartColor::WHITE).bold());
        canvas.circle(5.0, 5.0, 2.0, &Style::stroked(ChartColor::WHITE, 1.0));
        let svg = canvas.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r##"fill="#000000""##));
        assert!(svg.contains("a&lt;b &amp; &quot;c&quot;"));
        assert!(svg.contains(r#"font-weight="bold""#));
        assert!(svg.contains(r#"<circle cx="5.00" cy="5.00" r="2.00" fill="none""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn fonts_load() {
        let mut db = fontdb::Database::new();
        let family = load_chart_fonts(&mut db).unwrap();
        assert!(!family.is_empty());
        assert!(db.len() >= 3);
    }

    #[test]
    fn rasterises_to_png() {
        let mut canvas = Canvas::new(40.0, 20.0, ChartColor::BLACK);
        canvas.rect(5.0, 5.0, 10.0, 10.0, &Style::filled(ChartColor::WHITE));
        let png = canvas.into_png(2.0).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (80, 40));
    }
}
