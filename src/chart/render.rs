use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::NaiveDateTime;

use super::canvas::{Anchor, Canvas, Style, TextStyle};
use super::naming::{artifact_filename, unique_artifact_path};
use super::polar::{axis_range, layout, point_angle, AxisRange, PolarPoint};
use super::stats::{summarize, Summary};
use crate::color::{ChartColor, ChartTheme};
use crate::config::ChartConfig;
use crate::data::model::{ChartArtifact, InspectionMetadata, MeasurementSet, ToleranceBand};
use crate::error::{ChartError, InputError, RenderError};

const WARNING_GLYPH: &str = " ⚠";

// ---------------------------------------------------------------------------
// Point labels
// ---------------------------------------------------------------------------

/// Value label drawn next to one measured point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLabel {
    pub index: usize,
    pub value: f64,
    pub text: String,
    /// Outside `[minimum, maximum]`.
    pub flagged: bool,
}

pub fn point_labels(set: &MeasurementSet, band: &ToleranceBand) -> Vec<PointLabel> {
    set.values()
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            let flagged = band.is_out_of_tolerance(value);
            let mut text = format!("{value:.5}");
            if flagged {
                text.push_str(WARNING_GLYPH);
            }
            PointLabel { index, value, text, flagged }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Figure geometry
// ---------------------------------------------------------------------------

/// Maps (angle, value) to canvas coordinates.
struct PolarFrame {
    cx: f64,
    cy: f64,
    radius: f64,
    axis: AxisRange,
}

impl PolarFrame {
    fn radius_of(&self, value: f64) -> f64 {
        self.radius * self.axis.radius_fraction(value)
    }

    fn at(&self, angle: f64, radius: f64) -> (f64, f64) {
        (self.cx + radius * angle.sin(), self.cy - radius * angle.cos())
    }

    fn project(&self, p: &PolarPoint) -> (f64, f64) {
        self.at(p.angle, self.radius_of(p.value))
    }
}

/// Compose the full figure. Fails only on invalid input.
pub fn build_figure(
    set: &MeasurementSet,
    band: &ToleranceBand,
    meta: &InspectionMetadata,
    config: &ChartConfig,
) -> Result<Canvas, InputError> {
    let summary = summarize(set)?;
    let theme = &config.theme;
    let (w, h) = (config.width, config.height);
    let unit = h / 1500.0;

    let mut canvas = Canvas::new(w, h, theme.background);
    let frame = PolarFrame {
        cx: w * 0.40,
        cy: h * 0.47,
        radius: (h * 0.31).min(w * 0.3),
        axis: axis_range(set, band, config.axis_margin),
    };

    draw_grid(&mut canvas, &frame, set.len(), config, unit);

    // Reference rings
    for (value, color) in [
        (band.nominal, theme.nominal),
        (band.minimum, theme.minimum),
        (band.maximum, theme.maximum),
    ] {
        canvas.circle(frame.cx, frame.cy, frame.radius_of(value), &Style::stroked(color, 5.0 * unit));
    }

    // Measured polygon
    let points = layout(set.values());
    let projected: Vec<(f64, f64)> = points.iter().map(|p| frame.project(p)).collect();
    canvas.polygon(&projected, &Style::filled(theme.measured.with_alpha(0.25)));
    canvas.polygon(&projected, &Style::stroked(theme.measured, 6.0 * unit));
    let marker = Style::filled(theme.marker).with_stroke(ChartColor::WHITE, 2.0 * unit);
    for &(x, y) in &projected[..set.len()] {
        canvas.circle(x, y, 9.0 * unit, &marker);
    }

    // Value labels
    let label_box = Style::filled(ChartColor::BLACK.with_alpha(0.7));
    for (label, point) in point_labels(set, band).iter().zip(&points) {
        let offset = if label.value < frame.axis.upper {
            config.label_offset
        } else {
            -config.label_offset
        };
        let (x, y) = frame.at(point.angle, frame.radius_of(label.value + offset));
        let style = if label.flagged {
            TextStyle::new(22.0 * unit, theme.flagged).bold()
        } else {
            TextStyle::new(22.0 * unit, theme.foreground)
        };
        canvas.boxed_label(x, y, &label.text, &style, &label_box);
    }

    draw_title(&mut canvas, meta, theme, unit);
    draw_legend(&mut canvas, band, theme, unit);
    draw_info_blocks(&mut canvas, meta, &summary, theme, unit);

    Ok(canvas)
}

fn draw_grid(canvas: &mut Canvas, frame: &PolarFrame, n: usize, config: &ChartConfig, unit: f64) {
    let theme = &config.theme;
    let grid = Style::stroked(theme.grid, unit);
    let tick_style = TextStyle::new(16.0 * unit, theme.grid.with_alpha(0.9));

    for tick in frame.axis.ticks(config.grid_rings) {
        let r = frame.radius_of(tick);
        if r <= 0.0 {
            continue;
        }
        canvas.circle(frame.cx, frame.cy, r, &grid);
        // ticks run along the gap between the first two spokes
        let (x, y) = frame.at(std::f64::consts::PI / n.max(2) as f64, r);
        canvas.text(x + 4.0 * unit, y, &format!("{tick:.3}"), &tick_style);
    }

    let spoke_style = TextStyle::new(25.0 * unit, theme.foreground).bold().anchored(Anchor::Middle);
    for i in 0..n {
        let angle = point_angle(i, n);
        canvas.line((frame.cx, frame.cy), frame.at(angle, frame.radius), theme.grid, unit);
        let (x, y) = frame.at(angle, frame.radius + 40.0 * unit);
        canvas.text(x, y + 9.0 * unit, &format!("P{}", i + 1), &spoke_style);
    }
}

fn draw_title(canvas: &mut Canvas, meta: &InspectionMetadata, theme: &ChartTheme, unit: f64) {
    let style = TextStyle::new(40.0 * unit, theme.foreground).bold().anchored(Anchor::Middle);
    let title = format!("Medição de Espessura - Bobina {}", meta.coil_id);
    canvas.text(canvas.width / 2.0, 70.0 * unit, &title, &style);
}

fn draw_legend(canvas: &mut Canvas, band: &ToleranceBand, theme: &ChartTheme, unit: f64) {
    let entries = [
        (theme.nominal, format!("Nominal ({:.5} mm)", band.nominal)),
        (theme.minimum, format!("Mínimo ({:.5} mm)", band.minimum)),
        (theme.maximum, format!("Máximo ({:.5} mm)", band.maximum)),
        (theme.measured, "Valores Medidos".to_string()),
    ];
    let title_style = TextStyle::new(28.0 * unit, theme.foreground).bold();
    let entry_style = TextStyle::new(25.0 * unit, theme.foreground);
    let title = "Referências e Medições";

    let pad = 20.0 * unit;
    let swatch = 50.0 * unit;
    let row_h = 40.0 * unit;
    let text_w = entries
        .iter()
        .map(|(_, t)| entry_style.estimate_width(t) + swatch + pad)
        .fold(title_style.estimate_width(title), f64::max);
    let box_w = text_w + 2.0 * pad;
    let box_h = row_h * (entries.len() as f64 + 1.0) + 2.0 * pad;
    let left = canvas.width - box_w - 40.0 * unit;
    let top = 120.0 * unit;

    canvas.rounded_rect(
        left,
        top,
        box_w,
        box_h,
        10.0 * unit,
        &Style::filled(ChartColor::BLACK.with_alpha(0.9)).with_stroke(theme.foreground, 1.5 * unit),
    );
    canvas.text(left + pad, top + pad + row_h * 0.75, title, &title_style);
    for (i, (color, label)) in entries.iter().enumerate() {
        let y = top + pad + row_h * (i as f64 + 1.5);
        canvas.line((left + pad, y), (left + pad + swatch, y), *color, 5.0 * unit);
        canvas.text(left + 2.0 * pad + swatch, y + 9.0 * unit, label, &entry_style);
    }
}

fn draw_info_blocks(
    canvas: &mut Canvas,
    meta: &InspectionMetadata,
    summary: &Summary,
    theme: &ChartTheme,
    unit: f64,
) {
    let frame = Style::filled(ChartColor::BLACK.with_alpha(0.9)).with_stroke(theme.foreground, 1.5 * unit);
    let margin = 30.0 * unit;
    let bottom = canvas.height - margin;

    let info = info_lines(meta);
    let style = TextStyle::new(22.0 * unit, theme.foreground);
    canvas.text_block(margin, bottom, &info, &style, &frame);

    let stats = stats_lines(summary);
    let style = style.anchored(Anchor::End);
    canvas.text_block(canvas.width - margin, bottom, &stats, &style, &frame);
}

pub fn info_lines(meta: &InspectionMetadata) -> Vec<String> {
    vec![
        format!("OP: {}", meta.operation),
        format!("Bobina: {}", meta.coil_id),
        format!("Máquina: {}", meta.machine),
        format!("Produto: {}", meta.product),
        format!("Data: {}", meta.date),
        format!("Turno: {}", meta.shift),
        format!("Série do Medidor: {}", meta.meter_serial),
        format!("Analista: {}", meta.operator),
        format!("Coordenador: {}", meta.coordinator),
    ]
}

pub fn stats_lines(summary: &Summary) -> Vec<String> {
    vec![
        format!("Média: {:.5} mm", summary.mean),
        format!("Desvio Padrão: {:.5}", summary.std_dev),
        format!("Mín: {:.5} mm", summary.min),
        format!("Máx: {:.5} mm", summary.max),
    ]
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Render the chart for one inspection into `out_dir`, named after the
/// coil and the current local time.
pub fn render_chart(
    set: &MeasurementSet,
    band: &ToleranceBand,
    meta: &InspectionMetadata,
    out_dir: &Path,
    config: &ChartConfig,
) -> Result<ChartArtifact, ChartError> {
    render_chart_at(set, band, meta, out_dir, config, chrono::Local::now().naive_local())
}

pub fn render_chart_at(
    set: &MeasurementSet,
    band: &ToleranceBand,
    meta: &InspectionMetadata,
    out_dir: &Path,
    config: &ChartConfig,
    timestamp: NaiveDateTime,
) -> Result<ChartArtifact, ChartError> {
    let canvas = build_figure(set, band, meta, config)?;
    let png = canvas.into_png(config.scale)?;

    std::fs::create_dir_all(out_dir).map_err(RenderError::from)?;
    let base = artifact_filename(&meta.coil_id, timestamp);

    // Written beside the target and renamed, so a failure leaves no partial PNG.
    let mut tmp = tempfile::NamedTempFile::new_in(out_dir).map_err(RenderError::from)?;
    tmp.write_all(&png).map_err(RenderError::from)?;

    // Another writer may claim the free name between the lookup and the rename.
    let filepath = loop {
        let candidate = unique_artifact_path(out_dir, &base);
        match tmp.persist_noclobber(&candidate) {
            Ok(_) => break candidate,
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                log::debug!("{} taken, trying the next suffix", candidate.display());
                tmp = e.file;
            }
            Err(e) => return Err(RenderError::Io(e.error).into()),
        }
    };

    let filename = filepath
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::info!("Rendered chart {} ({} points)", filepath.display(), set.len());
    Ok(ChartArtifact { filename, filepath })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn band() -> ToleranceBand {
        ToleranceBand { nominal: 0.100, minimum: 0.097, maximum: 0.103 }
    }

    fn meta() -> InspectionMetadata {
        InspectionMetadata {
            coil_id: "B-77".into(),
            operation: "OP123".into(),
            operator: "Ana".into(),
            coordinator: "Rui".into(),
            product: "Folha 0.1".into(),
            machine: "L2".into(),
            shift: "B".into(),
            meter_serial: "MS-9".into(),
            date: "05/11/2024".into(),
        }
    }

    fn small_config() -> ChartConfig {
        ChartConfig { width: 360.0, height: 300.0, ..ChartConfig::default() }
    }

    #[test]
    fn flags_only_strictly_outside_band() {
        let set = MeasurementSet::new(vec![0.097, 0.103, 0.0969, 0.1031, 0.1]).unwrap();
        let flags: Vec<bool> = point_labels(&set, &band()).iter().map(|l| l.flagged).collect();
        assert_eq!(flags, vec![false, false, true, true, false]);
    }

    #[test]
    fn label_text() {
        let set = MeasurementSet::new(vec![0.098, 0.105]).unwrap();
        let labels = point_labels(&set, &band());
        assert_eq!(labels[0].text, "0.09800");
        assert_eq!(labels[1].text, "0.10500 ⚠");
    }

    #[test]
    fn figure_contains_every_block() {
        let set = MeasurementSet::new(vec![0.098, 0.105, 0.099]).unwrap();
        let svg = build_figure(&set, &band(), &meta(), &ChartConfig::default()).unwrap().to_svg();

        assert!(svg.contains("Medição de Espessura - Bobina B-77"));
        assert!(svg.contains("Referências e Medições"));
        assert!(svg.contains("Nominal (0.10000 mm)"));
        assert!(svg.contains("Mínimo (0.09700 mm)"));
        assert!(svg.contains("Máximo (0.10300 mm)"));
        assert!(svg.contains("Valores Medidos"));
        assert!(svg.contains("0.10500 ⚠"));
        assert!(svg.contains(">0.09800<"));
        assert!(svg.contains("Série do Medidor: MS-9"));
        assert!(svg.contains("Média: 0.10067 mm"));
        for p in ["P1", "P2", "P3"] {
            assert!(svg.contains(&format!(">{p}<")), "{p}");
        }
        assert!(!svg.contains(">P4<"));
        // three reference rings
        for c in ["#00ff00", "#ff0000", "#ffa500"] {
            assert!(svg.contains(&format!(r#"fill="none" stroke="{c}""#)), "{c}");
        }
    }

    #[test]
    fn single_point_fails_before_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let set = MeasurementSet::new(vec![0.1]).unwrap();
        let err = render_chart(&set, &band(), &meta(), dir.path(), &small_config()).unwrap_err();
        assert!(matches!(err, ChartError::Input(InputError::TooFewPoints { count: 1 })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn writes_png_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let set = MeasurementSet::new(vec![0.100, 0.102, 0.098, 0.101]).unwrap();
        let ts = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap().and_hms_opt(8, 30, 0).unwrap();

        let art = render_chart_at(&set, &band(), &meta(), dir.path(), &small_config(), ts).unwrap();
        assert_eq!(art.filename, "grafico_bobina_B-77_20241105_083000.png");
        assert_eq!(art.filepath, dir.path().join(&art.filename));

        let img = image::open(&art.filepath).unwrap();
        assert_eq!((img.width(), img.height()), (360, 300));

        let again = render_chart_at(&set, &band(), &meta(), dir.path(), &small_config(), ts).unwrap();
        assert_eq!(again.filename, "grafico_bobina_B-77_20241105_083000_2.png");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn concurrent_writers_never_share_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let set = MeasurementSet::new(vec![0.100, 0.102, 0.098]).unwrap();
        let ts = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let config = small_config();

        let mut names: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        render_chart_at(&set, &band(), &meta(), dir.path(), &config, ts)
                            .unwrap()
                            .filename
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }

    #[test]
    fn existing_chart_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let set = MeasurementSet::new(vec![0.100, 0.102, 0.098]).unwrap();
        let ts = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let taken = dir.path().join("grafico_bobina_B-77_20241105_090000.png");
        std::fs::write(&taken, b"earlier").unwrap();

        let art = render_chart_at(&set, &band(), &meta(), dir.path(), &small_config(), ts).unwrap();
        assert_eq!(art.filename, "grafico_bobina_B-77_20241105_090000_2.png");
        assert_eq!(std::fs::read(&taken).unwrap(), b"earlier");
    }

    #[test]
    fn inputs_untouched() {
        let set = MeasurementSet::new(vec![0.098, 0.105, 0.099]).unwrap();
        let before = set.clone();
        let _ = build_figure(&set, &band(), &meta(), &small_config()).unwrap();
        assert_eq!(set, before);
    }
}
