use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

use coil_thickness::chart::polar::{axis_range, layout, AxisRange};
use coil_thickness::chart::render::point_labels;
use coil_thickness::chart::stats::summarize;
use coil_thickness::data::form::Submission;

use crate::state::AppState;

/// Segments used to draw a reference ring.
const RING_SEGMENTS: usize = 180;

// ---------------------------------------------------------------------------
// Central panel – saved chart or live preview
// ---------------------------------------------------------------------------

pub fn result_view(ui: &mut Ui, state: &mut AppState) {
    if state.chart_png.is_some() {
        saved_chart(ui, state);
        return;
    }

    match state.form.validate() {
        Ok(submission) => live_preview(ui, state, &submission),
        Err(e) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading(format!("Preencha o formulário para ver o gráfico\n({e})"));
            });
        }
    }
}

fn saved_chart(ui: &mut Ui, state: &mut AppState) {
    let mut close = false;
    ui.horizontal(|ui: &mut Ui| {
        if let Some(outcome) = &state.outcome {
            let s = &outcome.summary;
            ui.strong(&outcome.artifact.filename);
            ui.separator();
            ui.label(format!(
                "Média {:.5} mm  •  Desvio {:.5}  •  Mín {:.5}  •  Máx {:.5}",
                s.mean, s.std_dev, s.min, s.max
            ));
            if !outcome.flagged.is_empty() {
                let names: Vec<String> = outcome.flagged.iter().map(|i| format!("P{}", i + 1)).collect();
                ui.label(
                    RichText::new(format!("⚠ fora da tolerância: {}", names.join(", ")))
                        .color(Color32::RED),
                );
            }
        }
        if ui.button("Fechar").clicked() {
            close = true;
        }
    });
    ui.separator();

    if let Some((uri, bytes)) = &state.chart_png {
        egui::ScrollArea::both().show(ui, |ui: &mut Ui| {
            ui.add(egui::Image::from_bytes(uri.clone(), bytes.clone()).shrink_to_fit());
        });
    }

    if close {
        state.close_result();
    }
}

/// Cartesian position of a polar sample in the preview (north-up, clockwise).
fn to_xy(angle: f64, value: f64, axis: &AxisRange) -> [f64; 2] {
    let r = axis.radius_fraction(value);
    [r * angle.sin(), r * angle.cos()]
}

fn ring(value: f64, axis: &AxisRange) -> PlotPoints<'static> {
    (0..=RING_SEGMENTS)
        .map(|i| to_xy(std::f64::consts::TAU * i as f64 / RING_SEGMENTS as f64, value, axis))
        .collect()
}

/// Interactive approximation of the exported chart, redrawn while typing.
fn live_preview(ui: &mut Ui, state: &AppState, submission: &Submission) {
    let Submission { metadata, band, measurements } = submission;
    let chart = &state.config.chart;
    let theme = &chart.theme;
    let axis = axis_range(measurements, band, chart.axis_margin);

    if let Ok(s) = summarize(measurements) {
        ui.label(format!(
            "Bobina {}  •  Média {:.5} mm  •  Desvio {:.5}",
            metadata.coil_id, s.mean, s.std_dev
        ));
    }

    let points = layout(measurements.values());
    let polygon: Vec<[f64; 2]> = points.iter().map(|p| to_xy(p.angle, p.value, &axis)).collect();
    let labels = point_labels(measurements, band);

    Plot::new("polar_preview")
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (value, color, name) in [
                (band.nominal, theme.nominal, format!("Nominal ({:.5} mm)", band.nominal)),
                (band.minimum, theme.minimum, format!("Mínimo ({:.5} mm)", band.minimum)),
                (band.maximum, theme.maximum, format!("Máximo ({:.5} mm)", band.maximum)),
            ] {
                plot_ui.line(Line::new(ring(value, &axis)).name(name).color(color.to_color32()).width(2.5));
            }

            plot_ui.polygon(
                Polygon::new(PlotPoints::from(polygon.clone()))
                    .fill_color(theme.measured.with_alpha(0.25).to_color32())
                    .stroke(egui::Stroke::NONE),
            );
            plot_ui.line(
                Line::new(PlotPoints::from(polygon.clone()))
                    .name("Valores Medidos")
                    .color(theme.measured.to_color32())
                    .width(3.0),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(polygon[..labels.len()].to_vec()))
                    .radius(5.0)
                    .color(theme.marker.to_color32()),
            );

            for (label, xy) in labels.iter().zip(&polygon) {
                let color = if label.flagged { theme.flagged } else { theme.foreground };
                let pos = PlotPoint::new(xy[0] * 1.08, xy[1] * 1.08);
                plot_ui.text(Text::new(pos, RichText::new(&label.text).color(color.to_color32())));

                let [sx, sy] = to_xy(points[label.index].angle, axis.upper, &axis);
                let spoke = PlotPoint::new(sx * 1.15, sy * 1.15);
                plot_ui.text(Text::new(spoke, RichText::new(format!("P{}", label.index + 1)).strong()));
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_a_closed_circle() {
        let axis = AxisRange { lower: 0.095, upper: 0.105 };
        let points = ring(0.100, &axis);
        let points = points.points();
        assert_eq!(points.len(), RING_SEGMENTS + 1);

        let (first, last) = (points[0], points[RING_SEGMENTS]);
        assert!((first.x - last.x).abs() < 1e-12 && (first.y - last.y).abs() < 1e-12);
        assert!((first.y - 0.5).abs() < 1e-12, "starts at north");
        for p in points {
            assert!((p.x.hypot(p.y) - 0.5).abs() < 1e-9);
        }
    }
}
