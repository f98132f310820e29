use eframe::egui::{self, Color32, RichText, ScrollArea, TextEdit, Ui};

use coil_thickness::data::model::BandWarning;

use crate::state::{AppState, Status};

const FIELD_WIDTH: f32 = 220.0;
const POINT_WIDTH: f32 = 80.0;
const POINTS_PER_ROW: usize = 4;

// ---------------------------------------------------------------------------
// Left side panel – inspection form
// ---------------------------------------------------------------------------

/// Render the inspection form.
pub fn form_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Medição de Espessura");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            metadata_fields(ui, state);
            ui.separator();
            tolerance_fields(ui, state);
            ui.separator();
            point_fields(ui, state);
            ui.separator();

            ui.vertical_centered_justified(|ui: &mut Ui| {
                if ui.button(RichText::new("Salvar e gerar gráfico").strong()).clicked() {
                    state.request_submit();
                }
            });

            ui.add_space(8.0);
            history_list(ui, state);
        });
}

fn metadata_fields(ui: &mut Ui, state: &mut AppState) {
    let form = &mut state.form;
    egui::Grid::new("metadata_grid")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("Data");
            ui.add(egui_extras::DatePickerButton::new(&mut form.date));
            ui.end_row();

            for (label, value) in [
                ("Turno", &mut form.shift),
                ("Série do Medidor", &mut form.meter_serial),
                ("Analista", &mut form.operator),
                ("Coordenador", &mut form.coordinator),
                ("Bobina *", &mut form.coil_id),
                ("Máquina", &mut form.machine),
                ("OP", &mut form.operation),
                ("Produto", &mut form.product),
            ] {
                ui.label(label);
                ui.add(TextEdit::singleline(value).desired_width(FIELD_WIDTH));
                ui.end_row();
            }
        });
}

fn tolerance_fields(ui: &mut Ui, state: &mut AppState) {
    let warnings = state.form.band_warnings();
    let inverted = warnings.contains(&BandWarning::MinimumNotBelowMaximum);
    let nominal_off = warnings.contains(&BandWarning::NominalOutsideBand);

    ui.strong("Tolerância (mm)");
    let form = &mut state.form;
    egui::Grid::new("tolerance_grid")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for (label, value, invalid) in [
                ("Nominal", &mut form.nominal, nominal_off),
                ("Mínimo", &mut form.minimum, inverted),
                ("Máximo", &mut form.maximum, inverted),
            ] {
                ui.label(label);
                let mut edit = TextEdit::singleline(value).desired_width(FIELD_WIDTH);
                if invalid {
                    edit = edit.text_color(Color32::RED);
                }
                ui.add(edit);
                ui.end_row();
            }
        });

    for warning in warnings {
        ui.label(RichText::new(warning.to_string()).color(Color32::RED));
    }
}

fn point_fields(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(format!("Pontos de medição ({})", state.form.points.len()));
        if ui.small_button("Adicionar ponto").clicked() {
            state.form.add_point();
        }
        if ui.small_button("Remover").clicked() {
            state.form.remove_point();
        }
    });

    let flags = state.form.point_flags();
    egui::Grid::new("points_grid")
        .num_columns(POINTS_PER_ROW)
        .spacing([6.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for (i, value) in state.form.points.iter_mut().enumerate() {
                let flagged = flags.get(i).copied().unwrap_or(false);
                ui.vertical(|ui: &mut Ui| {
                    ui.small(format!("Ponto {}", i + 1));
                    let mut edit = TextEdit::singleline(value).desired_width(POINT_WIDTH);
                    if flagged {
                        edit = edit.text_color(Color32::RED);
                    }
                    ui.add(edit);
                });
                if (i + 1) % POINTS_PER_ROW == 0 {
                    ui.end_row();
                }
            }
        });

    egui::CollapsingHeader::new("Colar pontos")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.add(
                TextEdit::multiline(&mut state.paste_buffer)
                    .desired_rows(4)
                    .hint_text("Um valor por linha"),
            );
            if ui.button("Substituir pontos").clicked() {
                state.apply_paste();
            }
        });
}

fn history_list(ui: &mut Ui, state: &mut AppState) {
    if state.history.is_empty() {
        return;
    }
    let mut open = None;
    egui::CollapsingHeader::new("Últimas inspeções")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for rec in &state.history {
                let label = format!("{}  •  Bobina {}", rec.metadata.date, rec.metadata.coil_id);
                if rec.chart.is_empty() {
                    ui.label(label);
                } else if ui.link(label).clicked() {
                    open = Some(rec.chart.clone());
                }
            }
        });
    if let Some(filename) = open {
        state.open_history_chart(&filename);
    }
}

// ---------------------------------------------------------------------------
// Confirmation dialog
// ---------------------------------------------------------------------------

pub fn confirm_dialog(ctx: &egui::Context, state: &mut AppState) {
    egui::Window::new("Pontos fora dos limites")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label("Alguns pontos estão fora dos limites mínimo e máximo! Deseja continuar mesmo assim?");
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Continuar").clicked() {
                    state.submit();
                }
                if ui.button("Cancelar").clicked() {
                    state.cancel_submit();
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Arquivo", |ui: &mut Ui| {
            if ui.button("Importar planilha…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Nova inspeção").clicked() {
                state.form.reset_for_next();
                state.close_result();
                state.status = None;
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!("Planilha: {}", state.store.path().display()));
        ui.separator();

        match &state.status {
            Some(Status::Success(msg)) => {
                ui.label(RichText::new(msg).color(Color32::GREEN));
            }
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Importar pontos (coluna 'Espessura')")
        .add_filter("Planilhas suportadas", &["xlsx", "xlsm", "xls", "csv", "json", "parquet", "pq"])
        .add_filter("Excel", &["xlsx", "xlsm", "xls"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.import_points(&path);
    }
}
