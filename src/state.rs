use std::path::Path;
use std::sync::Arc;

use coil_thickness::config::AppConfig;
use coil_thickness::data::form::InspectionForm;
use coil_thickness::data::loader::load_points;
use coil_thickness::data::model::InspectionRecord;
use coil_thickness::data::spreadsheet::SpreadsheetStore;
use coil_thickness::pipeline::{self, InspectionOutcome};

/// How many past inspections the history list shows.
const HISTORY_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Flash-style message shown in the top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Success(String),
    Error(String),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,
    pub store: SpreadsheetStore,

    /// Form contents as typed.
    pub form: InspectionForm,

    /// Scratch buffer for pasting a column of readings.
    pub paste_buffer: String,

    /// Set when the operator submitted with out-of-band points and must confirm.
    pub confirm_pending: bool,

    /// Last successful submission.
    pub outcome: Option<InspectionOutcome>,

    /// Chart on display: egui image URI and PNG bytes.
    pub chart_png: Option<(String, Arc<[u8]>)>,

    /// Most recent spreadsheet rows, newest first.
    pub history: Vec<InspectionRecord>,

    pub status: Option<Status>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let today = chrono::Local::now().date_naive();
        let store = SpreadsheetStore::new(config.spreadsheet.clone());
        let mut state = Self {
            form: InspectionForm::new(today, config.default_points),
            store,
            config,
            paste_buffer: String::new(),
            confirm_pending: false,
            outcome: None,
            chart_png: None,
            history: Vec::new(),
            status: None,
        };
        state.refresh_history();
        state
    }

    /// Reload the tail of the spreadsheet.
    pub fn refresh_history(&mut self) {
        match self.store.read_records() {
            Ok(rows) => {
                self.history = rows.into_iter().rev().take(HISTORY_LEN).collect();
            }
            Err(e) => {
                log::error!("Failed to read spreadsheet: {e:#}");
                self.status = Some(Status::Error(format!("Erro ao ler planilha: {e:#}")));
            }
        }
    }

    /// Submit button: validate, then either ask for confirmation or save.
    pub fn request_submit(&mut self) {
        if let Err(e) = self.form.validate() {
            self.status = Some(Status::Error(e.to_string()));
            return;
        }
        if self.form.has_out_of_tolerance_points() {
            self.confirm_pending = true;
        } else {
            self.submit();
        }
    }

    pub fn cancel_submit(&mut self) {
        self.confirm_pending = false;
    }

    /// Render, store and switch to the result view.
    pub fn submit(&mut self) {
        self.confirm_pending = false;
        let result = self
            .form
            .validate()
            .map_err(anyhow::Error::from)
            .and_then(|sub| pipeline::submit(&sub, &self.config, &self.store));

        match result {
            Ok(outcome) => {
                self.chart_png = load_chart(&outcome.artifact.filepath, &outcome.artifact.filename)
                    .map_err(|e| log::error!("Cannot reload {}: {e}", outcome.artifact.filepath.display()))
                    .ok();
                self.status = Some(Status::Success("Dados salvos com sucesso!".into()));
                self.outcome = Some(outcome);
                self.form.reset_for_next();
                self.refresh_history();
            }
            Err(e) => {
                log::error!("Failed to process inspection: {e:#}");
                self.status = Some(Status::Error(format!("Erro ao processar dados: {e:#}")));
            }
        }
    }

    /// Fill the point fields from a spreadsheet file.
    pub fn import_points(&mut self, path: &Path) {
        match load_points(path) {
            Ok(points) if points.is_empty() => {
                self.status = Some(Status::Error(format!(
                    "Nenhum ponto encontrado em {} (coluna 'Espessura')",
                    path.display()
                )));
            }
            Ok(points) => {
                self.form.set_points(&points);
                self.status = Some(Status::Success(format!("{} pontos importados", points.len())));
            }
            Err(e) => {
                log::error!("Failed to import {}: {e:#}", path.display());
                self.status = Some(Status::Error(format!("Erro ao importar: {e:#}")));
            }
        }
    }

    pub fn apply_paste(&mut self) {
        if self.paste_buffer.trim().is_empty() {
            return;
        }
        self.form.paste_points(&self.paste_buffer);
        self.paste_buffer.clear();
    }

    /// Back to an empty result area.
    pub fn close_result(&mut self) {
        self.outcome = None;
        self.chart_png = None;
    }

    /// Show a past chart from the history list.
    pub fn open_history_chart(&mut self, filename: &str) {
        let path = self.config.chart_dir.join(filename);
        match load_chart(&path, filename) {
            Ok(chart) => {
                self.outcome = None;
                self.chart_png = Some(chart);
            }
            Err(e) => {
                self.status = Some(Status::Error(format!("Erro: Gráfico não encontrado! ({e})")));
            }
        }
    }
}

fn load_chart(path: &Path, filename: &str) -> std::io::Result<(String, Arc<[u8]>)> {
    let bytes: Arc<[u8]> = std::fs::read(path)?.into();
    Ok((format!("bytes://{filename}"), bytes))
}
