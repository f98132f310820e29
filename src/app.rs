use eframe::egui;

use coil_thickness::config::AppConfig;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CoilInspectionApp {
    pub state: AppState,
}

impl CoilInspectionApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for CoilInspectionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + status ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: inspection form ----
        egui::SidePanel::left("form_panel")
            .default_width(420.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::form_panel(ui, &mut self.state);
            });

        // ---- Central panel: rendered chart or live preview ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::result_view(ui, &mut self.state);
        });

        // ---- Out-of-tolerance confirmation ----
        if self.state.confirm_pending {
            panels::confirm_dialog(ctx, &mut self.state);
        }
    }
}
