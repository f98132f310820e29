mod app;
mod state;
mod ui;

use std::path::Path;

use app::CoilInspectionApp;
use coil_thickness::config::{AppConfig, CONFIG_FILE};
use coil_thickness::preflight;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("coil_thickness=info"))
        .init();

    let config = match AppConfig::load(Path::new(CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid {CONFIG_FILE}, using defaults: {e:#}");
            AppConfig::default()
        }
    };
    log::info!(
        "Charts in {}, spreadsheet {}",
        config.chart_dir.display(),
        config.spreadsheet.display()
    );

    let report = preflight::run(&config);
    if report.is_ok() {
        log::info!("{report}");
    } else {
        log::error!("{report}");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Medição de Espessura – Bobinas",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can show the exported PNG.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(CoilInspectionApp::new(config)))
        }),
    )
}
