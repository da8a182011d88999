mod app;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::DataCanvasApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load().unwrap_or_else(|e| {
        log::warn!("Using default settings: {e:#}");
        DashboardConfig::default()
    });
    log::debug!("Settings: {config:?}");

    // Optional CSV to load at start-up.
    let initial = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Data Canvas – CSV Analytics",
        options,
        Box::new(|cc| Ok(Box::new(DataCanvasApp::new(cc, config, initial)))),
    )
}
