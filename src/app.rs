use std::path::PathBuf;

use eframe::egui;

use crate::config::DashboardConfig;
use crate::state::{AppState, Phase};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DataCanvasApp {
    pub state: AppState,
}

impl DataCanvasApp {
    /// Build the app; `initial` is a file given on the command line.
    pub fn new(cc: &eframe::CreationContext<'_>, config: DashboardConfig, initial: Option<PathBuf>) -> Self {
        let mut state = AppState::new(config);
        if let Some(path) = initial {
            panels::start_upload(&cc.egui_ctx, &mut state, path);
        }
        Self { state }
    }

    /// Start an upload for the first file dropped onto the window.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            panels::start_upload(ctx, &mut self.state, path);
        }
    }
}

impl eframe::App for DataCanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_upload();
        self.handle_dropped_files(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        if self.state.phase == Phase::Dashboard {
            egui::SidePanel::left("filter_panel")
                .default_width(240.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: current screen ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.phase {
            Phase::Idle => panels::welcome(ui, &mut self.state),
            Phase::Preview => panels::preview(ui, &mut self.state),
            Phase::Dashboard => panels::dashboard(ui, &mut self.state),
        });
    }
}
