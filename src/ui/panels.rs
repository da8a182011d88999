use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::ColumnFilter;
use crate::data::model::CellValue;
use crate::state::{AppState, Export, Level, Notification};
use crate::ui::table::{data_table, summary_grid};

fn level_color(level: Level) -> Color32 {
    match level {
        Level::Info => Color32::LIGHT_GREEN,
        Level::Warning => Color32::YELLOW,
        Level::Error => Color32::RED,
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        let loaded = state.dataset.is_some();

        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(ui.ctx(), state);
                ui.close_menu();
            }
            if ui.add_enabled(loaded, egui::Button::new("Export CSV…")).clicked() {
                export_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(loaded, egui::Button::new("Upload New Dataset"))
                .clicked()
            {
                state.reset();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(name) = state.pending_file_name() {
            ui.spinner();
            ui.label(format!("Processing {name}…"));
            ui.separator();
        }

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{}: {} rows loaded, {} visible",
                state.file_name,
                ds.len(),
                state.filtered.len()
            ));
        }

        let mut dismiss = false;
        if let Some(note) = &state.notification {
            ui.separator();
            ui.label(
                RichText::new(format!("{}: {}", note.title, note.description))
                    .color(level_color(note.level)),
            );
            dismiss = ui.small_button("✕").clicked();
        }
        if dismiss {
            state.notification = None;
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

/// Pick a CSV file and start reading it in the background.
pub fn open_file_dialog(ctx: &egui::Context, state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open CSV data")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        start_upload(ctx, state, path);
    }
}

/// Start reading `path`; the UI repaints once the result is in.
pub fn start_upload(ctx: &egui::Context, state: &mut AppState, path: PathBuf) {
    log::info!("Uploading {}", path.display());
    let ctx = ctx.clone();
    state.begin_upload(path, move || ctx.request_repaint());
}

/// Encode the filtered rows and save them where the user chooses.
pub fn export_dialog(state: &mut AppState) {
    let export = match state.export() {
        Ok(export) => export,
        Err(e) => {
            log::error!("Failed to encode export: {e}");
            state.notification = Some(Notification::new(Level::Error, "Export Failed", e.to_string()));
            return;
        }
    };

    let Some(path) = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .set_file_name(export.file_name.as_str())
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    state.notification = Some(match save_export(&path, &export) {
        Ok(()) => {
            log::info!("Exported {} rows to {}", state.filtered.len(), path.display());
            Notification::new(
                Level::Info,
                "Export Complete",
                format!("Saved {}", path.display()),
            )
        }
        Err(e) => {
            log::error!("Failed to export: {e:#}");
            Notification::new(Level::Error, "Export Failed", format!("{e:#}"))
        }
    });
}

fn save_export(path: &Path, export: &Export) -> anyhow::Result<()> {
    std::fs::write(path, &export.contents)
        .with_context(|| format!("writing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state inside the loop.
    let columns = dataset.columns.clone();
    let unique = dataset.unique_values.clone();

    let mut changed = false;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for col in &columns {
                let Some(all_values) = unique.get(col) else {
                    continue;
                };
                let Some(filter) = state.filters.get_mut(col) else {
                    continue;
                };

                let header_text = format!("{col}  ({})", filter_badge(filter, all_values.len()));
                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        changed |= filter_editor(ui, filter, all_values);
                    });
            }
        });

    if changed {
        state.refilter();
    }
}

fn filter_badge(filter: &ColumnFilter, n_total: usize) -> String {
    match filter {
        ColumnFilter::Values(selected) => format!("{}/{n_total}", selected.len()),
        ColumnFilter::Range { min, max } => match (min, max) {
            (None, None) => "any".to_string(),
            (Some(lo), None) => format!("≥ {lo}"),
            (None, Some(hi)) => format!("≤ {hi}"),
            (Some(lo), Some(hi)) => format!("{lo} – {hi}"),
        },
        ColumnFilter::Contains(needle) if needle.trim().is_empty() => "any".to_string(),
        ColumnFilter::Contains(needle) => format!("“{}”", needle.trim()),
    }
}

/// Edit one column filter in place. Returns true when it changed.
fn filter_editor(ui: &mut Ui, filter: &mut ColumnFilter, all_values: &BTreeSet<CellValue>) -> bool {
    let mut changed = false;
    match filter {
        ColumnFilter::Values(selected) => {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    *selected = all_values.clone();
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                    changed = true;
                }
            });

            for val in all_values {
                let mut checked = selected.contains(val);
                let label = if val.is_empty() {
                    "(empty)".to_string()
                } else {
                    val.to_string()
                };
                if ui.checkbox(&mut checked, label).changed() {
                    if checked {
                        selected.insert(val.clone());
                    } else {
                        selected.remove(val);
                    }
                    changed = true;
                }
            }
        }
        ColumnFilter::Range { min, max } => {
            let numbers = || all_values.iter().filter_map(CellValue::as_f64);
            let lo = numbers().reduce(f64::min).unwrap_or(0.0);
            let hi = numbers().reduce(f64::max).unwrap_or(0.0);
            changed |= bound_editor(ui, "min", min, lo);
            changed |= bound_editor(ui, "max", max, hi);
        }
        ColumnFilter::Contains(needle) => {
            changed |= ui
                .add(egui::TextEdit::singleline(needle).hint_text("contains…"))
                .changed();
        }
    }
    changed
}

fn bound_editor(ui: &mut Ui, label: &str, bound: &mut Option<f64>, fallback: f64) -> bool {
    ui.horizontal(|ui: &mut Ui| {
        let mut enabled = bound.is_some();
        let mut changed = ui.checkbox(&mut enabled, label).changed();
        if changed {
            *bound = enabled.then_some(bound.unwrap_or(fallback));
        }
        if let Some(value) = bound.as_mut() {
            changed |= ui.add(egui::DragValue::new(value).speed(0.1)).changed();
        }
        changed
    })
    .inner
}

// ---------------------------------------------------------------------------
// Central panel – one screen per phase
// ---------------------------------------------------------------------------

/// Idle: invite an upload.
pub fn welcome(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(40.0);
        ui.heading("Transform Your Data Into Insights");
        ui.label("Open a CSV file to preview it, filter it and read its summary statistics.");
        ui.add_space(16.0);

        if state.is_loading() {
            ui.spinner();
            ui.label("Processing your data...");
        } else if ui.button("Choose File…").clicked() {
            open_file_dialog(ui.ctx(), state);
        }
        ui.label(RichText::new("or drop a .csv file onto this window").weak());

        ui.add_space(16.0);
        ui.group(|ui: &mut Ui| {
            ui.strong("Example CSV format:");
            ui.monospace("name, age, city\nJohn, 30, New York\nJane, 25, London");
        });
    });
}

/// Preview: first rows of the upload and a way forward or back.
pub fn preview(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Preview Uploaded Data");
    ui.add_space(8.0);

    let mut proceed = false;
    let mut start_over = false;
    ui.horizontal(|ui: &mut Ui| {
        proceed = ui.button("Continue to Dashboard").clicked();
        start_over = ui.button("Upload New Dataset").clicked();
    });
    ui.label(format!(
        "Showing first {} rows. If your data looks correct, continue to the dashboard.",
        state.config.preview_rows
    ));
    ui.separator();

    data_table(ui, state.columns(), state.preview_rows());

    if proceed {
        state.continue_to_dashboard();
    } else if start_over {
        state.reset();
    }
}

/// Dashboard: KPI cards, summary statistics and the filtered rows.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    kpi_cards(ui, state);
    ui.add_space(8.0);

    let empty_title = if state.filtered.is_empty() {
        Some((
            "No Data to Display",
            "Your filters returned no results or your dataset is empty. Try adjusting your filters or uploading a new dataset.",
        ))
    } else if state.columns().is_empty() {
        Some((
            "No Columns Detected",
            "The uploaded file does not contain recognizable columns. Please check your CSV format and try again.",
        ))
    } else {
        None
    };

    if let Some((title, text)) = empty_title {
        let mut start_over = false;
        ui.vertical_centered(|ui: &mut Ui| {
            ui.add_space(40.0);
            ui.heading(title);
            ui.label(text);
            start_over = ui.button("Upload New Dataset").clicked();
        });
        if start_over {
            state.reset();
        }
        return;
    }

    egui::CollapsingHeader::new(RichText::new("Statistical Summary").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            summary_grid(ui, &state.summary());
        });
    ui.separator();

    ui.strong("Filtered Rows");
    data_table(ui, state.columns(), &state.filtered);
}

fn kpi_cards(ui: &mut Ui, state: &AppState) {
    let kpis = state.kpis();
    let cards = [
        ("Total Rows", kpis.total_rows.to_string()),
        ("Filtered Rows", kpis.filtered_rows.to_string()),
        ("Columns", kpis.columns.to_string()),
        ("Dataset", kpis.dataset),
    ];
    ui.horizontal(|ui: &mut Ui| {
        for (label, value) in cards {
            ui.group(|ui: &mut Ui| {
                ui.vertical(|ui: &mut Ui| {
                    ui.label(RichText::new(label).weak());
                    ui.label(RichText::new(value).heading());
                });
            })
            .response
            .on_hover_text(if label == "Dataset" {
                state.file_name.as_str()
            } else {
                label
            });
        }
    });
}
