use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::DataRow;
use crate::data::stats::ColumnSummary;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Row table
// ---------------------------------------------------------------------------

/// Render `rows` under `columns` as a striped, virtualised table.
pub fn data_table(ui: &mut Ui, columns: &[String], rows: &[DataRow]) {
    if columns.is_empty() {
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .columns(Column::auto().at_least(60.0).clip(true), columns.len())
        .header(22.0, |mut header| {
            for col in columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(col.as_str());
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                let data = &rows[row.index()];
                for col in columns {
                    row.col(|ui: &mut Ui| {
                        let text = data.get(col).map(|v| v.to_string()).unwrap_or_default();
                        ui.label(text);
                    });
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Statistical summary
// ---------------------------------------------------------------------------

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v}")
    } else {
        format!("{v:.3}")
    }
}

/// One grid line per column: type, counts and descriptive statistics.
pub fn summary_grid(ui: &mut Ui, summaries: &[ColumnSummary]) {
    egui::Grid::new("summary_grid")
        .striped(true)
        .num_columns(10)
        .show(ui, |ui: &mut Ui| {
            for heading in [
                "Column", "Type", "Count", "Missing", "Unique", "Min", "Max", "Mean", "Median",
                "Std dev / Top",
            ] {
                ui.label(RichText::new(heading).strong());
            }
            ui.end_row();

            for s in summaries {
                ui.label(s.column.as_str());
                ui.label(s.kind.to_string());
                ui.label(s.count.to_string());
                ui.label(s.missing.to_string());
                ui.label(s.unique.to_string());
                match (&s.numeric, &s.top) {
                    (Some(n), _) => {
                        ui.label(fmt_num(n.min));
                        ui.label(fmt_num(n.max));
                        ui.label(fmt_num(n.mean));
                        ui.label(fmt_num(n.median));
                        ui.label(fmt_num(n.std_dev));
                    }
                    (None, top) => {
                        for _ in 0..4 {
                            ui.label("–");
                        }
                        match top {
                            Some((value, count)) => ui.label(format!("{value} ({count}×)")),
                            None => ui.label("–"),
                        };
                    }
                }
                ui.end_row();
            }
        });
}
