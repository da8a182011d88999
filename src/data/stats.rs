use std::collections::BTreeMap;

use super::model::{column_kind, CellValue, ColumnKind, DataRow};

// ---------------------------------------------------------------------------
// Per-column summary
// ---------------------------------------------------------------------------

/// Descriptive statistics of a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub kind: ColumnKind,
    /// Non-empty cells.
    pub count: usize,
    /// Empty cells (padding of short rows included).
    pub missing: usize,
    pub unique: usize,
    pub numeric: Option<NumericSummary>,
    /// Most frequent non-empty value of a text column and its count.
    pub top: Option<(CellValue, usize)>,
}

/// Summarise every column of `rows`, in column order.
pub fn summarize(rows: &[DataRow], columns: &[String]) -> Vec<ColumnSummary> {
    columns.iter().map(|col| summarize_column(rows, col)).collect()
}

pub fn summarize_column(rows: &[DataRow], column: &str) -> ColumnSummary {
    let kind = column_kind(rows, column);

    let mut counts: BTreeMap<&CellValue, usize> = BTreeMap::new();
    let mut missing = 0;
    for value in rows.iter().filter_map(|r| r.get(column)) {
        if value.is_empty() {
            missing += 1;
        } else {
            *counts.entry(value).or_default() += 1;
        }
    }
    let count: usize = counts.values().sum();

    let numeric = match kind {
        ColumnKind::Numeric => {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|r| r.get(column).and_then(CellValue::as_f64))
                .collect();
            describe(&values)
        }
        ColumnKind::Text => None,
    };

    // `max_by_key` keeps the last maximum; reversed, that is the smallest value.
    let top = match kind {
        ColumnKind::Text => counts
            .iter()
            .rev()
            .max_by_key(|(_, n)| **n)
            .map(|(v, n)| ((*v).clone(), *n)),
        ColumnKind::Numeric => None,
    };

    ColumnSummary {
        column: column.to_string(),
        kind,
        count,
        missing,
        unique: counts.len(),
        numeric,
        top,
    }
}

/// Min, max, sum, mean, median and population standard deviation.
/// `None` for an empty slice.
pub fn describe(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let len = sorted.len();
    let min = sorted[0];
    let max = sorted[len - 1];
    let sum: f64 = sorted.iter().sum();
    let mean = sum / len as f64;
    let median = if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    };
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / len as f64;

    Some(NumericSummary {
        min,
        max,
        sum,
        mean,
        median,
        std_dev: variance.sqrt(),
    })
}

// ---------------------------------------------------------------------------
// Dashboard KPIs
// ---------------------------------------------------------------------------

/// Headline counters shown above the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetKpis {
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub columns: usize,
    /// Display name, truncated for the card.
    pub dataset: String,
}

/// Shorten `name` to `max_chars` characters followed by `...` when longer.
pub fn truncate_name(name: &str, max_chars: usize) -> String {
    match name.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &name[..cut]),
        None => name.to_string(),
    }
}
