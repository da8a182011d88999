use std::collections::{BTreeMap, BTreeSet};

use super::model::{CellValue, ColumnKind, DataRow, Dataset};

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// The predicate applied to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Categorical selection of unique values.
    /// Empty set → nothing selected → every row fails.
    Values(BTreeSet<CellValue>),
    /// Inclusive numeric bounds; `None` leaves that side open.
    Range { min: Option<f64>, max: Option<f64> },
    /// Case-insensitive substring match on the displayed value.
    Contains(String),
}

/// Per-column filters: column name → predicate. Absent column → no constraint.
pub type FilterState = BTreeMap<String, ColumnFilter>;

/// Initialise a [`FilterState`] that lets every row through.
///
/// Numeric columns get an open range, text columns with at most
/// `categorical_limit` unique values get a full value selection, and
/// the remaining text columns get an empty substring search.
pub fn init_filter_state(dataset: &Dataset, categorical_limit: usize) -> FilterState {
    dataset
        .columns
        .iter()
        .map(|col| {
            let unique = dataset.unique_values.get(col).cloned().unwrap_or_default();
            let filter = match dataset.column_kind(col) {
                ColumnKind::Numeric => ColumnFilter::Range {
                    min: None,
                    max: None,
                },
                ColumnKind::Text if unique.len() <= categorical_limit => ColumnFilter::Values(unique),
                ColumnKind::Text => ColumnFilter::Contains(String::new()),
            };
            (col.clone(), filter)
        })
        .collect()
}

/// Whether `filter` constrains nothing for `column` of `dataset`.
pub fn is_inactive(dataset: &Dataset, column: &str, filter: &ColumnFilter) -> bool {
    match filter {
        ColumnFilter::Values(selected) => dataset
            .unique_values
            .get(column)
            .is_some_and(|all| !selected.is_empty() && selected.len() == all.len()),
        ColumnFilter::Range { min, max } => min.is_none() && max.is_none(),
        ColumnFilter::Contains(needle) => needle.trim().is_empty(),
    }
}

fn passes(filter: &ColumnFilter, value: Option<&CellValue>) -> bool {
    match filter {
        ColumnFilter::Values(selected) => value.is_some_and(|v| selected.contains(v)),
        ColumnFilter::Range { min, max } => match value.and_then(CellValue::as_f64) {
            Some(n) => min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi),
            None => min.is_none() && max.is_none(),
        },
        ColumnFilter::Contains(needle) => {
            let needle = needle.trim().to_lowercase();
            needle.is_empty()
                || value.is_some_and(|v| v.to_string().to_lowercase().contains(&needle))
        }
    }
}

/// Return the rows of `dataset` that pass every active filter, in file order.
pub fn filter_rows(dataset: &Dataset, filters: &FilterState) -> Vec<DataRow> {
    let active: Vec<(&String, &ColumnFilter)> = filters
        .iter()
        .filter(|(col, f)| !is_inactive(dataset, col, f))
        .collect();

    if active.is_empty() {
        return dataset.rows.clone();
    }

    dataset
        .rows
        .iter()
        .filter(|row| active.iter().all(|(col, f)| passes(f, row.get(col))))
        .cloned()
        .collect()
}
