use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the uploaded table
// ---------------------------------------------------------------------------

/// A decoded CSV cell: either a finite number or the raw text.
/// Used as a key in `BTreeMap` / `BTreeSet` downstream, so it must be `Ord`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

// Equality follows `cmp`, so it agrees with the bitwise `Hash`.
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Number(_), CellValue::Text(_)) => Ordering::Less,
            (CellValue::Text(_), CellValue::Number(_)) => Ordering::Greater,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Number(n) => n.to_bits().hash(state),
            CellValue::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Shortest round-trippable form: 30.0 prints as "30".
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl CellValue {
    /// Coerce a raw (already trimmed) field.
    ///
    /// Non-empty fields that parse entirely as a finite `f64` become numbers;
    /// everything else, including the empty field, is kept as text.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Text(String::new());
        }
        match field.parse::<f64>() {
            // `-0` and `0` are one value.
            Ok(n) if n == 0.0 => CellValue::Number(0.0),
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(field.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    /// Empty text, i.e. what a short row is padded with.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// DataRow – one record of the dataset
// ---------------------------------------------------------------------------

/// One decoded record: column name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRow {
    cells: BTreeMap<String, CellValue>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell. A later insert under the same name replaces the earlier one.
    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Column names present in this row (sorted).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for DataRow {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = DataRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – inferred column type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-empty cell is numeric, and there is at least one.
    Numeric,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Text => write!(f, "text"),
        }
    }
}

/// Infer the kind of `column` over `rows`. Empty cells are ignored.
pub fn column_kind<'a>(rows: impl IntoIterator<Item = &'a DataRow>, column: &str) -> ColumnKind {
    let mut saw_number = false;
    for row in rows {
        match row.get(column) {
            Some(CellValue::Number(_)) => saw_number = true,
            Some(v) if v.is_empty() => {}
            None => {}
            Some(CellValue::Text(_)) => return ColumnKind::Text,
        }
    }
    if saw_number {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete decoded upload
// ---------------------------------------------------------------------------

/// The decoded table with pre-computed column indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// All rows, in file order.
    pub rows: Vec<DataRow>,
    /// Column names in header order, duplicates collapsed to their first position.
    pub columns: Vec<String>,
    /// Header names that occurred more than once.
    pub duplicate_columns: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
}

impl Dataset {
    /// Build column indices from decoded rows.
    pub fn new(columns: Vec<String>, duplicate_columns: Vec<String>, rows: Vec<DataRow>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = columns
            .iter()
            .map(|c| (c.clone(), BTreeSet::new()))
            .collect();

        for row in &rows {
            for (col, val) in row.iter() {
                if let Some(set) = unique_values.get_mut(col) {
                    set.insert(val.clone());
                }
            }
        }

        Dataset {
            rows,
            columns,
            duplicate_columns,
            unique_values,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_kind(&self, column: &str) -> ColumnKind {
        column_kind(&self.rows, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_numbers_and_keeps_text() {
        assert_eq!(CellValue::from_field("30"), CellValue::Number(30.0));
        assert_eq!(CellValue::from_field("-2.5e3"), CellValue::Number(-2500.0));
        assert_eq!(
            CellValue::from_field("New York"),
            CellValue::Text("New York".into())
        );
        assert_eq!(CellValue::from_field(""), CellValue::Text(String::new()));
    }

    #[test]
    fn non_finite_values_stay_text() {
        assert_eq!(CellValue::from_field("NaN"), CellValue::Text("NaN".into()));
        assert_eq!(CellValue::from_field("inf"), CellValue::Text("inf".into()));
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(CellValue::from_field("-0"), CellValue::Number(0.0));
        assert_eq!(CellValue::from_field("-0.0").to_string(), "0");

        let rows = vec![
            DataRow::from_iter([("n", CellValue::from_field("0"))]),
            DataRow::from_iter([("n", CellValue::from_field("-0"))]),
        ];
        let ds = Dataset::new(vec!["n".into()], Vec::new(), rows);
        assert_eq!(ds.unique_values["n"].len(), 1);
    }

    #[test]
    fn equality_agrees_with_ordering() {
        let pos = CellValue::Number(0.0);
        let neg = CellValue::Number(-0.0);
        assert_eq!(pos == neg, pos.cmp(&neg) == std::cmp::Ordering::Equal);
        assert_eq!(CellValue::Number(1.5), CellValue::Number(1.5));
        assert_ne!(CellValue::Number(1.0), CellValue::Text("1".into()));
    }

    #[test]
    fn numbers_display_without_trailing_zero() {
        assert_eq!(CellValue::Number(30.0).to_string(), "30");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Text("a".into()).to_string(), "a");
    }

    #[test]
    fn numbers_sort_before_text() {
        let mut set = BTreeSet::new();
        set.insert(CellValue::Text("b".into()));
        set.insert(CellValue::Number(10.0));
        set.insert(CellValue::Text("a".into()));
        set.insert(CellValue::Number(-1.0));
        let ordered: Vec<String> = set.iter().map(|v| v.to_string()).collect();
        assert_eq!(ordered, vec!["-1", "10", "a", "b"]);
    }

    #[test]
    fn column_kind_ignores_empty_cells() {
        let rows = vec![
            DataRow::from_iter([("x", CellValue::Number(1.0))]),
            DataRow::from_iter([("x", CellValue::Text(String::new()))]),
        ];
        assert_eq!(column_kind(&rows, "x"), ColumnKind::Numeric);

        let rows = vec![DataRow::from_iter([("x", CellValue::Text(String::new()))])];
        assert_eq!(column_kind(&rows, "x"), ColumnKind::Text);
    }

    #[test]
    fn dataset_indexes_unique_values_per_column() {
        let rows = vec![
            DataRow::from_iter([
                ("city", CellValue::Text("Oslo".into())),
                ("n", CellValue::Number(1.0)),
            ]),
            DataRow::from_iter([
                ("city", CellValue::Text("Oslo".into())),
                ("n", CellValue::Number(2.0)),
            ]),
        ];
        let ds = Dataset::new(vec!["city".into(), "n".into()], Vec::new(), rows);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.unique_values["city"].len(), 1);
        assert_eq!(ds.unique_values["n"].len(), 2);
        assert_eq!(ds.column_kind("n"), ColumnKind::Numeric);
        assert_eq!(ds.column_kind("city"), ColumnKind::Text);
    }
}
