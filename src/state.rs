use std::path::PathBuf;

use crate::config::DashboardConfig;
use crate::data::codec::{encode, export_file_name, EncodeError};
use crate::data::filter::{filter_rows, init_filter_state, FilterState};
use crate::data::model::{DataRow, Dataset};
use crate::data::stats::{summarize, truncate_name, ColumnSummary, DatasetKpis};
use crate::data::upload::{spawn_upload, PendingUpload, Upload, UploadError};

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// A message shown in the top bar until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(level: Level, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn invalid_csv() -> Self {
        Self::new(
            Level::Warning,
            "Invalid or Empty CSV",
            "The uploaded file does not contain valid data rows. Please check your CSV format.",
        )
    }

    pub fn upload_failed() -> Self {
        Self::new(
            Level::Error,
            "File Upload Error",
            "Could not process the uploaded file. Please check the format and try again.",
        )
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Encoded filtered rows ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub contents: String,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loaded, waiting for an upload.
    Idle,
    /// Dataset loaded, first rows shown for confirmation.
    Preview,
    Dashboard,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Uploaded dataset: original rows and columns (None until a file is loaded).
    pub dataset: Option<Dataset>,

    /// Rows passing the current filters.
    pub filtered: Vec<DataRow>,

    /// Name of the uploaded file.
    pub file_name: String,

    /// Per-column filter predicates.
    pub filters: FilterState,

    pub phase: Phase,

    /// Status / error message shown in the UI.
    pub notification: Option<Notification>,

    /// The most recently started upload, if still in flight.
    pending: Option<PendingUpload>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            filtered: Vec::new(),
            file_name: String::new(),
            filters: FilterState::new(),
            phase: Phase::Idle,
            notification: None,
            pending: None,
        }
    }

    // -- Upload lifecycle --

    /// Start reading `path` in the background. Supersedes any upload still
    /// in flight; its result will be ignored.
    pub fn begin_upload(&mut self, path: PathBuf, notify: impl FnOnce() + Send + 'static) {
        if let Some(previous) = &self.pending {
            log::info!("Upload of {} superseded", previous.file_name());
        }
        self.pending = Some(spawn_upload(
            path,
            self.config.upload_size_hint_bytes,
            notify,
        ));
    }

    /// Whether a file loading operation is in progress.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_file_name(&self) -> Option<&str> {
        self.pending.as_ref().map(PendingUpload::file_name)
    }

    /// Collect the pending upload's result if it is ready.
    /// Returns true when the state changed.
    pub fn poll_upload(&mut self) -> bool {
        let Some(result) = self.pending.as_ref().and_then(PendingUpload::poll) else {
            return false;
        };
        self.pending = None;
        self.finish_upload(result);
        true
    }

    /// Apply a finished upload: load it, or turn the failure into a notification.
    pub fn finish_upload(&mut self, result: Result<Upload, UploadError>) {
        match result {
            Ok(upload) => self.load(upload.dataset, upload.file_name),
            Err(e) if e.is_invalid_data() => {
                log::warn!("Rejected upload: {e}");
                self.notification = Some(Notification::invalid_csv());
            }
            Err(e) => {
                log::error!("Error processing file: {e}");
                self.notification = Some(Notification::upload_failed());
            }
        }
    }

    /// Ingest a newly decoded dataset: Idle → Preview.
    pub fn load(&mut self, dataset: Dataset, file_name: String) {
        self.filters = init_filter_state(&dataset, self.config.categorical_limit);
        self.filtered = dataset.rows.clone();
        self.file_name = file_name;

        self.notification = if dataset.duplicate_columns.is_empty() {
            None
        } else {
            Some(Notification::new(
                Level::Warning,
                "Duplicate column names",
                format!(
                    "Columns {} appear more than once; the last occurrence is used.",
                    dataset.duplicate_columns.join(", ")
                ),
            ))
        };

        self.dataset = Some(dataset);
        self.phase = Phase::Preview;
    }

    /// Preview → Dashboard.
    pub fn continue_to_dashboard(&mut self) {
        if self.dataset.is_some() {
            self.phase = Phase::Dashboard;
        }
    }

    /// Back to Idle: forget the dataset, filters, messages and any upload in flight.
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.config));
    }

    // -- Filtering --

    /// Store a filtered subset produced elsewhere. Not validated.
    pub fn apply_filtered(&mut self, rows: Vec<DataRow>) {
        self.filtered = rows;
    }

    /// Recompute `filtered` after a filter change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let rows = filter_rows(ds, &self.filters);
        log::debug!("Filters keep {} of {} rows", rows.len(), ds.len());
        self.apply_filtered(rows);
    }

    // -- Read-only views --

    pub fn columns(&self) -> &[String] {
        self.dataset
            .as_ref()
            .map(|ds| ds.columns.as_slice())
            .unwrap_or_default()
    }

    pub fn original_rows(&self) -> &[DataRow] {
        self.dataset
            .as_ref()
            .map(|ds| ds.rows.as_slice())
            .unwrap_or_default()
    }

    pub fn preview_rows(&self) -> &[DataRow] {
        let rows = self.original_rows();
        &rows[..rows.len().min(self.config.preview_rows)]
    }

    pub fn kpis(&self) -> DatasetKpis {
        DatasetKpis {
            total_rows: self.original_rows().len(),
            filtered_rows: self.filtered.len(),
            columns: self.columns().len(),
            dataset: truncate_name(&self.file_name, self.config.name_display_chars),
        }
    }

    pub fn summary(&self) -> Vec<ColumnSummary> {
        summarize(&self.filtered, self.columns())
    }

    /// Encode the filtered rows for download. Does not touch the state.
    pub fn export(&self) -> Result<Export, EncodeError> {
        let contents = encode(&self.filtered, self.columns())?;
        Ok(Export {
            file_name: export_file_name(&self.file_name, &self.config.export_suffix),
            contents,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io::Write;

    use super::*;
    use crate::data::codec::{decode, DecodeError};
    use crate::data::filter::ColumnFilter;
    use crate::data::model::CellValue;

    fn loaded(csv: &str, name: &str) -> AppState {
        let mut state = AppState::default();
        state.load(decode(csv.as_bytes()).unwrap(), name.to_string());
        state
    }

    #[test]
    fn starts_idle() {
        let state = AppState::default();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.columns().is_empty());
        assert!(!state.is_loading());
    }

    #[test]
    fn load_moves_to_preview_with_everything_visible() {
        let state = loaded("name,age\nJohn,30\nJane,25", "people.csv");
        assert_eq!(state.phase, Phase::Preview);
        assert_eq!(state.columns(), ["name", "age"]);
        assert_eq!(state.filtered.len(), 2);
        assert_eq!(state.file_name, "people.csv");
        assert!(state.notification.is_none());
    }

    #[test]
    fn preview_is_capped() {
        let mut csv = String::from("n\n");
        for i in 0..25 {
            csv.push_str(&format!("{i}\n"));
        }
        let state = loaded(&csv, "n.csv");
        assert_eq!(state.preview_rows().len(), 10);
        assert_eq!(state.original_rows().len(), 25);
    }

    #[test]
    fn dashboard_requires_a_dataset() {
        let mut state = AppState::default();
        state.continue_to_dashboard();
        assert_eq!(state.phase, Phase::Idle);

        let mut state = loaded("a\n1", "a.csv");
        state.continue_to_dashboard();
        assert_eq!(state.phase, Phase::Dashboard);
    }

    #[test]
    fn refilter_and_kpis() {
        let mut state = loaded(
            "name,city\nJohn,Oslo\nJane,Lima\nBob,Oslo",
            "a_rather_long_name.csv",
        );
        state.filters.insert(
            "city".into(),
            ColumnFilter::Values(BTreeSet::from([CellValue::Text("Oslo".into())])),
        );
        state.refilter();

        let kpis = state.kpis();
        assert_eq!(kpis.total_rows, 3);
        assert_eq!(kpis.filtered_rows, 2);
        assert_eq!(kpis.columns, 2);
        assert_eq!(kpis.dataset, "a_rather_lon...");

        let summary = state.summary();
        assert_eq!(summary[1].count, 2);
    }

    #[test]
    fn apply_filtered_stores_what_it_is_given() {
        let mut state = loaded("a\n1\n2", "a.csv");
        state.apply_filtered(Vec::new());
        assert_eq!(state.kpis().filtered_rows, 0);
        assert_eq!(state.kpis().total_rows, 2);
    }

    #[test]
    fn export_encodes_filtered_rows_without_side_effects() {
        let mut state = loaded("name,age\nJohn,30\nJane,25", "people.csv");
        state.filters.insert(
            "age".into(),
            ColumnFilter::Range {
                min: Some(28.0),
                max: None,
            },
        );
        state.refilter();

        let export = state.export().unwrap();
        assert_eq!(export.file_name, "people_filtered.csv");
        assert_eq!(export.contents, "name,age\n\"John\",\"30\"");
        assert_eq!(state.filtered.len(), 1);
        assert_eq!(state.phase, Phase::Preview);
    }

    #[test]
    fn reset_returns_to_idle_and_keeps_config() {
        let mut state = loaded("a\n1", "a.csv");
        state.config.preview_rows = 3;
        state.continue_to_dashboard();
        state.notification = Some(Notification::upload_failed());

        state.reset();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.dataset.is_none());
        assert!(state.filtered.is_empty());
        assert!(state.file_name.is_empty());
        assert!(state.filters.is_empty());
        assert!(state.notification.is_none());
        assert_eq!(state.config.preview_rows, 3);
    }

    #[test]
    fn failed_uploads_map_to_two_messages() {
        let mut state = AppState::default();
        state.finish_upload(Err(UploadError::Decode(DecodeError::HeaderOnly)));
        assert_eq!(state.notification, Some(Notification::invalid_csv()));
        assert_eq!(state.phase, Phase::Idle);

        state.finish_upload(Err(UploadError::Interrupted));
        assert_eq!(state.notification, Some(Notification::upload_failed()));
    }

    #[test]
    fn duplicate_headers_raise_a_warning() {
        let state = loaded("a,a\n1,2", "d.csv");
        let note = state.notification.unwrap();
        assert_eq!(note.level, Level::Warning);
        assert!(note.description.contains('a'));
    }

    #[test]
    fn latest_started_upload_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        std::fs::File::create(&first)
            .unwrap()
            .write_all(b"x\n1\n")
            .unwrap();
        std::fs::File::create(&second)
            .unwrap()
            .write_all(b"y\n1\n2\n")
            .unwrap();

        let mut state = AppState::default();
        state.begin_upload(first, || {});
        state.begin_upload(second, || {});
        assert_eq!(state.pending_file_name(), Some("second.csv"));

        while !state.poll_upload() {
            std::thread::yield_now();
        }
        assert!(!state.is_loading());
        assert_eq!(state.file_name, "second.csv");
        assert_eq!(state.columns(), ["y"]);
    }
}
