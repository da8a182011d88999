use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use thiserror::Error;

use super::codec::{decode, DecodeError};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// A decoded upload and the name it is shown under.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub dataset: Dataset,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file type '{0}', expected a .csv file")]
    UnsupportedExtension(String),

    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("the upload worker stopped before producing a result")]
    Interrupted,
}

impl UploadError {
    /// The file was read but holds nothing to show (or is not a CSV at all),
    /// as opposed to a failure while processing it.
    pub fn is_invalid_data(&self) -> bool {
        match self {
            UploadError::UnsupportedExtension(_) => true,
            UploadError::Decode(e) => e.is_no_data(),
            UploadError::Read { .. } | UploadError::Interrupted => false,
        }
    }
}

/// Read and decode a `.csv` file.
///
/// `size_hint` is advisory: larger files are logged and still processed.
pub fn read_upload(path: &Path, size_hint: u64) -> Result<Upload, UploadError> {
    let file_name = display_name(path);

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(UploadError::UnsupportedExtension(file_name));
    }

    let read_err = |source: std::io::Error| UploadError::Read {
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(read_err)?.len();
    if size > size_hint {
        log::warn!("{file_name} is {size} bytes, above the {size_hint} byte upload hint");
    }

    let bytes = std::fs::read(path).map_err(read_err)?;
    let dataset = decode(&bytes)?;

    log::info!(
        "Decoded {file_name}: {} rows, columns {:?}",
        dataset.len(),
        dataset.columns
    );
    Ok(Upload { file_name, dataset })
}

/// Run [`read_upload`] on a worker thread.
///
/// `notify` is called once the result has been handed over, e.g. to wake
/// the UI.
pub fn spawn_upload<F>(path: PathBuf, size_hint: u64, notify: F) -> PendingUpload
where
    F: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let file_name = display_name(&path);

    thread::spawn(move || {
        // The receiver is gone when the upload was superseded or the state reset.
        if tx.send(read_upload(&path, size_hint)).is_ok() {
            notify();
        }
    });

    PendingUpload { file_name, rx }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// PendingUpload – the single suspension point of an upload
// ---------------------------------------------------------------------------

/// An upload in flight. Yields exactly one result.
#[derive(Debug)]
pub struct PendingUpload {
    file_name: String,
    rx: Receiver<Result<Upload, UploadError>>,
}

impl PendingUpload {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// `None` while the worker is still busy.
    pub fn poll(&self) -> Option<Result<Upload, UploadError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(UploadError::Interrupted)),
        }
    }

    /// Block until the result is available.
    pub fn wait(self) -> Result<Upload, UploadError> {
        self.rx.recv().unwrap_or(Err(UploadError::Interrupted))
    }
}
