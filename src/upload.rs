use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extract::{DocumentFormat, ExtractError, TextExtractor};
use crate::runtime::AppEvent;
use crate::scheduler::Generation;

/// Identifies one upload attempt. Responses carrying an old ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket(Generation);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub ticket: UploadTicket,
    pub path: PathBuf,
    pub file_name: String,
    pub format: DocumentFormat,
}

#[derive(Debug)]
pub struct UploadResponse {
    pub ticket: UploadTicket,
    pub file_name: String,
    pub result: Result<String, ExtractError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    Pending {
        ticket: UploadTicket,
        file_name: String,
    },
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("an upload is already in progress")]
    InFlight,
    #[error("{0} is not a file name")]
    MissingFileName(PathBuf),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Allows one extraction in flight and discards responses that were superseded.
#[derive(Debug, Default)]
pub struct UploadTracker {
    generation: Generation,
    state: UploadState,
}

impl UploadTracker {
    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, UploadState::Pending { .. })
    }

    /// Validate `path` and mark an upload as pending.
    pub fn begin(&mut self, path: &Path) -> Result<UploadRequest, UploadError> {
        if self.is_pending() {
            return Err(UploadError::InFlight);
        }

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| UploadError::MissingFileName(path.to_path_buf()))?
            .to_string();
        let format = DocumentFormat::from_path(path)?;

        self.generation = self.generation.next();
        let ticket = UploadTicket(self.generation);
        self.state = UploadState::Pending {
            ticket,
            file_name: file_name.clone(),
        };
        info!(file = %file_name, %format, "upload started");

        Ok(UploadRequest {
            ticket,
            path: path.to_path_buf(),
            file_name,
            format,
        })
    }

    /// Forget the pending upload; its response will be discarded.
    pub fn invalidate(&mut self) {
        if let UploadState::Pending { file_name, .. } = &self.state {
            debug!(file = %file_name, "pending upload invalidated");
        }
        self.generation = self.generation.next();
        self.state = UploadState::Idle;
    }

    /// Accept a worker response. `None` if it belongs to a superseded upload.
    pub fn complete(&mut self, response: UploadResponse) -> Option<UploadResponse> {
        let current = matches!(
            &self.state,
            UploadState::Pending { ticket, .. } if *ticket == response.ticket
        );
        if !current {
            debug!(file = %response.file_name, "discarding stale upload result");
            return None;
        }

        self.state = UploadState::Idle;
        Some(response)
    }
}

/// Read the file and extract its text on the current thread.
///
/// Always yields a response: a panicking extractor becomes a parse error so
/// the pending upload is released.
pub fn run_extraction(request: &UploadRequest, extractor: &dyn TextExtractor) -> UploadResponse {
    let result = std::fs::read(&request.path)
        .map_err(ExtractError::from)
        .and_then(|bytes| {
            panic::catch_unwind(AssertUnwindSafe(|| {
                extractor.extract_plain_text(&bytes, request.format)
            }))
            .unwrap_or_else(|_| {
                Err(ExtractError::Parse {
                    format: request.format,
                    message: "extractor panicked".into(),
                })
            })
        });

    if let Err(err) = &result {
        warn!(file = %request.file_name, %err, "extraction failed");
    }

    UploadResponse {
        ticket: request.ticket,
        file_name: request.file_name.clone(),
        result,
    }
}

/// Run the extraction on a worker thread and deliver the response as an event.
pub fn spawn_extraction(
    request: UploadRequest,
    extractor: Arc<dyn TextExtractor>,
    tx: Sender<AppEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let response = run_extraction(&request, extractor.as_ref());
        // the receiver is gone when the app has already quit
        let _ = tx.send(AppEvent::Upload(response));
    })
}
