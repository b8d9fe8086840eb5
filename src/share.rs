use std::cell::RefCell;
use std::io;
use std::path::PathBuf;

use crate::error::ShareError;

pub const PNG_MIME_TYPE: &str = "image/png";
pub const SHARE_SUBJECT: &str = "Digital Signature";
pub const CHOOSER_TITLE: &str = "Share Signature";

/// What gets handed to the platform when a record is shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareRequest {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub subject: &'static str,
    pub chooser_title: &'static str,
}

impl ShareRequest {
    pub fn png(path: PathBuf) -> Self {
        Self {
            path,
            mime_type: PNG_MIME_TYPE,
            subject: SHARE_SUBJECT,
            chooser_title: CHOOSER_TITLE,
        }
    }
}

pub trait ShareTarget {
    fn share(&self, request: &ShareRequest) -> Result<(), ShareError>;
}

/// Opens the file with whatever the desktop associates with PNGs.
pub struct SystemShare;

impl ShareTarget for SystemShare {
    fn share(&self, request: &ShareRequest) -> Result<(), ShareError> {
        if !request.path.is_file() {
            return Err(ShareError::Missing(request.path.clone()));
        }
        log::info!(
            "{}: {} as {} ({})",
            request.chooser_title,
            request.path.display(),
            request.mime_type,
            request.subject
        );
        open::that_detached(&request.path).map_err(|source| ShareError::Launch {
            path: request.path.clone(),
            source,
        })
    }
}

/// Remembers every request instead of launching anything.
#[derive(Default)]
pub struct RecordingShare {
    requests: RefCell<Vec<ShareRequest>>,
    unavailable: bool,
}

impl RecordingShare {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every request, like a desktop with no PNG handler.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ShareRequest> {
        self.requests.borrow().clone()
    }
}

impl ShareTarget for RecordingShare {
    fn share(&self, request: &ShareRequest) -> Result<(), ShareError> {
        if self.unavailable {
            return Err(ShareError::Launch {
                path: request.path.clone(),
                source: io::Error::new(io::ErrorKind::Unsupported, "no application can open PNG files"),
            });
        }
        self.requests.borrow_mut().push(request.clone());
        Ok(())
    }
}
