//! Failure taxonomy for camera transfers.
//!
//! Library functions return [`anyhow::Result`]; the errors below are attached
//! at the source so front-ends can tell a missing camera apart from a bad
//! response or a full disk via [`classify`] and [`user_message`].

use std::path::PathBuf;

use thiserror::Error;

/// Shown after a connection failure to tell the user how to pair with the camera.
pub const CONNECT_HINT: &str = "On the Olympus camera select \"Connection to Smartphone\" from the Playback Menu, \
then connect this device to the WiFi network displayed on the camera screen.\n\
NOTICE: you may need to disable mobile data to allow communication with the camera IP address.";

#[derive(Debug, Error)]
pub enum CameraError {
    /// No TCP connection could be made to the camera.
    #[error("camera unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The camera did not answer in time.
    #[error("timed out waiting for {url}")]
    Timeout { url: String },

    /// The camera answered with a non-200 status.
    #[error("camera returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// The transfer ended before the listed size was received.
    #[error("truncated transfer for {url}: got {received} of {expected} bytes")]
    Truncated {
        url: String,
        expected: u64,
        received: u64,
    },

    /// Local storage could not be written.
    #[error("cannot write {}: {reason}", path.display())]
    Filesystem { path: PathBuf, reason: String },
}

impl CameraError {
    /// Map a `reqwest` send error onto the taxonomy.
    pub fn from_request(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Unreachable {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Filesystem {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Coarse category for user-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connection,
    Http,
    Filesystem,
    Other,
}

/// Find the [`CameraError`] in an error chain and return its category.
pub fn classify(err: &anyhow::Error) -> FailureKind {
    for cause in err.chain() {
        if let Some(camera) = cause.downcast_ref::<CameraError>() {
            return match camera {
                CameraError::Unreachable { .. } | CameraError::Timeout { .. } => {
                    FailureKind::Connection
                }
                CameraError::Http { .. } | CameraError::Truncated { .. } => FailureKind::Http,
                CameraError::Filesystem { .. } => FailureKind::Filesystem,
            };
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return FailureKind::Filesystem;
        }
    }
    FailureKind::Other
}

/// Message suitable for a label or popup. Connection failures get the pairing hint.
pub fn user_message(err: &anyhow::Error) -> String {
    let text = format!("{err:#}");
    match classify(err) {
        FailureKind::Connection => format!("{text}\n\n------\n\n{CONNECT_HINT}"),
        _ => text,
    }
}
