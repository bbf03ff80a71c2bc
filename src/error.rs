// Error types shared by the library modules. The binary and the
// interactive layer wrap these in `anyhow`, everything below `ui` returns
// `crate::Result`.

use std::fmt;

use thiserror::Error;

use crate::limits::format_size;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// What a size limit was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSubject {
    File,
    Directory,
}

impl fmt::Display for SizeSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeSubject::File => f.write_str("File"),
            SizeSubject::Directory => f.write_str("Directory"),
        }
    }
}

fn human_size(bytes: &u64) -> String {
    format_size(*bytes)
}

#[derive(Debug, Error)]
pub enum Error {
    /// A local path could not be read or written.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A file or a directory tree is over its configured threshold.
    #[error(
        "{subject} {name} exceeds size limit of {} (size: {})",
        human_size(.limit),
        human_size(.size)
    )]
    SizeLimitExceeded {
        subject: SizeSubject,
        name: String,
        size: u64,
        limit: u64,
    },

    /// A directory upload found nothing to send.
    #[error("Directory {0} contains no files")]
    EmptyDirectory(String),

    /// The remote payload was malformed or empty.
    #[error("Invalid response format from IPFS: {0}")]
    InvalidResponse(String),

    /// The payload was well formed but did not contain the expected entry.
    #[error("{0} hash not found in response")]
    HashNotFound(String),

    /// The service answered with an error status or application code.
    #[error("{message}")]
    Remote {
        status: Option<u16>,
        code: Option<i64>,
        message: String,
    },

    /// No response was received.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A removal target did not match any recognised format.
    #[error("Invalid input format: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn size_limit(subject: SizeSubject, name: impl Into<String>, size: u64, limit: u64) -> Self {
        Self::SizeLimitExceeded {
            subject,
            name: name.into(),
            size,
            limit,
        }
    }

    /// HTTP status carried by a remote error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => *status,
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Recovery hint shown under the error line.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Remote { status: Some(404), .. } => {
                Some("Content not found on the network or already removed")
            }
            Self::Remote { status: Some(403), .. } => {
                Some("Permission denied - you may not have access to remove this content")
            }
            Self::Remote { status: Some(500), .. } => {
                Some("Server internal error - please try again later")
            }
            Self::Network(_) => Some("Please check your internet connection and try again"),
            Self::InvalidInput(_) => Some(
                "Supported formats: IPFS hash (bafybeig...), full URL (https://bafybeig....pinme.dev), \
                 subname (3abt6ztu), subname URL (https://3abt6ztu.pinit.eth.limo)",
            ),
            _ => None,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => 1,
            Self::SizeLimitExceeded { .. } | Self::EmptyDirectory(_) => 2,
            Self::Io(_) => 3,
            Self::Network(_) => 4,
            Self::Remote { .. } => 5,
            Self::InvalidResponse(_) | Self::HashNotFound(_) | Self::Json(_) => 6,
        }
    }
}
