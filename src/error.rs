//! Recoverable errors surfaced by the editing core.
//!
//! Programming errors are not represented here; they go through
//! [`crate::invariant::violated`].

use std::path::PathBuf;

/// Errors returned by document I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading or streaming failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A save was requested but neither an explicit path nor a stored filename exists.
    #[error("no file name to save to")]
    NoFilename,

    /// Writing the temp file or renaming it over the target failed.
    /// The target file is left untouched.
    #[error("failed to save {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
