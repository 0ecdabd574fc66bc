use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::metainfo::MetainfoError;

/// Failures that stop a verification.
///
/// Missing or damaged data is not an error; it is reported per piece and
/// per file in the [`VerificationReport`](super::VerificationReport).
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot access {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid torrent: {0}")]
    Metainfo(#[from] MetainfoError),

    #[error("path traversal detected in file path: {}", .0.display())]
    PathTraversal(PathBuf),

    #[error("stripping {strip} components would remove all of {}", .path.display())]
    StripTooDeep { strip: usize, path: PathBuf },
}

/// Errors that mean the file exists but cannot be read, as opposed to a file
/// that is simply not there.
pub(super) fn is_access_error(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::PermissionDenied
}
