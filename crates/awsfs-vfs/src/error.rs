//! VFS error types.

use std::io;
use thiserror::Error;

use crate::errno::Errno;
use crate::provider::ProviderError;

/// VFS error type.
///
/// Every variant except [`VfsError::Provider`] already knows its errno.
/// Provider failures are translated once, by the dispatcher.
#[derive(Debug, Error)]
pub enum VfsError {
    /// No entry by that name.
    #[error("not found: {0}")]
    NotFound(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Filesystem is read-only.
    #[error("filesystem is read-only")]
    ReadOnly,

    /// Not a symbolic link.
    #[error("not a symbolic link: {0}")]
    NotASymlink(String),

    /// Path is not absolute.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A remote call made on behalf of a lazy node failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create a NotASymlink error.
    pub fn not_a_symlink(path: impl Into<String>) -> Self {
        Self::NotASymlink(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// The errno this error carries, or `None` for provider failures that
    /// still need classifying.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            VfsError::NotFound(_) => Some(Errno::NoEntry),
            VfsError::NotADirectory(_) => Some(Errno::NotADirectory),
            VfsError::IsADirectory(_) => Some(Errno::IsADirectory),
            VfsError::ReadOnly => Some(Errno::PermissionDenied),
            VfsError::NotASymlink(_) | VfsError::InvalidPath(_) => Some(Errno::InvalidArgument),
            VfsError::Provider(_) => None,
        }
    }
}

/// Convert VfsError to std::io::Error for kernel bridges.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            VfsError::ReadOnly => {
                io::Error::new(io::ErrorKind::PermissionDenied, "filesystem is read-only")
            }
            VfsError::NotASymlink(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::Provider(ProviderError::Io(e)) => e,
            VfsError::Provider(other) => io::Error::other(other.to_string()),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
