//! Filesystem error codes handed back to the host.

use strum::{Display, IntoStaticStr};

/// The errno values this filesystem ever returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum Errno {
    #[strum(serialize = "ENOENT")]
    NoEntry,
    #[strum(serialize = "ENOTDIR")]
    NotADirectory,
    #[strum(serialize = "EISDIR")]
    IsADirectory,
    #[strum(serialize = "EPERM")]
    PermissionDenied,
    #[strum(serialize = "EINVAL")]
    InvalidArgument,
    #[strum(serialize = "EIO")]
    Io,
    #[strum(serialize = "ENOLINK")]
    NoLink,
    #[strum(serialize = "ESTALE")]
    Stale,
}

impl Errno {
    /// Platform errno number.
    pub fn raw(self) -> i32 {
        match self {
            Errno::NoEntry => libc::ENOENT,
            Errno::NotADirectory => libc::ENOTDIR,
            Errno::IsADirectory => libc::EISDIR,
            Errno::PermissionDenied => libc::EPERM,
            Errno::InvalidArgument => libc::EINVAL,
            Errno::Io => libc::EIO,
            Errno::NoLink => libc::ENOLINK,
            Errno::Stale => libc::ESTALE,
        }
    }
}

impl From<Errno> for std::io::Error {
    fn from(errno: Errno) -> Self {
        std::io::Error::from_raw_os_error(errno.raw())
    }
}
