//! VFS operations trait.
//!
//! Path-based (absolute `/`-delimited paths, no inodes) with explicit
//! offset and size, so a kernel bridge can forward its calls one to one.

use std::time::SystemTime;

use crate::error::{VfsError, VfsResult};
use crate::types::{FileAttr, StatFs};

/// Core VFS operations trait.
///
/// The catalog is read-only. Mutating operations have default
/// implementations that fail with [`VfsError::ReadOnly`] whatever their
/// arguments.
pub trait VfsOps: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get file attributes.
    fn getattr(&self, path: &str) -> VfsResult<FileAttr>;

    /// Names of a directory's entries, in listing order.
    fn readdir(&self, path: &str) -> VfsResult<Vec<String>>;

    /// Open a file and return a handle.
    fn open(&self, path: &str, flags: i32) -> VfsResult<u64>;

    /// Read `size` bytes starting at `offset`.
    fn read(&self, path: &str, size: u32, offset: u64) -> VfsResult<Vec<u8>>;

    /// Read symbolic link target.
    fn readlink(&self, path: &str) -> VfsResult<String>;

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Get filesystem statistics.
    fn statfs(&self, path: &str) -> VfsResult<StatFs>;

    /// Get an extended attribute.
    fn getxattr(&self, path: &str, name: &str) -> VfsResult<Vec<u8>>;

    /// List extended attribute names.
    fn listxattr(&self, path: &str) -> VfsResult<Vec<String>>;

    // ========================================================================
    // Writing
    // ========================================================================

    fn create(&self, _path: &str, _mode: u32) -> VfsResult<u64> {
        Err(VfsError::ReadOnly)
    }

    fn write(&self, _path: &str, _data: &[u8], _offset: u64) -> VfsResult<u32> {
        Err(VfsError::ReadOnly)
    }

    fn truncate(&self, _path: &str, _size: u64) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    fn rename(&self, _from: &str, _to: &str) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    fn unlink(&self, _path: &str) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    fn mkdir(&self, _path: &str, _mode: u32) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    fn rmdir(&self, _path: &str) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    fn chmod(&self, _path: &str, _mode: u32) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    fn chown(&self, _path: &str, _uid: u32, _gid: u32) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    /// Create a symlink at `path` pointing to `target`.
    fn symlink(&self, _path: &str, _target: &str) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    /// Create a hard link at `newpath` pointing to `oldpath`.
    fn link(&self, _oldpath: &str, _newpath: &str) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    fn setxattr(&self, _path: &str, _name: &str, _value: &[u8], _flags: i32) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    fn removexattr(&self, _path: &str, _name: &str) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }

    fn utimens(
        &self,
        _path: &str,
        _atime: Option<SystemTime>,
        _mtime: Option<SystemTime>,
    ) -> VfsResult<()> {
        Err(VfsError::ReadOnly)
    }
}
