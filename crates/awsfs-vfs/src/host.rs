//! Host-facing operation surface.
//!
//! A kernel bridge holds one [`Operations`] and forwards each call. Every
//! call goes through the [`Dispatcher`], so the bridge only ever sees an
//! [`Errno`].

use std::sync::Arc;
use std::time::SystemTime;

use awsfs_telemetry::{Telemetry, TelemetryError};
use thiserror::Error;
use tracing::info;

use crate::config::CatalogConfig;
use crate::dispatch::Dispatcher;
use crate::errno::Errno;
use crate::fs::CatalogFs;
use crate::ops::VfsOps;
use crate::root::{Provider, RootBuilder};
use crate::types::{FileAttr, StatFs};

/// Failures during startup wiring.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// The filesystem as the host sees it.
#[derive(Debug)]
pub struct Operations<F: VfsOps = CatalogFs> {
    fs: F,
    dispatcher: Dispatcher,
}

impl Operations<CatalogFs> {
    /// Wire up telemetry, the root and the dispatcher from configuration.
    pub fn from_config(
        config: &CatalogConfig,
        providers: &[Arc<dyn Provider>],
    ) -> Result<Self, StartupError> {
        let telemetry = Arc::new(Telemetry::init(&config.log)?);

        let root = tracing::dispatcher::with_default(telemetry.dispatch(), || {
            let root = providers
                .iter()
                .fold(RootBuilder::new().cache_ttl(config.cache_ttl), |builder, p| {
                    builder.provider(&**p)
                })
                .build();
            info!(providers = providers.len(), ttl = ?config.cache_ttl, "catalog ready");
            root
        });

        Ok(Self::new(CatalogFs::new(root), Dispatcher::new(telemetry)))
    }
}

impl<F: VfsOps> Operations<F> {
    pub fn new(fs: F, dispatcher: Dispatcher) -> Self {
        Self { fs, dispatcher }
    }

    /// Flush log sinks before the host exits.
    pub fn shutdown(&self) {
        self.dispatcher.telemetry().flush();
    }

    // ========================================================================
    // Reading
    // ========================================================================

    pub fn getattr(&self, path: &str) -> Result<FileAttr, Errno> {
        self.dispatcher
            .call("getattr", &(path,), || self.fs.getattr(path))
    }

    pub fn readdir(&self, path: &str) -> Result<Vec<String>, Errno> {
        self.dispatcher
            .call("readdir", &(path,), || self.fs.readdir(path))
    }

    pub fn open(&self, path: &str, flags: i32) -> Result<u64, Errno> {
        self.dispatcher
            .call("open", &(path, flags), || self.fs.open(path, flags))
    }

    pub fn read(&self, path: &str, size: u32, offset: u64) -> Result<Vec<u8>, Errno> {
        self.dispatcher.call("read", &(path, size, offset), || {
            self.fs.read(path, size, offset)
        })
    }

    pub fn readlink(&self, path: &str) -> Result<String, Errno> {
        self.dispatcher
            .call("readlink", &(path,), || self.fs.readlink(path))
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub fn statfs(&self, path: &str) -> Result<StatFs, Errno> {
        self.dispatcher
            .call("statfs", &(path,), || self.fs.statfs(path))
    }

    pub fn getxattr(&self, path: &str, name: &str) -> Result<Vec<u8>, Errno> {
        self.dispatcher
            .call("getxattr", &(path, name), || self.fs.getxattr(path, name))
    }

    pub fn listxattr(&self, path: &str) -> Result<Vec<String>, Errno> {
        self.dispatcher
            .call("listxattr", &(path,), || self.fs.listxattr(path))
    }

    // ========================================================================
    // Writing
    // ========================================================================

    pub fn create(&self, path: &str, mode: u32) -> Result<u64, Errno> {
        self.dispatcher
            .call("create", &(path, mode), || self.fs.create(path, mode))
    }

    pub fn write(&self, path: &str, data: &[u8], offset: u64) -> Result<u32, Errno> {
        self.dispatcher.call("write", &(path, data.len(), offset), || {
            self.fs.write(path, data, offset)
        })
    }

    pub fn truncate(&self, path: &str, size: u64) -> Result<(), Errno> {
        self.dispatcher
            .call("truncate", &(path, size), || self.fs.truncate(path, size))
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<(), Errno> {
        self.dispatcher
            .call("rename", &(from, to), || self.fs.rename(from, to))
    }

    pub fn unlink(&self, path: &str) -> Result<(), Errno> {
        self.dispatcher
            .call("unlink", &(path,), || self.fs.unlink(path))
    }

    pub fn mkdir(&self, path: &str, mode: u32) -> Result<(), Errno> {
        self.dispatcher
            .call("mkdir", &(path, mode), || self.fs.mkdir(path, mode))
    }

    pub fn rmdir(&self, path: &str) -> Result<(), Errno> {
        self.dispatcher
            .call("rmdir", &(path,), || self.fs.rmdir(path))
    }

    pub fn chmod(&self, path: &str, mode: u32) -> Result<(), Errno> {
        self.dispatcher
            .call("chmod", &(path, mode), || self.fs.chmod(path, mode))
    }

    pub fn chown(&self, path: &str, uid: u32, gid: u32) -> Result<(), Errno> {
        self.dispatcher
            .call("chown", &(path, uid, gid), || self.fs.chown(path, uid, gid))
    }

    pub fn symlink(&self, path: &str, target: &str) -> Result<(), Errno> {
        self.dispatcher
            .call("symlink", &(path, target), || self.fs.symlink(path, target))
    }

    pub fn link(&self, oldpath: &str, newpath: &str) -> Result<(), Errno> {
        self.dispatcher
            .call("link", &(oldpath, newpath), || self.fs.link(oldpath, newpath))
    }

    pub fn setxattr(&self, path: &str, name: &str, value: &[u8], flags: i32) -> Result<(), Errno> {
        self.dispatcher
            .call("setxattr", &(path, name, value.len(), flags), || {
                self.fs.setxattr(path, name, value, flags)
            })
    }

    pub fn removexattr(&self, path: &str, name: &str) -> Result<(), Errno> {
        self.dispatcher
            .call("removexattr", &(path, name), || self.fs.removexattr(path, name))
    }

    pub fn utimens(
        &self,
        path: &str,
        atime: Option<SystemTime>,
        mtime: Option<SystemTime>,
    ) -> Result<(), Errno> {
        self.dispatcher
            .call("utimens", &(path, atime, mtime), || {
                self.fs.utimens(path, atime, mtime)
            })
    }
}
