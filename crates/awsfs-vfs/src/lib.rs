//! # awsfs-vfs
//!
//! Read-only virtual filesystem core for awsfs. A remote resource catalog is
//! exposed as a tree of [`Node`]s; this crate resolves paths in that tree,
//! caches remote listings, and turns remote failures into errno values.
//!
//! Key components:
//!
//! - [`Node`] - Closed set of directory, file and symlink variants
//! - [`LoadingCache`] - TTL memoization backing cached-lazy nodes
//! - [`resolve`] - Slash-delimited path walk from the root node
//! - [`classify`] - Remote failure → (errno, severity) table
//! - [`Dispatcher`] - Wraps every operation: tracing, classification, crash-only policy
//! - [`Operations`] - Host-facing surface over a [`VfsOps`] implementation
//! - [`RootBuilder`] - Static root populated by [`Provider`]s
//!
//! ## Design Decisions
//!
//! - **Path-based, no inodes**: Operations take absolute `/`-delimited paths.
//!   A kernel bridge handles inode ↔ path mapping on its side.
//! - **Synchronous**: Slow remote calls block the calling thread.
//! - **Crash-only**: A failure the classification table does not recognise
//!   aborts the process after flushing logs.

pub mod cache;
pub mod classify;
pub mod clock;
pub mod config;
pub mod dispatch;
mod errno;
mod error;
pub mod format;
mod fs;
mod host;
pub mod node;
mod ops;
pub mod provider;
pub mod resolve;
pub mod root;
mod types;

pub use cache::{LoadingCache, Ttl};
pub use classify::{Classification, ClassifyError, Classifier, ErrorTable, Severity, classify};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CatalogConfig, ConfigError};
pub use dispatch::{AbortOnCrash, CrashHandler, Dispatcher};
pub use errno::Errno;
pub use error::{VfsError, VfsResult};
pub use fs::CatalogFs;
pub use host::{Operations, StartupError};
pub use node::{Children, Node};
pub use ops::VfsOps;
pub use provider::{ProviderError, ServiceError};
pub use resolve::resolve;
pub use root::{Provider, RootBuilder};
pub use types::{FileAttr, FileType, StatFs};
