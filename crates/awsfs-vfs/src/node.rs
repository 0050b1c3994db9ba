//! The node model.
//!
//! A [`Node`] is a directory, a file or a symlink, in one of six variants:
//!
//! | Variant | Kind | Calls out? |
//! |---|---|---|
//! | `StaticDirectory` | directory | never |
//! | `LazyDirectory` | directory | every listing |
//! | `CachedLazyDirectory` | directory | on cache miss |
//! | `StaticFile` | file | never |
//! | `LazyFile` | file | every read, or on cache miss when cached |
//! | `Symlink` | symlink | never |
//!
//! Nodes are immutable once built and cheap to clone; clones share the same
//! supplier and cache state.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{LoadingCache, Ttl};
use crate::clock::{Clock, SystemClock};
use crate::error::{VfsError, VfsResult};
use crate::format::to_json;
use crate::provider::ProviderError;
use crate::types::FileType;

/// An ordered directory listing.
pub type Children = Arc<Vec<(String, Node)>>;

type ListFn = dyn Fn() -> Result<Vec<(String, Node)>, ProviderError> + Send + Sync;
type ReadFn = dyn Fn() -> Result<Vec<u8>, ProviderError> + Send + Sync;

/// A filesystem entity.
#[derive(Clone)]
pub enum Node {
    StaticDirectory(Children),
    LazyDirectory(Arc<ListFn>),
    CachedLazyDirectory(Arc<LoadingCache<(), Children>>),
    StaticFile(Arc<[u8]>),
    LazyFile(LazyFile),
    Symlink(Arc<str>),
}

/// A file whose bytes come from a supplier.
#[derive(Clone)]
pub struct LazyFile {
    source: FileSource,
    size: Option<u64>,
}

#[derive(Clone)]
enum FileSource {
    Direct(Arc<ReadFn>),
    Cached(Arc<LoadingCache<(), Arc<[u8]>>>),
}

impl LazyFile {
    fn read(&self) -> Result<Arc<[u8]>, ProviderError> {
        match &self.source {
            FileSource::Direct(supplier) => supplier().map(Arc::from),
            FileSource::Cached(cache) => cache.get(&()),
        }
    }
}

impl Node {
    // ========================================================================
    // Construction
    // ========================================================================

    /// A directory with fixed contents.
    pub fn static_dir<I, S>(children: I) -> Self
    where
        I: IntoIterator<Item = (S, Node)>,
        S: Into<String>,
    {
        let children = children
            .into_iter()
            .map(|(name, node)| (name.into(), node))
            .collect();
        Node::StaticDirectory(Arc::new(children))
    }

    /// A directory listed by calling `supplier` every time.
    pub fn lazy_dir<F>(supplier: F) -> Self
    where
        F: Fn() -> Result<Vec<(String, Node)>, ProviderError> + Send + Sync + 'static,
    {
        Node::LazyDirectory(Arc::new(supplier))
    }

    /// A lazy directory whose listing is cached for `ttl`.
    pub fn cached_dir<F>(ttl: Ttl, supplier: F) -> Self
    where
        F: Fn() -> Result<Vec<(String, Node)>, ProviderError> + Send + Sync + 'static,
    {
        Self::cached_dir_with_clock(ttl, Arc::new(SystemClock), supplier)
    }

    /// [`Node::cached_dir`] on an explicit clock.
    pub fn cached_dir_with_clock<F>(ttl: Ttl, clock: Arc<dyn Clock>, supplier: F) -> Self
    where
        F: Fn() -> Result<Vec<(String, Node)>, ProviderError> + Send + Sync + 'static,
    {
        let cache: LoadingCache<(), Children> =
            LoadingCache::with_clock(ttl, clock, move |_: &()| supplier().map(Arc::new));
        Node::CachedLazyDirectory(Arc::new(cache))
    }

    /// A file with fixed contents.
    pub fn static_file(contents: impl Into<Vec<u8>>) -> Self {
        let contents: Vec<u8> = contents.into();
        Node::StaticFile(Arc::from(contents))
    }

    /// A file holding the canonical JSON rendering of `value`.
    pub fn json_file<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Node::static_file(to_json(value)?))
    }

    /// A file read by calling `supplier`. Its size is measured by reading it.
    ///
    /// Prefer [`Node::lazy_file_sized`] when the size is known: `getattr`
    /// runs on every `ls`, and an unsized lazy file makes each one a remote
    /// call.
    pub fn lazy_file<F>(supplier: F) -> Self
    where
        F: Fn() -> Result<Vec<u8>, ProviderError> + Send + Sync + 'static,
    {
        Node::LazyFile(LazyFile {
            source: FileSource::Direct(Arc::new(supplier)),
            size: None,
        })
    }

    /// A lazy file with a size known up front.
    pub fn lazy_file_sized<F>(size: u64, supplier: F) -> Self
    where
        F: Fn() -> Result<Vec<u8>, ProviderError> + Send + Sync + 'static,
    {
        Node::LazyFile(LazyFile {
            source: FileSource::Direct(Arc::new(supplier)),
            size: Some(size),
        })
    }

    /// A lazy file whose contents are cached for `ttl`.
    pub fn cached_file<F>(ttl: Ttl, size: Option<u64>, supplier: F) -> Self
    where
        F: Fn() -> Result<Vec<u8>, ProviderError> + Send + Sync + 'static,
    {
        Self::cached_file_with_clock(ttl, Arc::new(SystemClock), size, supplier)
    }

    /// [`Node::cached_file`] on an explicit clock.
    pub fn cached_file_with_clock<F>(
        ttl: Ttl,
        clock: Arc<dyn Clock>,
        size: Option<u64>,
        supplier: F,
    ) -> Self
    where
        F: Fn() -> Result<Vec<u8>, ProviderError> + Send + Sync + 'static,
    {
        let cache: LoadingCache<(), Arc<[u8]>> =
            LoadingCache::with_clock(ttl, clock, move |_: &()| supplier().map(Arc::from));
        Node::LazyFile(LazyFile {
            source: FileSource::Cached(Arc::new(cache)),
            size,
        })
    }

    /// A symlink to `target`, usually a relative path such as `../../groups/admins`.
    pub fn symlink(target: impl Into<String>) -> Self {
        let target: String = target.into();
        Node::Symlink(Arc::from(target))
    }

    // ========================================================================
    // Contract
    // ========================================================================

    pub fn kind(&self) -> FileType {
        match self {
            Node::StaticDirectory(_) | Node::LazyDirectory(_) | Node::CachedLazyDirectory(_) => {
                FileType::Directory
            }
            Node::StaticFile(_) | Node::LazyFile(_) => FileType::File,
            Node::Symlink(_) => FileType::Symlink,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind().is_dir()
    }

    /// The ordered listing of a directory.
    pub fn list_children(&self) -> VfsResult<Children> {
        match self {
            Node::StaticDirectory(children) => Ok(Arc::clone(children)),
            Node::LazyDirectory(supplier) => Ok(Arc::new(supplier()?)),
            Node::CachedLazyDirectory(cache) => Ok(cache.get(&())?),
            _ => Err(VfsError::not_a_directory(format!("{} node", self.kind()))),
        }
    }

    /// The first child called `name`, if any.
    pub fn lookup_child(&self, name: &str) -> VfsResult<Option<Node>> {
        let children = self.list_children()?;
        Ok(children
            .iter()
            .find(|(child_name, _)| child_name == name)
            .map(|(_, node)| node.clone()))
    }

    /// The bytes of a file, or a symlink's target.
    pub fn read_content(&self) -> VfsResult<Arc<[u8]>> {
        match self {
            Node::StaticFile(contents) => Ok(Arc::clone(contents)),
            Node::LazyFile(file) => Ok(file.read()?),
            Node::Symlink(target) => Ok(Arc::from(target.as_bytes())),
            _ => Err(VfsError::is_a_directory(format!("{} node", self.kind()))),
        }
    }

    /// Size in bytes. Zero for directories; a declared size is returned
    /// without reading.
    pub fn content_length(&self) -> VfsResult<u64> {
        match self {
            Node::StaticDirectory(_) | Node::LazyDirectory(_) | Node::CachedLazyDirectory(_) => {
                Ok(0)
            }
            Node::StaticFile(contents) => Ok(contents.len() as u64),
            Node::LazyFile(LazyFile { size: Some(size), .. }) => Ok(*size),
            Node::LazyFile(file) => Ok(file.read()?.len() as u64),
            Node::Symlink(target) => Ok(target.len() as u64),
        }
    }

    /// The target of a symlink.
    pub fn symlink_target(&self) -> Option<&str> {
        match self {
            Node::Symlink(target) => Some(&**target),
            _ => None,
        }
    }

    /// True if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::StaticDirectory(a), Node::StaticDirectory(b)) => Arc::ptr_eq(a, b),
            (Node::LazyDirectory(a), Node::LazyDirectory(b)) => Arc::ptr_eq(a, b),
            (Node::CachedLazyDirectory(a), Node::CachedLazyDirectory(b)) => Arc::ptr_eq(a, b),
            (Node::StaticFile(a), Node::StaticFile(b)) => Arc::ptr_eq(a, b),
            (Node::LazyFile(a), Node::LazyFile(b)) => match (&a.source, &b.source) {
                (FileSource::Direct(x), FileSource::Direct(y)) => Arc::ptr_eq(x, y),
                (FileSource::Cached(x), FileSource::Cached(y)) => Arc::ptr_eq(x, y),
                _ => false,
            },
            (Node::Symlink(a), Node::Symlink(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Node::StaticDirectory(_) => "StaticDirectory",
            Node::LazyDirectory(_) => "LazyDirectory",
            Node::CachedLazyDirectory(_) => "CachedLazyDirectory",
            Node::StaticFile(_) => "StaticFile",
            Node::LazyFile(_) => "LazyFile",
            Node::Symlink(_) => "Symlink",
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.variant_name());
        match self {
            Node::StaticDirectory(children) => {
                let names: Vec<&str> = children.iter().map(|(name, _)| name.as_str()).collect();
                s.field("children", &names);
            }
            Node::CachedLazyDirectory(cache) => {
                s.field("ttl", &cache.ttl());
            }
            Node::StaticFile(contents) => {
                s.field("len", &contents.len());
            }
            Node::LazyFile(file) => {
                s.field("size", &file.size);
            }
            Node::Symlink(target) => {
                s.field("target", target);
            }
            Node::LazyDirectory(_) => {}
        }
        s.finish()
    }
}
