//! The catalog filesystem: [`VfsOps`] over a root [`Node`].

use tracing::trace;

use crate::error::{VfsError, VfsResult};
use crate::node::Node;
use crate::ops::VfsOps;
use crate::resolve::resolve;
use crate::types::{FileAttr, FileType, StatFs};

/// Read-only filesystem over a tree of nodes.
///
/// Holds no state besides the root; caching lives in the nodes.
#[derive(Debug, Clone)]
pub struct CatalogFs {
    root: Node,
}

impl CatalogFs {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    fn lookup(&self, path: &str) -> VfsResult<Node> {
        resolve(&self.root, path)
    }
}

impl VfsOps for CatalogFs {
    fn getattr(&self, path: &str) -> VfsResult<FileAttr> {
        let node = self.lookup(path)?;
        let attr = match node.kind() {
            FileType::Directory => FileAttr::directory(),
            FileType::File => FileAttr::file(node.content_length()?),
            FileType::Symlink => FileAttr::symlink(node.content_length()?),
        };
        Ok(attr)
    }

    fn readdir(&self, path: &str) -> VfsResult<Vec<String>> {
        let node = self.lookup(path)?;
        let children = node
            .list_children()
            .map_err(|e| with_path(e, path))?;
        Ok(children.iter().map(|(name, _)| name.clone()).collect())
    }

    fn open(&self, path: &str, _flags: i32) -> VfsResult<u64> {
        let node = self.lookup(path)?;
        if node.is_dir() {
            return Err(VfsError::is_a_directory(path));
        }
        Ok(0)
    }

    /// Returns nothing at all, rather than a short read, when the requested
    /// range runs past the end of the content.
    fn read(&self, path: &str, size: u32, offset: u64) -> VfsResult<Vec<u8>> {
        let node = self.lookup(path)?;
        let content = node.read_content().map_err(|e| with_path(e, path))?;

        let len = content.len() as u64;
        let end = match offset.checked_add(u64::from(size)) {
            Some(end) if end <= len => end,
            _ => {
                trace!(path, offset, size, len, "read past end");
                return Ok(Vec::new());
            }
        };
        Ok(content[offset as usize..end as usize].to_vec())
    }

    fn readlink(&self, path: &str) -> VfsResult<String> {
        let node = self.lookup(path)?;
        match node.symlink_target() {
            Some(target) => Ok(target.to_string()),
            None => Err(VfsError::not_a_symlink(path)),
        }
    }

    fn statfs(&self, _path: &str) -> VfsResult<StatFs> {
        Ok(StatFs::default())
    }

    fn getxattr(&self, _path: &str, _name: &str) -> VfsResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn listxattr(&self, _path: &str) -> VfsResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Replace the node-level detail of a kind mismatch with the caller's path.
fn with_path(err: VfsError, path: &str) -> VfsError {
    match err {
        VfsError::NotADirectory(_) => VfsError::not_a_directory(path),
        VfsError::IsADirectory(_) => VfsError::is_a_directory(path),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fs() -> CatalogFs {
        CatalogFs::new(Node::static_dir([
            ("greeting", Node::static_file("hello")),
            ("empty", Node::static_file("")),
            (
                "iam",
                Node::static_dir([
                    ("users", Node::static_dir(Vec::<(String, Node)>::new())),
                    ("admin", Node::symlink("../groups/admin")),
                ]),
            ),
        ]))
    }

    #[test]
    fn test_getattr_kinds() {
        let fs = fs();

        let root = fs.getattr("/").unwrap();
        assert!(root.is_dir());
        assert_eq!(root.perm, 0o755);
        assert_eq!(root.nlink, 2);
        assert_eq!(root.size, 0);

        let file = fs.getattr("/greeting").unwrap();
        assert!(file.is_file());
        assert_eq!(file.size, 5);
        assert_eq!(file.nlink, 1);

        let link = fs.getattr("/iam/admin").unwrap();
        assert!(link.is_symlink());
        assert_eq!(link.size, "../groups/admin".len() as u64);
    }

    #[test]
    fn test_getattr_missing() {
        assert!(matches!(fs().getattr("/nope"), Err(VfsError::NotFound(_))));
    }

    #[test]
    fn test_readdir_order() {
        assert_eq!(fs().readdir("/").unwrap(), ["greeting", "empty", "iam"]);
        assert!(fs().readdir("/iam/users").unwrap().is_empty());
    }

    #[test]
    fn test_readdir_on_file() {
        match fs().readdir("/greeting") {
            Err(VfsError::NotADirectory(path)) => assert_eq!(path, "/greeting"),
            other => panic!("expected NotADirectory, got {other:?}"),
        }
    }

    #[test]
    fn test_open() {
        let fs = fs();
        assert_eq!(fs.open("/greeting", libc::O_RDONLY).unwrap(), 0);
        assert_eq!(fs.open("/iam/admin", libc::O_RDONLY).unwrap(), 0);
        assert!(matches!(fs.open("/iam", libc::O_RDONLY), Err(VfsError::IsADirectory(_))));
    }

    #[test]
    fn test_read_ranges() {
        let fs = fs();
        assert!(fs.read("/greeting", 10, 0).unwrap().is_empty());
        assert_eq!(fs.read("/greeting", 3, 0).unwrap(), b"hel");
        assert_eq!(fs.read("/greeting", 3, 2).unwrap(), b"llo");
        assert_eq!(fs.read("/greeting", 5, 0).unwrap(), b"hello");
        assert!(fs.read("/greeting", 0, 5).unwrap().is_empty());
        assert!(fs.read("/greeting", 1, u64::MAX).unwrap().is_empty());
        assert!(fs.read("/empty", 0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_read_directory() {
        assert!(matches!(fs().read("/iam", 10, 0), Err(VfsError::IsADirectory(_))));
    }

    #[test]
    fn test_readlink() {
        let fs = fs();
        assert_eq!(fs.readlink("/iam/admin").unwrap(), "../groups/admin");
        assert!(matches!(fs.readlink("/greeting"), Err(VfsError::NotASymlink(_))));
        assert!(matches!(fs.readlink("/iam"), Err(VfsError::NotASymlink(_))));
    }

    #[test]
    fn test_metadata_stubs() {
        let fs = fs();
        assert_eq!(fs.statfs("/").unwrap(), StatFs::default());
        assert!(fs.getxattr("/does/not/exist", "user.tag").unwrap().is_empty());
        assert!(fs.listxattr("/does/not/exist").unwrap().is_empty());
    }

    #[test]
    fn test_getattr_uses_declared_size() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let fs = CatalogFs::new(Node::static_dir([(
            "object",
            Node::lazy_file_sized(1 << 20, move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            }),
        )]));

        assert_eq!(fs.getattr("/object").unwrap().size, 1 << 20);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mutators_are_read_only() {
        let fs = fs();
        assert!(matches!(fs.create("/new", 0o644), Err(VfsError::ReadOnly)));
        assert!(matches!(fs.write("/greeting", b"x", 0), Err(VfsError::ReadOnly)));
        assert!(matches!(fs.mkdir("/iam/new", 0o755), Err(VfsError::ReadOnly)));
        assert!(matches!(fs.unlink("/greeting"), Err(VfsError::ReadOnly)));
    }
}
