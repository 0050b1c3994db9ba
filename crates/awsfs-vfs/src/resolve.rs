//! Path resolution.

use crate::error::{VfsError, VfsResult};
use crate::node::Node;

/// Walk `path` from `root`.
///
/// `path` must be absolute. `/` is the root itself and a single trailing
/// slash is ignored, so `/iam/users/` names the same node as `/iam/users`.
/// Errors carry the prefix walked up to and including the failing segment.
pub fn resolve(root: &Node, path: &str) -> VfsResult<Node> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(VfsError::invalid_path(path));
    };

    let mut segments: Vec<&str> = rest.split('/').collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }

    let mut current = root.clone();
    let mut walked = String::new();
    for segment in segments {
        walked.push('/');
        walked.push_str(segment);

        if !current.is_dir() {
            return Err(VfsError::not_a_directory(walked));
        }
        current = match current.lookup_child(segment)? {
            Some(child) => child,
            None => return Err(VfsError::not_found(walked)),
        };
    }
    Ok(current)
}
