//! Root composition.
//!
//! The root of the filesystem is a static directory with one entry per
//! resource family, e.g. `/iam`, `/ec2`, `/s3`. Each entry is built by a
//! [`Provider`].

use std::sync::Arc;

use tracing::debug;

use crate::cache::Ttl;
use crate::node::Node;

/// Builds one resource family's subtree.
pub trait Provider: Send + Sync {
    /// Name of the root entry, e.g. `iam`.
    fn mount_name(&self) -> &str;

    /// The subtree. `cache_ttl` is the lifetime to give cached listings.
    fn root(&self, cache_ttl: Ttl) -> Node;
}

impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn mount_name(&self) -> &str {
        (**self).mount_name()
    }

    fn root(&self, cache_ttl: Ttl) -> Node {
        (**self).root(cache_ttl)
    }
}

/// Collects root entries in mount order.
#[derive(Debug, Default)]
pub struct RootBuilder {
    cache_ttl: Ttl,
    entries: Vec<(String, Node)>,
}

impl RootBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime handed to providers mounted after this call.
    pub fn cache_ttl(mut self, ttl: Ttl) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Mount an already-built node.
    pub fn mount(mut self, name: impl Into<String>, node: Node) -> Self {
        self.entries.push((name.into(), node));
        self
    }

    /// Mount a provider's subtree under its mount name.
    pub fn provider(self, provider: &dyn Provider) -> Self {
        let name = provider.mount_name().to_string();
        debug!(mount = %name, ttl = ?self.cache_ttl, "mounting provider");
        let node = provider.root(self.cache_ttl);
        self.mount(name, node)
    }

    pub fn build(self) -> Node {
        Node::StaticDirectory(Arc::new(self.entries))
    }
}
