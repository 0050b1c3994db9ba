//! TTL loading cache.
//!
//! Memoizes an expensive computation per key. A miss (absent or expired)
//! runs the loader and stores the result with a fresh expiry; nothing is ever
//! evicted otherwise.
//!
//! The table lock is held for the freshness check and for the write-back,
//! never across the loader call. Two threads missing on the same key at the
//! same moment will both run the loader and the later write wins. Both
//! callers still get a valid value.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::provider::ProviderError;

/// Default lifetime of a cached listing.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// How long a loaded value stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TtlSetting", into = "TtlSetting")]
pub enum Ttl {
    /// Reload once this much time has passed since the value was stored.
    ExpiresAfter(Duration),
    /// Keep the first successful value for the life of the process.
    NeverExpires,
}

impl Ttl {
    pub fn seconds(secs: u64) -> Self {
        Ttl::ExpiresAfter(Duration::from_secs(secs))
    }

    /// Expiry instant for a value stored at `now`. `None` means never.
    fn expiry_from(self, now: Instant) -> Option<Instant> {
        match self {
            Ttl::ExpiresAfter(ttl) => now.checked_add(ttl),
            Ttl::NeverExpires => None,
        }
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl::ExpiresAfter(DEFAULT_TTL)
    }
}

/// Config-file spelling of a [`Ttl`]: `Seconds(60)` or `Never`.
///
/// Whole seconds only. A sub-second remainder is rounded up when written so
/// a short TTL never becomes `Seconds(0)`.
#[derive(Serialize, Deserialize)]
enum TtlSetting {
    Seconds(u64),
    Never,
}

impl From<TtlSetting> for Ttl {
    fn from(setting: TtlSetting) -> Self {
        match setting {
            TtlSetting::Seconds(secs) => Ttl::seconds(secs),
            TtlSetting::Never => Ttl::NeverExpires,
        }
    }
}

impl From<Ttl> for TtlSetting {
    fn from(ttl: Ttl) -> Self {
        match ttl {
            Ttl::ExpiresAfter(d) => {
                let partial = u64::from(d.subsec_nanos() > 0);
                TtlSetting::Seconds(d.as_secs().saturating_add(partial))
            }
            Ttl::NeverExpires => TtlSetting::Never,
        }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

type Loader<K, V, E> = dyn Fn(&K) -> Result<V, E> + Send + Sync;

/// Keyed cache that computes and stores a value on miss.
///
/// Failed loads are not stored: whatever was cached before stays in the
/// table, and the next `get` tries the loader again.
pub struct LoadingCache<K, V, E = ProviderError> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    loader: Box<Loader<K, V, E>>,
    ttl: Ttl,
    clock: Arc<dyn Clock>,
}

impl<K, V, E> fmt::Debug for LoadingCache<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl<K, V, E> LoadingCache<K, V, E>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
    E: fmt::Display,
{
    /// Create a cache on the system clock.
    pub fn new<F>(ttl: Ttl, loader: F) -> Self
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    {
        Self::with_clock(ttl, Arc::new(SystemClock), loader)
    }

    /// Create a cache on an explicit clock.
    pub fn with_clock<F>(ttl: Ttl, clock: Arc<dyn Clock>, loader: F) -> Self
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    {
        Self {
            entries: Mutex::new(HashMap::new()),
            loader: Box::new(loader),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Number of keys with a stored value, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Return the fresh value for `key`, loading it on a miss.
    pub fn get(&self, key: &K) -> Result<V, E> {
        if let Some(value) = self.fresh(key) {
            return Ok(value);
        }

        trace!(?key, "cache miss");
        let value = (self.loader)(key).inspect_err(|e| {
            debug!(?key, error = %e, "cache load failed");
        })?;

        let expires_at = self.ttl.expiry_from(self.clock.now());
        self.entries.lock().insert(
            key.clone(),
            CacheEntry {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(value)
    }

    fn fresh(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        match entry.expires_at {
            None => Some(entry.value.clone()),
            Some(at) if self.clock.now() < at => Some(entry.value.clone()),
            Some(_) => None,
        }
    }
}
