//! In-memory certificate store.
//!
//! Keyed by full data name, queried by interest. Shared by every validation
//! running in the process; the bundle consumer fills it so subsequent chain
//! steps short-circuit the network.

use log::trace;
use ndn_bundle_common::name::Name;
use ndn_bundle_common::packet::{Data, Interest};
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    data: Data,
    inserted_at: Instant,
    last_access: u64,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        match self.data.freshness_period_ms() {
            Some(period) => now.duration_since(self.inserted_at) <= Duration::from_millis(period),
            None => false,
        }
    }
}

/// An LRU content store for certificates.
///
/// Unbounded by default; with a capacity set, the least recently accessed
/// entry is evicted on overflow.
pub struct CertificateCache {
    entries: HashMap<Name, CacheEntry>,
    capacity: Option<usize>,
    tick: u64,
    evictions: u64,
}

impl CertificateCache {
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            tick: 0,
            evictions: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries evicted so far.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Inserts or replaces by full data name. Idempotent on name.
    pub fn insert(&mut self, data: Data) {
        let name = data.name().clone();
        self.tick += 1;
        trace!("Cache insert: {}", name);
        self.entries.insert(
            name,
            CacheEntry {
                data,
                inserted_at: Instant::now(),
                last_access: self.tick,
            },
        );

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.evict_lru();
            }
        }
    }

    /// Returns the stored data best matching `interest`, or `None`.
    ///
    /// A candidate matches iff its name has the interest's name as a prefix,
    /// the suffix length is within the selector bounds, the first suffix
    /// component is not excluded, and the freshness constraint holds. Among
    /// multiple matches, childSelector 1 picks the lexicographically largest
    /// name, otherwise the smallest.
    pub fn find(&mut self, interest: &Interest) -> Option<Data> {
        let now = Instant::now();
        let selectors = interest.selectors();
        let prefix = interest.name();

        let best = self
            .entries
            .iter()
            .filter(|(name, entry)| {
                if !prefix.is_prefix_of(name) {
                    return false;
                }
                let suffix_len = (name.len() - prefix.len()) as u64;
                if selectors.min_suffix_components.is_some_and(|min| suffix_len < min) {
                    return false;
                }
                if selectors.max_suffix_components.is_some_and(|max| suffix_len > max) {
                    return false;
                }
                if let Some(first_suffix) = name.get(prefix.len() as isize) {
                    if selectors.exclude.is_excluded(first_suffix) {
                        return false;
                    }
                }
                if selectors.must_be_fresh && !entry.is_fresh(now) {
                    return false;
                }
                true
            })
            .map(|(name, _)| Name::clone(name))
            .reduce(|best, candidate| match selectors.child_selector {
                Some(1) => {
                    if candidate > best {
                        candidate
                    } else {
                        best
                    }
                }
                _ => {
                    if candidate < best {
                        candidate
                    } else {
                        best
                    }
                }
            })?;

        self.tick += 1;
        let entry = self.entries.get_mut(&best)?;
        entry.last_access = self.tick;
        Some(entry.data.clone())
    }

    fn evict_lru(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(name, _)| name.clone());
        if let Some(name) = victim {
            trace!("Cache evict: {}", name);
            self.entries.remove(&name);
            self.evictions += 1;
        }
    }
}

impl Default for CertificateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use ndn_bundle_common::packet::{Exclude, SignatureInfo};
    use ndn_bundle_common::name::NameComponent;

    fn entry(name: &str, freshness_ms: Option<u64>) -> Data {
        let mut data = Data::new(Name::from_string(name), Bytes::from_static(b"k"));
        data.set_freshness_period_ms(freshness_ms)
            .set_signature_info(SignatureInfo::default())
            .set_signature_value(Bytes::from_static(&[0u8; 32]));
        data
    }

    #[test]
    fn insert_is_idempotent_on_name() {
        let mut cache = CertificateCache::new();
        cache.insert(entry("/id/KEY/k/a/v1", None));
        cache.insert(entry("/id/KEY/k/a/v1", None));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn find_by_prefix() {
        let mut cache = CertificateCache::new();
        cache.insert(entry("/id/KEY/k1/self/v1", None));

        let interest = Interest::new(Name::from_string("/id/KEY/k1"));
        let found = cache.find(&interest).unwrap();
        assert_eq!(found.name(), &Name::from_string("/id/KEY/k1/self/v1"));

        let miss = Interest::new(Name::from_string("/other/KEY/k1"));
        assert!(cache.find(&miss).is_none());
    }

    #[test]
    fn child_selector_breaks_ties() {
        let mut cache = CertificateCache::new();
        cache.insert(entry("/id/KEY/k/a/v1", None));
        cache.insert(entry("/id/KEY/k/a/v2", None));

        let mut leftmost = Interest::new(Name::from_string("/id/KEY/k"));
        leftmost.set_child_selector(Some(0));
        assert_eq!(
            cache.find(&leftmost).unwrap().name(),
            &Name::from_string("/id/KEY/k/a/v1")
        );

        let mut rightmost = Interest::new(Name::from_string("/id/KEY/k"));
        rightmost.set_child_selector(Some(1));
        assert_eq!(
            cache.find(&rightmost).unwrap().name(),
            &Name::from_string("/id/KEY/k/a/v2")
        );
    }

    #[test]
    fn suffix_bounds_and_exclude() {
        let mut cache = CertificateCache::new();
        cache.insert(entry("/id/KEY/k/a/v1", None));

        let mut too_short = Interest::new(Name::from_string("/id/KEY/k"));
        too_short.set_max_suffix_components(Some(1));
        assert!(cache.find(&too_short).is_none());

        let mut bounded = Interest::new(Name::from_string("/id/KEY/k"));
        bounded.set_min_suffix_components(Some(1)).set_max_suffix_components(Some(2));
        assert!(cache.find(&bounded).is_some());

        let mut excluded = Interest::new(Name::from_string("/id/KEY/k"));
        let mut exclude = Exclude::new();
        exclude.push_component(NameComponent::from("a"));
        excluded.set_exclude(exclude);
        assert!(cache.find(&excluded).is_none());
    }

    #[test]
    fn must_be_fresh_requires_freshness() {
        let mut cache = CertificateCache::new();
        cache.insert(entry("/stale/KEY/k/a/v1", None));
        cache.insert(entry("/fresh/KEY/k/a/v1", Some(60_000)));

        let mut stale = Interest::new(Name::from_string("/stale/KEY/k"));
        stale.set_must_be_fresh(true);
        assert!(cache.find(&stale).is_none());

        let mut fresh = Interest::new(Name::from_string("/fresh/KEY/k"));
        fresh.set_must_be_fresh(true);
        assert!(cache.find(&fresh).is_some());
    }

    #[test]
    fn lru_eviction_respects_access_order() {
        let mut cache = CertificateCache::with_capacity(Some(2));
        cache.insert(entry("/a/KEY/k/i/v1", None));
        cache.insert(entry("/b/KEY/k/i/v1", None));

        // touch /a so /b becomes the LRU victim
        let touch = Interest::new(Name::from_string("/a"));
        assert!(cache.find(&touch).is_some());

        cache.insert(entry("/c/KEY/k/i/v1", None));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.evictions(), 1);
        assert!(cache.find(&Interest::new(Name::from_string("/b"))).is_none());
        assert!(cache.find(&Interest::new(Name::from_string("/a"))).is_some());
        assert!(cache.find(&Interest::new(Name::from_string("/c"))).is_some());
    }
}
