use super::template::Template;
use crate::cache_key::CacheKey;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Cache entries are separated per dialect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct FragmentKey {
    pub(crate) dialect: &'static str,
    pub(crate) key: CacheKey,
}

/// Bounded LRU of rendered templates.
///
/// Recency is a monotonically increasing stamp per entry. A hit re-stamps its
/// entry in `O(log n)` and never compares keys beyond the one hash lookup.
#[derive(Debug)]
pub(crate) struct FragmentCache {
    inner: Mutex<Templates>,
}

#[derive(Debug)]
struct Entry {
    template: Arc<Template>,
    stamp: u64,
}

#[derive(Debug)]
struct Templates {
    capacity: usize,
    entries: HashMap<Arc<FragmentKey>, Entry>,
    /// Stamp to key, least recently used first.
    recency: BTreeMap<u64, Arc<FragmentKey>>,
    clock: u64,
}

impl FragmentCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Templates {
                capacity,
                entries: HashMap::new(),
                recency: BTreeMap::new(),
                clock: 0,
            }),
        }
    }

    pub(crate) fn get(&self, key: &FragmentKey) -> Option<Arc<Template>> {
        self.inner.lock().unwrap().hit(key)
    }

    /// Insert unless another compilation got there first; either way return
    /// the entry now in the cache.
    pub(crate) fn insert_if_absent(&self, key: FragmentKey, template: Arc<Template>) -> Arc<Template> {
        let mut templates = self.inner.lock().unwrap();
        if let Some(existing) = templates.hit(&key) {
            return existing;
        }
        if templates.capacity == 0 {
            return template;
        }

        let stamp = templates.tick();
        let key = Arc::new(key);
        templates.recency.insert(stamp, Arc::clone(&key));
        templates.entries.insert(
            key,
            Entry {
                template: Arc::clone(&template),
                stamp,
            },
        );
        templates.evict_overflow();
        template
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub(crate) fn clear(&self) {
        let mut templates = self.inner.lock().unwrap();
        templates.entries.clear();
        templates.recency.clear();
    }
}

impl Templates {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// The cached template for `key`, marked most recently used.
    fn hit(&mut self, key: &FragmentKey) -> Option<Arc<Template>> {
        self.clock += 1;
        let entry = self.entries.get_mut(key)?;
        if let Some(shared) = self.recency.remove(&entry.stamp) {
            self.recency.insert(self.clock, shared);
        }
        entry.stamp = self.clock;
        Some(Arc::clone(&entry.template))
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_key::cache_key;
    use crate::node::column;

    fn key(name: &str) -> FragmentKey {
        FragmentKey {
            dialect: "test",
            key: cache_key(&column(name)).unwrap(),
        }
    }

    fn template(sql: &str) -> Arc<Template> {
        Arc::new(Template::from_text(sql))
    }

    #[test]
    fn first_insert_wins() {
        let cache = FragmentCache::new(4);
        let first = cache.insert_if_absent(key("a"), template("a"));
        let second = cache.insert_if_absent(key("a"), template("other"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = FragmentCache::new(2);
        cache.insert_if_absent(key("a"), template("a"));
        cache.insert_if_absent(key("b"), template("b"));
        assert!(cache.get(&key("a")).is_some());
        cache.insert_if_absent(key("c"), template("c"));

        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_none());
        assert!(cache.get(&key("c")).is_some());
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let cache = FragmentCache::new(0);
        cache.insert_if_absent(key("a"), template("a"));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn hits_restamp_in_place() {
        let cache = FragmentCache::new(3);
        for name in ["a", "b", "c"] {
            cache.insert_if_absent(key(name), template(name));
        }
        for _ in 0..100 {
            assert!(cache.get(&key("a")).is_some());
            assert!(cache.get(&key("b")).is_some());
        }
        {
            let templates = cache.inner.lock().unwrap();
            assert_eq!(templates.recency.len(), 3);
            assert_eq!(templates.entries.len(), 3);
        }

        // "c" has gone unused the longest.
        cache.insert_if_absent(key("d"), template("d"));
        assert!(cache.get(&key("c")).is_none());
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_some());
        assert!(cache.get(&key("d")).is_some());
    }

    #[test]
    fn clear_drops_recency() {
        let cache = FragmentCache::new(2);
        cache.insert_if_absent(key("a"), template("a"));
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert!(cache.inner.lock().unwrap().recency.is_empty());
    }

    #[test]
    fn dialects_do_not_share_entries() {
        let cache = FragmentCache::new(4);
        let mut other = key("a");
        other.dialect = "other";
        cache.insert_if_absent(key("a"), template("a"));
        assert!(cache.get(&other).is_none());
    }
}
