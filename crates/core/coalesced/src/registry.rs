use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Key used to find tasks which are already running.
pub trait CoalescionKey: Hash + Eq + Clone {
    /// Whether this key cannot identify anything
    fn is_blank(&self) -> bool;

    /// Rendering of this key that is safe to log or expose
    fn redacted(&self) -> String;
}

impl<K: AsRef<str> + Hash + Eq + Clone> CoalescionKey for K {
    fn is_blank(&self) -> bool {
        self.as_ref().trim().is_empty()
    }

    fn redacted(&self) -> String {
        let chars: Vec<char> = self.as_ref().chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len().max(4));
        }

        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

/// Map of keys to the task currently running for them.
///
/// Holds at most one entry per key. The lock is never held across an await
/// point, so a plain mutex is enough even on multi-threaded runtimes.
#[derive(Debug)]
pub struct Registry<Id, Entry> {
    entries: Mutex<HashMap<Id, Entry>>,
}

impl<Id: Hash + Eq + Clone, Entry: Clone> Registry<Id, Entry> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Id, Entry>> {
        // Entries are only ever inserted or removed whole, a panic elsewhere
        // cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Find the entry for a key
    pub fn get(&self, id: &Id) -> Option<Entry> {
        self.lock().get(id).cloned()
    }

    /// Register an entry for a key that has none
    ///
    /// Returns false and leaves the existing entry alone if the key is taken.
    pub fn set(&self, id: Id, entry: Entry) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(&id) {
            false
        } else {
            entries.insert(id, entry);
            true
        }
    }

    /// Remove the entry for a key
    pub fn delete(&self, id: &Id) -> Option<Entry> {
        self.lock().remove(id)
    }

    /// Remove the entry for a key only if it is still the one we expect
    pub fn delete_if(&self, id: &Id, predicate: impl FnOnce(&Entry) -> bool) -> bool {
        let mut entries = self.lock();
        if entries.get(id).is_some_and(predicate) {
            entries.remove(id);
            true
        } else {
            false
        }
    }

    /// Run a closure with exclusive access to the entries
    pub(crate) fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<Id, Entry>) -> R) -> R {
        f(&mut self.lock())
    }

    /// Drop every entry, returning how many there were
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<Id> {
        self.lock().keys().cloned().collect()
    }
}

impl<Id, Entry> Default for Registry<Id, Entry> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoalescionKey, Registry};

    #[test]
    fn one_entry_per_key() {
        let registry = Registry::<String, u32>::new();

        assert!(registry.set("wallet".to_string(), 1));
        assert!(!registry.set("wallet".to_string(), 2));
        assert_eq!(registry.get(&"wallet".to_string()), Some(1));
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.delete(&"wallet".to_string()), Some(1));
        assert!(registry.get(&"wallet".to_string()).is_none());
        assert!(registry.delete(&"wallet".to_string()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn delete_if_leaves_replaced_entries() {
        let registry = Registry::<&'static str, u32>::new();
        registry.set("key", 7);

        assert!(!registry.delete_if(&"key", |entry| *entry == 3));
        assert_eq!(registry.get(&"key"), Some(7));
        assert!(registry.delete_if(&"key", |entry| *entry == 7));
        assert!(registry.is_empty());
    }

    #[test]
    fn clear_reports_count() {
        let registry = Registry::<String, ()>::new();
        registry.set("a".to_string(), ());
        registry.set("b".to_string(), ());

        let mut keys = registry.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.clear(), 2);
        assert_eq!(registry.clear(), 0);
    }

    #[test]
    fn keys_are_redacted() {
        assert_eq!(
            "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".redacted(),
            "7xKX...gAsU"
        );
        assert_eq!("ABC123".redacted(), "******");
        assert_eq!("ab".redacted(), "****");
        assert!("   ".is_blank());
        assert!(!"ABC123".is_blank());
    }
}
