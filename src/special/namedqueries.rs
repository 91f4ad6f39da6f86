//! Storage seam for named queries.

use std::collections::BTreeMap;
use std::sync::RwLock;

/// Hint appended to the listing when no queries are saved.
pub const USAGE: &str = "
Named queries save frequently used queries under a short name.
Examples:

    # Save a new named query.
    > \\ns simple select * from abc where a is not Null;

    # List all named queries.
    > \\n

    # Run a named query.
    > \\n simple

    # Delete a named query.
    > \\nd simple
";

/// Where named queries live. Implementations use interior mutability so the
/// store can be shared by several handlers.
pub trait NamedQueryStore: Send + Sync {
    /// Names in sorted order.
    fn list(&self) -> Vec<String>;

    fn get(&self, name: &str) -> Option<String>;

    fn save(&self, name: &str, query: &str);

    /// Returns `false` when nothing was stored under `name`.
    fn delete(&self, name: &str) -> bool;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryNamedQueries {
    queries: RwLock<BTreeMap<String, String>>,
}

impl MemoryNamedQueries {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NamedQueryStore for MemoryNamedQueries {
    fn list(&self) -> Vec<String> {
        match self.queries.read() {
            Ok(queries) => queries.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn get(&self, name: &str) -> Option<String> {
        self.queries.read().ok()?.get(name).cloned()
    }

    fn save(&self, name: &str, query: &str) {
        if let Ok(mut queries) = self.queries.write() {
            queries.insert(name.to_string(), query.to_string());
        }
    }

    fn delete(&self, name: &str) -> bool {
        match self.queries.write() {
            Ok(mut queries) => queries.remove(name).is_some(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_get_delete() {
        let store = MemoryNamedQueries::new();
        store.save("b", "SELECT 2");
        store.save("a", "SELECT 1");

        assert_eq!(store.list(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.get("a").as_deref(), Some("SELECT 1"));
        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert_eq!(store.get("a"), None);
    }
}
