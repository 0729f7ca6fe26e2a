//! Compiled-code store
//!
//! Code compiled on behalf of the host is kept here and referred to by an
//! opaque handle of the form `>N`. Handles come from a monotonic counter and
//! are never handed out twice, even after the entry has been released.

use std::collections::HashMap;
use std::fmt;

/// Leading byte that marks a `code` argument as a handle reference.
pub const HANDLE_SENTINEL: u8 = b'>';

/// Opaque reference to a stored compiled entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle(String);

impl Handle {
    fn issue(serial: u64) -> Self {
        Self(format!("{}{}", HANDLE_SENTINEL as char, serial))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a `code` argument refers to the store rather than being source.
    pub fn is_reference(code: &[u8]) -> bool {
        code.first() == Some(&HANDLE_SENTINEL)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle-keyed table of compiled entities.
#[derive(Debug)]
pub struct CompilationStore<E> {
    entries: HashMap<String, E>,
    next: u64,
}

impl<E> Default for CompilationStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> CompilationStore<E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next: 1,
        }
    }

    /// Take ownership of `entity` and return its freshly issued handle.
    pub fn insert(&mut self, entity: E) -> Handle {
        let handle = Handle::issue(self.next);
        self.next += 1;
        self.entries.insert(handle.0.clone(), entity);
        handle
    }

    /// Exact-match lookup; `>007` is not `>7`.
    pub fn get(&self, key: &[u8]) -> Option<&E> {
        std::str::from_utf8(key)
            .ok()
            .and_then(|key| self.entries.get(key))
    }

    /// Drop the entry for `key`. Unknown keys are ignored.
    pub fn release(&mut self, key: &[u8]) -> Option<E> {
        std::str::from_utf8(key)
            .ok()
            .and_then(|key| self.entries.remove(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_monotonic() {
        let mut store = CompilationStore::new();
        let a = store.insert("a");
        let b = store.insert("b");
        assert_eq!(a.as_str(), ">1");
        assert_eq!(b.as_str(), ">2");
        assert_eq!(store.get(b">1"), Some(&"a"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_handles_never_reused() {
        let mut store = CompilationStore::new();
        let first = store.insert(1);
        assert_eq!(store.release(first.as_str().as_bytes()), Some(1));
        let second = store.insert(2);
        assert_ne!(first, second);
        assert!(store.get(first.as_str().as_bytes()).is_none());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut store: CompilationStore<()> = CompilationStore::new();
        assert!(store.release(b">99").is_none());
        let h = store.insert(());
        assert!(store.release(h.as_str().as_bytes()).is_some());
        assert!(store.release(h.as_str().as_bytes()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut store = CompilationStore::new();
        store.insert('x');
        assert!(store.get(b">01").is_none());
        assert!(store.get(b"> 1").is_none());
        assert!(store.get(b">1").is_some());
        assert!(store.get(b"\xff").is_none());
    }

    #[test]
    fn test_reference_detection() {
        assert!(Handle::is_reference(b">3"));
        assert!(Handle::is_reference(b">"));
        assert!(!Handle::is_reference(b"3>2"));
        assert!(!Handle::is_reference(b""));
    }
}
