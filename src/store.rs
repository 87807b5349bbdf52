use std::fmt;
use std::sync::Arc;

use crate::payload::OcrResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct ResultStore {
    current: Option<Arc<OcrResult>>,
    generation: Generation,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, result: OcrResult) -> Generation {
        self.generation.0 += 1;
        self.current = Some(Arc::new(result));
        self.generation
    }

    pub fn clear(&mut self) -> Generation {
        self.generation.0 += 1;
        self.current = None;
        self.generation
    }

    pub fn current(&self) -> Option<&Arc<OcrResult>> {
        self.current.as_ref()
    }

    pub fn snapshot(&self) -> Option<Arc<OcrResult>> {
        self.current.clone()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, token: Generation) -> bool {
        token == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Detection, OcrResult};

    fn result_with_text(text: &str) -> OcrResult {
        OcrResult::from_text(text)
    }

    #[test]
    fn assign_replaces_whole_value_and_advances_generation() {
        let mut store = ResultStore::new();
        let first = store.assign(OcrResult {
            boxes: vec![Detection::new("a", [1.0, 2.0, 3.0, 4.0])],
            ..result_with_text("one")
        });
        assert!(store.is_current(first));
        assert_eq!(store.current().expect("current").text, "one");

        let second = store.assign(result_with_text("two"));
        assert_ne!(first, second);
        assert!(!store.is_current(first));
        assert!(store.is_current(second));
        let current = store.current().expect("current");
        assert_eq!(current.text, "two");
        assert!(current.boxes.is_empty());
    }

    #[test]
    fn clear_empties_store_and_advances_generation() {
        let mut store = ResultStore::new();
        let assigned = store.assign(result_with_text("one"));
        let cleared = store.clear();
        assert!(store.current().is_none());
        assert_ne!(assigned, cleared);
        assert!(!store.is_current(assigned));
        assert!(store.is_current(cleared));
    }

    #[test]
    fn snapshot_survives_later_assignments() {
        let mut store = ResultStore::new();
        store.assign(result_with_text("one"));
        let snapshot = store.snapshot().expect("snapshot");
        store.assign(result_with_text("two"));
        assert_eq!(snapshot.text, "one");
        assert_eq!(store.current().expect("current").text, "two");
    }
}
