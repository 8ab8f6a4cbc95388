//! Shared server state: open documents and a single-writer-per-library
//! discipline so a stale in-flight compile can't clobber the result of a
//! newer one, grounded in the teacher's `DashMap`-backed `ServerState`.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tower_lsp::lsp_types::Url;

/// An open document's text and version, as the editor last reported it.
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub text: String,
    pub version: i32,
}

/// A ticket proving a writer was the most recent one to start work on a
/// library when it began. `commit` only succeeds if no newer writer has
/// since started — stale work is silently dropped instead of racing to
/// overwrite fresher results.
pub struct WriteTicket<'a> {
    library: &'a str,
    generation: u64,
    state: &'a OrchestratorState,
}

impl<'a> WriteTicket<'a> {
    /// Commits `value`, unless a newer writer for this library has already
    /// started (in which case `false` is returned and `value` is dropped).
    pub fn commit<T>(self, value: T, slot: &Mutex<Option<T>>) -> bool {
        let current = self.state.generation_of(self.library);
        if current != self.generation {
            return false;
        }
        *slot.lock().expect("write slot poisoned") = Some(value);
        true
    }
}

/// Process-wide server state.
#[derive(Default)]
pub struct OrchestratorState {
    pub documents: DashMap<Url, DocumentState>,
    generations: Mutex<HashMap<String, u64>>,
}

impl OrchestratorState {
    pub fn new() -> Self {
        OrchestratorState {
            documents: DashMap::new(),
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub fn open_document(&self, uri: Url, text: String, version: i32) {
        self.documents.insert(uri, DocumentState { text, version });
    }

    pub fn update_document(&self, uri: &Url, text: String, version: i32) {
        if let Some(mut doc) = self.documents.get_mut(uri) {
            doc.text = text;
            doc.version = version;
        }
    }

    pub fn close_document(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    fn generation_of(&self, library: &str) -> u64 {
        *self
            .generations
            .lock()
            .expect("generation map poisoned")
            .get(library)
            .unwrap_or(&0)
    }

    /// Starts a new write attempt for `library`, superseding any writer
    /// still in flight for it.
    pub fn begin_write<'a>(&'a self, library: &'a str) -> WriteTicket<'a> {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let generation = NEXT.fetch_add(1, Ordering::Relaxed);
        self.generations
            .lock()
            .expect("generation map poisoned")
            .insert(library.to_string(), generation);
        WriteTicket {
            library,
            generation,
            state: self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_superseded_writer_fails_to_commit() {
        let state = OrchestratorState::new();
        let slot: Mutex<Option<i32>> = Mutex::new(None);

        let stale = state.begin_write("lib");
        let fresh = state.begin_write("lib");

        assert!(fresh.commit(2, &slot));
        assert!(!stale.commit(1, &slot));
        assert_eq!(*slot.lock().unwrap(), Some(2));
    }

    #[test]
    fn documents_round_trip_through_open_update_close() {
        let state = OrchestratorState::new();
        let uri = Url::parse("file:///a.ctt").unwrap();
        state.open_document(uri.clone(), "Type0".to_string(), 1);
        assert_eq!(state.documents.get(&uri).unwrap().version, 1);
        state.update_document(&uri, "Type1".to_string(), 2);
        assert_eq!(state.documents.get(&uri).unwrap().text, "Type1");
        state.close_document(&uri);
        assert!(state.documents.get(&uri).is_none());
    }
}
