//! A process-wide cache of the built-in primitive terms each library needs
//! (the interval's endpoints, the universe hierarchy's base case, ...),
//! keyed by library identity so two libraries never share — or redundantly
//! rebuild — the same set.

use ctt_kernel::Term;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// The primitives a library's elaborator needs in scope before any of its
/// own source is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primitives {
    pub interval_zero: Term,
    pub interval_one: Term,
    pub base_universe: Term,
}

impl Primitives {
    fn build() -> Self {
        Primitives {
            interval_zero: Term::Formula(ctt_kernel::Formula::Zero),
            interval_one: Term::Formula(ctt_kernel::Formula::One),
            base_universe: Term::Type(0),
        }
    }
}

fn cache() -> &'static Mutex<HashMap<String, Arc<Primitives>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Arc<Primitives>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the shared `Primitives` for `library_id`, building them exactly
/// once per process.
pub fn primitives_for(library_id: &str) -> Arc<Primitives> {
    let mut guard = cache().lock().expect("primitive factory cache poisoned");
    guard
        .entry(library_id.to_string())
        .or_insert_with(|| Arc::new(Primitives::build()))
        .clone()
}
