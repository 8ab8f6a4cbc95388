//! Scope entries: the record a name resolves to inside a module.

use ctt_base::Symbol;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_DECL_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a resolved declaration. Opaque outside this crate's callers;
/// the orchestrator maps it back to a source location and a kernel `Term`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    pub fn fresh() -> Self {
        DeclId(NEXT_DECL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Whether a name is visible outside the module that defines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    Public,
    Private,
}

/// Where a scope entry came from: defined locally, or brought in by an
/// import/open and (optionally) re-exported under a new path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Declared directly in the module that owns this entry.
    Local,
    /// Brought into scope from another module path, not re-exported.
    Imported { from: Vec<Symbol> },
    /// Brought into scope and re-exported, so importers of *this* module see
    /// it too.
    Reexported { from: Vec<Symbol> },
}

/// A single name binding inside a module's scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeEntry {
    /// The name as written at the use site, with no qualification.
    pub unqualified_name: Symbol,
    /// The fully qualified module path this entry is reached through.
    pub component_path: Vec<Symbol>,
    /// The declaration this name ultimately refers to.
    pub target: DeclId,
    pub accessibility: Accessibility,
    pub origin: Origin,
}

impl ScopeEntry {
    pub fn local(unqualified_name: Symbol, component_path: Vec<Symbol>, target: DeclId, accessibility: Accessibility) -> Self {
        ScopeEntry {
            unqualified_name,
            component_path,
            target,
            accessibility,
            origin: Origin::Local,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self.accessibility, Accessibility::Public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_decl_ids_are_pairwise_distinct() {
        assert_ne!(DeclId::fresh(), DeclId::fresh());
    }

    #[test]
    fn local_entry_has_local_origin() {
        let entry = ScopeEntry::local(Symbol::EMPTY, vec![], DeclId::fresh(), Accessibility::Public);
        assert_eq!(entry.origin, Origin::Local);
        assert!(entry.is_public());
    }
}
