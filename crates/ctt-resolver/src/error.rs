//! Errors and warnings raised while building a module's scope.

use ctt_base::Symbol;
use std::fmt;

/// A hard failure: the admission rule refuses to register the entry at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// An `import`/`open` names a module path that was never registered.
    ModuleNotFound(Vec<Symbol>),

    /// The exact same module path was imported twice.
    DuplicateModule(Vec<Symbol>),

    /// Two entries with the same unqualified name and the same component
    /// path were both defined locally.
    DuplicateName { name: Symbol, path: Vec<Symbol> },

    /// A reference to a name that resolves to nothing in scope.
    UnknownName(Symbol),
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverError::ModuleNotFound(path) => {
                write!(f, "module not found: {}", render_path(path))
            }
            ResolverError::DuplicateModule(path) => {
                write!(f, "module imported twice: {}", render_path(path))
            }
            ResolverError::DuplicateName { name, path } => {
                write!(f, "duplicate name {:?} in {}", name, render_path(path))
            }
            ResolverError::UnknownName(name) => write!(f, "unknown name: {:?}", name),
        }
    }
}

impl std::error::Error for ResolverError {}

/// A non-fatal condition worth surfacing to the user, but that does not stop
/// the entry from being registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverWarning {
    /// A newly imported name shadows one already visible under a shorter or
    /// equally qualified path.
    ShadowingWarn { name: Symbol },

    /// The same module becomes visible under two different qualified paths.
    ModShadowingWarn { path: Vec<Symbol> },

    /// An unqualified name resolves to more than one candidate and the
    /// choice was broken arbitrarily (first registration wins).
    AmbiguousNameWarn { name: Symbol, candidates: usize },
}

impl fmt::Display for ResolverWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverWarning::ShadowingWarn { name } => write!(f, "{:?} shadows an existing binding", name),
            ResolverWarning::ModShadowingWarn { path } => {
                write!(f, "module {} is now reachable under more than one path", render_path(path))
            }
            ResolverWarning::AmbiguousNameWarn { name, candidates } => write!(
                f,
                "{:?} is ambiguous between {} candidates; keeping the first registered",
                name, candidates
            ),
        }
    }
}

fn render_path(path: &[Symbol]) -> String {
    path.iter()
        .map(|s| format!("{:?}", s))
        .collect::<Vec<_>>()
        .join("::")
}

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_module_error_mentions_the_path() {
        let err = ResolverError::DuplicateModule(vec![Symbol::EMPTY]);
        assert!(err.to_string().contains("imported twice"));
    }
}
