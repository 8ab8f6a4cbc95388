//! Pure structural atoms shared across the workspace.
//!
//! Nothing here performs I/O or knows about files, libraries, or the editor
//! protocol — those concerns live in `ctt-orchestrator`. This crate only
//! supplies the small, dependency-free building blocks: interned strings,
//! source spans, and identity-based variable handles.

mod intern;
mod span;
mod var;

pub use intern::{Interner, Symbol, SymbolEq};
pub use span::Span;
pub use var::VarId;
