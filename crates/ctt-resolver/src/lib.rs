//! Module and scope resolution: which names are visible where, and the
//! admission rules that decide what happens when two bindings collide.
//!
//! This crate knows nothing about terms or types — it resolves *names* to
//! opaque [`entry::DeclId`]s. The orchestrator is what maps a `DeclId` back
//! to a parsed declaration and, eventually, a `ctt_kernel::Term`.

mod context;
mod entry;
mod error;

pub use context::{ContextFlavor, ModuleContext, ModuleId, UseHideFilter, UseHideStrategy};
pub use entry::{Accessibility, DeclId, Origin, ScopeEntry};
pub use error::{ResolverError, ResolverResult, ResolverWarning};
