//! Term normalizer for a dependent type theory with cubical primitives.
//!
//! This crate is pure: no I/O, no file paths, no diagnostics. Given a
//! [`Term`] and a [`Context`] of solved metas, it computes weak-head or full
//! normal forms. Everything about *where terms come from* — parsing,
//! elaboration, module resolution — is someone else's problem; this crate
//! only rewrites.

mod coe;
mod context;
mod formula;
mod partial;
mod reduction;
mod restriction;
mod subst;
mod term;

pub use coe::{codomain_shape, reduce_coe_step, CodomainShape};
pub use context::Context;
pub use formula::{normalize as normalize_formula, Formula};
pub use partial::flatten as flatten_partial;
pub use reduction::{normalize, reduce_step, NormalizationKind};
pub use restriction::{normalize as normalize_restriction, Conjunction, Literal, Restriction};
pub use subst::substitute;
pub use term::{Binder, Clause, Cube, Located, MetaId, PartialElement, Pattern, Term};
