//! Meta-solution lookup.
//!
//! The kernel itself never *solves* a meta (that's the elaborator's job,
//! upstream of this crate) — it only needs to ask, while normalizing,
//! whether one has already been solved and inline the answer if so. Grown by
//! `extend`, mirroring the teacher's `Context`, which is also an
//! immutable-growth, `HashMap`-backed environment.

use crate::term::{MetaId, Pattern, Term};
use std::collections::HashMap;

/// Solutions recorded for term-level metas and pattern-level metas.
#[derive(Debug, Clone, Default)]
pub struct Context {
    term_metas: HashMap<MetaId, Term>,
    pattern_metas: HashMap<MetaId, Pattern>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    pub fn solve_meta(&self, child: &Context) -> Context {
        let mut term_metas = self.term_metas.clone();
        term_metas.extend(child.term_metas.clone());
        let mut pattern_metas = self.pattern_metas.clone();
        pattern_metas.extend(child.pattern_metas.clone());
        Context {
            term_metas,
            pattern_metas,
        }
    }

    pub fn with_term_solution(&self, meta: MetaId, solution: Term) -> Context {
        let mut term_metas = self.term_metas.clone();
        term_metas.insert(meta, solution);
        Context {
            term_metas,
            pattern_metas: self.pattern_metas.clone(),
        }
    }

    pub fn with_pattern_solution(&self, meta: MetaId, solution: Pattern) -> Context {
        let mut pattern_metas = self.pattern_metas.clone();
        pattern_metas.insert(meta, solution);
        Context {
            term_metas: self.term_metas.clone(),
            pattern_metas,
        }
    }

    pub fn lookup_term(&self, meta: MetaId) -> Option<&Term> {
        self.term_metas.get(&meta)
    }

    pub fn lookup_pattern(&self, meta: MetaId) -> Option<&Pattern> {
        self.pattern_metas.get(&meta)
    }
}
