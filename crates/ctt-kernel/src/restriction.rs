//! Restrictions: disjunctions of conjunctions of interval equations
//! (`i = 0` / `i = 1`), the form face conditions take in partial elements
//! and in `Coe`.
//!
//! Unlike [`crate::formula::Formula`], a `Restriction` always normalizes to
//! one of exactly three shapes: `⊥` (no conjunction), `⊤` (a single empty
//! conjunction), or a canonical, deduplicated disjunctive normal form.

use ctt_base::VarId;
use std::fmt;

/// A single interval equation, `var = 1` if `value`, `var = 0` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Literal {
    pub var: VarId,
    pub value: bool,
}

/// A conjunction of equations, sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Conjunction(pub Vec<Literal>);

/// A disjunction of conjunctions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction(pub Vec<Conjunction>);

impl Restriction {
    /// `⊤`: the restriction satisfied everywhere.
    pub fn always() -> Restriction {
        Restriction(vec![Conjunction(Vec::new())])
    }

    /// `⊥`: the restriction satisfied nowhere.
    pub fn never() -> Restriction {
        Restriction(Vec::new())
    }

    pub fn is_always(&self) -> bool {
        self.0.len() == 1 && self.0[0].0.is_empty()
    }

    pub fn is_never(&self) -> bool {
        self.0.is_empty()
    }

    pub fn equation(var: VarId, value: bool) -> Restriction {
        Restriction(vec![Conjunction(vec![Literal { var, value }])])
    }

    pub fn conjoin(a: &Restriction, b: &Restriction) -> Restriction {
        let mut out = Vec::new();
        for ca in &a.0 {
            for cb in &b.0 {
                let mut lits = ca.0.clone();
                lits.extend(cb.0.iter().copied());
                out.push(Conjunction(lits));
            }
        }
        normalize(&Restriction(out))
    }

    pub fn disjoin(a: &Restriction, b: &Restriction) -> Restriction {
        let mut out = a.0.clone();
        out.extend(b.0.iter().cloned());
        normalize(&Restriction(out))
    }
}

/// Normalizes to `⊥`, `⊤`, or a canonical DNF.
///
/// Unsatisfiable conjunctions (containing both `v = 0` and `v = 1` for the
/// same `v`) are dropped; remaining conjunctions are sorted, deduplicated
/// internally and against each other; an empty conjunction anywhere absorbs
/// the whole disjunction to `⊤`.
pub fn normalize(r: &Restriction) -> Restriction {
    let mut conjunctions: Vec<Conjunction> = Vec::new();
    for c in &r.0 {
        let mut lits = c.0.clone();
        lits.sort();
        lits.dedup();
        if is_unsatisfiable(&lits) {
            continue;
        }
        if lits.is_empty() {
            return Restriction::always();
        }
        conjunctions.push(Conjunction(lits));
    }
    conjunctions.sort();
    conjunctions.dedup();
    Restriction(conjunctions)
}

fn is_unsatisfiable(lits: &[Literal]) -> bool {
    for i in 0..lits.len() {
        for j in (i + 1)..lits.len() {
            if lits[i].var == lits[j].var && lits[i].value != lits[j].value {
                return true;
            }
        }
    }
    false
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            return write!(f, "⊥");
        }
        if self.is_always() {
            return write!(f, "⊤");
        }
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ∨ ")?;
            }
            write!(f, "(")?;
            for (j, lit) in c.0.iter().enumerate() {
                if j > 0 {
                    write!(f, " ∧ ")?;
                }
                write!(f, "{:?}={}", lit.var, if lit.value { 1 } else { 0 })?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
