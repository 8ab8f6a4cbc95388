//! The interval lattice: formulas built from the two endpoints, interval
//! variables, and De Morgan connectives.
//!
//! `Formula` is a free distributive lattice with an order-reversing
//! involution on its generators — not a boolean algebra. In particular
//! `atom ∨ ¬atom` does *not* collapse to `1` for a free-standing atom; only
//! the literal endpoints (`0`/`1`) absorb that way. See the `excluded_middle`
//! test below.

use ctt_base::VarId;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Zero,
    One,
    Atom(VarId),
    Neg(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn and(a: Formula, b: Formula) -> Formula {
        Formula::And(Box::new(a), Box::new(b))
    }

    pub fn or(a: Formula, b: Formula) -> Formula {
        Formula::Or(Box::new(a), Box::new(b))
    }

    pub fn neg(a: Formula) -> Formula {
        Formula::Neg(Box::new(a))
    }

    /// A single literal: an atom or its negation, used when flattening
    /// conjunctions/disjunctions into a canonical, sorted form.
    fn literal_key(&self) -> Option<(VarId, bool)> {
        match self {
            Formula::Atom(v) => Some((*v, false)),
            Formula::Neg(inner) => match inner.as_ref() {
                Formula::Atom(v) => Some((*v, true)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Normalizes a formula by the interval-lattice laws: double-negation
/// elimination, De Morgan distribution of negation onto atoms, and
/// idempotent/absorbing simplification of nested `And`/`Or` chains.
///
/// Idempotent: `normalize(normalize(f)) == normalize(f)`.
pub fn normalize(f: &Formula) -> Formula {
    match f {
        Formula::Zero | Formula::One | Formula::Atom(_) => f.clone(),
        Formula::Neg(inner) => normalize_neg(normalize(inner)),
        Formula::And(a, b) => normalize_and(normalize(a), normalize(b)),
        Formula::Or(a, b) => normalize_or(normalize(a), normalize(b)),
    }
}

fn normalize_neg(inner: Formula) -> Formula {
    match inner {
        Formula::Zero => Formula::One,
        Formula::One => Formula::Zero,
        Formula::Neg(g) => *g,
        Formula::And(a, b) => normalize_or(normalize_neg(*a), normalize_neg(*b)),
        Formula::Or(a, b) => normalize_and(normalize_neg(*a), normalize_neg(*b)),
        atom @ Formula::Atom(_) => Formula::neg(atom),
    }
}

fn normalize_and(a: Formula, b: Formula) -> Formula {
    if a == Formula::Zero || b == Formula::Zero {
        return Formula::Zero;
    }
    if a == Formula::One {
        return b;
    }
    if b == Formula::One {
        return a;
    }
    if a == b {
        return a;
    }
    let mut parts = Vec::new();
    flatten(&a, &mut parts, true);
    flatten(&b, &mut parts, true);
    rebuild(parts, true)
}

fn normalize_or(a: Formula, b: Formula) -> Formula {
    if a == Formula::One || b == Formula::One {
        return Formula::One;
    }
    if a == Formula::Zero {
        return b;
    }
    if b == Formula::Zero {
        return a;
    }
    if a == b {
        return a;
    }
    let mut parts = Vec::new();
    flatten(&a, &mut parts, false);
    flatten(&b, &mut parts, false);
    rebuild(parts, false)
}

/// Flattens a chain of (already-normal) `And`s or `Or`s, matching `conj`,
/// into `out`.
fn flatten(f: &Formula, out: &mut Vec<Formula>, conj: bool) {
    match f {
        Formula::And(a, b) if conj => {
            flatten(a, out, conj);
            flatten(b, out, conj);
        }
        Formula::Or(a, b) if !conj => {
            flatten(a, out, conj);
            flatten(b, out, conj);
        }
        other => out.push(other.clone()),
    }
}

fn sort_key(f: &Formula) -> (u8, u64, bool) {
    match f.literal_key() {
        Some((v, neg)) => (0, var_key(v), neg),
        None => (1, 0, false),
    }
}

fn var_key(v: VarId) -> u64 {
    // `VarId` has no public accessor; its `Debug` form is stable within a
    // process and unique per id, which is all a sort key needs here.
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    v.hash(&mut hasher);
    hasher.finish()
}

fn rebuild(mut parts: Vec<Formula>, conj: bool) -> Formula {
    parts.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    parts.dedup();
    let mut iter = parts.into_iter();
    let first = iter.next().unwrap_or(if conj { Formula::One } else { Formula::Zero });
    iter.fold(first, |acc, next| {
        if conj {
            Formula::and(acc, next)
        } else {
            Formula::or(acc, next)
        }
    })
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Zero => write!(f, "0"),
            Formula::One => write!(f, "1"),
            Formula::Atom(v) => write!(f, "{:?}", v),
            Formula::Neg(a) => write!(f, "¬{}", a),
            Formula::And(a, b) => write!(f, "({} ∧ {})", a, b),
            Formula::Or(a, b) => write!(f, "({} ∨ {})", a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_endpoints_absorb() {
        let a = Formula::Atom(VarId::fresh());
        assert_eq!(normalize(&Formula::or(a.clone(), Formula::One)), Formula::One);
        assert_eq!(normalize(&Formula::and(a, Formula::Zero)), Formula::Zero);
    }

    #[test]
    fn double_negation_elim() {
        let a = Formula::Atom(VarId::fresh());
        assert_eq!(normalize(&Formula::neg(Formula::neg(a.clone()))), a);
    }

    #[test]
    fn de_morgan_pushes_negation_to_atoms() {
        let a = Formula::Atom(VarId::fresh());
        let b = Formula::Atom(VarId::fresh());
        let lhs = normalize(&Formula::neg(Formula::and(a.clone(), b.clone())));
        let rhs = normalize(&Formula::or(Formula::neg(a), Formula::neg(b)));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn idempotent_on_already_normal_input() {
        let a = Formula::Atom(VarId::fresh());
        let b = Formula::Atom(VarId::fresh());
        let once = normalize(&Formula::and(a, b));
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn excluded_middle_does_not_collapse_for_a_free_atom() {
        let a = Formula::Atom(VarId::fresh());
        let f = normalize(&Formula::or(a.clone(), Formula::neg(a)));
        assert_ne!(f, Formula::One);
    }

    #[test]
    fn commutative_conjunction_reaches_the_same_normal_form() {
        let a = Formula::Atom(VarId::fresh());
        let b = Formula::Atom(VarId::fresh());
        let lhs = normalize(&Formula::and(a.clone(), b.clone()));
        let rhs = normalize(&Formula::and(b, a));
        assert_eq!(lhs, rhs);
    }
}
