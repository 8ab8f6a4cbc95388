//! Flattening of partial elements.
//!
//! A `Split` with a single clause whose restriction is `⊤` is really just a
//! constant; a `Const` that itself wraps another partial element should be
//! merged into it. `flatten` applies both collapses until neither fires.

use crate::restriction::{self, Restriction};
use crate::term::{PartialElement, Term};

pub fn flatten(elem: &PartialElement) -> PartialElement {
    match elem {
        PartialElement::Const(t) => match t.as_ref() {
            Term::Partial(inner, _rhs) => flatten(inner),
            _ => PartialElement::Const(t.clone()),
        },
        PartialElement::Split(clauses) => {
            let normalized: Vec<(Restriction, Term)> = clauses
                .iter()
                .map(|(r, t)| (restriction::normalize(r), t.clone()))
                .filter(|(r, _)| !r.is_never())
                .collect();
            if normalized.len() == 1 && normalized[0].0.is_always() {
                return PartialElement::Const(Box::new(normalized[0].1.clone()));
            }
            PartialElement::Split(normalized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctt_base::VarId;

    #[test]
    fn single_total_clause_collapses_to_const() {
        let split = PartialElement::Split(vec![(Restriction::always(), Term::Type(0))]);
        assert_eq!(flatten(&split), PartialElement::Const(Box::new(Term::Type(0))));
    }

    #[test]
    fn never_clauses_are_dropped() {
        let v = VarId::fresh();
        let split = PartialElement::Split(vec![
            (Restriction::never(), Term::Type(1)),
            (Restriction::equation(v, true), Term::Type(2)),
        ]);
        match flatten(&split) {
            PartialElement::Split(clauses) => assert_eq!(clauses.len(), 1),
            other => panic!("expected Split, got {:?}", other),
        }
    }

    #[test]
    fn nested_const_partial_is_merged() {
        let inner = PartialElement::Const(Box::new(Term::Type(3)));
        let nested = PartialElement::Const(Box::new(Term::Partial(
            inner.clone(),
            Box::new(Term::Type(0)),
        )));
        assert_eq!(flatten(&nested), inner);
    }
}
