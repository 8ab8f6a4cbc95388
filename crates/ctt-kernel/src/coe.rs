//! The cubical coercion operator, `Coe(restriction, line)`.
//!
//! Reduction dispatches on the shape of the coerced type: the identity
//! restriction is the identity function regardless of shape; coercing along
//! a universe is likewise the identity; coercing along a path type never
//! reduces further (it is eliminated, not computed, by path application
//! instead); `Pi` and `Sigma` rebuild a transport function structurally,
//! pushing `Coe` into the domain/codomain (Pi) or into each telescope field
//! (Sigma) rather than transporting the whole value in one step.

use crate::restriction::Restriction;
use crate::subst::substitute;
use crate::term::{Binder, Term};
use ctt_base::{Symbol, VarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodomainShape {
    Path,
    Pi,
    Sigma,
    Type,
    Other,
}

pub fn codomain_shape(ty: &Term) -> CodomainShape {
    match ty {
        Term::PathTy { .. } => CodomainShape::Path,
        Term::Pi(..) => CodomainShape::Pi,
        Term::Sigma(..) => CodomainShape::Sigma,
        Term::Type(_) => CodomainShape::Type,
        _ => CodomainShape::Other,
    }
}

/// One step of `Coe` reduction, or `None` if it is already in normal form.
pub fn reduce_coe_step(restr: &Restriction, ty: &Term) -> Option<Term> {
    if restr.is_always() {
        return Some(identity_at(ty));
    }
    match codomain_shape(ty) {
        CodomainShape::Type => Some(identity_at(ty)),
        CodomainShape::Path => None,
        CodomainShape::Pi => Some(reduce_pi(restr, ty)),
        CodomainShape::Sigma => Some(reduce_sigma(restr, ty)),
        CodomainShape::Other => None,
    }
}

fn identity_at(ty: &Term) -> Term {
    let var = VarId::fresh();
    let binder = Binder {
        var,
        name: Symbol::EMPTY,
        ty: Box::new(ty.clone()),
    };
    Term::Lam(binder, Box::new(Term::Ref(var)))
}

/// The Π-coercion rule: a λ over the old function `f` and a new argument
/// `x`, whose body coerces along the codomain with `x` coerced backward
/// along the domain before being fed to `f`.
fn reduce_pi(restr: &Restriction, ty: &Term) -> Term {
    let (dom_binder, cod) = match ty {
        Term::Pi(b, c) => (b, c),
        _ => unreachable!("reduce_pi called on a non-Pi shape"),
    };
    let f = VarId::fresh();
    let x = VarId::fresh();

    let backward_arg = Term::App(
        Box::new(Term::Coe(restr.clone(), dom_binder.ty.clone())),
        Box::new(Term::Ref(x)),
    );
    let cod_at_arg = substitute(cod, dom_binder.var, &backward_arg);
    let old_applied = Term::App(Box::new(Term::Ref(f)), Box::new(Term::Ref(x)));
    let body = Term::App(
        Box::new(Term::Coe(restr.clone(), Box::new(cod_at_arg))),
        Box::new(old_applied),
    );

    let inner = Term::Lam(
        Binder {
            var: x,
            name: dom_binder.name,
            ty: dom_binder.ty.clone(),
        },
        Box::new(body),
    );
    Term::Lam(
        Binder {
            var: f,
            name: Symbol::EMPTY,
            ty: Box::new(ty.clone()),
        },
        Box::new(inner),
    )
}

/// The Σ-coercion rule: a λ over the old pair `p`, producing a pair of
/// coerced components — later fields substitute the already-coerced
/// earlier components into their (dependent) field types first.
fn reduce_sigma(restr: &Restriction, ty: &Term) -> Term {
    let binders = match ty {
        Term::Sigma(bs) => bs,
        _ => unreachable!("reduce_sigma called on a non-Sigma shape"),
    };
    let p = VarId::fresh();
    let mut coerced_so_far: Vec<(VarId, Term)> = Vec::new();
    let mut components = Vec::with_capacity(binders.len());

    for (index, binder) in binders.iter().enumerate() {
        let mut field_ty = (*binder.ty).clone();
        for (var, replacement) in &coerced_so_far {
            field_ty = substitute(&field_ty, *var, replacement);
        }
        let projected = Term::Proj(Box::new(Term::Ref(p)), index);
        let coerced = Term::App(Box::new(Term::Coe(restr.clone(), Box::new(field_ty))), Box::new(projected));
        coerced_so_far.push((binder.var, coerced.clone()));
        components.push(coerced);
    }

    Term::Lam(
        Binder {
            var: p,
            name: Symbol::EMPTY,
            ty: Box::new(ty.clone()),
        },
        Box::new(Term::Pair(components)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restriction::Restriction;

    #[test]
    fn coe_along_a_universe_is_the_identity_function() {
        let result = reduce_coe_step(&Restriction::always(), &Term::Type(0)).unwrap();
        match result {
            Term::Lam(binder, body) => assert_eq!(*body, Term::Ref(binder.var)),
            other => panic!("expected Lam, got {:?}", other),
        }
    }

    #[test]
    fn coe_along_a_path_type_never_reduces() {
        let dim = VarId::fresh();
        let path = Term::PathTy {
            dim,
            ty: Box::new(Term::Type(0)),
            lhs: Box::new(Term::Ref(VarId::fresh())),
            rhs: Box::new(Term::Ref(VarId::fresh())),
        };
        assert_eq!(reduce_coe_step(&Restriction::always(), &path), None);
    }

    #[test]
    fn codomain_shape_dispatches_on_all_five_cases() {
        assert_eq!(codomain_shape(&Term::Type(0)), CodomainShape::Type);
        assert_eq!(codomain_shape(&Term::Con(Symbol::EMPTY, vec![])), CodomainShape::Other);
    }

    #[test]
    fn non_identity_restriction_along_a_universe_is_still_the_identity() {
        let v = VarId::fresh();
        let restr = Restriction::equation(v, true);
        let result = reduce_coe_step(&restr, &Term::Type(0)).unwrap();
        match result {
            Term::Lam(binder, body) => assert_eq!(*body, Term::Ref(binder.var)),
            other => panic!("expected Lam, got {:?}", other),
        }
    }

    #[test]
    fn coe_along_pi_produces_a_function_taking_the_old_function_and_a_new_argument() {
        let v = VarId::fresh();
        let restr = Restriction::equation(v, true);
        let dom_var = VarId::fresh();
        let pi = Term::Pi(
            Binder {
                var: dom_var,
                name: Symbol::EMPTY,
                ty: Box::new(Term::Type(0)),
            },
            Box::new(Term::Type(0)),
        );
        let result = reduce_coe_step(&restr, &pi).unwrap();
        match result {
            Term::Lam(f_binder, inner) => {
                assert_eq!(*f_binder.ty, pi);
                match *inner {
                    Term::Lam(_, body) => match *body {
                        Term::App(coe_cod, old_applied) => {
                            assert!(matches!(*coe_cod, Term::Coe(..)));
                            assert!(matches!(*old_applied, Term::App(..)));
                        }
                        other => panic!("expected App body, got {:?}", other),
                    },
                    other => panic!("expected inner Lam, got {:?}", other),
                }
            }
            other => panic!("expected outer Lam, got {:?}", other),
        }
    }

    #[test]
    fn coe_along_sigma_produces_a_pair_of_coerced_projections() {
        let v = VarId::fresh();
        let restr = Restriction::equation(v, true);
        let field_var = VarId::fresh();
        let sigma = Term::Sigma(vec![
            Binder {
                var: field_var,
                name: Symbol::EMPTY,
                ty: Box::new(Term::Type(0)),
            },
            Binder {
                var: VarId::fresh(),
                name: Symbol::EMPTY,
                ty: Box::new(Term::Ref(field_var)),
            },
        ]);
        let result = reduce_coe_step(&restr, &sigma).unwrap();
        match result {
            Term::Lam(_, body) => match *body {
                Term::Pair(fields) => {
                    assert_eq!(fields.len(), 2);
                    for field in &fields {
                        assert!(matches!(field, Term::App(f, _) if matches!(**f, Term::Coe(..))));
                    }
                    match &fields[1] {
                        Term::App(_, proj) => assert!(matches!(**proj, Term::Proj(_, 1))),
                        other => panic!("expected App, got {:?}", other),
                    }
                }
                other => panic!("expected Pair body, got {:?}", other),
            },
            other => panic!("expected Lam, got {:?}", other),
        }
    }
}
