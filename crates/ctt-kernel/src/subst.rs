//! Capture-avoiding substitution.
//!
//! Because binders carry a fresh [`ctt_base::VarId`] rather than a name,
//! substitution never needs to rename anything to avoid capture: a binder's
//! identity can never collide with a free variable coming from outside it,
//! since `VarId::fresh` never repeats. This mirrors the shadow-aware
//! recursive walk in the teacher's `substitute`, minus the name-clash
//! bookkeeping that walk needed.

use crate::formula::Formula;
use crate::term::{Binder, Clause, Cube, PartialElement, Pattern, Term};
use ctt_base::VarId;

/// Replaces every free occurrence of `var` in `term` with `replacement`.
pub fn substitute(term: &Term, var: VarId, replacement: &Term) -> Term {
    match term {
        Term::Type(_) => term.clone(),
        Term::Ref(v) => {
            if *v == var {
                replacement.clone()
            } else {
                term.clone()
            }
        }
        Term::Lam(binder, body) => Term::Lam(
            subst_binder(binder, var, replacement),
            Box::new(subst_under(binder.var, var, body, replacement)),
        ),
        Term::App(f, a) => Term::App(
            Box::new(substitute(f, var, replacement)),
            Box::new(substitute(a, var, replacement)),
        ),
        Term::Pi(binder, cod) => Term::Pi(
            subst_binder(binder, var, replacement),
            Box::new(subst_under(binder.var, var, cod, replacement)),
        ),
        Term::Sigma(binders) => Term::Sigma(subst_telescope(binders, var, replacement)),
        Term::Pair(fields) => Term::Pair(
            fields.iter().map(|t| substitute(t, var, replacement)).collect(),
        ),
        Term::Proj(p, i) => Term::Proj(Box::new(substitute(p, var, replacement)), *i),
        Term::Con(name, args) => Term::Con(
            *name,
            args.iter().map(|t| substitute(t, var, replacement)).collect(),
        ),
        Term::Match(scruts, clauses) => Term::Match(
            scruts.iter().map(|t| substitute(t, var, replacement)).collect(),
            clauses
                .iter()
                .map(|c| subst_clause(c, var, replacement))
                .collect(),
        ),
        Term::MetaPat(_) => term.clone(),
        Term::PLam(dims, body) => {
            if dims.contains(&var) {
                term.clone()
            } else {
                Term::PLam(dims.clone(), Box::new(substitute(body, var, replacement)))
            }
        }
        Term::PApp(of, args, cube) => Term::PApp(
            Box::new(substitute(of, var, replacement)),
            args.iter().map(|t| substitute(t, var, replacement)).collect(),
            subst_cube(cube, var, replacement),
        ),
        Term::PathTy { dim, ty, lhs, rhs } => {
            if *dim == var {
                term.clone()
            } else {
                Term::PathTy {
                    dim: *dim,
                    ty: Box::new(substitute(ty, var, replacement)),
                    lhs: Box::new(substitute(lhs, var, replacement)),
                    rhs: Box::new(substitute(rhs, var, replacement)),
                }
            }
        }
        Term::Formula(f) => Term::Formula(subst_formula(f, var, replacement)),
        Term::Partial(elem, rhs) => Term::Partial(
            subst_partial(elem, var, replacement),
            Box::new(substitute(rhs, var, replacement)),
        ),
        Term::PartialTy(ty, restr) => {
            Term::PartialTy(Box::new(substitute(ty, var, replacement)), restr.clone())
        }
        Term::Coe(restr, ty) => Term::Coe(restr.clone(), Box::new(substitute(ty, var, replacement))),
        Term::Erased(ty) => Term::Erased(Box::new(substitute(ty, var, replacement))),
    }
}

fn subst_binder(binder: &Binder, var: VarId, replacement: &Term) -> Binder {
    Binder {
        var: binder.var,
        name: binder.name,
        ty: Box::new(substitute(&binder.ty, var, replacement)),
    }
}

/// Substitutes under a binder, short-circuiting if the binder shadows `var`.
fn subst_under(bound: VarId, var: VarId, body: &Term, replacement: &Term) -> Term {
    if bound == var {
        body.clone()
    } else {
        substitute(body, var, replacement)
    }
}

fn subst_telescope(binders: &[Binder], var: VarId, replacement: &Term) -> Vec<Binder> {
    let mut out = Vec::with_capacity(binders.len());
    let mut shadowed = false;
    for b in binders {
        if shadowed {
            out.push(b.clone());
            continue;
        }
        out.push(subst_binder(b, var, replacement));
        if b.var == var {
            shadowed = true;
        }
    }
    out
}

fn subst_clause(clause: &Clause, var: VarId, replacement: &Term) -> Clause {
    if pattern_list_binds(&clause.patterns, var) {
        clause.clone()
    } else {
        Clause {
            patterns: clause.patterns.clone(),
            body: substitute(&clause.body, var, replacement),
        }
    }
}

fn pattern_list_binds(patterns: &[Pattern], var: VarId) -> bool {
    patterns.iter().any(|p| pattern_binds(p, var))
}

fn pattern_binds(pattern: &Pattern, var: VarId) -> bool {
    match pattern {
        Pattern::Bind(v) => *v == var,
        Pattern::Con(_, sub) => pattern_list_binds(sub, var),
        Pattern::MetaPat(_) => false,
    }
}

fn subst_cube(cube: &Cube, var: VarId, replacement: &Term) -> Cube {
    if cube.dims.contains(&var) {
        cube.clone()
    } else {
        Cube {
            dims: cube.dims.clone(),
            endpoint_ty: Box::new(substitute(&cube.endpoint_ty, var, replacement)),
            partial: subst_partial(&cube.partial, var, replacement),
        }
    }
}

fn subst_partial(elem: &PartialElement, var: VarId, replacement: &Term) -> PartialElement {
    match elem {
        PartialElement::Const(t) => PartialElement::Const(Box::new(substitute(t, var, replacement))),
        PartialElement::Split(clauses) => PartialElement::Split(
            clauses
                .iter()
                .map(|(r, t)| (r.clone(), substitute(t, var, replacement)))
                .collect(),
        ),
    }
}

/// Interval variables are a separate substitution domain (mapping a
/// dimension to `0`/`1`/another dimension) from term-variable substitution;
/// `Formula` itself carries no term, so a term substitution simply leaves it
/// untouched.
fn subst_formula(f: &Formula, _var: VarId, _replacement: &Term) -> Formula {
    f.clone()
}
