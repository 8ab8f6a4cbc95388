//! Weak-head and full normalization.
//!
//! `reduce_step` performs one rewrite according to the post-rules table
//! (β, cubical β, formula/restriction simplification, `Coe` dispatch, meta
//! inlining); `normalize` drives it to a fixed point under a fuel bound so a
//! pathological or ill-typed term can't hang the caller, the same contract
//! the teacher's `reduction.rs::normalize` makes with its own fuel counter.

use crate::coe;
use crate::context::Context;
use crate::formula;
use crate::partial;
use crate::restriction;
use crate::subst::substitute;
use crate::term::{Clause, Pattern, PartialElement, Term};

/// How far `normalize` should recurse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationKind {
    /// Stop as soon as the head is in weak-head normal form.
    Whnf,
    /// Recurse into every subterm as well.
    Full,
}

/// Reductions performed before giving up on termination; chosen to match the
/// generous-but-bounded fuel the teacher's kernel uses for the same purpose.
const FUEL: u32 = 10_000;

/// Normalizes `term` under `ctx`, to weak-head or full normal form depending
/// on `kind`.
pub fn normalize(ctx: &Context, term: &Term, kind: NormalizationKind) -> Term {
    let whnf = normalize_whnf(ctx, term);
    match kind {
        NormalizationKind::Whnf => whnf,
        NormalizationKind::Full => normalize_subterms(ctx, &whnf),
    }
}

fn normalize_whnf(ctx: &Context, term: &Term) -> Term {
    let mut current = term.clone();
    let mut fuel = FUEL;
    while fuel > 0 {
        match reduce_step(ctx, &current) {
            Some(next) => {
                current = next;
                fuel -= 1;
            }
            None => return current,
        }
    }
    current
}

/// Recurses into every subterm of an already-whnf term, normalizing each to
/// full normal form and re-weak-head-normalizing the result (a rewrite under
/// a binder can expose a new head redex one level up, e.g. `Proj` over a
/// freshly-normalized `Pair`).
fn normalize_subterms(ctx: &Context, term: &Term) -> Term {
    let rebuilt = match term {
        Term::Type(_) | Term::Ref(_) | Term::MetaPat(_) => term.clone(),
        Term::Lam(binder, body) => Term::Lam(
            crate::term::Binder {
                var: binder.var,
                name: binder.name,
                ty: Box::new(normalize(ctx, &binder.ty, NormalizationKind::Full)),
            },
            Box::new(normalize(ctx, body, NormalizationKind::Full)),
        ),
        Term::App(f, a) => Term::App(
            Box::new(normalize(ctx, f, NormalizationKind::Full)),
            Box::new(normalize(ctx, a, NormalizationKind::Full)),
        ),
        Term::Pi(binder, cod) => Term::Pi(
            crate::term::Binder {
                var: binder.var,
                name: binder.name,
                ty: Box::new(normalize(ctx, &binder.ty, NormalizationKind::Full)),
            },
            Box::new(normalize(ctx, cod, NormalizationKind::Full)),
        ),
        Term::Sigma(binders) => Term::Sigma(
            binders
                .iter()
                .map(|b| crate::term::Binder {
                    var: b.var,
                    name: b.name,
                    ty: Box::new(normalize(ctx, &b.ty, NormalizationKind::Full)),
                })
                .collect(),
        ),
        Term::Pair(fields) => Term::Pair(
            fields
                .iter()
                .map(|t| normalize(ctx, t, NormalizationKind::Full))
                .collect(),
        ),
        Term::Proj(p, i) => Term::Proj(Box::new(normalize(ctx, p, NormalizationKind::Full)), *i),
        Term::Con(name, args) => Term::Con(
            *name,
            args.iter()
                .map(|t| normalize(ctx, t, NormalizationKind::Full))
                .collect(),
        ),
        Term::Match(scruts, clauses) => Term::Match(
            scruts
                .iter()
                .map(|t| normalize(ctx, t, NormalizationKind::Full))
                .collect(),
            clauses
                .iter()
                .map(|c| Clause {
                    patterns: c.patterns.clone(),
                    body: normalize(ctx, &c.body, NormalizationKind::Full),
                })
                .collect(),
        ),
        Term::PLam(dims, body) => {
            Term::PLam(dims.clone(), Box::new(normalize(ctx, body, NormalizationKind::Full)))
        }
        Term::PApp(of, args, cube) => Term::PApp(
            Box::new(normalize(ctx, of, NormalizationKind::Full)),
            args.iter()
                .map(|t| normalize(ctx, t, NormalizationKind::Full))
                .collect(),
            crate::term::Cube {
                dims: cube.dims.clone(),
                endpoint_ty: Box::new(normalize(ctx, &cube.endpoint_ty, NormalizationKind::Full)),
                partial: normalize_partial(ctx, &cube.partial),
            },
        ),
        Term::PathTy { dim, ty, lhs, rhs } => Term::PathTy {
            dim: *dim,
            ty: Box::new(normalize(ctx, ty, NormalizationKind::Full)),
            lhs: Box::new(normalize(ctx, lhs, NormalizationKind::Full)),
            rhs: Box::new(normalize(ctx, rhs, NormalizationKind::Full)),
        },
        Term::Formula(f) => Term::Formula(formula::normalize(f)),
        Term::Partial(elem, rhs) => Term::Partial(
            normalize_partial(ctx, elem),
            Box::new(normalize(ctx, rhs, NormalizationKind::Full)),
        ),
        Term::PartialTy(ty, restr) => Term::PartialTy(
            Box::new(normalize(ctx, ty, NormalizationKind::Full)),
            restriction::normalize(restr),
        ),
        Term::Coe(restr, ty) => Term::Coe(
            restriction::normalize(restr),
            Box::new(normalize(ctx, ty, NormalizationKind::Full)),
        ),
        Term::Erased(ty) => Term::Erased(Box::new(normalize(ctx, ty, NormalizationKind::Full))),
    };
    normalize_whnf(ctx, &rebuilt)
}

fn normalize_partial(ctx: &Context, elem: &PartialElement) -> PartialElement {
    let flattened = partial::flatten(elem);
    match flattened {
        PartialElement::Const(t) => {
            PartialElement::Const(Box::new(normalize(ctx, &t, NormalizationKind::Full)))
        }
        PartialElement::Split(clauses) => PartialElement::Split(
            clauses
                .into_iter()
                .map(|(r, t)| (r, normalize(ctx, &t, NormalizationKind::Full)))
                .collect(),
        ),
    }
}

/// Performs exactly one rewrite, or returns `None` if `term`'s head is
/// already irreducible.
pub fn reduce_step(ctx: &Context, term: &Term) -> Option<Term> {
    match term {
        Term::Type(_) | Term::Ref(_) | Term::Lam(..) | Term::Pi(..) | Term::Sigma(_)
        | Term::Pair(_) | Term::PLam(..) | Term::PathTy { .. } => None,

        Term::App(f, a) => reduce_app(ctx, f, a),
        Term::Proj(p, i) => reduce_proj(ctx, p, *i),
        Term::Con(_, _) => None,
        Term::Match(scruts, clauses) => reduce_match(ctx, scruts, clauses),
        Term::MetaPat(m) => ctx.lookup_term(*m).cloned(),
        Term::PApp(of, args, cube) => reduce_papp(ctx, of, args, cube),
        Term::Formula(f) => {
            let n = formula::normalize(f);
            if &n == f {
                None
            } else {
                Some(Term::Formula(n))
            }
        }
        Term::Partial(elem, rhs) => {
            let flattened = partial::flatten(elem);
            if &flattened == elem {
                None
            } else {
                Some(Term::Partial(flattened, rhs.clone()))
            }
        }
        Term::PartialTy(ty, restr) => {
            let n = restriction::normalize(restr);
            if &n == restr {
                None
            } else {
                Some(Term::PartialTy(ty.clone(), n))
            }
        }
        Term::Coe(restr, ty) => coe::reduce_coe_step(restr, ty).or_else(|| {
            let n = restriction::normalize(restr);
            if &n == restr {
                None
            } else {
                Some(Term::Coe(n, ty.clone()))
            }
        }),
        Term::Erased(_) => None,
    }
}

fn reduce_app(ctx: &Context, f: &Term, a: &Term) -> Option<Term> {
    let f_whnf = normalize_whnf(ctx, f);
    match &f_whnf {
        Term::Lam(binder, body) => Some(substitute(body, binder.var, a)),
        _ if &f_whnf != f => Some(Term::App(Box::new(f_whnf), Box::new(a.clone()))),
        _ => None,
    }
}

fn reduce_proj(ctx: &Context, p: &Term, index: usize) -> Option<Term> {
    let p_whnf = normalize_whnf(ctx, p);
    match &p_whnf {
        Term::Pair(fields) => fields.get(index).cloned(),
        _ if &p_whnf != p => Some(Term::Proj(Box::new(p_whnf), index)),
        _ => None,
    }
}

fn reduce_papp(ctx: &Context, of: &Term, args: &[Term], cube: &crate::term::Cube) -> Option<Term> {
    let of_whnf = normalize_whnf(ctx, of);
    match &of_whnf {
        Term::Erased(ty) => {
            let mut result_ty = (**ty).clone();
            for (dim, arg) in cube.dims.iter().zip(args.iter()) {
                result_ty = substitute(&result_ty, *dim, arg);
            }
            Some(Term::Erased(Box::new(result_ty)))
        }
        Term::PLam(dims, body) => {
            let mut result = (**body).clone();
            for (dim, arg) in dims.iter().zip(args.iter()) {
                result = substitute(&result, *dim, arg);
            }
            Some(result)
        }
        _ => {
            let flattened = partial::flatten(&cube.partial);
            match &flattened {
                PartialElement::Const(u) => Some((**u).clone()),
                _ if &of_whnf != of || &flattened != &cube.partial => Some(Term::PApp(
                    Box::new(of_whnf),
                    args.to_vec(),
                    crate::term::Cube {
                        dims: cube.dims.clone(),
                        endpoint_ty: cube.endpoint_ty.clone(),
                        partial: flattened,
                    },
                )),
                _ => None,
            }
        }
    }
}

fn reduce_match(ctx: &Context, scruts: &[Term], clauses: &[Clause]) -> Option<Term> {
    let whnf_scruts: Vec<Term> = scruts.iter().map(|s| normalize_whnf(ctx, s)).collect();

    for clause in clauses {
        if clause.patterns.len() != whnf_scruts.len() {
            continue;
        }
        let mut bindings = Vec::new();
        if try_match_all(ctx, &clause.patterns, &whnf_scruts, &mut bindings) {
            let mut body = clause.body.clone();
            for (var, value) in bindings {
                body = substitute(&body, var, &value);
            }
            return Some(body);
        }
    }

    if whnf_scruts != scruts {
        Some(Term::Match(whnf_scruts, clauses.to_vec()))
    } else {
        None
    }
}

fn try_match_all(
    ctx: &Context,
    patterns: &[Pattern],
    scruts: &[Term],
    bindings: &mut Vec<(ctt_base::VarId, Term)>,
) -> bool {
    patterns
        .iter()
        .zip(scruts.iter())
        .all(|(p, s)| try_match(ctx, p, s, bindings))
}

fn try_match(
    ctx: &Context,
    pattern: &Pattern,
    scrutinee: &Term,
    bindings: &mut Vec<(ctt_base::VarId, Term)>,
) -> bool {
    match pattern {
        Pattern::Bind(var) => {
            bindings.push((*var, scrutinee.clone()));
            true
        }
        Pattern::Con(name, sub_patterns) => match scrutinee {
            Term::Con(scrut_name, args) if scrut_name == name && args.len() == sub_patterns.len() => {
                sub_patterns
                    .iter()
                    .zip(args.iter())
                    .all(|(p, a)| try_match(ctx, p, a, bindings))
            }
            _ => false,
        },
        Pattern::MetaPat(m) => match ctx.lookup_pattern(*m) {
            Some(resolved) => try_match(ctx, &resolved.clone(), scrutinee, bindings),
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Binder, Cube};
    use ctt_base::{Symbol, VarId};

    fn identity_lam() -> (VarId, Term) {
        let x = VarId::fresh();
        let binder = Binder {
            var: x,
            name: Symbol::EMPTY,
            ty: Box::new(Term::Type(0)),
        };
        (x, Term::Lam(binder, Box::new(Term::Ref(x))))
    }

    #[test]
    fn beta_reduces_application_of_identity() {
        let (_, id) = identity_lam();
        let ctx = Context::new();
        let applied = Term::App(Box::new(id), Box::new(Term::Type(7)));
        assert_eq!(normalize(&ctx, &applied, NormalizationKind::Whnf), Term::Type(7));
    }

    #[test]
    fn nested_beta_reduces_fully() {
        let (_, id) = identity_lam();
        let ctx = Context::new();
        let once = Term::App(Box::new(id.clone()), Box::new(Term::App(Box::new(id), Box::new(Term::Type(3)))));
        assert_eq!(normalize(&ctx, &once, NormalizationKind::Full), Term::Type(3));
    }

    #[test]
    fn projection_picks_the_right_pair_field() {
        let ctx = Context::new();
        let pair = Term::Pair(vec![Term::Type(1), Term::Type(2)]);
        let proj = Term::Proj(Box::new(pair), 1);
        assert_eq!(normalize(&ctx, &proj, NormalizationKind::Whnf), Term::Type(2));
    }

    #[test]
    fn coe_along_always_restriction_on_a_universe_reduces_to_identity() {
        let ctx = Context::new();
        let coerced = Term::Coe(restriction::Restriction::always(), Box::new(Term::Type(0)));
        let result = normalize(&ctx, &coerced, NormalizationKind::Whnf);
        match result {
            Term::Lam(binder, body) => assert_eq!(*body, Term::Ref(binder.var)),
            other => panic!("expected identity Lam, got {:?}", other),
        }
    }

    #[test]
    fn match_fires_the_matching_constructor_clause() {
        let ctx = Context::new();
        let mut interner = ctt_base::Interner::new();
        let zero = interner.intern("zero");
        let succ = interner.intern("succ");
        let bound = VarId::fresh();
        let clauses = vec![
            Clause {
                patterns: vec![Pattern::Con(zero, vec![])],
                body: Term::Type(0),
            },
            Clause {
                patterns: vec![Pattern::Con(succ, vec![Pattern::Bind(bound)])],
                body: Term::Ref(bound),
            },
        ];
        let scrutinee = Term::Con(succ, vec![Term::Type(9)]);
        let result = normalize(&ctx, &Term::Match(vec![scrutinee], clauses), NormalizationKind::Whnf);
        assert_eq!(result, Term::Type(9));
    }

    #[test]
    fn stuck_match_on_a_free_reference_does_not_reduce() {
        let ctx = Context::new();
        let mut interner = ctt_base::Interner::new();
        let zero = interner.intern("zero");
        let clauses = vec![Clause {
            patterns: vec![Pattern::Con(zero, vec![])],
            body: Term::Type(0),
        }];
        let scrutinee = Term::Ref(VarId::fresh());
        let term = Term::Match(vec![scrutinee.clone()], clauses);
        assert_eq!(normalize(&ctx, &term, NormalizationKind::Whnf), term);
    }

    #[test]
    fn plam_papp_beta_substitutes_the_dimension() {
        let ctx = Context::new();
        let dim = VarId::fresh();
        let body = Term::Ref(dim);
        let line = Term::PLam(vec![dim], Box::new(body));
        let cube = Cube {
            dims: vec![dim],
            endpoint_ty: Box::new(Term::Type(0)),
            partial: PartialElement::Split(vec![]),
        };
        let applied = Term::PApp(Box::new(line), vec![Term::Type(42)], cube);
        assert_eq!(normalize(&ctx, &applied, NormalizationKind::Whnf), Term::Type(42));
    }

    #[test]
    fn normalize_is_idempotent() {
        let ctx = Context::new();
        let (_, id) = identity_lam();
        let applied = Term::App(Box::new(id), Box::new(Term::Type(1)));
        let once = normalize(&ctx, &applied, NormalizationKind::Full);
        let twice = normalize(&ctx, &once, NormalizationKind::Full);
        assert_eq!(once, twice);
    }
}
