//! The term language normalized by this crate.
//!
//! Every value in the theory is a `Term`: types, functions, proofs, and the
//! cubical primitives (paths, partial elements, coercions) are all the same
//! syntactic category, the same way the teacher's Calculus of Constructions
//! kernel treats `Nat : Type 0` and `zero : Nat` as the same kind of node.
//!
//! A handful of shapes beyond the spec's "at least these" list are present
//! (`Con`, `Pair`, `Type`, `PathTy`) — they are the introduction/classifier
//! forms the listed shapes need in order to actually reduce against
//! something (see `DESIGN.md`).

use ctt_base::{Span, Symbol, VarId};
use std::fmt;

/// A binder: a fresh variable identity, its source name (display only), and
/// its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binder {
    pub var: VarId,
    pub name: Symbol,
    pub ty: Box<Term>,
}

/// Opaque handle to a pattern meta — a hole in a match clause's pattern that
/// may later be solved to a concrete pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaId(pub u32);

/// A single clause in a `Match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub patterns: Vec<Pattern>,
    pub body: Term,
}

/// Patterns matched against scrutinees in a `Match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches anything, binding the scrutinee to `var`.
    Bind(VarId),
    /// Matches a constructor application with exactly these sub-patterns.
    Con(Symbol, Vec<Pattern>),
    /// A pattern meta; see [`MetaId`].
    MetaPat(MetaId),
}

/// The interval binders, endpoint type, and partial element that
/// parameterize a path application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cube {
    pub dims: Vec<VarId>,
    pub endpoint_ty: Box<Term>,
    pub partial: PartialElement,
}

/// A partial element: either defined everywhere (`Const`) or only on the
/// faces covered by its clauses (`Split`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialElement {
    Split(Vec<(Restriction, Term)>),
    Const(Box<Term>),
}

use crate::formula::Formula;
use crate::restriction::Restriction;

/// The unified term representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A universe, `Type n`.
    Type(u32),

    /// Bound-variable reference; equality is by `VarId` identity.
    Ref(VarId),

    /// Function abstraction: `λ(x:A). body`.
    Lam(Binder, Box<Term>),

    /// Function application: `f a`.
    App(Box<Term>, Box<Term>),

    /// Dependent function type: `Π(x:A). B`.
    Pi(Binder, Box<Term>),

    /// Dependent pair type over a (possibly multi-field) telescope.
    Sigma(Vec<Binder>),

    /// A pair value introducing a `Sigma`.
    Pair(Vec<Term>),

    /// Projection of the `index`-th field of a pair.
    Proj(Box<Term>, usize),

    /// A saturated data-constructor application; the "value" shape that
    /// `Match`/`Proj` look for at the head of a scrutinee.
    Con(Symbol, Vec<Term>),

    /// Pattern matching on one or more scrutinees.
    Match(Vec<Term>, Vec<Clause>),

    /// A pattern meta whose payload may later be resolved (see
    /// [`crate::context::Context::solve_meta`]).
    MetaPat(MetaId),

    /// Path abstraction: `⟨i⟩ body`, binding interval variables.
    PLam(Vec<VarId>, Box<Term>),

    /// Path application.
    PApp(Box<Term>, Vec<Term>, Cube),

    /// A path type `PathP (λi. ty) lhs rhs`; irreducible head for `Coe`.
    PathTy {
        dim: VarId,
        ty: Box<Term>,
        lhs: Box<Term>,
        rhs: Box<Term>,
    },

    /// An interval formula.
    Formula(Formula),

    /// A partial element together with the type it reduces to on its total face.
    Partial(PartialElement, Box<Term>),

    /// The type of partial elements under a face restriction.
    PartialTy(Box<Term>, Restriction),

    /// The cubical coercion operator.
    Coe(Restriction, Box<Term>),

    /// A proof-irrelevant placeholder of the given type.
    Erased(Box<Term>),
}

impl Term {
    pub fn var(name: &str, ty: Term, interner_name: Symbol) -> (Binder, VarId) {
        let _ = name;
        let var = VarId::fresh();
        (
            Binder {
                var,
                name: interner_name,
                ty: Box::new(ty),
            },
            var,
        )
    }

    /// A fresh local reference, convenient in tests.
    pub fn fresh_ref() -> (VarId, Term) {
        let v = VarId::fresh();
        (v, Term::Ref(v))
    }
}

/// A source-annotated top-level declaration; not interpreted by the kernel
/// itself but threaded through by the resolver/orchestrator.
#[derive(Debug, Clone)]
pub struct Located<T> {
    pub value: T,
    pub span: Span,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Type(n) => write!(f, "Type{}", n),
            Term::Ref(v) => write!(f, "${:?}", v),
            Term::Lam(b, body) => write!(f, "λ({:?}:{}). {}", b.var, b.ty, body),
            Term::App(func, arg) => write!(f, "({} {})", func, arg),
            Term::Pi(b, cod) => write!(f, "Π({:?}:{}). {}", b.var, b.ty, cod),
            Term::Sigma(bs) => {
                write!(f, "Σ(")?;
                for (i, b) in bs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}:{}", b.var, b.ty)?;
                }
                write!(f, ")")
            }
            Term::Pair(ts) => {
                write!(f, "(")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ")")
            }
            Term::Proj(p, i) => write!(f, "{}.{}", p, i),
            Term::Con(name, args) => {
                write!(f, "{:?}", name)?;
                for a in args {
                    write!(f, " {}", a)?;
                }
                Ok(())
            }
            Term::Match(scruts, _) => {
                write!(f, "match ")?;
                for (i, s) in scruts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", s)?;
                }
                write!(f, " with ...")
            }
            Term::MetaPat(m) => write!(f, "?p{}", m.0),
            Term::PLam(dims, body) => {
                write!(f, "⟨")?;
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:?}", d)?;
                }
                write!(f, "⟩ {}", body)
            }
            Term::PApp(of, args, _) => {
                write!(f, "{}", of)?;
                for a in args {
                    write!(f, " @{}", a)?;
                }
                Ok(())
            }
            Term::PathTy { ty, lhs, rhs, .. } => write!(f, "Path {} {} {}", ty, lhs, rhs),
            Term::Formula(form) => write!(f, "{}", form),
            Term::Partial(_, rhs) => write!(f, "Partial(.., {})", rhs),
            Term::PartialTy(ty, r) => write!(f, "PartialTy({}, {})", ty, r),
            Term::Coe(r, ty) => write!(f, "coe[{}] {}", r, ty),
            Term::Erased(ty) => write!(f, "erased:{}", ty),
        }
    }
}
