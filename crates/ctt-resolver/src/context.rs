//! Module scope construction: the `symbols` and `modules` tables, and the
//! admission rule (`add_global`) that decides whether a new binding is
//! accepted outright, accepted with a warning, or rejected.

use crate::entry::{Accessibility, Origin, ScopeEntry};
use crate::error::{ResolverError, ResolverResult, ResolverWarning};
use ctt_base::Symbol;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

/// Whether a `Using`/`Hiding` clause on `open` keeps or drops the listed
/// names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseHideStrategy {
    Using,
    Hiding,
}

/// The `using (...)`/`hiding (...)` clause on an `open`, restricting which
/// of a module's exports become visible.
#[derive(Debug, Clone)]
pub struct UseHideFilter {
    pub strategy: UseHideStrategy,
    pub names: Vec<Symbol>,
}

static NEXT_MODULE_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a registered module, independent of any one qualified path it
/// might be reached through (a module can become visible under more than
/// one path via re-export).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(u32);

impl ModuleId {
    pub fn fresh() -> Self {
        ModuleId(NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Whether a context's public declarations are exported to importers.
///
/// `NoExport` contexts (e.g. a REPL scope, or a local block) never leak
/// bindings outward regardless of how they were marked; `Physical` contexts
/// back an actual module/file and export exactly their `Public` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFlavor {
    NoExport,
    Physical,
}

#[derive(Debug, Clone, Default)]
struct ModuleRegistry {
    by_path: HashMap<Vec<Symbol>, ModuleId>,
    exports: HashMap<ModuleId, Vec<ScopeEntry>>,
}

/// A module's scope: every name visible inside it, and the bookkeeping
/// needed to admit new names without silently shadowing or duplicating.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    flavor: ContextFlavor,
    symbols: HashMap<Symbol, HashMap<Vec<Symbol>, ScopeEntry>>,
    modules: ModuleRegistry,
    imported_paths: HashSet<Vec<Symbol>>,
    visible_modules: HashMap<ModuleId, Vec<Symbol>>,
}

impl ModuleContext {
    pub fn new(flavor: ContextFlavor) -> Self {
        ModuleContext {
            flavor,
            symbols: HashMap::new(),
            modules: ModuleRegistry::default(),
            imported_paths: HashSet::new(),
            visible_modules: HashMap::new(),
        }
    }

    /// Registers `path` as a module whose public entries are `exports`,
    /// making it importable. Does not itself bring anything into scope.
    pub fn register_module(&mut self, path: Vec<Symbol>, exports: Vec<ScopeEntry>) -> ModuleId {
        let id = ModuleId::fresh();
        self.modules.by_path.insert(path, id);
        self.modules.exports.insert(id, exports);
        id
    }

    /// The admission rule: accepts `entry` into `symbols`, rejecting an
    /// exact `(componentPath, name)` collision regardless of either entry's
    /// origin, and warning when the same name now has more than one
    /// provenance under different paths.
    pub fn add_global(&mut self, entry: ScopeEntry, warnings: &mut Vec<ResolverWarning>) -> ResolverResult<()> {
        let by_path = self.symbols.entry(entry.unqualified_name).or_default();

        if by_path.is_empty() {
            by_path.insert(entry.component_path.clone(), entry);
            return Ok(());
        }

        if by_path.contains_key(&entry.component_path) {
            return Err(ResolverError::DuplicateName {
                name: entry.unqualified_name,
                path: entry.component_path.clone(),
            });
        }

        warnings.push(ResolverWarning::AmbiguousNameWarn {
            name: entry.unqualified_name,
            candidates: by_path.len() + 1,
        });
        by_path.insert(entry.component_path.clone(), entry);
        Ok(())
    }

    /// Brings a single module's exports into scope, reachable through
    /// `path`. `accessibility` governs whether this import itself becomes
    /// re-exportable (`Public`) or stays local to this context (`Private`).
    /// See `DESIGN.md` for the `DuplicateModule`/`ModShadowingWarn`
    /// distinction.
    pub fn import_module(
        &mut self,
        path: Vec<Symbol>,
        accessibility: Accessibility,
        warnings: &mut Vec<ResolverWarning>,
    ) -> ResolverResult<()> {
        if self.imported_paths.contains(&path) {
            return Err(ResolverError::DuplicateModule(path));
        }
        let id = *self
            .modules
            .by_path
            .get(&path)
            .ok_or_else(|| ResolverError::ModuleNotFound(path.clone()))?;

        self.imported_paths.insert(path.clone());

        match self.visible_modules.get(&id) {
            Some(existing_path) if existing_path != &path => {
                warnings.push(ResolverWarning::ModShadowingWarn { path: path.clone() });
            }
            Some(_) => {}
            None => {
                self.visible_modules.insert(id, path.clone());
            }
        }

        let origin = import_origin(&path, accessibility);
        let exported = self.modules.exports.get(&id).cloned().unwrap_or_default();
        for exported_entry in exported {
            let imported_entry = ScopeEntry {
                component_path: path.clone(),
                accessibility,
                origin: origin.clone(),
                ..exported_entry
            };
            self.add_global(imported_entry, warnings)?;
        }
        Ok(())
    }

    /// Imports several modules under the same path prefix and accessibility
    /// in order, stopping at the first error.
    pub fn import_modules(
        &mut self,
        paths: Vec<Vec<Symbol>>,
        accessibility: Accessibility,
        warnings: &mut Vec<ResolverWarning>,
    ) -> ResolverResult<()> {
        for path in paths {
            self.import_module(path, accessibility, warnings)?;
        }
        Ok(())
    }

    /// Like [`import_module`](Self::import_module), but also makes the
    /// module's exports reachable unqualified, not just under its path.
    /// `filter` applies a `using`/`hiding` clause (`None` admits every
    /// export); `renames` relocates an exported unqualified name before
    /// admission. An unknown name in either raises `UnknownName`.
    pub fn open_module(
        &mut self,
        path: Vec<Symbol>,
        accessibility: Accessibility,
        filter: Option<&UseHideFilter>,
        renames: &[(Symbol, Symbol)],
        warnings: &mut Vec<ResolverWarning>,
    ) -> ResolverResult<()> {
        self.import_module(path.clone(), accessibility, warnings)?;
        let id = self.modules.by_path[&path];
        let exported = self.modules.exports.get(&id).cloned().unwrap_or_default();

        let filtered = apply_use_hide_filter(exported, filter)?;
        let renamed = apply_renames(filtered, renames)?;

        let origin = import_origin(&path, accessibility);
        for exported_entry in renamed {
            let opened_entry = ScopeEntry {
                component_path: Vec::new(),
                accessibility,
                origin: origin.clone(),
                ..exported_entry
            };
            self.add_global(opened_entry, warnings)?;
        }
        Ok(())
    }

    /// Declares a brand-new, locally-owned name.
    pub fn define(&mut self, entry: ScopeEntry, warnings: &mut Vec<ResolverWarning>) -> ResolverResult<()> {
        self.add_global(entry, warnings)
    }

    /// The entries this context exposes to whatever imports it: empty for
    /// `NoExport` contexts, otherwise every `Public` entry that is either
    /// locally defined or was itself imported `Public` (`Reexported`) —
    /// `Private` imports stay local and never appear here.
    pub fn do_export(&self) -> Vec<ScopeEntry> {
        if self.flavor == ContextFlavor::NoExport {
            return Vec::new();
        }
        self.symbols
            .values()
            .flat_map(|by_path| by_path.values())
            .filter(|entry| entry.is_public() && !matches!(entry.origin, Origin::Imported { .. }))
            .cloned()
            .collect()
    }

    /// Looks up an unqualified name, returning every candidate path it could
    /// resolve to (more than one means it was registered ambiguously).
    pub fn lookup(&self, name: Symbol) -> Vec<&ScopeEntry> {
        self.symbols
            .get(&name)
            .map(|by_path| by_path.values().collect())
            .unwrap_or_default()
    }
}

/// `Public` imports become re-exportable from this context; `Private`
/// imports stay local (`Origin::Imported`).
fn import_origin(path: &[Symbol], accessibility: Accessibility) -> Origin {
    if accessibility == Accessibility::Public {
        Origin::Reexported { from: path.to_vec() }
    } else {
        Origin::Imported { from: path.to_vec() }
    }
}

/// Applies a `using`/`hiding` clause to a module's exports, or passes them
/// through unchanged when there is no filter. Fails with `UnknownName` if a
/// listed name isn't actually among the exports.
fn apply_use_hide_filter(entries: Vec<ScopeEntry>, filter: Option<&UseHideFilter>) -> ResolverResult<Vec<ScopeEntry>> {
    let Some(filter) = filter else {
        return Ok(entries);
    };
    for name in &filter.names {
        if !entries.iter().any(|e| e.unqualified_name == *name) {
            return Err(ResolverError::UnknownName(*name));
        }
    }
    Ok(match filter.strategy {
        UseHideStrategy::Using => entries.into_iter().filter(|e| filter.names.contains(&e.unqualified_name)).collect(),
        UseHideStrategy::Hiding => entries.into_iter().filter(|e| !filter.names.contains(&e.unqualified_name)).collect(),
    })
}

/// Relocates exported names per `renames` (`from -> to`). Fails with
/// `UnknownName` if a rename's source name isn't among the (already
/// filtered) exports.
fn apply_renames(entries: Vec<ScopeEntry>, renames: &[(Symbol, Symbol)]) -> ResolverResult<Vec<ScopeEntry>> {
    for (from, _) in renames {
        if !entries.iter().any(|e| e.unqualified_name == *from) {
            return Err(ResolverError::UnknownName(*from));
        }
    }
    Ok(entries
        .into_iter()
        .map(|mut entry| {
            if let Some((_, to)) = renames.iter().find(|(from, _)| *from == entry.unqualified_name) {
                entry.unqualified_name = *to;
            }
            entry
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::DeclId;
    use ctt_base::Interner;

    fn mk_entry(name: Symbol, path: Vec<Symbol>, accessibility: Accessibility) -> ScopeEntry {
        ScopeEntry::local(name, path, DeclId::fresh(), accessibility)
    }

    #[test]
    fn redefining_a_local_name_at_the_same_path_is_an_error() {
        let mut interner = Interner::new();
        let name = interner.intern("foo");
        let mut ctx = ModuleContext::new(ContextFlavor::Physical);
        let mut warnings = Vec::new();
        ctx.define(mk_entry(name, vec![], Accessibility::Public), &mut warnings).unwrap();
        let err = ctx
            .define(mk_entry(name, vec![], Accessibility::Public), &mut warnings)
            .unwrap_err();
        assert_eq!(
            err,
            ResolverError::DuplicateName {
                name,
                path: vec![]
            }
        );
    }

    #[test]
    fn importing_the_same_path_twice_is_duplicate_module() {
        let mut interner = Interner::new();
        let name = interner.intern("foo");
        let path = vec![interner.intern("m")];
        let mut ctx = ModuleContext::new(ContextFlavor::Physical);
        ctx.register_module(path.clone(), vec![mk_entry(name, path.clone(), Accessibility::Public)]);
        let mut warnings = Vec::new();
        ctx.import_module(path.clone(), Accessibility::Private, &mut warnings).unwrap();
        let err = ctx.import_module(path.clone(), Accessibility::Private, &mut warnings).unwrap_err();
        assert_eq!(err, ResolverError::DuplicateModule(path));
    }

    #[test]
    fn reaching_a_module_through_a_second_path_warns_but_succeeds() {
        let mut interner = Interner::new();
        let name = interner.intern("foo");
        let path_a = vec![interner.intern("a")];
        let path_b = vec![interner.intern("b")];
        let mut ctx = ModuleContext::new(ContextFlavor::Physical);
        let id = ctx.register_module(path_a.clone(), vec![mk_entry(name, path_a.clone(), Accessibility::Public)]);
        ctx.modules.by_path.insert(path_b.clone(), id);

        let mut warnings = Vec::new();
        ctx.import_module(path_a, Accessibility::Private, &mut warnings).unwrap();
        ctx.import_module(path_b, Accessibility::Private, &mut warnings).unwrap();
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ResolverWarning::ModShadowingWarn { .. })));
    }

    #[test]
    fn importing_an_unregistered_path_is_module_not_found() {
        let mut ctx = ModuleContext::new(ContextFlavor::Physical);
        let mut warnings = Vec::new();
        let path = vec![Symbol::EMPTY];
        assert_eq!(
            ctx.import_module(path.clone(), Accessibility::Private, &mut warnings).unwrap_err(),
            ResolverError::ModuleNotFound(path)
        );
    }

    #[test]
    fn no_export_context_never_exports_anything() {
        let mut interner = Interner::new();
        let name = interner.intern("foo");
        let mut ctx = ModuleContext::new(ContextFlavor::NoExport);
        let mut warnings = Vec::new();
        ctx.define(mk_entry(name, vec![], Accessibility::Public), &mut warnings).unwrap();
        assert!(ctx.do_export().is_empty());
    }

    #[test]
    fn physical_context_exports_only_public_local_entries() {
        let mut interner = Interner::new();
        let pub_name = interner.intern("pub_fn");
        let priv_name = interner.intern("priv_fn");
        let mut ctx = ModuleContext::new(ContextFlavor::Physical);
        let mut warnings = Vec::new();
        ctx.define(mk_entry(pub_name, vec![], Accessibility::Public), &mut warnings).unwrap();
        ctx.define(mk_entry(priv_name, vec![], Accessibility::Private), &mut warnings).unwrap();
        let exported = ctx.do_export();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].unqualified_name, pub_name);
    }

    #[test]
    fn exact_path_collision_is_an_error_even_across_distinct_origins() {
        let mut interner = Interner::new();
        let name = interner.intern("foo");
        let path = vec![interner.intern("m")];
        let mut ctx = ModuleContext::new(ContextFlavor::Physical);
        ctx.register_module(path.clone(), vec![mk_entry(name, path.clone(), Accessibility::Public)]);
        let mut warnings = Vec::new();
        ctx.import_module(path.clone(), Accessibility::Private, &mut warnings).unwrap();

        // A second, distinct entry landing at the exact same (path, name) is
        // still a `DuplicateName`, even though neither side is `Local`.
        let collision = ScopeEntry {
            component_path: path.clone(),
            origin: Origin::Imported { from: path.clone() },
            ..mk_entry(name, path.clone(), Accessibility::Public)
        };
        let err = ctx.add_global(collision, &mut warnings).unwrap_err();
        assert_eq!(err, ResolverError::DuplicateName { name, path });
    }

    #[test]
    fn public_import_is_reexported_but_private_import_is_not() {
        let mut interner = Interner::new();
        let name = interner.intern("foo");
        let path = vec![interner.intern("m")];

        let mut pub_ctx = ModuleContext::new(ContextFlavor::Physical);
        pub_ctx.register_module(path.clone(), vec![mk_entry(name, path.clone(), Accessibility::Public)]);
        let mut warnings = Vec::new();
        pub_ctx.import_module(path.clone(), Accessibility::Public, &mut warnings).unwrap();
        assert_eq!(pub_ctx.do_export().len(), 1);

        let mut priv_ctx = ModuleContext::new(ContextFlavor::Physical);
        priv_ctx.register_module(path.clone(), vec![mk_entry(name, path.clone(), Accessibility::Public)]);
        priv_ctx.import_module(path, Accessibility::Private, &mut warnings).unwrap();
        assert!(priv_ctx.do_export().is_empty());
    }

    #[test]
    fn open_with_hiding_drops_the_hidden_name() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");
        let path = vec![interner.intern("m")];
        let mut ctx = ModuleContext::new(ContextFlavor::Physical);
        ctx.register_module(
            path.clone(),
            vec![
                mk_entry(x, path.clone(), Accessibility::Public),
                mk_entry(y, path.clone(), Accessibility::Public),
            ],
        );
        let mut warnings = Vec::new();
        let filter = UseHideFilter {
            strategy: UseHideStrategy::Hiding,
            names: vec![x],
        };
        ctx.open_module(path, Accessibility::Private, Some(&filter), &[], &mut warnings).unwrap();
        assert!(ctx.lookup(y).iter().any(|e| e.component_path.is_empty()));
        assert!(ctx.lookup(x).iter().all(|e| !e.component_path.is_empty()));
    }

    #[test]
    fn open_with_unknown_filter_name_is_an_error() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let z = interner.intern("z");
        let path = vec![interner.intern("m")];
        let mut ctx = ModuleContext::new(ContextFlavor::Physical);
        ctx.register_module(path.clone(), vec![mk_entry(x, path.clone(), Accessibility::Public)]);
        let mut warnings = Vec::new();
        let filter = UseHideFilter {
            strategy: UseHideStrategy::Using,
            names: vec![z],
        };
        let err = ctx
            .open_module(path, Accessibility::Private, Some(&filter), &[], &mut warnings)
            .unwrap_err();
        assert_eq!(err, ResolverError::UnknownName(z));
    }

    #[test]
    fn open_with_rename_relocates_the_unqualified_name() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let renamed = interner.intern("renamed_x");
        let path = vec![interner.intern("m")];
        let mut ctx = ModuleContext::new(ContextFlavor::Physical);
        ctx.register_module(path.clone(), vec![mk_entry(x, path.clone(), Accessibility::Public)]);
        let mut warnings = Vec::new();
        ctx.open_module(path, Accessibility::Private, None, &[(x, renamed)], &mut warnings).unwrap();
        assert!(ctx.lookup(renamed).iter().any(|e| e.component_path.is_empty()));
        assert!(ctx.lookup(x).iter().all(|e| !e.component_path.is_empty()));
    }
}
