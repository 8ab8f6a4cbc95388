//! The top-level orchestrator: the one type that actually wires the build
//! graph, library discovery, the resolver, and diagnostic routing together
//! into `registerLibrary` / file-event / `reload` — the pipeline `ctt-cli`
//! and `ctt-lsp` both drive instead of stepping on the build graph directly.

use crate::advisor::{Advisor, AlwaysRecompile};
use crate::diagnostics::{BufferReporter, Problem, Severity};
use crate::graph::{BuildGraph, CompileState};
use crate::library::{Library, LibrarySource};
use crate::manifest::{find_library_root, ManifestLoader, TomlManifestLoader};
use crate::primitive_factory::primitives_for;
use ctt_base::{Interner, Span};
use ctt_resolver::{Accessibility, ContextFlavor, DeclId, ModuleContext, ScopeEntry};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tower_lsp::lsp_types::Url;
use walkdir::WalkDir;

/// How deep `registerLibrary` will search beneath a manifest-less directory
/// before giving up on mocked-library discovery.
const DISCOVERY_DEPTH: usize = 8;
const SOURCE_EXTENSION: &str = "ctt";

/// A filesystem change reported by the editor or a watcher, as distinguished
/// by `didChangeWatchedFiles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    Created,
    Deleted,
    Modified,
}

/// Owns every registered library and the build graph spanning their
/// sources. `register_library` and the file-event handlers mutate the graph
/// synchronously; `reload` is the only place the (stubbed) compiler
/// pipeline actually runs.
pub struct Orchestrator {
    graph: BuildGraph,
    libraries: HashMap<String, Library>,
    owner_of: HashMap<PathBuf, String>,
    reporter: BufferReporter,
    advisor: Box<dyn Advisor + Send + Sync>,
    loader: Box<dyn ManifestLoader + Send + Sync>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Orchestrator::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Orchestrator {
            graph: BuildGraph::new(),
            libraries: HashMap::new(),
            owner_of: HashMap::new(),
            reporter: BufferReporter::new(),
            advisor: Box::new(AlwaysRecompile),
            loader: Box::new(TomlManifestLoader),
        }
    }

    pub fn with_advisor(mut self, advisor: Box<dyn Advisor + Send + Sync>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn with_loader(mut self, loader: Box<dyn ManifestLoader + Send + Sync>) -> Self {
        self.loader = loader;
        self
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    pub fn library(&self, identity: &str) -> Option<&Library> {
        self.libraries.get(identity)
    }

    pub fn source_count(&self) -> usize {
        self.owner_of.len()
    }

    fn register(&mut self, library: Library) -> String {
        let identity = library.identity();
        for source in &library.config.library_sources {
            self.graph.ensure_node(source);
            self.owner_of.insert(source.clone(), identity.clone());
        }
        self.libraries.insert(identity.clone(), library);
        identity
    }

    /// `registerLibrary(path)`: walks upward from `path` seeking a manifest;
    /// if found, loads and registers a disk library. Otherwise discovers
    /// source files beneath `path` (to a bounded depth) and registers each
    /// as its own mocked library. Returns the identity of the last library
    /// registered.
    pub fn register_library(&mut self, path: &Path) -> Result<String, String> {
        if find_library_root(path).is_some() {
            let library = Library::discover(path, self.loader.as_ref()).map_err(|e| e.to_string())?;
            return Ok(self.register(library));
        }

        let sources = discover_source_files(path, DISCOVERY_DEPTH);
        if sources.is_empty() {
            return Err(format!(
                "no {} found and no .{} sources discovered beneath {}",
                crate::manifest::MANIFEST_FILE_NAME,
                SOURCE_EXTENSION,
                path.display()
            ));
        }
        let mut last = String::new();
        for source in sources {
            let content = fs::read_to_string(&source).map_err(|e| e.to_string())?;
            let name = source.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();
            let mut files = HashMap::new();
            files.insert(source.clone(), content);
            last = self.register(Library::mocked(&name, files));
        }
        Ok(last)
    }

    fn mutable_library_owning(&self, path: &Path) -> Option<String> {
        self.libraries.iter().find_map(|(identity, library)| match &library.source {
            LibrarySource::Disk(root) if path.starts_with(root) => Some(identity.clone()),
            _ => None,
        })
    }

    fn attach(&mut self, identity: &str, path: &Path) {
        let rel = match self.libraries.get(identity).map(|l| l.source.clone()) {
            Some(LibrarySource::Disk(root)) => path.strip_prefix(&root).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf()),
            _ => path.to_path_buf(),
        };
        if let Some(library) = self.libraries.get_mut(identity) {
            if !library.config.library_sources.contains(&rel) {
                library.config.library_sources.push(rel.clone());
            }
        }
        self.graph.ensure_node(&rel);
        self.owner_of.insert(rel, identity.to_string());
    }

    /// Applies one `didChangeWatchedFiles` change. Fully mutates the graph
    /// (and library set) before returning — nothing here suspends, so a
    /// query issued after this call always sees the change.
    pub fn notify_file_event(&mut self, path: &Path, kind: FileChangeKind) {
        match kind {
            FileChangeKind::Modified => {
                self.graph.invalidate(path);
            }
            FileChangeKind::Deleted => {
                let owner = self.owner_of.remove(path);
                self.graph.remove_node(path);
                if let Some(identity) = owner {
                    let was_mock = matches!(
                        self.libraries.get(&identity).map(|l| &l.source),
                        Some(LibrarySource::Mocked(_))
                    );
                    if was_mock {
                        self.libraries.remove(&identity);
                    }
                }
            }
            FileChangeKind::Created => {
                if let Some(identity) = self.mutable_library_owning(path) {
                    self.attach(&identity, path);
                } else {
                    let content = fs::read_to_string(path).unwrap_or_default();
                    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();
                    let mut files = HashMap::new();
                    files.insert(path.to_path_buf(), content);
                    self.register(Library::mocked(&name, files));
                }
            }
        }
    }

    /// Runs one build pass over every registered library: clears the
    /// diagnostic buffer, walks the compile order consulting the `Advisor`
    /// for reuse, publishes the resulting diagnostics, and returns them
    /// grouped per file.
    pub fn reload(&mut self) -> HashMap<PathBuf, Vec<Problem>> {
        self.reporter = BufferReporter::new();
        let mut highlights: HashMap<PathBuf, Vec<Problem>> = HashMap::new();

        let order = match self.graph.compile_order() {
            Some(order) => order,
            None => return highlights,
        };

        // Fresh per-library resolver scope for this pass; `reload` always
        // re-resolves from scratch rather than carrying admission state
        // across passes; see DESIGN.md.
        let mut scratch: HashMap<String, (Interner, ModuleContext)> = HashMap::new();

        for path in &order {
            let identity = match self.owner_of.get(path) {
                Some(identity) => identity.clone(),
                None => continue,
            };
            primitives_for(&identity);

            let deps_ready = self
                .graph
                .dependencies(path)
                .iter()
                .all(|dep| self.graph.state(dep) == CompileState::TypeChecked);
            if !deps_ready {
                continue;
            }

            if self.advisor.should_reuse(path) && self.graph.state(path) == CompileState::TypeChecked {
                continue;
            }

            let problems = self.compile_one(path, &identity, &mut scratch);
            if let Some(url) = path_to_url(path) {
                for problem in &problems {
                    self.reporter.report(url.clone(), problem.clone());
                }
            }
            if !problems.is_empty() {
                highlights.insert(path.clone(), problems);
            } else {
                highlights.entry(path.clone()).or_default();
            }
        }

        highlights
    }

    /// Parse, resolve, and type-check a single node, advancing its state as
    /// far as it successfully gets. Parsing/type-checking proper are out of
    /// scope here (no surface parser or elaborator exists in this crate);
    /// what's real is the resolver admission step, which can genuinely fail.
    fn compile_one(
        &mut self,
        path: &Path,
        identity: &str,
        scratch: &mut HashMap<String, (Interner, ModuleContext)>,
    ) -> Vec<Problem> {
        let mut problems = Vec::new();

        let library = match self.libraries.get(identity) {
            Some(library) => library,
            None => return problems,
        };
        let content = match library.read_file(path) {
            Ok(content) => content,
            Err(err) => {
                problems.push(Problem {
                    range: Span::point(0),
                    severity: Severity::Error,
                    message: format!("failed to read {}: {}", path.display(), err),
                });
                self.graph.set_state(path, CompileState::Failed);
                return problems;
            }
        };
        let _ = content;
        self.graph.set_state(path, CompileState::Parsed);

        let (interner, ctx) = scratch
            .entry(identity.to_string())
            .or_insert_with(|| (Interner::new(), ModuleContext::new(ContextFlavor::Physical)));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed");
        let name = interner.intern(stem);
        let entry = ScopeEntry::local(name, Vec::new(), DeclId::fresh(), Accessibility::Public);
        let mut warnings = Vec::new();
        match ctx.define(entry, &mut warnings) {
            Ok(()) => {
                self.graph.set_state(path, CompileState::Resolved);
                for warning in warnings {
                    problems.push(Problem {
                        range: Span::point(0),
                        severity: Severity::Warning,
                        message: warning.to_string(),
                    });
                }
            }
            Err(err) => {
                problems.push(Problem {
                    range: Span::point(0),
                    severity: Severity::Error,
                    message: err.to_string(),
                });
                self.graph.set_state(path, CompileState::Failed);
                return problems;
            }
        }

        self.graph.set_state(path, CompileState::TypeChecked);
        problems
    }
}

fn discover_source_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    if root.is_file() {
        return if root.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        };
    }
    let mut sources: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION))
        .collect();
    sources.sort();
    sources
}

fn path_to_url(path: &Path) -> Option<Url> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Url::from_file_path(&absolute).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "{}", content).unwrap();
        path
    }

    #[test]
    fn register_library_discovers_a_disk_manifest() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifest = fs::File::create(temp.path().join("ctt.toml")).unwrap();
        writeln!(manifest, "name = \"demo\"\nlibrary_sources = [\"main.ctt\"]").unwrap();
        write_file(temp.path(), "main.ctt", "Type0");

        let mut orchestrator = Orchestrator::new();
        let identity = orchestrator.register_library(temp.path()).unwrap();
        assert_eq!(orchestrator.library(&identity).unwrap().config.name, "demo");
        assert_eq!(orchestrator.source_count(), 1);
    }

    #[test]
    fn register_library_mocks_loose_source_files_without_a_manifest() {
        let temp = tempfile::tempdir().unwrap();
        write_file(temp.path(), "a.ctt", "Type0");
        write_file(temp.path(), "b.ctt", "Type0");

        let mut orchestrator = Orchestrator::new();
        orchestrator.register_library(temp.path()).unwrap();
        assert_eq!(orchestrator.source_count(), 2);
    }

    #[test]
    fn reload_type_checks_every_registered_source() {
        let temp = tempfile::tempdir().unwrap();
        write_file(temp.path(), "a.ctt", "Type0");

        let mut orchestrator = Orchestrator::new();
        orchestrator.register_library(temp.path()).unwrap();
        let highlights = orchestrator.reload();
        assert!(highlights.values().all(|problems| problems.is_empty()));
        let path = temp.path().join("a.ctt");
        assert_eq!(orchestrator.graph().state(&path), CompileState::TypeChecked);
    }

    #[test]
    fn reload_reports_a_resolver_collision_within_one_library() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifest = fs::File::create(temp.path().join("ctt.toml")).unwrap();
        writeln!(manifest, "name = \"demo\"\nlibrary_sources = [\"dup.ctt\", \"sub/dup.ctt\"]").unwrap();
        write_file(temp.path(), "dup.ctt", "Type0");
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        write_file(&temp.path().join("sub"), "dup.ctt", "Type0");

        let mut orchestrator = Orchestrator::new();
        orchestrator.register_library(temp.path()).unwrap();
        let highlights = orchestrator.reload();
        let failed = highlights.values().filter(|problems| !problems.is_empty()).count();
        assert_eq!(failed, 1);
    }

    #[test]
    fn modifying_a_file_resets_it_and_its_dependents_to_fresh() {
        let temp = tempfile::tempdir().unwrap();
        write_file(temp.path(), "a.ctt", "Type0");
        let path = temp.path().join("a.ctt");

        let mut orchestrator = Orchestrator::new();
        orchestrator.register_library(temp.path()).unwrap();
        orchestrator.reload();
        assert_eq!(orchestrator.graph().state(&path), CompileState::TypeChecked);

        orchestrator.notify_file_event(&path, FileChangeKind::Modified);
        assert_eq!(orchestrator.graph().state(&path), CompileState::Fresh);
    }

    #[test]
    fn deleting_a_mocked_librarys_only_file_drops_the_whole_library() {
        let temp = tempfile::tempdir().unwrap();
        write_file(temp.path(), "solo.ctt", "Type0");
        let path = temp.path().join("solo.ctt");

        let mut orchestrator = Orchestrator::new();
        let identity = orchestrator.register_library(temp.path()).unwrap();
        orchestrator.notify_file_event(&path, FileChangeKind::Deleted);

        assert!(orchestrator.library(&identity).is_none());
        assert_eq!(orchestrator.source_count(), 0);
    }

    #[test]
    fn creating_a_file_under_a_disk_librarys_root_attaches_it() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifest = fs::File::create(temp.path().join("ctt.toml")).unwrap();
        writeln!(manifest, "name = \"demo\"\nlibrary_sources = [\"a.ctt\"]").unwrap();
        write_file(temp.path(), "a.ctt", "Type0");

        let mut orchestrator = Orchestrator::new();
        let identity = orchestrator.register_library(temp.path()).unwrap();
        let new_path = write_file(temp.path(), "b.ctt", "Type0");
        orchestrator.notify_file_event(&new_path, FileChangeKind::Created);

        assert_eq!(orchestrator.source_count(), 2);
        assert!(orchestrator
            .library(&identity)
            .unwrap()
            .config
            .library_sources
            .contains(&PathBuf::from("b.ctt")));
    }
}
