//! Incremental build orchestration: discovering libraries, tracking what
//! needs (re)compiling, routing diagnostics, and answering editor queries.
//!
//! This is the glue layer. It owns no type theory of its own — normalization
//! comes from `ctt-kernel`, name resolution from `ctt-resolver` — but it is
//! the only crate that touches the filesystem, the manifest format, or the
//! editor protocol's wire types.

mod advisor;
mod diagnostics;
mod graph;
mod library;
mod manifest;
mod orchestrator;
mod primitive_factory;
mod queries;
mod state;

pub use advisor::{Advisor, AlwaysRecompile, MtimeAdvisor};
pub use diagnostics::{BufferReporter, LineIndex, Problem, Severity};
pub use graph::{BuildGraph, CompileState};
pub use library::{Library, LibrarySource};
pub use manifest::{find_library_root, LibraryConfig, ManifestError, ManifestLoader, TomlManifestLoader, MANIFEST_FILE_NAME};
pub use orchestrator::{FileChangeKind, Orchestrator};
pub use primitive_factory::{primitives_for, Primitives};
pub use queries::{code_lens, definition, hover, offset_of, prepare_rename, references, rename, CodeLensItem, RenameEdit, SymbolIndex, SymbolOccurrence};
pub use state::{DocumentState, OrchestratorState, WriteTicket};
