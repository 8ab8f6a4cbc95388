//! Editor queries (hover, go-to-definition, find references, rename,
//! code lenses) over a library's resolved symbol occurrences.
//!
//! These are plain functions over a [`SymbolIndex`], not `tower_lsp` trait
//! methods — `ctt-lsp` is the thin shell (per the teacher's
//! `self.state.documents.get(uri)`-then-delegate dispatch in `server.rs`)
//! that adapts these to the protocol's request/response types.

use crate::diagnostics::LineIndex;
use ctt_base::{Span, Symbol};
use ctt_resolver::DeclId;
use std::collections::HashMap;
use tower_lsp::lsp_types::Url;

/// A single occurrence of a resolved name in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolOccurrence {
    pub range: Span,
    pub name: Symbol,
    pub decl: DeclId,
    /// `true` if this occurrence is the declaration site itself, not a use.
    pub is_definition: bool,
}

/// All resolved symbol occurrences a library has collected, enough to
/// answer hover/definition/references/rename/codeLens without re-resolving.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    by_uri: HashMap<Url, Vec<SymbolOccurrence>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        SymbolIndex::default()
    }

    pub fn record(&mut self, uri: Url, occurrence: SymbolOccurrence) {
        self.by_uri.entry(uri).or_default().push(occurrence);
    }

    fn occurrence_at(&self, uri: &Url, offset: u32) -> Option<&SymbolOccurrence> {
        self.by_uri
            .get(uri)
            .and_then(|occs| occs.iter().find(|o| o.range.start <= offset && offset < o.range.end.max(o.range.start + 1)))
    }

    fn definition_site(&self, decl: DeclId) -> Option<(Url, Span)> {
        for (uri, occs) in &self.by_uri {
            for occ in occs {
                if occ.decl == decl && occ.is_definition {
                    return Some((uri.clone(), occ.range));
                }
            }
        }
        None
    }

    fn all_references(&self, decl: DeclId) -> Vec<(Url, Span)> {
        let mut out = Vec::new();
        for (uri, occs) in &self.by_uri {
            for occ in occs {
                if occ.decl == decl {
                    out.push((uri.clone(), occ.range));
                }
            }
        }
        out.sort_by(|a, b| (a.0.as_str(), a.1.start).cmp(&(b.0.as_str(), b.1.start)));
        out
    }
}

/// Describes the name under the cursor, for a hover tooltip.
pub fn hover(index: &SymbolIndex, uri: &Url, offset: u32, interner: &ctt_base::Interner) -> Option<String> {
    let occ = index.occurrence_at(uri, offset)?;
    Some(interner.resolve(occ.name).to_string())
}

/// Resolves the declaration site of the name under the cursor.
pub fn definition(index: &SymbolIndex, uri: &Url, offset: u32) -> Option<(Url, Span)> {
    let occ = index.occurrence_at(uri, offset)?;
    index.definition_site(occ.decl)
}

/// Every occurrence (definition and uses) of the name under the cursor.
pub fn references(index: &SymbolIndex, uri: &Url, offset: u32, include_declaration: bool) -> Vec<(Url, Span)> {
    let occ = match index.occurrence_at(uri, offset) {
        Some(o) => o,
        None => return Vec::new(),
    };
    let decl = occ.decl;
    let mut refs = index.all_references(decl);
    if !include_declaration {
        if let Some(def) = index.definition_site(decl) {
            refs.retain(|r| r != &def);
        }
    }
    refs
}

/// A single text replacement, in the shape a `WorkspaceEdit` is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEdit {
    pub uri: Url,
    pub range: Span,
    pub new_text: String,
}

/// Every edit needed to rename the symbol under the cursor, or `None` if
/// there is no symbol there.
pub fn rename(index: &SymbolIndex, uri: &Url, offset: u32, new_name: &str) -> Option<Vec<RenameEdit>> {
    let occ = index.occurrence_at(uri, offset)?;
    let decl = occ.decl;
    Some(
        index
            .all_references(decl)
            .into_iter()
            .map(|(uri, range)| RenameEdit {
                uri,
                range,
                new_text: new_name.to_string(),
            })
            .collect(),
    )
}

/// Whether the cursor sits on a renameable symbol, and if so the exact range
/// that will be replaced — the `prepareRename` handshake.
pub fn prepare_rename(index: &SymbolIndex, uri: &Url, offset: u32) -> Option<Span> {
    index.occurrence_at(uri, offset).map(|o| o.range)
}

/// A reference-count annotation to show above a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLensItem {
    pub range: Span,
    pub title: String,
}

/// One code lens per declaration in `uri`, reporting its reference count.
pub fn code_lens(index: &SymbolIndex, uri: &Url) -> Vec<CodeLensItem> {
    let occs = match index.by_uri.get(uri) {
        Some(o) => o,
        None => return Vec::new(),
    };
    occs.iter()
        .filter(|o| o.is_definition)
        .map(|def| {
            let count = index.all_references(def.decl).len().saturating_sub(1);
            CodeLensItem {
                range: def.range,
                title: format!("{} reference{}", count, if count == 1 { "" } else { "s" }),
            }
        })
        .collect()
}

/// Converts an LSP `Position` to a byte offset using `line_index`, the
/// inverse of `diagnostics::LineIndex::position`.
pub fn offset_of(line_index: &LineIndex, position: tower_lsp::lsp_types::Position) -> u32 {
    line_index.offset_of(position)
}
