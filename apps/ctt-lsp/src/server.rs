//! The `tower_lsp::LanguageServer` implementation: a thin dispatch shell
//! wrapping `ctt_orchestrator`'s state and query functions, in the same
//! shape as the teacher's `LogicAffeineServer` (hold a `Client` + state,
//! delegate one method per capability).

use ctt_base::Interner;
use ctt_kernel::{Context, NormalizationKind, Term};
use ctt_orchestrator::{
    code_lens, definition, hover, prepare_rename, references, rename, BufferReporter, FileChangeKind,
    LineIndex, Orchestrator, OrchestratorState, SymbolIndex,
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

pub struct CttServer {
    client: Client,
    state: OrchestratorState,
    orchestrator: Mutex<Orchestrator>,
    index: Mutex<SymbolIndex>,
    reporter: Mutex<BufferReporter>,
    interner: Mutex<Interner>,
}

impl CttServer {
    pub fn new(client: Client) -> Self {
        CttServer {
            client,
            state: OrchestratorState::new(),
            orchestrator: Mutex::new(Orchestrator::new()),
            index: Mutex::new(SymbolIndex::new()),
            reporter: Mutex::new(BufferReporter::new()),
            interner: Mutex::new(Interner::new()),
        }
    }

    fn offset(&self, uri: &Url, position: Position) -> u32 {
        let doc = self.state.documents.get(uri);
        let text = doc.as_ref().map(|d| d.text.as_str()).unwrap_or("");
        LineIndex::new(text).offset_of(position)
    }

    async fn publish_diagnostics(&self, uri: Url) {
        let text = self
            .state
            .documents
            .get(&uri)
            .map(|d| d.text.clone())
            .unwrap_or_default();
        let version = self.state.documents.get(&uri).map(|d| d.version);
        let diagnostics = self.reporter.lock().expect("reporter poisoned").to_lsp_diagnostics(&uri, &text);
        self.client.publish_diagnostics(uri, diagnostics, version).await;
    }
}

/// Request parameters for the custom `ctt/computeTerm` extension: normalize
/// the term at a cursor position to weak-head or full normal form.
#[derive(Debug, Deserialize)]
pub struct ComputeTermParams {
    pub text_document: TextDocumentIdentifier,
    pub position: Position,
    #[serde(default)]
    pub full: bool,
}

#[derive(Debug, Serialize)]
pub struct ComputeTermResult {
    pub rendered: String,
}

impl CttServer {
    /// `ctt/computeTerm`: not part of the LSP spec, registered as a custom
    /// method on the service (see `main.rs`). Normalizes the universe-level
    /// literal under the cursor, the same minimal surface the CLI repl
    /// accepts, since a full surface parser is out of scope.
    pub async fn compute_term(&self, params: ComputeTermParams) -> Result<ComputeTermResult> {
        let uri = params.text_document.uri;
        let offset = self.offset(&uri, params.position) as usize;
        let text = self.state.documents.get(&uri).map(|d| d.text.clone()).unwrap_or_default();

        let word: String = text[offset.min(text.len())..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let level: u32 = word.parse().unwrap_or(0);

        let ctx = Context::new();
        let kind = if params.full { NormalizationKind::Full } else { NormalizationKind::Whnf };
        let normalized = ctt_kernel::normalize(&ctx, &Term::Type(level), kind);
        Ok(ComputeTermResult {
            rendered: normalized.to_string(),
        })
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for CttServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(root) = params.root_uri.and_then(|uri| uri.to_file_path().ok()) {
            let mut orchestrator = self.orchestrator.lock().expect("orchestrator poisoned");
            if let Err(e) = orchestrator.register_library(&root) {
                log::warn!("failed to register workspace root {}: {}", root.display(), e);
            }
        }
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                definition_provider: Some(OneOf::Left(true)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions::default()),
                references_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: Default::default(),
                })),
                code_lens_provider: Some(CodeLensOptions { resolve_provider: Some(true) }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "ctt-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("ctt-lsp initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        self.state.open_document(uri.clone(), params.text_document.text, params.text_document.version);
        self.publish_diagnostics(uri).await;
    }

    async fn did_change(&self, mut params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        if let Some(change) = params.content_changes.pop() {
            self.state.update_document(&uri, change.text, params.text_document.version);
        }
        self.publish_diagnostics(uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.state.close_document(&params.text_document.uri);
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let highlights = {
            let mut orchestrator = self.orchestrator.lock().expect("orchestrator poisoned");
            for change in &params.changes {
                let path = match change.uri.to_file_path() {
                    Ok(path) => path,
                    Err(()) => continue,
                };
                let kind = match change.typ {
                    FileChangeType::CREATED => FileChangeKind::Created,
                    FileChangeType::DELETED => FileChangeKind::Deleted,
                    _ => FileChangeKind::Modified,
                };
                orchestrator.notify_file_event(&path, kind);
            }
            orchestrator.reload()
        };

        for (path, problems) in highlights {
            let uri = match Url::from_file_path(&path) {
                Ok(uri) => uri,
                Err(()) => continue,
            };
            {
                let mut reporter = self.reporter.lock().expect("reporter poisoned");
                reporter.take(&uri);
                for problem in problems {
                    reporter.report(uri.clone(), problem);
                }
            }
            self.publish_diagnostics(uri).await;
        }
    }

    async fn completion(&self, _params: CompletionParams) -> Result<Option<CompletionResponse>> {
        Ok(None)
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let offset = self.offset(&uri, params.text_document_position_params.position);
        let index = self.index.lock().expect("index poisoned");
        let interner = self.interner.lock().expect("interner poisoned");
        Ok(hover(&index, &uri, offset, &interner).map(|text| Hover {
            contents: HoverContents::Scalar(MarkedString::String(text)),
            range: None,
        }))
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let offset = self.offset(&uri, params.text_document_position_params.position);
        let index = self.index.lock().expect("index poisoned");
        Ok(definition(&index, &uri, offset).map(|(found_uri, span)| {
            let text = self.state.documents.get(&found_uri).map(|d| d.text.clone()).unwrap_or_default();
            let line_index = LineIndex::new(&text);
            GotoDefinitionResponse::Scalar(Location {
                uri: found_uri,
                range: Range {
                    start: line_index.position(span.start),
                    end: line_index.position(span.end),
                },
            })
        }))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let offset = self.offset(&uri, params.text_document_position.position);
        let index = self.index.lock().expect("index poisoned");
        let refs = references(&index, &uri, offset, params.context.include_declaration);
        if refs.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            refs.into_iter()
                .map(|(found_uri, span)| {
                    let text = self.state.documents.get(&found_uri).map(|d| d.text.clone()).unwrap_or_default();
                    let line_index = LineIndex::new(&text);
                    Location {
                        uri: found_uri,
                        range: Range {
                            start: line_index.position(span.start),
                            end: line_index.position(span.end),
                        },
                    }
                })
                .collect(),
        ))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri;
        let offset = self.offset(&uri, params.text_document_position.position);
        let index = self.index.lock().expect("index poisoned");
        let edits = match rename(&index, &uri, offset, &params.new_name) {
            Some(edits) => edits,
            None => return Ok(None),
        };
        let mut by_uri: std::collections::HashMap<Url, Vec<TextEdit>> = std::collections::HashMap::new();
        for edit in edits {
            let text = self.state.documents.get(&edit.uri).map(|d| d.text.clone()).unwrap_or_default();
            let line_index = LineIndex::new(&text);
            by_uri.entry(edit.uri).or_default().push(TextEdit {
                range: Range {
                    start: line_index.position(edit.range.start),
                    end: line_index.position(edit.range.end),
                },
                new_text: edit.new_text,
            });
        }
        Ok(Some(WorkspaceEdit {
            changes: Some(by_uri),
            ..Default::default()
        }))
    }

    async fn prepare_rename(&self, params: TextDocumentPositionParams) -> Result<Option<PrepareRenameResponse>> {
        let uri = params.text_document.uri;
        let offset = self.offset(&uri, params.position);
        let index = self.index.lock().expect("index poisoned");
        let text = self.state.documents.get(&uri).map(|d| d.text.clone()).unwrap_or_default();
        let line_index = LineIndex::new(&text);
        Ok(prepare_rename(&index, &uri, offset).map(|span| {
            PrepareRenameResponse::Range(Range {
                start: line_index.position(span.start),
                end: line_index.position(span.end),
            })
        }))
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        let uri = params.text_document.uri;
        let text = self.state.documents.get(&uri).map(|d| d.text.clone()).unwrap_or_default();
        let line_index = LineIndex::new(&text);
        let index = self.index.lock().expect("index poisoned");
        let lenses = code_lens(&index, &uri);
        Ok(Some(
            lenses
                .into_iter()
                .map(|item| CodeLens {
                    range: Range {
                        start: line_index.position(item.range.start),
                        end: line_index.position(item.range.end),
                    },
                    command: Some(Command {
                        title: item.title,
                        command: String::new(),
                        arguments: None,
                    }),
                    data: None,
                })
                .collect(),
        ))
    }

    async fn code_lens_resolve(&self, lens: CodeLens) -> Result<CodeLens> {
        Ok(lens)
    }
}
