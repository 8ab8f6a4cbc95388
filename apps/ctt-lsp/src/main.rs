//! `ctt-lsp` — standalone language server binary, speaking LSP over stdio.

use tower_lsp::{LspService, Server};

mod server;

#[tokio::main]
async fn main() {
    env_logger::init();
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(server::CttServer::new)
        .custom_method("ctt/computeTerm", server::CttServer::compute_term)
        .finish();
    Server::new(stdin, stdout, socket).serve(service).await;
}
