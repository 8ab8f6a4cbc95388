//! Library half of the `ctt` CLI: argument parsing and command handlers,
//! kept separate from `main.rs` so they're testable without spawning a
//! process.

pub mod cli;

pub use cli::run_cli;
