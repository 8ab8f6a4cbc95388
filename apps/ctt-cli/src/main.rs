//! `ctt` CLI — standalone binary.
//!
//! A thin wrapper around [`ctt_cli::run_cli`], handling error display and
//! exit codes. All command logic lives in the library crate for testability.
//!
//! # Exit codes
//!
//! - `0` - success
//! - `1` - error (message printed to stderr)

fn main() {
    env_logger::init();
    if let Err(e) = ctt_cli::run_cli() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
