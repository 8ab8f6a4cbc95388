//! Command-line interface for the `ctt` build tool.
//!
//! Built on [`clap`] with derive macros, the same way the teacher's CLI is;
//! each [`Commands`] variant maps to one handler function below.

use clap::{Parser, Subcommand};
use ctt_kernel::{Context, NormalizationKind, Term};
use ctt_orchestrator::{find_library_root, Orchestrator, Severity};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Command-line interface for the `ctt` tool.
#[derive(Parser)]
#[command(name = "ctt")]
#[command(about = "The ctt cubical type theory toolchain", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Discover a library and walk its build graph to completion.
    Compile {
        /// Path inside the library to compile (defaults to the current directory).
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Treat `path` itself as a library root instead of discovering one.
        #[arg(long)]
        library: bool,

        /// Emit diagnostics using ASCII-only punctuation.
        #[arg(long)]
        ascii: bool,

        /// Dump the named pipeline stage's artifact as a pretty-printed file.
        #[arg(long = "pretty-stage", value_name = "STAGE")]
        pretty_stage: Option<String>,

        /// Format to use for `--pretty-stage` output.
        #[arg(long = "pretty-format", value_name = "FORMAT", default_value = "text")]
        pretty_format: String,

        /// Directory `--pretty-stage` artifacts are written into.
        #[arg(long = "pretty-dir", value_name = "DIR")]
        pretty_dir: Option<PathBuf>,

        /// Dump a structured trace of the compile order as it runs.
        #[arg(long)]
        trace: bool,

        /// Additional directory to register as a library (repeatable).
        #[arg(long = "module-path", value_name = "DIR")]
        module_path: Vec<PathBuf>,
    },
    /// Start an interactive normalization loop.
    Repl,
}

/// Parses `std::env::args` and dispatches to the matching handler.
pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Compile {
            path,
            library,
            ascii,
            pretty_stage,
            pretty_format,
            pretty_dir,
            trace,
            module_path,
        } => compile(&CompileOptions {
            path,
            library,
            ascii,
            pretty_stage,
            pretty_format,
            pretty_dir,
            trace,
            module_path,
        }),
        Commands::Repl => repl(),
    }
}

struct CompileOptions {
    path: PathBuf,
    library: bool,
    ascii: bool,
    pretty_stage: Option<String>,
    pretty_format: String,
    pretty_dir: Option<PathBuf>,
    trace: bool,
    module_path: Vec<PathBuf>,
}

fn compile(opts: &CompileOptions) -> Result<(), String> {
    if opts.library && find_library_root(&opts.path) != Some(opts.path.clone()) {
        return Err(format!("{} is not a library root (no manifest directly inside it)", opts.path.display()));
    }

    let mut orchestrator = Orchestrator::new();
    let identity = orchestrator.register_library(&opts.path).map_err(|e| e.to_string())?;
    log::info!("compiling library '{}'", identity);

    for extra in &opts.module_path {
        orchestrator
            .register_library(extra)
            .map_err(|e| format!("--module-path {}: {}", extra.display(), e))?;
    }

    if opts.trace {
        for path in orchestrator.graph().compile_order().unwrap_or_default() {
            log::debug!("trace: scheduled {}", path.display());
        }
    }

    let highlights = orchestrator.reload();
    let mut failed = 0usize;
    let mut sources: Vec<_> = highlights.keys().cloned().collect();
    sources.sort();
    for source in &sources {
        let problems = &highlights[source];
        if problems.is_empty() {
            println!("{} {}", ok_marker(opts.ascii), source.display());
        } else {
            failed += 1;
            for problem in problems {
                println!(
                    "{} {}: {}",
                    severity_marker(problem.severity, opts.ascii),
                    source.display(),
                    problem.message
                );
            }
        }
    }

    if let (Some(stage), Some(dir)) = (&opts.pretty_stage, &opts.pretty_dir) {
        fs::create_dir_all(dir).map_err(|e| e.to_string())?;
        let artifact = dir.join(format!("{}.{}", stage, opts.pretty_format));
        let body = sources.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join("\n");
        fs::write(&artifact, body).map_err(|e| e.to_string())?;
    }

    println!("{} file(s) compiled, {} failed", sources.len(), failed);
    if failed > 0 {
        return Err(format!("{} file(s) failed to compile", failed));
    }
    Ok(())
}

fn ok_marker(ascii: bool) -> &'static str {
    if ascii {
        "ok  "
    } else {
        "✓"
    }
}

fn severity_marker(severity: Severity, ascii: bool) -> &'static str {
    match (severity, ascii) {
        (Severity::Error, true) => "error",
        (Severity::Error, false) => "✗",
        (Severity::Warning, true) => "warn ",
        (Severity::Warning, false) => "⚠",
        (_, true) => "note ",
        (_, false) => "·",
    }
}

fn repl() -> Result<(), String> {
    println!("ctt repl - enter a universe level (e.g. `0`), or `:q` to quit");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let ctx = Context::new();

    loop {
        print!("> ");
        stdout.flush().map_err(|e| e.to_string())?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).map_err(|e| e.to_string())? == 0 {
            break;
        }
        let line = line.trim();
        if line == ":q" {
            break;
        }
        if line.is_empty() {
            continue;
        }

        match line.parse::<u32>() {
            Ok(n) => {
                let normalized = ctt_kernel::normalize(&ctx, &Term::Type(n), NormalizationKind::Full);
                println!("{}", normalized);
            }
            Err(_) => println!("unrecognized input: '{}' (expected a universe level)", line),
        }
    }
    Ok(())
}
