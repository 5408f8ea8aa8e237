//! Grani Command-Line Interface
//!
//! Reads an `OpenQASM` 2.0 program from stdin (or a file), runs the
//! front-end, and reports the outcome through the exit status:
//!
//! - `0`: the program is well-formed; stderr stays empty.
//! - `2`: the program was rejected; the single diagnostic line goes to
//!   stderr as `<stage> error at <line>:<column>: <message>`.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

/// Grani - OpenQASM 2.0 syntax and semantics checker
#[derive(Parser)]
#[command(name = "grani")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file; reads stdin when omitted
    input: Option<PathBuf>,

    /// Print the accepted program as JSON on stdout
    #[arg(long)]
    dump_ast: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; events go to stdout, keeping stderr for diagnostics.
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let source = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?,
        None => read_stdin(),
    };

    tracing::debug!(bytes = source.len(), "read input");

    match grani_qasm2::check(&source) {
        Ok(program) => {
            tracing::info!(statements = program.statements.len(), "accepted");
            if cli.dump_ast {
                println!("{}", serde_json::to_string_pretty(&program)?);
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", style(err.diagnostic()).red());
            std::process::exit(2);
        }
    }
}

/// Read all of stdin. An unreadable stream counts as empty input, which
/// the parser rejects as a missing version header; invalid UTF-8 is
/// replaced so the lexer can point at the offending position.
fn read_stdin() -> String {
    let mut buf = Vec::new();
    if std::io::stdin().read_to_end(&mut buf).is_err() {
        tracing::warn!("failed to read stdin; treating input as empty");
        return String::new();
    }
    String::from_utf8_lossy(&buf).into_owned()
}
