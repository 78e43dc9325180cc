//! Cambridge pseudocode CLI

use cambridge::error::{CompileError, report_error};
use cambridge::interp::{Interpreter, InterpreterOptions};
use cambridge::lexer::tokenize;
use cambridge::parser::parse_source;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "cambridge",
    version,
    about = "Cambridge pseudocode interpreter",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Source file to run when no subcommand is given
    file: Option<PathBuf>,

    /// Seed the random number generator used by RAND and RANDOM
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log interpreter activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a pseudocode program
    Run {
        /// Source file to run
        file: PathBuf,
    },
    /// Start the interactive REPL
    Repl,
    /// Check a source file for syntax errors
    Check {
        /// Source file to check
        file: PathBuf,
    },
    /// Parse and dump AST as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
    /// Start the language server on stdin/stdout
    Lsp,
    /// Print version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = InterpreterOptions {
        seed: cli.seed,
        ..InterpreterOptions::default()
    };

    let result = match (cli.command, cli.file) {
        (Some(Command::Run { file }), _) | (None, Some(file)) => run_file(&file, options),
        (Some(Command::Repl), _) | (None, None) => run_repl(options),
        (Some(Command::Check { file }), _) => check_file(&file),
        (Some(Command::Parse { file }), _) => parse_file(&file),
        (Some(Command::Tokens { file }), _) => tokenize_file(&file),
        (Some(Command::Lsp), _) => run_lsp(),
        (Some(Command::Version), _) => {
            println!("cambridge {}", env!("CARGO_PKG_VERSION"));
            Ok(true)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Install a stderr subscriber when logging was asked for
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) if verbose => EnvFilter::new("cambridge=debug"),
        Err(_) => return,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &Path) -> Result<String, CompileError> {
    std::fs::read_to_string(path)
        .map_err(|e| CompileError::io_error(format!("{}: {e}", path.display())))
}

/// Parse and evaluate `path`; `Ok(false)` when the program failed
fn run_file(path: &Path, options: InterpreterOptions) -> Result<bool, Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    let (program, errors) = parse_source(&source);
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("Parse error: {err}");
        }
        return Ok(false);
    }

    tracing::debug!(file = %path.display(), statements = program.statements.len(), "run");
    let mut interp = Interpreter::with_options(options);
    match interp.run(&program) {
        Ok(_) => Ok(true),
        Err(err) => {
            eprintln!("{err}");
            Ok(false)
        }
    }
}

fn run_repl(options: InterpreterOptions) -> Result<bool, Box<dyn std::error::Error>> {
    let mut repl = cambridge::repl::Repl::new(options)?;
    repl.run()?;
    Ok(true)
}

fn check_file(path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    let filename = path.display().to_string();

    let (_, errors) = parse_source(&source);
    if errors.is_empty() {
        println!("✓ {filename} parses successfully");
        return Ok(true);
    }
    for err in errors {
        report_error(&filename, &source, &CompileError::from(err))?;
    }
    Ok(false)
}

fn parse_file(path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    let (program, errors) = parse_source(&source);
    for err in &errors {
        eprintln!("Parse error: {err}");
    }
    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(errors.is_empty())
}

fn tokenize_file(path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    for token in tokenize(&source) {
        println!(
            "{:?} {:?} @ {}:{} ({})",
            token.kind, token.literal, token.line, token.column, token.span
        );
    }
    Ok(true)
}

fn run_lsp() -> Result<bool, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(cambridge::lsp::run_server());
    Ok(true)
}
