//! LUX interpreter CLI

use clap::{Parser, Subcommand};
use lux::config::Config;
use lux::error::{CompileError, report_error};
use lux::interp::Interpreter;
use lux::repl::Repl;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lux", version, about = "LUX - interactive array-processing language")]
struct Cli {
    /// Configuration file (default: ./lux.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the interactive prompt
    Repl,
    /// Run a LUX source file
    Run {
        /// Source file to run
        file: PathBuf,
    },
    /// Run a source file, then dump the symbol table (debug)
    Dump {
        /// Source file to run
        file: PathBuf,
        /// Emit JSON instead of one line per symbol
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct DumpOutput {
    symbols: Vec<lux::symbol::SymbolInfo>,
    stats: lux::symbol::SymbolStats,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let level = match cli.verbose {
        0 => config.log.level_filter(),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if let Err(e) = simple_logger::SimpleLogger::new().with_level(level).init() {
        eprintln!("Error: cannot initialise logging: {e}");
    }

    let result = match cli.command.unwrap_or(Command::Repl) {
        Command::Repl => run_repl(&config),
        Command::Run { file } => run_file(&config, &file).map(|_| ()),
        Command::Dump { file, json } => dump_file(&config, &file, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_repl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut repl = Repl::new(config)?;
    repl.run()?;
    Ok(())
}

/// Runs `path`, rendering a diagnostic when a statement fails
fn run_file(config: &Config, path: &Path) -> Result<Interpreter, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| CompileError::io_error(format!("{}: {e}", path.display())))?;
    let filename = path.display().to_string();

    let mut interpreter = Interpreter::new(config);
    if let Some(dir) = path.parent() {
        interpreter.set_base_dir(dir);
    }
    if let Err(e) = interpreter.run_source(&source) {
        report_error(&filename, &source, &e);
        std::process::exit(1);
    }
    Ok(interpreter)
}

fn dump_file(config: &Config, path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let interpreter = run_file(config, path)?;
    let symbols = interpreter.symbols();

    if json {
        let output = DumpOutput { symbols: symbols.dump(), stats: symbols.stats() };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for info in symbols.dump() {
            println!("{}", symbols.describe(info.handle));
        }
    }
    Ok(())
}
