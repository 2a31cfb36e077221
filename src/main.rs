//! Stride compiler driver
//!
//! Runs the front end over source files and reports the first error.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use stride::frontend::semantic::SymbolDef;
use stride::{Error, Session};

/// Stride Compiler
#[derive(Parser, Debug)]
#[command(name = "stridec")]
#[command(version = "0.1.0")]
#[command(about = "Stride compiler front end - parse and resolve Stride sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print diagnostics as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Additional import search path
    #[arg(short = 'I', long = "include", value_name = "DIR", global = true)]
    include: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check source files for errors
    Check {
        /// Input source files, parsed in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Dump the global symbol registry as JSON
    Symbols {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the parsed syntax tree
    Ast {
        file: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Check { files } => check_files(&cli, files),
        Commands::Symbols { files } => dump_symbols(&cli, files),
        Commands::Ast { file } => dump_ast(&cli, file),
        Commands::Version => {
            println!("stridec 0.1.0");
            println!("Stride Compiler");
            println!("License: Apache-2.0");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn session_for(cli: &Cli) -> Session {
    let mut session = Session::new();
    for dir in &cli.include {
        session.add_search_path(dir);
    }
    session
}

/// Parse every file into one session, exiting with the first diagnostic
fn parse_all(cli: &Cli, files: &[PathBuf]) -> anyhow::Result<Session> {
    let mut session = session_for(cli);
    for file in files {
        log::debug!("parsing {}", file.display());
        if let Err(e) = session.parse_file(file) {
            report(cli, &e)?;
            process::exit(1);
        }
    }
    Ok(session)
}

fn report(cli: &Cli, error: &Error) -> anyhow::Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(&error.report())
            .context("failed to serialize diagnostic")?;
        eprintln!("{}", json);
    } else {
        eprint!("{}", error.render());
    }
    Ok(())
}

fn check_files(cli: &Cli, files: &[PathBuf]) -> anyhow::Result<()> {
    parse_all(cli, files)?;
    println!("No errors found");
    Ok(())
}

fn dump_symbols(cli: &Cli, files: &[PathBuf]) -> anyhow::Result<()> {
    let session = parse_all(cli, files)?;
    let symbols: Vec<&SymbolDef> = session
        .table()
        .global_symbols()
        .iter()
        .filter(|def| {
            matches!(def, SymbolDef::Function(_) | SymbolDef::Struct(_) | SymbolDef::Field(_))
        })
        .collect();
    let json =
        serde_json::to_string_pretty(&symbols).context("failed to serialize symbol registry")?;
    println!("{}", json);
    Ok(())
}

fn dump_ast(cli: &Cli, file: &PathBuf) -> anyhow::Result<()> {
    let mut session = session_for(cli);
    let unit = match session.parse_file(file) {
        Ok(unit) => unit,
        Err(e) => {
            report(cli, &e)?;
            process::exit(1);
        }
    };
    println!("{:#?}", unit.program);
    Ok(())
}
