//! JSM command-line launcher
//!
//! Reads a JSON program, runs it on a fresh machine with the given entry
//! arguments, and prints the result as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jsm_core::{Restorable, Value};
use jsm_engine::{Machine, Program};

#[derive(Parser)]
#[command(name = "jsm")]
#[command(about = "JSON stack machine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program
    #[command(alias = "r")]
    Run {
        /// Path to the program JSON file
        program: PathBuf,
        /// Entry arguments, each a JSON value (e.g. 6, "abc", [1,2])
        args: Vec<String>,
        /// Write the post-run machine dump to this file
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            program,
            args,
            dump,
        } => run(program, args, dump),
    }
}

fn run(path: PathBuf, raw_args: Vec<String>, dump: Option<PathBuf>) -> Result<()> {
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let program = Program::from_json(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let mut args = Vec::with_capacity(raw_args.len());
    for raw in &raw_args {
        let value: Value = serde_json::from_str(raw)
            .with_context(|| format!("argument is not a JSON value: {}", raw))?;
        args.push(value);
    }

    let mut machine = Machine::new();
    let result = machine
        .run(&program, args)
        .with_context(|| format!("program {} failed", path.display()))?;
    for warning in machine.warnings() {
        eprintln!("warning: {}", warning);
    }
    println!("{}", serde_json::to_string(&result)?);

    if let Some(dump_path) = dump {
        let data = machine.dump()?;
        fs::write(&dump_path, data)
            .with_context(|| format!("failed to write {}", dump_path.display()))?;
    }
    Ok(())
}
