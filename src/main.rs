//! Ampere - DC Circuit Solver
//!
//! Reads a circuit description as JSON, solves it, and prints the solution
//! as JSON.
//!
//! # Usage
//!
//! ```bash
//! ampere circuit.json
//! cat circuit.json | ampere
//! ```

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;

use ampere_core::error::{AmpereError, Result};
use ampere_core::wire;

/// Passive linear DC circuit solver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the circuit description JSON (stdin when omitted)
    #[arg(value_name = "CIRCUIT_FILE")]
    circuit_file: Option<PathBuf>,

    /// Pretty-print the solution
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let input = match &args.circuit_file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| AmpereError::FileRead {
            path: path.display().to_string(),
            source,
        })?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|source| AmpereError::FileRead {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            buffer
        }
    };

    let description: wire::CircuitDescription = serde_json::from_str(&input)?;
    let result = wire::solve_description(&description)?;

    let payload = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{payload}");

    Ok(())
}
