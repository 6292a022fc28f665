//! Floyd verifier CLI
//!
//! Command-line driver: loads a program IR from JSON and verifies it, or
//! prints its basic paths and verification conditions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use floyd::ir::{validation, Program};
use floyd::verification::path::enumerate_function;
use floyd::verification::vcgen::VcGenerator;
use floyd::{SolverConfig, Verdict, Verifier};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "floyd")]
#[command(about = "Deductive verifier for annotated control-flow programs", long_about = None)]
#[command(version)]
struct Cli {
    /// Print basic paths and verification conditions while solving
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify every function of a program against its annotations
    Verify {
        /// Program IR in JSON form
        input: PathBuf,

        /// SMT solver binary
        #[arg(long, default_value = "z3")]
        solver: String,

        /// Argument passed to the solver (repeatable; defaults to "-in")
        #[arg(long = "solver-arg", allow_hyphen_values = true)]
        solver_args: Vec<String>,
    },

    /// Print the basic paths of every function
    Paths {
        /// Program IR in JSON form
        input: PathBuf,
    },

    /// Print the verification conditions without solving them
    Vcs {
        /// Program IR in JSON form
        input: PathBuf,
    },
}

fn load_program(path: &Path) -> Result<Program> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} does not contain a valid program", path.display()))
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Verify {
            input,
            solver,
            solver_args,
        } => {
            let program = load_program(&input)?;
            let args = if solver_args.is_empty() {
                vec!["-in".to_string()]
            } else {
                solver_args
            };
            let verifier = Verifier::new()
                .solver(SolverConfig {
                    binary: solver,
                    args,
                })
                .verbose(cli.verbose);
            let verdict = verifier.apply_with_diagnostics(&program, &mut std::io::stderr())?;
            println!("{verdict}");
            Ok(match verdict {
                Verdict::Verified => 0,
                Verdict::Refuted => 1,
                Verdict::Unknown => 2,
            })
        }
        Commands::Paths { input } => {
            let program = load_program(&input)?;
            validation::validate(&program)?;
            for function in &program.functions {
                for basic_path in enumerate_function(&program, function)? {
                    println!("{basic_path}");
                }
            }
            Ok(0)
        }
        Commands::Vcs { input } => {
            let program = load_program(&input)?;
            validation::validate(&program)?;
            let mut generator = VcGenerator::new();
            for function in &program.functions {
                for basic_path in enumerate_function(&program, function)? {
                    for vc in generator.generate(&basic_path)? {
                        println!("{vc}");
                    }
                }
            }
            Ok(0)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("error: {error:#}");
            process::exit(3);
        }
    }
}
