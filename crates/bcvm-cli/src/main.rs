//! BCVM - CLI
//!
//! Command-line interface to load and execute text bytecode programs.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use bcvm_core::{BcvmConfig, BcvmError, Program, ProgramLoader, VirtualMachine};

/// Run a text bytecode program
#[derive(Parser, Debug)]
#[command(name = "bcvm", version, about, long_about = None)]
struct Cli {
    /// Path to the bytecode program
    file: PathBuf,

    /// Load and validate the program without running it
    #[arg(long, conflicts_with = "disasm")]
    check: bool,

    /// Print the decoded program and exit
    #[arg(long)]
    disasm: bool,

    /// Cap the operand stack depth (unbounded by default)
    #[arg(long, value_name = "N")]
    max_stack: Option<usize>,

    /// Print the operand stack left after a successful run (top last)
    #[arg(long)]
    dump_stack: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(BcvmError::Io(e)) => {
            eprintln!("Error: failed to read {}: {}", cli.file.display(), e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), BcvmError> {
    let program = ProgramLoader::load_file(&cli.file)?;
    tracing::info!(file = %cli.file.display(), instructions = program.len(), "loaded");

    if cli.check {
        println!("{}: ok ({} instructions)", cli.file.display(), program.len());
        return Ok(());
    }
    if cli.disasm {
        disassemble(&program);
        return Ok(());
    }

    let mut config = BcvmConfig::new();
    if let Some(max_stack) = cli.max_stack {
        config = config.with_max_stack_size(max_stack);
    }

    let mut vm = VirtualMachine::new(config, program);
    vm.run()?;
    tracing::debug!(stack = vm.stack().len(), "run finished");

    if cli.dump_stack {
        for value in vm.stack() {
            eprintln!("{} ({})", value, value.kind_name());
        }
    }
    Ok(())
}

fn disassemble(program: &Program) {
    println!("{:>6}  {:>4}  op", "index", "pos");
    for (position, (instruction, op)) in program
        .instructions()
        .iter()
        .zip(program.ops())
        .enumerate()
    {
        println!("{:>6}  {:>4}  {}", instruction.index, position, op);
    }
}
