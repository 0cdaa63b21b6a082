//! Synacor VM - CLI Entry Point
//!
//! Commands:
//! - `synacor-vm execute <image>` - Run a binary image until it halts
//! - `synacor-vm prettyprint <image>` - Print a disassembly listing
//!
//! Setting the `VM_TRACE` environment variable (or passing `--trace`)
//! prints every instruction before it executes, with live register
//! values, to stderr.

use clap::{Parser, Subcommand};
use synacor::{disassemble, format_instruction, load_image, Console, Machine};

#[derive(Parser)]
#[command(name = "synacor-vm")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the Synacor challenge's 15-bit virtual machine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a binary image and run it until it halts
    Execute {
        /// Path to the binary image to execute
        image: String,
        /// Maximum number of instructions to execute (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        max_cycles: u64,
        /// Print each instruction before executing it
        #[arg(short, long)]
        trace: bool,
    },
    /// Print a disassembly listing of a binary image
    Prettyprint {
        /// Path to the binary image to disassemble
        image: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Execute {
            image,
            max_cycles,
            trace,
        } => {
            execute(&image, max_cycles, trace);
        }
        Commands::Prettyprint { image } => {
            prettyprint(&image);
        }
    }
}

fn execute(path: &str, max_cycles: u64, trace_flag: bool) {
    let tokens = match load_image(path) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let trace = trace_flag || std::env::var_os("VM_TRACE").is_some();

    let mut machine = match Machine::new(&tokens, Console::stdio()) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("failed to load program: {}", e);
            std::process::exit(1);
        }
    };

    while machine.is_running() && (max_cycles == 0 || machine.cycles < max_cycles) {
        if trace {
            eprintln!(
                "{}",
                format_instruction(machine.pc, machine.mem.words(), Some(&machine.regs))
            );
        }

        if let Err(e) = machine.step() {
            eprintln!("vm error at pc={}: {}", machine.pc, e);
            std::process::exit(1);
        }
    }

    if machine.is_running() {
        eprintln!(
            "reached max cycles limit ({}); use --max-cycles to increase",
            max_cycles
        );
    }
}

fn prettyprint(path: &str) {
    let tokens = match load_image(path) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };

    println!("parsed {} tokens from {}", tokens.len(), path);
    print!("{}", disassemble(&tokens));
}
