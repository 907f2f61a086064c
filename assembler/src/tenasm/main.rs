use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use clap::ArgAction::{Append, SetTrue};
use clap::Parser;
use tracing::{Level, event, span};
use tracing_subscriber::prelude::*;

use assembler::*;

/// Two-pass assembler for the ten-bit teaching machine
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// Source files to assemble.  A name without an extension is
    /// taken to mean the `.as` file of that name.
    #[clap(action = Append, required = true)]
    inputs: Vec<PathBuf>,

    /// When set, print a listing of each assembled file together with
    /// its symbol table.
    #[clap(action = SetTrue, long)]
    list: bool,

    /// Do not write the macro-expanded (`.am`) file.
    #[clap(action = SetTrue, long)]
    no_expanded: bool,
}

#[derive(Debug)]
enum Fail {
    /// At least one of the input files could not be assembled.
    AsmFail { failed: usize, total: usize },
    /// We were not able to correctly initialise the assembler.
    InitialisationFailure(String),
}

impl Display for Fail {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Fail::AsmFail { failed, total } => {
                write!(f, "{failed} of {total} files failed to assemble")
            }
            Fail::InitialisationFailure(msg) => f.write_str(msg.as_str()),
        }
    }
}

impl Error for Fail {}

fn run_assembler() -> Result<(), Fail> {
    let cli = Cli::parse();

    // Set RUST_LOG to select which trace messages get printed, for
    // example RUST_LOG=assembler=debug.
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let filter_layer = match tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
    {
        Err(e) => {
            return Err(Fail::InitialisationFailure(format!(
                "failed to initialise tracing filter (perhaps there is a problem with environment variables): {e}"
            )));
        }
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let options = OutputOptions {
        list: cli.list,
        write_expanded: !cli.no_expanded,
    };
    let total = cli.inputs.len();
    let mut failed = 0;
    for arg in &cli.inputs {
        let input = source_path(arg);
        let span = span!(Level::ERROR, "file", input=?input);
        let _enter = span.enter();
        match assemble_file(&input, &options) {
            Ok(_) => {
                event!(Level::INFO, "assembly succeeded");
            }
            Err(AssemblerFailure::Rejected { errors, .. }) => {
                // The individual problems have already been reported.
                event!(
                    Level::ERROR,
                    "assembly failed with {} errors",
                    errors.count()
                );
                failed += 1;
            }
            Err(e) => {
                event!(Level::ERROR, "assembly failed: {e}");
                failed += 1;
            }
        }
    }
    if failed == 0 {
        Ok(())
    } else {
        Err(Fail::AsmFail { failed, total })
    }
}

fn main() {
    unsafe { backtrace_on_stack_overflow::enable() };

    match run_assembler() {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
