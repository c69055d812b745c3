mod commands;
mod logging;

use std::{fs, path::PathBuf};

use clap::Parser;
use glycan::Registry;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, IntoDiagnostic, Result};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::info;

/// An interactive shell for parsing, comparing, and searching glycans written in IUPAC-condensed notation
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// A KDL file of glycoletters to use instead of the bundled registry
    #[arg(short, long, value_name = "PATH")]
    registry: Option<PathBuf>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logging(args.verbose, args.quiet);

    let registry = load_registry(args.registry)?;
    info!(glycoletters = registry.size(), "loaded glycoletter registry");

    let mut rl = DefaultEditor::new().into_diagnostic()?;
    loop {
        let line = match rl.readline("Glycan: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => return Err(error).into_diagnostic(),
        };
        if line.trim().is_empty() {
            continue;
        }
        rl.add_history_entry(&line).into_diagnostic()?;

        match commands::run(&registry, &line) {
            Ok(output) => print!("{output}"),
            Err(error) => render_error(error),
        }
    }

    Ok(())
}

fn load_registry(path: Option<PathBuf>) -> Result<Registry> {
    let Some(path) = path else {
        return Ok(Registry::default());
    };

    let kdl = fs::read_to_string(&path).into_diagnostic()?;
    Registry::new(path.to_string_lossy(), kdl)
}

fn render_error(diagnostic: impl Diagnostic) {
    let mut buf = String::new();
    match GraphicalReportHandler::new_themed(GraphicalTheme::unicode()).render_report(&mut buf, &diagnostic) {
        Ok(()) => println!("{buf}"),
        Err(_) => println!("{diagnostic}"),
    }
}
