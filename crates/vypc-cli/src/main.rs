//! VYP compiler command-line driver
//!
//! `vypc [-v|--verbose] <input-file> [<output-file>]`
//!
//! The sole error handler of the pipeline: every `CompileError` kind
//! maps to its process exit code (11 lexical, 12 syntax, 13
//! incompatibility, 14 semantic, 19 other). I/O failures share the
//! "other" code.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use vypc_ir::{CompileError, CompileResult};
use vypc_parser::Symbol;

#[derive(Parser)]
#[command(name = "vypc")]
#[command(about = "Compile a VYP source file to VYPcode", long_about = None)]
#[command(version)]
struct Cli {
    /// Source file to compile
    input: PathBuf,

    /// Output file
    #[arg(default_value = "out.vc")]
    output: PathBuf,

    /// Dump the IR after parsing and annotate emitted code with frame
    /// offsets
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> CompileResult<()> {
    let source = std::fs::read_to_string(&cli.input).map_err(|e| {
        CompileError::internal(format!("cannot read {}: {}", cli.input.display(), e))
    })?;

    let (mut program, global) = vypc_parser::parse(&source)?;

    // The dump comes before generation so the IR behind any
    // generator-internal error stays observable.
    if cli.verbose {
        for (_, symbol) in global.iter() {
            match symbol {
                Symbol::Function(f) => print!("{}", program.dump_function(f)),
                Symbol::Class(c) => print!("{}", program.dump_class(c)),
                Symbol::Variable(_) => {}
            }
        }
    }

    let output = vypc_compiler::generate(&mut program, &global, cli.verbose)?;

    std::fs::write(&cli.output, output).map_err(|e| {
        CompileError::internal(format!("cannot write {}: {}", cli.output.display(), e))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_defaults_to_out_vc() {
        let cli = Cli::parse_from(["vypc", "program.vl"]);
        assert_eq!(cli.input, PathBuf::from("program.vl"));
        assert_eq!(cli.output, PathBuf::from("out.vc"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_verbose_and_explicit_output() {
        let cli = Cli::parse_from(["vypc", "-v", "program.vl", "program.vc"]);
        assert!(cli.verbose);
        assert_eq!(cli.output, PathBuf::from("program.vc"));

        let cli = Cli::parse_from(["vypc", "--verbose", "program.vl"]);
        assert!(cli.verbose);
    }
}
