//! cadenza — run a composition program and export its piano-roll data.
//!
//! Reads a program file, executes it, and writes the JSON export of the
//! last printed music value next to the source (or to `--out`). Scalar
//! prints and diagnostics go to stderr; the exit status encodes the error
//! class: 0 success, 1 syntax, 2 semantic/type, 3 runtime arithmetic.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cadenza::interp::execute_program_with;
use cadenza::render::FileRenderer;

#[derive(Parser)]
#[command(
    name = "cadenza",
    about = "Run a composition program and export piano-roll event data"
)]
struct Cli {
    /// Path to a program source file
    file: PathBuf,

    /// Where to write the exported JSON (defaults to the source path with
    /// a .json extension)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> ExitCode {
    ExitCode::from(run(Cli::parse()))
}

fn run(cli: Cli) -> u8 {
    let source = match std::fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: could not read {}: {e}", cli.file.display());
            return 1;
        }
    };

    let out_path = cli
        .out
        .clone()
        .unwrap_or_else(|| cli.file.with_extension("json"));
    let mut renderer = FileRenderer::new(&out_path);

    match execute_program_with(&source, &mut renderer) {
        Ok(exec) => {
            for line in &exec.printed {
                eprintln!("{line}");
            }
            if exec.music.is_some() {
                eprintln!("wrote piano-roll data to {}", out_path.display());
            }
            0
        }
        Err(err) => {
            eprintln!("{err}");
            err.exit_code()
        }
    }
}
