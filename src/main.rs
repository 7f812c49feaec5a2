use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use vox_interpreter::PRELUDE;

/// Runs a vox script.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the script to run.
    script: PathBuf,

    /// Load the standard library from this file instead of the bundled one.
    #[arg(long, env = "VOX_STDLIB")]
    stdlib: Option<PathBuf>,
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read '{}': {}", path.display(), e);
        process::exit(1);
    })
}

fn main() {
    let args = Args::parse();

    let source = read(&args.script);
    let stdlib = match &args.stdlib {
        Some(path) => read(path),
        None => PRELUDE.to_owned(),
    };

    if let Err(e) = vox_interpreter::run(&source, &stdlib) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
