//! CLI for the VM-to-Hack backend.
//!
//! ```bash
//! hack-vmc Prog.vm        # one unit -> Prog.asm
//! hack-vmc project/       # every .vm in the directory -> project/project.asm
//! ```

use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use hack_vmc::{TranslateError, write_program};

#[derive(Parser, Debug)]
#[command(name = "hack-vmc")]
#[command(version)]
#[command(about = "Translates stack VM code to Hack assembly")]
struct Args {
    /// A .vm file, or a directory whose .vm files form one program
    #[arg(value_name = "INPUT")]
    input: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match write_program(&args.input) {
        Ok(artifact) => {
            println!("{}", artifact.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(cause) = err.source() {
                eprintln!("  caused by: {cause}");
            }
            match err {
                TranslateError::MissingInput(_)
                | TranslateError::WrongExtension(_)
                | TranslateError::EmptyDirectory(_) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}
