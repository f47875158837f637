//! `architecture-lint [CRATE_DIR]`
//!
//! Defaults to the `backend/` crate of this workspace.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let crate_dir = std::env::args_os().nth(1).map_or_else(
        || Path::new(env!("CARGO_MANIFEST_DIR")).join("../../backend"),
        PathBuf::from,
    );
    match architecture_lint::lint_crate(&crate_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Nothing useful remains to do if stderr is closed.
            let _ = write!(io::stderr().lock(), "{err}");
            ExitCode::FAILURE
        }
    }
}
