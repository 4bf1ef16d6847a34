//! Cascade - task tracking with dependency-aware states

use std::process::ExitCode;

fn main() -> ExitCode {
    cascade::cli::run()
}
