//! update-guard - Install configuration validator

use std::process::ExitCode;

fn main() -> ExitCode {
    match update_guard::cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
