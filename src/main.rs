use std::process::ExitCode;

use colored::Colorize;

fn main() -> ExitCode {
    match landlordtop::app::run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
