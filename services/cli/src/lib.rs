mod cli;
mod commands;

use roster_sync::error::AppError;

/// Exit status for any failed run.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when an input workbook does not exist.
pub const EXIT_MISSING_INPUT: i32 = 2;

pub fn run() -> Result<(), AppError> {
    cli::run()
}

pub fn exit_code(err: &AppError) -> i32 {
    if err.is_missing_input() {
        EXIT_MISSING_INPUT
    } else {
        EXIT_FAILURE
    }
}
