mod entry;

use std::process::ExitCode;

use endpoint_probe::error::AppResult;

fn main() -> AppResult<ExitCode> {
    entry::run()
}
