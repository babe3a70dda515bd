use std::process::ExitCode;

fn main() -> ExitCode {
    landed_cli::run()
}
