use std::process::ExitCode;

fn main() -> ExitCode {
    medirent_cli::run()
}
