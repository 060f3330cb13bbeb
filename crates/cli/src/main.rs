use std::process::ExitCode;

fn main() -> ExitCode {
    dlassist_cli::run()
}
