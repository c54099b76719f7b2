use std::process::ExitCode;

fn main() -> ExitCode {
    msgbroker::app::startup::startup()
}
