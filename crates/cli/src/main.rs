use std::process::ExitCode;

fn main() -> ExitCode {
    stylegraph_cli::run()
}
