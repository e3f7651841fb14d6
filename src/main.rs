use clap::Parser;
use mtrbands::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
