use clap::Parser;
use tradejournal::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
