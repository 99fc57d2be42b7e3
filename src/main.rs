use clap::Parser;
use coincast::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
