//! `reqgraph`: validate, list, diff and tabulate certification requirements.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
