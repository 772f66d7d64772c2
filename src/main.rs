//! `rawdex`: scan, inspect and rewrite a directory of raw files.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
