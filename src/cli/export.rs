use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;

use super::{terminal::Colorize, Raws};

#[derive(Debug, Parser)]
#[command(about = "Write every raw file to a new directory")]
pub struct Export {
    /// The directory to write to; it must be empty or not exist yet
    out: PathBuf,
}

impl Export {
    #[instrument(level = "debug", skip(raws))]
    pub fn run(self, raws: &Raws) -> anyhow::Result<()> {
        let directory = raws.scan()?;
        let written = directory.write_to(&self.out)?;

        println!(
            "Wrote {} raw files to {}",
            written.len().to_string().success(),
            self.out.display()
        );
        Ok(())
    }
}
