use std::path::{Path, PathBuf};

mod check;
mod export;
mod list;
mod show;
mod status;
mod terminal;
mod variants;

use anyhow::Context;
use check::Check;
use clap::ArgAction;
use export::Export;
use list::List;
use rawdex::{
    storage::{Scanned, Unscanned},
    Config, Directory, Registry,
};
use show::Show;
use status::Status;
use tracing::instrument;
use variants::Variants;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the directory of raw files
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log validation failures and keep going instead of aborting
    #[arg(long, global = true)]
    permissive: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let mut config = Config::load_or_default(&self.root);
        if self.permissive {
            config.strict = false;
        }
        let raws = Raws {
            root: self.root,
            config,
        };

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(&raws)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// The raw directory a command operates on, with its effective configuration.
#[derive(Debug)]
pub struct Raws {
    root: PathBuf,
    config: Config,
}

impl Raws {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn directory(&self) -> Directory<Unscanned> {
        Directory::new(self.root.clone())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn scan(&self) -> anyhow::Result<Directory<Scanned>> {
        self.directory()
            .scan(&self.config, Registry::global())
            .with_context(|| format!("failed to scan {}", self.root.display()))
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show namespace, record and diagnostic counts (default)
    Status(Status),

    /// List the identifiers in a category
    List(List),

    /// Show the raw text of a record
    Show(Show),

    /// Show giant and animal-person variants of base creatures
    Variants(Variants),

    /// Verify that every raw file survives a parse and rewrite unchanged
    Check(Check),

    /// Write every raw file to a new directory
    Export(Export),
}

impl Command {
    fn run(self, raws: &Raws) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(raws)?,
            Self::List(command) => command.run(raws)?,
            Self::Show(command) => command.run(raws)?,
            Self::Variants(command) => command.run(raws)?,
            Self::Check(command) => command.run(raws)?,
            Self::Export(command) => command.run(raws)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod fixtures {
    use rawdex::{storage::RawFile, Index, Namespace, Registry, Strictness};

    pub const CREATURES: &[u8] = b"creature_domestic\n[OBJECT:CREATURE]\n\
        [CREATURE:DOG][NAME:dog:dogs:dog][DESCRIPTION:A loyal friend.]\n\
        [CREATURE:CAT][NAME:cat:cats:cat]\n\
        [CREATURE:GIANT_DOG][COPY_TAGS_FROM:DOG][APPLY_CREATURE_VARIATION:GIANT]\n\
        [CREATURE:DOG_MAN][COPY_TAGS_FROM:DOG][APPLY_CREATURE_VARIATION:ANIMAL_PERSON]\n\
        [CREATURE:GIANT_CAT][COPY_TAGS_FROM:CAT][APPLY_CREATURE_VARIATION:GIANT]\n";

    pub const LARGE: &[u8] = b"creature_large\n[OBJECT:CREATURE]\n[CREATURE:COW][NAME:cow:cows:cow]\n";

    pub const WEAPONS: &[u8] = b"item_weapon\n[OBJECT:ITEM]\n[ITEM_WEAPON:ITEM_WEAPON_AXE][NAME:axe:axes]\n";

    /// Builds a strict index from `(file name, content)` pairs.
    pub fn index(files: &[(&str, &[u8])]) -> Index {
        let mut builder = Index::builder(Strictness::Strict);
        for (file_name, bytes) in files {
            let raw = RawFile::parse(bytes, file_name, builder.diagnostics_mut()).unwrap();
            let namespace =
                Namespace::new(raw, Registry::global(), builder.diagnostics_mut()).unwrap();
            builder.add(namespace).unwrap();
        }
        builder.finish().unwrap()
    }
}
