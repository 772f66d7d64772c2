use std::collections::BTreeSet;

use clap::Parser;
use rawdex::VariantLinks;
use tracing::instrument;

use super::{terminal::Colorize, Raws};

#[derive(Debug, Parser, Default)]
#[command(about = "Show giant and animal-person variants of base creatures")]
pub struct Variants {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Only show base creatures missing a giant or animal-person variant
    #[arg(long)]
    missing: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, PartialEq, Eq)]
struct Row<'a> {
    base: &'a str,
    giant: Option<&'a str>,
    animal_person: Option<&'a str>,
}

impl Row<'_> {
    /// Missing a giant or an animal-person variant.
    const fn is_incomplete(&self) -> bool {
        self.giant.is_none() || self.animal_person.is_none()
    }
}

impl Variants {
    #[instrument(level = "debug", skip(self, raws))]
    pub fn run(self, raws: &Raws) -> anyhow::Result<()> {
        let directory = raws.scan()?;
        let links = directory.index().variants();

        let rows: Vec<_> = rows(links)
            .into_iter()
            .filter(|row| !self.missing || row.is_incomplete())
            .collect();

        match self.output {
            OutputFormat::Table => Self::output_table(&rows),
            OutputFormat::Json => Self::output_json(&rows)?,
        }
        Ok(())
    }

    fn output_table(rows: &[Row<'_>]) {
        if rows.is_empty() {
            println!("No creature variants found.");
            return;
        }

        println!("{:<32} {:<32} Animal person", "Base", "Giant");
        for row in rows {
            println!(
                "{} {:<32} {}",
                format!("{:<32}", row.base).ident(),
                row.giant.unwrap_or("–"),
                row.animal_person.unwrap_or("–"),
            );
        }
    }

    fn output_json(rows: &[Row<'_>]) -> anyhow::Result<()> {
        use serde_json::json;

        let output: Vec<_> = rows
            .iter()
            .map(|row| {
                json!({
                    "base": row.base,
                    "giant": row.giant,
                    "animal_person": row.animal_person,
                })
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

/// One row per base creature that has at least one variant.
fn rows(links: &VariantLinks) -> Vec<Row<'_>> {
    let bases: BTreeSet<&str> = links
        .giant_links()
        .keys()
        .chain(links.animal_person_links().keys())
        .map(String::as_str)
        .collect();

    bases
        .into_iter()
        .map(|base| Row {
            base,
            giant: links.giant_of(base),
            animal_person: links.animal_person_of(base),
        })
        .collect()
}
