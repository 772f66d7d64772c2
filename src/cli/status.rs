use std::{collections::BTreeMap, process};

use clap::Parser;
use rawdex::{ErrorKind, Index};
use tracing::instrument;

use super::{
    terminal::{is_narrow, Colorize},
    Raws,
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show namespace, record and diagnostic counts")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress headers and format for scripting
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

struct Summary {
    namespaces: usize,
    invalid_namespaces: usize,
    records: usize,
    invalid_records: usize,
    categories: BTreeMap<String, usize>,
    diagnostics: BTreeMap<ErrorKind, usize>,
}

impl Summary {
    fn new(index: &Index) -> Self {
        let categories = index
            .categories()
            .filter_map(|key| Some((key.to_string(), index.category(key)?.len())))
            .collect();

        let mut diagnostics = BTreeMap::new();
        for diagnostic in index.diagnostics() {
            *diagnostics.entry(diagnostic.kind).or_insert(0) += 1;
        }

        Self {
            namespaces: index.namespaces().len(),
            invalid_namespaces: index.namespaces().iter().filter(|ns| !ns.is_valid()).count(),
            records: index.record_count(),
            invalid_records: index.invalid_count(),
            categories,
            diagnostics,
        }
    }

    fn diagnostic_count(&self) -> usize {
        self.diagnostics.values().sum()
    }
}

impl Status {
    #[instrument(level = "debug", skip(self, raws))]
    pub fn run(self, raws: &Raws) -> anyhow::Result<()> {
        let directory = raws.scan()?;
        let summary = Summary::new(directory.index());

        if summary.namespaces == 0 {
            println!("No raw files found in {}.", raws.root().display());
            return Ok(());
        }

        match self.output {
            OutputFormat::Json => Self::output_json(&summary)?,
            OutputFormat::Table => {
                if self.quiet {
                    Self::output_quiet(&summary);
                } else {
                    Self::output_table(&summary);
                }
            }
        }

        // Exit with a non-zero code when a permissive scan found problems.
        if summary.diagnostic_count() > 0 {
            process::exit(2);
        }

        Ok(())
    }

    fn output_json(summary: &Summary) -> anyhow::Result<()> {
        use serde_json::json;

        let categories: Vec<_> = summary
            .categories
            .iter()
            .map(|(category, count)| json!({ "category": category, "count": count }))
            .collect();

        let diagnostics: Vec<_> = summary
            .diagnostics
            .iter()
            .map(|(kind, count)| json!({ "kind": kind.to_string(), "count": count }))
            .collect();

        let output = json!({
            "namespaces": {
                "count": summary.namespaces,
                "invalid": summary.invalid_namespaces,
            },
            "records": {
                "count": summary.records,
                "invalid": summary.invalid_records,
            },
            "categories": categories,
            "diagnostics": diagnostics,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_quiet(summary: &Summary) {
        println!(
            "namespaces={} records={} invalid={} diagnostics={}",
            summary.namespaces,
            summary.records,
            summary.invalid_records,
            summary.diagnostic_count()
        );
    }

    fn output_table(summary: &Summary) {
        println!("Record counts");
        println!("{}", "─────────────".dim());

        if is_narrow() {
            for (category, count) in &summary.categories {
                println!("{category}: {count}");
            }
        } else {
            println!("{:<28} Count", "Category");
            for (category, count) in &summary.categories {
                println!("{category:<28} {count}");
            }
        }
        println!(
            "Total: {} records in {} files",
            summary.records, summary.namespaces
        );

        println!();

        if summary.invalid_namespaces == 0 && summary.invalid_records == 0 {
            println!("Invalid: {} ✅", "0".success());
        } else {
            println!(
                "Invalid: {} files, {} records ⚠️",
                summary.invalid_namespaces.to_string().warning(),
                summary.invalid_records.to_string().warning()
            );
        }

        println!();

        if summary.diagnostics.is_empty() {
            println!("Diagnostics: {} ✅", "0".success());
        } else {
            println!(
                "Diagnostics: {} ⚠️",
                summary.diagnostic_count().to_string().warning()
            );
            for (kind, count) in &summary.diagnostics {
                println!("  - {kind}: {count}");
            }
        }
    }
}
