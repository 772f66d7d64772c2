use std::io::Write as _;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rawdex::{domain::Category, Index, Record, RecordId};
use regex::Regex;
use serde::Serialize;
use tracing::instrument;

use super::{terminal::Colorize, Raws};

/// Command arguments for `rawdex list`.
#[derive(Debug, Parser)]
#[command(about = "List the identifiers in a category")]
pub struct List {
    /// The category to list, e.g. `CREATURE` or `ITEM_WEAPON`.
    #[arg(value_parser = parse_category)]
    category: String,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,

    /// Filter by namespace (comma-separated, case-insensitive).
    #[arg(long, value_delimiter = ',', value_name = "NS")]
    namespace: Vec<String>,

    /// Show only records carrying a tag with this name (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "TAG")]
    tag: Vec<String>,

    /// Case-insensitive substring match against the identifier.
    #[arg(long, conflicts_with = "regex")]
    contains: Option<String>,

    /// Regular expression match against the identifier.
    #[arg(long)]
    regex: Option<String>,

    /// Limit number of rows returned.
    #[arg(long)]
    limit: Option<usize>,

    /// Skip the first N rows.
    #[arg(long)]
    offset: Option<usize>,
}

/// Categories are upper case; accept any case on the command line.
fn parse_category(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("category must not be empty".to_string());
    }
    Ok(s.to_uppercase())
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone)]
struct Filters {
    namespaces: Vec<String>,
    tags: Vec<String>,
    contains: Option<String>,
    regex: Option<Regex>,
}

impl Filters {
    fn new(list: &List) -> anyhow::Result<Self> {
        let regex = list
            .regex
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("invalid --regex pattern")?;

        Ok(Self {
            namespaces: list.namespace.iter().map(|ns| ns.to_lowercase()).collect(),
            tags: list.tag.iter().map(|tag| tag.to_uppercase()).collect(),
            contains: list.contains.as_ref().map(|s| s.to_lowercase()),
            regex,
        })
    }

    fn matches(&self, ident: &str, namespace: &str, record: &Record) -> bool {
        if !self.namespaces.is_empty() && !self.namespaces.contains(&namespace.to_lowercase()) {
            return false;
        }
        if !self.tags.iter().all(|tag| record.contains(tag)) {
            return false;
        }
        if let Some(needle) = &self.contains {
            if !ident.to_lowercase().contains(needle) {
                return false;
            }
        }
        self.regex.as_ref().is_none_or(|regex| regex.is_match(ident))
    }
}

#[derive(Debug, Clone, Serialize)]
struct Row<'a> {
    identifier: &'a str,
    subtype: &'a str,
    namespace: &'a str,
    tags: usize,
}

impl List {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, raws: &Raws) -> anyhow::Result<()> {
        let directory = raws.scan()?;
        let index = directory.index();

        let Some(category) = index.category(&self.category) else {
            let known: Vec<_> = index.categories().collect();
            anyhow::bail!(
                "unknown category {}; the index has: {}",
                self.category,
                known.join(", ")
            );
        };

        let filters = Filters::new(&self)?;
        let rows = collect_rows(index, &category, &filters);
        let rows: Vec<_> = rows
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();

        match self.output {
            OutputFormat::Table => render_table(&self.category, &rows, self.quiet),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(std::io::stdout(), &rows)?;
                println!();
            }
            OutputFormat::Csv => render_csv(&rows, self.quiet)?,
        }
        Ok(())
    }
}

fn collect_rows<'a>(index: &'a Index, category: &Category<'a>, filters: &Filters) -> Vec<Row<'a>> {
    category
        .iter()
        .filter_map(|(identifier, id, record)| {
            let namespace = namespace_name(index, id);
            filters
                .matches(identifier, namespace, record)
                .then(|| Row {
                    identifier,
                    subtype: record.subtype(),
                    namespace,
                    tags: record.len(),
                })
        })
        .collect()
}

fn namespace_name(index: &Index, id: RecordId) -> &str {
    index.namespace_of(id).map_or("", |ns| ns.name())
}

fn render_table(category: &str, rows: &[Row<'_>], quiet: bool) {
    if quiet {
        for row in rows {
            println!("{}", row.identifier);
        }
        return;
    }

    if rows.is_empty() {
        println!("No {category} records match.");
        return;
    }

    let width = rows
        .iter()
        .map(|row| row.identifier.len())
        .max()
        .unwrap_or(0)
        .max("Identifier".len());

    println!(
        "{:<width$}  {:<20}  {:<28}  Tags",
        "Identifier", "Subtype", "Namespace"
    );
    for row in rows {
        println!(
            "{}  {:<20}  {:<28}  {}",
            format!("{:<width$}", row.identifier).ident(),
            row.subtype,
            row.namespace,
            row.tags
        );
    }
    println!("{}", format!("{} records", rows.len()).dim());
}

fn render_csv(rows: &[Row<'_>], quiet: bool) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    if !quiet {
        writeln!(out, "identifier,subtype,namespace,tags")?;
    }
    for row in rows {
        writeln!(
            out,
            "{},{},{},{}",
            row.identifier, row.subtype, row.namespace, row.tags
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::cli::fixtures::{self, CREATURES, LARGE};

    fn filters(args: &[&str]) -> Filters {
        let list = List::try_parse_from(["list", "creature"].iter().chain(args)).unwrap();
        Filters::new(&list).unwrap()
    }

    fn matching(index: &Index, args: &[&str]) -> Vec<String> {
        let category = index.category("CREATURE").unwrap();
        collect_rows(index, &category, &filters(args))
            .into_iter()
            .map(|row| format!("{}/{}", row.namespace, row.identifier))
            .collect()
    }

    #[test]
    fn category_is_upper_cased() {
        let list = List::try_parse_from(["list", "item_weapon"]).unwrap();
        assert_eq!(list.category, "ITEM_WEAPON");
        assert!(List::try_parse_from(["list", ""]).is_err());
    }

    #[test]
    fn no_filters_match_everything() {
        let index = fixtures::index(&[("creature_domestic.txt", CREATURES), ("creature_large.txt", LARGE)]);
        assert_eq!(matching(&index, &[]).len(), 6);
    }

    #[test_case(&["--namespace", "CREATURE_LARGE"], &["creature_large/COW"]; "namespace ignores case")]
    #[test_case(&["--namespace", "creature_large,creature_domestic", "--contains", "cat"], &["creature_domestic/CAT", "creature_domestic/GIANT_CAT"]; "several namespaces")]
    #[test_case(&["--tag", "description"], &["creature_domestic/DOG"]; "tag name ignores case")]
    #[test_case(&["--tag", "NAME,DESCRIPTION"], &["creature_domestic/DOG"]; "every tag must be present")]
    #[test_case(&["--contains", "Dog"], &["creature_domestic/DOG", "creature_domestic/DOG_MAN", "creature_domestic/GIANT_DOG"]; "substring ignores case")]
    #[test_case(&["--regex", "^GIANT_"], &["creature_domestic/GIANT_CAT", "creature_domestic/GIANT_DOG"]; "regex")]
    #[test_case(&["--regex", "^giant_"], &[]; "regex is case sensitive")]
    fn filter(args: &[&str], expected: &[&str]) {
        let index = fixtures::index(&[("creature_domestic.txt", CREATURES), ("creature_large.txt", LARGE)]);
        let mut rows = matching(&index, args);
        rows.sort();
        assert_eq!(rows, expected);
    }

    #[test]
    fn matches_checks_the_given_record() {
        let index = fixtures::index(&[("creature_domestic.txt", CREATURES)]);
        let dog = index.get("CREATURE", "DOG").unwrap();
        let by_namespace = filters(&["--namespace", "creature_domestic", "--tag", "NAME"]);
        assert!(by_namespace.matches("DOG", "creature_domestic", dog));
        assert!(!by_namespace.matches("DOG", "creature_large", dog));

        let cat = index.get("CREATURE", "CAT").unwrap();
        let by_tag = filters(&["--tag", "DESCRIPTION"]);
        assert!(by_tag.matches("DOG", "creature_domestic", dog));
        assert!(!by_tag.matches("CAT", "creature_domestic", cat));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let list = List::try_parse_from(["list", "creature", "--regex", "("]).unwrap();
        assert!(Filters::new(&list).is_err());
    }

    #[test]
    fn contains_conflicts_with_regex() {
        assert!(List::try_parse_from(["list", "creature", "--contains", "a", "--regex", "a"]).is_err());
    }
}
