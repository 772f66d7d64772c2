use std::collections::BTreeMap;

use clap::Parser;
use rawdex::{domain::variant::CREATURE, Index, Namespace, Record, VariantKind};
use tracing::instrument;

use super::{terminal::Colorize, Raws};

#[derive(Debug, Parser)]
#[command(about = "Display a record and the file it belongs to")]
pub struct Show {
    /// The category of the record, e.g. `CREATURE` or `ITEM`
    category: String,

    /// The identifier of the record, e.g. `DOG`
    identifier: String,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Raw,
}

impl Show {
    #[instrument(level = "debug", skip(raws))]
    pub fn run(self, raws: &Raws) -> anyhow::Result<()> {
        let directory = raws.scan()?;
        let index = directory.index();
        let category = self.category.to_uppercase();
        let identifier = self.identifier;

        let Some(id) = index
            .category(&category)
            .and_then(|category| category.id(&identifier))
        else {
            anyhow::bail!("record {category}:{identifier} not found");
        };
        let (Some(record), Some(namespace)) = (index.record(id), index.namespace_of(id)) else {
            anyhow::bail!("record {category}:{identifier} not found");
        };

        match self.output {
            OutputFormat::Pretty => Self::output_pretty(index, namespace, record),
            OutputFormat::Json => Self::output_json(index, namespace, record)?,
            OutputFormat::Raw => print!("{}", record.text()),
        }

        Ok(())
    }

    fn output_pretty(index: &Index, namespace: &Namespace, record: &Record) {
        println!("# {}:{}", record.subtype(), record.identifier().ident());
        println!();

        println!("{}", "Metadata".dim());
        println!("  Namespace: {}", namespace.name());
        println!("  Type:      {}", namespace.object_type());
        if let Some(path) = namespace.source() {
            println!("  Path:      {}", path.display());
        }
        println!("  Position:  {}", record.slot());
        println!("  Tags:      {}", record.len());

        for (role, other) in variant_links(index, record) {
            println!("  {:<10} {}", format!("{}:", role.replace('_', " ")), other.ident());
        }

        println!("\n{}", "Content".dim());
        println!("{}", record.text().trim());
    }

    fn output_json(index: &Index, namespace: &Namespace, record: &Record) -> anyhow::Result<()> {
        use serde_json::json;

        let tags: Vec<_> = record.tags().map(|tag| tag.token.fields()).collect();

        let mut output = json!({
            "identifier": record.identifier(),
            "subtype": record.subtype(),
            "namespace": namespace.name(),
            "object_type": namespace.object_type(),
            "path": namespace.source().map(|p| p.to_string_lossy().to_string()),
            "position": record.slot(),
            "tags": tags,
            "text": record.text(),
        });

        for (role, other) in variant_links(index, record) {
            output[role] = json!(other);
        }

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

/// The other ends of a record's variant links, labelled by their role.
fn variant_links<'a>(index: &'a Index, record: &Record) -> Vec<(&'static str, &'a str)> {
    if record.subtype() != CREATURE {
        return Vec::new();
    }
    let links = index.variants();
    let identifier = record.identifier();
    let base_in = |links: &'a BTreeMap<String, String>| {
        links
            .iter()
            .find(|(_, variant)| variant.as_str() == identifier)
            .map(|(base, _)| ("base", base.as_str()))
    };

    match VariantKind::classify(record) {
        VariantKind::Giant => base_in(links.giant_links()).into_iter().collect(),
        VariantKind::AnimalPerson => base_in(links.animal_person_links()).into_iter().collect(),
        VariantKind::Baseline => [
            links.giant_of(identifier).map(|giant| ("giant", giant)),
            links
                .animal_person_of(identifier)
                .map(|person| ("animal_person", person)),
        ]
        .into_iter()
        .flatten()
        .collect(),
        VariantKind::Miscellaneous => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::cli::fixtures::{self, CREATURES, WEAPONS};

    #[test_case("CREATURE", "DOG", &[("giant", "GIANT_DOG"), ("animal_person", "DOG_MAN")]; "base lists its variants")]
    #[test_case("CREATURE", "CAT", &[("giant", "GIANT_CAT")]; "base without animal person")]
    #[test_case("CREATURE", "GIANT_DOG", &[("base", "DOG")]; "giant points at its base")]
    #[test_case("CREATURE", "DOG_MAN", &[("base", "DOG")]; "animal person points at its base")]
    #[test_case("ITEM_WEAPON", "ITEM_WEAPON_AXE", &[]; "not a creature")]
    fn labels_variant_roles(category: &str, identifier: &str, expected: &[(&str, &str)]) {
        let index = fixtures::index(&[("creature_domestic.txt", CREATURES), ("item_weapon.txt", WEAPONS)]);
        let record = index.get(category, identifier).unwrap();
        assert_eq!(variant_links(&index, record), expected);
    }

    #[test]
    fn creature_without_variants_has_no_links() {
        let index = fixtures::index(&[("creature_large.txt", fixtures::LARGE)]);
        let cow = index.get("CREATURE", "COW").unwrap();
        assert!(variant_links(&index, cow).is_empty());
    }
}
