//! Links between generated creature variants and their base creatures.
//!
//! A giant or animal-person creature is declared by applying a creature
//! variation and copying the tags of a base creature:
//!
//! ```text
//! [CREATURE:GIANT_DOG]
//!     [COPY_TAGS_FROM:DOG]
//!     [APPLY_CREATURE_VARIATION:GIANT]
//! ```

use std::collections::BTreeMap;

use crate::domain::{
    diagnostics::{Diagnostic, Diagnostics, ErrorKind},
    index::{Index, RecordId},
    record::Record,
};

/// The category holding creature records.
pub const CREATURE: &str = "CREATURE";
/// Tag applying a named variation to a creature.
pub const APPLY_CREATURE_VARIATION: &str = "APPLY_CREATURE_VARIATION";
/// Tag naming the record a creature is derived from.
pub const COPY_TAGS_FROM: &str = "COPY_TAGS_FROM";

const GIANT: &str = "GIANT";
const ANIMAL_PERSON: &[&str] = &["ANIMAL_PERSON", "ANIMAL_PERSON_LEGLESS"];

/// How a creature record relates to the variation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// No variation is applied.
    Baseline,
    /// A giant-sized version of a base creature.
    Giant,
    /// An animal-person version of a base creature.
    AnimalPerson,
    /// Some other variation; logged but not linked.
    Miscellaneous,
}

impl VariantKind {
    /// Classifies a creature by the variations it applies.
    ///
    /// `GIANT` takes precedence over the animal-person variations.
    #[must_use]
    pub fn classify(record: &Record) -> Self {
        let variations = record.tags_named(APPLY_CREATURE_VARIATION);
        if variations.is_empty() {
            return Self::Baseline;
        }
        let applies = |name: &str| {
            variations
                .iter()
                .any(|fields| fields.iter().any(|field| field == name))
        };

        if applies(GIANT) {
            Self::Giant
        } else if ANIMAL_PERSON.iter().any(|name| applies(name)) {
            Self::AnimalPerson
        } else {
            Self::Miscellaneous
        }
    }
}

/// Creature records bucketed by variant kind, with links back to their base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantLinks {
    baseline: BTreeMap<String, RecordId>,
    giant: BTreeMap<String, RecordId>,
    animal_person: BTreeMap<String, RecordId>,
    giant_of: BTreeMap<String, String>,
    animal_person_of: BTreeMap<String, String>,
}

impl VariantLinks {
    /// Classifies every creature in the index and resolves variant bases.
    ///
    /// # Errors
    ///
    /// In strict mode, a variant without exactly one single-argument
    /// `COPY_TAGS_FROM` tag is an [`ErrorKind::BrokenRelationshipReference`]
    /// error. In permissive mode the variant is still bucketed but not linked
    /// to a base.
    pub(crate) fn resolve(index: &Index, diagnostics: &mut Diagnostics) -> Result<Self, Diagnostic> {
        let mut links = Self::default();
        let Some(creatures) = index.category(CREATURE) else {
            return Ok(links);
        };

        for (ident, id, record) in creatures.iter() {
            let kind = VariantKind::classify(record);
            let (bucket, reverse) = match kind {
                VariantKind::Baseline => {
                    tracing::debug!("creature {ident:?} applies no variations");
                    links.baseline.insert(ident.to_string(), id);
                    continue;
                }
                VariantKind::Miscellaneous => {
                    tracing::info!("misc variation {ident:?}");
                    continue;
                }
                VariantKind::Giant => (&mut links.giant, &mut links.giant_of),
                VariantKind::AnimalPerson => (&mut links.animal_person, &mut links.animal_person_of),
            };

            bucket.insert(ident.to_string(), id);
            if let Some(base) = base_of(record, ident, diagnostics)? {
                reverse.insert(base.to_string(), ident.to_string());
            }
        }

        Ok(links)
    }

    /// Creatures that apply no variation.
    #[must_use]
    pub const fn baseline(&self) -> &BTreeMap<String, RecordId> {
        &self.baseline
    }

    /// Giant variants, keyed by their own identifier.
    #[must_use]
    pub const fn giants(&self) -> &BTreeMap<String, RecordId> {
        &self.giant
    }

    /// Animal-person variants, keyed by their own identifier.
    #[must_use]
    pub const fn animal_people(&self) -> &BTreeMap<String, RecordId> {
        &self.animal_person
    }

    /// Base identifier → giant variant identifier.
    #[must_use]
    pub const fn giant_links(&self) -> &BTreeMap<String, String> {
        &self.giant_of
    }

    /// Base identifier → animal-person variant identifier.
    #[must_use]
    pub const fn animal_person_links(&self) -> &BTreeMap<String, String> {
        &self.animal_person_of
    }

    /// The giant variant of a base creature.
    #[must_use]
    pub fn giant_of(&self, base: &str) -> Option<&str> {
        self.giant_of.get(base).map(String::as_str)
    }

    /// The animal-person variant of a base creature.
    #[must_use]
    pub fn animal_person_of(&self, base: &str) -> Option<&str> {
        self.animal_person_of.get(base).map(String::as_str)
    }
}

/// The base identifier named by a variant's `COPY_TAGS_FROM` tag.
fn base_of<'a>(
    record: &'a Record,
    ident: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Option<&'a str>, Diagnostic> {
    let copies = record.tags_named(COPY_TAGS_FROM);
    if let [fields] = copies[..] {
        if let [_, base] = fields {
            return Ok(Some(base.as_str()));
        }
    }

    let shapes: Vec<String> = copies.iter().map(|fields| fields.join(":")).collect();
    diagnostics.report(
        ErrorKind::BrokenRelationshipReference,
        ident,
        format!("creature variation has invalid parent [{}]", shapes.join("] [")),
    )?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{diagnostics::Strictness, registry::Registry},
        storage::raw_file::RawFile,
        Namespace,
    };

    fn index(bytes: &[u8], strictness: Strictness) -> Result<Index, Diagnostic> {
        let mut builder = Index::builder(strictness);
        let raw = RawFile::parse(bytes, "creature_test.txt", builder.diagnostics_mut())?;
        let namespace = Namespace::new(raw, Registry::global(), builder.diagnostics_mut())?;
        builder.add(namespace)?;
        builder.finish()
    }

    const CREATURES: &[u8] = b"creature_test\n[OBJECT:CREATURE]\n\
        [CREATURE:DOG][NAME:dog:dogs:dog]\n\
        [CREATURE:GIANT_DOG][COPY_TAGS_FROM:DOG][APPLY_CREATURE_VARIATION:GIANT]\n\
        [CREATURE:DOG_MAN][COPY_TAGS_FROM:DOG][APPLY_CREATURE_VARIATION:ANIMAL_PERSON_LEGLESS]\n\
        [CREATURE:SPOTTED_DOG][COPY_TAGS_FROM:DOG][APPLY_CREATURE_VARIATION:SPOTTED]\n";

    #[test]
    fn links_variants_to_their_base() {
        let index = index(CREATURES, Strictness::Strict).unwrap();
        let links = index.variants();

        assert!(links.giants().contains_key("GIANT_DOG"));
        assert_eq!(links.giant_of("DOG"), Some("GIANT_DOG"));

        assert!(links.animal_people().contains_key("DOG_MAN"));
        assert_eq!(links.animal_person_of("DOG"), Some("DOG_MAN"));

        assert_eq!(links.baseline().keys().collect::<Vec<_>>(), ["DOG"]);
    }

    #[test]
    fn miscellaneous_variation_is_not_bucketed() {
        let index = index(CREATURES, Strictness::Strict).unwrap();
        let links = index.variants();

        let spotted = index.get(CREATURE, "SPOTTED_DOG").unwrap();
        assert_eq!(VariantKind::classify(spotted), VariantKind::Miscellaneous);
        assert!(!links.baseline().contains_key("SPOTTED_DOG"));
        assert!(!links.giants().contains_key("SPOTTED_DOG"));
        assert!(!links.animal_people().contains_key("SPOTTED_DOG"));
    }

    #[test]
    fn giant_takes_precedence() {
        let bytes = b"creature_test\n[OBJECT:CREATURE]\n\
            [CREATURE:ODD][COPY_TAGS_FROM:DOG][APPLY_CREATURE_VARIATION:ANIMAL_PERSON][APPLY_CREATURE_VARIATION:GIANT]\n";
        let index = index(bytes, Strictness::Strict).unwrap();

        assert!(index.variants().giants().contains_key("ODD"));
        assert!(index.variants().animal_people().is_empty());
    }

    #[test]
    fn variant_without_base() {
        let bytes = b"creature_test\n[OBJECT:CREATURE]\n\
            [CREATURE:GIANT_DOG][APPLY_CREATURE_VARIATION:GIANT]\n";

        let error = index(bytes, Strictness::Strict).unwrap_err();
        assert_eq!(error.kind, ErrorKind::BrokenRelationshipReference);

        let index = index(bytes, Strictness::Permissive).unwrap();
        assert!(index.variants().giants().contains_key("GIANT_DOG"));
        assert!(index.variants().giant_links().is_empty());
        assert_eq!(
            index.diagnostics()[0].kind,
            ErrorKind::BrokenRelationshipReference
        );
    }

    #[test]
    fn base_reference_with_extra_arguments() {
        let bytes = b"creature_test\n[OBJECT:CREATURE]\n\
            [CREATURE:GIANT_DOG][COPY_TAGS_FROM:DOG:CAT][APPLY_CREATURE_VARIATION:GIANT]\n";

        let error = index(bytes, Strictness::Strict).unwrap_err();
        assert_eq!(error.kind, ErrorKind::BrokenRelationshipReference);
    }
}
