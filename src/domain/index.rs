//! The corpus-wide index over every namespace of a raw directory.
//!
//! The [`Index`] knows nothing about the filesystem. It owns the namespaces
//! (which own their records) and maps each category to identifier →
//! [`RecordId`] handles, so lookups never need shared ownership of records.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{
    diagnostics::{Diagnostic, Diagnostics, ErrorKind, Strictness},
    namespace::Namespace,
    record::Record,
    variant::VariantLinks,
};

/// A non-owning handle to a record: its namespace position and its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    /// Position of the owning namespace in [`Index::namespaces`].
    pub namespace: usize,
    /// Position of the record in [`Namespace::records`].
    pub slot: usize,
}

/// An index of every record under a raw directory.
#[derive(Debug, Clone, Default)]
pub struct Index {
    namespaces: Vec<Namespace>,
    by_name: HashMap<String, usize>,
    master: BTreeMap<String, BTreeMap<String, RecordId>>,
    variants: VariantLinks,
    diagnostics: Vec<Diagnostic>,
}

/// Builds an [`Index`] one namespace at a time.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: Index,
    diagnostics: Diagnostics,
}

impl Index {
    /// Starts building an index.
    #[must_use]
    pub fn builder(strictness: Strictness) -> IndexBuilder {
        IndexBuilder {
            index: Self::default(),
            diagnostics: Diagnostics::new(strictness),
        }
    }

    /// Builds an index from namespaces that were already parsed, for example
    /// after a repair pass has rewritten identifiers.
    ///
    /// # Errors
    ///
    /// In strict mode, fails on the first duplicate namespace, duplicate
    /// identifier, or broken variant reference.
    pub fn from_namespaces(
        namespaces: impl IntoIterator<Item = Namespace>,
        strictness: Strictness,
    ) -> Result<Self, Diagnostic> {
        let mut builder = Self::builder(strictness);
        for namespace in namespaces {
            builder.add(namespace)?;
        }
        builder.finish()
    }

    /// Namespaces in the order they were added.
    #[must_use]
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Looks up a namespace by name.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.by_name.get(name).map(|&pos| &self.namespaces[pos])
    }

    /// Mutable access to a namespace by name.
    ///
    /// Edits are not reflected in the category maps until the index is
    /// rebuilt with [`Index::from_namespaces`].
    pub fn namespace_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        let pos = *self.by_name.get(name)?;
        self.namespaces.get_mut(pos)
    }

    /// Consumes the index, returning its namespaces.
    #[must_use]
    pub fn into_namespaces(self) -> Vec<Namespace> {
        self.namespaces
    }

    /// Iterates over every record of every namespace, valid or not.
    pub fn records(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.namespaces
            .iter()
            .enumerate()
            .flat_map(|(namespace, ns)| {
                ns.records()
                    .iter()
                    .map(move |record| (RecordId { namespace, slot: record.slot() }, record))
            })
    }

    /// Resolves a record handle.
    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.namespaces.get(id.namespace)?.record(id.slot)
    }

    /// Resolves a record handle for in-place edits.
    pub fn record_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.namespaces.get_mut(id.namespace)?.record_mut(id.slot)
    }

    /// The namespace owning a record.
    #[must_use]
    pub fn namespace_of(&self, id: RecordId) -> Option<&Namespace> {
        self.namespaces.get(id.namespace)
    }

    /// Category keys: every subtype seen, plus umbrella type names.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.master.keys().map(String::as_str)
    }

    /// The records of one category, e.g. `CREATURE`, `ITEM_WEAPON` or `ITEM`.
    #[must_use]
    pub fn category(&self, key: &str) -> Option<Category<'_>> {
        self.master.get(key).map(|entries| Category {
            index: self,
            entries,
        })
    }

    /// Looks up a record by category and identifier.
    #[must_use]
    pub fn get(&self, category: &str, ident: &str) -> Option<&Record> {
        self.category(category)?.get(ident)
    }

    /// Creature variant buckets and links.
    #[must_use]
    pub const fn variants(&self) -> &VariantLinks {
        &self.variants
    }

    /// Warnings recorded while building the index in permissive mode.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The number of records across all namespaces, valid or not.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.namespaces.iter().map(Namespace::len).sum()
    }

    /// The number of records that failed validation.
    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.invalid().len()).sum()
    }

    fn register(
        &mut self,
        key: &str,
        ident: &str,
        id: RecordId,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Diagnostic> {
        let entries = self.master.entry(key.to_string()).or_default();
        if entries.contains_key(ident) {
            diagnostics.report(
                ErrorKind::DuplicateIdentifier,
                self.namespaces[id.namespace].name(),
                format!("duplicate ident {ident:?} for {key}, ignoring"),
            )?;
        } else {
            entries.insert(ident.to_string(), id);
        }
        Ok(())
    }
}

impl IndexBuilder {
    /// The diagnostics shared by every stage of the build.
    ///
    /// Parse raw files and build namespaces with these so that all warnings
    /// end up in the finished index.
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Adds a namespace and registers its valid records.
    ///
    /// # Errors
    ///
    /// In strict mode, fails if the namespace name is already taken or a
    /// record identifier is already registered in its category. In permissive
    /// mode a duplicate namespace is dropped and a duplicate record is left
    /// out of the category, keeping the first registration.
    pub fn add(&mut self, namespace: Namespace) -> Result<(), Diagnostic> {
        let name = namespace.name().to_string();
        if self.index.by_name.contains_key(&name) {
            return self.diagnostics.report(
                ErrorKind::DuplicateNamespace,
                &name,
                "duplicate namespace, ignoring",
            );
        }

        let position = self.index.namespaces.len();
        let umbrella = namespace
            .is_umbrella()
            .then(|| namespace.object_type().to_string());
        let entries: Vec<(String, String, RecordId)> = namespace
            .valid_records()
            .map(|record| {
                (
                    record.subtype().to_string(),
                    record.identifier().to_string(),
                    RecordId {
                        namespace: position,
                        slot: record.slot(),
                    },
                )
            })
            .collect();

        self.index.by_name.insert(name, position);
        self.index.namespaces.push(namespace);

        for (subtype, ident, id) in entries {
            self.index
                .register(&subtype, &ident, id, &mut self.diagnostics)?;
            if let Some(umbrella) = &umbrella {
                self.index
                    .register(umbrella, &ident, id, &mut self.diagnostics)?;
            }
        }
        Ok(())
    }

    /// Resolves creature variants and returns the finished index.
    ///
    /// # Errors
    ///
    /// In strict mode, fails on the first broken variant reference.
    pub fn finish(mut self) -> Result<Index, Diagnostic> {
        self.index.variants = VariantLinks::resolve(&self.index, &mut self.diagnostics)?;
        self.index.diagnostics = self.diagnostics.into_entries();

        tracing::info!(
            "indexed {} namespaces, {} categories, {} records",
            self.index.namespaces.len(),
            self.index.master.len(),
            self.index.record_count()
        );
        Ok(self.index)
    }
}

/// A view of the records in one category, keyed by identifier.
#[derive(Debug, Clone, Copy)]
pub struct Category<'a> {
    index: &'a Index,
    entries: &'a BTreeMap<String, RecordId>,
}

impl<'a> Category<'a> {
    /// Looks up a record by identifier.
    #[must_use]
    pub fn get(&self, ident: &str) -> Option<&'a Record> {
        self.index.record(*self.entries.get(ident)?)
    }

    /// The handle of the record with the given identifier.
    #[must_use]
    pub fn id(&self, ident: &str) -> Option<RecordId> {
        self.entries.get(ident).copied()
    }

    /// Returns `true` if the category has a record with this identifier.
    #[must_use]
    pub fn contains(&self, ident: &str) -> bool {
        self.entries.contains_key(ident)
    }

    /// Identifiers in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        let entries = self.entries;
        entries.keys().map(String::as_str)
    }

    /// Iterates over `(identifier, handle, record)` in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, RecordId, &'a Record)> + use<'a> {
        let (index, entries) = (self.index, self.entries);
        entries.iter().filter_map(move |(ident, &id)| {
            index.record(id).map(|record| (ident.as_str(), id, record))
        })
    }

    /// The number of records in the category.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the category is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
