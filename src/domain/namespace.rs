//! The records of one raw file.

use std::{
    collections::{BTreeSet, HashMap},
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    domain::{
        diagnostics::{Diagnostic, Diagnostics, ErrorKind},
        record::Record,
        registry::Registry,
    },
    storage::{
        codec::{self, Context, ParsedRaw},
        cp437::EncodeError,
        raw_file::{RawFile, RAW_EXTENSION},
    },
};

/// One raw file, partitioned into records.
///
/// The namespace owns its records. Records are addressed by their slot (their
/// position in the file) or by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    source: Option<PathBuf>,
    name: String,
    header: String,
    declaration: Context,
    trailing: String,
    object_type: String,
    valid: bool,
    subtypes: BTreeSet<String>,
    umbrella: bool,
    records: Vec<Record>,
    identifiers: HashMap<String, usize>,
    invalid: Vec<usize>,
}

impl Namespace {
    /// Builds a namespace from a parsed raw file.
    ///
    /// # Errors
    ///
    /// In strict mode, fails on an unrecognized type, a name that does not
    /// start with the type's prefix, a malformed or misplaced record-starting
    /// token, or a duplicate identifier.
    pub fn new(
        raw: RawFile,
        registry: &Registry,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, Diagnostic> {
        let (source, name, object_type, valid, parsed) = raw.into_parts();
        let ParsedRaw {
            header,
            declaration,
            contexts,
        } = parsed;

        let (subtypes, umbrella) = match registry.get(&object_type) {
            Some(raw_type) => {
                if !name.starts_with(raw_type.prefix()) {
                    diagnostics.report(
                        ErrorKind::NameMismatch,
                        &name,
                        format!(
                            "namespace does not start with type {:?}",
                            raw_type.prefix()
                        ),
                    )?;
                }
                (raw_type.subtypes().clone(), raw_type.is_umbrella())
            }
            None => {
                diagnostics.report(
                    ErrorKind::UnrecognizedType,
                    &name,
                    format!("unrecognized raw object type {object_type:?}"),
                )?;
                (BTreeSet::new(), false)
            }
        };

        // A file with no tokens after its declaration has no records, only
        // the text that follows the declaration.
        let (contexts, trailing) = if contexts.iter().all(|context| context.token.is_none()) {
            let trailing: String = contexts.into_iter().map(|context| context.comment).collect();
            (Vec::new(), trailing)
        } else {
            (contexts, String::new())
        };

        let records: Vec<Record> = partition(contexts, &subtypes)
            .into_iter()
            .enumerate()
            .map(|(slot, run)| Record::new(slot, run))
            .collect();

        let mut namespace = Self {
            source,
            name,
            header,
            declaration,
            trailing,
            object_type,
            valid,
            subtypes,
            umbrella,
            records,
            identifiers: HashMap::new(),
            invalid: Vec::new(),
        };
        namespace.reindex(diagnostics)?;
        Ok(namespace)
    }

    /// Rebuilds the identifier map after records have been edited.
    ///
    /// A record is invalid if its identity token is not a record starter for
    /// this type, its identifier is empty, or an earlier record already uses
    /// its identifier. Invalid records stay in the namespace but are left out
    /// of the identifier map. A record whose identity token carries more than
    /// one identifier is reported but still indexed under the first.
    ///
    /// # Errors
    ///
    /// In strict mode, returns the first invalid record found.
    pub fn reindex(&mut self, diagnostics: &mut Diagnostics) -> Result<(), Diagnostic> {
        self.identifiers.clear();
        self.invalid.clear();

        for record in &self.records {
            let ident = record.identifier();
            if !self.subtypes.contains(record.subtype()) {
                diagnostics.report(
                    ErrorKind::InvalidRecordShape,
                    &self.name,
                    format!(
                        "unrecognized subtype {:?} for ident {ident:?}",
                        record.subtype()
                    ),
                )?;
            } else if ident.is_empty() {
                diagnostics.report(
                    ErrorKind::InvalidRecordShape,
                    &self.name,
                    format!("no identifier in token {}", head_text(record)),
                )?;
            } else if self.identifiers.contains_key(ident) {
                diagnostics.report(
                    ErrorKind::DuplicateIdentifier,
                    &self.name,
                    format!("duplicate ident {ident:?}"),
                )?;
            } else {
                if record.identifying_fields().len() > 1 {
                    diagnostics.report(
                        ErrorKind::InvalidRecordShape,
                        &self.name,
                        format!("multiple identifiers in token {}", head_text(record)),
                    )?;
                }
                self.identifiers.insert(ident.to_string(), record.slot());
                continue;
            }
            self.invalid.push(record.slot());
        }
        Ok(())
    }

    /// The header name, e.g. `creature_domestic`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type, e.g. `CREATURE`.
    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Whether the file's header and declaration were well formed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// The token names that start a record in this namespace.
    #[must_use]
    pub const fn subtypes(&self) -> &BTreeSet<String> {
        &self.subtypes
    }

    /// Whether records are also indexed under the type name.
    #[must_use]
    pub const fn is_umbrella(&self) -> bool {
        self.umbrella
    }

    /// The file this namespace was read from.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// All records, valid or not, in file order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The record at `slot`.
    #[must_use]
    pub fn record(&self, slot: usize) -> Option<&Record> {
        self.records.get(slot)
    }

    /// Mutable access to the record at `slot`.
    ///
    /// Call [`Namespace::reindex`] after changing identifiers.
    pub fn record_mut(&mut self, slot: usize) -> Option<&mut Record> {
        self.records.get_mut(slot)
    }

    /// The first valid record with the given identifier.
    #[must_use]
    pub fn get(&self, ident: &str) -> Option<&Record> {
        self.identifiers
            .get(ident)
            .and_then(|&slot| self.records.get(slot))
    }

    /// Returns `true` if a valid record has the given identifier.
    #[must_use]
    pub fn contains(&self, ident: &str) -> bool {
        self.identifiers.contains_key(ident)
    }

    /// Slots of the records that failed validation.
    #[must_use]
    pub fn invalid(&self) -> &[usize] {
        &self.invalid
    }

    /// Iterates over the valid records.
    pub fn valid_records(&self) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(|record| self.identifiers.get(record.identifier()) == Some(&record.slot()))
    }

    /// The number of records, valid or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the namespace has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializes the namespace back to raw file bytes.
    ///
    /// An unmodified namespace reproduces the file it was read from, with
    /// line endings normalised to CRLF.
    ///
    /// # Errors
    ///
    /// Returns an error if an edited record contains a character outside
    /// code page 437.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut text = self.header.clone();
        self.declaration.write_to(&mut text);
        for record in &self.records {
            record.write_to(&mut text);
        }
        text.push_str(&self.trailing);
        codec::encode(&text)
    }

    /// The file name this namespace is written to.
    ///
    /// This is the namespace name with the raw extension, or the source file
    /// name when the header name is blank.
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        if self.name.is_empty() {
            self.source
                .as_deref()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
        } else {
            Some(format!("{}.{RAW_EXTENSION}", self.name))
        }
    }

    /// Writes the namespace into `dir`, returning the path written.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace has no usable file name, cannot be
    /// encoded, or the file cannot be written.
    pub fn write_into(&self, dir: &Path) -> io::Result<PathBuf> {
        let file_name = self.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "namespace has no file name")
        })?;
        let bytes = self
            .to_bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let path = dir.join(file_name);
        fs::write(&path, bytes)?;
        tracing::debug!(
            "wrote {}, [OBJECT:{}], {} records",
            path.display(),
            self.object_type,
            self.records.len()
        );
        Ok(path)
    }
}

fn head_text(record: &Record) -> String {
    record
        .head()
        .token
        .as_ref()
        .map_or_else(String::new, ToString::to_string)
}

/// Splits a token stream into runs that each start at a record starter.
///
/// The first run may begin with tokens that are not starters; it is kept so
/// that nothing is lost and is later classified invalid.
fn partition(contexts: Vec<Context>, starters: &BTreeSet<String>) -> Vec<Vec<Context>> {
    let mut runs: Vec<Vec<Context>> = Vec::new();
    let mut current = Vec::new();
    for context in contexts {
        if !current.is_empty() && starters.contains(context.token_name()) {
            runs.push(std::mem::take(&mut current));
        }
        current.push(context);
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}
