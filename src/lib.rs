//! Parsing, round-trip writing and indexing of Dwarf Fortress raw files
//!
//! Raw files are CP437 text files of bracketed tokens. A directory of them is
//! scanned into an [`Index`] of every record, keyed by type and identifier.

pub mod domain;
pub use domain::{
    Config, Diagnostic, ErrorKind, Index, Namespace, Record, RecordId, Registry, Strictness,
    Token, VariantKind, VariantLinks,
};

/// Filesystem storage: the raw file codec and directory scanning.
pub mod storage;
pub use storage::{Directory, RawFile};
