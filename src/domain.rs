//! Domain models for raw file indexing.
//!
//! This module contains the core domain types including tokens, records,
//! namespaces, the cross-referenced index, and configuration.

pub mod token;
pub use token::Token;

pub mod diagnostics;
pub use diagnostics::{Check, Diagnostic, Diagnostics, ErrorKind, Strictness};

pub mod registry;
pub use registry::{RawType, Registry};

pub mod record;
pub use record::{Record, Tag};

pub mod namespace;
pub use namespace::Namespace;

pub mod index;
pub use index::{Category, Index, IndexBuilder, RecordId};

pub mod variant;
pub use variant::{VariantKind, VariantLinks};

mod config;
pub use config::{Config, CONFIG_FILE};
