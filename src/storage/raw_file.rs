//! Reading a single raw file from disk and validating its header.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    domain::diagnostics::{Diagnostic, Diagnostics, ErrorKind},
    storage::codec::{self, Context, ParsedRaw},
};

/// The file extension raw files are expected to carry.
pub const RAW_EXTENSION: &str = "txt";

/// Errors that can occur when loading a raw file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The raw file was not found.
    #[error("no raw file {}", .0.display())]
    NotFound(PathBuf),
    /// An I/O error occurred.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// The file violates a validation rule in strict mode.
    #[error(transparent)]
    Invalid(#[from] Diagnostic),
}

/// A parsed raw file whose header and declaration have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    source: Option<PathBuf>,
    name: String,
    object_type: String,
    valid: bool,
    raw: ParsedRaw,
}

impl RawFile {
    /// Reads and validates the raw file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read, or, in
    /// strict mode, if its header or declaration is invalid.
    pub fn read(path: &Path, diagnostics: &mut Diagnostics) -> Result<Self, LoadError> {
        if !path.is_file() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut raw_file = Self::parse(&bytes, &file_name, diagnostics)?;
        raw_file.source = Some(path.to_path_buf());
        tracing::debug!(
            "read {file_name}, [OBJECT:{}], {} tokens",
            raw_file.object_type,
            raw_file.raw.contexts.len()
        );
        Ok(raw_file)
    }

    /// Parses and validates raw file content.
    ///
    /// `file_name` is the name the content was read from; the header name
    /// must match its stem.
    ///
    /// # Errors
    ///
    /// In strict mode, returns the first [`ErrorKind::NameMismatch`] or
    /// [`ErrorKind::MalformedDeclaration`] found.
    pub fn parse(
        bytes: &[u8],
        file_name: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, Diagnostic> {
        let raw = codec::parse(bytes);
        let name = raw.header.trim().to_string();
        let strictness = diagnostics.strictness();

        let path = Path::new(file_name);
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");

        diagnostics.absorb(strictness.require(
            extension == RAW_EXTENSION,
            ErrorKind::NameMismatch,
            || file_name.to_string(),
            || format!("raw file does not have .{RAW_EXTENSION} extension"),
        ))?;
        diagnostics.absorb(strictness.require(
            name.split_whitespace().count() == 1,
            ErrorKind::NameMismatch,
            || file_name.to_string(),
            || format!("whitespace in raw name {name:?}"),
        ))?;
        diagnostics.absorb(strictness.require(
            name == stem,
            ErrorKind::NameMismatch,
            || file_name.to_string(),
            || format!("raw name {name:?} does not agree with filename {stem:?}"),
        ))?;

        let valid = raw.declaration_is_valid();
        let object_type = raw
            .declaration
            .token
            .as_ref()
            .and_then(|token| token.args().first().cloned())
            .unwrap_or_default();

        if !valid {
            let token = raw
                .declaration
                .token
                .as_ref()
                .map_or_else(String::new, ToString::to_string);
            let detail = match raw.declaration.token.as_ref() {
                Some(decl) if decl.name() == "OBJECT" && decl.args().is_empty() => {
                    format!("object token {token:?} does not have a type")
                }
                Some(decl) if decl.name() == "OBJECT" && decl.args().len() > 1 => {
                    format!("object token {token:?} has more than one argument")
                }
                _ => format!("name or object token {token:?} is invalid"),
            };
            diagnostics.report(ErrorKind::MalformedDeclaration, file_name, detail)?;
        }

        Ok(Self {
            source: None,
            name,
            object_type,
            valid,
            raw,
        })
    }

    /// The path the file was read from, if it came from disk.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The header name with surrounding whitespace removed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type, e.g. `CREATURE`, or `""` if there is none.
    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Whether the header and `[OBJECT:<type>]` declaration are well formed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// The token stream after the declaration.
    #[must_use]
    pub fn contexts(&self) -> &[Context] {
        &self.raw.contexts
    }

    /// The underlying parse.
    #[must_use]
    pub const fn parsed(&self) -> &ParsedRaw {
        &self.raw
    }

    /// Splits the file into its header, declaration, and token stream.
    pub(crate) fn into_parts(self) -> (Option<PathBuf>, String, String, bool, ParsedRaw) {
        (self.source, self.name, self.object_type, self.valid, self.raw)
    }
}
