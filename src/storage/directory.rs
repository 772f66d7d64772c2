//! A filesystem backed directory of raw files
//!
//! The [`Directory`] reads every raw file under a root into an [`Index`] and
//! writes indexes back out. It is a wrapper around the filesystem agnostic
//! [`Index`].

use std::{
    ffi::OsStr,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use nonempty::NonEmpty;
use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::{
        diagnostics::{Diagnostic, ErrorKind},
        Config, Index, Namespace, Registry,
    },
    storage::raw_file::{LoadError, RawFile, RAW_EXTENSION},
};

/// A directory that has been scanned into an index.
#[derive(Debug)]
pub struct Scanned {
    index: Index,
}

/// A directory that has not been scanned yet.
#[derive(Debug, PartialEq, Eq)]
pub struct Unscanned;

/// A directory of raw files.
#[derive(Debug)]
pub struct Directory<S> {
    /// The directory the raw files are stored in.
    root: PathBuf,
    state: S,
}

impl<S> Directory<S> {
    /// The directory the raw files are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The raw files directly under the root, in scan order.
    ///
    /// Subdirectories and files without the raw extension are skipped.
    #[must_use]
    pub fn raw_files(&self, config: &Config) -> Vec<PathBuf> {
        collect_raw_paths(&self.root, config.sort_files)
    }
}

impl Directory<Unscanned> {
    /// Opens a directory at the given path.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self {
            root,
            state: Unscanned,
        }
    }

    /// Reads every raw file in the directory and builds the index.
    ///
    /// Files are read in file name order when [`Config::sort_files`] is set,
    /// otherwise in directory listing order. Subdirectories are not scanned.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a file cannot be read. In strict
    /// mode, the first validation failure aborts the scan and no index is
    /// returned.
    #[instrument(level = "debug", skip(self, config, registry), fields(root = %self.root.display()))]
    pub fn scan(self, config: &Config, registry: &Registry) -> Result<Directory<Scanned>, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::MissingInput(self.root));
        }

        let mut builder = Index::builder(config.strictness());
        for path in self.raw_files(config) {
            tracing::debug!("processing raw file {}", path.display());
            let raw = RawFile::read(&path, builder.diagnostics_mut())?;
            let namespace = Namespace::new(raw, registry, builder.diagnostics_mut())?;
            builder.add(namespace)?;
        }
        let index = builder.finish()?;

        tracing::info!("created index of raws at {}", self.root.display());

        Ok(Directory {
            root: self.root,
            state: Scanned { index },
        })
    }
}

fn collect_raw_paths(root: &Path, sort: bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(root).min_depth(1).max_depth(1);
    let walker = if sort {
        walker.sort_by_file_name()
    } else {
        walker
    };
    walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension() == Some(OsStr::new(RAW_EXTENSION)))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

impl Directory<Scanned> {
    /// The index built by the scan.
    #[must_use]
    pub const fn index(&self) -> &Index {
        &self.state.index
    }

    /// Mutable access to the index, for repair passes.
    pub const fn index_mut(&mut self) -> &mut Index {
        &mut self.state.index
    }

    /// Consumes the directory, returning the index.
    #[must_use]
    pub fn into_index(self) -> Index {
        self.state.index
    }

    /// Writes every namespace to its own file under `out`.
    ///
    /// `out` is created if it does not exist. An existing directory must be
    /// empty; the index is never merged into existing files.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` is not an empty directory or cannot be
    /// created. Failures to write individual namespaces do not stop the
    /// others from being written and are reported together.
    #[instrument(level = "debug", skip(self))]
    pub fn write_to(&self, out: &Path) -> Result<Vec<PathBuf>, WriteError> {
        if out.exists() {
            let mut entries = fs::read_dir(out).map_err(|source| WriteError::Io {
                path: out.to_path_buf(),
                source,
            })?;
            if entries.next().is_some() {
                tracing::error!(
                    "output directory {} is not empty, aborting",
                    out.display()
                );
                return Err(WriteError::NotEmpty(out.to_path_buf()));
            }
        } else {
            fs::create_dir_all(out).map_err(|source| WriteError::Io {
                path: out.to_path_buf(),
                source,
            })?;
        }

        let mut written = Vec::new();
        let mut failures = Vec::new();
        for namespace in self.index().namespaces() {
            match namespace.write_into(out) {
                Ok(path) => written.push(path),
                Err(e) => {
                    let name = namespace
                        .file_name()
                        .unwrap_or_else(|| namespace.name().to_string());
                    failures.push((out.join(name), e));
                }
            }
        }

        match NonEmpty::from_vec(failures) {
            Some(failures) => Err(WriteFailures { failures }.into()),
            None => {
                tracing::info!("wrote {} raw files to {}", written.len(), out.display());
                Ok(written)
            }
        }
    }
}

/// Errors that can occur when scanning a directory.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The root directory does not exist.
    #[error("no raw directory {}", .0.display())]
    MissingInput(PathBuf),
    /// A raw file could not be read.
    #[error(transparent)]
    Load(LoadError),
    /// A validation rule failed in strict mode.
    #[error(transparent)]
    Violation(#[from] Diagnostic),
}

impl From<LoadError> for ScanError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::Invalid(diagnostic) => Self::Violation(diagnostic),
            error => Self::Load(error),
        }
    }
}

impl ScanError {
    /// The validation kind of the error, if it has one.
    ///
    /// A missing directory or file is [`ErrorKind::MissingInput`]; other I/O
    /// failures have no kind.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::MissingInput(_) | Self::Load(LoadError::NotFound(_)) => {
                Some(ErrorKind::MissingInput)
            }
            Self::Load(LoadError::Invalid(diagnostic)) | Self::Violation(diagnostic) => {
                Some(diagnostic.kind)
            }
            Self::Load(LoadError::Io { .. }) => None,
        }
    }
}

/// Errors that can occur when writing an index to a directory.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The output directory already contains files.
    #[error("output directory {} is not empty", .0.display())]
    NotEmpty(PathBuf),
    /// The output directory could not be inspected or created.
    #[error("failed to prepare {}: {source}", .path.display())]
    Io {
        /// The output directory.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// Some namespaces could not be written.
    #[error(transparent)]
    Failures(#[from] WriteFailures),
}

/// The namespaces that could not be written.
#[derive(Debug, thiserror::Error)]
pub struct WriteFailures {
    failures: NonEmpty<(PathBuf, io::Error)>,
}

impl WriteFailures {
    /// The paths that failed, with the error for each.
    #[must_use]
    pub const fn failures(&self) -> &NonEmpty<(PathBuf, io::Error)> {
        &self.failures
    }
}

impl fmt::Display for WriteFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        write!(f, "failed to write raw files: ")?;

        let total = self.failures.len();

        let displayed_paths: Vec<String> = self
            .failures
            .iter()
            .take(MAX_DISPLAY)
            .map(|(p, _e)| p.display().to_string())
            .collect();

        let msg = displayed_paths.join(", ");

        if total <= MAX_DISPLAY {
            write!(f, "{msg}")
        } else {
            write!(f, "{msg}... (and {} more)", total - MAX_DISPLAY)
        }
    }
}
