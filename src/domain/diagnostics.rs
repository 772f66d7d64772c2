//! Validation outcomes shared by every stage of a scan.
//!
//! Each validation point produces a [`Check`]. The [`Strictness`] of the scan
//! decides whether a violated condition is a [`Check::Warning`] or a
//! [`Check::Fatal`], and [`Diagnostics::absorb`] either records the warning or
//! turns the fatal check into an error that aborts the scan.

use std::fmt;

/// The kinds of problem a scan can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// A file or directory does not exist.
    MissingInput,
    /// The `[OBJECT:<type>]` declaration is absent or ill-shaped.
    MalformedDeclaration,
    /// The header name disagrees with the file name or the declared type.
    NameMismatch,
    /// An identifier is registered twice in the same scope.
    DuplicateIdentifier,
    /// Two files declare the same namespace name.
    DuplicateNamespace,
    /// A record-starting token has zero or several identifying fields, or is
    /// not a starter for its type.
    InvalidRecordShape,
    /// The declared type is not one of the registered types.
    UnrecognizedType,
    /// A variant record does not name its base record correctly.
    BrokenRelationshipReference,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingInput => "missing input",
            Self::MalformedDeclaration => "malformed declaration",
            Self::NameMismatch => "name mismatch",
            Self::DuplicateIdentifier => "duplicate identifier",
            Self::DuplicateNamespace => "duplicate namespace",
            Self::InvalidRecordShape => "invalid record shape",
            Self::UnrecognizedType => "unrecognized type",
            Self::BrokenRelationshipReference => "broken relationship reference",
        };
        f.write_str(name)
    }
}

/// A detected problem and where it was found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} in {subject}: {detail}")]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: ErrorKind,
    /// The file, namespace or record the problem belongs to.
    pub subject: String,
    /// Human readable description.
    pub detail: String,
}

/// How violations are treated during a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Every violation aborts the scan.
    #[default]
    Strict,
    /// Violations are logged, the offending entity is marked invalid, and
    /// the scan continues.
    Permissive,
}

impl Strictness {
    /// Judges a violated condition.
    #[must_use]
    pub fn judge(
        self,
        kind: ErrorKind,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) -> Check {
        let diagnostic = Diagnostic {
            kind,
            subject: subject.into(),
            detail: detail.into(),
        };
        match self {
            Self::Strict => Check::Fatal(diagnostic),
            Self::Permissive => Check::Warning(diagnostic),
        }
    }

    /// Judges `condition`, producing [`Check::Ok`] when it holds.
    ///
    /// The detail message is only built when the condition fails.
    #[must_use]
    pub fn require<S, D>(self, condition: bool, kind: ErrorKind, subject: S, detail: D) -> Check
    where
        S: FnOnce() -> String,
        D: FnOnce() -> String,
    {
        if condition {
            Check::Ok
        } else {
            self.judge(kind, subject(), detail())
        }
    }
}

/// The outcome of one validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// The condition holds.
    Ok,
    /// The condition is violated but the scan may continue.
    Warning(Diagnostic),
    /// The condition is violated and the scan must stop.
    Fatal(Diagnostic),
}

/// Warnings collected while building an index.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    strictness: Strictness,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection for a scan with the given strictness.
    #[must_use]
    pub const fn new(strictness: Strictness) -> Self {
        Self {
            strictness,
            entries: Vec::new(),
        }
    }

    /// The strictness violations are judged with.
    #[must_use]
    pub const fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Judges a violated condition with this collection's strictness and
    /// absorbs the result.
    ///
    /// # Errors
    ///
    /// Returns the diagnostic in strict mode.
    pub fn report(
        &mut self,
        kind: ErrorKind,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) -> Result<(), Diagnostic> {
        let check = self.strictness.judge(kind, subject, detail);
        self.absorb(check).map(|_| ())
    }

    /// Absorbs the outcome of a validation.
    ///
    /// Returns `Ok(true)` if the check passed and `Ok(false)` if a warning was
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns the diagnostic of a [`Check::Fatal`].
    pub fn absorb(&mut self, check: Check) -> Result<bool, Diagnostic> {
        match check {
            Check::Ok => Ok(true),
            Check::Warning(diagnostic) => {
                tracing::warn!("{diagnostic}");
                self.entries.push(diagnostic);
                Ok(false)
            }
            Check::Fatal(diagnostic) => Err(diagnostic),
        }
    }

    /// The recorded warnings, in the order they were found.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Consumes the collection, returning the recorded warnings.
    #[must_use]
    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// Returns `true` if no warnings were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_judgement_is_fatal() {
        let check = Strictness::Strict.judge(ErrorKind::NameMismatch, "a.txt", "bad");
        assert!(matches!(check, Check::Fatal(ref d) if d.kind == ErrorKind::NameMismatch));

        let mut diagnostics = Diagnostics::new(Strictness::Strict);
        let error = diagnostics.absorb(check).unwrap_err();
        assert_eq!(error.to_string(), "name mismatch in a.txt: bad");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn permissive_judgement_is_recorded() {
        let mut diagnostics = Diagnostics::new(Strictness::Permissive);
        diagnostics
            .report(ErrorKind::DuplicateIdentifier, "creature_a", "DOG")
            .unwrap();

        assert_eq!(diagnostics.entries().len(), 1);
        assert_eq!(diagnostics.entries()[0].detail, "DOG");
    }

    #[test]
    fn passing_requirement_records_nothing() {
        let mut diagnostics = Diagnostics::new(Strictness::Strict);
        let check = Strictness::Strict.require(
            true,
            ErrorKind::MissingInput,
            || unreachable!(),
            || unreachable!(),
        );
        assert_eq!(diagnostics.absorb(check), Ok(true));
        assert!(diagnostics.is_empty());
    }
}
