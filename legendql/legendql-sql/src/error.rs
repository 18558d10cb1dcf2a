use std::fmt::Debug;

use serde::Serialize;

/// Kind of a LegendQL error. The set is closed: every failure raised while
/// building frames or emitting SQL / PURE falls in one of these buckets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr, strum::EnumIter,
)]
pub enum ErrorKind {
    /// Operator or function applied to a wrong-typed primitive.
    TypeMismatch,
    /// Row indexed by a name absent from the frame.
    UnknownColumn,
    /// A frame would end up with the same column name twice.
    DuplicateColumn,
    /// Mismatched counts between paired arguments.
    ArityMismatch,
    /// Any other frame construction invariant.
    Validation,
    /// Dialect registry lookup found zero or several providers.
    UnknownDialect,
    /// The target emitter can't express the construct.
    Unsupported,
    /// Something that should never happen did.
    Internal,
}

/// A LegendQL error.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub reason: String,
    pub hints: Vec<String>,
}

impl Error {
    pub fn new<S: ToString>(kind: ErrorKind, reason: S) -> Self {
        Error {
            kind,
            reason: reason.to_string(),
            hints: Vec::new(),
        }
    }

    pub fn type_mismatch<S: ToString>(reason: S) -> Self {
        Error::new(ErrorKind::TypeMismatch, reason)
    }

    pub fn unknown_column<S: ToString>(reason: S) -> Self {
        Error::new(ErrorKind::UnknownColumn, reason)
    }

    pub fn duplicate_column<S: ToString>(reason: S) -> Self {
        Error::new(ErrorKind::DuplicateColumn, reason)
    }

    pub fn arity_mismatch<S: ToString>(reason: S) -> Self {
        Error::new(ErrorKind::ArityMismatch, reason)
    }

    pub fn validation<S: ToString>(reason: S) -> Self {
        Error::new(ErrorKind::Validation, reason)
    }

    pub fn unknown_dialect<S: ToString>(reason: S) -> Self {
        Error::new(ErrorKind::UnknownDialect, reason)
    }

    pub fn unsupported<S: ToString>(reason: S) -> Self {
        Error::new(ErrorKind::Unsupported, reason)
    }

    /// Used for things that you *think* should never happen, but are not sure.
    pub fn new_assert<S: ToString>(details: S) -> Self {
        Error::new(
            ErrorKind::Internal,
            format!("internal error; {}", details.to_string()),
        )
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)?;
        for hint in &self.hints {
            write!(f, "\n↳ Hint: {hint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

pub trait WithErrorInfo: Sized {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self;

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self;
}

impl WithErrorInfo for Error {
    fn push_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.hints.push(hint.into());
        self
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(mut self, hints: I) -> Self {
        self.hints = hints.into_iter().map(|x| x.into()).collect();
        self
    }
}

impl<T, E: WithErrorInfo> WithErrorInfo for Result<T, E> {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self {
        self.map_err(|e| e.push_hint(hint))
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self {
        self.map_err(|e| e.with_hints(hints))
    }
}
