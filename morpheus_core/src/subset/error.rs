//! Errors reported by the subset matcher.

use std::fmt::Display;

use thiserror::Error;

/// Why a candidate value is not contained in its reference.
#[derive(Debug, Error)]
pub enum SubsetError {
    /// A key, field, element or scalar of the candidate has no match.
    #[error("not a subset: {reason} at {path}")]
    NotASubset {
        /// Where the failing node sits in the candidate.
        path: ValuePath,
        /// What failed at that node.
        reason: Mismatch,
    },
    /// Traversal faulted and was stopped at the entry point.
    #[error("recovered from panic: {message}")]
    RecoveredFromPanic {
        /// The fault's message, if one could be extracted.
        message: String,
    },
}

/// The stable category of a [`SubsetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Structural mismatch.
    NotASubset,
    /// Internal fault.
    RecoveredFromPanic,
}

impl ErrorKind {
    /// The kind string callers may match on.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotASubset => "not a subset",
            ErrorKind::RecoveredFromPanic => "recovered from panic",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SubsetError {
    /// The error's stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubsetError::NotASubset { .. } => ErrorKind::NotASubset,
            SubsetError::RecoveredFromPanic { .. } => ErrorKind::RecoveredFromPanic,
        }
    }

    /// Whether this is a structural mismatch (as opposed to a fault).
    pub fn is_mismatch(&self) -> bool {
        self.kind() == ErrorKind::NotASubset
    }
}

/// The specific way a node failed to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// A map key of the candidate is absent from the reference.
    MissingKey(String),
    /// Both sides are structs, but with different field lists.
    StructFields {
        /// Field names of the reference, in declaration order
        expected: Vec<String>,
        /// Field names of the candidate, in declaration order
        found: Vec<String>,
    },
    /// No unused reference element matches this candidate element.
    NoMatchingElement,
    /// Both sides are scalars of the same kind with different values.
    UnequalScalar {
        /// The reference value
        expected: String,
        /// The candidate value
        found: String,
    },
    /// The two sides have different shapes.
    Shape {
        /// Shape of the reference
        expected: &'static str,
        /// Shape of the candidate
        found: &'static str,
    },
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mismatch::MissingKey(key) => write!(f, "key `{key}` is missing"),
            Mismatch::StructFields { expected, found } => write!(
                f,
                "expected a struct with fields [{}], found fields [{}]",
                expected.join(", "),
                found.join(", ")
            ),
            Mismatch::NoMatchingElement => write!(f, "no unused element matches"),
            Mismatch::UnequalScalar { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Mismatch::Shape { expected, found } => {
                write!(f, "expected a {expected}, found a {found}")
            }
        }
    }
}

/// One step into a value tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A struct field or map key
    Key(String),
    /// A position in a sequence
    Index(usize),
}

/// Location of a node, rendered like `$.featurePermissions[1].access`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuePath(pub Vec<PathSegment>);

impl ValuePath {
    pub(super) fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub(super) fn pop(&mut self) {
        self.0.pop();
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl Display for ValuePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}
