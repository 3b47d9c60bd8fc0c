//! Error taxonomy for resolution and materialization.

use std::path::PathBuf;

/// Classified resolution failures.
///
/// Values travel inside `anyhow::Error` across function boundaries and are
/// recovered with `downcast_ref::<ResolveError>()`. Global error lists keep
/// them as plain values so reports can tell the kinds apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Package or file absent in the tier it was looked up in.
    NotFound { name: String, expected: PathBuf },
    /// Descriptor file missing or not valid JSON.
    InvalidDescriptor {
        name: String,
        path: PathBuf,
        reason: String,
    },
    /// A name reappeared while it was still being resolved. `cycle` lists the
    /// in-flight names in encounter order, ending with the repeated name.
    CircularDependency { cycle: Vec<String> },
    /// Descriptor parsed but violates a structural rule.
    StructuralValidation { name: String, reason: String },
    /// Read or copy failure.
    Io {
        name: String,
        path: PathBuf,
        reason: String,
    },
}

impl ResolveError {
    /// Package the error is attributed to. For cycles, the repeated name.
    pub fn package(&self) -> &str {
        match self {
            ResolveError::NotFound { name, .. }
            | ResolveError::InvalidDescriptor { name, .. }
            | ResolveError::StructuralValidation { name, .. }
            | ResolveError::Io { name, .. } => name,
            ResolveError::CircularDependency { cycle } => {
                cycle.last().map(String::as_str).unwrap_or_default()
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::NotFound { .. } => "not-found",
            ResolveError::InvalidDescriptor { .. } => "invalid-descriptor",
            ResolveError::CircularDependency { .. } => "circular-dependency",
            ResolveError::StructuralValidation { .. } => "structural-validation",
            ResolveError::Io { .. } => "io",
        }
    }

    /// Wrap an arbitrary failure from a locate/load step, keeping the
    /// classification when the cause already is a `ResolveError`.
    pub(crate) fn from_anyhow(name: &str, path: PathBuf, err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ResolveError>() {
            Some(classified) => classified.clone(),
            None => ResolveError::Io {
                name: name.to_string(),
                path,
                reason: format!("{:#}", err),
            },
        }
    }
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::NotFound { name, expected } => {
                write!(
                    f,
                    "Package '{}' not found (expected at {})",
                    name,
                    expected.display()
                )
            }
            ResolveError::InvalidDescriptor { name, path, reason } => {
                write!(
                    f,
                    "Invalid descriptor for '{}' at {}: {}",
                    name,
                    path.display(),
                    reason
                )
            }
            ResolveError::CircularDependency { cycle } => {
                write!(f, "Circular dependency: {}", cycle.join(" -> "))
            }
            ResolveError::StructuralValidation { name, reason } => {
                write!(f, "Package '{}' is malformed: {}", name, reason)
            }
            ResolveError::Io { name, path, reason } => {
                write!(f, "I/O failure for '{}' at {}: {}", name, path.display(), reason)
            }
        }
    }
}

impl std::error::Error for ResolveError {}
