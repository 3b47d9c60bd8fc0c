use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::Descriptor;
use crate::error::ResolveError;
use crate::specifier::Tier;

/// A file belonging to a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackageFile {
    pub absolute: PathBuf,
    /// Path relative to the package directory.
    pub relative: PathBuf,
}

/// How a package entered the resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum PackageStatus {
    /// Real files on disk back this package.
    Resolved,
    /// The package could not be located; an empty stub stands in for it.
    Degraded(String),
    /// The package was located but its metadata is unusable.
    Failed(String),
}

/// A located package with its metadata, exports and file inventory.
///
/// Created once per unique name per resolution session and shared through
/// `Arc` from the session cache.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub name: String,
    pub tier: Tier,
    /// Absolute package directory. For degraded stubs, where it was expected.
    pub dir: PathBuf,
    pub descriptor: Option<Descriptor>,
    /// Symbol name -> file path relative to `dir`.
    pub exports: BTreeMap<String, String>,
    /// Direct dependency names in declaration order.
    pub dependencies: Vec<String>,
    pub files: Vec<PackageFile>,
    pub errors: Vec<ResolveError>,
    pub warnings: Vec<String>,
    pub status: PackageStatus,
}

impl ResolvedPackage {
    /// A package that failed before any metadata could be read.
    pub fn failed(name: &str, tier: Tier, dir: PathBuf, error: ResolveError) -> Self {
        Self {
            name: name.to_string(),
            tier,
            dir,
            descriptor: None,
            exports: BTreeMap::new(),
            dependencies: Vec::new(),
            files: Vec::new(),
            status: PackageStatus::Failed(error.to_string()),
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    /// Empty placeholder for a package that could not be located.
    pub fn stub(name: &str, tier: Tier, expected: PathBuf, reason: String) -> Self {
        Self {
            name: name.to_string(),
            tier,
            dir: expected,
            descriptor: Some(Descriptor::stub(name)),
            exports: BTreeMap::new(),
            dependencies: Vec::new(),
            files: Vec::new(),
            errors: Vec::new(),
            warnings: vec![reason.clone()],
            status: PackageStatus::Degraded(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.descriptor.is_some()
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, PackageStatus::Degraded(_))
    }

    pub fn version(&self) -> &str {
        self.descriptor
            .as_ref()
            .map(|d| d.version.as_str())
            .unwrap_or("0.0.0")
    }

    pub fn main(&self) -> Option<&str> {
        self.descriptor.as_ref().map(|d| d.main.as_str())
    }
}
