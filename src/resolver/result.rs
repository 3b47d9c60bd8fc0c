use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::DependencyGraph;
use crate::error::ResolveError;
use crate::package::{PackageFile, PackageStatus, ResolvedPackage};
use crate::specifier::Tier;

/// Everything one resolution run produced.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    pub packages: BTreeMap<String, Arc<ResolvedPackage>>,
    pub graph: DependencyGraph,
    /// Every package file, each absolute path listed once.
    pub files: Vec<PackageFile>,
    /// Root package names in the order they were requested.
    pub roots: Vec<String>,
    pub errors: Vec<ResolveError>,
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

impl ResolutionResult {
    pub fn get(&self, name: &str) -> Option<&Arc<ResolvedPackage>> {
        self.packages.get(name)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn degraded(&self) -> impl Iterator<Item = &Arc<ResolvedPackage>> {
        self.packages.values().filter(|p| p.is_degraded())
    }

    pub fn to_map(&self) -> ResolutionMap {
        ResolutionMap {
            packages: self
                .packages
                .iter()
                .map(|(name, pkg)| (name.clone(), MapEntry::from(pkg.as_ref())))
                .collect(),
        }
    }
}

/// Collect package files, keeping the first occurrence of each absolute path.
pub(crate) fn aggregate_files<'a>(
    packages: impl IntoIterator<Item = &'a Arc<ResolvedPackage>>,
) -> Vec<PackageFile> {
    let mut seen = HashSet::new();
    packages
        .into_iter()
        .flat_map(|pkg| pkg.files.iter())
        .filter(|file| seen.insert(file.absolute.clone()))
        .cloned()
        .collect()
}

/// Serializable view of a resolution, consumed when rewriting import
/// specifiers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct ResolutionMap {
    pub packages: BTreeMap<String, MapEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub tier: Tier,
    pub path: PathBuf,
    pub version: String,
    pub main: Option<String>,
    pub exports: BTreeMap<String, String>,
    pub files: Vec<PathBuf>,
    pub dependencies: Vec<String>,
    pub status: PackageStatus,
}

impl From<&ResolvedPackage> for MapEntry {
    fn from(pkg: &ResolvedPackage) -> Self {
        MapEntry {
            tier: pkg.tier,
            path: pkg.dir.clone(),
            version: pkg.version().to_string(),
            main: pkg.main().map(String::from),
            exports: pkg.exports.clone(),
            files: pkg.files.iter().map(|f| f.relative.clone()).collect(),
            dependencies: pkg.dependencies.clone(),
            status: pkg.status.clone(),
        }
    }
}

impl ResolutionMap {
    pub fn get(&self, name: &str) -> Option<&MapEntry> {
        self.packages.get(name)
    }

    /// Whether `package` exports `symbol`.
    pub fn exports_symbol(&self, package: &str, symbol: &str) -> bool {
        self.packages
            .get(package)
            .is_some_and(|entry| entry.exports.contains_key(symbol))
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
