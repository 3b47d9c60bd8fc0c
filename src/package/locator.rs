//! Package location by tier.
//!
//! - Builtin packages live in an SDK root found by searching upward from the
//!   project root.
//! - Local packages are paths relative to the project root.
//! - Registry packages live in the nearest `node_modules` that has them.

use anyhow::Result;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::runtime::{Runtime, ancestors, normalize_path};
use crate::specifier::Tier;

const NODE_MODULES: &str = "node_modules";

/// Monorepo directory that may hold the SDK packages.
const SDK_PACKAGES_DIR: &str = "packages";

/// Outcome of a lookup that did not raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Found(PathBuf),
    /// Tolerant mode only: where the package should have been, and why it
    /// is not usable.
    Unresolved { expected: PathBuf, warning: String },
}

/// Lookups memoized for one resolution session.
#[derive(Debug, Default)]
pub struct LocatorCache {
    sdk_root: Option<PathBuf>,
}

impl LocatorCache {
    pub fn sdk_root(&self) -> Option<&Path> {
        self.sdk_root.as_deref()
    }
}

pub struct PackageLocator<'a, R: Runtime> {
    runtime: &'a R,
    config: &'a ResolverConfig,
}

impl<'a, R: Runtime> PackageLocator<'a, R> {
    pub fn new(runtime: &'a R, config: &'a ResolverConfig) -> Self {
        Self { runtime, config }
    }

    /// Find the directory of package `name`.
    ///
    /// In strict mode a missing package is an `Err` carrying
    /// [`ResolveError::NotFound`]; in tolerant mode it is
    /// [`Location::Unresolved`].
    #[tracing::instrument(skip(self, cache))]
    pub fn locate(&self, name: &str, tier: Tier, cache: &mut LocatorCache) -> Result<Location> {
        let (found, expected) = match tier {
            Tier::Builtin => self.locate_builtin(name, cache),
            Tier::Local => self.locate_local(name),
            Tier::Registry => self.locate_registry(name),
        };

        if let Some(dir) = found {
            debug!("Located {} ({}) at {:?}", name, tier, dir);
            return Ok(Location::Found(dir));
        }

        let error = ResolveError::NotFound {
            name: name.to_string(),
            expected: expected.clone(),
        };
        if self.config.mode.is_strict() {
            return Err(error.into());
        }

        warn!("{}; continuing with an empty stub", error);
        Ok(Location::Unresolved {
            expected,
            warning: error.to_string(),
        })
    }

    fn locate_builtin(&self, name: &str, cache: &mut LocatorCache) -> (Option<PathBuf>, PathBuf) {
        let prefix = self.config.namespace_prefix();
        let unqualified = name.strip_prefix(&prefix).unwrap_or(name);

        let sdk_root = match &cache.sdk_root {
            Some(root) => root.clone(),
            None => match self.find_sdk_root() {
                Some(root) => {
                    debug!("SDK root for this session: {:?}", root);
                    cache.sdk_root = Some(root.clone());
                    root
                }
                None => self
                    .config
                    .project_root
                    .join(NODE_MODULES)
                    .join(&self.config.namespace),
            },
        };

        let dir = sdk_root.join(unqualified);
        let found = self.runtime.is_dir(&dir).then(|| dir.clone());
        (found, dir)
    }

    fn locate_local(&self, name: &str) -> (Option<PathBuf>, PathBuf) {
        let dir = normalize_path(&self.config.project_root.join(name));
        let found = self.runtime.is_dir(&dir).then(|| dir.clone());
        (found, dir)
    }

    fn locate_registry(&self, name: &str) -> (Option<PathBuf>, PathBuf) {
        let mut nearest = None;
        for ancestor in ancestors(&self.config.project_root, self.config.search_depth) {
            let modules = ancestor.join(NODE_MODULES);
            if !self.runtime.is_dir(&modules) {
                continue;
            }
            let dir = modules.join(name);
            if self.runtime.is_dir(&dir) {
                return (Some(dir), PathBuf::new());
            }
            nearest.get_or_insert(dir);
        }

        let expected = nearest
            .unwrap_or_else(|| self.config.project_root.join(NODE_MODULES).join(name));
        (None, expected)
    }

    /// Walk upward from the project root looking for a directory whose
    /// child directories all carry a descriptor.
    pub fn find_sdk_root(&self) -> Option<PathBuf> {
        ancestors(&self.config.project_root, self.config.search_depth).find_map(|ancestor| {
            [
                ancestor.join(NODE_MODULES).join(&self.config.namespace),
                ancestor.join(SDK_PACKAGES_DIR),
            ]
            .into_iter()
            .find(|candidate| self.is_sdk_root(candidate))
        })
    }

    fn is_sdk_root(&self, candidate: &Path) -> bool {
        if !self.runtime.is_dir(candidate) {
            return false;
        }
        let Ok(entries) = self.runtime.read_dir(candidate) else {
            return false;
        };
        let children: Vec<_> = entries
            .into_iter()
            .filter(|e| self.runtime.is_dir(e))
            .collect();
        !children.is_empty()
            && children
                .iter()
                .all(|child| self.runtime.exists(&child.join(&self.config.descriptor_file)))
    }
}
