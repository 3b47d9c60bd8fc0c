//! Copies a resolution into an output tree, one physical copy per package name.

mod layout;
mod plan;
mod record;

pub use layout::{LOCAL_DIR, OutputLayout, SHARED_DIR};
pub use plan::{ClaimSet, CopyPlan, EmbeddedSubtree, embedded_package, plan_copy};
pub use record::{MaterializationRecord, MaterializationSummary};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::MaterializeOptions;
use crate::error::ResolveError;
use crate::package::{PackageFile, ResolvedPackage};
use crate::resolver::ResolutionResult;
use crate::runtime::Runtime;

pub struct Materializer<'a, R: Runtime> {
    runtime: &'a R,
    layout: OutputLayout,
    options: &'a MaterializeOptions,
}

impl<'a, R: Runtime> Materializer<'a, R> {
    pub fn new(runtime: &'a R, options: &'a MaterializeOptions, namespace_prefix: &str) -> Self {
        Self {
            runtime,
            layout: OutputLayout::new(&options.output_root, namespace_prefix),
            options,
        }
    }

    /// Copy every package of `result` into the output tree.
    ///
    /// Each package is attempted independently; failures land in the
    /// returned records. Use [`MaterializationSummary::check`] to apply the
    /// resolution mode.
    #[tracing::instrument(skip(self, result), fields(out = %self.layout.root().display()))]
    pub fn materialize(&self, result: &ResolutionResult) -> Result<MaterializationSummary> {
        let started = Instant::now();
        self.runtime
            .create_dir_all(self.layout.root())
            .with_context(|| format!("Failed to create output directory {:?}", self.layout.root()))?;

        let packages: Vec<&Arc<ResolvedPackage>> = result.packages.values().collect();
        let claims = ClaimSet::seeded(
            packages
                .iter()
                .filter(|p| p.is_valid() && !p.is_degraded())
                .map(|p| p.name.clone()),
        );
        let collisions = self.destination_collisions(&packages);

        let records: Vec<MaterializationRecord> = if self.options.parallel {
            packages
                .par_iter()
                .map(|pkg| self.materialize_package(pkg, &claims, &collisions))
                .collect()
        } else {
            packages
                .iter()
                .map(|pkg| self.materialize_package(pkg, &claims, &collisions))
                .collect()
        };

        let summary = MaterializationSummary::from_records(records, started.elapsed());
        info!(
            "Materialized {}/{} packages ({} files, {} bytes) in {:?}",
            summary.succeeded,
            summary.attempted,
            summary.total_files,
            summary.total_bytes,
            summary.duration
        );
        Ok(summary)
    }

    /// Packages whose destination was already taken by an earlier package in
    /// name order, mapped to that owner. `@builtin/x` and a registry `x` both
    /// land in `packages/x`.
    fn destination_collisions(&self, packages: &[&Arc<ResolvedPackage>]) -> HashMap<String, String> {
        let mut owners: HashMap<PathBuf, &str> = HashMap::new();
        let mut collisions = HashMap::new();
        for pkg in packages.iter().filter(|p| p.is_valid() && !p.is_degraded()) {
            let Ok(destination) = self.layout.destination(&pkg.name, pkg.tier) else {
                continue;
            };
            match owners.get(&destination) {
                Some(owner) => {
                    warn!("{} and {} both map to {:?}", owner, pkg.name, destination);
                    collisions.insert(pkg.name.clone(), owner.to_string());
                }
                None => {
                    owners.insert(destination, &pkg.name);
                }
            }
        }
        collisions
    }

    fn materialize_package(
        &self,
        pkg: &ResolvedPackage,
        claims: &ClaimSet,
        collisions: &HashMap<String, String>,
    ) -> MaterializationRecord {
        let mut record = MaterializationRecord::new(&pkg.name, pkg.dir.clone());

        if pkg.is_degraded() {
            let message = format!("{}: stub package, nothing to copy", pkg.name);
            warn!("{}", message);
            record.warnings.push(message);
            record.success = true;
            return record;
        }

        if !pkg.is_valid() {
            let error = pkg.errors.first().cloned().unwrap_or_else(|| ResolveError::StructuralValidation {
                name: pkg.name.clone(),
                reason: "package has no usable descriptor".to_string(),
            });
            warn!("Not copying invalid package {}: {}", pkg.name, error);
            record.fail(error);
            return record;
        }

        let destination = match self.layout.destination(&pkg.name, pkg.tier) {
            Ok(dest) => dest,
            Err(err) => {
                record.fail(ResolveError::from_anyhow(&pkg.name, pkg.dir.clone(), &err));
                return record;
            }
        };
        record.destination = Some(destination.clone());

        if let Some(owner) = collisions.get(&pkg.name) {
            record.fail(ResolveError::Io {
                name: pkg.name.clone(),
                path: destination,
                reason: format!("destination already used by {}", owner),
            });
            return record;
        }

        match self.copy_package(pkg, &destination, claims, &mut record) {
            Ok(()) => {
                debug!(
                    "Copied {} ({} files) to {:?}",
                    pkg.name,
                    record.copied_files.len(),
                    destination
                );
                record.success = true;
            }
            Err(err) => {
                warn!("Failed to materialize {}: {:#}", pkg.name, err);
                record.fail(ResolveError::from_anyhow(&pkg.name, destination, &err));
            }
        }
        record
    }

    fn copy_package(
        &self,
        pkg: &ResolvedPackage,
        destination: &Path,
        claims: &ClaimSet,
        record: &mut MaterializationRecord,
    ) -> Result<()> {
        // Not atomic: an interrupted copy leaves old and new files mixed.
        if self.runtime.exists(destination) {
            self.runtime.remove_dir_all(destination)?;
        }
        self.runtime.create_dir_all(destination)?;

        let plan = plan_copy(&pkg.files);
        for file in &plan.own {
            self.copy_file(file, destination, record)?;
        }

        let mut skipped_roots: Vec<&Path> = Vec::new();
        for subtree in &plan.embedded {
            if skipped_roots.iter().any(|root| subtree.root.starts_with(root)) {
                debug!("Skipping {:?}, its enclosing package was not copied", subtree.root);
                continue;
            }
            if !claims.claim(&subtree.name) {
                info!(
                    "Skipping duplicate {} embedded in {} ({:?})",
                    subtree.name, pkg.name, subtree.root
                );
                record.skipped_duplicates.push(subtree.name.clone());
                skipped_roots.push(&subtree.root);
                continue;
            }
            for file in &subtree.files {
                self.copy_file(file, destination, record)?;
            }
        }
        Ok(())
    }

    fn copy_file(
        &self,
        file: &PackageFile,
        destination: &Path,
        record: &mut MaterializationRecord,
    ) -> Result<()> {
        let target = destination.join(&file.relative);
        if let Some(parent) = target.parent() {
            self.runtime.create_dir_all(parent)?;
        }
        let bytes = self.runtime.copy(&file.absolute, &target).map_err(|err| ResolveError::Io {
            name: record.name.clone(),
            path: file.absolute.clone(),
            reason: format!("{:#}", err),
        })?;
        record.copied_files.push(file.relative.clone());
        record.total_bytes += bytes;
        Ok(())
    }
}
