//! Recursive dependency resolution.
//!
//! [`GraphResolver`] is stateless; everything a run accumulates lives in the
//! [`ResolutionSession`] passed through every call. Resolution is a
//! depth-first descent that memoizes packages by name, detects cycles with an
//! explicit in-flight stack, and keeps going when a transitive dependency
//! fails.

mod graph;
mod result;
mod session;
mod validate;

use anyhow::Result;
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

pub use graph::{DependencyGraph, GraphNode};
pub use result::{MapEntry, ResolutionMap, ResolutionResult};
pub use session::{InFlight, ResolutionSession};
pub use validate::{Validation, validate};

use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::package::{Location, PackageLocator, PackageMetadataLoader, ResolvedPackage};
use crate::runtime::Runtime;
use crate::specifier::{Tier, dedup_specifiers, extract_specifiers, package_name};

pub struct GraphResolver<'a, R: Runtime> {
    config: &'a ResolverConfig,
    locator: PackageLocator<'a, R>,
    loader: PackageMetadataLoader<'a, R>,
}

impl<'a, R: Runtime> GraphResolver<'a, R> {
    pub fn new(runtime: &'a R, config: &'a ResolverConfig) -> Self {
        Self {
            config,
            locator: PackageLocator::new(runtime, config),
            loader: PackageMetadataLoader::new(runtime, config),
        }
    }

    /// Resolve every specifier found in an arbitrary import collection.
    pub fn resolve_all(
        &self,
        session: &mut ResolutionSession,
        imports: &Value,
    ) -> Result<ResolutionResult> {
        let specifiers = extract_specifiers(imports);
        self.resolve_specifiers(session, specifiers)
    }

    /// Resolve the given root specifiers and everything they depend on.
    ///
    /// In strict mode a root that cannot be located aborts the run with its
    /// `NotFound` error; packages resolved before that stay in `session`.
    #[tracing::instrument(skip(self, session, specifiers))]
    pub fn resolve_specifiers(
        &self,
        session: &mut ResolutionSession,
        specifiers: impl IntoIterator<Item = String>,
    ) -> Result<ResolutionResult> {
        let prefix = self.config.namespace_prefix();

        for specifier in dedup_specifiers(specifiers) {
            let tier = Tier::classify(&specifier, &prefix);
            let name = package_name(&specifier, tier, &prefix).to_string();
            if !session.roots.contains(&name) {
                session.roots.push(name.clone());
            }
            if session.visited.contains(&name) {
                continue;
            }
            self.resolve_one(session, &name, tier, true)?;
        }

        Ok(self.finish(session))
    }

    /// Resolve a single package and, recursively, its dependencies.
    ///
    /// Returns `Ok(None)` when this branch failed: a cycle, or a non-root
    /// package that could not be resolved. Both are recorded as session
    /// errors. Only a root failure is returned as `Err`.
    pub fn resolve_one(
        &self,
        session: &mut ResolutionSession,
        name: &str,
        tier: Tier,
        is_root: bool,
    ) -> Result<Option<Arc<ResolvedPackage>>> {
        if session.in_flight.contains(name) {
            let cycle = session.in_flight.cycle_path(name);
            session.error(ResolveError::CircularDependency { cycle });
            return Ok(None);
        }

        if let Some(cached) = session.cache.get(name) {
            return Ok(Some(Arc::clone(cached)));
        }

        session.in_flight.push(name);
        let outcome = self.resolve_fresh(session, name, tier);
        session.in_flight.pop();

        match outcome {
            Ok(package) => Ok(Some(package)),
            Err(e) if is_root => Err(e),
            Err(e) => {
                session.visited.insert(name.to_string());
                let error = ResolveError::from_anyhow(name, Default::default(), &e);
                session.error(error);
                Ok(None)
            }
        }
    }

    fn resolve_fresh(
        &self,
        session: &mut ResolutionSession,
        name: &str,
        tier: Tier,
    ) -> Result<Arc<ResolvedPackage>> {
        let package = match self.locator.locate(name, tier, &mut session.locator_cache)? {
            Location::Found(dir) => self.loader.load(&dir, name, tier),
            Location::Unresolved { expected, warning } => {
                session.warn(warning.clone());
                ResolvedPackage::stub(name, tier, expected, warning)
            }
        };

        let package = Arc::new(package);
        session.cache.insert(name.to_string(), Arc::clone(&package));

        let prefix = self.config.namespace_prefix();
        for dep in &package.dependencies {
            if session.visited.contains(dep) {
                continue;
            }
            debug!("{} -> {}", name, dep);
            self.resolve_one(session, dep, Tier::classify(dep, &prefix), false)?;
        }

        session.visited.insert(name.to_string());
        Ok(package)
    }

    /// Validate, build the graph and aggregate files for what the session
    /// holds now.
    fn finish(&self, session: &mut ResolutionSession) -> ResolutionResult {
        let validation = validate(&session.cache, self.config.max_files, self.config.mode);
        let (graph, edge_warnings) = DependencyGraph::build(&session.cache);
        let files = result::aggregate_files(session.cache.values());

        let mut errors = session.errors.clone();
        errors.extend(validation.errors);
        let mut warnings = session.warnings.clone();
        warnings.extend(edge_warnings);
        warnings.extend(validation.warnings);

        let elapsed = session.started.elapsed();
        info!(
            "Resolved {} package(s), {} file(s), {} error(s), {} warning(s) in {:?}",
            session.cache.len(),
            files.len(),
            errors.len(),
            warnings.len(),
            elapsed
        );

        ResolutionResult {
            packages: session.cache.clone(),
            graph,
            files,
            roots: session.roots.clone(),
            errors,
            warnings,
            elapsed,
        }
    }
}
