use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;
use std::path::PathBuf;

use crate::config::ResolverConfig;
use crate::resolver::{GraphResolver, ResolutionResult, ResolutionSession};
use crate::runtime::Runtime;
use crate::specifier::extract_specifiers;

mod check_export;
mod install;
mod resolve;

pub use check_export::check_export;
pub use install::install;
pub use resolve::resolve;

/// Where a command's specifiers come from.
#[derive(Debug, Clone, Default)]
pub struct ImportSource {
    pub specifiers: Vec<String>,
    /// JSON file with an import list, record list or keyed collection.
    pub imports: Option<PathBuf>,
}

impl ImportSource {
    pub fn new(specifiers: Vec<String>, imports: Option<PathBuf>) -> Self {
        Self {
            specifiers,
            imports,
        }
    }

    /// Merge the imports file (first) with command-line specifiers into one
    /// import list.
    pub fn load<R: Runtime>(&self, runtime: &R) -> Result<Value> {
        let mut merged: Vec<Value> = Vec::new();

        if let Some(path) = &self.imports {
            debug!("Reading imports from {:?}", path);
            let content = runtime
                .read_to_string(path)
                .with_context(|| format!("Failed to read imports file {:?}", path))?;
            let value: Value = serde_json::from_str(&content)
                .with_context(|| format!("Imports file {:?} is not valid JSON", path))?;
            merged.extend(extract_specifiers(&value).into_iter().map(Value::String));
        }
        merged.extend(self.specifiers.iter().cloned().map(Value::String));

        if merged.is_empty() {
            anyhow::bail!("No specifiers given. Pass them as arguments or with --imports.");
        }
        Ok(Value::Array(merged))
    }
}

/// Project root: the given path or the current directory, canonicalized.
pub fn project_root<R: Runtime>(runtime: &R, root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(path) => path,
        None => runtime.current_dir()?,
    };
    runtime
        .canonicalize(&root)
        .with_context(|| format!("Project root {:?} does not exist", root))
}

/// Run one resolution session over `source`.
pub(crate) fn run_resolution<R: Runtime>(
    runtime: &R,
    config: &ResolverConfig,
    source: &ImportSource,
) -> Result<ResolutionResult> {
    let input = source.load(runtime)?;
    let resolver = GraphResolver::new(runtime, config);
    let mut session = ResolutionSession::new();
    resolver.resolve_all(&mut session, &input)
}

/// Remaining errors fail a command. Tolerant mode has already turned missing
/// packages and unusable descriptors into warnings; cycles stay errors.
pub(crate) fn ensure_no_errors(result: &ResolutionResult) -> Result<()> {
    if let Some(first) = result.errors.first() {
        if result.errors.len() == 1 {
            return Err(first.clone().into());
        }
        return Err(anyhow::Error::new(first.clone()).context(format!(
            "Resolution finished with {} errors",
            result.errors.len()
        )));
    }
    Ok(())
}
