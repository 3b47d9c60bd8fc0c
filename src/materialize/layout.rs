use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;
use crate::runtime::is_path_under;
use crate::specifier::Tier;

/// Directory for builtin and registry packages, relative to the output root.
pub const SHARED_DIR: &str = "packages";
/// Directory for local packages, relative to the output root.
pub const LOCAL_DIR: &str = "local";

/// Where each package lands under the output root.
///
/// ```text
/// <out>/packages/widgets        @builtin/widgets
/// <out>/packages/left-pad       left-pad
/// <out>/packages/@scope/util    @scope/util
/// <out>/local/helpers           ./local/helpers
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    namespace_prefix: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, namespace_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace_prefix: namespace_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn unqualified_name<'n>(&self, name: &'n str, tier: Tier) -> &'n str {
        match tier {
            Tier::Builtin => name.strip_prefix(&self.namespace_prefix).unwrap_or(name),
            Tier::Registry => name,
            Tier::Local => name
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(name),
        }
    }

    /// Destination directory for a package. Refuses names that would land
    /// outside the tier's directory.
    pub fn destination(&self, name: &str, tier: Tier) -> Result<PathBuf> {
        let base = match tier {
            Tier::Local => self.root.join(LOCAL_DIR),
            Tier::Builtin | Tier::Registry => self.root.join(SHARED_DIR),
        };
        let unqualified = self.unqualified_name(name, tier);
        let dest = base.join(unqualified);

        if unqualified.is_empty() || dest == base || !is_path_under(&dest, &base) {
            return Err(ResolveError::Io {
                name: name.to_string(),
                path: dest,
                reason: "destination escapes the output directory".to_string(),
            }
            .into());
        }
        Ok(dest)
    }
}
