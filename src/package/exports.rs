//! Export map derivation.
//!
//! An explicit `exports` table wins. Without one, the lib, src and package
//! root directories are scanned, in that order, for top-level source files;
//! each file becomes a capitalized symbol and the first directory to claim a
//! symbol keeps it.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use super::Descriptor;
use crate::runtime::Runtime;

/// Directories scanned for exports, relative to the package root.
pub const SCAN_DIRS: [&str; 3] = ["lib", "src", ""];

/// Files eligible for the `default` export, in preference order.
pub const INDEX_FILES: [&str; 3] = ["index.js", "index.mjs", "index.fjs"];

const SOURCE_EXTENSIONS: [&str; 5] = ["js", "mjs", "cjs", "jsx", "fjs"];

/// Build the symbol -> relative file map for the package in `dir`.
#[tracing::instrument(skip(runtime, descriptor))]
pub fn derive_exports<R: Runtime>(
    runtime: &R,
    dir: &Path,
    descriptor: &Descriptor,
) -> Result<BTreeMap<String, String>> {
    let mut exports = match &descriptor.exports {
        Some(table) => table.clone(),
        None => scan_exports(runtime, dir)?,
    };

    if let Some(index) = INDEX_FILES
        .iter()
        .find(|f| runtime.exists(&dir.join(f)) && !runtime.is_dir(&dir.join(f)))
    {
        exports
            .entry("default".to_string())
            .or_insert_with(|| index.to_string());
    }

    Ok(exports)
}

fn scan_exports<R: Runtime>(runtime: &R, dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut exports = BTreeMap::new();

    for sub in SCAN_DIRS {
        let scan_dir = if sub.is_empty() {
            dir.to_path_buf()
        } else {
            dir.join(sub)
        };
        if !runtime.is_dir(&scan_dir) {
            continue;
        }

        for entry in runtime.read_dir(&scan_dir)? {
            if runtime.is_dir(&entry) {
                continue;
            }
            let Some(file_name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(symbol) = export_symbol(file_name) else {
                continue;
            };
            let relative = if sub.is_empty() {
                file_name.to_string()
            } else {
                format!("{}/{}", sub, file_name)
            };
            exports.entry(symbol).or_insert(relative);
        }
    }

    Ok(exports)
}

/// `button.js` -> `Button`. Returns `None` for private (`_`-prefixed),
/// index, and non-source files.
pub fn export_symbol(file_name: &str) -> Option<String> {
    if file_name.starts_with('_') || file_name.starts_with('.') {
        return None;
    }
    let path = Path::new(file_name);
    let ext = path.extension()?.to_str()?;
    if !SOURCE_EXTENSIONS.contains(&ext) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem == "index" {
        return None;
    }
    let mut chars = stem.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}
