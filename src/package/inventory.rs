//! Package file inventory.
//!
//! [`FileFilter`] decides from a relative path alone whether a file belongs
//! in a browser bundle, so it is testable without touching the disk.
//! [`enumerate_files`] walks a package directory through the [`Runtime`]
//! and hands the paths it finds to the filter.

use anyhow::Result;
use glob::Pattern;
use log::debug;
use std::path::{Path, PathBuf};

use super::PackageFile;
use crate::runtime::Runtime;

/// Directory names never descended into.
const DENIED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    ".bin",
    ".cache",
    ".parcel-cache",
    ".turbo",
    ".nyc_output",
    "coverage",
];

/// File name patterns never copied.
const DENIED_FILES: &[&str] = &[
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "*.tsbuildinfo",
    "*.log",
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
];

/// Extensions a browser bundle may reference.
const BUNDLE_EXTENSIONS: &[&str] = &[
    "js", "mjs", "cjs", "jsx", "fjs", "json", "css", "map", "wasm", "svg", "png", "jpg", "jpeg",
    "gif", "webp", "ico", "woff", "woff2", "ttf", "otf",
];

pub struct FileFilter {
    denied_dirs: Vec<Pattern>,
    denied_files: Vec<Pattern>,
    extensions: Vec<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(DENIED_DIRS, DENIED_FILES, BUNDLE_EXTENSIONS)
    }
}

impl FileFilter {
    pub fn new(denied_dirs: &[&str], denied_files: &[&str], extensions: &[&str]) -> Self {
        let compile = |patterns: &[&str]| {
            patterns
                .iter()
                .filter_map(|p| match Pattern::new(p) {
                    Ok(pattern) => Some(pattern),
                    Err(e) => {
                        log::warn!("Ignoring invalid deny pattern '{}': {}", p, e);
                        None
                    }
                })
                .collect::<Vec<_>>()
        };
        Self {
            denied_dirs: compile(denied_dirs),
            denied_files: compile(denied_files),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    pub fn accepts_dir_name(&self, name: &str) -> bool {
        !self.denied_dirs.iter().any(|p| p.matches(name))
    }

    pub fn accepts_file_name(&self, name: &str) -> bool {
        if self.denied_files.iter().any(|p| p.matches(name)) {
            return false;
        }
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }

    /// Whether a path relative to the package root survives the filter:
    /// every directory component and the file name must be accepted.
    pub fn accepts(&self, relative: &Path) -> bool {
        let mut components: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        let Some(file_name) = components.pop() else {
            return false;
        };
        components.iter().all(|dir| self.accepts_dir_name(dir)) && self.accepts_file_name(&file_name)
    }

    /// Keep the relative paths the filter accepts, sorted.
    pub fn filter_relative<I, P>(&self, paths: I) -> Vec<PathBuf>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut kept: Vec<PathBuf> = paths
            .into_iter()
            .filter(|p| self.accepts(p.as_ref()))
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        kept.sort();
        kept
    }
}

/// Recursively list the files under `root` that pass `filter`.
///
/// Symlinked directories are not followed, so a link back into the package
/// cannot loop the walk.
#[tracing::instrument(skip(runtime, filter))]
pub fn enumerate_files<R: Runtime>(
    runtime: &R,
    root: &Path,
    filter: &FileFilter,
) -> Result<Vec<PackageFile>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in runtime.read_dir(&dir)? {
            let Ok(relative) = entry.strip_prefix(root) else {
                continue;
            };
            let relative = relative.to_path_buf();
            if !runtime.is_dir(&entry) {
                found.push(relative);
                continue;
            }
            // prune early; the filter rechecks every component anyway
            let accepted = entry
                .file_name()
                .is_some_and(|n| filter.accepts_dir_name(&n.to_string_lossy()));
            if !accepted {
                debug!("Skipping denied directory {:?}", entry);
            } else if runtime.is_symlink(&entry) {
                debug!("Not following symlinked directory {:?}", entry);
            } else {
                pending.push(entry);
            }
        }
    }

    Ok(filter
        .filter_relative(found)
        .into_iter()
        .map(|relative| PackageFile {
            absolute: root.join(&relative),
            relative,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_filter_accepts_bundle_files() {
        let filter = FileFilter::default();
        assert!(filter.accepts(Path::new("index.js")));
        assert!(filter.accepts(Path::new("lib/button.fjs")));
        assert!(filter.accepts(Path::new("assets/logo.SVG")));
        assert!(filter.accepts(Path::new("package.json")));
    }

    #[test]
    fn test_filter_rejects_denied_and_foreign_files() {
        let filter = FileFilter::default();
        assert!(!filter.accepts(Path::new(".git/config.json")));
        assert!(!filter.accepts(Path::new("coverage/lcov.js")));
        assert!(!filter.accepts(Path::new("package-lock.json")));
        assert!(!filter.accepts(Path::new("debug.log")));
        assert!(!filter.accepts(Path::new(".DS_Store")));
        assert!(!filter.accepts(Path::new("README.md")));
        assert!(!filter.accepts(Path::new("src/main.rs")));
        assert!(!filter.accepts(Path::new("")));
    }

    #[test]
    fn test_filter_relative_is_sorted() {
        let filter = FileFilter::default();
        let kept = filter.filter_relative(["z.js", "yarn.lock", "a/b.css", "notes.txt"]);
        assert_eq!(kept, vec![PathBuf::from("a/b.css"), PathBuf::from("z.js")]);
    }

    #[test]
    fn test_enumerate_files_with_mock_runtime() {
        let mut runtime = MockRuntime::new();
        let root = PathBuf::from("/pkg");

        runtime
            .expect_read_dir()
            .with(eq(root.clone()))
            .returning(|p| {
                Ok(vec![
                    p.join(".git"),
                    p.join("index.js"),
                    p.join("lib"),
                    p.join("yarn.lock"),
                ])
            });
        runtime
            .expect_read_dir()
            .with(eq(root.join("lib")))
            .returning(|p| Ok(vec![p.join("util.js")]));
        runtime
            .expect_is_dir()
            .returning(|p| p.ends_with(".git") || p.ends_with("lib"));
        runtime
            .expect_is_symlink()
            .with(eq(root.join("lib")))
            .times(1)
            .returning(|_| false);

        let files = enumerate_files(&runtime, &root, &FileFilter::default()).unwrap();
        let relative: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("index.js"), PathBuf::from("lib/util.js")]
        );
        assert_eq!(files[1].absolute, PathBuf::from("/pkg/lib/util.js"));
    }

    #[test]
    fn test_enumerate_files_real_tree() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules/shared")).unwrap();
        fs::create_dir_all(root.join("coverage")).unwrap();
        fs::write(root.join("package.json"), "{}").unwrap();
        fs::write(root.join("node_modules/shared/index.js"), "").unwrap();
        fs::write(root.join("coverage/report.js"), "").unwrap();
        fs::write(root.join("CHANGELOG.md"), "").unwrap();

        let files = enumerate_files(&RealRuntime, root, &FileFilter::default()).unwrap();
        let relative: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("node_modules/shared/index.js"),
                PathBuf::from("package.json"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_enumerate_files_does_not_follow_symlinked_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("index.js"), "").unwrap();
        fs::write(root.join("lib/util.js"), "").unwrap();
        // a link back to the package root would otherwise recurse forever
        std::os::unix::fs::symlink(root, root.join("node_modules/self")).unwrap();

        let files = enumerate_files(&RealRuntime, root, &FileFilter::default()).unwrap();
        let relative: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("index.js"), PathBuf::from("lib/util.js")]
        );
    }
}
