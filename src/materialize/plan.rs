//! Pure copy planning: which files of a package are its own and which belong
//! to private dependency subtrees it embeds under `node_modules/`.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use crate::package::PackageFile;

const NODE_MODULES: &str = "node_modules";

/// A package embedded inside another package's file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedSubtree {
    pub name: String,
    /// Subtree root relative to the embedding package, e.g. `node_modules/shared`.
    pub root: PathBuf,
    pub files: Vec<PackageFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyPlan {
    pub own: Vec<PackageFile>,
    pub embedded: Vec<EmbeddedSubtree>,
}

/// For a path inside a package, the innermost embedded package it belongs to
/// (if any) and that package's subtree root.
///
/// `node_modules/shared/node_modules/deep/x.js` belongs to `deep`, rooted at
/// `node_modules/shared/node_modules/deep`.
pub fn embedded_package(relative: &Path) -> Option<(String, PathBuf)> {
    let parts: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    let mut innermost = None;
    let mut at = 0;
    while at < parts.len() {
        if parts[at] == NODE_MODULES
            && let Some(first) = parts.get(at + 1)
        {
            let name_len = if first.starts_with('@') { 2 } else { 1 };
            let root_len = at + 1 + name_len;
            // the subtree must contain the file, not be the file
            if parts.len() > root_len {
                innermost = Some((
                    parts[at + 1..root_len].join("/"),
                    parts[..root_len].iter().collect::<PathBuf>(),
                ));
                at = root_len;
                continue;
            }
        }
        at += 1;
    }
    innermost
}

/// Split a package inventory into its own files and embedded subtrees.
///
/// Subtrees are ordered by root, so an enclosing subtree always precedes the
/// ones nested inside it.
pub fn plan_copy(files: &[PackageFile]) -> CopyPlan {
    let mut plan = CopyPlan::default();
    let mut subtrees: BTreeMap<PathBuf, EmbeddedSubtree> = BTreeMap::new();

    for file in files {
        match embedded_package(&file.relative) {
            Some((name, root)) => subtrees
                .entry(root.clone())
                .or_insert_with(|| EmbeddedSubtree {
                    name,
                    root,
                    files: Vec::new(),
                })
                .files
                .push(file.clone()),
            None => plan.own.push(file.clone()),
        }
    }

    plan.embedded = subtrees.into_values().collect();
    plan
}

/// Package names that already have a physical copy in the output tree.
///
/// Shared between copy workers; the first claimant of a name copies it.
#[derive(Debug, Default)]
pub struct ClaimSet {
    names: Mutex<HashSet<String>>,
}

impl ClaimSet {
    pub fn seeded<I: IntoIterator<Item = String>>(names: I) -> Self {
        Self {
            names: Mutex::new(names.into_iter().collect()),
        }
    }

    /// Returns `true` if the caller now owns `name`.
    pub fn claim(&self, name: &str) -> bool {
        let mut names = match self.names.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        names.insert(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(relative: &str) -> PackageFile {
        PackageFile {
            absolute: PathBuf::from("/pkg").join(relative),
            relative: PathBuf::from(relative),
        }
    }

    #[test]
    fn test_embedded_package() {
        assert_eq!(embedded_package(Path::new("index.js")), None);
        assert_eq!(
            embedded_package(Path::new("node_modules/shared/index.js")),
            Some(("shared".into(), PathBuf::from("node_modules/shared")))
        );
        assert_eq!(
            embedded_package(Path::new("dist/node_modules/@scope/util/lib/a.js")),
            Some((
                "@scope/util".into(),
                PathBuf::from("dist/node_modules/@scope/util")
            ))
        );
        assert_eq!(
            embedded_package(Path::new("node_modules/shared/node_modules/deep/x.js")),
            Some((
                "deep".into(),
                PathBuf::from("node_modules/shared/node_modules/deep")
            ))
        );
        assert_eq!(
            embedded_package(Path::new("node_modules/shared/node_modules/stray.js")),
            Some(("shared".into(), PathBuf::from("node_modules/shared")))
        );
        // a file sitting directly in node_modules belongs to no package
        assert_eq!(embedded_package(Path::new("node_modules/stray.js")), None);
    }

    #[test]
    fn test_plan_copy_groups_subtrees() {
        let files = vec![
            file("index.js"),
            file("node_modules/shared/index.js"),
            file("node_modules/shared/package.json"),
            file("node_modules/@scope/util/index.js"),
            file("lib/a.js"),
        ];
        let plan = plan_copy(&files);

        assert_eq!(plan.own, vec![file("index.js"), file("lib/a.js")]);
        assert_eq!(plan.embedded.len(), 2);
        assert_eq!(plan.embedded[0].name, "@scope/util");
        assert_eq!(plan.embedded[1].name, "shared");
        assert_eq!(plan.embedded[1].files.len(), 2);
    }

    #[test]
    fn test_plan_copy_splits_nested_subtrees() {
        let files = vec![
            file("node_modules/shared/index.js"),
            file("node_modules/shared/node_modules/deep/index.js"),
            file("node_modules/shared/node_modules/deep/package.json"),
        ];
        let plan = plan_copy(&files);

        assert!(plan.own.is_empty());
        let names: Vec<_> = plan.embedded.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["shared", "deep"]);
        assert_eq!(plan.embedded[0].files, vec![file("node_modules/shared/index.js")]);
        assert_eq!(plan.embedded[1].files.len(), 2);
    }

    #[test]
    fn test_claim_set() {
        let claims = ClaimSet::seeded(["left-pad".to_string()]);
        assert!(!claims.claim("left-pad"));
        assert!(claims.claim("shared"));
        assert!(!claims.claim("shared"));
    }
}
