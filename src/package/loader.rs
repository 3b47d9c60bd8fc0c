use log::{debug, warn};
use std::path::{Path, PathBuf};

use super::{
    Descriptor, FileFilter, PackageStatus, ResolvedPackage, derive_exports, enumerate_files,
};
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::runtime::Runtime;
use crate::specifier::Tier;

/// Reads a package directory into a [`ResolvedPackage`].
///
/// Loading never fails: problems are recorded on the returned package so the
/// caller can keep resolving unrelated packages.
pub struct PackageMetadataLoader<'a, R: Runtime> {
    runtime: &'a R,
    config: &'a ResolverConfig,
    filter: FileFilter,
}

impl<'a, R: Runtime> PackageMetadataLoader<'a, R> {
    pub fn new(runtime: &'a R, config: &'a ResolverConfig) -> Self {
        Self {
            runtime,
            config,
            filter: FileFilter::default(),
        }
    }

    pub fn descriptor_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.config.descriptor_file)
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self, dir: &Path, name: &str, tier: Tier) -> ResolvedPackage {
        let descriptor_path = self.descriptor_path(dir);

        if !self.runtime.exists(&descriptor_path) {
            warn!("{} has no {}", name, self.config.descriptor_file);
            return ResolvedPackage::failed(
                name,
                tier,
                dir.to_path_buf(),
                ResolveError::InvalidDescriptor {
                    name: name.to_string(),
                    path: descriptor_path,
                    reason: "missing descriptor".to_string(),
                },
            );
        }

        let parsed = self
            .runtime
            .read_to_string(&descriptor_path)
            .and_then(|content| Descriptor::parse(&content));
        let (descriptor, mut warnings) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Failed to parse descriptor of {}: {:#}", name, e);
                return ResolvedPackage::failed(
                    name,
                    tier,
                    dir.to_path_buf(),
                    ResolveError::InvalidDescriptor {
                        name: name.to_string(),
                        path: descriptor_path,
                        reason: format!("{:#}", e),
                    },
                );
            }
        };

        let mut errors: Vec<ResolveError> = descriptor
            .structural_problems()
            .into_iter()
            .map(|reason| ResolveError::StructuralValidation {
                name: name.to_string(),
                reason,
            })
            .collect();

        let exports = derive_exports(self.runtime, dir, &descriptor).unwrap_or_else(|e| {
            errors.push(ResolveError::from_anyhow(name, dir.to_path_buf(), &e));
            Default::default()
        });

        let files = enumerate_files(self.runtime, dir, &self.filter).unwrap_or_else(|e| {
            errors.push(ResolveError::from_anyhow(name, dir.to_path_buf(), &e));
            Vec::new()
        });

        if !self.runtime.exists(&dir.join(&descriptor.main)) {
            warnings.push(format!("main entry '{}' does not exist", descriptor.main));
        }

        debug!(
            "Loaded {} {}: {} export(s), {} dependency(ies), {} file(s)",
            name,
            descriptor.version,
            exports.len(),
            descriptor.dependencies.len(),
            files.len()
        );

        let status = match errors.first() {
            Some(first) => PackageStatus::Failed(first.to_string()),
            None => PackageStatus::Resolved,
        };

        ResolvedPackage {
            name: name.to_string(),
            tier,
            dir: dir.to_path_buf(),
            dependencies: descriptor.dependencies.clone(),
            descriptor: Some(descriptor),
            exports,
            files,
            errors,
            warnings,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_descriptor_is_single_error() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/app/node_modules/left-pad");
        runtime
            .expect_exists()
            .with(eq(dir.join("package.json")))
            .returning(|_| false);
        runtime.expect_read_to_string().never();

        let config = ResolverConfig::new("/app");
        let loader = PackageMetadataLoader::new(&runtime, &config);
        let pkg = loader.load(&dir, "left-pad", Tier::Registry);

        assert!(!pkg.is_valid());
        assert_eq!(pkg.errors.len(), 1);
        assert!(pkg.errors[0].to_string().contains("missing descriptor"));
        assert!(pkg.files.is_empty());
        assert!(pkg.exports.is_empty());
    }

    #[test]
    fn test_malformed_descriptor_is_single_error() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/app/node_modules/broken");
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .times(1)
            .returning(|_| Ok("{ \"name\": ".to_string()));
        runtime.expect_read_dir().never();

        let config = ResolverConfig::new("/app");
        let loader = PackageMetadataLoader::new(&runtime, &config);
        let pkg = loader.load(&dir, "broken", Tier::Registry);

        assert!(!pkg.is_valid());
        assert_eq!(pkg.errors.len(), 1);
        assert_eq!(pkg.errors[0].kind(), "invalid-descriptor");
        assert!(pkg.descriptor.is_none());
    }

    #[test]
    fn test_load_real_package() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        fs::write(
            dir.join("package.json"),
            r#"{
                "name": "widgets",
                "version": "2.1.0",
                "dependencies": { "left-pad": "^1.0.0" },
                "peerDependencies": { "react": "*" }
            }"#,
        )
        .unwrap();
        fs::write(dir.join("index.js"), "export {}").unwrap();
        fs::create_dir_all(dir.join("lib")).unwrap();
        fs::write(dir.join("lib/button.js"), "").unwrap();
        fs::write(dir.join("yarn.lock"), "").unwrap();

        let config = ResolverConfig::new(dir);
        let loader = PackageMetadataLoader::new(&RealRuntime, &config);
        let pkg = loader.load(dir, "@builtin/widgets", Tier::Builtin);

        assert!(pkg.is_valid(), "errors: {:?}", pkg.errors);
        assert_eq!(pkg.status, PackageStatus::Resolved);
        assert_eq!(pkg.version(), "2.1.0");
        assert_eq!(pkg.dependencies, vec!["left-pad", "react"]);
        assert_eq!(pkg.exports.get("Button").unwrap(), "lib/button.js");
        assert_eq!(pkg.exports.get("default").unwrap(), "index.js");
        assert_eq!(pkg.files.len(), 3);
        assert!(pkg.warnings.is_empty());
    }

    #[test]
    fn test_structural_problems_make_package_invalid() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{ "version": "1.0.0", "type": "amd" }"#,
        )
        .unwrap();

        let config = ResolverConfig::new(tmp.path());
        let loader = PackageMetadataLoader::new(&RealRuntime, &config);
        let pkg = loader.load(tmp.path(), "./nameless", Tier::Local);

        assert!(!pkg.is_valid());
        assert!(pkg.descriptor.is_some());
        assert_eq!(pkg.errors.len(), 2);
        assert!(
            pkg.errors
                .iter()
                .all(|e| e.kind() == "structural-validation")
        );
        assert!(pkg.warnings.iter().any(|w| w.contains("main entry")));
    }
}
