use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ResolutionMode;
use crate::error::ResolveError;
use crate::package::ResolvedPackage;

/// Findings of the post-resolution pass.
#[derive(Debug, Default, PartialEq)]
pub struct Validation {
    pub errors: Vec<ResolveError>,
    pub warnings: Vec<String>,
}

/// Structural checks over every resolved package.
///
/// - invalid packages have their own errors re-emitted; tolerant mode
///   reports them as warnings and the package keeps its `Failed` status
/// - an empty export map is a warning, the main entry may still be usable
/// - more than `max_files` files is an advisory warning
pub fn validate(
    packages: &BTreeMap<String, Arc<ResolvedPackage>>,
    max_files: usize,
    mode: ResolutionMode,
) -> Validation {
    let mut validation = Validation::default();

    for (name, package) in packages {
        if !package.is_valid() {
            let mut errors = package.errors.clone();
            if errors.is_empty() {
                errors.push(ResolveError::StructuralValidation {
                    name: name.clone(),
                    reason: "package has no descriptor".to_string(),
                });
            }
            if mode.is_strict() {
                validation.errors.extend(errors);
            } else {
                validation
                    .warnings
                    .extend(errors.iter().map(|e| format!("{}; package skipped", e)));
            }
            continue;
        }

        // stubs were already reported when they were substituted
        if package.is_degraded() {
            continue;
        }

        if package.exports.is_empty() {
            validation
                .warnings
                .push(format!("{} has no exports; only its main entry is usable", name));
        }

        if package.files.len() > max_files {
            validation.warnings.push(format!(
                "{} has {} files (threshold {}); consider trimming what it ships",
                name,
                package.files.len(),
                max_files
            ));
        }

        for warning in &package.warnings {
            validation.warnings.push(format!("{}: {}", name, warning));
        }
    }

    validation
}
