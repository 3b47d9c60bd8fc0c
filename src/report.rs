//! Human-readable rendering of a resolution and, optionally, its materialization.

use std::fmt;

use crate::materialize::MaterializationSummary;
use crate::package::ResolvedPackage;
use crate::resolver::ResolutionResult;
use crate::specifier::Tier;

pub struct Report<'a> {
    result: &'a ResolutionResult,
    summary: Option<&'a MaterializationSummary>,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a ResolutionResult) -> Self {
        Self {
            result,
            summary: None,
        }
    }

    pub fn with_materialization(mut self, summary: &'a MaterializationSummary) -> Self {
        self.summary = Some(summary);
        self
    }
}

/// What to do about a package that could not be located.
pub fn remediation_hint(pkg: &ResolvedPackage) -> String {
    match pkg.tier {
        Tier::Builtin => format!(
            "check that the SDK providing {} is installed at {}",
            pkg.name,
            pkg.dir.display()
        ),
        Tier::Registry => format!("run `npm install {}`", pkg.name),
        Tier::Local => format!(
            "check the relative path {} (expected {})",
            pkg.name,
            pkg.dir.display()
        ),
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;

        writeln!(f, "Resolved {} package(s):", result.packages.len())?;
        for pkg in result.packages.values() {
            let marker = if pkg.is_degraded() {
                " (stub)"
            } else if !pkg.is_valid() {
                " (invalid)"
            } else {
                ""
            };
            writeln!(
                f,
                "  {} [{}] {} - {} file(s){}",
                pkg.name,
                pkg.tier,
                pkg.version(),
                pkg.files.len(),
                marker
            )?;
        }

        let degraded: Vec<_> = result.degraded().collect();
        if !degraded.is_empty() {
            writeln!(f, "\nMissing packages:")?;
            for pkg in degraded {
                writeln!(f, "  {} (expected at {})", pkg.name, pkg.dir.display())?;
                writeln!(f, "    hint: {}", remediation_hint(pkg))?;
            }
        }

        if !result.errors.is_empty() {
            writeln!(f, "\nErrors:")?;
            for err in &result.errors {
                writeln!(f, "  [{}] {}", err.kind(), err)?;
            }
        }

        if !result.warnings.is_empty() {
            writeln!(f, "\nWarnings:")?;
            for warning in &result.warnings {
                writeln!(f, "  {}", warning)?;
            }
        }

        if let Some(summary) = self.summary {
            writeln!(f, "\nMaterialized:")?;
            for record in &summary.records {
                let status = match (&record.error, record.success) {
                    (Some(err), _) => format!("failed: {}", err),
                    (None, true) if record.destination.is_none() => "skipped".to_string(),
                    (None, true) => format!(
                        "{} file(s), {} bytes -> {}",
                        record.copied_files.len(),
                        record.total_bytes,
                        record
                            .destination
                            .as_deref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default()
                    ),
                    (None, false) => "failed".to_string(),
                };
                writeln!(f, "  {}: {}", record.name, status)?;
                for name in &record.skipped_duplicates {
                    writeln!(f, "    duplicate {} not copied", name)?;
                }
            }
            writeln!(
                f,
                "{} attempted, {} succeeded, {} failed, {} file(s), {} bytes in {:?}",
                summary.attempted,
                summary.succeeded,
                summary.failed,
                summary.total_files,
                summary.total_bytes,
                summary.duration
            )?;
        }

        write!(
            f,
            "\n{} file(s) total, resolved in {:?}",
            result.files.len(),
            result.elapsed
        )
    }
}
