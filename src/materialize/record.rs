use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ResolutionMode;
use crate::error::ResolveError;

/// Outcome of copying one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializationRecord {
    pub name: String,
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    /// Destination-relative paths in copy order.
    pub copied_files: Vec<PathBuf>,
    pub total_bytes: u64,
    pub success: bool,
    pub error: Option<ResolveError>,
    pub warnings: Vec<String>,
    /// Embedded package names not copied because another copy exists.
    pub skipped_duplicates: Vec<String>,
}

impl MaterializationRecord {
    pub fn new(name: &str, source: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            source,
            destination: None,
            copied_files: Vec::new(),
            total_bytes: 0,
            success: false,
            error: None,
            warnings: Vec::new(),
            skipped_duplicates: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, error: ResolveError) {
        self.success = false;
        self.error = Some(error);
    }
}

/// Totals for one `materialize` call. Records are ordered by package name.
#[derive(Debug, Clone, Default)]
pub struct MaterializationSummary {
    pub records: Vec<MaterializationRecord>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_bytes: u64,
    pub total_files: usize,
    pub duration: Duration,
}

impl MaterializationSummary {
    pub fn from_records(records: Vec<MaterializationRecord>, duration: Duration) -> Self {
        let succeeded = records.iter().filter(|r| r.success).count();
        Self {
            attempted: records.len(),
            succeeded,
            failed: records.len() - succeeded,
            total_bytes: records.iter().map(|r| r.total_bytes).sum(),
            total_files: records.iter().map(|r| r.copied_files.len()).sum(),
            duration,
            records,
        }
    }

    pub fn get(&self, name: &str) -> Option<&MaterializationRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ResolveError> {
        self.records.iter().filter_map(|r| r.error.as_ref())
    }

    /// In strict mode, any failed package fails the whole run.
    pub fn check(&self, mode: ResolutionMode) -> Result<()> {
        if mode.is_strict()
            && let Some(err) = self.errors().next()
        {
            return Err(err.clone().into());
        }
        Ok(())
    }
}
