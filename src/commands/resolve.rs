use anyhow::Result;
use log::debug;

use crate::config::ResolverConfig;
use crate::report::Report;
use crate::runtime::Runtime;

use super::{ImportSource, ensure_no_errors, run_resolution};

/// Resolve the given imports and print a report, or the resolution map as JSON.
#[tracing::instrument(skip(runtime, config, source))]
pub fn resolve<R: Runtime>(
    runtime: R,
    config: &ResolverConfig,
    source: &ImportSource,
    json: bool,
) -> Result<()> {
    debug!("Resolving from {:?} ({:?})", config.project_root, config.mode);
    let result = run_resolution(&runtime, config, source)?;

    if json {
        println!("{}", result.to_map().to_json()?);
    } else {
        println!("{}", Report::new(&result));
    }

    ensure_no_errors(&result)
}
