use anyhow::Result;
use log::{debug, warn};

use crate::config::{MaterializeOptions, ResolverConfig};
use crate::materialize::Materializer;
use crate::report::Report;
use crate::runtime::Runtime;

use super::{ImportSource, ensure_no_errors, run_resolution};

/// Resolve the given imports and copy every package into `options.output_root`.
#[tracing::instrument(skip(runtime, config, source, options))]
pub fn install<R: Runtime>(
    runtime: R,
    config: &ResolverConfig,
    source: &ImportSource,
    options: &MaterializeOptions,
) -> Result<()> {
    let result = run_resolution(&runtime, config, source)?;

    if result.has_errors() && config.mode.is_strict() {
        println!("{}", Report::new(&result));
        return ensure_no_errors(&result);
    }

    debug!("Materializing into {:?}", options.output_root);
    let materializer = Materializer::new(&runtime, options, &config.namespace_prefix());
    let summary = materializer.materialize(&result)?;

    println!("{}", Report::new(&result).with_materialization(&summary));

    if summary.failed > 0 && !options.mode.is_strict() {
        warn!("{} package(s) failed to materialize", summary.failed);
    }
    summary.check(options.mode)?;
    ensure_no_errors(&result)
}
