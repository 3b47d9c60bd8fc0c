use anyhow::Result;

use crate::config::ResolverConfig;
use crate::runtime::Runtime;
use crate::specifier::{Tier, package_name};

use super::{ImportSource, run_resolution};

/// Check whether a package exports `symbol`. Fails when it does not.
#[tracing::instrument(skip(runtime, config))]
pub fn check_export<R: Runtime>(
    runtime: R,
    config: &ResolverConfig,
    package: &str,
    symbol: &str,
) -> Result<()> {
    let prefix = config.namespace_prefix();
    let tier = Tier::classify(package, &prefix);
    let name = package_name(package, tier, &prefix).to_string();

    let source = ImportSource::new(vec![name.clone()], None);
    let map = run_resolution(&runtime, config, &source)?.to_map();

    if map.exports_symbol(&name, symbol) {
        println!("{} exports {}", name, symbol);
        Ok(())
    } else {
        let available = map
            .get(&name)
            .map(|entry| entry.exports.keys().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        anyhow::bail!(
            "Package {} does not export {} (available: {})",
            name,
            symbol,
            if available.is_empty() { "none" } else { available.as_str() }
        )
    }
}
