use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Entry file used when a descriptor declares no `main`.
pub const DEFAULT_MAIN: &str = "index.js";

/// Module type tags a descriptor may declare.
pub const ALLOWED_TYPES: [&str; 2] = ["module", "commonjs"];

/// Export condition keys consulted, in order, when an exports entry is an
/// object rather than a file path.
const EXPORT_CONDITIONS: [&str; 3] = ["browser", "import", "default"];

/// Descriptor file as written on disk.
#[derive(Deserialize, Debug, Default)]
struct RawDescriptor {
    name: Option<String>,
    version: Option<String>,
    main: Option<String>,
    #[serde(rename = "type")]
    module_type: Option<String>,
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default, rename = "peerDependencies")]
    peer_dependencies: Map<String, Value>,
    exports: Option<Value>,
}

/// Parsed package metadata.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct Descriptor {
    pub name: Option<String>,
    pub version: String,
    pub main: String,
    pub module_type: Option<String>,
    /// Regular dependency names followed by peer names not already listed.
    pub dependencies: Vec<String>,
    /// Explicit export table with the leading `./` stripped from keys.
    pub exports: Option<BTreeMap<String, String>>,
}

impl Descriptor {
    /// Parse descriptor JSON. Returns the descriptor plus warnings for export
    /// entries that had to be dropped.
    pub fn parse(content: &str) -> Result<(Self, Vec<String>)> {
        let raw: RawDescriptor = serde_json::from_str(content)?;
        let mut warnings = Vec::new();

        let mut dependencies: Vec<String> = raw.dependencies.keys().cloned().collect();
        for peer in raw.peer_dependencies.keys() {
            if !dependencies.contains(peer) {
                dependencies.push(peer.clone());
            }
        }

        let exports = raw
            .exports
            .map(|value| parse_exports(value, &mut warnings));

        Ok((
            Descriptor {
                name: raw.name,
                version: raw.version.unwrap_or_else(|| "0.0.0".to_string()),
                main: raw.main.unwrap_or_else(|| DEFAULT_MAIN.to_string()),
                module_type: raw.module_type,
                dependencies,
                exports,
            },
            warnings,
        ))
    }

    /// Placeholder used when a package could not be located in tolerant mode.
    pub fn stub(name: &str) -> Self {
        Descriptor {
            name: Some(name.to_string()),
            version: "0.0.0".to_string(),
            main: DEFAULT_MAIN.to_string(),
            ..Default::default()
        }
    }

    /// Structural problems that make the package unusable even though its
    /// descriptor parsed.
    pub fn structural_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            problems.push("descriptor has no name".to_string());
        }
        if let Some(tag) = &self.module_type
            && !ALLOWED_TYPES.contains(&tag.as_str())
        {
            problems.push(format!(
                "unsupported type '{}' (expected one of: {})",
                tag,
                ALLOWED_TYPES.join(", ")
            ));
        }
        problems
    }
}

fn parse_exports(value: Value, warnings: &mut Vec<String>) -> BTreeMap<String, String> {
    let mut exports = BTreeMap::new();

    let table = match value {
        Value::String(file) => {
            exports.insert(".".to_string(), file);
            return exports;
        }
        Value::Object(table) => table,
        other => {
            warnings.push(format!("ignoring exports field of unexpected shape: {}", other));
            return exports;
        }
    };

    for (key, target) in table {
        let subpath = key.strip_prefix("./").unwrap_or(&key).to_string();
        let file = match &target {
            Value::String(file) => Some(file.clone()),
            Value::Object(conditions) => EXPORT_CONDITIONS
                .iter()
                .find_map(|c| conditions.get(*c).and_then(Value::as_str))
                .map(String::from),
            _ => None,
        };
        match file {
            Some(file) => {
                exports.entry(subpath).or_insert(file);
            }
            None => warnings.push(format!("ignoring export '{}': no usable file path", key)),
        }
    }

    exports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_descriptor() {
        let (d, warnings) = Descriptor::parse(
            r#"{
                "name": "widgets",
                "version": "1.2.0",
                "main": "lib/widgets.js",
                "type": "module",
                "dependencies": { "zeta": "^1", "alpha": "*" },
                "peerDependencies": { "alpha": "*", "react": ">=18" },
                "exports": { "./button": "./lib/button.js", ".": "./index.js" }
            }"#,
        )
        .unwrap();

        assert!(warnings.is_empty());
        assert_eq!(d.name.as_deref(), Some("widgets"));
        assert_eq!(d.version, "1.2.0");
        assert_eq!(d.main, "lib/widgets.js");
        // declaration order, regular before peer, no duplicates
        assert_eq!(d.dependencies, vec!["zeta", "alpha", "react"]);
        assert!(d.structural_problems().is_empty());
        let exports = d.exports.as_ref().unwrap();
        assert_eq!(exports.get("button").unwrap(), "./lib/button.js");
        assert_eq!(exports.get(".").unwrap(), "./index.js");
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let (d, _) = Descriptor::parse(r#"{ "name": "tiny" }"#).unwrap();
        assert_eq!(d.main, DEFAULT_MAIN);
        assert_eq!(d.version, "0.0.0");
        assert!(d.dependencies.is_empty());
        assert!(d.exports.is_none());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(Descriptor::parse("{ not json").is_err());
    }

    #[test]
    fn test_conditional_exports() {
        let (d, warnings) = Descriptor::parse(
            r#"{
                "name": "x",
                "exports": {
                    "./a": { "node": "./a.cjs", "import": "./a.mjs" },
                    "./b": { "node": "./b.cjs" },
                    "./c": 5
                }
            }"#,
        )
        .unwrap();
        let exports = d.exports.unwrap();
        assert_eq!(exports.get("a").unwrap(), "./a.mjs");
        assert!(!exports.contains_key("b"));
        assert!(!exports.contains_key("c"));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_string_exports_maps_root() {
        let (d, _) = Descriptor::parse(r#"{ "name": "x", "exports": "./main.js" }"#).unwrap();
        assert_eq!(d.exports.unwrap().get(".").unwrap(), "./main.js");
    }

    #[test]
    fn test_structural_problems() {
        let (d, _) = Descriptor::parse(r#"{ "version": "1.0.0", "type": "umd" }"#).unwrap();
        let problems = d.structural_problems();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("no name"));
        assert!(problems[1].contains("umd"));
    }
}
