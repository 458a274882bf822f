//! NPM/Node.js manifest parser.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ExtractResult;

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

/// Parser for package.json.
pub struct NpmParser;

impl NpmParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_package_json(&self, content: &str, manifest_path: &str) -> ExtractResult<ManifestSignal> {
        let pkg: PackageJson = serde_json::from_str(content)?;

        let mut signal = ManifestSignal::new(Ecosystem::Npm, manifest_path);
        signal.name = pkg.name.clone();
        signal.version = pkg.version;

        for deps in [pkg.dependencies, pkg.peer_dependencies, pkg.optional_dependencies]
            .into_iter()
            .flatten()
        {
            for (name, spec) in deps {
                signal
                    .declared_dependencies
                    .entry(name)
                    .or_insert_with(|| version_spec(&spec));
            }
        }
        if let Some(dev) = pkg.dev_dependencies {
            signal.dev_dependencies = dev
                .into_iter()
                .map(|(name, spec)| (name, version_spec(&spec)))
                .collect();
        }

        signal.declared_scripts = pkg.scripts.unwrap_or_default();

        // "bin": "cli.js" names the binary after the package
        match pkg.bin {
            Some(serde_json::Value::String(_)) => {
                if let Some(name) = pkg.name.as_deref() {
                    signal.binaries.push(bare_package_name(name).to_string());
                }
            }
            Some(serde_json::Value::Object(map)) => {
                signal.binaries.extend(map.keys().cloned());
            }
            _ => {}
        }
        signal.binaries.sort();

        signal.library = pkg.exports.is_some() || pkg.module.is_some() || pkg.types.is_some()
            || (pkg.main.is_some() && pkg.private != Some(true));

        Ok(signal)
    }
}

impl Default for NpmParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for NpmParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        self.parse_package_json(content, path)
    }
}

/// `@scope/tool` installs a binary called `tool`.
fn bare_package_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn version_spec(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Minimal representation of package.json
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    private: Option<bool>,
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    types: Option<String>,
    #[serde(default)]
    exports: Option<serde_json::Value>,
    #[serde(default)]
    bin: Option<serde_json::Value>,
    #[serde(default)]
    scripts: Option<BTreeMap<String, String>>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    dev_dependencies: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    peer_dependencies: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    optional_dependencies: Option<BTreeMap<String, serde_json::Value>>,
}
