//! Composer (PHP) manifest parser.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ExtractResult;

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

/// Parser for composer.json.
pub struct ComposerParser;

impl ComposerParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_composer_json(&self, content: &str, manifest_path: &str) -> ExtractResult<ManifestSignal> {
        let composer: ComposerJson = serde_json::from_str(content)?;

        let mut signal = ManifestSignal::new(Ecosystem::Composer, manifest_path);
        signal.name = composer.name;
        signal.version = composer.version;

        signal.declared_dependencies = composer
            .require
            .into_iter()
            .filter(|(name, _)| !is_platform_package(name))
            .collect();
        signal.dev_dependencies = composer
            .require_dev
            .into_iter()
            .filter(|(name, _)| !is_platform_package(name))
            .collect();

        for (name, script) in composer.scripts {
            let command = match script {
                serde_json::Value::String(s) => s,
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .collect::<Vec<_>>()
                    .join(" && "),
                _ => continue,
            };
            signal.declared_scripts.insert(name, command);
        }

        signal.binaries = composer
            .bin
            .iter()
            .map(|b| b.rsplit('/').next().unwrap_or(b).to_string())
            .collect();
        signal.binaries.sort();

        signal.library = composer.package_type.as_deref() == Some("library");

        Ok(signal)
    }
}

/// `php` and `ext-*` constrain the runtime, not packages.
fn is_platform_package(name: &str) -> bool {
    name == "php" || name.starts_with("ext-") || name.starts_with("lib-")
}

impl Default for ComposerParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for ComposerParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Composer
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        self.parse_composer_json(content, path)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ComposerJson {
    name: Option<String>,
    version: Option<String>,
    #[serde(rename = "type")]
    package_type: Option<String>,
    #[serde(default)]
    require: BTreeMap<String, String>,
    #[serde(default)]
    require_dev: BTreeMap<String, String>,
    #[serde(default)]
    scripts: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    bin: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_laravel_composer() {
        let content = r#"
{
    "name": "laravel/laravel",
    "type": "project",
    "require": {
        "php": "^8.2",
        "ext-json": "*",
        "laravel/framework": "^11.0"
    },
    "require-dev": {
        "phpunit/phpunit": "^11.0"
    },
    "scripts": {
        "post-update-cmd": ["@php artisan vendor:publish --tag=laravel-assets", "@php artisan optimize"],
        "test": "phpunit"
    }
}
"#;
        let signal = ComposerParser::new().parse("composer.json", content).unwrap();

        assert_eq!(signal.declared_dependencies.len(), 1);
        assert!(signal.has_dependency("laravel/framework"));
        assert!(signal.dev_dependencies.contains_key("phpunit/phpunit"));
        assert_eq!(signal.declared_scripts["test"], "phpunit");
        assert!(signal.declared_scripts["post-update-cmd"].contains(" && "));
        assert!(!signal.library);
    }

    #[test]
    fn test_library_and_bin() {
        let content = r#"{"name": "acme/tool", "type": "library", "bin": ["bin/acme"]}"#;
        let signal = ComposerParser::new().parse("composer.json", content).unwrap();
        assert!(signal.library);
        assert_eq!(signal.binaries, vec!["acme"]);
    }
}
