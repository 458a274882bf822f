//! Cargo/Rust manifest parser.

use std::collections::BTreeMap;

use crate::error::{ExtractError, ExtractResult};

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

/// Parser for Cargo.toml.
pub struct CargoParser;

impl CargoParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_cargo_toml(&self, content: &str, manifest_path: &str) -> ExtractResult<ManifestSignal> {
        let toml_value: toml::Value = toml::from_str(content)?;
        if toml_value.get("package").is_none() && toml_value.get("workspace").is_none() {
            return Err(ExtractError::Invalid(
                "Cargo.toml has neither [package] nor [workspace]".to_string(),
            ));
        }

        let mut signal = ManifestSignal::new(Ecosystem::Cargo, manifest_path);

        if let Some(package) = toml_value.get("package") {
            signal.name = package.get("name").and_then(|v| v.as_str()).map(String::from);
            signal.version = package.get("version").and_then(|v| v.as_str()).map(String::from);
        }

        if let Some(dependencies) = toml_value.get("dependencies") {
            parse_dependencies_table(dependencies, &mut signal.declared_dependencies);
        }
        for section in ["dev-dependencies", "build-dependencies"] {
            if let Some(table) = toml_value.get(section) {
                parse_dependencies_table(table, &mut signal.dev_dependencies);
            }
        }

        // [target.'cfg(...)'.dependencies]
        if let Some(targets) = toml_value.get("target").and_then(|t| t.as_table()) {
            for target in targets.values() {
                if let Some(deps) = target.get("dependencies") {
                    parse_dependencies_table(deps, &mut signal.declared_dependencies);
                }
                if let Some(deps) = target.get("dev-dependencies") {
                    parse_dependencies_table(deps, &mut signal.dev_dependencies);
                }
            }
        }

        if let Some(bins) = toml_value.get("bin").and_then(|b| b.as_array()) {
            for bin in bins {
                if let Some(name) = bin.get("name").and_then(|n| n.as_str()) {
                    signal.binaries.push(name.to_string());
                }
            }
        }
        signal.binaries.sort();
        signal.binaries.dedup();

        signal.library = toml_value.get("lib").is_some();

        // [package.metadata.scripts], as read by cargo-run-script
        if let Some(scripts) = toml_value
            .get("package")
            .and_then(|p| p.get("metadata"))
            .and_then(|m| m.get("scripts"))
            .and_then(|s| s.as_table())
        {
            for (name, cmd) in scripts {
                if let Some(cmd) = cmd.as_str() {
                    signal.declared_scripts.insert(name.clone(), cmd.to_string());
                }
            }
        }

        Ok(signal)
    }
}

/// Parses a dependencies table from Cargo.toml.
fn parse_dependencies_table(table: &toml::Value, out: &mut BTreeMap<String, String>) {
    let Some(map) = table.as_table() else {
        return;
    };

    for (name, value) in map {
        let version = match value {
            // Simple version string: dependency = "1.0"
            toml::Value::String(v) => v.clone(),
            // Table with version: dependency = { version = "1.0", features = [...] }
            toml::Value::Table(t) => {
                if let Some(v) = t.get("version").and_then(|v| v.as_str()) {
                    v.to_string()
                } else if t.contains_key("path") {
                    "path".to_string()
                } else if t.contains_key("git") {
                    "git".to_string()
                } else if t.get("workspace").and_then(|w| w.as_bool()) == Some(true) {
                    "workspace".to_string()
                } else {
                    "*".to_string()
                }
            }
            _ => "*".to_string(),
        };

        out.insert(name.clone(), version);
    }
}

impl Default for CargoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for CargoParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Cargo
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        self.parse_cargo_toml(content, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_cargo_toml() {
        let parser = CargoParser::new();
        let content = r#"
[package]
name = "test-crate"
version = "0.1.0"

[dependencies]
serde = "1.0"
tokio = { version = "1.0", features = ["full"] }
local = { path = "../local" }

[dev-dependencies]
tempfile = "3.0"

[build-dependencies]
cc = "1.0"
"#;

        let signal = parser.parse("Cargo.toml", content).unwrap();

        assert_eq!(signal.name.as_deref(), Some("test-crate"));
        assert_eq!(signal.version.as_deref(), Some("0.1.0"));
        assert_eq!(signal.declared_dependencies.len(), 3);
        assert_eq!(signal.declared_dependencies["tokio"], "1.0");
        assert_eq!(signal.declared_dependencies["local"], "path");
        assert_eq!(signal.dev_dependencies.len(), 2);
        assert!(signal.dev_dependencies.contains_key("cc"));
        assert!(!signal.library);
    }

    #[test]
    fn test_parse_bins_and_lib() {
        let parser = CargoParser::new();
        let content = r#"
[package]
name = "tool"

[lib]
path = "src/lib.rs"

[[bin]]
name = "tool-server"

[[bin]]
name = "tool-cli"
"#;

        let signal = parser.parse("Cargo.toml", content).unwrap();
        assert!(signal.library);
        assert_eq!(signal.binaries, vec!["tool-cli", "tool-server"]);
    }

    #[test]
    fn test_parse_workspace_root() {
        let parser = CargoParser::new();
        let content = r#"
[workspace]
members = ["crates/*"]
"#;
        let signal = parser.parse("Cargo.toml", content).unwrap();
        assert!(signal.name.is_none());
        assert_eq!(signal.dependency_count(), 0);
    }

    #[test]
    fn test_parse_target_dependencies() {
        let parser = CargoParser::new();
        let content = r#"
[package]
name = "x"

[target.'cfg(unix)'.dependencies]
libc = "0.2"
"#;
        let signal = parser.parse("Cargo.toml", content).unwrap();
        assert_eq!(signal.declared_dependencies["libc"], "0.2");
    }

    #[test]
    fn test_invalid_cargo_toml() {
        let parser = CargoParser::new();
        assert!(parser.parse("Cargo.toml", "[package\nname=").is_err());
        assert!(parser.parse("Cargo.toml", "[dependencies]\nserde = \"1\"").is_err());
    }
}
