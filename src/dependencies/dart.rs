//! Dart/Flutter pubspec parser.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ExtractResult;

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

/// Parser for pubspec.yaml.
pub struct PubspecParser;

impl PubspecParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_pubspec(&self, content: &str, manifest_path: &str) -> ExtractResult<ManifestSignal> {
        let pubspec: Pubspec = serde_yaml::from_str(content)?;

        let mut signal = ManifestSignal::new(Ecosystem::Pub, manifest_path);
        signal.name = pubspec.name;
        signal.version = pubspec.version.as_ref().and_then(scalar_string);
        signal.declared_dependencies = version_map(pubspec.dependencies);
        signal.dev_dependencies = version_map(pubspec.dev_dependencies);
        signal.binaries = pubspec.executables.into_keys().collect();

        // `publish_to: none` marks an application package
        let is_app = pubspec.publish_to.as_deref() == Some("none");
        signal.library = !is_app && signal.binaries.is_empty() && signal.name.is_some();

        Ok(signal)
    }
}

fn version_map(deps: BTreeMap<String, serde_yaml::Value>) -> BTreeMap<String, String> {
    deps.into_iter()
        .map(|(name, value)| {
            let spec = match &value {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Mapping(m) => {
                    if m.contains_key("sdk") {
                        "sdk".to_string()
                    } else if m.contains_key("path") {
                        "path".to_string()
                    } else if m.contains_key("git") {
                        "git".to_string()
                    } else if let Some(v) = m.get("version").and_then(|v| v.as_str()) {
                        v.to_string()
                    } else {
                        "*".to_string()
                    }
                }
                _ => "*".to_string(),
            };
            (name, spec)
        })
        .collect()
}

/// `version: 1.0` parses as a float; keep it as written.
fn scalar_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Default for PubspecParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for PubspecParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pub
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        self.parse_pubspec(content, path)
    }
}

#[derive(Debug, Deserialize)]
struct Pubspec {
    name: Option<String>,
    version: Option<serde_yaml::Value>,
    publish_to: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    executables: BTreeMap<String, serde_yaml::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flutter_app() {
        let content = r#"
name: shop_app
description: A new Flutter project.
publish_to: 'none'
version: 1.0.0+1

environment:
  sdk: '>=3.2.0 <4.0.0'

dependencies:
  flutter:
    sdk: flutter
  provider: ^6.1.1
  local_pkg:
    path: ../local_pkg

dev_dependencies:
  flutter_test:
    sdk: flutter
  flutter_lints: ^3.0.0

flutter:
  uses-material-design: true
"#;
        let signal = PubspecParser::new().parse("pubspec.yaml", content).unwrap();

        assert_eq!(signal.name.as_deref(), Some("shop_app"));
        assert_eq!(signal.declared_dependencies["flutter"], "sdk");
        assert_eq!(signal.declared_dependencies["provider"], "^6.1.1");
        assert_eq!(signal.declared_dependencies["local_pkg"], "path");
        assert!(signal.dev_dependencies.contains_key("flutter_test"));
        assert!(!signal.library);
    }

    #[test]
    fn test_dart_package_with_executable() {
        let content = "name: tool\nversion: 0.1.0\nexecutables:\n  tool:\n";
        let signal = PubspecParser::new().parse("pubspec.yaml", content).unwrap();
        assert_eq!(signal.binaries, vec!["tool"]);
        assert!(!signal.library);

        let content = "name: pkg\nversion: 0.1.0\n";
        let signal = PubspecParser::new().parse("pubspec.yaml", content).unwrap();
        assert!(signal.library);
    }

    #[test]
    fn test_malformed_pubspec() {
        assert!(PubspecParser::new().parse("pubspec.yaml", "name: [unclosed").is_err());
    }
}
