//! Go module manifest parser.

use crate::error::{ExtractError, ExtractResult};

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

/// Parser for go.mod.
pub struct GoModParser;

impl GoModParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_go_mod(&self, content: &str, manifest_path: &str) -> ExtractResult<ManifestSignal> {
        let mut signal = ManifestSignal::new(Ecosystem::Go, manifest_path);
        let mut in_require = false;

        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            if in_require {
                if line == ")" {
                    in_require = false;
                } else {
                    add_requirement(line, &mut signal);
                }
                continue;
            }

            if let Some(module) = line.strip_prefix("module ") {
                signal.name = Some(module.trim().trim_matches('"').to_string());
            } else if let Some(version) = line.strip_prefix("go ") {
                signal.version = Some(version.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("require") {
                let rest = rest.trim();
                if rest == "(" {
                    in_require = true;
                } else {
                    add_requirement(rest, &mut signal);
                }
            }
        }

        if signal.name.is_none() {
            return Err(ExtractError::Invalid("go.mod has no module directive".to_string()));
        }

        Ok(signal)
    }
}

/// Adds `path version [// indirect]`; indirect requirements are not declared
/// by the module itself and are left out.
fn add_requirement(line: &str, signal: &mut ManifestSignal) {
    if line.contains("// indirect") {
        return;
    }
    let line = line.split("//").next().unwrap_or(line);
    let mut parts = line.split_whitespace();
    if let (Some(path), Some(version)) = (parts.next(), parts.next()) {
        signal
            .declared_dependencies
            .insert(path.to_string(), version.to_string());
    }
}

impl Default for GoModParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for GoModParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        self.parse_go_mod(content, path)
    }
}
