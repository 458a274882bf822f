//! Bundler Gemfile parser.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ExtractResult;

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

static GEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^gem\s+["']([^"']+)["']\s*(?:,\s*(.+))?$"#).unwrap());

static GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^group\s+(.+?)\s+do\s*$").unwrap());

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^["']([^"']+)["']"#).unwrap());

/// Parser for Gemfile.
pub struct GemfileParser;

impl GemfileParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_gemfile(&self, content: &str, manifest_path: &str) -> ManifestSignal {
        let mut signal = ManifestSignal::new(Ecosystem::Bundler, manifest_path);
        // one entry per open `do` block: whether it is a dev-only group
        let mut blocks: Vec<bool> = Vec::new();

        for raw in content.lines() {
            let line = raw.split(" #").next().unwrap_or(raw).trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(caps) = GROUP.captures(line) {
                blocks.push(is_dev_group(&caps[1]));
                continue;
            }
            if line.ends_with(" do") || line.contains(" do |") {
                blocks.push(blocks.last().copied().unwrap_or(false));
                continue;
            }
            if line == "end" {
                blocks.pop();
                continue;
            }
            if line == "gemspec" || line.starts_with("gemspec ") {
                signal.library = true;
                continue;
            }

            if let Some(caps) = GEM.captures(line) {
                let name = caps[1].to_string();
                let options = caps.get(2).map_or("", |m| m.as_str());
                let version = QUOTED
                    .captures(options.trim())
                    .map(|c| c[1].to_string())
                    .unwrap_or_else(|| "*".to_string());
                let dev_inline = options.contains("group:") && is_dev_group(options);
                let in_dev_block = blocks.iter().any(|dev| *dev);

                if dev_inline || in_dev_block {
                    signal.dev_dependencies.insert(name, version);
                } else {
                    signal.declared_dependencies.insert(name, version);
                }
            }
        }

        signal
    }
}

fn is_dev_group(groups: &str) -> bool {
    groups.contains(":development") || groups.contains(":test")
}

impl Default for GemfileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for GemfileParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Bundler
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        Ok(self.parse_gemfile(content, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rails_gemfile() {
        let content = r#"
source "https://rubygems.org"

ruby "3.3.0"

gem "rails", "~> 7.1.2"
gem "pg", "~> 1.1"
gem "puma", ">= 5.0" # web server
gem "bootsnap", require: false

group :development, :test do
  gem "rspec-rails"
  gem "debug", platforms: %i[ mri windows ]
end

gem "rubocop", group: :development
"#;
        let signal = GemfileParser::new().parse("Gemfile", content).unwrap();

        assert_eq!(signal.declared_dependencies["rails"], "~> 7.1.2");
        assert_eq!(signal.declared_dependencies["bootsnap"], "*");
        assert!(signal.dev_dependencies.contains_key("rspec-rails"));
        assert!(signal.dev_dependencies.contains_key("debug"));
        assert!(signal.dev_dependencies.contains_key("rubocop"));
        assert!(!signal.has_dependency("ruby"));
        assert!(!signal.library);
    }

    #[test]
    fn test_gemspec_marks_library() {
        let content = "source 'https://rubygems.org'\ngemspec\n";
        let signal = GemfileParser::new().parse("Gemfile", content).unwrap();
        assert!(signal.library);
    }
}
