//! Maven manifest parser.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractResult;

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

/// Parser for pom.xml.
pub struct MavenParser;

#[derive(Default)]
struct PendingDependency {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    scope: Option<String>,
}

impl MavenParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_pom(&self, content: &str, manifest_path: &str) -> ExtractResult<ManifestSignal> {
        let mut signal = ManifestSignal::new(Ecosystem::Maven, manifest_path);
        let mut reader = Reader::from_str(content);
        let mut buf = Vec::new();

        let mut path: Vec<String> = Vec::new();
        let mut pending = PendingDependency::default();
        let mut packaging: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if name == "dependency" {
                        pending = PendingDependency::default();
                    }
                    path.push(name);
                }
                Event::End(_) => {
                    if path_is(&path, &["project", "dependencies", "dependency"]) {
                        let dep = std::mem::take(&mut pending);
                        if let (Some(group), Some(artifact)) = (dep.group_id, dep.artifact_id) {
                            let key = format!("{}:{}", group, artifact);
                            let version = dep.version.unwrap_or_else(|| "*".to_string());
                            match dep.scope.as_deref() {
                                Some("test") | Some("provided") => {
                                    signal.dev_dependencies.insert(key, version);
                                }
                                _ => {
                                    signal.declared_dependencies.insert(key, version);
                                }
                            }
                        }
                    }
                    path.pop();
                }
                Event::Text(t) => {
                    let text = reader
                        .decoder()
                        .decode(t.as_ref())
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    let tag = path.last().map(String::as_str).unwrap_or("");
                    if text.is_empty() {
                        // whitespace between elements
                    } else if path_is(&path, &["project", "dependencies", "dependency", tag]) {
                        match tag {
                            "groupId" => pending.group_id = Some(text),
                            "artifactId" => pending.artifact_id = Some(text),
                            "version" => pending.version = Some(text),
                            "scope" => pending.scope = Some(text),
                            _ => {}
                        }
                    } else if path_is(&path, &["project", "artifactId"]) {
                        signal.name = Some(text);
                    } else if path_is(&path, &["project", "version"]) {
                        signal.version = Some(text);
                    } else if path_is(&path, &["project", "packaging"]) {
                        packaging = Some(text);
                    } else if path_is(&path, &["project", "build", "plugins", "plugin", "artifactId"]) {
                        signal.plugins.push(text);
                    } else if tag == "mainClass" {
                        signal.binaries.push(text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        signal.binaries.sort();
        signal.binaries.dedup();
        signal.library = matches!(packaging.as_deref(), None | Some("jar") | Some("bundle"))
            && signal.binaries.is_empty();

        Ok(signal)
    }
}

fn path_is(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

/// Module directories listed under `<modules>` of an aggregator pom.
pub fn pom_modules(content: &str) -> ExtractResult<Vec<String>> {
    let mut reader = Reader::from_str(content);
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut modules = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => path.push(String::from_utf8_lossy(e.name().as_ref()).to_string()),
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) if path_is(&path, &["project", "modules", "module"]) => {
                let text = reader.decoder().decode(t.as_ref()).unwrap_or_default();
                let text = text.trim();
                if !text.is_empty() {
                    modules.push(text.to_string());
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(modules)
}

impl Default for MavenParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for MavenParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        self.parse_pom(content, path)
    }
}
