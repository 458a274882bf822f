//! .NET SDK-style project file parser (.csproj / .fsproj).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ExtractResult;

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

const PROJECT_EXTENSIONS: &[&str] = &[".csproj", ".fsproj"];

/// Parser for MSBuild project files.
pub struct DotnetParser;

impl DotnetParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_project(&self, content: &str, manifest_path: &str) -> ExtractResult<ManifestSignal> {
        let mut signal = ManifestSignal::new(Ecosystem::Nuget, manifest_path);
        let mut reader = Reader::from_str(content);
        let mut buf = Vec::new();

        let mut current_tag: Option<String> = None;
        // PackageReference whose Version arrives as a child element
        let mut open_reference: Option<(String, bool)> = None;
        let mut output_type: Option<String> = None;
        let mut assembly_name: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    match name.as_str() {
                        "Project" => read_sdk(&e, &mut signal),
                        "PackageReference" => {
                            let (include, version) = reference_attributes(&e);
                            if let Some(include) = include {
                                let dev = is_dev_package(&include);
                                match version {
                                    Some(v) => insert(&mut signal, include, v, dev),
                                    None => open_reference = Some((include, dev)),
                                }
                            }
                        }
                        _ => {}
                    }
                    current_tag = Some(name);
                }
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    match name.as_str() {
                        "Project" => read_sdk(&e, &mut signal),
                        "PackageReference" => {
                            if let (Some(include), version) = reference_attributes(&e) {
                                let dev = is_dev_package(&include);
                                let version = version.unwrap_or_else(|| "*".to_string());
                                insert(&mut signal, include, version, dev);
                            }
                        }
                        _ => {}
                    }
                }
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if name == "PackageReference" {
                        if let Some((include, dev)) = open_reference.take() {
                            insert(&mut signal, include, "*".to_string(), dev);
                        }
                    }
                    current_tag = None;
                }
                Event::Text(t) => {
                    let text = reader
                        .decoder()
                        .decode(t.as_ref())
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    match current_tag.as_deref() {
                        Some("Version") if open_reference.is_some() && !text.is_empty() => {
                            if let Some((include, dev)) = open_reference.take() {
                                insert(&mut signal, include, text, dev);
                            }
                        }
                        Some("Version") if !text.is_empty() => signal.version = Some(text),
                        Some("OutputType") => output_type = Some(text),
                        Some("AssemblyName") if !text.is_empty() => assembly_name = Some(text),
                        // UI stacks are switched on by project properties, not packages
                        Some(tag @ ("UseWPF" | "UseWindowsForms" | "UseMaui"))
                            if text.eq_ignore_ascii_case("true") =>
                        {
                            signal.plugins.push(tag.to_string())
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let stem = project_stem(manifest_path).to_string();
        signal.name = Some(assembly_name.unwrap_or(stem));

        let is_web_sdk = signal.plugins.iter().any(|p| p.starts_with("Microsoft.NET.Sdk.Web"));
        match output_type.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("exe") | Some("winexe") => signal.binaries = signal.name.iter().cloned().collect(),
            Some("library") => signal.library = true,
            // the plain SDK defaults to a class library, the web SDK to an app
            None if !is_web_sdk => signal.library = true,
            _ => {}
        }

        Ok(signal)
    }
}

fn read_sdk(e: &BytesStart<'_>, signal: &mut ManifestSignal) {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"Sdk" {
            signal
                .plugins
                .push(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
}

fn reference_attributes(e: &BytesStart<'_>) -> (Option<String>, Option<String>) {
    let mut include = None;
    let mut version = None;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"Include" => include = Some(value),
            b"Version" => version = Some(value),
            _ => {}
        }
    }
    (include, version)
}

fn insert(signal: &mut ManifestSignal, name: String, version: String, dev: bool) {
    if dev {
        signal.dev_dependencies.insert(name, version);
    } else {
        signal.declared_dependencies.insert(name, version);
    }
}

/// Test SDKs and runners only ever appear in test projects.
fn is_dev_package(name: &str) -> bool {
    matches!(
        name,
        "Microsoft.NET.Test.Sdk" | "xunit" | "xunit.runner.visualstudio" | "NUnit" | "NUnit3TestAdapter"
            | "MSTest.TestFramework" | "MSTest.TestAdapter" | "coverlet.collector" | "Moq"
            | "FluentAssertions"
    )
}

fn project_stem(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    PROJECT_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .unwrap_or(file_name)
}

pub fn is_project_file(file_name: &str) -> bool {
    PROJECT_EXTENSIONS
        .iter()
        .any(|ext| file_name.len() > ext.len() && file_name.ends_with(ext))
}

impl Default for DotnetParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for DotnetParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Nuget
    }

    fn can_handle(&self, file_name: &str) -> bool {
        is_project_file(file_name)
    }

    fn priority(&self, file_name: &str) -> usize {
        if file_name.ends_with(".csproj") {
            0
        } else if file_name.ends_with(".fsproj") {
            1
        } else {
            usize::MAX
        }
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        self.parse_project(content, path)
    }
}
