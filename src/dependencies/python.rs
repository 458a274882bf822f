//! Python manifest parser: pyproject.toml, Pipfile and requirements.txt.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ExtractError, ExtractResult};

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

static REQUIREMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)\s*(\[[^\]]*\])?\s*(.*)$").unwrap()
});

/// Parser for the pip ecosystem. One parser handles all three formats;
/// the file name decides which.
pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_pyproject(&self, content: &str, path: &str) -> ExtractResult<ManifestSignal> {
        let doc: toml::Value = toml::from_str(content)?;
        let mut signal = ManifestSignal::new(Ecosystem::Pip, path);

        if let Some(project) = doc.get("project") {
            signal.name = str_field(project, "name");
            signal.version = str_field(project, "version");

            for req in string_array(project.get("dependencies")) {
                insert_requirement(&req, &mut signal.declared_dependencies);
            }
            if let Some(optional) = project.get("optional-dependencies").and_then(|o| o.as_table()) {
                for group in optional.values() {
                    for req in string_array(Some(group)) {
                        insert_requirement(&req, &mut signal.dev_dependencies);
                    }
                }
            }
            for section in ["scripts", "gui-scripts"] {
                if let Some(scripts) = project.get(section).and_then(|s| s.as_table()) {
                    for (name, target) in scripts {
                        if let Some(target) = target.as_str() {
                            signal.binaries.push(name.clone());
                            signal.declared_scripts.insert(name.clone(), target.to_string());
                        }
                    }
                }
            }
        }

        if let Some(groups) = doc.get("dependency-groups").and_then(|g| g.as_table()) {
            for group in groups.values() {
                for req in string_array(Some(group)) {
                    insert_requirement(&req, &mut signal.dev_dependencies);
                }
            }
        }

        if let Some(poetry) = doc.get("tool").and_then(|t| t.get("poetry")) {
            if signal.name.is_none() {
                signal.name = str_field(poetry, "name");
            }
            if signal.version.is_none() {
                signal.version = str_field(poetry, "version");
            }
            if let Some(deps) = poetry.get("dependencies") {
                parse_version_table(deps, &mut signal.declared_dependencies);
            }
            if let Some(deps) = poetry.get("dev-dependencies") {
                parse_version_table(deps, &mut signal.dev_dependencies);
            }
            if let Some(groups) = poetry.get("group").and_then(|g| g.as_table()) {
                for group in groups.values() {
                    if let Some(deps) = group.get("dependencies") {
                        parse_version_table(deps, &mut signal.dev_dependencies);
                    }
                }
            }
            if let Some(scripts) = poetry.get("scripts").and_then(|s| s.as_table()) {
                for (name, target) in scripts {
                    if let Some(target) = target.as_str() {
                        signal.binaries.push(name.clone());
                        signal.declared_scripts.insert(name.clone(), target.to_string());
                    }
                }
            }
        }

        signal.declared_dependencies.remove("python");
        signal.binaries.sort();
        signal.binaries.dedup();
        signal.library =
            doc.get("build-system").is_some() && signal.name.is_some() && signal.binaries.is_empty();

        Ok(signal)
    }

    fn parse_pipfile(&self, content: &str, path: &str) -> ExtractResult<ManifestSignal> {
        let doc: toml::Value = toml::from_str(content)?;
        let mut signal = ManifestSignal::new(Ecosystem::Pip, path);

        if let Some(packages) = doc.get("packages") {
            parse_version_table(packages, &mut signal.declared_dependencies);
        }
        if let Some(packages) = doc.get("dev-packages") {
            parse_version_table(packages, &mut signal.dev_dependencies);
        }
        if let Some(scripts) = doc.get("scripts").and_then(|s| s.as_table()) {
            for (name, cmd) in scripts {
                if let Some(cmd) = cmd.as_str() {
                    signal.declared_scripts.insert(name.clone(), cmd.to_string());
                }
            }
        }

        Ok(signal)
    }

    fn parse_requirements(&self, content: &str, path: &str) -> ExtractResult<ManifestSignal> {
        let mut signal = ManifestSignal::new(Ecosystem::Pip, path);

        for raw in content.lines() {
            let line = match raw.find(" #") {
                Some(idx) => &raw[..idx],
                None => raw,
            }
            .trim();

            // options, includes, editable installs and bare URLs
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with('-')
                || (line.contains("://") && !line.contains('@'))
            {
                continue;
            }
            insert_requirement(line, &mut signal.declared_dependencies);
        }

        Ok(signal)
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for PythonParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pip
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match file_name {
            "pyproject.toml" => self.parse_pyproject(content, path),
            "Pipfile" => self.parse_pipfile(content, path),
            "requirements.txt" => self.parse_requirements(content, path),
            other => Err(ExtractError::Invalid(format!("not a pip manifest: {}", other))),
        }
    }
}

/// Splits a PEP 508 requirement into name and version spec.
pub fn split_requirement(requirement: &str) -> Option<(String, String)> {
    let caps = REQUIREMENT.captures(requirement)?;
    let name = caps.get(1)?.as_str().to_string();
    let rest = caps.get(3).map_or("", |m| m.as_str());
    let spec = rest
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();

    let spec = if spec.is_empty() { "*" } else { spec };
    Some((name, spec.to_string()))
}

fn insert_requirement(requirement: &str, out: &mut BTreeMap<String, String>) {
    if let Some((name, spec)) = split_requirement(requirement) {
        out.insert(name, spec);
    }
}

fn parse_version_table(table: &toml::Value, out: &mut BTreeMap<String, String>) {
    let Some(map) = table.as_table() else {
        return;
    };
    for (name, value) in map {
        let spec = match value {
            toml::Value::String(v) => v.clone(),
            toml::Value::Table(t) => t
                .get("version")
                .and_then(|v| v.as_str())
                .unwrap_or("*")
                .to_string(),
            _ => "*".to_string(),
        };
        out.insert(name.clone(), spec);
    }
}

fn str_field(value: &toml::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn string_array(value: Option<&toml::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_requirement() {
        assert_eq!(
            split_requirement("Django>=4.2,<5"),
            Some(("Django".to_string(), ">=4.2,<5".to_string()))
        );
        assert_eq!(
            split_requirement("uvicorn[standard] == 0.29.0 ; python_version > '3.8'"),
            Some(("uvicorn".to_string(), "== 0.29.0".to_string()))
        );
        assert_eq!(
            split_requirement("requests"),
            Some(("requests".to_string(), "*".to_string()))
        );
        assert_eq!(split_requirement(">=1.0"), None);
    }

    #[test]
    fn test_parse_requirements_txt() {
        let parser = PythonParser::new();
        let content = "# web\nflask==3.0.0\n-r base.txt\n--index-url https://pypi.org/simple\n\ngunicorn  # server\n-e .\n";
        let signal = parser.parse("requirements.txt", content).unwrap();

        assert_eq!(signal.declared_dependencies.len(), 2);
        assert_eq!(signal.declared_dependencies["flask"], "==3.0.0");
        assert_eq!(signal.declared_dependencies["gunicorn"], "*");
        assert!(!signal.library);
    }

    #[test]
    fn test_parse_pyproject_pep621() {
        let parser = PythonParser::new();
        let content = r#"
[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"

[project]
name = "acme"
version = "0.3.0"
dependencies = ["fastapi>=0.110", "pydantic"]

[project.optional-dependencies]
test = ["pytest>=8"]

[project.scripts]
acme = "acme.cli:main"
"#;
        let signal = parser.parse("pyproject.toml", content).unwrap();

        assert_eq!(signal.name.as_deref(), Some("acme"));
        assert_eq!(signal.declared_dependencies["fastapi"], ">=0.110");
        assert_eq!(signal.dev_dependencies["pytest"], ">=8");
        assert_eq!(signal.binaries, vec!["acme"]);
        assert_eq!(signal.declared_scripts["acme"], "acme.cli:main");
        assert!(!signal.library);
    }

    #[test]
    fn test_parse_pyproject_poetry_library() {
        let parser = PythonParser::new();
        let content = r#"
[tool.poetry]
name = "lib"
version = "1.0.0"

[tool.poetry.dependencies]
python = "^3.11"
requests = "^2.31"
rich = { version = "^13", optional = true }

[tool.poetry.group.dev.dependencies]
pytest = "^8"

[build-system]
requires = ["poetry-core"]
"#;
        let signal = parser.parse("pyproject.toml", content).unwrap();

        assert_eq!(signal.name.as_deref(), Some("lib"));
        assert!(!signal.declared_dependencies.contains_key("python"));
        assert_eq!(signal.declared_dependencies["rich"], "^13");
        assert!(signal.dev_dependencies.contains_key("pytest"));
        assert!(signal.library);
    }

    #[test]
    fn test_parse_pipfile() {
        let parser = PythonParser::new();
        let content = r#"
[packages]
django = "*"
celery = { version = ">=5" }

[dev-packages]
black = "*"

[scripts]
serve = "python manage.py runserver"
"#;
        let signal = parser.parse("Pipfile", content).unwrap();

        assert_eq!(signal.declared_dependencies["celery"], ">=5");
        assert!(signal.dev_dependencies.contains_key("black"));
        assert_eq!(signal.declared_scripts["serve"], "python manage.py runserver");
    }

    #[test]
    fn test_invalid_pyproject() {
        let parser = PythonParser::new();
        assert!(parser.parse("pyproject.toml", "[project\n").is_err());
    }
}
