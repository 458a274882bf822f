//! NPM/Yarn/pnpm workspace declarations.

use serde::Deserialize;

use crate::error::ExtractResult;

/// Member patterns from a root package.json; `None` without `workspaces`.
pub fn package_json_workspaces(content: &str) -> ExtractResult<Option<(Option<String>, Vec<String>)>> {
    let json: serde_json::Value = serde_json::from_str(content)?;

    let Some(workspaces) = json.get("workspaces") else {
        return Ok(None);
    };
    let name = json.get("name").and_then(|v| v.as_str()).map(String::from);

    Ok(Some((name, extract_workspace_patterns(workspaces))))
}

fn extract_workspace_patterns(workspaces: &serde_json::Value) -> Vec<String> {
    match workspaces {
        serde_json::Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        // yarn workspaces format: { "packages": [...] }
        serde_json::Value::Object(obj) => obj
            .get("packages")
            .map(extract_workspace_patterns)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Deserialize)]
struct PnpmWorkspace {
    #[serde(default)]
    packages: Vec<String>,
}

/// Member patterns from pnpm-workspace.yaml.
pub fn pnpm_workspace_patterns(content: &str) -> ExtractResult<Vec<String>> {
    let workspace: PnpmWorkspace = serde_yaml::from_str(content)?;
    Ok(workspace.packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_workspaces() {
        let content = r#"{"name": "my-monorepo", "private": true, "workspaces": ["packages/*", "apps/web"]}"#;
        let (name, patterns) = package_json_workspaces(content).unwrap().unwrap();
        assert_eq!(name.as_deref(), Some("my-monorepo"));
        assert_eq!(patterns, vec!["packages/*", "apps/web"]);
    }

    #[test]
    fn test_yarn_object_workspaces() {
        let content = r#"{"workspaces": {"packages": ["libs/*"], "nohoist": ["**/react-native"]}}"#;
        let (_, patterns) = package_json_workspaces(content).unwrap().unwrap();
        assert_eq!(patterns, vec!["libs/*"]);
    }

    #[test]
    fn test_no_workspaces() {
        assert_eq!(package_json_workspaces(r#"{"name": "app"}"#).unwrap(), None);
    }

    #[test]
    fn test_pnpm_workspace() {
        let content = "packages:\n  - 'packages/*'\n  - \"apps/**\"\n  - '!**/test/**'\n";
        assert_eq!(
            pnpm_workspace_patterns(content).unwrap(),
            vec!["packages/*", "apps/**", "!**/test/**"]
        );
    }
}
