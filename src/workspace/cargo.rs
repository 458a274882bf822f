//! Cargo workspace declarations.

use crate::error::ExtractResult;

/// `[workspace]` table of a root Cargo.toml.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CargoWorkspace {
    /// Package name when the root is also a package
    pub name: Option<String>,
    pub members: Vec<String>,
    pub exclude: Vec<String>,
}

/// Reads the workspace table; `None` when the manifest declares no workspace.
pub fn parse_cargo_workspace(content: &str) -> ExtractResult<Option<CargoWorkspace>> {
    let doc: toml::Value = toml::from_str(content)?;

    let Some(ws) = doc.get("workspace") else {
        return Ok(None);
    };

    let strings = |key: &str| -> Vec<String> {
        ws.get(key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    };

    let name = doc
        .get("package")
        .and_then(|p| p.get("name"))
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(Some(CargoWorkspace {
        name,
        members: strings("members"),
        exclude: strings("exclude"),
    }))
}
