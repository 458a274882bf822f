//! Build-system extractor: marker configs, lockfiles and bundler scripts.

use serde::{Deserialize, Serialize};

use crate::dependencies::{Ecosystem, ManifestSignal};
use crate::tree::{FileNode, ProjectTree};

/// What kind of file revealed the build tool. Earlier variants win when the
/// same tool is found at equal depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildSource {
    ConfigFile,
    Lockfile,
    PackageScript,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSystemSignal {
    pub name: String,
    pub config_file: String,
    pub source: BuildSource,
    /// Declared targets (Makefile rules)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

impl BuildSystemSignal {
    pub fn new(name: impl Into<String>, config_file: impl Into<String>, source: BuildSource) -> Self {
        Self {
            name: name.into(),
            config_file: config_file.into(),
            source,
            targets: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        crate::tree::path_depth(&self.config_file)
    }
}

/// Tool name and the exact file names that identify it.
const CONFIG_MARKERS: &[(&str, &[&str])] = &[
    ("webpack", &["webpack.config.js", "webpack.config.ts", "webpack.config.cjs", "webpack.config.mjs"]),
    ("vite", &["vite.config.js", "vite.config.ts", "vite.config.mjs", "vite.config.cjs", "vite.config.mts"]),
    ("rollup", &["rollup.config.js", "rollup.config.mjs", "rollup.config.ts"]),
    ("parcel", &[".parcelrc"]),
    ("turborepo", &["turbo.json"]),
    ("nx", &["nx.json"]),
    ("gulp", &["gulpfile.js", "gulpfile.ts"]),
    ("grunt", &["Gruntfile.js", "Gruntfile.coffee"]),
    ("maven", &["pom.xml"]),
    ("gradle", &["build.gradle", "build.gradle.kts", "settings.gradle", "settings.gradle.kts"]),
    ("make", &["Makefile", "makefile", "GNUmakefile"]),
    ("cmake", &["CMakeLists.txt"]),
    ("meson", &["meson.build"]),
    ("bazel", &["WORKSPACE", "WORKSPACE.bazel", "MODULE.bazel", "BUILD.bazel"]),
    ("cargo", &["Cargo.toml"]),
    ("go", &["go.mod"]),
    ("docker", &["Dockerfile", "Containerfile"]),
    ("docker-compose", &["docker-compose.yml", "docker-compose.yaml", "compose.yml", "compose.yaml"]),
];

/// MSBuild is recognized by extension.
const MSBUILD_EXTENSIONS: &[&str] = &["sln", "csproj", "fsproj", "vbproj"];

const LOCKFILES: &[(&str, &str)] = &[
    ("package-lock.json", "npm"),
    ("yarn.lock", "yarn"),
    ("pnpm-lock.yaml", "pnpm"),
    ("bun.lockb", "bun"),
    ("bun.lock", "bun"),
    ("poetry.lock", "poetry"),
    ("Pipfile.lock", "pipenv"),
];

/// Bundlers recognized from package.json scripts or dependencies, with the
/// package name that provides each.
const SCRIPT_BUNDLERS: &[(&str, &str)] = &[
    ("vite", "vite"),
    ("webpack", "webpack"),
    ("rollup", "rollup"),
    ("parcel", "parcel"),
    ("esbuild", "esbuild"),
    ("turbo", "turbo"),
    ("nx", "nx"),
];

pub fn extract(tree: &ProjectTree, manifests: &[ManifestSignal]) -> Vec<BuildSystemSignal> {
    let mut signals = Vec::new();

    for file in &tree.files {
        let name = file.file_name();

        if let Some((tool, _)) = CONFIG_MARKERS.iter().find(|(_, names)| names.contains(&name)) {
            let mut signal = BuildSystemSignal::new(*tool, &file.relative_path, BuildSource::ConfigFile);
            if *tool == "make" {
                if let Some(content) = tree.content(&file.relative_path) {
                    signal.targets = parse_make_targets(content);
                }
            }
            signals.push(signal);
        } else if is_msbuild_file(file) {
            signals.push(BuildSystemSignal::new("msbuild", &file.relative_path, BuildSource::ConfigFile));
        }

        if let Some((_, tool)) = LOCKFILES.iter().find(|(lock, _)| *lock == name) {
            signals.push(BuildSystemSignal::new(*tool, &file.relative_path, BuildSource::Lockfile));
        }
    }

    signals.extend(from_package_scripts(manifests));
    signals
}

/// Whether a file name is a build config or lockfile this extractor knows.
pub fn is_build_file(file_name: &str) -> bool {
    CONFIG_MARKERS.iter().any(|(_, names)| names.contains(&file_name))
        || LOCKFILES.iter().any(|(lock, _)| *lock == file_name)
}

fn is_msbuild_file(file: &FileNode) -> bool {
    file.extension()
        .is_some_and(|ext| MSBUILD_EXTENSIONS.contains(&ext))
}

/// Bundlers invoked by the root-most package.json.
fn from_package_scripts(manifests: &[ManifestSignal]) -> Vec<BuildSystemSignal> {
    let Some(manifest) = manifests
        .iter()
        .filter(|m| m.ecosystem == Ecosystem::Npm)
        .min_by(|a, b| {
            a.depth()
                .cmp(&b.depth())
                .then_with(|| a.manifest_path.cmp(&b.manifest_path))
        })
    else {
        return Vec::new();
    };

    SCRIPT_BUNDLERS
        .iter()
        .filter(|(_, package)| {
            manifest.has_dependency(package)
                || manifest
                    .declared_scripts
                    .values()
                    .any(|cmd| invokes(cmd, package))
        })
        .map(|(tool, _)| BuildSystemSignal::new(*tool, &manifest.manifest_path, BuildSource::PackageScript))
        .collect()
}

/// Whether a shell command runs `program` as one of its commands.
fn invokes(command: &str, program: &str) -> bool {
    command
        .split(['&', '|', ';'])
        .filter_map(|part| {
            let mut words = part.split_whitespace();
            let first = words.next()?;
            // npx vite, cross-env NODE_ENV=x webpack
            if matches!(first, "npx" | "pnpx" | "bunx" | "cross-env") {
                words.find(|w| !w.contains('=') && !w.starts_with('-'))
            } else {
                Some(first)
            }
        })
        .any(|word| word == program)
}

/// Explicit rule names from a Makefile, in declaration order.
pub fn parse_make_targets(content: &str) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();

    for line in content.lines() {
        if line.starts_with('\t') || line.trim_start().starts_with('#') {
            continue;
        }
        let Some(colon_pos) = line.find(':') else {
            continue;
        };
        // VAR := value and VAR ::= value are assignments
        if line[colon_pos..].starts_with(":=") || line[colon_pos..].starts_with("::=") {
            continue;
        }
        if line[..colon_pos].contains('=') {
            continue;
        }

        for target in line[..colon_pos].split_whitespace() {
            // special targets, pattern rules and computed names
            if target.starts_with('.') || target.contains('%') || target.contains('$') {
                continue;
            }
            if !targets.iter().any(|t| t == target) {
                targets.push(target.to_string());
            }
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn add(tree: &mut ProjectTree, path: &str, content: &str) {
        tree.files.push(FileNode {
            relative_path: path.to_string(),
            size_bytes: content.len() as u64,
            extension: path.rsplit_once('.').map(|(_, e)| e.to_lowercase()),
            modified_at: None,
            oversized: false,
        });
        tree.insert_content(path.to_string(), content.to_string());
    }

    #[test]
    fn test_config_markers_and_lockfiles() {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        add(&mut tree, "vite.config.ts", "export default {}");
        add(&mut tree, "yarn.lock", "");
        add(&mut tree, "Dockerfile", "FROM node:20");
        add(&mut tree, "App.sln", "");

        let signals = extract(&tree, &[]);
        let names: Vec<(&str, BuildSource)> = signals.iter().map(|s| (s.name.as_str(), s.source)).collect();
        assert_eq!(
            names,
            vec![
                ("vite", BuildSource::ConfigFile),
                ("yarn", BuildSource::Lockfile),
                ("docker", BuildSource::ConfigFile),
                ("msbuild", BuildSource::ConfigFile),
            ]
        );
    }

    #[test]
    fn test_makefile_targets() {
        let content = "CC := gcc\nVERSION = 1\n.PHONY: all test\nall: build\nbuild test: deps\n\t$(CC) -o app main.c\n%.o: %.c\n\t$(CC) -c $<\n# lint: ignored\n";
        assert_eq!(parse_make_targets(content), vec!["all", "build", "test"]);

        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        add(&mut tree, "Makefile", content);
        let signals = extract(&tree, &[]);
        assert_eq!(signals[0].name, "make");
        assert_eq!(signals[0].targets, vec!["all", "build", "test"]);
    }

    #[test]
    fn test_bundler_from_root_package_scripts() {
        let mut root = ManifestSignal::new(Ecosystem::Npm, "package.json");
        root.declared_scripts.insert("dev".into(), "vite".into());
        root.declared_scripts.insert("bundle".into(), "npx esbuild src/index.ts --bundle".into());
        let mut nested = ManifestSignal::new(Ecosystem::Npm, "tools/package.json");
        nested.declared_dependencies.insert("webpack".into(), "^5".into());

        let signals = extract(&ProjectTree::new(PathBuf::from("/p")), &[nested, root]);
        let names: Vec<&str> = signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["vite", "esbuild"]);
        assert!(signals.iter().all(|s| s.source == BuildSource::PackageScript));
        assert!(signals.iter().all(|s| s.config_file == "package.json"));
    }

    #[test]
    fn test_invokes() {
        assert!(invokes("tsc && vite build", "vite"));
        assert!(invokes("cross-env NODE_ENV=production webpack --mode production", "webpack"));
        assert!(!invokes("echo viteish", "vite"));
        assert!(!invokes("node scripts/vite.js", "vite"));
    }
}
