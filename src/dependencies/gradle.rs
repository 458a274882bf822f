//! Gradle build script parser (Groovy and Kotlin DSL).
//!
//! Build scripts are programs, so this reads them as text: dependency
//! declarations with literal coordinates, plugin ids and registered tasks.
//! Anything computed at configuration time is invisible here.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ExtractResult;

use super::resolver::ManifestParser;
use super::{Ecosystem, ManifestSignal};

static DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^\s*(implementation|api|compile|compileOnly|runtimeOnly|testImplementation|testCompileOnly|testRuntimeOnly|androidTestImplementation|kapt|ksp|annotationProcessor|developmentOnly)\s*\(?\s*["']([^"':\s]+):([^"':\s]+)(?::([^"'\s]+))?["']"#,
    )
    .unwrap()
});

static PLUGIN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*id\s*\(?\s*["']([^"']+)["']"#).unwrap());

static APPLY_PLUGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"apply\s*\(?\s*plugin\s*[:=]\s*["']([^"']+)["']"#).unwrap());

// `kotlin("jvm")` in the plugins block
static KOTLIN_PLUGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*kotlin\s*\(\s*"([^"]+)"\s*\)"#).unwrap());

// `application` / `java-library` written as bare identifiers in the plugins block
static BARE_PLUGIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*`?(application|java-library|java|war)`?\s*$").unwrap()
});

static TASK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)(?:tasks\.register(?:<[^>]*>)?\s*\(\s*["']([A-Za-z0-9_-]+)["']|^\s*task\s+([A-Za-z0-9_]+))"#)
        .unwrap()
});

static ROOT_PROJECT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"rootProject\.name\s*=\s*["']([^"']+)["']"#).unwrap());

static MAIN_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"mainClass(?:Name)?(?:\.set\s*\(|\s*=)\s*["']([^"']+)["']"#).unwrap());

/// Parser for build.gradle and build.gradle.kts.
pub struct GradleParser;

impl GradleParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_build_script(&self, content: &str, manifest_path: &str) -> ManifestSignal {
        let mut signal = ManifestSignal::new(Ecosystem::Gradle, manifest_path);
        let content = strip_comments(content);

        for caps in DEPENDENCY.captures_iter(&content) {
            let configuration = &caps[1];
            let key = format!("{}:{}", &caps[2], &caps[3]);
            let version = caps.get(4).map_or("*", |m| m.as_str()).to_string();

            if is_dev_configuration(configuration) {
                signal.dev_dependencies.insert(key, version);
            } else {
                signal.declared_dependencies.insert(key, version);
            }
        }

        for re in [&*PLUGIN_ID, &*APPLY_PLUGIN, &*BARE_PLUGIN] {
            for caps in re.captures_iter(&content) {
                signal.plugins.push(caps[1].to_string());
            }
        }
        for caps in KOTLIN_PLUGIN.captures_iter(&content) {
            signal.plugins.push(format!("org.jetbrains.kotlin.{}", &caps[1]));
        }
        signal.plugins.sort();
        signal.plugins.dedup();

        for caps in TASK.captures_iter(&content) {
            if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
                signal
                    .declared_scripts
                    .insert(name.as_str().to_string(), format!("gradle {}", name.as_str()));
            }
        }

        if signal.has_plugin("application") || signal.has_plugin("org.springframework.boot") {
            let bin = MAIN_CLASS
                .captures(&content)
                .map(|c| c[1].to_string())
                .or_else(|| project_dir_name(manifest_path))
                .unwrap_or_else(|| "app".to_string());
            signal.binaries.push(bin);
        }
        signal.library = (signal.has_plugin("java-library")
            || signal.has_plugin("com.android.library"))
            && signal.binaries.is_empty();

        signal
    }
}

fn is_dev_configuration(configuration: &str) -> bool {
    configuration.starts_with("test")
        || configuration.starts_with("androidTest")
        || configuration == "developmentOnly"
}

fn project_dir_name(manifest_path: &str) -> Option<String> {
    let dir = crate::tree::parent_of(manifest_path);
    dir.rsplit('/')
        .next()
        .filter(|d| !d.is_empty())
        .map(String::from)
}

/// Drops `//` line comments and `/* */` blocks so commented-out
/// declarations are not reported.
fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_block = false;

    for line in content.lines() {
        let mut rest = line;
        let mut kept = String::new();
        loop {
            if in_block {
                match rest.find("*/") {
                    Some(end) => {
                        rest = &rest[end + 2..];
                        in_block = false;
                    }
                    None => break,
                }
            } else {
                let block = rest.find("/*");
                let line_comment = rest
                    .match_indices("//")
                    .map(|(i, _)| i)
                    .find(|&i| !is_in_url(rest, i));
                match (block, line_comment) {
                    (Some(b), Some(l)) if l < b => {
                        kept.push_str(&rest[..l]);
                        break;
                    }
                    (Some(b), _) => {
                        kept.push_str(&rest[..b]);
                        rest = &rest[b + 2..];
                        in_block = true;
                    }
                    (None, Some(l)) => {
                        kept.push_str(&rest[..l]);
                        break;
                    }
                    (None, None) => {
                        kept.push_str(rest);
                        break;
                    }
                }
            }
        }
        out.push_str(&kept);
        out.push('\n');
    }

    out
}

fn is_in_url(line: &str, idx: usize) -> bool {
    idx > 0 && line[..idx].ends_with(':')
}

/// Reads `rootProject.name` and the `include` list from settings.gradle(.kts).
/// Included project paths such as `:libs:core` come back as `libs/core`.
pub fn parse_settings(content: &str) -> (Option<String>, Vec<String>) {
    static INCLUDE_LINE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^\s*include\b\s*\(?(.*)$").unwrap());
    static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

    let content = strip_comments(content);
    let root_name = ROOT_PROJECT_NAME
        .captures(&content)
        .map(|c| c[1].to_string());

    let mut includes = Vec::new();
    for line in INCLUDE_LINE.captures_iter(&content) {
        for quoted in QUOTED.captures_iter(&line[1]) {
            let path = quoted[1].trim_start_matches(':').replace(':', "/");
            if !path.is_empty() && !includes.contains(&path) {
                includes.push(path);
            }
        }
    }

    (root_name, includes)
}

impl Default for GradleParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for GradleParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Gradle
    }

    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        Ok(self.parse_build_script(content, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kotlin_dsl() {
        let content = r#"
plugins {
    id("org.springframework.boot") version "3.2.0"
    kotlin("jvm") version "1.9.20"
    application
}

dependencies {
    implementation("org.springframework.boot:spring-boot-starter-web")
    implementation("com.fasterxml.jackson.module:jackson-module-kotlin:2.16.0")
    // implementation("org.old:removed:1.0")
    testImplementation("org.junit.jupiter:junit-jupiter:5.10.0")
}

application {
    mainClass.set("com.acme.AppKt")
}

tasks.register("integrationTest") {
}
"#;
        let signal = GradleParser::new().parse("build.gradle.kts", content).unwrap();

        assert_eq!(
            signal.declared_dependencies["org.springframework.boot:spring-boot-starter-web"],
            "*"
        );
        assert_eq!(
            signal.declared_dependencies["com.fasterxml.jackson.module:jackson-module-kotlin"],
            "2.16.0"
        );
        assert!(!signal.has_dependency("org.old:removed"));
        assert!(signal.dev_dependencies.contains_key("org.junit.jupiter:junit-jupiter"));
        assert!(signal.has_plugin("org.springframework.boot"));
        assert!(signal.has_plugin("org.jetbrains.kotlin.jvm"));
        assert!(signal.has_plugin("application"));
        assert_eq!(signal.binaries, vec!["com.acme.AppKt"]);
        assert!(signal.declared_scripts.contains_key("integrationTest"));
    }

    #[test]
    fn test_parse_groovy_dsl() {
        let content = r#"
apply plugin: 'java-library'

dependencies {
    api 'com.google.guava:guava:32.1.3-jre'
    testImplementation 'junit:junit:4.13.2'
}

task fatJar(type: Jar) {
}
"#;
        let signal = GradleParser::new().parse("lib/build.gradle", content).unwrap();

        assert_eq!(signal.declared_dependencies["com.google.guava:guava"], "32.1.3-jre");
        assert_eq!(signal.dev_dependencies["junit:junit"], "4.13.2");
        assert!(signal.library);
        assert!(signal.binaries.is_empty());
        assert_eq!(signal.declared_scripts["fatJar"], "gradle fatJar");
    }

    #[test]
    fn test_application_without_main_class_uses_dir_name() {
        let content = "plugins {\n    id 'application'\n}\n";
        let signal = GradleParser::new().parse("tools/cli/build.gradle", content).unwrap();
        assert_eq!(signal.binaries, vec!["cli"]);
    }

    #[test]
    fn test_parse_settings() {
        let content = r#"
rootProject.name = "shop"
include(":api", ":core")
include ':libs:util'
// include ':ghost'
"#;
        let (name, includes) = parse_settings(content);
        assert_eq!(name.as_deref(), Some("shop"));
        assert_eq!(includes, vec!["api", "core", "libs/util"]);
    }

    #[test]
    fn test_strip_comments_keeps_urls() {
        let stripped = strip_comments("maven { url 'https://repo.example.com' } // repo\n/* a\nb */x");
        assert!(stripped.contains("https://repo.example.com"));
        assert!(!stripped.contains("repo\n"));
        assert!(stripped.ends_with("x\n"));
        assert!(!stripped.contains("/* a"));
    }
}
