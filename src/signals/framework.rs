//! Framework extractor.
//!
//! Detection is a declarative table: each framework lists the dependency
//! names that declare it, marker files that betray it, and a few source
//! patterns. Every match yields one [`FrameworkSignal`] carrying a single
//! piece of evidence; the resolver merges them per `(name, ecosystem)`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dependencies::{Ecosystem, ManifestSignal};
use crate::tree::{FileNode, ProjectTree};

use super::language::source_language;
use super::{Confidence, Evidence, EvidenceKind};

/// Source files inspected for characteristic patterns.
pub const MAX_PATTERN_FILES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkCategory {
    Frontend,
    Backend,
    Fullstack,
    Mobile,
    Desktop,
    Cli,
    Testing,
    Orm,
    Styling,
}

impl FrameworkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkCategory::Frontend => "frontend",
            FrameworkCategory::Backend => "backend",
            FrameworkCategory::Fullstack => "fullstack",
            FrameworkCategory::Mobile => "mobile",
            FrameworkCategory::Desktop => "desktop",
            FrameworkCategory::Cli => "cli",
            FrameworkCategory::Testing => "testing",
            FrameworkCategory::Orm => "orm",
            FrameworkCategory::Styling => "styling",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkSignal {
    pub name: String,
    pub ecosystem: Ecosystem,
    pub category: FrameworkCategory,
    pub confidence: Confidence,
    pub evidence: Vec<Evidence>,
}

impl FrameworkSignal {
    fn new(def: &FrameworkDef, ecosystem: Ecosystem, kind: EvidenceKind, source: String) -> Self {
        Self {
            name: def.name.to_string(),
            ecosystem,
            category: def.category,
            confidence: kind.base_confidence(),
            evidence: vec![Evidence { kind, source }],
        }
    }
}

struct FrameworkDef {
    name: &'static str,
    category: FrameworkCategory,
    /// The first ecosystem is used when no manifest of any of them exists
    ecosystems: &'static [Ecosystem],
    /// Exact names (case-insensitive); a trailing `*` matches a prefix
    dependencies: &'static [&'static str],
    /// File names, or `dir/name` paths matched as a suffix
    markers: &'static [&'static str],
    patterns: &'static [&'static str],
    /// Languages whose sources are checked against `patterns`
    languages: &'static [&'static str],
}

use Ecosystem::*;
use FrameworkCategory::*;

const JS: &[&str] = &["javascript", "typescript"];
const JS_COMPONENTS: &[&str] = &["javascript", "typescript", "vue", "svelte"];
const PY: &[&str] = &["python"];
const JVM: &[&str] = &["java", "kotlin", "scala"];
const NONE: &[&str] = &[];

macro_rules! fw {
    ($name:expr, $cat:ident, [$($eco:ident),*], deps: [$($dep:expr),*], markers: [$($marker:expr),*], patterns: [$($pat:expr),*], langs: $langs:expr) => {
        FrameworkDef {
            name: $name,
            category: $cat,
            ecosystems: &[$($eco),*],
            dependencies: &[$($dep),*],
            markers: &[$($marker),*],
            patterns: &[$($pat),*],
            languages: $langs,
        }
    };
}

static FRAMEWORKS: &[FrameworkDef] = &[
    // JavaScript / TypeScript
    fw!("react", Frontend, [Npm], deps: ["react"], markers: [],
        patterns: [r#"from\s+['"]react['"]"#, r#"require\(\s*['"]react['"]\s*\)"#], langs: JS),
    fw!("vue", Frontend, [Npm], deps: ["vue"], markers: ["vue.config.js"],
        patterns: [r#"from\s+['"]vue['"]"#], langs: JS_COMPONENTS),
    fw!("angular", Frontend, [Npm], deps: ["@angular/core"], markers: ["angular.json"],
        patterns: [r#"from\s+['"]@angular/core['"]"#], langs: JS),
    fw!("svelte", Frontend, [Npm], deps: ["svelte"], markers: ["svelte.config.js"], patterns: [], langs: NONE),
    fw!("sveltekit", Fullstack, [Npm], deps: ["@sveltejs/kit"], markers: [], patterns: [], langs: NONE),
    fw!("next.js", Fullstack, [Npm], deps: ["next"],
        markers: ["next.config.js", "next.config.mjs", "next.config.ts"],
        patterns: [r#"from\s+['"]next/"#], langs: JS),
    fw!("nuxt", Fullstack, [Npm], deps: ["nuxt"], markers: ["nuxt.config.ts", "nuxt.config.js"],
        patterns: [], langs: NONE),
    fw!("remix", Fullstack, [Npm], deps: ["@remix-run/react", "@remix-run/node"], markers: ["remix.config.js"],
        patterns: [], langs: NONE),
    fw!("gatsby", Frontend, [Npm], deps: ["gatsby"], markers: ["gatsby-config.js", "gatsby-config.ts"],
        patterns: [], langs: NONE),
    fw!("astro", Frontend, [Npm], deps: ["astro"], markers: ["astro.config.mjs", "astro.config.ts"],
        patterns: [], langs: NONE),
    fw!("solid", Frontend, [Npm], deps: ["solid-js"], markers: [], patterns: [], langs: NONE),
    fw!("preact", Frontend, [Npm], deps: ["preact"], markers: [], patterns: [], langs: NONE),
    fw!("express", Backend, [Npm], deps: ["express"], markers: [],
        patterns: [r#"require\(\s*['"]express['"]\s*\)"#, r#"from\s+['"]express['"]"#], langs: JS),
    fw!("fastify", Backend, [Npm], deps: ["fastify"], markers: [],
        patterns: [r#"require\(\s*['"]fastify['"]\s*\)"#, r#"from\s+['"]fastify['"]"#], langs: JS),
    fw!("koa", Backend, [Npm], deps: ["koa"], markers: [], patterns: [], langs: NONE),
    fw!("nestjs", Backend, [Npm], deps: ["@nestjs/core"], markers: ["nest-cli.json"],
        patterns: [r#"from\s+['"]@nestjs/"#], langs: JS),
    fw!("hapi", Backend, [Npm], deps: ["@hapi/hapi"], markers: [], patterns: [], langs: NONE),
    fw!("electron", Desktop, [Npm], deps: ["electron"], markers: [], patterns: [], langs: NONE),
    fw!("react-native", Mobile, [Npm], deps: ["react-native"], markers: [],
        patterns: [r#"from\s+['"]react-native['"]"#], langs: JS),
    fw!("expo", Mobile, [Npm], deps: ["expo"], markers: ["app.config.js", "eas.json"], patterns: [], langs: NONE),
    fw!("ionic", Mobile, [Npm], deps: ["@ionic/core", "@ionic/angular", "@ionic/react", "@ionic/vue"],
        markers: ["ionic.config.json"], patterns: [], langs: NONE),
    fw!("commander", Cli, [Npm], deps: ["commander"], markers: [], patterns: [], langs: NONE),
    fw!("yargs", Cli, [Npm], deps: ["yargs"], markers: [], patterns: [], langs: NONE),
    fw!("oclif", Cli, [Npm], deps: ["@oclif/core"], markers: [], patterns: [], langs: NONE),
    fw!("jest", Testing, [Npm], deps: ["jest"], markers: ["jest.config.js", "jest.config.ts"],
        patterns: [], langs: NONE),
    fw!("vitest", Testing, [Npm], deps: ["vitest"], markers: ["vitest.config.ts", "vitest.config.js"],
        patterns: [], langs: NONE),
    fw!("mocha", Testing, [Npm], deps: ["mocha"], markers: [".mocharc.json", ".mocharc.yml"],
        patterns: [], langs: NONE),
    fw!("cypress", Testing, [Npm], deps: ["cypress"], markers: ["cypress.config.ts", "cypress.config.js"],
        patterns: [], langs: NONE),
    fw!("playwright", Testing, [Npm], deps: ["@playwright/test"],
        markers: ["playwright.config.ts", "playwright.config.js"], patterns: [], langs: NONE),
    fw!("prisma", Orm, [Npm], deps: ["prisma", "@prisma/client"], markers: ["schema.prisma"],
        patterns: [], langs: NONE),
    fw!("typeorm", Orm, [Npm], deps: ["typeorm"], markers: [], patterns: [], langs: NONE),
    fw!("sequelize", Orm, [Npm], deps: ["sequelize"], markers: [".sequelizerc"], patterns: [], langs: NONE),
    fw!("mongoose", Orm, [Npm], deps: ["mongoose"], markers: [], patterns: [], langs: NONE),
    fw!("drizzle", Orm, [Npm], deps: ["drizzle-orm"], markers: ["drizzle.config.ts"], patterns: [], langs: NONE),
    fw!("tailwindcss", Styling, [Npm], deps: ["tailwindcss"],
        markers: ["tailwind.config.js", "tailwind.config.ts", "tailwind.config.cjs"], patterns: [], langs: NONE),
    fw!("bootstrap", Styling, [Npm], deps: ["bootstrap"], markers: [], patterns: [], langs: NONE),
    fw!("styled-components", Styling, [Npm], deps: ["styled-components"], markers: [], patterns: [], langs: NONE),
    // Python
    fw!("django", Fullstack, [Pip], deps: ["django"], markers: ["manage.py"],
        patterns: [r"(?m)^\s*from\s+django[\s.]", r"(?m)^\s*import\s+django\b"], langs: PY),
    fw!("flask", Backend, [Pip], deps: ["flask"], markers: [],
        patterns: [r"(?m)^\s*from\s+flask\s+import\b"], langs: PY),
    fw!("fastapi", Backend, [Pip], deps: ["fastapi"], markers: [],
        patterns: [r"(?m)^\s*from\s+fastapi\s+import\b"], langs: PY),
    fw!("tornado", Backend, [Pip], deps: ["tornado"], markers: [], patterns: [], langs: NONE),
    fw!("aiohttp", Backend, [Pip], deps: ["aiohttp"], markers: [], patterns: [], langs: NONE),
    fw!("streamlit", Fullstack, [Pip], deps: ["streamlit"], markers: [".streamlit/config.toml"],
        patterns: [r"(?m)^\s*import\s+streamlit\b"], langs: PY),
    fw!("click", Cli, [Pip], deps: ["click"], markers: [], patterns: [r"(?m)^\s*import\s+click\b"], langs: PY),
    fw!("typer", Cli, [Pip], deps: ["typer"], markers: [], patterns: [], langs: NONE),
    fw!("pyqt", Desktop, [Pip], deps: ["pyqt5", "pyqt6", "pyside6"], markers: [], patterns: [], langs: NONE),
    fw!("kivy", Mobile, [Pip], deps: ["kivy"], markers: [], patterns: [], langs: NONE),
    fw!("pytest", Testing, [Pip], deps: ["pytest"], markers: ["pytest.ini", "conftest.py"],
        patterns: [], langs: NONE),
    fw!("sqlalchemy", Orm, [Pip], deps: ["sqlalchemy"], markers: ["alembic.ini"], patterns: [], langs: NONE),
    // Rust
    fw!("actix-web", Backend, [Cargo], deps: ["actix-web"], markers: [], patterns: [], langs: NONE),
    fw!("axum", Backend, [Cargo], deps: ["axum"], markers: [], patterns: [], langs: NONE),
    fw!("rocket", Backend, [Cargo], deps: ["rocket"], markers: ["Rocket.toml"], patterns: [], langs: NONE),
    fw!("warp", Backend, [Cargo], deps: ["warp"], markers: [], patterns: [], langs: NONE),
    fw!("leptos", Fullstack, [Cargo], deps: ["leptos"], markers: [], patterns: [], langs: NONE),
    fw!("yew", Frontend, [Cargo], deps: ["yew"], markers: [], patterns: [], langs: NONE),
    fw!("tauri", Desktop, [Cargo, Npm], deps: ["tauri", "@tauri-apps/api"], markers: ["tauri.conf.json"],
        patterns: [], langs: NONE),
    fw!("clap", Cli, [Cargo], deps: ["clap", "structopt"], markers: [], patterns: [], langs: NONE),
    fw!("diesel", Orm, [Cargo], deps: ["diesel"], markers: ["diesel.toml"], patterns: [], langs: NONE),
    fw!("sea-orm", Orm, [Cargo], deps: ["sea-orm"], markers: [], patterns: [], langs: NONE),
    // JVM
    fw!("spring-boot", Backend, [Maven, Gradle],
        deps: ["org.springframework.boot:*", "org.springframework.boot"], markers: [],
        patterns: [r"@SpringBootApplication\b"], langs: JVM),
    fw!("quarkus", Backend, [Maven, Gradle], deps: ["io.quarkus:*", "io.quarkus"], markers: [],
        patterns: [], langs: NONE),
    fw!("micronaut", Backend, [Maven, Gradle], deps: ["io.micronaut:*", "io.micronaut.application"],
        markers: [], patterns: [], langs: NONE),
    fw!("ktor", Backend, [Gradle, Maven], deps: ["io.ktor:*", "io.ktor.plugin"], markers: [],
        patterns: [], langs: NONE),
    fw!("android", Mobile, [Gradle], deps: ["com.android.application", "androidx.*"],
        markers: ["AndroidManifest.xml"], patterns: [], langs: NONE),
    fw!("javafx", Desktop, [Maven, Gradle], deps: ["org.openjfx:*", "org.openjfx.javafxplugin"],
        markers: [], patterns: [], langs: NONE),
    fw!("picocli", Cli, [Maven, Gradle], deps: ["info.picocli:*"], markers: [], patterns: [], langs: NONE),
    fw!("junit", Testing, [Maven, Gradle], deps: ["junit:junit", "org.junit.jupiter:*"], markers: [],
        patterns: [r"(?m)^import\s+org\.junit\."], langs: JVM),
    fw!("hibernate", Orm, [Maven, Gradle], deps: ["org.hibernate:*", "org.hibernate.orm:*"], markers: [],
        patterns: [], langs: NONE),
    // Go
    fw!("gin", Backend, [Go], deps: ["github.com/gin-gonic/gin"], markers: [],
        patterns: [r#""github.com/gin-gonic/gin""#], langs: &["go"]),
    fw!("echo", Backend, [Go], deps: ["github.com/labstack/echo*"], markers: [], patterns: [], langs: NONE),
    fw!("fiber", Backend, [Go], deps: ["github.com/gofiber/fiber*"], markers: [], patterns: [], langs: NONE),
    fw!("chi", Backend, [Go], deps: ["github.com/go-chi/chi*"], markers: [], patterns: [], langs: NONE),
    fw!("gorilla-mux", Backend, [Go], deps: ["github.com/gorilla/mux"], markers: [], patterns: [], langs: NONE),
    fw!("cobra", Cli, [Go], deps: ["github.com/spf13/cobra"], markers: [], patterns: [], langs: NONE),
    fw!("urfave-cli", Cli, [Go], deps: ["github.com/urfave/cli*"], markers: [], patterns: [], langs: NONE),
    fw!("gorm", Orm, [Go], deps: ["gorm.io/gorm"], markers: [], patterns: [], langs: NONE),
    fw!("testify", Testing, [Go], deps: ["github.com/stretchr/testify"], markers: [], patterns: [], langs: NONE),
    // PHP
    fw!("laravel", Fullstack, [Composer], deps: ["laravel/framework"], markers: ["artisan"],
        patterns: [], langs: NONE),
    fw!("symfony", Backend, [Composer], deps: ["symfony/framework-bundle"], markers: ["symfony.lock"],
        patterns: [], langs: NONE),
    fw!("phpunit", Testing, [Composer], deps: ["phpunit/phpunit"], markers: ["phpunit.xml", "phpunit.xml.dist"],
        patterns: [], langs: NONE),
    fw!("doctrine", Orm, [Composer], deps: ["doctrine/orm"], markers: [], patterns: [], langs: NONE),
    // Ruby
    fw!("rails", Fullstack, [Bundler], deps: ["rails"], markers: ["config/routes.rb", "bin/rails"],
        patterns: [r"Rails\.application"], langs: &["ruby"]),
    fw!("sinatra", Backend, [Bundler], deps: ["sinatra"], markers: [],
        patterns: [r#"require\s+['"]sinatra['"]"#], langs: &["ruby"]),
    fw!("rspec", Testing, [Bundler], deps: ["rspec", "rspec-rails"], markers: [".rspec"], patterns: [], langs: NONE),
    fw!("minitest", Testing, [Bundler], deps: ["minitest"], markers: [], patterns: [], langs: NONE),
    // .NET
    fw!("asp.net-core", Backend, [Nuget], deps: ["Microsoft.NET.Sdk.Web", "Microsoft.AspNetCore.*"], markers: [],
        patterns: [r"WebApplication\.CreateBuilder\("], langs: &["csharp"]),
    fw!("blazor", Frontend, [Nuget], deps: ["Microsoft.NET.Sdk.BlazorWebAssembly", "Microsoft.AspNetCore.Components.*"],
        markers: [], patterns: [], langs: NONE),
    fw!("maui", Mobile, [Nuget], deps: ["UseMaui", "Microsoft.Maui.*"], markers: [], patterns: [], langs: NONE),
    fw!("wpf", Desktop, [Nuget], deps: ["UseWPF"], markers: [], patterns: [], langs: NONE),
    fw!("windows-forms", Desktop, [Nuget], deps: ["UseWindowsForms"], markers: [], patterns: [], langs: NONE),
    fw!("entity-framework", Orm, [Nuget], deps: ["Microsoft.EntityFrameworkCore*"], markers: [],
        patterns: [], langs: NONE),
    fw!("xunit", Testing, [Nuget], deps: ["xunit"], markers: [], patterns: [], langs: NONE),
    fw!("nunit", Testing, [Nuget], deps: ["NUnit"], markers: [], patterns: [], langs: NONE),
    fw!("mstest", Testing, [Nuget], deps: ["MSTest.TestFramework"], markers: [], patterns: [], langs: NONE),
    // Dart
    fw!("flutter", Mobile, [Pub], deps: ["flutter"], markers: [],
        patterns: [r#"import\s+['"]package:flutter/"#], langs: &["dart"]),
];

/// Compiled `patterns`, index-aligned with `FRAMEWORKS`.
static COMPILED_PATTERNS: Lazy<Vec<Vec<Regex>>> = Lazy::new(|| {
    FRAMEWORKS
        .iter()
        .map(|def| def.patterns.iter().map(|p| Regex::new(p).unwrap()).collect())
        .collect()
});

pub fn extract(tree: &ProjectTree, manifests: &[ManifestSignal]) -> Vec<FrameworkSignal> {
    let mut signals = Vec::new();
    signals.extend(from_dependencies(manifests));
    signals.extend(from_markers(tree, manifests));
    signals.extend(from_source_patterns(tree, manifests));
    signals
}

fn from_dependencies(manifests: &[ManifestSignal]) -> Vec<FrameworkSignal> {
    let mut signals = Vec::new();

    for manifest in manifests {
        let names = manifest
            .dependency_names()
            .map(|(name, _)| name)
            .chain(manifest.plugins.iter().map(String::as_str));

        for name in names {
            for def in FRAMEWORKS.iter().filter(|d| d.ecosystems.contains(&manifest.ecosystem)) {
                if def.dependencies.iter().any(|pattern| dependency_matches(pattern, name)) {
                    signals.push(FrameworkSignal::new(
                        def,
                        manifest.ecosystem,
                        EvidenceKind::Dependency,
                        format!("{}: {}", manifest.manifest_path, name),
                    ));
                }
            }
        }
    }

    signals
}

fn from_markers(tree: &ProjectTree, manifests: &[ManifestSignal]) -> Vec<FrameworkSignal> {
    let mut signals = Vec::new();

    for def in FRAMEWORKS.iter().filter(|d| !d.markers.is_empty()) {
        let closest = tree
            .files
            .iter()
            .filter(|f| def.markers.iter().any(|m| marker_matches(m, f)))
            .min_by(|a, b| {
                a.depth()
                    .cmp(&b.depth())
                    .then_with(|| a.relative_path.cmp(&b.relative_path))
            });

        if let Some(file) = closest {
            signals.push(FrameworkSignal::new(
                def,
                ecosystem_for(def, manifests),
                EvidenceKind::MarkerFile,
                file.relative_path.clone(),
            ));
        }
    }

    signals
}

fn from_source_patterns(tree: &ProjectTree, manifests: &[ManifestSignal]) -> Vec<FrameworkSignal> {
    let mut found: Vec<Option<String>> = vec![None; FRAMEWORKS.len()];

    let sources = tree
        .readable_files()
        .filter_map(|(file, content)| source_language(file, Some(content)).map(|lang| (file, lang, content)))
        .take(MAX_PATTERN_FILES);

    for (file, language, content) in sources {
        for (idx, def) in FRAMEWORKS.iter().enumerate() {
            if found[idx].is_some() || !def.languages.contains(&language) {
                continue;
            }
            if COMPILED_PATTERNS[idx].iter().any(|re| re.is_match(content)) {
                found[idx] = Some(file.relative_path.clone());
            }
        }
    }

    FRAMEWORKS
        .iter()
        .zip(found)
        .filter_map(|(def, path)| {
            path.map(|p| {
                FrameworkSignal::new(def, ecosystem_for(def, manifests), EvidenceKind::SourcePattern, p)
            })
        })
        .collect()
}

/// Ecosystem for evidence not tied to a manifest: the first of the
/// framework's ecosystems that has a manifest in the tree.
fn ecosystem_for(def: &FrameworkDef, manifests: &[ManifestSignal]) -> Ecosystem {
    def.ecosystems
        .iter()
        .copied()
        .find(|eco| manifests.iter().any(|m| m.ecosystem == *eco))
        .unwrap_or(def.ecosystems[0])
}

fn dependency_matches(pattern: &str, name: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
        None => name.eq_ignore_ascii_case(pattern),
    }
}

fn marker_matches(marker: &str, file: &FileNode) -> bool {
    if marker.contains('/') {
        file.relative_path == marker || file.relative_path.ends_with(&format!("/{}", marker))
    } else {
        file.file_name() == marker
    }
}
