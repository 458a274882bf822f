//! Execution-method inferrer.
//!
//! Turns declared scripts, ecosystem conventions, Makefile targets, Docker
//! files and entry point files into ranked shell command candidates. No
//! candidate is ever executed.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::compass::ProjectProfile;
use crate::dependencies::{Ecosystem, ManifestSignal};
use crate::signals::manifest::join;
use crate::signals::{BuildSystemSignal, Confidence};
use crate::tree::{parent_of, ProjectTree};

/// What a command does. Declaration order is the tie-break rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionType {
    Run,
    Dev,
    Build,
    Test,
    Lint,
    Install,
    Custom,
}

impl ExecutionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionType::Run => "run",
            ExecutionType::Dev => "dev",
            ExecutionType::Build => "build",
            ExecutionType::Test => "test",
            ExecutionType::Lint => "lint",
            ExecutionType::Install => "install",
            ExecutionType::Custom => "custom",
        }
    }

    /// Classifies a script, task or make target by name (`test:unit` is a test).
    pub fn from_script_name(name: &str) -> Self {
        let base = name.split(':').next().unwrap_or(name);
        match base {
            "start" | "serve" | "server" | "run" | "preview" => ExecutionType::Run,
            "dev" | "develop" | "watch" => ExecutionType::Dev,
            "build" | "compile" | "dist" | "package" | "all" | "release" => ExecutionType::Build,
            "test" | "tests" | "e2e" | "coverage" | "check" => ExecutionType::Test,
            "lint" | "format" | "fmt" | "typecheck" => ExecutionType::Lint,
            "install" | "setup" | "bootstrap" | "deps" => ExecutionType::Install,
            _ => ExecutionType::Custom,
        }
    }

    fn default_description(&self) -> &'static str {
        match self {
            ExecutionType::Run => "Start the application",
            ExecutionType::Dev => "Start the development server",
            ExecutionType::Build => "Build the project",
            ExecutionType::Test => "Run the test suite",
            ExecutionType::Lint => "Check code style",
            ExecutionType::Install => "Install dependencies",
            ExecutionType::Custom => "Run a project task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMethod {
    #[serde(rename = "type")]
    pub method_type: ExecutionType,
    pub command: String,
    pub description: String,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecosystem: Option<Ecosystem>,
    /// File the candidate was derived from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Collects candidates; commands for manifests below the root are prefixed
/// with a `cd` into their directory.
struct Candidates<'a> {
    tree: &'a ProjectTree,
    methods: Vec<ExecutionMethod>,
}

impl<'a> Candidates<'a> {
    fn new(tree: &'a ProjectTree) -> Self {
        Self {
            tree,
            methods: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        ecosystem: Option<Ecosystem>,
        dir: &str,
        method_type: ExecutionType,
        command: impl Into<String>,
        description: impl Into<String>,
        confidence: Confidence,
        source: &str,
    ) {
        let command = command.into();
        let command = if dir.is_empty() {
            command
        } else {
            format!("cd {} && {}", shell_quote(dir), command)
        };
        self.methods.push(ExecutionMethod {
            method_type,
            command,
            description: description.into(),
            confidence,
            ecosystem,
            source: Some(source.to_string()),
        });
    }

    /// Ecosystem default: medium confidence, stock description.
    fn default_cmd(&mut self, m: &ManifestSignal, method_type: ExecutionType, command: impl Into<String>) {
        self.push(
            Some(m.ecosystem),
            m.dir(),
            method_type,
            command,
            method_type.default_description(),
            Confidence::Medium,
            &m.manifest_path,
        );
    }

    /// Declared script: high confidence, description carries the raw command.
    fn script(&mut self, m: &ManifestSignal, name: &str, raw: &str, command: String) {
        let method_type = ExecutionType::from_script_name(name);
        let description = match method_type {
            ExecutionType::Custom => format!("Run the {} script: {}", name, raw),
            _ => format!("{}: {}", method_type.default_description(), raw),
        };
        self.push(
            Some(m.ecosystem),
            m.dir(),
            method_type,
            command,
            description,
            Confidence::High,
            &m.manifest_path,
        );
    }

    fn has_file(&self, dir: &str, name: &str) -> bool {
        self.tree.has_file(&join(dir, name))
    }

    fn has_method(&self, ecosystem: Ecosystem, method_type: ExecutionType) -> bool {
        self.methods
            .iter()
            .any(|m| m.ecosystem == Some(ecosystem) && m.method_type == method_type)
    }
}

/// Infers ranked command candidates for the resolved profile.
pub fn infer(profile: &ProjectProfile, tree: &ProjectTree) -> Vec<ExecutionMethod> {
    let mut c = Candidates::new(tree);

    for manifest in &profile.manifests {
        match manifest.ecosystem {
            Ecosystem::Npm => npm(&mut c, manifest),
            Ecosystem::Pip => python(&mut c, manifest, profile),
            Ecosystem::Cargo => cargo(&mut c, manifest),
            Ecosystem::Maven => maven(&mut c, manifest, profile),
            Ecosystem::Gradle => gradle(&mut c, manifest, profile),
            Ecosystem::Go => go(&mut c, manifest),
            Ecosystem::Composer => composer(&mut c, manifest, profile),
            Ecosystem::Bundler => bundler(&mut c, manifest, profile),
            Ecosystem::Nuget => dotnet(&mut c, manifest, profile),
            Ecosystem::Pub => dart(&mut c, manifest, profile),
        }
    }

    entry_fallbacks(&mut c);

    for build in &profile.build_systems {
        match build.name.as_str() {
            "make" => make(&mut c, build),
            "docker" => c.push(
                None,
                parent_of(&build.config_file),
                ExecutionType::Build,
                format!("docker build -t {} .", image_name(tree)),
                "Build the container image",
                Confidence::Low,
                &build.config_file,
            ),
            "docker-compose" => c.push(
                None,
                parent_of(&build.config_file),
                ExecutionType::Run,
                "docker compose up",
                "Start the services defined in the compose file",
                Confidence::Low,
                &build.config_file,
            ),
            _ => {}
        }
    }

    let methods = rank(c.methods, profile.primary_ecosystems());
    tracing::debug!(candidates = methods.len(), "inferred execution methods");
    methods
}

/// Sorts by confidence, then primary-language ecosystem, then ecosystem,
/// type and command; drops repeated commands.
fn rank(mut methods: Vec<ExecutionMethod>, primary: &[Ecosystem]) -> Vec<ExecutionMethod> {
    let primary_rank = |m: &ExecutionMethod| {
        m.ecosystem
            .and_then(|eco| primary.iter().position(|p| *p == eco))
            .unwrap_or(usize::MAX)
    };

    methods.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| primary_rank(a).cmp(&primary_rank(b)))
            .then_with(|| a.ecosystem.is_none().cmp(&b.ecosystem.is_none()))
            .then_with(|| a.ecosystem.cmp(&b.ecosystem))
            .then_with(|| a.method_type.cmp(&b.method_type))
            .then_with(|| a.command.cmp(&b.command))
    });

    let mut seen = HashSet::new();
    methods.retain(|m| seen.insert(m.command.clone()));
    methods
}

fn npm(c: &mut Candidates<'_>, m: &ManifestSignal) {
    let dir = m.dir();
    let runner = if c.has_file(dir, "pnpm-lock.yaml") {
        "pnpm"
    } else if c.has_file(dir, "yarn.lock") {
        "yarn"
    } else if c.has_file(dir, "bun.lockb") || c.has_file(dir, "bun.lock") {
        "bun"
    } else {
        "npm"
    };

    c.default_cmd(m, ExecutionType::Install, format!("{} install", runner));
    for (name, raw) in &m.declared_scripts {
        c.script(m, name, raw, format!("{} run {}", runner, shell_quote(name)));
    }

    if !c.has_method(Ecosystem::Npm, ExecutionType::Run) && !c.has_method(Ecosystem::Npm, ExecutionType::Dev) {
        for entry in ["server.js", "index.js", "main.js", "app.js"] {
            if c.has_file(dir, entry) {
                c.push(
                    Some(Ecosystem::Npm),
                    dir,
                    ExecutionType::Run,
                    format!("node {}", entry),
                    "Run the Node.js entry point",
                    Confidence::Low,
                    &join(dir, entry),
                );
                break;
            }
        }
    }
}

fn python(c: &mut Candidates<'_>, m: &ManifestSignal, profile: &ProjectProfile) {
    let dir = m.dir();
    let poetry = c.has_file(dir, "poetry.lock");

    match m.file_name() {
        "Pipfile" => {
            c.default_cmd(m, ExecutionType::Install, "pipenv install");
            for (name, raw) in &m.declared_scripts {
                c.script(m, name, raw, format!("pipenv run {}", shell_quote(name)));
            }
        }
        "pyproject.toml" => {
            let install = if poetry { "poetry install" } else { "pip install -e ." };
            c.default_cmd(m, ExecutionType::Install, install);
            for name in m.declared_scripts.keys() {
                let command = if poetry {
                    format!("poetry run {}", shell_quote(name))
                } else {
                    shell_quote(name).into_owned()
                };
                c.push(
                    Some(Ecosystem::Pip),
                    dir,
                    ExecutionType::Run,
                    command,
                    format!("Run the {} console script", name),
                    Confidence::Medium,
                    &m.manifest_path,
                );
            }
        }
        _ => {}
    }

    if c.has_file(dir, "requirements.txt") {
        c.default_cmd(m, ExecutionType::Install, "pip install -r requirements.txt");
    }
    if has_framework(profile, "pytest") {
        let command = if poetry { "poetry run pytest" } else { "pytest" };
        c.default_cmd(m, ExecutionType::Test, command);
    }
}

fn cargo(c: &mut Candidates<'_>, m: &ManifestSignal) {
    c.default_cmd(m, ExecutionType::Build, "cargo build");
    c.default_cmd(m, ExecutionType::Test, "cargo test");
    match m.binaries.as_slice() {
        [] => {}
        [_] => c.default_cmd(m, ExecutionType::Run, "cargo run"),
        bins => {
            for bin in bins {
                c.default_cmd(m, ExecutionType::Run, format!("cargo run --bin {}", shell_quote(bin)));
            }
        }
    }
}

fn maven(c: &mut Candidates<'_>, m: &ManifestSignal, profile: &ProjectProfile) {
    let mvn = if c.has_file(m.dir(), "mvnw") { "./mvnw" } else { "mvn" };

    c.default_cmd(m, ExecutionType::Install, format!("{} install", mvn));
    c.default_cmd(m, ExecutionType::Build, format!("{} package", mvn));
    c.default_cmd(m, ExecutionType::Test, format!("{} test", mvn));

    if has_framework(profile, "spring-boot") || m.plugins.iter().any(|p| p == "spring-boot-maven-plugin") {
        c.default_cmd(m, ExecutionType::Run, format!("{} spring-boot:run", mvn));
    } else if has_framework(profile, "quarkus") {
        c.default_cmd(m, ExecutionType::Dev, format!("{} quarkus:dev", mvn));
    } else if !m.binaries.is_empty() {
        c.default_cmd(m, ExecutionType::Run, format!("{} exec:java", mvn));
    }
}

fn gradle(c: &mut Candidates<'_>, m: &ManifestSignal, profile: &ProjectProfile) {
    let gradlew = c.has_file(m.dir(), "gradlew") || c.has_file("", "gradlew");
    let g = if gradlew { "./gradlew" } else { "gradle" };

    c.default_cmd(m, ExecutionType::Build, format!("{} build", g));
    c.default_cmd(m, ExecutionType::Test, format!("{} test", g));

    if has_framework(profile, "android") {
        c.default_cmd(m, ExecutionType::Build, format!("{} assembleDebug", g));
    } else if has_framework(profile, "spring-boot") || m.has_plugin("org.springframework.boot") {
        c.default_cmd(m, ExecutionType::Run, format!("{} bootRun", g));
    } else if !m.binaries.is_empty() {
        c.default_cmd(m, ExecutionType::Run, format!("{} run", g));
    }

    for (name, raw) in &m.declared_scripts {
        c.script(m, name, raw, format!("{} {}", g, shell_quote(name)));
    }
}

fn go(c: &mut Candidates<'_>, m: &ManifestSignal) {
    let dir = m.dir();
    c.default_cmd(m, ExecutionType::Install, "go mod download");
    c.default_cmd(m, ExecutionType::Build, "go build ./...");
    c.default_cmd(m, ExecutionType::Test, "go test ./...");

    if c.has_file(dir, "main.go") {
        c.default_cmd(m, ExecutionType::Run, "go run .");
    }
    for bin in &m.binaries {
        if c.has_file(dir, &format!("cmd/{}/main.go", bin)) {
            c.default_cmd(m, ExecutionType::Run, format!("go run {}", shell_quote(&format!("./cmd/{}", bin))));
        }
    }
}

fn composer(c: &mut Candidates<'_>, m: &ManifestSignal, profile: &ProjectProfile) {
    c.default_cmd(m, ExecutionType::Install, "composer install");
    for (name, raw) in &m.declared_scripts {
        c.script(m, name, raw, format!("composer run-script {}", shell_quote(name)));
    }
    if c.has_file(m.dir(), "artisan") {
        c.default_cmd(m, ExecutionType::Run, "php artisan serve");
    }
    if has_framework(profile, "phpunit") {
        c.default_cmd(m, ExecutionType::Test, "vendor/bin/phpunit");
    }
}

fn bundler(c: &mut Candidates<'_>, m: &ManifestSignal, profile: &ProjectProfile) {
    let dir = m.dir();
    c.default_cmd(m, ExecutionType::Install, "bundle install");

    if has_framework(profile, "rails") || c.has_file(dir, "bin/rails") {
        c.default_cmd(m, ExecutionType::Run, "bin/rails server");
    } else if c.has_file(dir, "config.ru") {
        c.default_cmd(m, ExecutionType::Run, "bundle exec rackup");
    }

    if has_framework(profile, "rspec") {
        c.default_cmd(m, ExecutionType::Test, "bundle exec rspec");
    } else if c.has_file(dir, "Rakefile") {
        c.default_cmd(m, ExecutionType::Test, "bundle exec rake test");
    }
}

fn dotnet(c: &mut Candidates<'_>, m: &ManifestSignal, profile: &ProjectProfile) {
    c.default_cmd(m, ExecutionType::Install, "dotnet restore");
    c.default_cmd(m, ExecutionType::Build, "dotnet build");

    let tests = !m.dev_dependencies.is_empty()
        || ["xunit", "nunit", "mstest"].iter().any(|t| has_framework(profile, t));
    if tests {
        c.default_cmd(m, ExecutionType::Test, "dotnet test");
    }
    if !m.binaries.is_empty() || !m.library {
        c.default_cmd(m, ExecutionType::Run, "dotnet run");
    }
}

fn dart(c: &mut Candidates<'_>, m: &ManifestSignal, profile: &ProjectProfile) {
    let flutter = has_framework(profile, "flutter");
    let tool = if flutter { "flutter" } else { "dart" };

    c.default_cmd(m, ExecutionType::Install, format!("{} pub get", tool));
    c.default_cmd(m, ExecutionType::Test, format!("{} test", tool));
    if flutter || !m.binaries.is_empty() {
        c.default_cmd(m, ExecutionType::Run, format!("{} run", tool));
    }
}

/// Conventional entry files of ecosystems with no declared run command.
const ENTRY_FALLBACKS: &[(&str, Ecosystem, &str, &str)] = &[
    ("manage.py", Ecosystem::Pip, "python manage.py runserver", "Run the Django development server"),
    ("app.py", Ecosystem::Pip, "python app.py", "Run the Python application"),
    ("main.py", Ecosystem::Pip, "python main.py", "Run the Python application"),
    ("server.js", Ecosystem::Npm, "node server.js", "Run the Node.js server"),
    ("index.js", Ecosystem::Npm, "node index.js", "Run the Node.js application"),
    ("main.go", Ecosystem::Go, "go run main.go", "Run the Go program"),
];

fn entry_fallbacks(c: &mut Candidates<'_>) {
    for (file, ecosystem, command, description) in ENTRY_FALLBACKS {
        if c.has_file("", file) && !c.has_method(*ecosystem, ExecutionType::Run) {
            c.push(
                Some(*ecosystem),
                "",
                ExecutionType::Run,
                *command,
                *description,
                Confidence::Low,
                file,
            );
        }
    }
}

fn make(c: &mut Candidates<'_>, build: &BuildSystemSignal) {
    let dir = parent_of(&build.config_file);
    if build.targets.is_empty() {
        c.push(
            None,
            dir,
            ExecutionType::Build,
            "make",
            "Build using Make",
            Confidence::Medium,
            &build.config_file,
        );
        return;
    }
    for target in &build.targets {
        let method_type = ExecutionType::from_script_name(target);
        c.push(
            None,
            dir,
            method_type,
            format!("make {}", target),
            format!("Run the {} Make target", target),
            Confidence::Medium,
            &build.config_file,
        );
    }
}

fn has_framework(profile: &ProjectProfile, name: &str) -> bool {
    profile.frameworks.iter().any(|f| f.name == name)
}

/// Single-quotes a word unless it only holds characters the shell reads
/// literally.
fn shell_quote(word: &str) -> Cow<'_, str> {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "_-./:@%+=,".contains(ch));
    if plain {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', "'\\''")))
    }
}

fn image_name(tree: &ProjectTree) -> String {
    let name = tree
        .root
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let sanitized: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' { ch } else { '-' })
        .collect();
    if sanitized.is_empty() {
        "app".to_string()
    } else {
        sanitized
    }
}
