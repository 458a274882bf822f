//! Static language table: extensions, kinds, comment syntax and ecosystems.

pub mod sniff;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::dependencies::Ecosystem;
use crate::tree::FileNode;

/// Language name used when an ambiguous extension cannot be resolved.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageKind {
    /// General purpose source code
    Programming,
    /// Presentation source (HTML, stylesheets)
    Markup,
    /// Configuration and data formats
    Data,
    /// Documentation text
    Prose,
}

impl LanguageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageKind::Programming => "programming",
            LanguageKind::Markup => "markup",
            LanguageKind::Data => "data",
            LanguageKind::Prose => "prose",
        }
    }

    /// Kinds that count toward the language signal and line metrics.
    pub fn is_source(&self) -> bool {
        matches!(self, LanguageKind::Programming | LanguageKind::Markup)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommentSyntax {
    pub line: &'static [&'static str],
    pub block: &'static [(&'static str, &'static str)],
}

const C_STYLE: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: &[("/*", "*/")],
};
const HASH: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: &[],
};
const PYTHON: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: &[("\"\"\"", "\"\"\""), ("'''", "'''")],
};
const RUBY: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: &[("=begin", "=end")],
};
const PHP: CommentSyntax = CommentSyntax {
    line: &["//", "#"],
    block: &[("/*", "*/")],
};
const DASH_DASH: CommentSyntax = CommentSyntax {
    line: &["--"],
    block: &[("/*", "*/")],
};
const HASKELL: CommentSyntax = CommentSyntax {
    line: &["--"],
    block: &[("{-", "-}")],
};
const LUA: CommentSyntax = CommentSyntax {
    line: &["--"],
    block: &[("--[[", "]]")],
};
const ML: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: &[("(*", "*)")],
};
const JULIA: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: &[("#=", "=#")],
};
const POWERSHELL: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: &[("<#", "#>")],
};
const MATLAB: CommentSyntax = CommentSyntax {
    line: &["%"],
    block: &[("%{", "%}")],
};
const HTML: CommentSyntax = CommentSyntax {
    line: &[],
    block: &[("<!--", "-->")],
};
const CSS: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: &[("/*", "*/")],
};
const COMPONENT: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: &[("/*", "*/"), ("<!--", "-->")],
};
const NONE: CommentSyntax = CommentSyntax {
    line: &[],
    block: &[],
};

#[derive(Debug)]
pub struct LanguageDef {
    pub name: &'static str,
    pub kind: LanguageKind,
    pub extensions: &'static [&'static str],
    pub comments: CommentSyntax,
    pub ecosystems: &'static [Ecosystem],
}

macro_rules! lang {
    ($name:expr, $kind:ident, [$($ext:expr),*], $comments:expr, [$($eco:ident),*]) => {
        LanguageDef {
            name: $name,
            kind: LanguageKind::$kind,
            extensions: &[$($ext),*],
            comments: $comments,
            ecosystems: &[$(Ecosystem::$eco),*],
        }
    };
}

static LANGUAGES: &[LanguageDef] = &[
    lang!("javascript", Programming, ["js", "jsx", "mjs", "cjs"], C_STYLE, [Npm]),
    lang!("typescript", Programming, ["ts", "tsx", "mts", "cts"], C_STYLE, [Npm]),
    lang!("python", Programming, ["py", "pyi", "pyw"], PYTHON, [Pip]),
    lang!("java", Programming, ["java"], C_STYLE, [Maven, Gradle]),
    lang!("kotlin", Programming, ["kt", "kts"], C_STYLE, [Gradle, Maven]),
    lang!("scala", Programming, ["scala", "sc"], C_STYLE, [Gradle, Maven]),
    lang!("go", Programming, ["go"], C_STYLE, [Go]),
    lang!("rust", Programming, ["rs"], C_STYLE, [Cargo]),
    lang!("c", Programming, ["c"], C_STYLE, []),
    lang!("cpp", Programming, ["cpp", "cc", "cxx", "c++", "hpp", "hh", "hxx"], C_STYLE, []),
    lang!("csharp", Programming, ["cs", "csx"], C_STYLE, [Nuget]),
    lang!("fsharp", Programming, ["fs", "fsi", "fsx"], ML, [Nuget]),
    lang!("php", Programming, ["php"], PHP, [Composer]),
    lang!("ruby", Programming, ["rb", "rake", "gemspec"], RUBY, [Bundler]),
    lang!("swift", Programming, ["swift"], C_STYLE, []),
    lang!("objective-c", Programming, ["mm"], C_STYLE, []),
    lang!("matlab", Programming, [], MATLAB, []),
    lang!("dart", Programming, ["dart"], C_STYLE, [Pub]),
    lang!("elixir", Programming, ["ex", "exs"], HASH, []),
    lang!("haskell", Programming, ["hs"], HASKELL, []),
    lang!("lua", Programming, ["lua"], LUA, []),
    lang!("perl", Programming, ["pl", "pm"], HASH, []),
    lang!("r", Programming, ["r"], HASH, []),
    lang!("julia", Programming, ["jl"], JULIA, []),
    lang!("shell", Programming, ["sh", "bash", "zsh"], HASH, []),
    lang!("powershell", Programming, ["ps1", "psm1"], POWERSHELL, []),
    lang!("sql", Programming, ["sql"], DASH_DASH, []),
    lang!("vue", Programming, ["vue"], COMPONENT, [Npm]),
    lang!("svelte", Programming, ["svelte"], COMPONENT, [Npm]),
    lang!("html", Markup, ["html", "htm"], HTML, []),
    lang!("css", Markup, ["css", "scss", "sass", "less"], CSS, []),
    lang!("json", Data, ["json", "jsonc"], NONE, []),
    lang!("yaml", Data, ["yaml", "yml"], HASH, []),
    lang!("toml", Data, ["toml"], HASH, []),
    lang!("xml", Data, ["xml", "csproj", "fsproj", "vbproj", "props", "targets", "plist"], HTML, []),
    lang!("gradle", Data, ["gradle"], C_STYLE, []),
    lang!("ini", Data, ["ini", "cfg", "conf", "properties"], HASH, []),
    lang!("dockerfile", Data, [], HASH, []),
    lang!("makefile", Data, ["mk"], HASH, []),
    lang!("cmake", Data, ["cmake"], HASH, []),
    lang!("markdown", Prose, ["md", "markdown", "mdx"], HTML, []),
    lang!("restructuredtext", Prose, ["rst"], NONE, []),
    lang!("text", Prose, ["txt", "adoc"], NONE, []),
];

/// Extensions shared by several languages; resolved by content sniffing.
const AMBIGUOUS_EXTENSIONS: &[&str] = &["h", "m"];

/// Files recognized by exact name rather than extension.
const NAMED_FILES: &[(&str, &str)] = &[
    ("Dockerfile", "dockerfile"),
    ("Containerfile", "dockerfile"),
    ("Makefile", "makefile"),
    ("makefile", "makefile"),
    ("GNUmakefile", "makefile"),
    ("CMakeLists.txt", "cmake"),
];

/// Extensionless names that are never scripts.
const PLAIN_TEXT_NAMES: &[&str] = &[
    "LICENSE",
    "LICENCE",
    "COPYING",
    "NOTICE",
    "AUTHORS",
    "CONTRIBUTORS",
    "CHANGELOG",
    "README",
    "VERSION",
    "CODEOWNERS",
    "OWNERS",
];

/// Manifests, markers and build configs read before anything else.
const CONFIG_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "Pipfile",
    "setup.cfg",
    "Cargo.toml",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "settings.gradle.kts",
    "go.mod",
    "composer.json",
    "Gemfile",
    "pubspec.yaml",
    "pnpm-workspace.yaml",
    "Makefile",
    "makefile",
    "GNUmakefile",
    "Dockerfile",
    "angular.json",
    "tsconfig.json",
];

/// Extensionless text files worth reading.
const TEXT_FILE_NAMES: &[&str] = &[
    "Gemfile",
    "Pipfile",
    "Rakefile",
    "Procfile",
    "Jenkinsfile",
    "Dockerfile",
    "Containerfile",
    "Makefile",
    "makefile",
    "GNUmakefile",
    "artisan",
];

/// Global language registry instance (lazily initialized)
pub static REGISTRY: Lazy<LanguageRegistry> = Lazy::new(LanguageRegistry::new);

pub struct LanguageRegistry {
    by_name: HashMap<&'static str, &'static LanguageDef>,
    by_extension: HashMap<&'static str, &'static LanguageDef>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut by_name = HashMap::new();
        let mut by_extension = HashMap::new();
        for def in LANGUAGES {
            by_name.insert(def.name, def);
            for ext in def.extensions {
                by_extension.insert(*ext, def);
            }
        }
        Self {
            by_name,
            by_extension,
        }
    }

    pub fn get(&self, name: &str) -> Option<&'static LanguageDef> {
        self.by_name.get(name).copied()
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<&'static LanguageDef> {
        self.by_extension.get(ext).copied()
    }

    pub fn is_ambiguous(&self, ext: &str) -> bool {
        AMBIGUOUS_EXTENSIONS.contains(&ext)
    }

    /// Resolves the language of a file.
    ///
    /// Returns `None` for files the table does not know, and [`UNKNOWN`] for
    /// ambiguous extensions whose content gives no clear answer.
    pub fn detect(&self, file: &FileNode, content: Option<&str>) -> Option<&'static str> {
        if let Some((_, lang)) = NAMED_FILES.iter().find(|(name, _)| *name == file.file_name()) {
            return Some(*lang);
        }
        let Some(ext) = file.extension() else {
            return sniff::resolve_shebang(content);
        };
        if self.is_ambiguous(ext) {
            return Some(sniff::resolve_ambiguous(ext, content).unwrap_or(UNKNOWN));
        }
        self.get_by_extension(ext).map(|def| def.name)
    }

    pub fn kind_of(&self, language: &str) -> Option<LanguageKind> {
        if language == UNKNOWN {
            return Some(LanguageKind::Programming);
        }
        self.get(language).map(|def| def.kind)
    }

    pub fn ecosystems_of(&self, language: &str) -> &'static [Ecosystem] {
        self.get(language).map(|def| def.ecosystems).unwrap_or(&[])
    }

    pub fn is_config_file(&self, file_name: &str) -> bool {
        CONFIG_FILES.contains(&file_name)
            || file_name.ends_with(".csproj")
            || file_name.ends_with(".fsproj")
    }

    /// Whether the walker should load this file's content.
    pub fn should_read(&self, file_name: &str, ext: Option<&str>) -> bool {
        if self.is_config_file(file_name) || TEXT_FILE_NAMES.contains(&file_name) {
            return true;
        }
        if file_name.starts_with("requirements") && file_name.ends_with(".txt") {
            return true;
        }
        match ext {
            Some(ext) => self.is_ambiguous(ext) || self.by_extension.contains_key(ext),
            // possible script; the shebang decides
            None => !file_name.starts_with('.') && !PLAIN_TEXT_NAMES.contains(&file_name),
        }
    }

    /// All languages in table order.
    pub fn languages(&self) -> impl Iterator<Item = &'static LanguageDef> {
        LANGUAGES.iter()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
