//! Content heuristics for extensions shared by several languages and for
//! extensionless scripts.

use once_cell::sync::Lazy;
use regex::Regex;

/// Only the head of a file is inspected.
const SNIFF_LIMIT: usize = 16 * 1024;

static OBJC_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(@interface|@implementation|@protocol|@property|@end\b|#import\s)")
        .unwrap()
});

static CPP_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)(^\s*(class|namespace|template\s*<|using\s+namespace)\b|\bstd::|^\s*(public|private|protected)\s*:|#include\s*<(iostream|string|vector|memory|map)>|\bvirtual\s)",
    )
    .unwrap()
});

static C_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(#include\s*[<\x22]|#define\s|#ifndef\s|typedef\s|struct\s+\w+|extern\s)")
        .unwrap()
});

static MATLAB_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^\s*function\s+.*=|^\s*%|^\s*end\s*$|\b(disp|fprintf|zeros|ones|plot)\s*\()")
        .unwrap()
});

/// Interpreter named on a `#!` line, directly or through `env` (with its
/// flags). Version suffixes such as `python3.12` are dropped.
static SHEBANG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#!\s*(?:\S*/)?(?:env\s+(?:-\S+\s+)*)?([A-Za-z]+)").unwrap()
});

/// Picks a language for an ambiguous extension, or `None` when the content
/// is missing or matches none of the candidates.
pub fn resolve_ambiguous(ext: &str, content: Option<&str>) -> Option<&'static str> {
    let content = head(content?);
    match ext {
        "h" => sniff_header(content),
        "m" => sniff_m_file(content),
        _ => None,
    }
}

/// Language of an extensionless script from its `#!` line.
pub fn resolve_shebang(content: Option<&str>) -> Option<&'static str> {
    let first_line = content?.lines().next()?;
    let interpreter = SHEBANG.captures(first_line)?.get(1)?.as_str();
    match interpreter {
        "sh" | "bash" | "zsh" | "dash" | "ksh" | "ash" => Some("shell"),
        "python" | "pypy" => Some("python"),
        "node" | "nodejs" => Some("javascript"),
        "deno" | "bun" | "tsx" => Some("typescript"),
        "ruby" => Some("ruby"),
        "perl" => Some("perl"),
        "php" => Some("php"),
        "lua" => Some("lua"),
        _ => None,
    }
}

fn sniff_header(content: &str) -> Option<&'static str> {
    if OBJC_MARKERS.is_match(content) {
        Some("objective-c")
    } else if CPP_MARKERS.is_match(content) {
        Some("cpp")
    } else if C_MARKERS.is_match(content) {
        Some("c")
    } else {
        None
    }
}

fn sniff_m_file(content: &str) -> Option<&'static str> {
    if OBJC_MARKERS.is_match(content) {
        Some("objective-c")
    } else if MATLAB_MARKERS.is_match(content) {
        Some("matlab")
    } else {
        None
    }
}

fn head(content: &str) -> &str {
    if content.len() <= SNIFF_LIMIT {
        return content;
    }
    let mut end = SNIFF_LIMIT;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}
