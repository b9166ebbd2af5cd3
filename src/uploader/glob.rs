use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

/// Artifact pattern matched against paths relative to the build output dir.
///
/// `*` and `?` never cross a `/`, `**/` spans any number of directories and
/// `[...]` / `[!...]` are character classes. A pattern starting with `./` is
/// matched at the top of the output dir only; any other pattern matches at
/// every depth. Hidden entries are skipped unless the pattern names one.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
    max_depth: Option<usize>,
    allow_hidden: bool,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let (body, rooted) = match pattern.strip_prefix("./") {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };

        let translated = translate(body);
        let source = if rooted {
            format!("^{}$", translated)
        } else {
            format!("^(?:.*/)?{}$", translated)
        };
        let regex = Regex::new(&source).context(format!("Invalid artifact pattern: {}", pattern))?;

        let max_depth = if rooted && !body.contains("**") {
            Some(body.split('/').filter(|s| !s.is_empty()).count().max(1))
        } else {
            None
        };

        Ok(Self {
            regex,
            max_depth,
            allow_hidden: body.split('/').any(|segment| segment.starts_with('.')),
        })
    }

    /// Whether a `/`-separated relative path matches
    pub fn is_match(&self, relative_path: &str) -> bool {
        self.regex.is_match(relative_path)
    }

    /// All entries under `root` matching this pattern, sorted by path.
    ///
    /// Directories are returned too; callers decide what to do with them.
    pub fn find(&self, root: &Path) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let allow_hidden = self.allow_hidden;
        walker
            .into_iter()
            .filter_entry(|entry| allow_hidden || !is_hidden(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| {
                relative_key(root, entry.path())
                    .map(|relative| self.is_match(&relative))
                    .unwrap_or(false)
            })
            .map(DirEntry::into_path)
            .collect()
    }
}

/// Find everything under `root` matching `pattern`.
///
/// An invalid pattern is logged and matches nothing.
pub fn find_matches(root: &Path, pattern: &str) -> Vec<PathBuf> {
    match GlobPattern::new(pattern) {
        Ok(glob) => glob.find(root),
        Err(e) => {
            warn!("Ignore artifact pattern {}: {:#}", pattern, e);
            Vec::new()
        }
    }
}

/// `path` relative to `root`, with `/` separators
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|relative| relative.to_string_lossy().replace('\\', "/"))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Translate glob syntax into a regex fragment
fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:[^/]+/)*");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let close = chars[i + 1..].iter().position(|&c| c == ']').map(|p| p + i + 1);
                match close {
                    Some(end) if end > i + 1 => {
                        out.push_str(&translate_class(&chars[i + 1..end]));
                        i = end + 1;
                        continue;
                    }
                    _ => out.push_str(r"\["),
                }
            }
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
        i += 1;
    }

    out
}

fn translate_class(class: &[char]) -> String {
    let (negated, body) = match class.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, class),
    };

    let mut out = String::from(if negated { "[^" } else { "[" });
    for &c in body {
        if matches!(c, '\\' | '[' | '&' | '~' | '^') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(']');
    out
}
