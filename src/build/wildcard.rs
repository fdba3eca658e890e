//! Wildcard pattern matching and expansion
//!
//! Patterns are literal characters plus `?` (any single character), `*`
//! (any run within one path component) and `**` (any run of complete path
//! components, including zero). Matching is case-sensitive and
//! component-aware: neither `?` nor `*` ever crosses a path separator.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Match a relative path against a pattern, component by component
pub fn match_wildcard(pattern: &str, path: &str) -> bool {
    let pattern: Vec<&str> = pattern.split(['/', '\\']).collect();
    let path: Vec<&str> = path.split(['/', '\\']).collect();
    match_components(&pattern, &path)
}

fn match_components(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => {
            (0..=path.len()).any(|skip| match_components(rest, &path[skip..]))
        }
        Some((head, rest)) => match path.split_first() {
            Some((first, remaining)) => {
                match_component(head, first) && match_components(rest, remaining)
            }
            None => false,
        },
    }
}

/// Match one path component with `*` and `?`
fn match_component(pattern: &str, text: &str) -> bool {
    fn matches(pattern: &[char], text: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some(('*', rest)) => (0..=text.len()).any(|skip| matches(rest, &text[skip..])),
            Some(('?', rest)) => match text.split_first() {
                Some((_, remaining)) => matches(rest, remaining),
                None => false,
            },
            Some((c, rest)) => match text.split_first() {
                Some((t, remaining)) if t == c => matches(rest, remaining),
                _ => false,
            },
        }
    }
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    matches(&pattern, &text)
}

/// Expand a pattern into the matching directory entries, sorted.
///
/// The pattern is split at the last separator before the first wildcard
/// into a literal directory prefix and a leaf pattern. A leaf containing
/// `**` walks the whole subtree; a leaf with an intermediate separator
/// matches its first segment against subdirectory names and recurses.
/// Unreadable directories yield no entries.
pub(crate) fn expand(pattern: &str) -> Vec<PathBuf> {
    let first_wild = pattern.find(['*', '?']).unwrap_or(pattern.len());
    let (dir, leaf) = match pattern[..first_wild].rfind(['/', '\\']) {
        Some(i) => (&pattern[..i], &pattern[i + 1..]),
        None => (".", pattern),
    };

    let root = Path::new(dir);
    let mut out = Vec::new();
    if leaf.contains("**") {
        for entry in WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .flatten()
        {
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            if match_wildcard(leaf, &rel.display().to_string()) {
                out.push(strip_current_dir(entry.path()));
            }
        }
    } else {
        expand_in_dir(root, leaf, &mut out);
    }
    out.sort();
    out
}

fn expand_in_dir(dir: &Path, pattern: &str, out: &mut Vec<PathBuf>) {
    let (head, rest) = match pattern.split_once(['/', '\\']) {
        Some((head, rest)) => (head, Some(rest)),
        None => (pattern, None),
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        match rest {
            None => {
                if match_component(head, &name) {
                    out.push(strip_current_dir(&entry.path()));
                }
            }
            Some(rest) => {
                if entry.path().is_dir() && match_component(head, &name) {
                    expand_in_dir(&entry.path(), rest, out);
                }
            }
        }
    }
}

/// Drop a leading `./` so patterns without a directory part expand to the
/// bare relative paths they were written as
fn strip_current_dir(path: &Path) -> PathBuf {
    path.strip_prefix(".").unwrap_or(path).to_path_buf()
}
