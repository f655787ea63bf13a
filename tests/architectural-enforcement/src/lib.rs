//! Architectural Enforcement Integration Tests
//!
//! Source-scanning checks that keep the companion honest:
//! - No sleep() calls in production code; timers use `sleep_until` or
//!   `interval_at` owned by a timer slot
//! - No shared lock state inside surface modules; surfaces own their state
//!   and talk over the bus
//! - No blocking file, network or process I/O outside the few startup and
//!   store files that are allowed it

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, resolved from this crate's manifest
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// A source line that breaks a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File the line is in
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Production lines of a Rust source file
///
/// Comments are stripped and scanning stops at the first `#[cfg(test)]`.
#[must_use]
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .filter_map(|(idx, line)| {
            let code = line.split("//").next().unwrap_or(line);
            (!code.trim().is_empty()).then_some((idx + 1, code))
        })
        .collect()
}

/// Scan every `.rs` file under `dir` for production lines matching `is_bad`
pub fn scan(dir: &Path, is_bad: impl Fn(&str) -> bool) -> Vec<Violation> {
    scan_except(dir, &[], is_bad)
}

/// Like [`scan`], skipping files whose name is in `allowed`
pub fn scan_except(
    dir: &Path,
    allowed: &[&str],
    is_bad: impl Fn(&str) -> bool,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    if !dir.exists() {
        return violations;
    }
    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        if path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| allowed.contains(&name))
        {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        for (line, code) in production_lines(&content) {
            if is_bad(code) {
                violations.push(Violation {
                    path: path.to_path_buf(),
                    line,
                    text: code.trim().to_string(),
                });
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_skip_comments_and_tests() {
        let src = "fn a() {}\n// sleep(1)\nlet x = 1; // trailing\n#[cfg(test)]\nfn b() {}\n";
        let lines = production_lines(src);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].0, 3);
        assert!(!lines[1].1.contains("trailing"));
    }
}
