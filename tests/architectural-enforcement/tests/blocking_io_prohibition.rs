//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Production code in the core and the daemon MUST NOT use
//! blocking I/O on the async runtime. Use `tokio::fs`, `tokio::io` or
//! `store::persist` (which runs on the blocking pool).
//! **Exceptions**:
//! - `store.rs`: the file store itself; its writes reach it through
//!   `persist` and its read happens once at open
//! - `config.rs`: read once before any surface starts
//! - `headless.rs`: the content fixture, read once at startup
//! - test code (`#[cfg(test)]` modules and `tests/`)

use architectural_enforcement::{scan_except, workspace_root};

const ALLOWED: &[&str] = &["store.rs", "config.rs", "headless.rs"];

fn is_blocking_io(code: &str) -> bool {
    code.contains("std::fs")
        || code.contains("std::net")
        || (code.contains("std::process::Command") && !code.contains("tokio::process"))
        || code.contains("std::io::stdin()")
        || code.contains("reqwest::blocking")
}

#[test]
fn test_no_blocking_io_in_production_code() {
    let root = workspace_root();
    let mut violations = Vec::new();
    for dir in ["companion/core/src", "companion/daemon/src"] {
        violations.extend(scan_except(&root.join(dir), ALLOWED, is_blocking_io));
    }

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Blocking I/O calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ REQUIRED async I/O:");
        eprintln!("  - tokio::fs / tokio::io");
        eprintln!("  - store::persist(..).await for state writes");
        panic!(
            "\nFound {} blocking I/O violation(s) in production code.",
            violations.len()
        );
    }
}

#[test]
fn test_allowed_files_exist() {
    let root = workspace_root();
    assert!(root.join("companion/core/src/store.rs").exists());
    assert!(root.join("companion/core/src/config.rs").exists());
    assert!(root.join("companion/daemon/src/headless.rs").exists());
}

#[test]
fn test_detector_matches_blocking_calls_only() {
    assert!(is_blocking_io("let text = std::fs::read_to_string(path)?;"));
    assert!(is_blocking_io("use std::net::TcpStream;"));
    assert!(is_blocking_io("let line = std::io::stdin().read_line(&mut s);"));
    assert!(!is_blocking_io("let text = tokio::fs::read_to_string(path).await?;"));
    assert!(!is_blocking_io("store::persist(store, entries).await"));
}
