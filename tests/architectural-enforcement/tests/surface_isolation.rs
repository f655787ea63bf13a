//! Integration Test: Surface Isolation
//!
//! **Policy**: Each surface loop owns its state outright. Surface modules
//! MUST NOT hold shared lock state (`Mutex`, `RwLock`) or reach into another
//! surface; cross-surface effects go through the event bus.

use architectural_enforcement::{scan, workspace_root};

fn is_shared_lock(code: &str) -> bool {
    code.contains("Mutex") || code.contains("RwLock")
}

#[test]
fn test_no_shared_locks_in_surfaces() {
    let violations = scan(
        &workspace_root().join("companion/core/src/surface"),
        is_shared_lock,
    );

    if !violations.is_empty() {
        eprintln!("\n❌ Shared lock state found in surface modules!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        panic!("\nFound {} shared-lock violation(s).", violations.len());
    }
}

#[test]
fn test_no_shared_locks_in_choreography() {
    let violations = scan(
        &workspace_root().join("companion/core/src/animation"),
        is_shared_lock,
    );
    assert!(violations.is_empty(), "{violations:?}");
}

#[test]
fn test_surfaces_do_not_import_each_other() {
    let root = workspace_root().join("companion/core/src/surface");
    let mut violations = Vec::new();
    for (file, siblings) in [
        ("bubble.rs", ["character::", "weather::"]),
        ("character.rs", ["bubble::", "weather::"]),
        ("weather.rs", ["bubble::", "character::"]),
    ] {
        let dir = root.join(file);
        violations.extend(scan(&dir, |code| {
            code.trim_start().starts_with("use ")
                && siblings.iter().any(|s| code.contains(s))
        }));
    }
    assert!(violations.is_empty(), "{violations:?}");
}
