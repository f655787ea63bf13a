//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the core and the daemon MUST NOT call
//! sleep methods. Delays are deadlines owned by a timer slot
//! (`sleep_until` / `interval_at`), so they can be cancelled and restarted.
//! **Exceptions**: test code (`#[cfg(test)]` modules and `tests/`)

use architectural_enforcement::{scan, workspace_root};

fn is_sleep_call(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

#[test]
fn test_no_sleep_in_production_code() {
    let root = workspace_root();
    let mut violations = Vec::new();
    for dir in ["companion/core/src", "companion/daemon/src"] {
        violations.extend(scan(&root.join(dir), is_sleep_call));
    }

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use a TimerSlot (sleep_until / interval_at) instead.");
        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}

#[test]
fn test_scanned_directories_exist() {
    let root = workspace_root();
    assert!(root.join("companion/core/src/timer.rs").exists());
    assert!(root.join("companion/daemon/src/main.rs").exists());
}

#[test]
fn test_detector_matches_sleep_calls_only() {
    assert!(is_sleep_call("tokio::time::sleep(d).await;"));
    assert!(is_sleep_call("std::thread::sleep(d);"));
    assert!(!is_sleep_call("time::sleep_until(deadline).await;"));
}
