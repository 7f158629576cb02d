use super::*;
use crate::ErrorCode;
use pretty_assertions::assert_eq;

fn unresolved(name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E3001).with_message(format!("unresolved symbol `{name}`"))
}

#[test]
fn test_deduplicates_identical() {
    let mut queue = DiagnosticQueue::new();
    assert!(queue.add(unresolved("f")));
    assert!(!queue.add(unresolved("f")));
    assert!(queue.add(unresolved("g")));
    assert_eq!(queue.error_count(), 2);
}

#[test]
fn test_unlimited_keeps_duplicates() {
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig::unlimited());
    queue.add(unresolved("f"));
    queue.add(unresolved("f"));
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_error_limit() {
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig {
        error_limit: 2,
        deduplicate: false,
    });
    queue.add(unresolved("a"));
    queue.add(unresolved("b"));
    assert!(queue.limit_reached());
    assert!(!queue.add(unresolved("c")));
    assert_eq!(queue.suppressed_count(), 1);
    assert!(queue.has_errors().is_some());
    // warnings are not limited
    assert!(queue.add(Diagnostic::warning(ErrorCode::E4001)));
}

#[test]
fn test_flush_resets() {
    let mut queue = DiagnosticQueue::new();
    let _ = queue.emit_error(unresolved("x"));
    let flushed = queue.flush();
    assert_eq!(flushed.len(), 1);
    assert!(queue.is_empty());
    assert!(queue.has_errors().is_none());
}
