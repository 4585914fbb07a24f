//! Lifecycle teardown tests.
//!
//! Shutdown is process-global, so these live in their own test binary:
//! cargo runs each integration test file as a separate process, keeping
//! the terminated state away from the rest of the suite.

use xmlbind::Document;

#[test]
#[should_panic(expected = "shut down")]
fn test_construction_after_shutdown_panics_and_init_cannot_revive() {
    xmlbind::init();
    assert!(xmlbind::bridge::lifecycle::is_ready());

    xmlbind::shutdown();
    assert!(!xmlbind::bridge::lifecycle::is_ready());

    // init after shutdown is a no-op: the lifecycle stays terminated.
    xmlbind::init();
    assert!(!xmlbind::bridge::lifecycle::is_ready());

    let _doc = Document::new();
}
