//! Process-wide engine lifecycle.
//!
//! The construction hook is a process-wide callback: it is installed once,
//! before any node construction or parsing happens, and stays installed
//! for the life of the process. [`init`] performs that installation and is
//! safe to call repeatedly — only the first call installs anything.
//! Document constructors call it themselves, so explicit initialization is
//! only needed by programs that want to control when it happens.
//!
//! [`shutdown`] marks the lifecycle terminated. After shutdown no further
//! tree operations are valid; constructing a document then is a
//! programming error and panics.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Once;

use crate::bridge::hook;
use crate::engine;

const UNINITIALIZED: u8 = 0;
const READY: u8 = 1;
const SHUT_DOWN: u8 = 2;

static STATE: AtomicU8 = AtomicU8::new(UNINITIALIZED);
static INSTALL: Once = Once::new();

/// Initializes the engine lifecycle, installing the construction hook.
///
/// Idempotent: repeated calls are no-ops. The underlying installation
/// happens exactly once per process.
pub fn init() {
    INSTALL.call_once(|| {
        engine::register_construct_hook(hook::on_node_constructed);
        log::debug!("construction hook installed");
    });
    let _ = STATE.compare_exchange(UNINITIALIZED, READY, Ordering::SeqCst, Ordering::SeqCst);
}

/// Tears down the engine lifecycle.
///
/// After this call no further tree operations are valid; constructing a
/// document panics. Call at most once, at the end of the program.
pub fn shutdown() {
    STATE.store(SHUT_DOWN, Ordering::SeqCst);
    log::debug!("engine lifecycle shut down");
}

/// Returns `true` once [`init`] has run and [`shutdown`] has not.
#[must_use]
pub fn is_ready() -> bool {
    STATE.load(Ordering::SeqCst) == READY
}

/// Asserts the lifecycle has not been shut down.
///
/// # Panics
///
/// Panics if [`shutdown`] has been called.
pub(crate) fn assert_not_shut_down() {
    assert_ne!(
        STATE.load(Ordering::SeqCst),
        SHUT_DOWN,
        "engine lifecycle has been shut down; no further tree operations are valid"
    );
}
