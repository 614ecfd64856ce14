//! Cooperative cancellation.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag asking a running engine to give up.
///
/// Cancellation is advisory: engines poll the flag at natural boundaries
/// (before a saturation pass, before a branching decision) and report
/// [`Verdict::Unknown`](crate::verdict::Verdict::Unknown) once they see it.
/// Clones share the same flag and may be handed to other threads.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, untripped token.
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Ask the engine holding this token to stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
