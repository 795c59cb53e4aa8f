//! A cloneable handle for stopping the active stream from external code.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::session::ActiveSession;

/// A cloneable handle onto the client's active session slot.
///
/// Useful for UI code that owns a stop button but not the client itself.
/// Cloning is cheap; all clones observe the same slot.
#[derive(Clone)]
pub struct ChatHandle {
    pub(crate) session: Arc<Mutex<Option<ActiveSession>>>,
}

impl ChatHandle {
    /// Cancel the active stream session, if any.
    ///
    /// Cancellation is cooperative: the pump resolves promptly and the client
    /// performs its local cleanup; no error is surfaced.
    pub fn stop(&self) {
        if let Some(session) = self.session.lock().as_ref() {
            session.shutdown();
        }
    }

    /// Whether a stream session is currently in flight
    pub fn is_streaming(&self) -> bool {
        self.session.lock().is_some()
    }
}
