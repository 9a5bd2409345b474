use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::{Receiver, Sender};

/// One-shot cancellation signal for a single supervised run.
///
/// The timer side of a timeout race holds a handle and the side that waits on the child process
/// holds a [CancelListener]. Both [CancelHandle::expire] and [CancelHandle::cancel] are idempotent,
/// so it does not matter which side of the race finishes first or how often either is called.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Sender<()>,
    expired: Arc<AtomicBool>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
            expired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark the deadline as passed without waking any listeners.
    ///
    /// The timeout path calls this before running a kill command, so that a child which exits
    /// because of the kill command is still classified as timed out.
    pub fn expire(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    /// Whether the deadline has passed, regardless of whether listeners have been woken yet.
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// Expire the handle and wake every listener.
    pub fn cancel(&self) {
        self.expire();
        if let Err(e) = self.sender.send(()) {
            // Nobody is listening any more, the run has already finished.
            log::trace!("Cancel signal had no listeners: {e:?}");
        }
    }

    pub fn new_listener(&self) -> CancelListener {
        CancelListener {
            receiver: self.sender.subscribe(),
        }
    }
}

#[derive(Debug)]
pub struct CancelListener {
    receiver: Receiver<()>,
}

impl CancelListener {
    /// Wait until [CancelHandle::cancel] is called.
    ///
    /// If every handle is dropped without cancelling then this never resolves, which makes it safe
    /// to race against other work with `tokio::select!`.
    pub async fn wait_for_cancel(&mut self) {
        match self.receiver.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
