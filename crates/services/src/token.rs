use std::sync::Arc;

use tokio::sync::watch;

/// Cancellation flag shared by everything spawned for one lesson session.
///
/// Clones observe the same flag. Once cancelled it stays cancelled.
#[derive(Clone, Debug)]
pub struct SessionToken {
    flag: Arc<watch::Sender<bool>>,
}

impl SessionToken {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { flag: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once [`SessionToken::cancel`] has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}
