//! Cooperative job cancellation

use crate::types::{ImposeError, Result};
use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation flag shared by every task of a job
///
/// Cloning is cheap; all clones observe the same flag. Long-running work
/// calls [`checkpoint`](Self::checkpoint) between units of work.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// `Err(Cancelled)` once the job has been cancelled
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ImposeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when the job is cancelled
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as any token, so this only ends on cancel
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(clone.checkpoint().is_ok());

        token.cancel();
        assert!(clone.is_cancelled());
        assert!(matches!(clone.checkpoint(), Err(ImposeError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_future_completes() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.unwrap();
    }
}
