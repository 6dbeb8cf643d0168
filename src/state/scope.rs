//! View-lifetime cancellation
//!
//! A [`ViewScope`] is bound to the lifetime of one view (a request, or a
//! signed-in session). Fetches run through [`ViewScope::run`]; once the scope
//! is cancelled any pending fetch is abandoned and resolves to
//! [`HostelBridgeError::Cancelled`], so late results are never applied.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::utils::errors::{HostelBridgeError, Result};

#[derive(Debug, Clone)]
pub struct ViewScope {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
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

    /// Resolve once the scope is cancelled
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so the wait only ends on cancellation
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Run a fetch inside the scope
    pub async fn run<T, F>(&self, fetch: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(HostelBridgeError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(HostelBridgeError::Cancelled),
            result = fetch => result,
        }
    }
}

/// Cancels its scope when dropped, tying the scope to a stack frame
#[derive(Debug)]
pub struct ScopeGuard(ViewScope);

impl ScopeGuard {
    pub fn new(scope: ViewScope) -> Self {
        Self(scope)
    }

    pub fn scope(&self) -> &ViewScope {
        &self.0
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
