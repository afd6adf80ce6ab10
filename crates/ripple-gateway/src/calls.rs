//! Ring-timeout bookkeeping for unanswered calls.
//!
//! The gateway itself keeps no call state — signaling is a pass-through —
//! except for this optional table of ringing calls. When a ring timeout is
//! configured, each `callUser` records a `(caller, callee)` entry with a
//! generation token; the timer that fires later only acts if its token is
//! still present, so an answer, a hang-up, or a disconnect in the meantime
//! cancels it cleanly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

/// Pending (ringing) calls, keyed caller → callee.
#[derive(Debug, Default)]
pub struct PendingCalls {
    ringing: RwLock<HashMap<(String, String), u64>>,
    next_token: AtomicU64,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ringing call. A re-dial to the same callee replaces the
    /// previous entry, invalidating its timer.
    pub async fn begin(&self, caller: &str, callee: &str) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.ringing
            .write()
            .await
            .insert((caller.to_string(), callee.to_string()), token);
        token
    }

    /// Clear a ringing call (answered or explicitly ended). Checks both
    /// orientations since either party may settle it.
    pub async fn settle(&self, a: &str, b: &str) {
        let mut ringing = self.ringing.write().await;
        ringing.remove(&(a.to_string(), b.to_string()));
        ringing.remove(&(b.to_string(), a.to_string()));
    }

    /// Clear every ringing call where `caller` is the calling side.
    /// Used when the callee's identity is unknown.
    pub async fn settle_outgoing(&self, caller: &str) {
        self.ringing
            .write()
            .await
            .retain(|(from, _), _| from != caller);
    }

    /// Clear every ringing call involving a user (on disconnect).
    pub async fn abandon(&self, user_id: &str) {
        self.ringing
            .write()
            .await
            .retain(|(from, to), _| from != user_id && to != user_id);
    }

    /// Timer expiry: remove and report true only if this exact ring is
    /// still pending. A stale token means the call was settled or re-dialed.
    pub async fn expire(&self, caller: &str, callee: &str, token: u64) -> bool {
        let mut ringing = self.ringing.write().await;
        let key = (caller.to_string(), callee.to_string());
        if ringing.get(&key) == Some(&token) {
            ringing.remove(&key);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settled_ring_does_not_expire() {
        let calls = PendingCalls::new();
        let token = calls.begin("a", "b").await;
        calls.settle("b", "a").await; // callee side settles
        assert!(!calls.expire("a", "b", token).await);
    }

    #[tokio::test]
    async fn unanswered_ring_expires_once() {
        let calls = PendingCalls::new();
        let token = calls.begin("a", "b").await;
        assert!(calls.expire("a", "b", token).await);
        assert!(!calls.expire("a", "b", token).await);
    }

    #[tokio::test]
    async fn redial_invalidates_previous_timer() {
        let calls = PendingCalls::new();
        let stale = calls.begin("a", "b").await;
        let fresh = calls.begin("a", "b").await;
        assert!(!calls.expire("a", "b", stale).await);
        assert!(calls.expire("a", "b", fresh).await);
    }

    #[tokio::test]
    async fn abandon_clears_both_directions() {
        let calls = PendingCalls::new();
        let out = calls.begin("a", "b").await;
        let inbound = calls.begin("c", "a").await;
        calls.abandon("a").await;
        assert!(!calls.expire("a", "b", out).await);
        assert!(!calls.expire("c", "a", inbound).await);
    }
}
