//! Switchboard — outbound delivery lines to connected transports.
//!
//! Each WebSocket connection owns an mpsc receiver drained by its sender
//! task; the switchboard holds the matching senders keyed by transport ID.
//! Delivery is best-effort: a full or closed line drops the event.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};

use crate::events::ServerEvent;

/// transport_id → outbound event queue.
#[derive(Debug, Default)]
pub struct Switchboard {
    lines: RwLock<HashMap<String, mpsc::Sender<ServerEvent>>>,
}

impl Switchboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug in a transport's outbound queue.
    pub async fn attach(&self, transport_id: String, tx: mpsc::Sender<ServerEvent>) {
        self.lines.write().await.insert(transport_id, tx);
    }

    /// Remove a transport's line. No-op if already gone.
    pub async fn detach(&self, transport_id: &str) {
        self.lines.write().await.remove(transport_id);
    }

    /// Deliver an event to one transport. Returns false if the transport is
    /// unknown or its queue is full/closed — the event is simply dropped.
    pub async fn send_to(&self, transport_id: &str, event: ServerEvent) -> bool {
        let line = self.lines.read().await.get(transport_id).cloned();
        match line {
            Some(tx) => match tx.try_send(event) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!(transport = %transport_id, "Outbound queue full or closed, event dropped");
                    false
                }
            },
            None => false,
        }
    }

    /// Deliver an event to every connected transport.
    pub async fn broadcast(&self, event: ServerEvent) {
        let lines: Vec<mpsc::Sender<ServerEvent>> =
            self.lines.read().await.values().cloned().collect();
        for tx in lines {
            let _ = tx.try_send(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> (mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn send_to_reaches_only_the_target() {
        let board = Switchboard::new();
        let (tx1, mut rx1) = line();
        let (tx2, mut rx2) = line();
        board.attach("t1".into(), tx1).await;
        board.attach("t2".into(), tx2).await;

        assert!(board.send_to("t1", ServerEvent::CallEnded).await);

        assert_eq!(rx1.try_recv().unwrap(), ServerEvent::CallEnded);
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_unknown_transport_reports_false() {
        let board = Switchboard::new();
        assert!(!board.send_to("t1", ServerEvent::CallEnded).await);
    }

    #[tokio::test]
    async fn broadcast_reaches_everyone() {
        let board = Switchboard::new();
        let (tx1, mut rx1) = line();
        let (tx2, mut rx2) = line();
        board.attach("t1".into(), tx1).await;
        board.attach("t2".into(), tx2).await;

        board
            .broadcast(ServerEvent::GetOnlineUsers(vec!["u1".into()]))
            .await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn detached_transport_no_longer_receives() {
        let board = Switchboard::new();
        let (tx, mut rx) = line();
        board.attach("t1".into(), tx).await;
        board.detach("t1").await;

        assert!(!board.send_to("t1", ServerEvent::CallEnded).await);
        assert!(rx.try_recv().is_err());
    }
}
