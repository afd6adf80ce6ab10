//! Event routing — one handler per inbound event.
//!
//! Every forwarding handler resolves the target through the connection
//! registry and silently no-ops when the target is offline: at-most-once,
//! best-effort, no acknowledgement and no queue. Nothing here surfaces an
//! error back to the sender.

use ripple_common::auth::Claims;

use crate::GatewayState;
use crate::events::{ClientEvent, ServerEvent};

/// A chat message handed off for persistence.
///
/// Produced by the `sendMessage` path and drained by a writer task outside
/// the gateway; live delivery never waits on it. IDs stay strings here —
/// parsing and any resulting drop happen on the writer's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub conversation_id: String,
    pub sender_id: String,
    pub text: String,
}

/// Route one inbound event from a connected transport.
pub async fn dispatch(
    state: &GatewayState,
    transport_id: &str,
    claims: &Claims,
    event: ClientEvent,
) {
    match event {
        ClientEvent::AddUser { user_id } => {
            if user_id != claims.sub {
                tracing::warn!(
                    claimed = %user_id,
                    authenticated = %claims.sub,
                    "Presence registration does not match token subject"
                );
            }
            if state.registry.add(&user_id, transport_id).await {
                tracing::info!(user = %user_id, transport = %transport_id, "Presence registered");
            }
            // Full-state broadcast on every registration, changed or not —
            // clients replace their copy wholesale.
            broadcast_presence(state).await;
        }

        ClientEvent::SendMessage {
            conversation_id,
            sender_id,
            receiver_id,
            text,
        } => {
            if let Some(entry) = state.registry.find(&receiver_id).await {
                state
                    .switchboard
                    .send_to(
                        &entry.transport_id,
                        ServerEvent::ReceiveMessage {
                            conversation_id: conversation_id.clone(),
                            sender_id: sender_id.clone(),
                            text: text.clone(),
                        },
                    )
                    .await;
            }
            // Hand off for persistence whether or not the receiver was
            // online; history is the store's job, not the relay's.
            let _ = state.archive_tx.try_send(MessageRecord {
                conversation_id,
                sender_id,
                text,
            });
        }

        ClientEvent::CallUser {
            from_user_id,
            to_user_id,
            offer,
            call_type,
        } => {
            let Some(entry) = state.registry.find(&to_user_id).await else {
                return;
            };
            state
                .switchboard
                .send_to(
                    &entry.transport_id,
                    ServerEvent::IncomingCall {
                        from_user_id: from_user_id.clone(),
                        offer,
                        call_type,
                    },
                )
                .await;

            if let Some(timeout) = state.options.ring_timeout {
                let token = state.calls.begin(&from_user_id, &to_user_id).await;
                let state = state.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(timeout).await;
                    if state.calls.expire(&from_user_id, &to_user_id, token).await {
                        tracing::info!(
                            caller = %from_user_id,
                            callee = %to_user_id,
                            "Call rang out unanswered"
                        );
                        for user in [&from_user_id, &to_user_id] {
                            if let Some(entry) = state.registry.find(user).await {
                                state
                                    .switchboard
                                    .send_to(&entry.transport_id, ServerEvent::CallEnded)
                                    .await;
                            }
                        }
                    }
                });
            }
        }

        ClientEvent::AnswerCall { to_user_id, answer } => {
            if let Some(entry) = state.registry.find(&to_user_id).await {
                state
                    .switchboard
                    .send_to(&entry.transport_id, ServerEvent::CallAnswered { answer })
                    .await;
            }
            match state.registry.find_by_transport(transport_id).await {
                Some(me) => state.calls.settle(&to_user_id, &me.user_id).await,
                None => state.calls.settle_outgoing(&to_user_id).await,
            }
        }

        ClientEvent::IceCandidate {
            to_user_id,
            candidate,
        } => {
            if let Some(entry) = state.registry.find(&to_user_id).await {
                state
                    .switchboard
                    .send_to(&entry.transport_id, ServerEvent::IceCandidate { candidate })
                    .await;
            }
        }

        ClientEvent::EndCall { to_user_id } => {
            if let Some(entry) = state.registry.find(&to_user_id).await {
                state
                    .switchboard
                    .send_to(&entry.transport_id, ServerEvent::CallEnded)
                    .await;
            }
            match state.registry.find_by_transport(transport_id).await {
                Some(me) => state.calls.settle(&me.user_id, &to_user_id).await,
                None => state.calls.settle_outgoing(&to_user_id).await,
            }
        }
    }
}

/// Transport-level disconnect: detach the line, drop the registry entry,
/// forget any ringing calls, and rebroadcast presence.
pub async fn disconnect(state: &GatewayState, transport_id: &str) {
    state.switchboard.detach(transport_id).await;
    if let Some(entry) = state.registry.remove(transport_id).await {
        state.calls.abandon(&entry.user_id).await;
        tracing::info!(user = %entry.user_id, transport = %transport_id, "Client disconnected");
    }
    broadcast_presence(state).await;
}

/// Push the full online set to every connected transport.
pub async fn broadcast_presence(state: &GatewayState) {
    let online = state.registry.online_user_ids().await;
    state
        .switchboard
        .broadcast(ServerEvent::GetOnlineUsers(online))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CallType;
    use crate::registry::ConnectionRegistry;
    use crate::{GatewayOptions, GatewayState};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn test_state(
        ring_timeout: Option<Duration>,
    ) -> (GatewayState, mpsc::Receiver<MessageRecord>) {
        let (archive_tx, archive_rx) = mpsc::channel(64);
        let options = GatewayOptions {
            jwt_secret: "test-secret".into(),
            ring_timeout,
            send_buffer: 16,
        };
        let state = GatewayState::new(Arc::new(ConnectionRegistry::new()), archive_tx, options);
        (state, archive_rx)
    }

    fn claims_for(user: &str) -> Claims {
        Claims {
            sub: user.into(),
            username: user.into(),
            role: "user".into(),
            iat: 0,
            exp: i64::MAX,
            token_type: "access".into(),
        }
    }

    /// Attach a transport and register presence, as a connecting client does.
    async fn join(state: &GatewayState, user: &str) -> (String, mpsc::Receiver<ServerEvent>) {
        let transport_id = format!("t-{user}");
        let (tx, rx) = mpsc::channel(16);
        state.switchboard.attach(transport_id.clone(), tx).await;
        dispatch(
            state,
            &transport_id,
            &claims_for(user),
            ClientEvent::AddUser {
                user_id: user.into(),
            },
        )
        .await;
        (transport_id, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn last_online_set(events: &[ServerEvent]) -> Vec<String> {
        let mut users = events
            .iter()
            .rev()
            .find_map(|e| match e {
                ServerEvent::GetOnlineUsers(users) => Some(users.clone()),
                _ => None,
            })
            .expect("no getOnlineUsers broadcast seen");
        users.sort();
        users
    }

    #[tokio::test]
    async fn both_clients_see_full_online_set_after_second_registration() {
        let (state, _archive) = test_state(None);
        let (_t1, mut rx1) = join(&state, "u1").await;
        let (_t2, mut rx2) = join(&state, "u2").await;

        let expected = vec!["u1".to_string(), "u2".to_string()];
        assert_eq!(last_online_set(&drain(&mut rx1)), expected);
        assert_eq!(last_online_set(&drain(&mut rx2)), expected);
    }

    #[tokio::test]
    async fn message_to_online_receiver_is_delivered_exactly_once_intact() {
        let (state, mut archive) = test_state(None);
        let (t1, mut rx1) = join(&state, "u1").await;
        let (_t2, mut rx2) = join(&state, "u2").await;
        drain(&mut rx1);
        drain(&mut rx2);

        dispatch(
            &state,
            &t1,
            &claims_for("u1"),
            ClientEvent::SendMessage {
                conversation_id: "c1".into(),
                sender_id: "u1".into(),
                receiver_id: "u2".into(),
                text: "hi".into(),
            },
        )
        .await;

        let delivered = drain(&mut rx2);
        assert_eq!(
            delivered,
            vec![ServerEvent::ReceiveMessage {
                conversation_id: "c1".into(),
                sender_id: "u1".into(),
                text: "hi".into(),
            }]
        );
        // No echo back to the sender.
        assert!(drain(&mut rx1).is_empty());
        // The archive channel got the copy for persistence.
        assert_eq!(
            archive.try_recv().unwrap(),
            MessageRecord {
                conversation_id: "c1".into(),
                sender_id: "u1".into(),
                text: "hi".into(),
            }
        );
    }

    #[tokio::test]
    async fn message_to_offline_receiver_is_dropped_silently_but_archived() {
        let (state, mut archive) = test_state(None);
        let (t1, mut rx1) = join(&state, "u1").await;
        drain(&mut rx1);

        dispatch(
            &state,
            &t1,
            &claims_for("u1"),
            ClientEvent::SendMessage {
                conversation_id: "c1".into(),
                sender_id: "u1".into(),
                receiver_id: "nobody".into(),
                text: "hello?".into(),
            },
        )
        .await;

        // Nothing outbound anywhere, no error to the sender.
        assert!(drain(&mut rx1).is_empty());
        // Persistence still happens — history is store-then-fetch.
        assert!(archive.try_recv().is_ok());
    }

    #[tokio::test]
    async fn second_registration_for_same_user_keeps_first_transport() {
        let (state, _archive) = test_state(None);
        let (t1, mut rx1) = join(&state, "u1").await;

        // Same user registers from a second transport.
        let (tx2, mut rx2) = mpsc::channel(16);
        state.switchboard.attach("t-dup".into(), tx2).await;
        dispatch(
            &state,
            "t-dup",
            &claims_for("u1"),
            ClientEvent::AddUser {
                user_id: "u1".into(),
            },
        )
        .await;

        assert_eq!(last_online_set(&drain(&mut rx2)), vec!["u1".to_string()]);
        drain(&mut rx1);

        // Delivery still targets the first transport.
        dispatch(
            &state,
            &t1,
            &claims_for("u1"),
            ClientEvent::SendMessage {
                conversation_id: "c1".into(),
                sender_id: "u1".into(),
                receiver_id: "u1".into(),
                text: "note to self".into(),
            },
        )
        .await;
        assert_eq!(drain(&mut rx1).len(), 1);
        assert!(drain(&mut rx2).is_empty());
    }

    #[tokio::test]
    async fn signaling_round_trip_preserves_offer_and_answer() {
        let (state, _archive) = test_state(None);
        let (ta, mut rx_a) = join(&state, "a").await;
        let (tb, mut rx_b) = join(&state, "b").await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        let offer = json!({"type": "offer", "sdp": "v=0\r\no=- 42 2 IN IP4 127.0.0.1"});
        let answer = json!({"type": "answer", "sdp": "v=0\r\ns=-"});

        dispatch(
            &state,
            &ta,
            &claims_for("a"),
            ClientEvent::CallUser {
                from_user_id: "a".into(),
                to_user_id: "b".into(),
                offer: offer.clone(),
                call_type: CallType::Video,
            },
        )
        .await;
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerEvent::IncomingCall {
                from_user_id: "a".into(),
                offer,
                call_type: CallType::Video,
            }]
        );

        dispatch(
            &state,
            &tb,
            &claims_for("b"),
            ClientEvent::AnswerCall {
                to_user_id: "a".into(),
                answer: answer.clone(),
            },
        )
        .await;
        assert_eq!(drain(&mut rx_a), vec![ServerEvent::CallAnswered { answer }]);
    }

    #[tokio::test]
    async fn answer_without_prior_offer_is_still_forwarded() {
        // The relay does not police call-session sequencing.
        let (state, _archive) = test_state(None);
        let (_ta, mut rx_a) = join(&state, "a").await;
        let (tb, mut rx_b) = join(&state, "b").await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        dispatch(
            &state,
            &tb,
            &claims_for("b"),
            ClientEvent::AnswerCall {
                to_user_id: "a".into(),
                answer: json!({"type": "answer"}),
            },
        )
        .await;
        assert_eq!(drain(&mut rx_a).len(), 1);
    }

    #[tokio::test]
    async fn ice_candidates_arrive_in_send_order() {
        let (state, _archive) = test_state(None);
        let (ta, mut rx_a) = join(&state, "a").await;
        let (_tb, mut rx_b) = join(&state, "b").await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        for i in 0..3 {
            dispatch(
                &state,
                &ta,
                &claims_for("a"),
                ClientEvent::IceCandidate {
                    to_user_id: "b".into(),
                    candidate: json!({"candidate": format!("candidate:{i}"), "sdpMLineIndex": 0}),
                },
            )
            .await;
        }

        let received: Vec<_> = drain(&mut rx_b)
            .into_iter()
            .map(|e| match e {
                ServerEvent::IceCandidate { candidate } => {
                    candidate["candidate"].as_str().unwrap().to_string()
                }
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(received, vec!["candidate:0", "candidate:1", "candidate:2"]);
    }

    #[tokio::test]
    async fn end_call_forwards_bare_call_ended() {
        let (state, _archive) = test_state(None);
        let (ta, mut rx_a) = join(&state, "a").await;
        let (_tb, mut rx_b) = join(&state, "b").await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        dispatch(
            &state,
            &ta,
            &claims_for("a"),
            ClientEvent::EndCall {
                to_user_id: "b".into(),
            },
        )
        .await;
        assert_eq!(drain(&mut rx_b), vec![ServerEvent::CallEnded]);
    }

    #[tokio::test]
    async fn disconnect_removes_entry_and_rebroadcasts_without_it() {
        let (state, _archive) = test_state(None);
        let (t1, _rx1) = join(&state, "u1").await;
        let (_t2, mut rx2) = join(&state, "u2").await;
        drain(&mut rx2);

        disconnect(&state, &t1).await;

        assert!(state.registry.find("u1").await.is_none());
        assert_eq!(last_online_set(&drain(&mut rx2)), vec!["u2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_call_rings_out_after_the_configured_timeout() {
        let (state, _archive) = test_state(Some(Duration::from_secs(30)));
        let (ta, mut rx_a) = join(&state, "a").await;
        let (_tb, mut rx_b) = join(&state, "b").await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        dispatch(
            &state,
            &ta,
            &claims_for("a"),
            ClientEvent::CallUser {
                from_user_id: "a".into(),
                to_user_id: "b".into(),
                offer: json!({"type": "offer"}),
                call_type: CallType::Audio,
            },
        )
        .await;

        tokio::time::sleep(Duration::from_secs(31)).await;

        assert!(drain(&mut rx_a).contains(&ServerEvent::CallEnded));
        assert!(drain(&mut rx_b).contains(&ServerEvent::CallEnded));
    }

    #[tokio::test(start_paused = true)]
    async fn answered_call_never_rings_out() {
        let (state, _archive) = test_state(Some(Duration::from_secs(30)));
        let (ta, mut rx_a) = join(&state, "a").await;
        let (tb, mut rx_b) = join(&state, "b").await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        dispatch(
            &state,
            &ta,
            &claims_for("a"),
            ClientEvent::CallUser {
                from_user_id: "a".into(),
                to_user_id: "b".into(),
                offer: json!({"type": "offer"}),
                call_type: CallType::Audio,
            },
        )
        .await;
        dispatch(
            &state,
            &tb,
            &claims_for("b"),
            ClientEvent::AnswerCall {
                to_user_id: "a".into(),
                answer: json!({"type": "answer"}),
            },
        )
        .await;

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(!drain(&mut rx_a).contains(&ServerEvent::CallEnded));
        assert!(!drain(&mut rx_b).contains(&ServerEvent::CallEnded));
    }

    #[tokio::test(start_paused = true)]
    async fn call_to_offline_user_is_dropped_without_a_pending_ring() {
        let (state, _archive) = test_state(Some(Duration::from_secs(30)));
        let (ta, mut rx_a) = join(&state, "a").await;
        drain(&mut rx_a);

        dispatch(
            &state,
            &ta,
            &claims_for("a"),
            ClientEvent::CallUser {
                from_user_id: "a".into(),
                to_user_id: "nobody".into(),
                offer: json!({"type": "offer"}),
                call_type: CallType::Audio,
            },
        )
        .await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(drain(&mut rx_a).is_empty());
    }
}
