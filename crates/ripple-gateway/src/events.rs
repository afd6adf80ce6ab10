//! Gateway wire protocol — the JSON events exchanged with clients.
//!
//! Frames are adjacently tagged: `{"event": "<name>", "data": <payload>}`.
//! Event names and field sets are a compatibility contract with deployed
//! clients and must not change. SDP offers/answers and ICE candidates are
//! opaque [`serde_json::Value`]s — the gateway forwards them untouched and
//! never looks inside.

use serde::{Deserialize, Serialize};

/// Events a client sends to the gateway.
///
/// A closed set: anything that doesn't parse into one of these variants is
/// dropped without a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Register presence under a user ID.
    AddUser { user_id: String },

    /// Send a chat message to another user.
    SendMessage {
        conversation_id: String,
        sender_id: String,
        receiver_id: String,
        text: String,
    },

    /// Start a call: carries the SDP offer for the callee.
    CallUser {
        from_user_id: String,
        to_user_id: String,
        offer: serde_json::Value,
        call_type: CallType,
    },

    /// Accept a call: carries the SDP answer back to the caller.
    AnswerCall {
        to_user_id: String,
        answer: serde_json::Value,
    },

    /// Relay an ICE candidate to the peer.
    IceCandidate {
        to_user_id: String,
        candidate: serde_json::Value,
    },

    /// Hang up or decline.
    EndCall { to_user_id: String },
}

/// Events the gateway sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Live copy of a chat message.
    ReceiveMessage {
        conversation_id: String,
        sender_id: String,
        text: String,
    },

    /// A call is ringing for this client.
    IncomingCall {
        from_user_id: String,
        offer: serde_json::Value,
        call_type: CallType,
    },

    /// The callee accepted.
    CallAnswered { answer: serde_json::Value },

    /// ICE candidate from the peer.
    IceCandidate { candidate: serde_json::Value },

    /// The peer hung up, declined, or the ring timed out.
    CallEnded,

    /// Full authoritative set of online user IDs. Clients replace their
    /// local copy on every receipt — this is never a delta.
    GetOnlineUsers(Vec<String>),
}

/// Media kind of a call. Carried opaquely between the two peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Audio,
    Video,
}
