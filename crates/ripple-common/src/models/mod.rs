//! Data models shared between the database layer and the API.

pub mod conversation;
pub mod message;
pub mod user;
