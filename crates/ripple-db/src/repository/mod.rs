//! Repository modules — one per table, plain async functions over sqlx.

pub mod conversations;
pub mod messages;
pub mod users;
