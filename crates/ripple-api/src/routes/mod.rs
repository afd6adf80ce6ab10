//! API route modules.

pub mod auth;
pub mod conversations;
pub mod health;
pub mod presence;
pub mod users;
