//! Revoked-token blocklist backed by Redis.
//!
//! Logout places the presented tokens here with a TTL equal to their
//! remaining validity, so a stolen-but-logged-out token cannot be replayed.
//! Keys expire on their own; nothing is ever scanned or cleaned up manually.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

fn key(token: &str) -> String {
    format!("blocklist:{token}")
}

/// Revoke a token for `ttl_secs` seconds (its remaining validity).
///
/// A TTL of zero or less means the token is already expired and there is
/// nothing to store.
pub async fn revoke(
    redis: &ConnectionManager,
    token: &str,
    ttl_secs: i64,
) -> Result<(), redis::RedisError> {
    if ttl_secs <= 0 {
        return Ok(());
    }
    let mut conn = redis.clone();
    conn.set_ex::<_, _, ()>(key(token), 1u8, ttl_secs as u64)
        .await
}

/// Check whether a token has been revoked.
pub async fn is_revoked(
    redis: &ConnectionManager,
    token: &str,
) -> Result<bool, redis::RedisError> {
    let mut conn = redis.clone();
    conn.exists(key(token)).await
}
