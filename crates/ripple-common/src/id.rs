//! ID generation — UUID v7, time-sortable.
//!
//! Every entity (user, conversation, message) gets a v7 UUID so primary keys
//! sort chronologically without a separate sequence.

use uuid::Uuid;

/// Generate a new time-sortable unique ID.
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_ids_are_time_sortable() {
        let id1 = generate_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = generate_id();
        // UUID v7 IDs should sort chronologically
        assert!(id1 < id2);
    }
}
