use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One RSVP. Created per submission, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub guests: i32,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Attendance {
    pub fn new(user_id: Uuid, event_id: Uuid, guests: i32, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            guests,
            message,
            created_at: Utc::now(),
        }
    }

    /// Head count including the attendee.
    pub fn party_size(&self) -> i64 {
        1 + i64::from(self.guests)
    }
}
