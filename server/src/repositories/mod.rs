use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Attendance, Event, MemberSummary, Profile, Session, User};
use crate::utils::AppError;

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn set_staff(&self, id: Uuid, is_staff: bool) -> Result<(), AppError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), AppError>;
    /// Expired sessions are never returned.
    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError>;
    async fn delete(&self, token_hash: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fails with `Conflict` when the user already has a profile.
    async fn create(&self, profile: &Profile) -> Result<Profile, AppError>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, AppError>;
    /// Saves the editable fields and coordinates. The email bookkeeping
    /// columns are never written here.
    async fn update(&self, profile: &Profile) -> Result<Profile, AppError>;
    /// Stamps `last_email_sent` and bumps the counter in place.
    async fn record_email_sent(&self, user_id: Uuid, now: DateTime<Utc>)
        -> Result<Profile, AppError>;
    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError>;
    /// All members, by username.
    async fn list_members(&self) -> Result<Vec<MemberSummary>, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    /// Events not finished at `now`, soonest first, optionally narrowed to
    /// titles containing `title` (case-insensitive).
    async fn list_future(
        &self,
        now: DateTime<Utc>,
        title: Option<&str>,
        offset: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Event>, AppError>;
    async fn count_future(&self, now: DateTime<Utc>) -> Result<i64, AppError>;
    /// Events starting in `[from, until)`, by start date.
    async fn list_starting_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Event>, AppError>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn create(&self, attendance: &Attendance) -> Result<Attendance, AppError>;
    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Attendance>, AppError>;
}
