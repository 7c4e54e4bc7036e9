//! In-process storage selected by `DATABASE_URL=memory://`. Nothing
//! survives a restart; meant for local runs and the router tests.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Attendance, Event, MemberSummary, Profile, Session, User};
use crate::repositories::{
    AttendanceRepository, EventRepository, ProfileRepository, SessionRepository, UserRepository,
};
use crate::utils::AppError;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    sessions: RwLock<HashMap<String, Session>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
    events: RwLock<HashMap<Uuid, Event>>,
    attendances: RwLock<Vec<Attendance>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, AppError> {
    lock.read()
        .map_err(|_| AppError::InternalServerError("memory store lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, AppError> {
    lock.write()
        .map_err(|_| AppError::InternalServerError("memory store lock poisoned".into()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(read(&self.users)?
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn set_staff(&self, id: Uuid, is_staff: bool) -> Result<(), AppError> {
        let mut users = write(&self.users)?;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        user.is_staff = is_staff;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(&self, session: &Session) -> Result<(), AppError> {
        write(&self.sessions)?.insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError> {
        Ok(read(&self.sessions)?
            .get(token_hash)
            .filter(|s| !s.is_expired(now))
            .cloned())
    }

    async fn delete(&self, token_hash: &str) -> Result<(), AppError> {
        write(&self.sessions)?.remove(token_hash);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn create(&self, profile: &Profile) -> Result<Profile, AppError> {
        let mut profiles = write(&self.profiles)?;
        if profiles.contains_key(&profile.user_id) {
            return Err(AppError::Conflict("Profile already exists".into()));
        }
        profiles.insert(profile.user_id, profile.clone());
        Ok(profile.clone())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(read(&self.profiles)?.get(&user_id).cloned())
    }

    async fn update(&self, profile: &Profile) -> Result<Profile, AppError> {
        let mut profiles = write(&self.profiles)?;
        let slot = profiles
            .get_mut(&profile.user_id)
            .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
        let kept = slot.clone();
        *slot = Profile {
            // fixed at creation, or owned by record_email_sent
            signup_date: kept.signup_date,
            last_email_sent: kept.last_email_sent,
            num_emails_sent: kept.num_emails_sent,
            allowed_emails: kept.allowed_emails,
            ..profile.clone()
        };
        Ok(slot.clone())
    }

    async fn record_email_sent(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Profile, AppError> {
        let mut profiles = write(&self.profiles)?;
        let slot = profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
        slot.record_email_sent(now);
        Ok(slot.clone())
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(i64::from(read(&self.profiles)?.contains_key(&user_id)))
    }

    async fn list_members(&self) -> Result<Vec<MemberSummary>, AppError> {
        let users = read(&self.users)?;
        let profiles = read(&self.profiles)?;
        let mut members: Vec<MemberSummary> = profiles
            .values()
            .filter_map(|p| {
                users.get(&p.user_id).map(|u| MemberSummary {
                    username: u.username.clone(),
                    role: p.role.clone(),
                    location: p.location.clone(),
                    latitude: p.latitude,
                    longitude: p.longitude,
                })
            })
            .collect();
        members.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(members)
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        write(&self.events)?.insert(event.id, event.clone());
        Ok(event.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        Ok(read(&self.events)?.get(&id).cloned())
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        let mut events = write(&self.events)?;
        let slot = events
            .get_mut(&event.id)
            .ok_or_else(|| AppError::NotFound("Event not found".into()))?;
        *slot = event.clone();
        Ok(event.clone())
    }

    async fn list_future(
        &self,
        now: DateTime<Utc>,
        title: Option<&str>,
        offset: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Event>, AppError> {
        let needle = title.map(str::to_lowercase);
        let mut events: Vec<Event> = read(&self.events)?
            .values()
            .filter(|e| !e.finished_at(now))
            .filter(|e| match &needle {
                Some(n) => e.title.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.start_date, e.created_at));

        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = limit
            .and_then(|l| usize::try_from(l.max(0)).ok())
            .unwrap_or(usize::MAX);
        Ok(events.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_future(&self, now: DateTime<Utc>) -> Result<i64, AppError> {
        let count = read(&self.events)?
            .values()
            .filter(|e| !e.finished_at(now))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn list_starting_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Event>, AppError> {
        let mut events: Vec<Event> = read(&self.events)?
            .values()
            .filter(|e| e.start_date >= from && e.start_date < until)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start_date);
        Ok(events)
    }
}

#[async_trait]
impl AttendanceRepository for MemoryStore {
    async fn create(&self, attendance: &Attendance) -> Result<Attendance, AppError> {
        write(&self.attendances)?.push(attendance.clone());
        Ok(attendance.clone())
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Attendance>, AppError> {
        Ok(read(&self.attendances)?
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventFields;
    use chrono::Duration;

    fn event_at(title: &str, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Event {
        Event::new(
            Uuid::new_v4(),
            EventFields {
                title: title.into(),
                description: String::new(),
                location: String::new(),
                start_date: start,
                end_date: end,
            },
        )
    }

    #[tokio::test]
    async fn test_future_listing_skips_finished_and_orders_by_start() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for ev in [
            event_at("Later", now + Duration::days(2), None),
            event_at("Over", now - Duration::days(2), None),
            event_at("Ongoing", now - Duration::hours(1), Some(now + Duration::hours(1))),
            event_at("Sooner", now + Duration::days(1), None),
        ] {
            EventRepository::create(&store, &ev).await.unwrap();
        }

        let titles: Vec<String> = store
            .list_future(now, None, 0, None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Ongoing", "Sooner", "Later"]);
        assert_eq!(store.count_future(now).await.unwrap(), 3);

        let page = store.list_future(now, None, 1, Some(1)).await.unwrap();
        assert_eq!(page[0].title, "Sooner");
    }

    #[tokio::test]
    async fn test_title_filter_is_case_insensitive() {
        let store = MemoryStore::new();
        let now = Utc::now();
        EventRepository::create(&store, &event_at("Rust Meetup", now + Duration::days(1), None))
            .await
            .unwrap();
        EventRepository::create(&store, &event_at("Go Night", now + Duration::days(1), None))
            .await
            .unwrap();

        let found = store.list_future(now, Some("rUsT"), 0, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Rust Meetup");
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        let user = User::new("ada".into(), "ada@example.com".into(), "h".into());
        UserRepository::create(&store, &user).await.unwrap();
        let again = User::new("ada".into(), "other@example.com".into(), "h".into());
        assert!(matches!(
            UserRepository::create(&store, &again).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_update_keeps_email_bookkeeping() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        ProfileRepository::create(&store, &Profile::for_user(user_id, "markdown", 100))
            .await
            .unwrap();

        // an edit form loaded before the message went out
        let mut stale = store.find_by_user(user_id).await.unwrap().unwrap();
        let now = Utc::now();
        store.record_email_sent(user_id, now).await.unwrap();

        stale.location = "Baltimore".into();
        stale.num_emails_sent = 0;
        stale.last_email_sent = None;
        ProfileRepository::update(&store, &stale).await.unwrap();

        let saved = store.find_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(saved.location, "Baltimore");
        assert_eq!(saved.num_emails_sent, 1);
        assert_eq!(saved.last_email_sent, Some(now));
    }

    #[tokio::test]
    async fn test_expired_session_is_not_found() {
        let store = MemoryStore::new();
        let session = Session::new("abc".into(), Uuid::new_v4(), Duration::hours(1));
        SessionRepository::create(&store, &session).await.unwrap();

        let now = Utc::now();
        assert!(store.find_active("abc", now).await.unwrap().is_some());
        assert!(store
            .find_active("abc", now + Duration::hours(2))
            .await
            .unwrap()
            .is_none());
    }
}
