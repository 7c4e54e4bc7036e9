use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::location::{Coordinates, Located};
use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The user-editable part of an event, produced by a validated `EventForm`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(creator_id: Uuid, fields: EventFields) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            creator_id,
            title: fields.title,
            description: fields.description,
            location: fields.location,
            latitude: None,
            longitude: None,
            start_date: fields.start_date,
            end_date: fields.end_date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, fields: EventFields) {
        self.title = fields.title;
        self.description = fields.description;
        self.location = fields.location;
        self.start_date = fields.start_date;
        self.end_date = fields.end_date;
        self.updated_at = Utc::now();
    }

    pub fn fields(&self) -> EventFields {
        EventFields {
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// The moment after which the event counts as over.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.end_date.unwrap_or(self.start_date)
    }

    pub fn finished_at(&self, now: DateTime<Utc>) -> bool {
        self.ends_at() < now
    }

    pub fn can_edit(&self, user: &User) -> bool {
        self.creator_id == user.id || user.is_staff
    }

    pub fn url(&self) -> String {
        format!("/events/{}", self.id)
    }
}

impl Located for Event {
    fn location(&self) -> &str {
        &self.location
    }

    fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_columns(self.latitude, self.longitude)
    }

    fn set_coordinates(&mut self, coordinates: Option<Coordinates>) {
        self.latitude = coordinates.map(|c| c.latitude);
        self.longitude = coordinates.map(|c| c.longitude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Event {
        Event::new(
            Uuid::new_v4(),
            EventFields {
                title: "Hack night".into(),
                description: String::new(),
                location: String::new(),
                start_date: start,
                end_date: end,
            },
        )
    }

    #[test]
    fn test_finished_uses_end_date_when_present() {
        let now = Utc::now();
        let ev = event(now - Duration::hours(3), Some(now + Duration::hours(1)));
        assert!(!ev.finished_at(now));
        assert!(ev.finished_at(now + Duration::hours(2)));
    }

    #[test]
    fn test_finished_falls_back_to_start_date() {
        let now = Utc::now();
        let ev = event(now - Duration::minutes(1), None);
        assert!(ev.finished_at(now));

        let upcoming = event(now + Duration::minutes(1), None);
        assert!(!upcoming.finished_at(now));
    }

    #[test]
    fn test_not_finished_at_exact_end() {
        let now = Utc::now();
        let ev = event(now - Duration::hours(1), Some(now));
        assert!(!ev.finished_at(now));
    }

    #[test]
    fn test_creator_or_staff_can_edit() {
        let now = Utc::now();
        let mut creator = User::new("ada".into(), "ada@example.com".into(), "x".into());
        let ev = Event::new(creator.id, event(now, None).fields());
        assert!(ev.can_edit(&creator));

        let mut other = User::new("bob".into(), "bob@example.com".into(), "x".into());
        assert!(!ev.can_edit(&other));
        other.is_staff = true;
        assert!(ev.can_edit(&other));

        creator.id = Uuid::new_v4();
        assert!(!ev.can_edit(&creator));
    }

    #[test]
    fn test_set_coordinates_clears_both_columns() {
        let mut ev = event(Utc::now(), None);
        ev.set_coordinates(Some(Coordinates::new(1.0, 2.0)));
        assert_eq!(ev.latitude, Some(1.0));
        ev.set_coordinates(None);
        assert!(ev.coordinates().is_none());
        assert!(ev.longitude.is_none());
    }
}
