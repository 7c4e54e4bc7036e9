use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::location::{Coordinates, Located};

pub const DEFAULT_ROLE: &str = "other";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub url: String,
    pub about: String,
    pub about_markup_type: String,
    pub role: String,
    pub twitter_id: String,
    /// Comma separated tags.
    pub skills: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub allow_org_emails: bool,
    pub signup_date: DateTime<Utc>,
    pub last_email_sent: Option<DateTime<Utc>>,
    pub num_emails_sent: i32,
    pub allowed_emails: i32,
}

/// Editable profile fields, produced by a validated `ProfileForm`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileFields {
    pub url: String,
    pub about: String,
    pub role: String,
    pub twitter_id: String,
    pub skills: String,
    pub location: String,
    pub allow_org_emails: bool,
}

impl Profile {
    /// The blank profile every new account gets.
    pub fn for_user(user_id: Uuid, markup_type: &str, allowed_emails: i32) -> Self {
        Self {
            user_id,
            url: String::new(),
            about: String::new(),
            about_markup_type: markup_type.to_string(),
            role: DEFAULT_ROLE.to_string(),
            twitter_id: String::new(),
            skills: String::new(),
            location: String::new(),
            latitude: None,
            longitude: None,
            allow_org_emails: false,
            signup_date: Utc::now(),
            last_email_sent: None,
            num_emails_sent: 0,
            allowed_emails,
        }
    }

    pub fn apply(&mut self, fields: ProfileFields) {
        self.url = fields.url;
        self.about = fields.about;
        self.role = fields.role;
        self.twitter_id = fields.twitter_id;
        self.skills = fields.skills;
        self.location = fields.location;
        self.allow_org_emails = fields.allow_org_emails;
    }

    /// Rate limit emails by time and in total.
    ///
    /// A profile that never sent anything is treated as having waited long
    /// enough. The total cap never resets on its own.
    pub fn can_send_email(&self, now: DateTime<Utc>, wait: Duration) -> bool {
        let waited = match self.last_email_sent {
            Some(last) => now - last > wait,
            None => true,
        };
        waited && self.num_emails_sent < self.allowed_emails
    }

    /// Stamps a send. Stored profiles go through
    /// `ProfileRepository::record_email_sent` instead of a full update.
    pub fn record_email_sent(&mut self, now: DateTime<Utc>) {
        self.last_email_sent = Some(now);
        self.num_emails_sent += 1;
    }

    pub fn skill_list(&self) -> Vec<&str> {
        self.skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Located for Profile {
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

/// A member row for listings: username plus the located bits of the profile.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberSummary {
    pub username: String,
    pub role: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Located for MemberSummary {
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
