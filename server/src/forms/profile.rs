use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::forms::{check_max_len, FormErrors};
use crate::models::{Profile, ProfileFields};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub url: String,
    pub about: String,
    pub role: String,
    pub twitter_id: String,
    pub skills: String,
    pub location: String,
    /// Checkbox: present when ticked.
    pub allow_org_emails: Option<String>,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            url: profile.url.clone(),
            about: profile.about.clone(),
            role: profile.role.clone(),
            twitter_id: profile.twitter_id.clone(),
            skills: profile.skills.clone(),
            location: profile.location.clone(),
            allow_org_emails: profile.allow_org_emails.then(|| "on".to_string()),
        }
    }

    pub fn validate(&self, config: &Config) -> Result<ProfileFields, FormErrors> {
        let mut errors = FormErrors::new();

        let url = self.url.trim();
        check_max_len(&mut errors, "url", url, 200);
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.add("url", "Enter a valid URL.");
        }

        let role = self.role.trim();
        if !config.is_role(role) {
            errors.add("role", "Select a valid choice.");
        }

        let twitter_id = self.twitter_id.trim().trim_start_matches('@');
        check_max_len(&mut errors, "twitter_id", twitter_id, 15);
        if !twitter_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            errors.add("twitter_id", "Only letters, digits and underscores.");
        }

        check_max_len(&mut errors, "skills", &self.skills, 500);
        check_max_len(&mut errors, "location", self.location.trim(), 100);
        check_max_len(&mut errors, "about", &self.about, 5000);

        errors.finish(ProfileFields {
            url: url.to_string(),
            about: self.about.trim().to_string(),
            role: role.to_string(),
            twitter_id: twitter_id.to_string(),
            skills: normalize_tags(&self.skills),
            location: self.location.trim().to_string(),
            allow_org_emails: self.allow_org_emails.is_some(),
        })
    }
}

/// `"Rust,  postgres ,,geo"` becomes `"Rust, postgres, geo"`.
fn normalize_tags(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
