use serde::{Deserialize, Serialize};

use crate::forms::{
    check_max_len, check_required, parse_datetime, FormErrors, DATETIME_INPUT_FORMAT,
};
use crate::models::{Event, EventFields};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
}

impl EventForm {
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start_date: event.start_date.format(DATETIME_INPUT_FORMAT).to_string(),
            end_date: event
                .end_date
                .map(|d| d.format(DATETIME_INPUT_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<EventFields, FormErrors> {
        let mut errors = FormErrors::new();

        let title = self.title.trim();
        check_required(&mut errors, "title", title);
        check_max_len(&mut errors, "title", title, 100);
        check_max_len(&mut errors, "location", self.location.trim(), 100);
        check_max_len(&mut errors, "description", &self.description, 5000);

        let start_date = if self.start_date.trim().is_empty() {
            errors.add("start_date", "This field is required.");
            None
        } else {
            let parsed = parse_datetime(&self.start_date);
            if parsed.is_none() {
                errors.add("start_date", "Enter a valid date/time.");
            }
            parsed
        };

        let end_date = if self.end_date.trim().is_empty() {
            None
        } else {
            let parsed = parse_datetime(&self.end_date);
            if parsed.is_none() {
                errors.add("end_date", "Enter a valid date/time.");
            }
            parsed
        };

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.add("end_date", "The event cannot end before it starts.");
            }
        }

        match start_date {
            Some(start_date) if errors.is_empty() => Ok(EventFields {
                title: title.to_string(),
                description: self.description.trim().to_string(),
                location: self.location.trim().to_string(),
                start_date,
                end_date,
            }),
            _ => Err(errors),
        }
    }
}
