use serde::{Deserialize, Serialize};

use crate::forms::{check_max_len, FormErrors};

const MAX_GUESTS: i32 = 100;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendForm {
    pub guests: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rsvp {
    pub guests: i32,
    pub message: String,
}

impl AttendForm {
    pub fn validate(&self) -> Result<Rsvp, FormErrors> {
        let mut errors = FormErrors::new();

        let guests = match self.guests.trim() {
            "" => 0,
            raw => match raw.parse::<i32>() {
                Ok(n) if (0..=MAX_GUESTS).contains(&n) => n,
                Ok(_) => {
                    errors.add("guests", format!("Bring between 0 and {MAX_GUESTS} guests."));
                    0
                }
                Err(_) => {
                    errors.add("guests", "Enter a whole number.");
                    0
                }
            },
        };

        let message = self.message.trim();
        check_max_len(&mut errors, "message", message, 500);

        errors.finish(Rsvp {
            guests,
            message: message.to_string(),
        })
    }
}
