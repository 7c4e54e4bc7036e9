use serde::{Deserialize, Serialize};

use crate::forms::{check_max_len, FormErrors};

pub const DEFAULT_RANGE_MILES: f64 = 25.0;
const MAX_RANGE_MILES: f64 = 1000.0;

/// Query-string search over events (and members).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub name: String,
    pub location: String,
    pub location_range: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub location: Option<String>,
    pub location_range: f64,
}

impl SearchForm {
    /// Always yields a usable query: invalid fields are dropped (or fall
    /// back to their default) and reported alongside.
    pub fn clean(&self) -> (SearchQuery, FormErrors) {
        let mut errors = FormErrors::new();

        let name = self.name.trim();
        check_max_len(&mut errors, "name", name, 100);
        let location = self.location.trim();
        check_max_len(&mut errors, "location", location, 100);

        let location_range = match self.location_range.trim() {
            "" => DEFAULT_RANGE_MILES,
            raw => match raw.parse::<f64>() {
                Ok(miles) if miles > 0.0 && miles <= MAX_RANGE_MILES => miles,
                _ => {
                    errors.add(
                        "location_range",
                        format!("Enter a distance between 0 and {MAX_RANGE_MILES} miles."),
                    );
                    DEFAULT_RANGE_MILES
                }
            },
        };

        let keep = |value: &str, field: &str| {
            (!value.is_empty() && !errors.has(field)).then(|| value.to_string())
        };
        let query = SearchQuery {
            name: keep(name, "name"),
            location: keep(location, "location"),
            location_range,
        };
        (query, errors)
    }
}
