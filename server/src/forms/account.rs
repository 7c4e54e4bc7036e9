use serde::{Deserialize, Serialize};

use crate::forms::{check_max_len, check_required, FormErrors};
use crate::services::accounts::NewAccount;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub password_confirm: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<NewAccount, FormErrors> {
        let mut errors = FormErrors::new();

        let username = self.username.trim();
        check_required(&mut errors, "username", username);
        if !username.is_empty() {
            let len = username.chars().count();
            if !(3..=30).contains(&len) {
                errors.add("username", "Usernames are 3 to 30 characters long.");
            }
            if !username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            {
                errors.add("username", "Use only letters, digits and . _ -");
            }
        }

        let email = self.email.trim();
        check_required(&mut errors, "email", email);
        check_max_len(&mut errors, "email", email, 254);
        if !email.is_empty() && !is_plausible_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Passwords need at least {MIN_PASSWORD_LEN} characters."),
            );
        }
        if self.password != self.password_confirm {
            errors.add("password_confirm", "The two passwords don't match.");
        }

        errors.finish(NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub next: String,
}

impl LoginForm {
    /// Where to go after logging in. Only local paths are honoured.
    pub fn redirect_target(&self) -> &str {
        safe_next(&self.next)
    }
}

pub fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        next
    } else {
        "/"
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub subject: String,
    pub body: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();
        let subject = self.subject.trim();
        check_required(&mut errors, "subject", subject);
        check_max_len(&mut errors, "subject", subject, 150);
        let body = self.body.trim();
        check_required(&mut errors, "body", body);
        check_max_len(&mut errors, "body", body, 5000);
        // header injection
        if subject.contains('\n') || subject.contains('\r') {
            errors.add("subject", "The subject must be a single line.");
        }
        errors.finish((subject.to_string(), body.to_string()))
    }
}
