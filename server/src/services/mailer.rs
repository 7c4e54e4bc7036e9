use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::utils::AppError;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Posts messages to an HTTP mail relay with a bearer token.
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_token: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_token: String, from: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_token,
            from,
        }
    }
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let payload = MailPayload {
            from: &self.from,
            to: recipient,
            subject,
            body,
        };

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Mail service connection error: {e}");
                error!("{}", msg);
                AppError::ExternalServiceError(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Mail service failed. Status: {status}, Body: {text}");
            error!("{}", msg);
            return Err(AppError::ExternalServiceError(msg));
        }

        Ok(())
    }
}

/// Used when no mail relay is configured: writes the message to the log.
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError> {
        info!(recipient = %recipient, subject = %subject, "\n{}", body);
        Ok(())
    }
}
