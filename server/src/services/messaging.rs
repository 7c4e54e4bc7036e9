use chrono::Utc;
use tracing::{info, warn};

use crate::models::User;
use crate::signals::MessageSent;
use crate::state::AppState;
use crate::utils::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactOutcome {
    Sent,
    /// The sender's profile is over its rate limit; nothing was sent.
    RateLimited,
    /// The mail relay refused or was unreachable; nothing was counted.
    DeliveryFailed,
}

/// Sends `subject`/`body` from `sender` to `recipient`, honouring the
/// sender's email rate limit. Bookkeeping only happens after a successful
/// send.
pub async fn contact_member(
    state: &AppState,
    sender: &User,
    recipient: &User,
    subject: &str,
    body: &str,
) -> Result<ContactOutcome, AppError> {
    let profile = state
        .profiles
        .find_by_user(sender.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;

    if !profile.can_send_email(Utc::now(), state.config.message_wait()) {
        info!(
            sender = %sender.username,
            sent = profile.num_emails_sent,
            allowed = profile.allowed_emails,
            "Message blocked by rate limit"
        );
        return Ok(ContactOutcome::RateLimited);
    }

    let full_body = format!(
        "{body}\n\n--\nSent by {} via Anthill. Reply to {}.",
        sender.username, sender.email
    );
    if let Err(e) = state
        .mailer
        .send(&recipient.email, subject, &full_body)
        .await
    {
        warn!(error = %e, recipient = %recipient.username, "Message delivery failed");
        return Ok(ContactOutcome::DeliveryFailed);
    }

    state
        .profiles
        .record_email_sent(sender.id, Utc::now())
        .await?;

    state.signals.emit_message_sent(MessageSent {
        subject: subject.to_string(),
        body: full_body,
        recipient: recipient.email.clone(),
    });

    Ok(ContactOutcome::Sent)
}
