use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const SIGNAL_CAPACITY: usize = 64;

/// Fired after a member-to-member message has gone out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSent {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}

#[derive(Clone)]
pub struct Signals {
    message_sent: broadcast::Sender<MessageSent>,
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}

impl Signals {
    pub fn new() -> Self {
        let (message_sent, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { message_sent }
    }

    pub fn subscribe_message_sent(&self) -> broadcast::Receiver<MessageSent> {
        self.message_sent.subscribe()
    }

    /// Never fails; with nobody listening the message is simply dropped.
    pub fn emit_message_sent(&self, message: MessageSent) {
        if self.message_sent.send(message).is_err() {
            debug!("message_sent emitted with no subscribers");
        }
    }
}

/// Logs every sent message on the `anthill::messages` target.
pub fn spawn_message_logger(signals: &Signals) -> JoinHandle<()> {
    let mut rx = signals.subscribe_message_sent();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    info!(
                        target: "anthill::messages",
                        recipient = %msg.recipient,
                        subject = %msg.subject,
                        body_len = msg.body.len(),
                        "message sent"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "anthill::messages", skipped, "message log fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
