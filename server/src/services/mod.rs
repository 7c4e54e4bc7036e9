pub mod accounts;
pub mod mailer;
pub mod messaging;

pub use mailer::{ConsoleMailer, HttpMailer, Mailer};
