pub mod mailer;
pub mod notify;
pub mod reset;
pub mod user;
