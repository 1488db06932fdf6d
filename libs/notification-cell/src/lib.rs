pub mod mailer;
pub mod models;

pub use mailer::MailerClient;
pub use models::NotificationError;
