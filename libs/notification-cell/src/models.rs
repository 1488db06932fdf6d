use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("mail gateway not configured")]
    NotConfigured,

    #[error("mail gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail gateway error ({status}): {message}")]
    Gateway { status: u16, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}
