use reqwest::Client;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{NotificationError, OutboundEmail};

/// HTTP mail gateway client. Delivery is best-effort: the gateway either
/// accepts a message or it does not, and a failed send has no effect on
/// anything already persisted. Callers decide whether a failure is logged
/// or surfaced.
pub struct MailerClient {
    client: Client,
    base_url: String,
    api_token: String,
    from: String,
}

impl MailerClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.mail_api_url.clone(),
            api_token: config.mail_api_token.clone(),
            from: config.mail_from.clone(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), NotificationError> {
        if self.base_url.is_empty() || self.api_token.is_empty() {
            return Err(NotificationError::NotConfigured);
        }

        let url = format!("{}/messages", self.base_url);
        debug!("Sending email to {} via {}", to, url);

        let email = OutboundEmail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await?;
            error!("Mail gateway rejected message ({}): {}", status, message);
            return Err(NotificationError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Email accepted by gateway for {}", to);
        Ok(())
    }
}
