use anyhow::Result;
use serde_json::json;
use tracing::{info, warn};

/// Outbound mail is an external collaborator: messages are handed to a
/// configured delivery webhook over HTTP. With no webhook configured the
/// mail is dropped with a warning, which keeps local development usable.
pub struct Mailer {
    webhook_url: Option<String>,
    from: String,
    client: reqwest::Client,
}

impl Mailer {
    pub fn new(webhook_url: Option<String>, from: String) -> Self {
        Self {
            webhook_url,
            from,
            client: reqwest::Client::new(),
        }
    }

    async fn deliver(&self, to: &str, subject: &str, text: &str) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            warn!("mail delivery not configured, dropping \"{}\" to {}", subject, to);
            return Ok(());
        };

        self.client
            .post(url)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "text": text,
            }))
            .send()
            .await?
            .error_for_status()?;

        info!("sent \"{}\" to {}", subject, to);
        Ok(())
    }

    pub async fn send_temp_password(
        &self,
        to: &str,
        username: &str,
        temp_password: &str,
    ) -> Result<()> {
        let text = format!(
            "Hi {username},\n\n\
             We received a request to reset your password. Your temporary password is:\n\n\
             {temp_password}\n\n\
             Please change to a new, more secure password after logging in by \
             navigating to your Profile.\n\nRegards,\nBurrow"
        );
        self.deliver(to, "Burrow Password Recovery", &text).await
    }

    pub async fn send_username_reminder(&self, to: &str, username: &str) -> Result<()> {
        let text = format!(
            "We received your username recovery request. The username for your \
             Burrow account is:\n\n{username}\n\nRegards,\nBurrow"
        );
        self.deliver(to, "Burrow Username Recovery", &text).await
    }
}
