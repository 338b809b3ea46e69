use async_trait::async_trait;

use super::{Notice, Notifier, NotifyError};

/// Posts plain-text messages to a chat webhook (Google Chat style payload).
#[derive(Clone)]
pub struct ChatWebhook {
    client: reqwest::Client,
    url: String,
}

impl ChatWebhook {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for ChatWebhook {
    fn channel(&self) -> &'static str {
        "chat"
    }

    async fn send(&self, notice: &Notice<'_>) -> Result<(), NotifyError> {
        let text = format!("{} — {}\n\n{}", notice.to_name, notice.subject, notice.body);
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|err| NotifyError::Webhook(err.to_string()))?;

        response
            .error_for_status()
            .map(|_| ())
            .map_err(|err| NotifyError::Webhook(err.to_string()))
    }
}
