pub mod mailer;
pub mod webhook;

use async_trait::async_trait;

use crate::config::AppConfig;

pub use mailer::Mailer;
pub use webhook::ChatWebhook;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail delivery failed: {0}")]
    Mail(String),
    #[error("webhook delivery failed: {0}")]
    Webhook(String),
    #[error("invalid recipient: {0}")]
    Recipient(String),
}

/// One outbound message to one user. Channels that have no per-user address
/// (the chat webhook) ignore the recipient fields.
pub struct Notice<'a> {
    pub to_email: &'a str,
    pub to_name: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;
    async fn send(&self, notice: &Notice<'_>) -> Result<(), NotifyError>;
}

/// Configured delivery channels. Jobs fan out over every configured channel
/// and treat per-channel failures as best-effort.
#[derive(Clone, Default)]
pub struct Notifications {
    pub mailer: Option<Mailer>,
    pub webhook: Option<ChatWebhook>,
}

impl Notifications {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let mailer = cfg.mail.as_ref().map(Mailer::from_config).transpose()?;
        let webhook = cfg
            .notify
            .chat_webhook_url
            .as_ref()
            .map(|url| ChatWebhook::new(url.clone()));
        Ok(Self { mailer, webhook })
    }

    pub fn channels(&self) -> Vec<&dyn Notifier> {
        let mut channels: Vec<&dyn Notifier> = Vec::new();
        if let Some(mailer) = self.mailer.as_ref() {
            channels.push(mailer);
        }
        if let Some(webhook) = self.webhook.as_ref() {
            channels.push(webhook);
        }
        channels
    }
}
