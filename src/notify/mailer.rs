use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;

use super::{Notice, Notifier, NotifyError};

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(cfg.smtp_host.as_str())
                .port(cfg.smtp_port);
        if let (Some(username), Some(password)) = (cfg.username.as_ref(), cfg.password.as_ref()) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = cfg
            .from_address
            .parse::<Mailbox>()
            .map_err(|err| anyhow::anyhow!("invalid mail.from_address: {err}"))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn recipient(&self, notice: &Notice<'_>) -> Result<Mailbox, NotifyError> {
        notice
            .to_email
            .parse::<Mailbox>()
            .map_err(|err| NotifyError::Recipient(format!("{}: {err}", notice.to_email)))
    }

    pub async fn send_with_attachment(
        &self,
        notice: &Notice<'_>,
        filename: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), NotifyError> {
        let to = self.recipient(notice)?;
        let content_type = ContentType::parse(content_type)
            .map_err(|err| NotifyError::Mail(format!("invalid content type: {err}")))?;
        let attachment = Attachment::new(filename.to_string()).body(content, content_type);

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notice.subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(notice.body.to_string()))
                    .singlepart(attachment),
            )
            .map_err(|err| NotifyError::Mail(err.to_string()))?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|err| NotifyError::Mail(err.to_string()))
    }
}

#[async_trait]
impl Notifier for Mailer {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn send(&self, notice: &Notice<'_>) -> Result<(), NotifyError> {
        let to = self.recipient(notice)?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notice.subject)
            .singlepart(SinglePart::plain(notice.body.to_string()))
            .map_err(|err| NotifyError::Mail(err.to_string()))?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|err| NotifyError::Mail(err.to_string()))
    }
}
