//! SMTP mailer backed by lettre's async tokio transport.

use contracts::{
    AttachmentRef, ContractError, MailTransport, OutboundMessage, SenderConfig, SmtpConfig,
};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument, warn};

use crate::error::{MailerError, Result};

/// Mailer sending through one SMTP relay
pub struct SmtpMailer {
    name: String,
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the transport and sender mailbox from config
    ///
    /// No connection is opened here; the first send connects.
    pub fn new(smtp: &SmtpConfig, sender: &SenderConfig) -> Result<Self> {
        let address: Address = sender
            .email
            .parse()
            .map_err(|e| MailerError::invalid_address(&sender.email, e))?;
        let display_name = Some(sender.display_name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let from = Mailbox::new(display_name, address);

        let builder = if smtp.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host).map_err(|e| {
                MailerError::Transport {
                    host: smtp.host.clone(),
                    message: e.to_string(),
                }
            })?
        } else {
            warn!(host = %smtp.host, "STARTTLS disabled, SMTP traffic is unencrypted");
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };

        let mut builder = builder.port(smtp.port);
        if !smtp.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ));
        }

        Ok(Self {
            name: format!("smtp://{}:{}", smtp.host, smtp.port),
            from,
            transport: builder.build(),
        })
    }

    /// Sender mailbox used for every message
    pub fn from_mailbox(&self) -> &Mailbox {
        &self.from
    }

    /// Assemble one MIME message: HTML body plus any attachments
    async fn build_message(&self, message: &OutboundMessage<'_>) -> Result<Message> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| MailerError::invalid_address(message.to, e))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject);
        let html = SinglePart::html(message.html_body.to_string());

        if message.attachments.is_empty() {
            return builder.singlepart(html).map_err(MailerError::build);
        }

        let mut parts = MultiPart::mixed().singlepart(html);
        for attachment in message.attachments {
            parts = parts.singlepart(read_attachment(attachment).await?);
        }
        builder.multipart(parts).map_err(MailerError::build)
    }
}

/// Load a staged attachment, typed from its extension
async fn read_attachment(attachment: &AttachmentRef) -> Result<SinglePart> {
    let path = &attachment.storage_path;
    let content = tokio::fs::read(path)
        .await
        .map_err(|source| MailerError::AttachmentRead {
            path: path.display().to_string(),
            source,
        })?;

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let content_type = ContentType::parse(mime.as_ref()).map_err(MailerError::build)?;

    Ok(Attachment::new(attachment.original_name.clone()).body(content, content_type))
}

impl MailTransport for SmtpMailer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "smtp_send",
        skip(self, message),
        fields(recipient = %message.to, attachments = message.attachments.len())
    )]
    async fn send(&self, message: &OutboundMessage<'_>) -> std::result::Result<(), ContractError> {
        let email = self
            .build_message(message)
            .await
            .map_err(|e| e.into_transmission(message.to))?;

        match self.transport.send(email).await {
            Ok(response) => {
                debug!(code = %response.code(), "Message accepted");
                metrics::counter!("newsletter_smtp_messages_total", "status" => "accepted")
                    .increment(1);
                Ok(())
            }
            Err(e) => {
                metrics::counter!("newsletter_smtp_messages_total", "status" => "rejected")
                    .increment(1);
                Err(MailerError::smtp(e).into_transmission(message.to))
            }
        }
    }
}
