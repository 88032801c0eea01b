use async_trait::async_trait;
use lettre::address::AddressError;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_template::EmailContent;
use crate::utils::error_chain_fmt;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Anything able to deliver a rendered email to a single recipient.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        content: &EmailContent,
    ) -> Result<(), EmailError>;
}

#[derive(thiserror::Error)]
pub enum EmailError {
    #[error("{0} is not a valid mailbox.")]
    InvalidAddress(String, #[source] AddressError),
    #[error("Failed to build the email message.")]
    Build(#[from] lettre::error::Error),
    #[error("Failed to deliver the email through SMTP.")]
    Transport(#[from] lettre::transport::smtp::Error),
}

impl std::fmt::Debug for EmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct SmtpEmailClient {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    sender: SubscriberEmail,
}

impl SmtpEmailClient {
    /// SMTP client upgrading the connection with STARTTLS and logging in with
    /// the given credentials. No connection is opened until the first send.
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        username: String,
        password: Secret<String>,
        sender: SubscriberEmail,
        timeout: Option<time::Duration>,
    ) -> Result<SmtpEmailClient, EmailError> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)?
            .port(smtp_port)
            .credentials(Credentials::new(
                username,
                password.expose_secret().to_owned(),
            ))
            .timeout(Some(timeout.unwrap_or(REQUEST_TIMEOUT)))
            .build();

        Ok(Self::with_transport(mailer, sender))
    }

    pub fn with_transport(
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        sender: SubscriberEmail,
    ) -> SmtpEmailClient {
        SmtpEmailClient { mailer, sender }
    }

    pub fn build_message(
        &self,
        recipient: &SubscriberEmail,
        content: &EmailContent,
    ) -> Result<Message, EmailError> {
        let message = Message::builder()
            .from(parse_mailbox(&self.sender)?)
            .to(parse_mailbox(recipient)?)
            .subject(content.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                content.text_body.clone(),
                content.html_body.clone(),
            ))?;

        Ok(message)
    }
}

#[async_trait]
impl EmailSender for SmtpEmailClient {
    #[tracing::instrument(
        name = "Send an email through SMTP",
        skip(self, content),
        fields(
            recipient = %recipient,
            subject = %content.subject
        )
    )]
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        content: &EmailContent,
    ) -> Result<(), EmailError> {
        let message = self.build_message(recipient, content)?;

        self.mailer.send(message).await?;

        Ok(())
    }
}

fn parse_mailbox(email: &SubscriberEmail) -> Result<Mailbox, EmailError> {
    email
        .as_ref()
        .parse()
        .map_err(|err| EmailError::InvalidAddress(email.to_string(), err))
}
