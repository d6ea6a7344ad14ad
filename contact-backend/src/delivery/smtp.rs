use super::{DeliveryError, Deliverer};
use crate::{body, config, submission::ValidatedSubmission};
use async_once_cell::OnceCell;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::{Credentials, Mechanism},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::borrow::Cow;

const SMTP_URL: &str = "smtps://smtp.gmail.com";

pub const SMTP_URL_VARIABLE: &str = "SMTP_URL";
pub const SMTP_USERNAME_VARIABLE: &str = "SMTP_USERNAME";
pub const SMTP_PASSWORD_VARIABLE: &str = "SMTP_PASSWORD";

/// Delivers by submitting an HTML-formatted message to an SMTP server. The
/// connection is built lazily on the first delivery and reused afterwards.
pub struct SmtpDeliverer {
    from_address: Mailbox,
    to_address: Mailbox,
    mailer: OnceCell<AsyncSmtpTransport<Tokio1Executor>>,
}

struct SmtpCredentials {
    username: String,
    password: String,
}

impl SmtpCredentials {
    fn from_environment() -> Result<Self, DeliveryError> {
        let read = |name| {
            config::require_variable(name)
                .map_err(|error| DeliveryError::Internal(error.to_string()))
        };
        Ok(Self {
            username: read(SMTP_USERNAME_VARIABLE)?,
            password: read(SMTP_PASSWORD_VARIABLE)?,
        })
    }
}

impl SmtpDeliverer {
    pub fn new(from_address: Mailbox, to_address: Mailbox) -> Self {
        Self {
            from_address,
            to_address,
            mailer: Default::default(),
        }
    }

    fn smtp_url() -> Cow<'static, str> {
        config::variable_or(SMTP_URL_VARIABLE, SMTP_URL)
    }

    async fn initialise_mailer() -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let smtp_url = Self::smtp_url();
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::from_url(&smtp_url)
            .map_err(|error| DeliveryError::Internal(format!("Invalid SMTP URL: {error}")))?
            .authentication(vec![Mechanism::Plain]);

        // Credentials are only attached when the connection URL is over TLS.
        // Should the URL ever be downgraded to plain smtp://, the server
        // rejects the unauthenticated connection instead of the credentials
        // travelling in the clear.
        if smtp_url.starts_with("smtps://") {
            let credentials = SmtpCredentials::from_environment()?;
            builder = builder.credentials(Credentials::new(
                credentials.username,
                credentials.password,
            ));
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl Deliverer for SmtpDeliverer {
    async fn deliver(&self, submission: &ValidatedSubmission<'_>) -> Result<(), DeliveryError> {
        let email = Message::builder()
            .from(self.from_address.clone())
            .reply_to(submission.reply_to())
            .to(self.to_address.clone())
            .subject(submission.subject)
            .header(ContentType::TEXT_HTML)
            .body(body::html_body(submission))
            .map_err(|error| DeliveryError::Internal(format!("Error building message: {error}")))?;
        let mailer = self
            .mailer
            .get_or_try_init(Self::initialise_mailer())
            .await?;
        match mailer.send(email).await {
            Ok(_) => Ok(()),
            Err(error) => Err(DeliveryError::Internal(format!(
                "Error sending message: {error}"
            ))),
        }
    }
}
