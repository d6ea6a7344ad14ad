use super::{DeliveryError, Deliverer};
use crate::{
    config::{self, EnvironmentError},
    submission::ValidatedSubmission,
};
use async_trait::async_trait;
use lettre::message::Mailbox;
use serde::Serialize;
use std::borrow::Cow;
use tracing::warn;

const RELAY_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

pub const RELAY_URL_VARIABLE: &str = "CONTACT_RELAY_URL";
pub const RELAY_SERVICE_ID_VARIABLE: &str = "CONTACT_RELAY_SERVICE_ID";
pub const RELAY_TEMPLATE_ID_VARIABLE: &str = "CONTACT_RELAY_TEMPLATE_ID";
pub const RELAY_PUBLIC_KEY_VARIABLE: &str = "CONTACT_RELAY_PUBLIC_KEY";

/// Shown when the relay fails without supplying any error text of its own.
pub const RELAY_FALLBACK_MESSAGE: &str = "Failed to send message. Please try again.";

/// Delivers by posting the submission to a hosted email-relay API, which
/// expands a pre-registered template and sends the mail on our behalf.
pub struct RelayApiDeliverer {
    service_id: String,
    template_id: String,
    public_key: String,
    to_email: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SendPayload<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Serialize)]
struct TemplateParams<'a> {
    from_name: &'a str,
    from_email: &'a str,
    subject: &'a str,
    message: &'a str,
    to_email: &'a str,
}

impl RelayApiDeliverer {
    /// The service/template identifier pair and the public key have no
    /// sensible defaults, so a missing one fails startup rather than the
    /// first request.
    pub fn from_environment(to_address: &Mailbox) -> Result<Self, EnvironmentError> {
        Ok(Self {
            service_id: config::require_variable(RELAY_SERVICE_ID_VARIABLE)?,
            template_id: config::require_variable(RELAY_TEMPLATE_ID_VARIABLE)?,
            public_key: config::require_variable(RELAY_PUBLIC_KEY_VARIABLE)?,
            to_email: to_address.email.to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn send_url() -> Cow<'static, str> {
        config::variable_or(RELAY_URL_VARIABLE, RELAY_SEND_URL)
    }

    fn payload<'a>(&'a self, submission: &'a ValidatedSubmission<'a>) -> SendPayload<'a> {
        SendPayload {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.public_key,
            template_params: TemplateParams {
                from_name: submission.name,
                from_email: submission.email,
                subject: submission.subject,
                message: submission.message,
                to_email: &self.to_email,
            },
        }
    }
}

#[async_trait]
impl Deliverer for RelayApiDeliverer {
    async fn deliver(&self, submission: &ValidatedSubmission<'_>) -> Result<(), DeliveryError> {
        let response = match self
            .client
            .post(Self::send_url().as_ref())
            .json(&self.payload(submission))
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                warn!("Error reaching relay API: {error}");
                return Err(DeliveryError::Rejected(RELAY_FALLBACK_MESSAGE.into()));
            }
        };
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        warn!("Relay API rejected submission with status {status}: {text}");
        Err(DeliveryError::Rejected(if text.trim().is_empty() {
            RELAY_FALLBACK_MESSAGE.into()
        } else {
            text
        }))
    }
}
