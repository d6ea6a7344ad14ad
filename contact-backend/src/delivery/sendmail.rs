use super::{DeliveryError, Deliverer};
use crate::{body, config, submission::ValidatedSubmission};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    AsyncSendmailTransport, AsyncTransport, Message, Tokio1Executor,
};

pub const SENDMAIL_COMMAND_VARIABLE: &str = "SENDMAIL_COMMAND";

/// Delivers by handing a plain-text message to the local mail transport
/// agent. Headers and body match what the site's legacy mail endpoint
/// produced.
pub struct SendmailDeliverer {
    from_address: Mailbox,
    to_address: Mailbox,
    transport: AsyncSendmailTransport<Tokio1Executor>,
}

impl SendmailDeliverer {
    pub fn new(from_address: Mailbox, to_address: Mailbox) -> Self {
        let transport = match config::require_variable(SENDMAIL_COMMAND_VARIABLE) {
            Ok(command) => AsyncSendmailTransport::new_with_command(command),
            Err(_) => AsyncSendmailTransport::new(),
        };
        Self {
            from_address,
            to_address,
            transport,
        }
    }
}

#[async_trait]
impl Deliverer for SendmailDeliverer {
    async fn deliver(&self, submission: &ValidatedSubmission<'_>) -> Result<(), DeliveryError> {
        let email = Message::builder()
            .from(self.from_address.clone())
            .reply_to(submission.reply_to())
            .to(self.to_address.clone())
            .subject(submission.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body::plain_text_body(submission))
            .map_err(|error| DeliveryError::Internal(format!("Error building message: {error}")))?;
        self.transport.send(email).await.map_err(|error| {
            DeliveryError::Internal(format!(
                "Error handing message to the mail transport agent: {error}"
            ))
        })?;
        Ok(())
    }
}
