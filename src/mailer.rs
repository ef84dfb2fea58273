use async_trait::async_trait;
use tracing::{info, instrument};

use crate::shared::AppError;

/// Outbound confirmation-email dispatch.
///
/// The account flows only ever need "send this recipient this confirmation
/// link", so that is the whole contract. Production deployments plug in a
/// real delivery backend; development logs the link instead.
#[async_trait]
pub trait ConfirmationMailer {
    async fn send_confirmation(
        &self,
        recipient: &str,
        confirmation_url: &str,
    ) -> Result<(), AppError>;
}

/// Mailer that writes the confirmation link to the log instead of sending
/// anything. Useful for local development: copy the link out of the log.
pub struct LoggingMailer;

impl LoggingMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggingMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationMailer for LoggingMailer {
    #[instrument(skip(self))]
    async fn send_confirmation(
        &self,
        recipient: &str,
        confirmation_url: &str,
    ) -> Result<(), AppError> {
        info!(
            recipient = %recipient,
            confirmation_url = %confirmation_url,
            "Confirmation instructions"
        );
        Ok(())
    }
}

/// Mailer that records every send for later inspection. Used by tests to
/// assert which confirmation emails went out (and which did not).
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Returns all (recipient, confirmation_url) pairs sent so far
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns the confirmation URLs sent to the given recipient
    pub fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == recipient)
            .map(|(_, url)| url.clone())
            .collect()
    }
}

impl Default for RecordingMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationMailer for RecordingMailer {
    async fn send_confirmation(
        &self,
        recipient: &str,
        confirmation_url: &str,
    ) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), confirmation_url.to_string()));
        Ok(())
    }
}
