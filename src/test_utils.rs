//! Mail senders for tests that never touch the network.

use crate::notification::sendgrid::{DeliveryError, MailMessage, MailSender};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A sender that records every message and always succeeds.
#[derive(Clone, Debug, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<MailMessage>>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// The messages "sent" so far, oldest first.
    pub fn sent_messages(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl MailSender for RecordingSender {
    fn send(&self, message: &MailMessage) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// A sender that fails every attempt with an error built by `make_error`.
#[derive(Clone)]
pub struct FailingSender {
    make_error: Arc<dyn Fn() -> DeliveryError + Send + Sync>,
    attempts: Arc<AtomicUsize>,
}

impl FailingSender {
    pub fn new(make_error: impl Fn() -> DeliveryError + Send + Sync + 'static) -> Self {
        Self {
            make_error: Arc::new(make_error),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fails as if the service answered with the given status and body.
    pub fn with_status(status: u16, message: &str) -> Self {
        let message = message.to_string();
        Self::new(move || DeliveryError::Rejected {
            status,
            message: message.clone(),
        })
    }

    /// How many sends were attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl MailSender for FailingSender {
    fn send(&self, _message: &MailMessage) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err((self.make_error)())
    }
}
