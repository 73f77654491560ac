//! Post-commit side effects for bookings.
//!
//! Handlers publish a [`BookingEvent`] once the write is committed and move on.
//! A [`Dispatcher`] task owns the receiving end and runs every [`Notifier`]
//! for each event. Notifier failures are logged here and go no further.

pub mod email;
pub mod invoice;
pub mod whatsapp;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::booking::BookingDetails;
use crate::settings::{Settings, SharedSettings};

pub use email::EmailNotifier;
pub use invoice::{render_invoice, render_invoice_pdf, InvoiceNotifier};
pub use whatsapp::WhatsAppNotifier;

/// Events waiting for the dispatcher before `publish` starts dropping them
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected message: {0}")]
    Rejected(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Email error: {0}")]
    Email(String),
}

#[derive(Debug, Clone)]
pub enum BookingEvent {
    Created(BookingDetails),
    Updated(BookingDetails),
    Deleted { booking_id: i32 },
}

impl BookingEvent {
    pub fn booking_id(&self) -> i32 {
        match self {
            BookingEvent::Created(details) | BookingEvent::Updated(details) => details.booking.id,
            BookingEvent::Deleted { booking_id } => *booking_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BookingEvent::Created(_) => "created",
            BookingEvent::Updated(_) => "updated",
            BookingEvent::Deleted { .. } => "deleted",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn notify(&self, event: &BookingEvent, settings: &Settings) -> Result<(), NotifyError>;
}

/// Sending half, cloned into the application state
#[derive(Clone, Debug)]
pub struct Notifications {
    sender: mpsc::Sender<BookingEvent>,
}

impl Notifications {
    /// Queue an event without waiting. A full queue or a stopped dispatcher
    /// drops the event.
    pub fn publish(&self, event: BookingEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => tracing::warn!(
                booking_id = event.booking_id(),
                event = event.kind(),
                "Notification queue is full, dropping event"
            ),
            Err(TrySendError::Closed(event)) => tracing::warn!(
                booking_id = event.booking_id(),
                event = event.kind(),
                "Notification dispatcher is gone, dropping event"
            ),
        }
    }
}

pub struct Dispatcher {
    receiver: mpsc::Receiver<BookingEvent>,
    notifiers: Vec<Box<dyn Notifier>>,
    settings: SharedSettings,
}

/// Create the publishing handle and the dispatcher that drains it
pub fn channel(notifiers: Vec<Box<dyn Notifier>>, settings: SharedSettings) -> (Notifications, Dispatcher) {
    let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
    (
        Notifications { sender },
        Dispatcher {
            receiver,
            notifiers,
            settings,
        },
    )
}

impl Dispatcher {
    /// Run until every `Notifications` handle has been dropped
    pub async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.dispatch(&event).await;
        }
        tracing::debug!("Notification dispatcher stopped");
    }

    pub async fn dispatch(&self, event: &BookingEvent) {
        let settings = self.settings.current();
        for notifier in &self.notifiers {
            match notifier.notify(event, &settings).await {
                Ok(()) => tracing::debug!(
                    notifier = notifier.name(),
                    booking_id = event.booking_id(),
                    event = event.kind(),
                    "Notification delivered"
                ),
                Err(e) => tracing::warn!(
                    notifier = notifier.name(),
                    booking_id = event.booking_id(),
                    event = event.kind(),
                    error = %e,
                    "Notification failed"
                ),
            }
        }
    }
}
