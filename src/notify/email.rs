use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::invoice::{invoice_file_name, render_invoice_pdf};
use super::{BookingEvent, Notifier, NotifyError};
use crate::booking::BookingDetails;
use crate::settings::{EmailSettings, Settings};
use crate::utils::format::{display_id, format_currency};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

fn email_error(e: impl std::fmt::Display) -> NotifyError {
    NotifyError::Email(e.to_string())
}

pub fn confirmation_subject(details: &BookingDetails) -> String {
    format!("Booking Confirmation - {}", details.booking.booking_type)
}

pub fn confirmation_body(details: &BookingDetails, settings: &Settings) -> String {
    let booking = &details.booking;
    let agency = &settings.agency;

    format!(
        "Dear {name},\n\n\
         Thank you for choosing {agency}! Your booking has been confirmed.\n\n\
         Booking Details:\n\
         - Booking ID: {id}\n\
         - Service Type: {kind}\n\
         - Total Amount: {total}\n\
         - Date: {date}\n\n\
         A detailed invoice is attached to this email.\n\n\
         For any queries, please contact us at {email}.\n\n\
         Best regards,\n\
         {agency} Team\n",
        name = booking.name,
        agency = agency.name,
        id = display_id(booking.id),
        kind = booking.booking_type,
        total = format_currency(booking.total),
        date = booking.created_at.format("%d-%m-%Y"),
        email = agency.email,
    )
}

/// Build the confirmation mail, attaching the invoice when there is one
pub fn confirmation_email(
    details: &BookingDetails,
    settings: &Settings,
    recipient: &str,
    invoice: Option<Vec<u8>>,
) -> Result<Message, NotifyError> {
    let from: Mailbox = settings.email.sender().parse().map_err(email_error)?;
    let to: Mailbox = recipient.parse().map_err(email_error)?;

    let mut body = MultiPart::mixed().singlepart(SinglePart::plain(confirmation_body(details, settings)));
    if let Some(pdf) = invoice {
        let content_type = ContentType::parse("application/pdf").map_err(email_error)?;
        body = body.singlepart(Attachment::new(invoice_file_name(details.booking.id)).body(pdf, content_type));
    }

    Message::builder()
        .from(from)
        .to(to)
        .subject(confirmation_subject(details))
        .multipart(body)
        .map_err(email_error)
}

/// Emails the booking contact over SMTP with STARTTLS when a booking is created
#[derive(Debug, Default)]
pub struct EmailNotifier;

impl EmailNotifier {
    pub fn new() -> Self {
        Self
    }

    async fn send(&self, config: &EmailSettings, message: Message) -> Result<(), NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(email_error)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        transport.send(message).await.map_err(email_error)?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn notify(&self, event: &BookingEvent, settings: &Settings) -> Result<(), NotifyError> {
        let BookingEvent::Created(details) = event else {
            return Ok(());
        };

        let config = &settings.email;
        if !config.enabled {
            return Ok(());
        }

        let booking_id = details.booking.id;
        let Some(recipient) = details.booking.email.as_deref().filter(|e| !e.is_empty()) else {
            tracing::debug!(booking_id, "No email address, skipping confirmation email");
            return Ok(());
        };

        if !config.is_complete() {
            return Err(NotifyError::Rejected("Incomplete SMTP configuration".to_string()));
        }

        let invoice = match render_invoice_pdf(details, settings) {
            Ok(pdf) => Some(pdf),
            Err(e) => {
                tracing::warn!(booking_id, error = %e, "Sending confirmation email without invoice");
                None
            }
        };

        let message = confirmation_email(details, settings, recipient, invoice)?;
        self.send(config, message).await?;

        tracing::info!(booking_id, to = %recipient, "Confirmation email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::booking::{self, BookingType};
    use crate::notify::channel;
    use crate::settings::SharedSettings;
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;

    fn details(email: Option<&str>) -> BookingDetails {
        let created_at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 6, 1, 10, 0, 0)
            .unwrap();
        BookingDetails {
            booking: booking::Model {
                id: 42,
                name: "Asha".into(),
                email: email.map(str::to_string),
                phone: "9876543210".into(),
                booking_type: BookingType::Train,
                base_amount: dec!(1000),
                gst: dec!(50),
                total: dec!(1050),
                created_at,
                hotel_name: None,
                hotel_city: None,
                hotel_country: None,
                operator_name: None,
                from_journey: None,
                from_journey_country: None,
                to_journey: None,
                to_journey_country: None,
                vehicle_number: Some("12951".into()),
                service_date: None,
                service_time: None,
                customer_address: None,
                apply_gst: true,
                is_group_booking: false,
            },
            customers: Vec::new(),
        }
    }

    fn smtp_settings() -> Settings {
        let mut settings = Settings::default();
        settings.email = EmailSettings {
            enabled: true,
            smtp_server: "smtp.example.com".into(),
            smtp_port: 587,
            smtp_username: "bookings@example.com".into(),
            smtp_password: "secret".into(),
            from_email: String::new(),
        };
        settings
    }

    #[test]
    fn test_confirmation_body() {
        let body = confirmation_body(&details(None), &Settings::default());
        assert!(body.starts_with("Dear Asha,"));
        assert!(body.contains("- Booking ID: #000042"));
        assert!(body.contains("- Service Type: Train"));
        assert!(body.contains("- Total Amount: Rs. 1050.00"));
        assert!(body.contains("- Date: 01-06-2025"));
        assert!(body.contains("info@himanshitravels.com"));
    }

    #[test]
    fn test_confirmation_email_carries_invoice() {
        let details = details(Some("asha@example.com"));
        let settings = smtp_settings();
        let pdf = render_invoice_pdf(&details, &settings).unwrap();

        let message = confirmation_email(&details, &settings, "asha@example.com", Some(pdf)).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("Subject: Booking Confirmation - Train"));
        assert!(raw.contains("From: bookings@example.com"));
        assert!(raw.contains("To: asha@example.com"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("invoice_42.pdf"));
    }

    #[test]
    fn test_bad_address_is_an_email_error() {
        let err = confirmation_email(&details(None), &smtp_settings(), "not an address", None).unwrap_err();
        assert!(matches!(err, NotifyError::Email(_)));
    }

    #[tokio::test]
    async fn test_disabled_or_without_recipient_does_nothing() {
        let notifier = EmailNotifier::new();

        let event = BookingEvent::Created(details(Some("asha@example.com")));
        assert!(notifier.notify(&event, &Settings::default()).await.is_ok());

        let event = BookingEvent::Created(details(None));
        assert!(notifier.notify(&event, &smtp_settings()).await.is_ok());

        let event = BookingEvent::Deleted { booking_id: 42 };
        assert!(notifier.notify(&event, &smtp_settings()).await.is_ok());
    }

    #[tokio::test]
    async fn test_incomplete_smtp_config_is_rejected() {
        let mut settings = smtp_settings();
        settings.email.smtp_password = String::new();

        let event = BookingEvent::Created(details(Some("asha@example.com")));
        let err = EmailNotifier::new().notify(&event, &settings).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(ref m) if m == "Incomplete SMTP configuration"));
    }

    #[tokio::test]
    async fn test_dispatcher_survives_email_failure() {
        let mut settings = smtp_settings();
        settings.email.smtp_server = String::new();

        let notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(EmailNotifier::new())];
        let (notifications, dispatcher) = channel(notifiers, SharedSettings::new(settings));
        let task = tokio::spawn(dispatcher.run());

        notifications.publish(BookingEvent::Created(details(Some("asha@example.com"))));
        drop(notifications);
        assert!(task.await.is_ok());
    }
}
