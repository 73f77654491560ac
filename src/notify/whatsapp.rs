use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::invoice::{invoice_file_name, render_invoice_pdf};
use super::{BookingEvent, Notifier, NotifyError};
use crate::booking::BookingDetails;
use crate::settings::{Settings, WhatsAppProvider, WhatsAppSettings};
use crate::utils::format::{display_id, format_currency};
use crate::utils::validation::strip_phone_separators;

const GREEN_API_BASE: &str = "https://api.green-api.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const COUNTRY_CODE: &str = "91";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    chat_id: String,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageResponse {
    id_message: Option<String>,
}

/// Green API chat id for a phone number, adding the Indian country code to
/// bare 10-digit numbers
pub fn chat_id(phone: &str) -> String {
    let digits = strip_phone_separators(phone);
    if digits.len() == 10 && !digits.starts_with(COUNTRY_CODE) {
        format!("{}{}@c.us", COUNTRY_CODE, digits)
    } else {
        format!("{}@c.us", digits)
    }
}

pub fn confirmation_message(details: &BookingDetails, settings: &Settings) -> String {
    let booking = &details.booking;
    let kind = if booking.is_group_booking { "group" } else { "single" };
    let agency = &settings.agency;

    format!(
        "*Booking Confirmed - {agency}*\n\n\
         Dear {name},\n\n\
         Your {kind} booking is confirmed!\n\n\
         Booking ID: {id}\n\
         Amount: {total}\n\n\
         For queries, call: {phone}\n\
         Email: {email}\n\n\
         Thank you for choosing {agency}",
        agency = agency.name,
        name = booking.name,
        kind = kind,
        id = display_id(booking.id),
        total = format_currency(booking.total),
        phone = agency.phone,
        email = agency.email,
    )
}

/// Sends a confirmation to the primary contact when a booking is created
pub struct WhatsAppNotifier {
    client: Client,
}

impl WhatsAppNotifier {
    pub fn new() -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client })
    }

    fn green_api_url(config: &WhatsAppSettings, method: &str) -> Result<String, NotifyError> {
        if config.green_api_instance_id.is_empty() || config.green_api_token.is_empty() {
            return Err(NotifyError::Rejected("Green API credentials not configured".to_string()));
        }
        Ok(format!(
            "{}/waInstance{}/{}/{}",
            GREEN_API_BASE, config.green_api_instance_id, method, config.green_api_token
        ))
    }

    async fn message_id(response: Response) -> Result<String, NotifyError> {
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(format!("status {}", status)));
        }

        response
            .json::<SendMessageResponse>()
            .await?
            .id_message
            .ok_or_else(|| NotifyError::Rejected("no message id in response".to_string()))
    }

    async fn send_text(
        &self,
        config: &WhatsAppSettings,
        phone: &str,
        message: &str,
    ) -> Result<String, NotifyError> {
        let url = Self::green_api_url(config, "sendMessage")?;
        let response = self
            .client
            .post(url)
            .json(&SendMessageRequest {
                chat_id: chat_id(phone),
                message,
            })
            .send()
            .await?;
        Self::message_id(response).await
    }

    /// Upload the invoice PDF with the confirmation as its caption
    async fn send_invoice(
        &self,
        config: &WhatsAppSettings,
        phone: &str,
        caption: &str,
        booking_id: i32,
        pdf: Vec<u8>,
    ) -> Result<String, NotifyError> {
        let url = Self::green_api_url(config, "sendFileByUpload")?;
        let file = Part::bytes(pdf)
            .file_name(invoice_file_name(booking_id))
            .mime_str("application/pdf")?;
        let form = Form::new()
            .text("chatId", chat_id(phone))
            .text("caption", caption.to_string())
            .part("file", file);

        let response = self.client.post(url).multipart(form).send().await?;
        Self::message_id(response).await
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn notify(&self, event: &BookingEvent, settings: &Settings) -> Result<(), NotifyError> {
        let BookingEvent::Created(details) = event else {
            return Ok(());
        };

        let config = &settings.whatsapp;
        if !config.enabled || !config.send_on_booking {
            return Ok(());
        }

        let phone = details.booking.phone.trim();
        if phone.is_empty() {
            tracing::debug!(booking_id = details.booking.id, "No phone number, skipping WhatsApp");
            return Ok(());
        }

        let booking_id = details.booking.id;
        let message = confirmation_message(details, settings);
        let invoice = match render_invoice_pdf(details, settings) {
            Ok(pdf) => Some(pdf),
            Err(e) => {
                tracing::warn!(booking_id, error = %e, "Sending WhatsApp confirmation without invoice");
                None
            }
        };

        match config.provider {
            WhatsAppProvider::Mock => {
                tracing::info!(
                    to = %chat_id(phone),
                    body = %message,
                    with_invoice = invoice.is_some(),
                    "Mock WhatsApp message"
                );
            }
            WhatsAppProvider::GreenApi => {
                let message_id = match invoice {
                    Some(pdf) => self.send_invoice(config, phone, &message, booking_id, pdf).await?,
                    None => self.send_text(config, phone, &message).await?,
                };
                tracing::info!(booking_id, message_id = %message_id, "WhatsApp message sent");
            }
        }
        Ok(())
    }
}
