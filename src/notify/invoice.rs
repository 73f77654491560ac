use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::{BookingEvent, Notifier, NotifyError};
use crate::booking::BookingDetails;
use crate::settings::Settings;
use crate::utils::format::{display_id, format_currency};

const RULE_WIDTH: usize = 60;

// A4, monospaced so the text columns line up
const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 5.0;
const FONT_SIZE: f32 = 10.0;

pub fn invoice_file_name(booking_id: i32) -> String {
    format!("invoice_{}.pdf", booking_id)
}

pub fn invoice_path(bills_dir: &Path, booking_id: i32) -> PathBuf {
    bills_dir.join(invoice_file_name(booking_id))
}

fn line(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        let _ = writeln!(out, "{:<18}{}", label, value);
    }
}

/// Invoice text for a stored booking, laid out in fixed-width columns
pub fn render_invoice(details: &BookingDetails, settings: &Settings) -> String {
    let booking = &details.booking;
    let agency = &settings.agency;
    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{}", agency.name);
    if !agency.tagline.is_empty() {
        let _ = writeln!(out, "{}", agency.tagline);
    }
    line(&mut out, "Address:", Some(&agency.address));
    line(&mut out, "Phone:", Some(&agency.phone));
    line(&mut out, "Email:", Some(&agency.email));
    line(&mut out, "GSTIN:", Some(&agency.gstin));
    let _ = writeln!(out, "{}", rule);

    let _ = writeln!(out, "INVOICE");
    line(&mut out, "Invoice No:", Some(&display_id(booking.id)));
    line(&mut out, "Date:", Some(&booking.created_at.format("%d-%m-%Y").to_string()));
    let _ = writeln!(out, "{}", thin);

    let _ = writeln!(out, "BILL TO");
    line(&mut out, "Name:", Some(&booking.name));
    line(&mut out, "Phone:", Some(&booking.phone));
    line(&mut out, "Email:", booking.email.as_deref());
    line(&mut out, "Address:", booking.customer_address.as_deref());
    let _ = writeln!(out, "{}", thin);

    let _ = writeln!(out, "SERVICE DETAILS");
    line(&mut out, "Booking Type:", Some(booking.booking_type.as_str()));
    line(&mut out, "Hotel:", booking.hotel_name.as_deref());
    line(&mut out, "City:", booking.hotel_city.as_deref());
    line(&mut out, "Country:", booking.hotel_country.as_deref());
    line(&mut out, "Operator:", booking.operator_name.as_deref());
    line(&mut out, "From:", journey(&booking.from_journey, &booking.from_journey_country).as_deref());
    line(&mut out, "To:", journey(&booking.to_journey, &booking.to_journey_country).as_deref());
    line(&mut out, booking.booking_type.vehicle_label(), booking.vehicle_number.as_deref());
    line(&mut out, "Service Date:", booking.service_date.as_deref());
    line(&mut out, "Service Time:", booking.service_time.as_deref());

    if !details.customers.is_empty() {
        let _ = writeln!(out, "{}", thin);
        let _ = writeln!(out, "TRAVELLERS");
        let _ = writeln!(out, "{:<4}{:<26}{:<14}{:>16}", "#", "Name", "Seat/Room", "Amount");
        for (i, customer) in details.customers.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:<4}{:<26}{:<14}{:>16}",
                i + 1,
                customer.customer_name,
                customer.seat_room_number.as_deref().unwrap_or("-"),
                format_currency(customer.customer_amount)
            );
        }
    }

    let _ = writeln!(out, "{}", thin);
    let tax_label = if booking.apply_gst {
        format!("GST ({}%):", settings.gst_percent.normalize())
    } else {
        "GST (not applied):".to_string()
    };
    let _ = writeln!(out, "{:<42}{:>18}", "Base Amount:", format_currency(booking.base_amount));
    let _ = writeln!(out, "{:<42}{:>18}", tax_label, format_currency(booking.gst));
    let _ = writeln!(out, "{:<42}{:>18}", "Total:", format_currency(booking.total));
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Thank you for choosing {}", agency.name);

    out
}

fn pdf_error(e: printpdf::Error) -> NotifyError {
    NotifyError::Pdf(e.to_string())
}

/// The invoice as a PDF document, one text line per row, paged as needed
pub fn render_invoice_pdf(details: &BookingDetails, settings: &Settings) -> Result<Vec<u8>, NotifyError> {
    let text = render_invoice(details, settings);
    let lines: Vec<&str> = text.lines().collect();
    let lines_per_page = ((PAGE_HEIGHT.0 - 2.0 * MARGIN_MM) / LINE_HEIGHT_MM) as usize;

    let title = format!("Invoice {}", display_id(details.booking.id));
    let (doc, first_page, first_layer) =
        PdfDocument::new(title.as_str(), PAGE_WIDTH, PAGE_HEIGHT, "Invoice");
    let font = doc.add_builtin_font(BuiltinFont::Courier).map_err(pdf_error)?;

    for (n, chunk) in lines.chunks(lines_per_page).enumerate() {
        let layer = if n == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Invoice");
            doc.get_page(page).get_layer(layer)
        };

        for (row, line) in chunk.iter().enumerate() {
            let y = PAGE_HEIGHT.0 - MARGIN_MM - row as f32 * LINE_HEIGHT_MM;
            layer.use_text(*line, FONT_SIZE, Mm(MARGIN_MM), Mm(y), &font);
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn journey(place: &Option<String>, country: &Option<String>) -> Option<String> {
    match (place.as_deref(), country.as_deref()) {
        (Some(place), Some(country)) => Some(format!("{}, {}", place, country)),
        (Some(place), None) => Some(place.to_string()),
        _ => None,
    }
}

/// Keeps `{bills_dir}/invoice_{id}.pdf` in step with the stored booking
pub struct InvoiceNotifier {
    bills_dir: PathBuf,
}

impl InvoiceNotifier {
    pub fn new(bills_dir: impl Into<PathBuf>) -> Self {
        Self {
            bills_dir: bills_dir.into(),
        }
    }
}

#[async_trait]
impl Notifier for InvoiceNotifier {
    fn name(&self) -> &'static str {
        "invoice"
    }

    async fn notify(&self, event: &BookingEvent, settings: &Settings) -> Result<(), NotifyError> {
        match event {
            BookingEvent::Created(details) | BookingEvent::Updated(details) => {
                let pdf = render_invoice_pdf(details, settings)?;
                tokio::fs::create_dir_all(&self.bills_dir).await?;
                let path = invoice_path(&self.bills_dir, details.booking.id);
                tokio::fs::write(&path, pdf).await?;
                tracing::info!(booking_id = details.booking.id, path = %path.display(), "Invoice written");
            }
            BookingEvent::Deleted { booking_id } => {
                let path = invoice_path(&self.bills_dir, *booking_id);
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => tracing::info!(booking_id, "Invoice removed"),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }
}
