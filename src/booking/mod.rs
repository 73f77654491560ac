//! Booking computation and persistence pipeline.
//!
//! A request moves through [`form`] (typed payload), [`validator`],
//! [`totals`] and finally [`repository`], with [`workflow`] tying the steps
//! together for create and update.

pub mod export;
pub mod form;
pub mod repository;
pub mod totals;
pub mod validator;
pub mod workflow;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::entities::{booking, booking_customer};

pub use export::bookings_csv;
pub use form::{BookingForm, CustomerForm};
pub use repository::{
    BookingRepository, BookingSummary, BulkDeleteOutcome, DeleteOutcome, Pagination, SearchPage,
    SearchQuery,
};
pub use totals::{compute_totals, Totals};
pub use validator::{BookingMode, ValidatedBooking};
pub use workflow::{BookingWorkflow, Committed};

/// One traveller of a group booking, ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub seat_room: Option<String>,
    pub amount: Decimal,
}

/// Free-text service fields. Which ones matter depends on the booking type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDetails {
    pub hotel_name: Option<String>,
    pub hotel_city: Option<String>,
    pub hotel_country: Option<String>,
    pub operator_name: Option<String>,
    pub from_journey: Option<String>,
    pub from_journey_country: Option<String>,
    pub to_journey: Option<String>,
    pub to_journey_country: Option<String>,
    pub vehicle_number: Option<String>,
    pub service_date: Option<String>,
    pub service_time: Option<String>,
}

impl ServiceDetails {
    pub fn from_form(form: &BookingForm) -> Self {
        Self {
            hotel_name: form.hotel_name.clone(),
            hotel_city: form.hotel_city.clone(),
            hotel_country: form.hotel_country.clone(),
            operator_name: form.operator_name.clone(),
            from_journey: form.from_journey.clone(),
            from_journey_country: form.from_journey_country.clone(),
            to_journey: form.to_journey.clone(),
            to_journey_country: form.to_journey_country.clone(),
            vehicle_number: form.vehicle_number.clone(),
            service_date: form.service_date.clone(),
            service_time: form.service_time.clone(),
        }
    }
}

/// Every mutable column of a booking row
#[derive(Debug, Clone, PartialEq)]
pub struct BookingFields {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub booking_type: booking::BookingType,
    pub base_amount: Decimal,
    pub gst: Decimal,
    pub total: Decimal,
    pub details: ServiceDetails,
    pub customer_address: Option<String>,
    pub apply_gst: bool,
    pub is_group_booking: bool,
}

/// A stored booking with its travellers (empty unless it is a group booking)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub customers: Vec<booking_customer::Model>,
}
