//! Request payloads for creating and updating bookings.
//!
//! Everything arrives as loosely-typed JSON from the booking form: numbers may
//! be sent as strings, checkboxes as `"on"`, and customer keys with or without
//! a `customer_` prefix. These structs absorb that at the boundary.

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use crate::settings::catalog::parse_bool;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookingForm {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub booking_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub base_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hotel_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hotel_city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hotel_country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub operator_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from_journey: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from_journey_country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub to_journey: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub to_journey_country: Option<String>,
    #[serde(default, alias = "vehicle_train_flight_hotel_number", deserialize_with = "lenient_string")]
    pub vehicle_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub service_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub service_time: Option<String>,
    /// `None` means "use the configured default"
    #[serde(default, deserialize_with = "lenient_bool")]
    pub apply_gst: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_group_booking: Option<bool>,
    #[serde(default)]
    pub customers: Vec<CustomerForm>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CustomerForm {
    #[serde(default, alias = "customer_name", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, alias = "customer_email", deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, alias = "customer_phone", deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, alias = "seat_room_number", deserialize_with = "lenient_string")]
    pub seat_room: Option<String>,
    #[serde(default, alias = "customer_amount", deserialize_with = "lenient_string")]
    pub amount: Option<String>,
}

/// Trim, and treat a blank value as absent
fn tidy(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BookingForm {
    pub fn is_group(&self) -> bool {
        self.is_group_booking.unwrap_or(false)
    }

    /// Trim every text field and drop the blank ones
    pub fn clean(self) -> Self {
        Self {
            name: tidy(self.name),
            email: tidy(self.email),
            phone: tidy(self.phone),
            booking_type: tidy(self.booking_type),
            base_amount: tidy(self.base_amount),
            customer_address: tidy(self.customer_address),
            hotel_name: tidy(self.hotel_name),
            hotel_city: tidy(self.hotel_city),
            hotel_country: tidy(self.hotel_country),
            operator_name: tidy(self.operator_name),
            from_journey: tidy(self.from_journey),
            from_journey_country: tidy(self.from_journey_country),
            to_journey: tidy(self.to_journey),
            to_journey_country: tidy(self.to_journey_country),
            vehicle_number: tidy(self.vehicle_number),
            service_date: tidy(self.service_date),
            service_time: tidy(self.service_time),
            apply_gst: self.apply_gst,
            is_group_booking: self.is_group_booking,
            customers: self.customers.into_iter().map(CustomerForm::clean).collect(),
        }
    }
}

impl CustomerForm {
    pub fn clean(self) -> Self {
        Self {
            name: tidy(self.name),
            email: tidy(self.email),
            phone: tidy(self.phone),
            seat_room: tidy(self.seat_room),
            amount: tidy(self.amount),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a text or number value, got {}",
            other
        ))),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|v| v != 0.0))),
        // An unticked checkbox arrives as an empty string
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Some(false)),
        Some(Value::String(s)) => parse_bool(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a boolean, got {:?}", s))),
        Some(other) => Err(de::Error::custom(format!("expected a boolean, got {}", other))),
    }
}
