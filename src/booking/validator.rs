use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::form::BookingForm;
use super::NewCustomer;
use crate::entities::booking::BookingType;
use crate::utils::validation::{is_valid_email, is_valid_phone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingMode {
    Single,
    Group,
}

/// The parts of a booking form that carry rules, parsed into typed values
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBooking {
    pub mode: BookingMode,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub booking_type: BookingType,
    /// For a group booking, the sum of the customer amounts
    pub base_amount: Decimal,
    /// Empty for single bookings
    pub customers: Vec<NewCustomer>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Largest amount a `decimal(12, 2)` column holds
pub const MAX_AMOUNT: Decimal = dec!(9999999999.99);

/// Parse a strictly positive amount, kept to two decimal places.
///
/// Exponent forms such as `1e3` are accepted. Amounts above [`MAX_AMOUNT`]
/// are rejected.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    let parsed = if raw.contains(['e', 'E']) {
        Decimal::from_scientific(raw)
    } else {
        Decimal::from_str(raw)
    };

    parsed
        .ok()
        .map(|amount| amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .filter(|amount| *amount > Decimal::ZERO && *amount <= MAX_AMOUNT)
}

pub fn validate(form: &BookingForm, mode: BookingMode) -> Result<ValidatedBooking, String> {
    match mode {
        BookingMode::Single => validate_single(form),
        BookingMode::Group => validate_group(form),
    }
}

/// Updates say which rule set applies through `is_group_booking`
pub fn validate_update(form: &BookingForm) -> Result<ValidatedBooking, String> {
    if form.is_group() {
        validate_group(form)
    } else {
        validate_single(form)
    }
}

pub fn validate_single(form: &BookingForm) -> Result<ValidatedBooking, String> {
    let name = present(&form.name).ok_or("Missing required field: name")?;
    let phone = present(&form.phone).ok_or("Missing required field: phone")?;
    let booking_type = present(&form.booking_type).ok_or("Missing required field: booking_type")?;
    let base_amount = present(&form.base_amount)
        .and_then(parse_amount)
        .ok_or("Missing or invalid field: base_amount")?;

    let email = present(&form.email);
    if let Some(email) = email {
        if !is_valid_email(email) {
            return Err("Please enter a valid email address".to_string());
        }
    }

    if !is_valid_phone(phone) {
        return Err("Please enter a valid phone number (minimum 10 digits)".to_string());
    }

    let booking_type = BookingType::from_str(booking_type)?;

    Ok(ValidatedBooking {
        mode: BookingMode::Single,
        name: name.to_string(),
        email: email.map(str::to_string),
        phone: phone.to_string(),
        booking_type,
        base_amount,
        customers: Vec::new(),
    })
}

pub fn validate_group(form: &BookingForm) -> Result<ValidatedBooking, String> {
    let booking_type = present(&form.booking_type).ok_or("Missing booking type")?;
    let booking_type = BookingType::from_str(booking_type)?;

    if form.customers.is_empty() {
        return Err("Group booking must have at least one customer".to_string());
    }

    let mut customers = Vec::with_capacity(form.customers.len());
    for (i, customer) in form.customers.iter().enumerate() {
        let n = i + 1;

        let name = present(&customer.name).ok_or_else(|| format!("Customer {} name is required", n))?;
        let amount = present(&customer.amount)
            .and_then(parse_amount)
            .ok_or_else(|| format!("Customer {} amount must be greater than 0", n))?;

        let email = present(&customer.email);
        if email.is_some_and(|e| !is_valid_email(e)) {
            return Err(format!("Customer {} has invalid email format", n));
        }

        let phone = present(&customer.phone);
        if phone.is_some_and(|p| !is_valid_phone(p)) {
            return Err(format!("Customer {} has invalid phone number", n));
        }

        customers.push(NewCustomer {
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            seat_room: present(&customer.seat_room).map(str::to_string),
            amount,
        });
    }

    let base_amount = customers
        .iter()
        .try_fold(Decimal::ZERO, |sum, c| sum.checked_add(c.amount))
        .filter(|sum| *sum <= MAX_AMOUNT)
        .ok_or_else(|| format!("Total customer amount cannot exceed {}", MAX_AMOUNT))?;

    // The first traveller is the contact person on the booking row
    let primary = &customers[0];

    Ok(ValidatedBooking {
        mode: BookingMode::Group,
        name: primary.name.clone(),
        email: primary.email.clone(),
        phone: primary.phone.clone().unwrap_or_default(),
        booking_type,
        base_amount,
        customers,
    })
}
