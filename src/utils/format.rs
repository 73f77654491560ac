use rust_decimal::{Decimal, RoundingStrategy};

/// Width of the zero-padded booking number used on invoices and messages
pub const DISPLAY_ID_WIDTH: usize = 6;

/// Render a booking id as `#000042`
pub fn display_id(booking_id: i32) -> String {
    format!("#{:0width$}", booking_id, width = DISPLAY_ID_WIDTH)
}

/// Two-decimal amount with currency prefix, e.g. `Rs. 1050.00`
pub fn format_currency(amount: Decimal) -> String {
    format!("Rs. {}", format_amount(amount))
}

/// Two-decimal amount without currency
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded.to_string()
}
