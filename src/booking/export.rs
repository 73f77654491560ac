use crate::entities::booking;
use crate::utils::format::format_amount;

const HEADER: [&str; 14] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Booking Type",
    "Base Amount",
    "GST",
    "Total",
    "Date",
    "Hotel Name",
    "Hotel City",
    "Operator",
    "From",
    "To",
];

/// Quote a field when it holds a delimiter, quote or line break
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn row(out: &mut String, values: &[&str]) {
    let fields: Vec<String> = values.iter().map(|v| field(v)).collect();
    out.push_str(&fields.join(","));
    out.push_str("\r\n");
}

/// Render bookings as CSV, one row per booking in the given order
pub fn bookings_csv(bookings: &[booking::Model]) -> String {
    let mut out = String::new();
    row(&mut out, &HEADER);

    for b in bookings {
        let id = b.id.to_string();
        let base = format_amount(b.base_amount);
        let gst = format_amount(b.gst);
        let total = format_amount(b.total);
        let date = b.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
        row(
            &mut out,
            &[
                id.as_str(),
                b.name.as_str(),
                b.email.as_deref().unwrap_or(""),
                b.phone.as_str(),
                b.booking_type.as_str(),
                base.as_str(),
                gst.as_str(),
                total.as_str(),
                date.as_str(),
                b.hotel_name.as_deref().unwrap_or(""),
                b.hotel_city.as_deref().unwrap_or(""),
                b.operator_name.as_deref().unwrap_or(""),
                b.from_journey.as_deref().unwrap_or(""),
                b.to_journey.as_deref().unwrap_or(""),
            ],
        );
    }

    out
}
