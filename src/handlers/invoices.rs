use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::booking::BookingRepository;
use crate::error::{AppError, AppResult};
use crate::notify::invoice::{invoice_file_name, render_invoice_pdf};
use crate::AppState;

/// Render the invoice PDF for a booking on demand
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(booking_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let details = BookingRepository::get_by_id(&state.db, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let settings = state.settings.current();
    let pdf = render_invoice_pdf(&details, &settings)
        .map_err(|e| AppError::Internal(format!("Could not generate invoice: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", invoice_file_name(booking_id)),
            ),
        ],
        pdf,
    ))
}
