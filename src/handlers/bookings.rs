use std::str::FromStr;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::booking::{
    bookings_csv, BookingDetails, BookingForm, BookingRepository, BookingWorkflow,
    BulkDeleteOutcome, SearchPage, SearchQuery,
};
use crate::entities::booking::BookingType;
use crate::error::{AppError, AppResult};
use crate::handlers::MessageResponse;
use crate::notify::BookingEvent;
use crate::utils::format::display_id;
use crate::AppState;

const MAX_PER_PAGE: i64 = 100;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))
}

/// Load the committed booking and hand it to the notifiers. The write already
/// succeeded, so a failure here is only logged.
async fn publish_stored(state: &AppState, booking_id: i32, event: fn(BookingDetails) -> BookingEvent) {
    match BookingRepository::get_by_id(&state.db, booking_id).await {
        Ok(Some(details)) => state.notifications.publish(event(details)),
        Ok(None) => tracing::warn!(booking_id, "Committed booking vanished before notification"),
        Err(e) => tracing::warn!(booking_id, error = %e, "Could not load booking for notification"),
    }
}

// ============ Create / Read / Update / Delete ============

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub success: bool,
    pub message: String,
    pub booking_id: i32,
    pub display_id: String,
    pub invoice_url: String,
}

pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<BookingForm>, JsonRejection>,
) -> AppResult<Json<CreateBookingResponse>> {
    let form = body(payload)?;
    let settings = state.settings.current();

    let committed = BookingWorkflow::new(&state.db, &settings).create(form).await?;
    publish_stored(&state, committed.booking_id, BookingEvent::Created).await;

    Ok(Json(CreateBookingResponse {
        success: true,
        message: committed.message,
        booking_id: committed.booking_id,
        display_id: display_id(committed.booking_id),
        invoice_url: format!("/invoice/{}", committed.booking_id),
    }))
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub success: bool,
    pub booking: BookingDetails,
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i32>,
) -> AppResult<Json<BookingResponse>> {
    let booking = BookingRepository::get_by_id(&state.db, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    Ok(Json(BookingResponse {
        success: true,
        booking,
    }))
}

pub async fn update_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i32>,
    payload: Result<Json<BookingForm>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let form = body(payload)?;
    let settings = state.settings.current();

    let message = BookingWorkflow::new(&state.db, &settings)
        .update(booking_id, form)
        .await?;
    publish_stored(&state, booking_id, BookingEvent::Updated).await;

    Ok(Json(MessageResponse::ok(message)))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    let outcome = BookingRepository::delete(&state.db, booking_id).await?;
    if !outcome.deleted {
        return Err(AppError::NotFound(outcome.message));
    }

    tracing::info!(booking_id, "Booking deleted");
    state.notifications.publish(BookingEvent::Deleted { booking_id });

    Ok(Json(MessageResponse::ok(outcome.message)))
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default, alias = "booking_ids")]
    pub ids: Vec<i32>,
}

pub async fn bulk_delete_bookings(
    State(state): State<AppState>,
    payload: Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> AppResult<Json<BulkDeleteOutcome>> {
    let request = body(payload)?;
    if request.ids.is_empty() {
        return Err(AppError::BadRequest("No bookings selected for deletion".to_string()));
    }

    let outcome = BookingRepository::bulk_delete(&state.db, &request.ids).await;
    if !outcome.success {
        return Err(AppError::NotFound(outcome.message));
    }

    tracing::info!(deleted = outcome.deleted_count, requested = request.ids.len(), "Bulk delete finished");
    for &booking_id in &outcome.deleted_ids {
        state.notifications.publish(BookingEvent::Deleted { booking_id });
    }

    Ok(Json(outcome))
}

// ============ Search / Export ============

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub booking_type: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub results: SearchPage,
}

impl SearchParams {
    /// Check paging bounds and the type filter before touching the database
    pub fn into_query(self, default_page_size: u64) -> AppResult<SearchQuery> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::BadRequest("Page must be at least 1".to_string()));
        }

        let per_page = self.per_page.unwrap_or(default_page_size as i64);
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::BadRequest(format!(
                "per_page must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }

        let booking_type = match self.booking_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(BookingType::from_str(raw).map_err(AppError::BadRequest)?),
        };

        Ok(SearchQuery {
            query: self.q,
            booking_type,
            page: page as u64,
            page_size: per_page as u64,
        })
    }
}

pub async fn search_bookings(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let query = params.into_query(state.settings.current().default_page_size)?;
    let results = BookingRepository::search(&state.db, &query).await?;

    Ok(Json(SearchResponse {
        success: true,
        results,
    }))
}

pub async fn export_bookings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let bookings = BookingRepository::export_all(&state.db).await?;
    tracing::info!(rows = bookings.len(), "Exporting bookings");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"bookings_export.csv\""),
        ],
        bookings_csv(&bookings),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, per_page: Option<i64>, booking_type: Option<&str>) -> SearchParams {
        SearchParams {
            q: Some("asha".into()),
            booking_type: booking_type.map(str::to_string),
            page,
            per_page,
        }
    }

    #[test]
    fn test_search_params_defaults() {
        let query = params(None, None, Some("")).into_query(10).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);
        assert_eq!(query.booking_type, None);
        assert_eq!(query.query.as_deref(), Some("asha"));
    }

    #[test]
    fn test_search_params_bounds() {
        assert!(matches!(params(Some(0), None, None).into_query(10), Err(AppError::BadRequest(_))));
        assert!(matches!(params(None, Some(0), None).into_query(10), Err(AppError::BadRequest(_))));
        assert!(matches!(params(None, Some(101), None).into_query(10), Err(AppError::BadRequest(_))));
        assert!(params(Some(3), Some(100), None).into_query(10).is_ok());
    }

    #[test]
    fn test_search_params_type_filter() {
        let query = params(None, None, Some("Bus")).into_query(10).unwrap();
        assert_eq!(query.booking_type, Some(BookingType::Bus));
        assert!(matches!(
            params(None, None, Some("Cruise")).into_query(10),
            Err(AppError::BadRequest(_))
        ));
    }
}
