use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppResult;
use crate::handlers::{bookings, invoices, settings};
use crate::middleware::rate_limit::{create_global_governor, log_request};
use crate::AppState;

pub fn create_router(state: AppState) -> AppResult<Router> {
    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/search", get(bookings::search_bookings))
        .route("/export", get(bookings::export_bookings))
        .route("/bulk-delete", post(bookings::bulk_delete_bookings))
        .route(
            "/{id}",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        );

    let settings_routes = Router::new()
        .route("/", get(settings::list_settings))
        .route("/refresh", post(settings::refresh_settings))
        .route("/{key}", put(settings::update_setting));

    Ok(Router::new()
        .nest("/api/bookings", booking_routes)
        .nest("/api/settings", settings_routes)
        .route("/invoice/{id}", get(invoices::get_invoice))
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::notify;
    use crate::settings::{Settings, SharedSettings};
    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use tower::ServiceExt;

    async fn app() -> Router {
        let settings = SharedSettings::new(Settings::default());
        let (notifications, dispatcher) = notify::channel(Vec::new(), settings.clone());
        tokio::spawn(dispatcher.run());

        let state = AppState {
            db: test_connection().await,
            settings,
            notifications,
        };
        create_router(state).unwrap()
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let mut request = request.body(body).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_create_then_fetch_booking() {
        let app = app().await;
        let payload = json!({
            "name": "Asha",
            "phone": "9876543210",
            "booking_type": "Hotel",
            "base_amount": "1000",
            "apply_gst": true,
        });

        let (status, body) = call(&app, Method::POST, "/api/bookings", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let id = body["booking_id"].as_i64().unwrap();
        assert_eq!(body["display_id"], format!("#{:06}", id));

        let (status, body) = call(&app, Method::GET, &format!("/api/bookings/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["booking"]["name"], "Asha");
        assert_eq!(body["booking"]["booking_type"], "Hotel");
    }

    #[tokio::test]
    async fn test_validation_failure_is_bad_request() {
        let app = app().await;
        let payload = json!({ "phone": "9876543210", "booking_type": "Hotel", "base_amount": 10 });

        let (status, body) = call(&app, Method::POST, "/api/bookings", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Missing required field: name");
    }

    #[tokio::test]
    async fn test_missing_booking_is_not_found() {
        let app = app().await;

        let (status, _) = call(&app, Method::GET, "/api/bookings/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, Method::DELETE, "/api/bookings/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_search_rejects_bad_paging() {
        let app = app().await;

        let (status, _) = call(&app, Method::GET, "/api/bookings/search?page=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::GET, "/api/bookings/search?q=&page=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn test_huge_page_returns_empty_results() {
        let app = app().await;
        let uri = "/api/bookings/search?page=92233720368547758&per_page=100";

        let (status, body) = call(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!([]));
        assert_eq!(body["pagination"]["has_next"], false);
    }

    #[tokio::test]
    async fn test_oversized_amount_is_bad_request() {
        let app = app().await;
        let payload = json!({
            "name": "Asha",
            "phone": "9876543210",
            "booking_type": "Hotel",
            "base_amount": "79228162514264337593543950335",
        });

        let (status, body) = call(&app, Method::POST, "/api/bookings", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing or invalid field: base_amount");
    }

    #[tokio::test]
    async fn test_invoice_is_served_as_pdf() {
        let app = app().await;
        let payload = json!({
            "name": "Asha",
            "phone": "9876543210",
            "booking_type": "Bus",
            "base_amount": "750",
        });
        let (_, body) = call(&app, Method::POST, "/api/bookings", Some(payload)).await;
        let id = body["booking_id"].as_i64().unwrap();

        let mut request = Request::builder()
            .uri(format!("/invoice/{}", id))
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/pdf");
        assert_eq!(
            response.headers()["content-disposition"],
            format!("inline; filename=\"invoice_{}.pdf\"", id)
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_unknown_setting_is_not_found() {
        let app = app().await;
        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/settings/no_such_key",
            Some(json!({ "value": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
