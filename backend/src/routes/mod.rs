//! Route definitions for the Laptop Tracking Platform

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use tower_http::services::ServeDir;

use crate::{handlers, middleware::auth_middleware, AppState};

/// Room for form fields and multipart framing around the three photos
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - shipments and their lifecycle
        .nest("/shipments", shipment_routes(state.clone()))
        // Protected routes - laptop inventory and reception
        .nest("/laptops", laptop_routes(state.clone()))
        // Protected routes - reception approval
        .nest("/reception-reports", reception_routes(state.clone()))
        // Protected routes - audit trail
        .nest("/audit-logs", audit_routes(state))
}

/// Shipment routes (protected)
fn shipment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_shipments).post(handlers::create_shipment),
        )
        .route(
            "/:shipment_id",
            get(handlers::get_shipment).patch(handlers::update_shipment),
        )
        .route("/:shipment_id/status", put(handlers::update_shipment_status))
        .route("/:shipment_id/pickup-form", put(handlers::submit_pickup_form))
        .route("/:shipment_id/laptops", post(handlers::add_laptop_to_shipment))
        .route(
            "/:shipment_id/edit-eligibility",
            get(handlers::get_edit_eligibility),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Laptop routes (protected)
fn laptop_routes(state: AppState) -> Router<AppState> {
    let upload_limit = 3 * state.config.uploads.max_photo_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(handlers::list_laptops).post(handlers::create_laptop))
        .route("/:laptop_id", get(handlers::get_laptop))
        .route(
            "/:laptop_id/reception-reports",
            get(handlers::list_reception_reports)
                .post(handlers::submit_reception_report)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Reception report routes (protected)
fn reception_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/:report_id/approve",
            post(handlers::approve_reception_report),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Audit log routes (protected)
fn audit_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_audit_logs))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Stored inspection photos (protected)
pub fn photo_routes(state: AppState) -> Router<AppState> {
    let photos = ServeDir::new(state.storage.public_dir());
    Router::new()
        .nest_service(&state.storage.public_route(), photos)
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Request, StatusCode},
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::middleware::auth::Claims;
    use crate::test_support::{lazy_state, JWT_SECRET};

    fn token(role: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            role: role.to_string(),
            client_company_id: None,
            exp: now + 3600,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .unwrap()
    }

    async fn stored_photo_app(dir: &TempDir) -> (Router, String) {
        let state = lazy_state(&dir.path().to_string_lossy());
        let public_dir = state.storage.public_dir();
        tokio::fs::create_dir_all(&public_dir).await.unwrap();
        tokio::fs::write(public_dir.join("serial.jpg"), b"jpeg-bytes")
            .await
            .unwrap();

        let url = format!("{}/serial.jpg", state.storage.public_route());
        (photo_routes(state.clone()).with_state(state), url)
    }

    #[tokio::test]
    async fn test_photos_require_token() {
        let dir = TempDir::new().unwrap();
        let (app, url) = stored_photo_app(&dir).await;

        let response = app
            .oneshot(Request::get(&url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_photos_served_to_authenticated_users() {
        let dir = TempDir::new().unwrap();
        let (app, url) = stored_photo_app(&dir).await;

        let response = app
            .oneshot(
                Request::get(&url)
                    .header(AUTHORIZATION, format!("Bearer {}", token("logistics")))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
