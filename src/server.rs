//! HTTP surface: `GET /items`, `POST /submit`, `GET /health`.

use crate::booking::{BookingError, BookingForm, BookingService};
use crate::catalog::Catalog;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<BookingService>,
    /// Reported by `/health`.
    pub port: u16,
}

/// `{success, message?, data?}` envelope used by `/items` and `/submit`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(message: Option<&str>, data: T) -> Self {
        ApiResponse {
            success: true,
            message: message.map(str::to_string),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    fn fail(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub port: u16,
    pub time: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/items", get(list_items))
        .route("/submit", post(submit))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn list_items(State(state): State<AppState>) -> Response {
    let service = state.service.clone();
    match tokio::task::spawn_blocking(move || service.list_items()).await {
        Ok(catalog) => Json(ApiResponse::ok(None, catalog)).into_response(),
        Err(e) => {
            log::error!("stockbook: listing task failed: {e}");
            Json(ApiResponse::ok(None, Catalog::default())).into_response()
        }
    }
}

/// A booking submission from either a JSON body or an HTML form post.
///
/// A body with neither content type reads as a submission with every field
/// missing.
#[derive(Debug)]
pub struct Submission(pub BookingForm);

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let urlencoded = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if urlencoded {
            return match Form::<BookingForm>::from_request(req, state).await {
                Ok(Form(form)) => Ok(Submission(form)),
                Err(rejection) => Err(invalid_body(&rejection.body_text())),
            };
        }

        match Json::<BookingForm>::from_request(req, state).await {
            Ok(Json(form)) => Ok(Submission(form)),
            Err(JsonRejection::MissingJsonContentType(_)) => Ok(Submission(BookingForm::default())),
            Err(rejection) => Err(invalid_body(&rejection.body_text())),
        }
    }
}

fn invalid_body(detail: &str) -> Response {
    let message = format!("Invalid request body: {detail}");
    (StatusCode::BAD_REQUEST, Json(ApiResponse::fail(message))).into_response()
}

async fn submit(State(state): State<AppState>, Submission(form): Submission) -> Response {
    let service = state.service.clone();
    let result = match tokio::task::spawn_blocking(move || service.submit(form)).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("stockbook: booking task failed: {e}");
            return server_error(&e);
        }
    };

    match result {
        Ok(catalog) => Json(ApiResponse::ok(Some("Booking successful"), catalog)).into_response(),
        Err(e) if e.is_client_error() => {
            log::debug!("stockbook: booking rejected: {e}");
            let status = match e {
                BookingError::CategoryNotFound | BookingError::ItemNotFound => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::BAD_REQUEST,
            };
            (status, Json(ApiResponse::fail(e.to_string()))).into_response()
        }
        Err(e) => {
            log::error!("stockbook: booking failed: {e}");
            server_error(&e)
        }
    }
}

fn server_error(detail: &dyn std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::fail(format!("Server error: {detail}"))),
    )
        .into_response()
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "Server running",
        port: state.port,
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
