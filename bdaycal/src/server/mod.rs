//! HTTP boundary layer.
//!
//! A deliberately thin wrapper: it accepts a credential pair, invokes the
//! pipeline, and streams the calendar back as a file download. Every
//! internal failure kind maps to a distinct generic response; internal
//! error text never reaches the caller.
//!
//! Endpoints:
//! - GET / - static front-end
//! - POST / - run the export, respond with an ICS attachment

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::error::{AuthError, Error, FetchError};
use crate::scrape;

const ATTACHMENT_FILENAME: &str = "birthdays.ics";

/// Request body for the export endpoint.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub email: String,
    #[serde(rename = "pass")]
    pub password: String,
}

/// Start the server and block until it exits.
pub async fn start_server(port: u16) -> Result<()> {
    let app = Router::new()
        .route("/", get(index_handler).post(export_handler))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "bdaycal server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

async fn export_handler(Json(request): Json<ExportRequest>) -> Response {
    match scrape::get_birthdays(&request.email, &request.password).await {
        Ok(ics) => (
            [
                (
                    header::CONTENT_TYPE,
                    "text/calendar; charset=utf-8".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{ATTACHMENT_FILENAME}\""),
                ),
            ],
            ics,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "calendar export failed");
            error_response(&err)
        }
    }
}

/// Map an internal failure to a generic response without leaking detail.
fn error_response(err: &Error) -> Response {
    let (status, message) = match err {
        Error::Auth(AuthError::LoginRejected) => {
            (StatusCode::UNAUTHORIZED, "login rejected")
        }
        Error::Auth(AuthError::CheckpointRequired) => (
            StatusCode::FORBIDDEN,
            "account requires additional verification",
        ),
        Error::Auth(_) => (StatusCode::BAD_GATEWAY, "login service unavailable"),
        Error::Fetch(FetchError::PageUnavailable(_) | FetchError::Network(_)) => {
            (StatusCode::BAD_GATEWAY, "birthday service unavailable")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "calendar export failed"),
    };

    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DateParseError;

    #[test]
    fn rejected_credentials_map_to_unauthorized() {
        let response = error_response(&Error::Auth(AuthError::LoginRejected));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn checkpoint_maps_to_forbidden() {
        let response = error_response(&Error::Auth(AuthError::CheckpointRequired));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let response = error_response(&Error::Auth(AuthError::TokenNotFound));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn everything_else_is_a_generic_failure() {
        let response = error_response(&Error::Fetch(FetchError::NoData));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = error_response(&Error::DateParse(DateParseError::UnsupportedLocale(
            "ar_AR".to_string(),
        )));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
