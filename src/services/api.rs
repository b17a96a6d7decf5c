use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::models::{
    AvailabilityCheckRequest, AvailabilityCheckResponse, AvailabilityRecord, Booking,
    BookingStatus, NewBooking, Resource, ResourceInput, StatusUpdate,
};
use crate::services::timefmt::Separator;
use crate::services::validation::TimeWindow;

// ============================================================================
// Errors
// ============================================================================

/// Remote operations, used to pick a generic failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListResources,
    CreateResource,
    UpdateResource,
    DeleteResource,
    ListBookings,
    CreateBooking,
    UpdateBookingStatus,
    DeleteBooking,
    QueryAvailability,
    CheckAvailability,
}

impl Operation {
    fn message_key(self) -> &'static str {
        match self {
            Operation::ListResources => "api.load_resources_failed",
            Operation::CreateResource => "api.create_resource_failed",
            Operation::UpdateResource => "api.update_resource_failed",
            Operation::DeleteResource => "api.delete_resource_failed",
            Operation::ListBookings => "api.load_bookings_failed",
            Operation::CreateBooking => "api.create_booking_failed",
            Operation::UpdateBookingStatus => "api.update_booking_failed",
            Operation::DeleteBooking => "api.delete_booking_failed",
            Operation::QueryAvailability | Operation::CheckAvailability => {
                "api.check_availability_failed"
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{operation:?}: transport error: {message}")]
    Transport { operation: Operation, message: String },

    #[error("{operation:?}: HTTP {status}: {}", .message.as_deref().unwrap_or("<no error body>"))]
    Status {
        operation: Operation,
        status: u16,
        message: Option<String>,
    },

    #[error("{operation:?}: server rejected the request: {message}")]
    Rejected { operation: Operation, message: String },

    #[error("{operation:?}: invalid response: {message}")]
    Decode { operation: Operation, message: String },
}

impl ApiError {
    pub fn operation(&self) -> Operation {
        match self {
            ApiError::Transport { operation, .. }
            | ApiError::Status { operation, .. }
            | ApiError::Rejected { operation, .. }
            | ApiError::Decode { operation, .. } => *operation,
        }
    }

    /// The single human-readable string shown for this failure. Error text
    /// supplied by the server wins over the generic per-operation message.
    pub fn user_message(&self, lang: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(msg), ..
            } if !msg.trim().is_empty() => msg.clone(),
            ApiError::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => i18n::tr(Some(lang), self.operation().message_key(), None),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Error body shape used by the booking API: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// ============================================================================
// Client contract
// ============================================================================

/// Everything the pages need from the remote booking API.
///
/// Implementations perform exactly one request per call: no retries and no
/// caching between calls.
#[async_trait]
pub trait BookingApi: Send + Sync + 'static {
    async fn list_resources(&self) -> ApiResult<Vec<Resource>>;

    async fn create_resource(&self, input: &ResourceInput) -> ApiResult<Option<Resource>>;

    async fn update_resource(&self, id: i64, input: &ResourceInput) -> ApiResult<()>;

    async fn delete_resource(&self, id: i64) -> ApiResult<()>;

    async fn list_bookings(&self) -> ApiResult<Vec<Booking>>;

    /// Returns the created booking when the server echoes it back.
    async fn create_booking(&self, booking: &NewBooking) -> ApiResult<Option<Booking>>;

    async fn update_booking_status(&self, id: i64, status: BookingStatus) -> ApiResult<()>;

    async fn delete_booking(&self, id: i64) -> ApiResult<()>;

    /// Availability of every resource for a window.
    async fn query_availability(&self, window: &TimeWindow) -> ApiResult<Vec<AvailabilityRecord>>;

    /// Server-side conflict check for one resource.
    async fn check_resource_availability(
        &self,
        resource_id: i64,
        window: &TimeWindow,
    ) -> ApiResult<AvailabilityCheckResponse>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpBookingApi {
    client: Client,
    base_url: String,
}

impl HttpBookingApi {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and turn transport failures and non-2xx statuses into `ApiError`.
    async fn send(
        &self,
        operation: Operation,
        request: reqwest::RequestBuilder,
    ) -> ApiResult<reqwest::Response> {
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Booking API {:?} request failed: {}", operation, e);
                return Err(ApiError::Transport {
                    operation,
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&error_text)
            .ok()
            .map(|b| b.error);
        tracing::warn!(
            "Booking API {:?} returned {}: {}",
            operation,
            status,
            error_text
        );

        Err(ApiError::Status {
            operation,
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(
        operation: Operation,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse booking API {:?} response: {}", operation, e);
            ApiError::Decode {
                operation,
                message: e.to_string(),
            }
        })
    }

    /// Parse an optional echo of the created record; bodies in other shapes are ignored.
    async fn optional_json<T: DeserializeOwned>(
        operation: Operation,
        response: reqwest::Response,
    ) -> ApiResult<Option<T>> {
        let text = response.text().await.map_err(|e| ApiError::Decode {
            operation,
            message: e.to_string(),
        })?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<T>(&text) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                tracing::debug!("{:?} response is not a record ({}); ignoring body", operation, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn list_resources(&self) -> ApiResult<Vec<Resource>> {
        let op = Operation::ListResources;
        let response = self.send(op, self.client.get(self.url("/resources"))).await?;
        Self::json(op, response).await
    }

    async fn create_resource(&self, input: &ResourceInput) -> ApiResult<Option<Resource>> {
        let op = Operation::CreateResource;
        let response = self
            .send(op, self.client.post(self.url("/resources")).json(input))
            .await?;
        Self::optional_json(op, response).await
    }

    async fn update_resource(&self, id: i64, input: &ResourceInput) -> ApiResult<()> {
        let request = self
            .client
            .put(self.url(&format!("/resources/{}", id)))
            .json(input);
        self.send(Operation::UpdateResource, request).await?;
        Ok(())
    }

    async fn delete_resource(&self, id: i64) -> ApiResult<()> {
        let request = self.client.delete(self.url(&format!("/resources/{}", id)));
        self.send(Operation::DeleteResource, request).await?;
        Ok(())
    }

    async fn list_bookings(&self) -> ApiResult<Vec<Booking>> {
        let op = Operation::ListBookings;
        let response = self.send(op, self.client.get(self.url("/bookings"))).await?;
        Self::json(op, response).await
    }

    async fn create_booking(&self, booking: &NewBooking) -> ApiResult<Option<Booking>> {
        let op = Operation::CreateBooking;
        let response = self
            .send(op, self.client.post(self.url("/bookings")).json(booking))
            .await?;
        Self::optional_json(op, response).await
    }

    async fn update_booking_status(&self, id: i64, status: BookingStatus) -> ApiResult<()> {
        let request = self
            .client
            .put(self.url(&format!("/bookings/{}", id)))
            .json(&StatusUpdate { status });
        self.send(Operation::UpdateBookingStatus, request).await?;
        Ok(())
    }

    async fn delete_booking(&self, id: i64) -> ApiResult<()> {
        let request = self.client.delete(self.url(&format!("/bookings/{}", id)));
        self.send(Operation::DeleteBooking, request).await?;
        Ok(())
    }

    async fn query_availability(&self, window: &TimeWindow) -> ApiResult<Vec<AvailabilityRecord>> {
        let op = Operation::QueryAvailability;
        let request = self.client.get(self.url("/availability")).query(&[
            ("start", window.start_as(Separator::Input)),
            ("end", window.end_as(Separator::Input)),
        ]);
        let response = self.send(op, request).await?;
        Self::json(op, response).await
    }

    async fn check_resource_availability(
        &self,
        resource_id: i64,
        window: &TimeWindow,
    ) -> ApiResult<AvailabilityCheckResponse> {
        let op = Operation::CheckAvailability;
        let body = AvailabilityCheckRequest {
            resource_id,
            start_time: window.start_as(Separator::Wire),
            end_time: window.end_as(Separator::Wire),
        };
        let response = self
            .send(op, self.client.post(self.url("/availability")).json(&body))
            .await?;
        let parsed: AvailabilityCheckResponse = Self::json(op, response).await?;

        if let Some(message) = parsed.error {
            tracing::warn!("Availability check for resource {} rejected: {}", resource_id, message);
            return Err(ApiError::Rejected {
                operation: op,
                message,
            });
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::validation::WindowForm;
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::{get, post, put},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn serve(api: Router) -> HttpBookingApi {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().nest("/api", api);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        HttpBookingApi::new(&ApiConfig {
            base_url: format!("http://{}/api/", addr),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    fn window() -> TimeWindow {
        WindowForm::new("2024-01-01T10:00", "2024-01-01T12:00")
            .validate()
            .unwrap()
    }

    #[tokio::test]
    async fn lists_resources() {
        let api = serve(Router::new().route(
            "/resources",
            get(|| async {
                Json(json!([
                    {"id": 1, "name": "Room A", "type": "Room", "capacity": 10, "location": "Floor 1"},
                    {"id": 2, "name": "Projector", "type": "Equipment"}
                ]))
            }),
        ))
        .await;

        let resources = api.list_resources().await.unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].name, "Room A");
        assert_eq!(resources[0].location.as_deref(), Some("Floor 1"));
        assert_eq!(resources[1].capacity, 0);
        assert_eq!(resources[1].description, None);
    }

    #[tokio::test]
    async fn create_booking_surfaces_server_error_text() {
        let api = serve(Router::new().route(
            "/bookings",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["startTime"], "2024-01-01 10:00");
                (
                    StatusCode::CONFLICT,
                    Json(json!({"error": "Resource is not available for the selected dates"})),
                )
            }),
        ))
        .await;

        let booking = NewBooking {
            resource_id: 1,
            user_id: "alice".into(),
            start_time: window().start(),
            end_time: window().end(),
            status: BookingStatus::Confirmed,
        };
        let err = api.create_booking(&booking).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 409, .. }));
        assert_eq!(
            err.user_message("en"),
            "Resource is not available for the selected dates"
        );
    }

    #[tokio::test]
    async fn create_booking_tolerates_message_only_bodies() {
        let api = serve(Router::new().route(
            "/bookings",
            post(|| async {
                (
                    StatusCode::CREATED,
                    Json(json!({"status": 201, "message": "Booking created successfully"})),
                )
            }),
        ))
        .await;

        let booking = NewBooking {
            resource_id: 1,
            user_id: "alice".into(),
            start_time: window().start(),
            end_time: window().end(),
            status: BookingStatus::Confirmed,
        };
        assert_eq!(api.create_booking(&booking).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_unknown_booking_gives_generic_message() {
        let api = serve(Router::new().route(
            "/bookings/:id",
            axum::routing::delete(|Path(id): Path<i64>| async move {
                assert_eq!(id, 99);
                StatusCode::NOT_FOUND
            }),
        ))
        .await;

        let err = api.delete_booking(99).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, message: None, .. }));
        assert_eq!(err.user_message("en"), "Failed to delete booking");
    }

    #[tokio::test]
    async fn status_update_sends_status_body() {
        let api = serve(Router::new().route(
            "/bookings/:id",
            put(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
                assert_eq!(id, 5);
                assert_eq!(body, json!({"status": "CANCELLED"}));
                StatusCode::NO_CONTENT
            }),
        ))
        .await;

        tokio_test::assert_ok!(api.update_booking_status(5, BookingStatus::Cancelled).await);
    }

    #[tokio::test]
    async fn availability_query_uses_input_format() {
        let api = serve(Router::new().route(
            "/availability",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("start").map(String::as_str), Some("2024-01-01T10:00"));
                assert_eq!(q.get("end").map(String::as_str), Some("2024-01-01T12:00"));
                Json(json!([{"resourceId": 1, "isAvailable": true}]))
            }),
        ))
        .await;

        let records = api.query_availability(&window()).await.unwrap();
        assert_eq!(
            records,
            vec![AvailabilityRecord {
                resource_id: 1,
                is_available: true
            }]
        );
    }

    #[tokio::test]
    async fn availability_check_error_body_is_rejection() {
        let api = serve(Router::new().route(
            "/availability",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["resourceId"], 3);
                assert_eq!(body["endTime"], "2024-01-01 12:00");
                Json(json!({"error": "Missing or invalid parameters"}))
            }),
        ))
        .await;

        let err = api
            .check_resource_availability(3, &window())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected { .. }));
        assert_eq!(err.user_message("en"), "Missing or invalid parameters");
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpBookingApi::new(&ApiConfig {
            base_url: format!("http://{}/api", addr),
            timeout_seconds: 2,
        })
        .unwrap();

        let err = api.list_bookings().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
        assert_eq!(err.user_message("en"), "Failed to load bookings");
    }

    #[tokio::test]
    async fn malformed_list_is_decode_error() {
        let api = serve(Router::new().route(
            "/bookings",
            get(|| async { Json(json!({"unexpected": true})) }),
        ))
        .await;

        let err = api.list_bookings().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
