use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::routes::{local_now, page_context, PageResponse};
use crate::services::handoff;
use crate::services::notify::CollectingSink;
use crate::services::pages::{AvailabilityPage, DefaultWindow};
use crate::services::render::AvailabilityView;
use crate::services::validation::WindowForm;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}

/// Page actions; rate limited by the caller.
pub fn actions() -> Router<Arc<AppState>> {
    Router::new()
        .route("/check", post(check))
        .route("/clear", post(clear))
        .route("/book", post(book))
        .route("/conflicts", post(conflicts))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexView {
    types: Vec<String>,
    default_window: DefaultWindow,
    results: AvailabilityView,
}

/// Availability page. Issues the session cookie up front so the first
/// checks of a browser already share one in-flight slot.
async fn index(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<PageResponse<IndexView>>) {
    let (jar, _) = handoff::ensure_session(jar, &state.cookies);
    let sink = CollectingSink::new();
    let mut page = AvailabilityPage::new(page_context(&state, &sink));
    page.load_resources().await;

    let view = IndexView {
        types: page.type_options(),
        default_window: page.default_window(local_now()),
        results: page.view(),
    };
    (jar, PageResponse::json(view, &sink))
}

#[derive(Debug, Deserialize)]
struct CheckRequest {
    start: Option<String>,
    end: Option<String>,
    #[serde(rename = "type")]
    resource_type: Option<String>,
}

async fn check(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<CheckRequest>,
) -> AppResult<(CookieJar, Json<PageResponse<AvailabilityView>>)> {
    let (jar, session) = handoff::ensure_session(jar, &state.cookies);
    let sink = CollectingSink::new();
    let mut page = AvailabilityPage::new(page_context(&state, &sink));

    let form = WindowForm {
        start: body.start,
        end: body.end,
    };
    page.check(&form, &state.in_flight, &session).await?;
    let view = page.filter(body.resource_type.as_deref());

    Ok((jar, PageResponse::json(view, &sink)))
}

/// Form state after a reset: the default window and no type filter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearedView {
    start: String,
    end: String,
    #[serde(rename = "type")]
    resource_type: Option<String>,
    results: AvailabilityView,
}

async fn clear(State(state): State<Arc<AppState>>) -> Json<PageResponse<ClearedView>> {
    let sink = CollectingSink::new();
    let mut page = AvailabilityPage::new(page_context(&state, &sink));
    let results = page.clear();
    let window = page.default_window(local_now());

    let view = ClearedView {
        start: window.start,
        end: window.end,
        resource_type: None,
        results,
    };
    PageResponse::json(view, &sink)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionRequest {
    resource_id: Option<i64>,
    start: Option<String>,
    end: Option<String>,
}

impl SelectionRequest {
    fn resource_id(&self) -> AppResult<i64> {
        self.resource_id
            .ok_or_else(|| AppError::BadRequest("resourceId is required".to_string()))
    }

    fn window(&self) -> WindowForm {
        WindowForm {
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RedirectView {
    redirect: String,
}

async fn book(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SelectionRequest>,
) -> AppResult<(CookieJar, Json<PageResponse<RedirectView>>)> {
    let resource_id = body.resource_id()?;
    let sink = CollectingSink::new();
    let mut page = AvailabilityPage::new(page_context(&state, &sink));

    let pending = page.book(resource_id, &body.window()).await?;
    let jar = handoff::store(jar, &pending, &state.cookies);

    let view = RedirectView {
        redirect: pending.booking_url(),
    };
    Ok((jar, PageResponse::json(view, &sink)))
}

#[derive(Debug, Serialize)]
struct ConflictView {
    message: String,
}

async fn conflicts(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionRequest>,
) -> AppResult<Json<PageResponse<ConflictView>>> {
    let resource_id = body.resource_id()?;
    let sink = CollectingSink::new();
    let mut page = AvailabilityPage::new(page_context(&state, &sink));

    let message = page.view_conflicts(resource_id, &body.window()).await?;
    Ok(PageResponse::json(ConflictView { message }, &sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AvailabilityRecord;
    use crate::routes::testing::{empty_request, json_request, send, state};
    use crate::services::handoff::{PENDING_BOOKING_COOKIE, SESSION_COOKIE};
    use crate::services::pages::testing::{resource, FakeApi};
    use crate::services::timefmt;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;

    fn app(api: Arc<FakeApi>) -> Router {
        router().merge(actions()).with_state(state(api))
    }

    #[tokio::test]
    async fn index_lists_types_and_default_window() {
        let api = Arc::new(FakeApi::with_resources(vec![
            resource(1, "Room A", "Room"),
            resource(2, "Cam", "Equipment"),
        ]));
        let (response, body) = send(app(api), empty_request("GET", "/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["view"]["types"], json!(["Room", "Equipment"]));
        assert!(body["view"]["defaultWindow"]["start"].is_string());
        assert_eq!(body["view"]["results"]["summary"]["totalCount"], 0);
    }

    #[tokio::test]
    async fn check_returns_rows_and_issues_session_cookie() {
        let api = Arc::new(FakeApi::with_resources(vec![
            resource(1, "Room A", "Room"),
            resource(2, "Cam", "Equipment"),
        ]));
        api.records.lock().unwrap().push(AvailabilityRecord {
            resource_id: 1,
            is_available: true,
        });

        let request = json_request(
            "POST",
            "/check",
            json!({"start": "2024-01-01T10:00", "end": "2024-01-01T12:00", "type": "Room"}),
        );
        let (response, body) = send(app(api), request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(SESSION_COOKIE));
        assert_eq!(body["view"]["summary"]["totalCount"], 1);
        assert_eq!(body["view"]["rows"][0]["action"], "book");
        assert_eq!(body["notifications"][0]["level"], "success");
    }

    #[tokio::test]
    async fn reversed_window_is_422_without_api_calls() {
        let api = Arc::new(FakeApi::default());
        let request = json_request(
            "POST",
            "/check",
            json!({"start": "2024-01-01T10:00", "end": "2024-01-01T09:00"}),
        );
        let (response, body) = send(app(api.clone()), request).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn book_sets_handoff_cookie_and_redirect() {
        let api = Arc::new(FakeApi::with_resources(vec![resource(1, "Room A", "Room")]));
        let request = json_request(
            "POST",
            "/book",
            json!({"resourceId": 1, "start": "2024-01-01T10:00", "end": "2024-01-01T12:00"}),
        );
        let (response, body) = send(app(api), request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body["view"]["redirect"],
            "/bookings?resourceId=1&startTime=2024-01-01T10%3A00&endTime=2024-01-01T12%3A00"
        );
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(PENDING_BOOKING_COOKIE));
        assert!(!cookie.contains("Max-Age"));
    }

    #[tokio::test]
    async fn book_without_resource_is_bad_request() {
        let api = Arc::new(FakeApi::default());
        let request = json_request(
            "POST",
            "/book",
            json!({"start": "2024-01-01T10:00", "end": "2024-01-01T12:00"}),
        );
        let (response, _) = send(app(api), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn conflicts_describe_the_window() {
        let api = Arc::new(FakeApi::with_resources(vec![resource(1, "Room A", "Room")]));
        let request = json_request(
            "POST",
            "/conflicts",
            json!({"resourceId": 1, "start": "2024-01-01T10:00", "end": "2024-01-01T12:00"}),
        );
        let (_, body) = send(app(api), request).await;
        assert!(body["view"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Resource \"Room A\" is unavailable during"));
    }

    #[tokio::test]
    async fn clear_resets_form_to_default_window() {
        let api = Arc::new(FakeApi::default());
        let (_, body) = send(app(api.clone()), empty_request("POST", "/clear")).await;

        let view = &body["view"];
        assert_eq!(view["results"]["rows"], json!([]));
        assert_eq!(view["results"]["summary"]["totalCount"], 0);
        assert!(view["type"].is_null());

        let start = timefmt::parse(view["start"].as_str().unwrap()).unwrap();
        let end = timefmt::parse(view["end"].as_str().unwrap()).unwrap();
        assert_eq!((end - start).num_minutes(), 120);
        assert!(start > local_now());

        assert_eq!(body["notifications"][0]["level"], "info");
        assert_eq!(body["notifications"][0]["message"], "Results cleared");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn index_issues_session_cookie_once() {
        let api = Arc::new(FakeApi::default());
        let (response, _) = send(app(api.clone()), empty_request("GET", "/")).await;
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(SESSION_COOKIE));

        let request = Request::builder()
            .method("GET")
            .uri("/")
            .header(header::COOKIE, format!("{}=existing", SESSION_COOKIE))
            .body(Body::empty())
            .unwrap();
        let (response, _) = send(app(api), request).await;
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
