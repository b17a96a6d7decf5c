use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::error::AppResult;
use crate::routes::{local_now, page_context, PageResponse};
use crate::services::handoff::{self, HandoffQuery};
use crate::services::notify::CollectingSink;
use crate::services::pages::{
    AvailabilityStatus, BookingsPage, BookingsPageView, DefaultWindow, PrefillView,
};
use crate::services::validation::BookingForm;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}

/// Page actions; rate limited by the caller.
pub fn actions() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create))
        .route("/check", post(check))
        .route("/:id/cancel", post(cancel))
        .route("/:id", delete(remove))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexView {
    #[serde(flatten)]
    page: BookingsPageView,
    prefill: Option<PrefillView>,
    default_window: DefaultWindow,
}

/// Bookings page. Consumes a pending hand-off from the availability page.
async fn index(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<HandoffQuery>,
) -> (CookieJar, Json<PageResponse<IndexView>>) {
    let (jar, pending) = handoff::take(jar);
    let sink = CollectingSink::new();
    let mut page = BookingsPage::new(page_context(&state, &sink));

    page.load().await;
    let prefill = page.prefill(&query, pending.as_ref()).await;

    let view = IndexView {
        page: page.view(),
        prefill,
        default_window: page.default_window(local_now()),
    };
    (jar, PageResponse::json(view, &sink))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(form): Json<BookingForm>,
) -> AppResult<Json<PageResponse<BookingsPageView>>> {
    let sink = CollectingSink::new();
    let mut page = BookingsPage::new(page_context(&state, &sink));
    page.submit(&form).await?;
    Ok(PageResponse::json(page.view(), &sink))
}

async fn check(
    State(state): State<Arc<AppState>>,
    Json(form): Json<BookingForm>,
) -> AppResult<Json<PageResponse<AvailabilityStatus>>> {
    let sink = CollectingSink::new();
    let page = BookingsPage::new(page_context(&state, &sink));
    let status = page.check(&form).await?;
    Ok(PageResponse::json(status, &sink))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<PageResponse<BookingsPageView>>> {
    let sink = CollectingSink::new();
    let mut page = BookingsPage::new(page_context(&state, &sink));
    page.cancel(id).await?;
    Ok(PageResponse::json(page.view(), &sink))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<PageResponse<BookingsPageView>>> {
    let sink = CollectingSink::new();
    let mut page = BookingsPage::new(page_context(&state, &sink));
    page.delete(id).await?;
    Ok(PageResponse::json(page.view(), &sink))
}
