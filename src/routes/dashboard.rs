use std::sync::Arc;

use axum::{extract::State, Json};

use crate::routes::{page_context, PageResponse};
use crate::services::notify::CollectingSink;
use crate::services::pages::DashboardPage;
use crate::services::render::DashboardView;
use crate::AppState;

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<PageResponse<DashboardView>> {
    let sink = CollectingSink::new();
    let view = DashboardPage::new(page_context(&state, &sink)).load().await;
    PageResponse::json(view, &sink)
}
