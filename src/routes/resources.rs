use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};

use crate::error::AppResult;
use crate::routes::{page_context, PageResponse};
use crate::services::notify::CollectingSink;
use crate::services::pages::ResourcesPage;
use crate::services::render::ResourceView;
use crate::services::validation::ResourceForm;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list))
}

/// Page actions; rate limited by the caller.
pub fn actions() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create))
        .route("/:id", put(update).delete(remove))
}

async fn list(State(state): State<Arc<AppState>>) -> Json<PageResponse<ResourceView>> {
    let sink = CollectingSink::new();
    let mut page = ResourcesPage::new(page_context(&state, &sink));
    page.load().await;
    PageResponse::json(page.view(), &sink)
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ResourceForm>,
) -> AppResult<Json<PageResponse<ResourceView>>> {
    let sink = CollectingSink::new();
    let mut page = ResourcesPage::new(page_context(&state, &sink));
    page.save(&form, None).await?;
    Ok(PageResponse::json(page.view(), &sink))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(form): Json<ResourceForm>,
) -> AppResult<Json<PageResponse<ResourceView>>> {
    let sink = CollectingSink::new();
    let mut page = ResourcesPage::new(page_context(&state, &sink));
    page.save(&form, Some(id)).await?;
    Ok(PageResponse::json(page.view(), &sink))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<PageResponse<ResourceView>>> {
    let sink = CollectingSink::new();
    let mut page = ResourcesPage::new(page_context(&state, &sink));
    page.delete(id).await?;
    Ok(PageResponse::json(page.view(), &sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::{empty_request, json_request, send, state};
    use crate::services::api::Operation;
    use crate::services::pages::testing::{resource, FakeApi};
    use axum::http::StatusCode;
    use serde_json::json;

    fn app(api: Arc<FakeApi>) -> Router {
        router().merge(actions()).with_state(state(api))
    }

    #[tokio::test]
    async fn list_keeps_server_order() {
        let api = Arc::new(FakeApi::with_resources(vec![
            resource(5, "Zeta", "Room"),
            resource(1, "Alpha", "Desk"),
        ]));
        let (_, body) = send(app(api), empty_request("GET", "/")).await;
        assert_eq!(body["view"]["rows"][0]["id"], 5);
        assert_eq!(body["view"]["rows"][1]["typeClass"], "desk");
        assert_eq!(body["view"]["summary"]["totalResources"], 2);
    }

    #[tokio::test]
    async fn failed_list_degrades_to_empty() {
        let api = Arc::new(FakeApi::default());
        api.fail(Operation::ListResources);
        let (response, body) = send(app(api), empty_request("GET", "/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["view"]["rows"], json!([]));
        assert_eq!(body["notifications"][0]["level"], "error");
        assert_eq!(body["notifications"][0]["message"], "Failed to load resources");
    }

    #[tokio::test]
    async fn create_and_update() {
        let api = Arc::new(FakeApi::with_resources(vec![resource(1, "Room A", "Room")]));
        let form = json!({"name": "Projector", "type": "Equipment", "capacity": 0});

        let (response, body) = send(app(api.clone()), json_request("POST", "/", form.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["view"]["summary"]["totalResources"], 2);

        let (_, body) = send(app(api.clone()), json_request("PUT", "/1", form)).await;
        assert_eq!(body["view"]["rows"][0]["name"], "Projector");
        assert_eq!(body["notifications"][0]["message"], "Resource updated successfully");
    }

    #[tokio::test]
    async fn missing_name_is_rejected_locally() {
        let api = Arc::new(FakeApi::default());
        let form = json!({"type": "Room", "capacity": "4"});
        let (response, _) = send(app(api.clone()), json_request("POST", "/", form)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_failure_is_upstream_error() {
        let api = Arc::new(FakeApi::with_resources(vec![resource(1, "Room A", "Room")]));
        api.fail(Operation::DeleteResource);
        let (response, body) = send(app(api), empty_request("DELETE", "/1")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["message"], "Failed to delete resource");
    }
}
