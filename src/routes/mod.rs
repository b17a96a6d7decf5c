use axum::Json;
use serde::Serialize;

use crate::services::notify::{CollectingSink, Notification};
use crate::services::pages::PageContext;
use crate::AppState;

pub mod availability;
pub mod bookings;
pub mod dashboard;
pub mod health;
pub mod resources;

/// Body of every page endpoint: the rendered view plus whatever the page
/// controller told the user while producing it.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub view: T,
    pub notifications: Vec<Notification>,
}

impl<T: Serialize> PageResponse<T> {
    pub fn json(view: T, sink: &CollectingSink) -> Json<Self> {
        Json(PageResponse {
            view,
            notifications: sink.take(),
        })
    }
}

pub fn page_context<'a>(state: &'a AppState, sink: &'a CollectingSink) -> PageContext<'a> {
    PageContext {
        api: state.api.as_ref(),
        notify: sink,
        ui: &state.config.ui,
    }
}

/// Wall-clock time in the server's zone, for default form windows.
pub fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}
