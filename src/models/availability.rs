use serde::{Deserialize, Serialize};

use crate::models::Resource;

/// One entry of `GET /availability?start=&end=`. Scoped to the queried window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRecord {
    pub resource_id: i64,
    pub is_available: bool,
}

/// A resource joined with its availability for the selected window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedResource {
    #[serde(flatten)]
    pub resource: Resource,
    pub is_available: bool,
}

/// Body for `POST /availability`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCheckRequest {
    pub resource_id: i64,
    pub start_time: String,
    pub end_time: String,
}

/// Only the fields the server verdict depends on; the rest of each annotated
/// resource is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityVerdict {
    pub id: i64,
    #[serde(default)]
    pub is_available: bool,
}

/// Response of `POST /availability`: either the annotated resources or an error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCheckResponse {
    #[serde(default)]
    pub available_resources: Vec<AvailabilityVerdict>,
    #[serde(default)]
    pub error: Option<String>,
}
