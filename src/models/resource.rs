use serde::{Deserialize, Serialize};

/// A bookable entity (room, equipment, ...) as returned by `GET /resources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: i64,
    pub name: String,

    /// Open set of values ("Room", "Equipment", ...). Some deployments omit it.
    #[serde(rename = "type", default)]
    pub resource_type: Option<String>,

    /// Listing endpoints that do not select the column report no capacity; treated as 0.
    #[serde(default)]
    pub capacity: i64,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Body for `POST /resources` and `PUT /resources/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInput {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub capacity: i64,
    pub location: Option<String>,
    pub description: Option<String>,
}
