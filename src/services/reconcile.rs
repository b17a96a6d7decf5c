//! Joins fetched resources with availability results.
//!
//! Conflict detection itself stays on the server: nothing here compares
//! intervals, it only reads verdicts the booking API already computed.

use std::collections::HashMap;

use crate::models::{AnnotatedResource, AvailabilityCheckResponse, AvailabilityRecord, Resource};

/// Annotate each resource with its availability for the queried window.
///
/// A resource is available iff at least one record with its id says so; a
/// resource without any record is unavailable. Resource order is preserved.
pub fn annotate(resources: &[Resource], records: &[AvailabilityRecord]) -> Vec<AnnotatedResource> {
    let mut available: HashMap<i64, bool> = HashMap::with_capacity(records.len());
    for record in records {
        let entry = available.entry(record.resource_id).or_insert(false);
        *entry |= record.is_available;
    }

    resources
        .iter()
        .map(|resource| AnnotatedResource {
            resource: resource.clone(),
            is_available: available.get(&resource.id).copied().unwrap_or(false),
        })
        .collect()
}

/// Read the server's verdict for one resource from a `POST /availability` answer.
pub fn verdict_for(response: &AvailabilityCheckResponse, resource_id: i64) -> bool {
    response
        .available_resources
        .iter()
        .any(|r| r.id == resource_id && r.is_available)
}
