//! View models for the four pages.
//!
//! Every function here is pure: inputs are borrowed and never modified, and
//! the same input always yields the same rows in the same order. Summary
//! counters are computed from the rows that were actually produced.

use serde::Serialize;

use crate::i18n;
use crate::models::{AnnotatedResource, Booking, BookingStatus, Resource};
use crate::services::timefmt::{self, Separator};

// ============================================================================
// Availability page
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Book,
    ViewDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRow {
    pub id: i64,
    pub name: String,
    pub type_label: String,
    pub type_class: String,
    pub capacity_label: String,
    pub location_label: String,
    pub is_available: bool,
    pub status_label: String,
    pub status_class: &'static str,
    pub action: RowAction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySummary {
    pub available_count: usize,
    pub unavailable_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityView {
    pub rows: Vec<AvailabilityRow>,
    pub summary: AvailabilitySummary,
}

fn type_label(resource: &Resource, lang: &str) -> String {
    match resource.resource_type.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => i18n::tr(Some(lang), "render.type_other", None),
    }
}

fn type_class(resource: &Resource) -> String {
    match resource.resource_type.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_lowercase(),
        _ => "other".to_string(),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Rows for the availability table, optionally restricted to one resource type.
/// An empty filter shows everything.
pub fn availability_view(
    results: &[AnnotatedResource],
    type_filter: Option<&str>,
    lang: &str,
) -> AvailabilityView {
    let type_filter = type_filter.map(str::trim).filter(|t| !t.is_empty());

    let rows: Vec<AvailabilityRow> = results
        .iter()
        .filter(|r| match type_filter {
            Some(t) => non_blank(&r.resource.resource_type) == Some(t),
            None => true,
        })
        .map(|r| {
            let resource = &r.resource;
            AvailabilityRow {
                id: resource.id,
                name: resource.name.clone(),
                type_label: type_label(resource, lang),
                type_class: type_class(resource),
                capacity_label: if resource.capacity > 0 {
                    resource.capacity.to_string()
                } else {
                    i18n::tr(Some(lang), "render.not_applicable", None)
                },
                location_label: non_blank(&resource.location)
                    .map(str::to_string)
                    .unwrap_or_else(|| i18n::tr(Some(lang), "render.location_unspecified", None)),
                is_available: r.is_available,
                status_label: if r.is_available {
                    i18n::tr(Some(lang), "render.available", None)
                } else {
                    i18n::tr(Some(lang), "render.unavailable", None)
                },
                status_class: if r.is_available {
                    "available"
                } else {
                    "unavailable"
                },
                action: if r.is_available {
                    RowAction::Book
                } else {
                    RowAction::ViewDetails
                },
            }
        })
        .collect();

    let available_count = rows.iter().filter(|r| r.is_available).count();
    let summary = AvailabilitySummary {
        available_count,
        unavailable_count: rows.len() - available_count,
        total_count: rows.len(),
    };

    AvailabilityView { rows, summary }
}

/// Distinct resource types in first-seen order, for the type filter.
pub fn type_options(resources: &[Resource]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in resources.iter().filter_map(|r| non_blank(&r.resource_type)) {
        if !out.iter().any(|seen| seen == t) {
            out.push(t.to_string());
        }
    }
    out
}

// ============================================================================
// Bookings page
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRow {
    pub id: i64,
    pub resource_id: i64,
    pub resource_name: String,
    pub user_id: String,
    /// Input-format timestamps (`YYYY-MM-DDTHH:MM`) for editing controls.
    pub start_time: String,
    pub end_time: String,
    pub start_display: String,
    pub end_display: String,
    pub status: String,
    pub status_class: String,
    pub can_cancel: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub total: usize,
    pub confirmed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub rows: Vec<BookingRow>,
    pub summary: BookingSummary,
}

/// Option shown in the booking form's resource selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOption {
    pub id: i64,
    pub label: String,
}

/// Booking rows, newest start time first. Ties keep server order.
pub fn booking_view(bookings: &[Booking], resources: &[Resource], lang: &str) -> BookingView {
    let mut sorted: Vec<&Booking> = bookings.iter().collect();
    sorted.sort_by(|a, b| b.start_time.cmp(&a.start_time));

    let rows: Vec<BookingRow> = sorted
        .into_iter()
        .map(|b| {
            let resource_name = resources
                .iter()
                .find(|r| r.id == b.resource_id)
                .map(|r| r.name.clone())
                .unwrap_or_else(|| {
                    i18n::tr(
                        Some(lang),
                        "render.resource_fallback",
                        Some(&[("id", &b.resource_id.to_string())]),
                    )
                });

            BookingRow {
                id: b.id,
                resource_id: b.resource_id,
                resource_name,
                user_id: b.user_id.clone(),
                start_time: timefmt::format(&b.start_time, Separator::Input),
                end_time: timefmt::format(&b.end_time, Separator::Input),
                start_display: timefmt::display(&b.start_time),
                end_display: timefmt::display(&b.end_time),
                status: b.status.to_string(),
                status_class: b.status.as_str().to_lowercase(),
                can_cancel: b.status == BookingStatus::Confirmed,
            }
        })
        .collect();

    let summary = BookingSummary {
        total: rows.len(),
        confirmed: rows.iter().filter(|r| r.status == "CONFIRMED").count(),
        cancelled: rows.iter().filter(|r| r.status == "CANCELLED").count(),
    };

    BookingView { rows, summary }
}

/// Selector entries such as `Room A (Room) - Floor 1`, in server order.
pub fn resource_options(resources: &[Resource], lang: &str) -> Vec<ResourceOption> {
    resources
        .iter()
        .map(|r| {
            let mut label = format!("{} ({})", r.name, type_label(r, lang));
            if let Some(location) = non_blank(&r.location) {
                label.push_str(" - ");
                label.push_str(location);
            }
            ResourceOption { id: r.id, label }
        })
        .collect()
}

// ============================================================================
// Resources page
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRow {
    pub id: i64,
    pub name: String,
    pub type_label: String,
    pub type_class: String,
    pub capacity: i64,
    pub location_label: String,
    pub description_label: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub total_resources: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    pub rows: Vec<ResourceRow>,
    pub summary: ResourceSummary,
}

/// Resource rows in the order the server returned them.
pub fn resource_view(resources: &[Resource], lang: &str) -> ResourceView {
    let rows: Vec<ResourceRow> = resources
        .iter()
        .map(|r| ResourceRow {
            id: r.id,
            name: r.name.clone(),
            type_label: type_label(r, lang),
            type_class: type_class(r),
            capacity: r.capacity,
            location_label: non_blank(&r.location).unwrap_or("-").to_string(),
            description_label: non_blank(&r.description).unwrap_or("-").to_string(),
        })
        .collect();

    let summary = ResourceSummary {
        total_resources: rows.len(),
    };
    ResourceView { rows, summary }
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub resources_count: Option<usize>,
    pub bookings_count: Option<usize>,
    pub resources_label: String,
    pub bookings_label: String,
}

/// `None` marks a list that failed to load.
pub fn dashboard_view(resources: Option<usize>, bookings: Option<usize>, lang: &str) -> DashboardView {
    let resources_label = match resources {
        Some(n) => i18n::tr(
            Some(lang),
            "dashboard.resources_count",
            Some(&[("count", &n.to_string())]),
        ),
        None => i18n::tr(Some(lang), "dashboard.resources_error", None),
    };
    let bookings_label = match bookings {
        Some(n) => i18n::tr(
            Some(lang),
            "dashboard.bookings_count",
            Some(&[("count", &n.to_string())]),
        ),
        None => i18n::tr(Some(lang), "dashboard.bookings_error", None),
    };

    DashboardView {
        resources_count: resources,
        bookings_count: bookings,
        resources_label,
        bookings_label,
    }
}
