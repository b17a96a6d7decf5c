//! Page controllers.
//!
//! One controller per page owns that page's state (the cached lists and the
//! current results) and gets the booking API, the notification sink and the
//! UI settings injected through a [`PageContext`]. Lists are always replaced
//! wholesale from the server; nothing is patched locally after a write.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::UiConfig;
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::models::{AnnotatedResource, Booking, BookingStatus, Resource};
use crate::services::api::BookingApi;
use crate::services::handoff::{self, HandoffQuery, PendingBooking, Prefill};
use crate::services::notify::NotificationSink;
use crate::services::reconcile;
use crate::services::render::{
    self, AvailabilityView, BookingView, DashboardView, ResourceOption, ResourceView,
};
use crate::services::timefmt::{self, Separator};
use crate::services::validation::{BookingForm, Field, ResourceForm, ValidationError, WindowForm};

/// Collaborators shared by every page controller.
#[derive(Clone, Copy)]
pub struct PageContext<'a> {
    pub api: &'a dyn BookingApi,
    pub notify: &'a dyn NotificationSink,
    pub ui: &'a UiConfig,
}

impl<'a> PageContext<'a> {
    fn lang(&self) -> &'a str {
        &self.ui.lang
    }

    fn tr(&self, key: &str) -> String {
        i18n::tr(Some(self.lang()), key, None)
    }

    fn tr_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        i18n::tr(Some(self.lang()), key, Some(params))
    }
}

/// Pre-filled start/end values in input format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultWindow {
    pub start: String,
    pub end: String,
}

impl DefaultWindow {
    fn new(now: NaiveDateTime, lead_minutes: i64, span_minutes: i64) -> Self {
        let (start, end) = timefmt::default_window(now, lead_minutes, span_minutes);
        Self {
            start: timefmt::format(&start, Separator::Input),
            end: timefmt::format(&end, Separator::Input),
        }
    }
}

// ============================================================================
// In-flight guard
// ============================================================================

/// Sessions that currently have an availability check running.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `session`. `None` if a check is already running.
    pub fn try_acquire(&self, session: &str) -> Option<InFlightGuard> {
        let mut active = match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !active.insert(session.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            active: self.active.clone(),
            session: session.to_string(),
        })
    }
}

/// Releases the session's slot when dropped, whatever the outcome of the check.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<String>>>,
    session: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut active = match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        active.remove(&self.session);
    }
}

// ============================================================================
// Availability page
// ============================================================================

pub struct AvailabilityPage<'a> {
    ctx: PageContext<'a>,
    resources: Vec<Resource>,
    results: Vec<AnnotatedResource>,
    type_filter: Option<String>,
}

impl<'a> AvailabilityPage<'a> {
    pub fn new(ctx: PageContext<'a>) -> Self {
        Self {
            ctx,
            resources: Vec::new(),
            results: Vec::new(),
            type_filter: None,
        }
    }

    /// Fetch the resource list. On failure the list stays empty and the user is told.
    pub async fn load_resources(&mut self) {
        match self.ctx.api.list_resources().await {
            Ok(resources) => self.resources = resources,
            Err(e) => {
                tracing::warn!("Availability page could not load resources: {}", e);
                self.resources = Vec::new();
                self.ctx.notify.error(self.ctx.tr("availability.load_resources_failed"));
            }
        }
    }

    pub fn type_options(&self) -> Vec<String> {
        render::type_options(&self.resources)
    }

    /// Ask the server which resources are free in the window.
    ///
    /// Invalid windows are rejected before any request is made. Only one
    /// check per session runs at a time.
    pub async fn check(
        &mut self,
        form: &WindowForm,
        in_flight: &InFlight,
        session: &str,
    ) -> AppResult<AvailabilityView> {
        let window = form
            .validate()
            .map_err(|e| AppError::invalid(e, self.ctx.lang()))?;

        let _guard = in_flight
            .try_acquire(session)
            .ok_or_else(|| AppError::Conflict(self.ctx.tr("availability.in_progress")))?;

        tracing::debug!(
            "Checking availability {} - {}",
            window.start_as(Separator::Input),
            window.end_as(Separator::Input)
        );

        let (resources, records) = tokio::join!(
            self.ctx.api.list_resources(),
            self.ctx.api.query_availability(&window)
        );

        match (resources, records) {
            (Ok(resources), Ok(records)) => {
                self.results = reconcile::annotate(&resources, &records);
                self.resources = resources;
                self.ctx.notify.success(self.ctx.tr("availability.check_completed"));
            }
            (resources, records) => {
                if let Err(e) = resources {
                    tracing::warn!("Availability check could not load resources: {}", e);
                }
                if let Err(e) = records {
                    tracing::warn!("Availability query failed: {}", e);
                }
                self.results = Vec::new();
                self.ctx.notify.error(self.ctx.tr("availability.check_failed"));
            }
        }

        Ok(self.view())
    }

    /// Restrict the rows to one resource type. Blank shows everything.
    pub fn filter(&mut self, resource_type: Option<&str>) -> AvailabilityView {
        self.type_filter = resource_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self.view()
    }

    pub fn clear(&mut self) -> AvailabilityView {
        self.results.clear();
        self.type_filter = None;
        self.ctx.notify.info(self.ctx.tr("availability.results_cleared"));
        self.view()
    }

    pub fn view(&self) -> AvailabilityView {
        render::availability_view(&self.results, self.type_filter.as_deref(), self.ctx.lang())
    }

    /// Look a resource up, refreshing the list once if it is not cached.
    async fn find_resource(&mut self, resource_id: i64) -> Option<Resource> {
        if !self.resources.iter().any(|r| r.id == resource_id) {
            self.load_resources().await;
        }
        self.resources.iter().find(|r| r.id == resource_id).cloned()
    }

    /// Start the hand-off to the bookings page for a resource and window.
    pub async fn book(&mut self, resource_id: i64, form: &WindowForm) -> AppResult<PendingBooking> {
        let lang = self.ctx.lang();
        let window = form.validate().map_err(|e| AppError::invalid(e, lang))?;

        let pending = match self.find_resource(resource_id).await {
            Some(resource) => PendingBooking::new(&resource, &window),
            None => return Err(AppError::NotFound(self.ctx.tr("not_found.resource"))),
        };

        self.ctx.notify.info(
            self.ctx
                .tr_with("availability.redirecting", &[("name", &pending.resource_name)]),
        );
        Ok(pending)
    }

    /// Explain why an unavailable resource cannot be booked.
    pub async fn view_conflicts(&mut self, resource_id: i64, form: &WindowForm) -> AppResult<String> {
        let lang = self.ctx.lang();
        let window = form.validate().map_err(|e| AppError::invalid(e, lang))?;

        let name = match self.find_resource(resource_id).await {
            Some(resource) => resource.name,
            None => self
                .ctx
                .tr_with("render.resource_fallback", &[("id", &resource_id.to_string())]),
        };

        let message = self.ctx.tr_with(
            "availability.unavailable_during",
            &[
                ("name", &name),
                ("start", &timefmt::display_short(&window.start())),
                ("end", &timefmt::display_short(&window.end())),
            ],
        );
        self.ctx.notify.error(message.clone());
        Ok(message)
    }

    pub fn default_window(&self, now: NaiveDateTime) -> DefaultWindow {
        DefaultWindow::new(
            now,
            self.ctx.ui.availability_lead_minutes,
            self.ctx.ui.availability_span_minutes,
        )
    }
}

// ============================================================================
// Bookings page
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityState {
    Available,
    Unavailable,
}

/// Result of the per-resource check shown next to the booking form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityStatus {
    pub state: AvailabilityState,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingsPageView {
    pub bookings: BookingView,
    pub resources: Vec<ResourceOption>,
}

/// Form pre-population produced by the hand-off, plus a fresh server verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefillView {
    #[serde(flatten)]
    pub prefill: Prefill,
    pub availability: Option<AvailabilityStatus>,
}

pub struct BookingsPage<'a> {
    ctx: PageContext<'a>,
    resources: Vec<Resource>,
    bookings: Vec<Booking>,
}

impl<'a> BookingsPage<'a> {
    pub fn new(ctx: PageContext<'a>) -> Self {
        Self {
            ctx,
            resources: Vec::new(),
            bookings: Vec::new(),
        }
    }

    /// Reload resources and bookings. Each list degrades to empty on its own.
    pub async fn load(&mut self) {
        let ctx = self.ctx;
        let (resources, bookings) = tokio::join!(ctx.api.list_resources(), ctx.api.list_bookings());

        self.resources = resources.unwrap_or_else(|e| {
            ctx.notify.error(e.user_message(ctx.lang()));
            Vec::new()
        });
        self.bookings = bookings.unwrap_or_else(|e| {
            ctx.notify.error(e.user_message(ctx.lang()));
            Vec::new()
        });
    }

    pub fn view(&self) -> BookingsPageView {
        BookingsPageView {
            bookings: render::booking_view(&self.bookings, &self.resources, self.ctx.lang()),
            resources: render::resource_options(&self.resources, self.ctx.lang()),
        }
    }

    pub async fn submit(&mut self, form: &BookingForm) -> AppResult<()> {
        let lang = self.ctx.lang();
        let booking = form.validate().map_err(|e| AppError::invalid(e, lang))?;

        self.ctx
            .api
            .create_booking(&booking)
            .await
            .map_err(|e| AppError::upstream(e, lang))?;

        tracing::info!("Booking created for resource {}", booking.resource_id);
        self.ctx.notify.success(self.ctx.tr("booking.created"));
        self.load().await;
        Ok(())
    }

    pub async fn cancel(&mut self, id: i64) -> AppResult<()> {
        let lang = self.ctx.lang();
        self.ctx
            .api
            .update_booking_status(id, BookingStatus::Cancelled)
            .await
            .map_err(|e| AppError::upstream(e, lang))?;

        tracing::info!("Booking {} cancelled", id);
        self.ctx.notify.success(self.ctx.tr("booking.cancelled"));
        self.load().await;
        Ok(())
    }

    pub async fn delete(&mut self, id: i64) -> AppResult<()> {
        let lang = self.ctx.lang();
        self.ctx
            .api
            .delete_booking(id)
            .await
            .map_err(|e| AppError::upstream(e, lang))?;

        tracing::info!("Booking {} deleted", id);
        self.ctx.notify.success(self.ctx.tr("booking.deleted"));
        self.load().await;
        Ok(())
    }

    /// Ask the server whether the selected resource is free for the form's window.
    pub async fn check(&self, form: &BookingForm) -> AppResult<AvailabilityStatus> {
        let lang = self.ctx.lang();
        let resource_id = form
            .resource_id()
            .map_err(|e| AppError::invalid(e, lang))?
            .ok_or_else(|| AppError::invalid(ValidationError::MissingField(Field::Resource), lang))?;
        let window = WindowForm {
            start: form.start_time.clone(),
            end: form.end_time.clone(),
        }
        .validate()
        .map_err(|e| AppError::invalid(e, lang))?;

        let response = self
            .ctx
            .api
            .check_resource_availability(resource_id, &window)
            .await
            .map_err(|e| AppError::upstream(e, lang))?;

        let status = if reconcile::verdict_for(&response, resource_id) {
            AvailabilityStatus {
                state: AvailabilityState::Available,
                message: self.ctx.tr("booking.available"),
            }
        } else {
            AvailabilityStatus {
                state: AvailabilityState::Unavailable,
                message: self.ctx.tr("booking.not_available"),
            }
        };
        Ok(status)
    }

    /// Pre-populate the form from the hand-off and re-check with the server
    /// when both times are known.
    pub async fn prefill(
        &self,
        query: &HandoffQuery,
        pending: Option<&PendingBooking>,
    ) -> Option<PrefillView> {
        let prefill = handoff::resolve_prefill(query, pending)?;

        let availability = if prefill.recheck {
            let form = BookingForm {
                resource_id: Some(prefill.resource_id.into()),
                user_id: None,
                start_time: prefill.start_time.clone(),
                end_time: prefill.end_time.clone(),
            };
            match self.check(&form).await {
                Ok(status) => Some(status),
                Err(e) => {
                    self.ctx.notify.error(user_message(&e, &self.ctx));
                    None
                }
            }
        } else {
            None
        };

        Some(PrefillView {
            prefill,
            availability,
        })
    }

    pub fn default_window(&self, now: NaiveDateTime) -> DefaultWindow {
        DefaultWindow::new(now, 0, self.ctx.ui.booking_span_minutes)
    }
}

fn user_message(error: &AppError, ctx: &PageContext<'_>) -> String {
    match error {
        AppError::Validation { message, .. } | AppError::Upstream { message, .. } => message.clone(),
        _ => ctx.tr("api.check_availability_failed"),
    }
}

// ============================================================================
// Resources page
// ============================================================================

pub struct ResourcesPage<'a> {
    ctx: PageContext<'a>,
    resources: Vec<Resource>,
}

impl<'a> ResourcesPage<'a> {
    pub fn new(ctx: PageContext<'a>) -> Self {
        Self {
            ctx,
            resources: Vec::new(),
        }
    }

    pub async fn load(&mut self) {
        let ctx = self.ctx;
        self.resources = ctx.api.list_resources().await.unwrap_or_else(|e| {
            ctx.notify.error(e.user_message(ctx.lang()));
            Vec::new()
        });
    }

    pub fn view(&self) -> ResourceView {
        render::resource_view(&self.resources, self.ctx.lang())
    }

    /// Create a resource, or update `editing_id` when one is being edited.
    pub async fn save(&mut self, form: &ResourceForm, editing_id: Option<i64>) -> AppResult<()> {
        let lang = self.ctx.lang();
        let input = form.validate().map_err(|e| AppError::invalid(e, lang))?;

        let key = match editing_id {
            Some(id) => {
                self.ctx
                    .api
                    .update_resource(id, &input)
                    .await
                    .map_err(|e| AppError::upstream(e, lang))?;
                tracing::info!("Resource {} updated", id);
                "resource.updated"
            }
            None => {
                self.ctx
                    .api
                    .create_resource(&input)
                    .await
                    .map_err(|e| AppError::upstream(e, lang))?;
                tracing::info!("Resource \"{}\" created", input.name);
                "resource.created"
            }
        };

        self.ctx.notify.success(self.ctx.tr(key));
        self.load().await;
        Ok(())
    }

    pub async fn delete(&mut self, id: i64) -> AppResult<()> {
        let lang = self.ctx.lang();
        self.ctx
            .api
            .delete_resource(id)
            .await
            .map_err(|e| AppError::upstream(e, lang))?;

        tracing::info!("Resource {} deleted", id);
        self.ctx.notify.success(self.ctx.tr("resource.deleted"));
        self.load().await;
        Ok(())
    }
}

// ============================================================================
// Dashboard
// ============================================================================

pub struct DashboardPage<'a> {
    ctx: PageContext<'a>,
}

impl<'a> DashboardPage<'a> {
    pub fn new(ctx: PageContext<'a>) -> Self {
        Self { ctx }
    }

    /// Count resources and bookings; both requests run concurrently.
    pub async fn load(&self) -> DashboardView {
        let (resources, bookings) =
            tokio::join!(self.ctx.api.list_resources(), self.ctx.api.list_bookings());

        let resources = resources
            .map(|r| r.len())
            .map_err(|e| tracing::warn!("Dashboard could not load resources: {}", e))
            .ok();
        let bookings = bookings
            .map(|b| b.len())
            .map_err(|e| tracing::warn!("Dashboard could not load bookings: {}", e))
            .ok();

        render::dashboard_view(resources, bookings, self.ctx.lang())
    }
}
