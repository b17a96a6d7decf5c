//! Carries a tentative booking from the availability page to the bookings page.
//!
//! "Book now" stores the selection in a session cookie (no expiry, so it
//! survives the navigation but not a new browser session) and points the
//! browser at the bookings page with the same fields as query parameters.
//! The bookings page treats the query parameters as authoritative, reads the
//! cookie once and clears it, then re-checks availability with the server.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::models::Resource;
use crate::services::timefmt::{self, Separator};
use crate::services::validation::TimeWindow;

pub const PENDING_BOOKING_COOKIE: &str = "prefilledBooking";
pub const SESSION_COOKIE: &str = "booking_session";

/// Cookie attributes derived from server configuration.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookieSettings {
    pub fn from_config(server: &ServerConfig) -> Self {
        let same_site = match server
            .cookie_same_site
            .as_deref()
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("strict") => SameSite::Strict,
            Some("none") => SameSite::None,
            _ => SameSite::Lax,
        };
        Self {
            secure: server.secure_cookies(),
            same_site,
        }
    }

    /// Session cookie: no Max-Age/Expires.
    fn session_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .build()
    }
}

/// The selection made on the availability page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBooking {
    pub resource_id: i64,
    pub resource_name: String,
    /// Input format (`YYYY-MM-DDTHH:MM`).
    pub start_time: String,
    pub end_time: String,
}

impl PendingBooking {
    pub fn new(resource: &Resource, window: &TimeWindow) -> Self {
        Self {
            resource_id: resource.id,
            resource_name: resource.name.clone(),
            start_time: window.start_as(Separator::Input),
            end_time: window.end_as(Separator::Input),
        }
    }

    /// Destination URL carrying the same three fields as query parameters.
    pub fn booking_url(&self) -> String {
        format!(
            "/bookings?resourceId={}&startTime={}&endTime={}",
            self.resource_id,
            urlencoding::encode(&self.start_time),
            urlencoding::encode(&self.end_time)
        )
    }

    fn encode(&self) -> Option<String> {
        serde_json::to_string(self)
            .ok()
            .map(|json| urlencoding::encode(&json).into_owned())
    }

    fn decode(raw: &str) -> Option<Self> {
        let json = urlencoding::decode(raw).ok()?;
        serde_json::from_str(&json).ok()
    }
}

/// Persist the selection for the next page view.
pub fn store(jar: CookieJar, pending: &PendingBooking, settings: &CookieSettings) -> CookieJar {
    match pending.encode() {
        Some(value) => jar.add(settings.session_cookie(PENDING_BOOKING_COOKIE, value)),
        None => {
            tracing::warn!("Failed to encode pending booking for resource {}", pending.resource_id);
            jar
        }
    }
}

/// Read the stored selection once; the cookie is removed either way.
pub fn take(jar: CookieJar) -> (CookieJar, Option<PendingBooking>) {
    let pending = jar
        .get(PENDING_BOOKING_COOKIE)
        .and_then(|c| PendingBooking::decode(c.value()));
    let had_cookie = jar.get(PENDING_BOOKING_COOKIE).is_some();
    let jar = if had_cookie {
        jar.remove(Cookie::build(PENDING_BOOKING_COOKIE).path("/"))
    } else {
        jar
    };
    (jar, pending)
}

/// Return the browser session id, issuing one if the cookie is missing.
pub fn ensure_session(jar: CookieJar, settings: &CookieSettings) -> (CookieJar, String) {
    if let Some(existing) = jar.get(SESSION_COOKIE) {
        let id = existing.value().to_string();
        return (jar, id);
    }
    let id = Uuid::new_v4().to_string();
    let jar = jar.add(settings.session_cookie(SESSION_COOKIE, id.clone()));
    (jar, id)
}

/// Query parameters accepted by the bookings page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffQuery {
    pub resource_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Values to pre-populate the booking form with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prefill {
    pub resource_id: i64,
    pub resource_name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Both times are present, so availability must be checked again.
    pub recheck: bool,
}

/// Build the prefill from the URL, which always wins. The stored selection
/// only contributes the resource name, and only when it names the same resource.
pub fn resolve_prefill(query: &HandoffQuery, pending: Option<&PendingBooking>) -> Option<Prefill> {
    let resource_id: i64 = query
        .resource_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .parse()
        .ok()?;

    let normalize = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| timefmt::normalize(s, Separator::Input).unwrap_or_else(|| s.to_string()))
    };
    let start_time = normalize(&query.start_time);
    let end_time = normalize(&query.end_time);

    let resource_name = pending
        .filter(|p| p.resource_id == resource_id)
        .map(|p| p.resource_name.clone());

    Some(Prefill {
        resource_id,
        resource_name,
        recheck: start_time.is_some() && end_time.is_some(),
        start_time,
        end_time,
    })
}
