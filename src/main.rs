use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use axum::{response::IntoResponse, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
mod middleware;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use axum::body::Body;
use http::{HeaderValue, StatusCode};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};

mod config;
mod error;
mod i18n;
mod models;
mod routes;
mod services;

use config::Config;
use error::AppError;
use services::api::{BookingApi, HttpBookingApi};
use services::handoff::CookieSettings;
use services::pages::InFlight;

pub struct AppState {
    pub config: Config,
    pub api: Arc<dyn BookingApi>,
    pub cookies: CookieSettings,
    pub in_flight: InFlight,
}

/// Governor failures rendered through `AppError` so clients see one error shape.
fn rate_limit_response(error: GovernorError) -> http::Response<Body> {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut resp = AppError::RateLimited {
                retry_after_seconds: wait_time,
            }
            .into_response();

            if let Some(hmap) = headers {
                for (name, value) in hmap.iter() {
                    resp.headers_mut().append(name.clone(), value.clone());
                }
            }
            resp.headers_mut()
                .insert(http::header::RETRY_AFTER, HeaderValue::from(wait_time));
            resp
        }
        GovernorError::UnableToExtractKey => AppError::BadRequest(
            "Unable to determine client IP for rate limiting".to_string(),
        )
        .into_response(),
        GovernorError::Other { code, msg, headers } => {
            let body = msg.unwrap_or_else(|| "Rate limiting error".to_string());
            let mut resp = http::Response::new(Body::from(body));
            *resp.status_mut() =
                StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if let Some(hmap) = headers {
                for (name, value) in hmap.iter() {
                    resp.headers_mut().append(name.clone(), value.clone());
                }
            }
            resp
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_frontend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting {}", i18n::t("app.name"));
    tracing::info!("Booking API at {}", config.api.base_url);

    let api = HttpBookingApi::new(&config.api)?;

    let app_state = Arc::new(AppState {
        cookies: CookieSettings::from_config(&config.server),
        config: config.clone(),
        api: Arc::new(api),
        in_flight: InFlight::new(),
    });

    let thread_shutdown = Arc::new(AtomicBool::new(false));

    // Rate limiter for page actions (checks, bookings, resource edits)
    let mut actions_builder = GovernorConfigBuilder::default();
    actions_builder.per_second(config.rate_limit.actions_per_second.into());
    actions_builder.burst_size(config.rate_limit.actions_burst);
    actions_builder.key_extractor(SmartIpKeyExtractor);
    actions_builder.error_handler(rate_limit_response);

    let actions_gov_conf = Arc::new(
        actions_builder
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Failed to build actions governor config"))?,
    );

    // Background cleanup for limiter storage
    let actions_cleaner = {
        let limiter = actions_gov_conf.limiter().clone();
        let interval = Duration::from_secs(60);
        let flag = thread_shutdown.clone();
        std::thread::spawn(move || {
            let tick = Duration::from_secs(1);
            loop {
                for _ in 0..interval.as_secs() {
                    if flag.load(Ordering::SeqCst) {
                        tracing::info!("Actions rate limiter cleanup thread exiting");
                        return;
                    }
                    std::thread::sleep(tick);
                }
                tracing::debug!("actions rate limiter size: {}", limiter.len());
                limiter.retain_recent();
            }
        })
    };

    let actions_layer = || GovernorLayer {
        config: actions_gov_conf.clone(),
    };

    let cors_origin = config
        .server
        .frontend_url
        .parse::<HeaderValue>()
        .map_err(|_| anyhow::anyhow!("Invalid FRONTEND_URL for CORS"))?;

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/dashboard", get(routes::dashboard::dashboard))
        .nest(
            "/api/availability",
            routes::availability::router()
                .merge(routes::availability::actions().layer(actions_layer())),
        )
        .nest(
            "/api/bookings",
            routes::bookings::router().merge(routes::bookings::actions().layer(actions_layer())),
        )
        .nest(
            "/api/resources",
            routes::resources::router()
                .merge(routes::resources::actions().layer(actions_layer())),
        )
        .with_state(app_state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::csp::csp_middleware)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(cors_origin)
                .allow_methods([
                    http::Method::GET,
                    http::Method::POST,
                    http::Method::PUT,
                    http::Method::DELETE,
                    http::Method::OPTIONS,
                ])
                .allow_headers([http::header::CONTENT_TYPE, http::header::ACCEPT])
                .allow_credentials(true),
        );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server_fut = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    let thread_shutdown_clone = thread_shutdown.clone();
    let signal_fut = async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = ctrl_c => {},
                        _ = term.recv() => {},
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to bind SIGTERM, waiting for Ctrl+C only: {}", e);
                    let _ = ctrl_c.await;
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }

        tracing::info!("Shutdown signal received");
        thread_shutdown_clone.store(true, Ordering::SeqCst);
    };

    tokio::select! {
        res = server_fut => {
            if let Err(e) = res {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = signal_fut => {
            tracing::info!("Signal handler completed; server future dropped to stop accepting new connections");
        }
    }

    thread_shutdown.store(true, Ordering::SeqCst);
    if let Err(e) = actions_cleaner.join() {
        tracing::warn!("Actions cleanup thread join failed: {:?}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
