//! Roombook Server - room and equipment booking
//!
//! REST API server for meeting room reservations.

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roombook_server::{
    api,
    config::{AppConfig, LogFormat, LoggingConfig},
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Roombook Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let repository = Repository::new(pool);
    let services = Services::new(repository, config.scheduling.clone());

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Install the global subscriber: stdout in the configured format, plus a
/// daily-rolling file when a log directory is configured.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("roombook_server={},tower_http=debug", logging.level).into()
    });

    let json = (logging.format == LogFormat::Json).then(|| tracing_subscriber::fmt::layer().json());
    let pretty = (logging.format == LogFormat::Pretty).then(tracing_subscriber::fmt::layer);

    let (file, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "roombook.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .with(file)
        .init();

    guard
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Availability
        .route("/availability", post(api::availability::check_availability))
        // Rooms
        .route("/rooms", get(api::rooms::list_rooms).post(api::rooms::create_room))
        .route("/rooms/:id", get(api::rooms::get_room).put(api::rooms::update_room))
        .route("/rooms/:id/devices", get(api::rooms::list_room_devices))
        .route("/rooms/:id/usage", get(api::rooms::get_room_usage))
        .route("/rooms/:id/audit", get(api::rooms::get_room_audit))
        // Devices
        .route("/devices", get(api::devices::list_devices).post(api::devices::create_device))
        .route("/devices/:id", get(api::devices::get_device).put(api::devices::update_device))
        .route(
            "/devices/maintenance/complete",
            post(api::devices::complete_maintenance),
        )
        // Bookings
        .route("/bookings", get(api::bookings::list_bookings).post(api::bookings::create_booking))
        .route("/bookings/:id", get(api::bookings::get_booking))
        .route("/bookings/:id/audit", get(api::bookings::get_booking_audit))
        .route("/bookings/:id/approve", post(api::bookings::approve_booking))
        .route("/bookings/:id/reject", post(api::bookings::reject_booking))
        .route("/bookings/:id/cancel", post(api::bookings::cancel_booking))
        .route("/bookings/:id/begin", post(api::bookings::begin_booking))
        .route("/bookings/:id/return", post(api::bookings::return_booking))
        // Assistant
        .route("/assistant/suggest", post(api::assistant::suggest))
        .route("/assistant/book", post(api::assistant::book))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
