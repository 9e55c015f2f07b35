//! services/api/src/bin/api.rs

use api_lib::{
    adapters::PrefsAdapter,
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, register_handler},
        add_course_handler, clear_messages_handler, get_state_handler, mark_attendance_handler,
        rest::ApiDoc, state::AppState, today_attendance_handler,
    },
};
use attendance_core::store::{seed_sample_data, DomainStore, StoreConfig};
use attendance_core::CredentialStore;
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Build the Domain Store ---
    let prefs = Arc::new(PrefsAdapter::new(config.prefs_path.clone()));
    let mut store = DomainStore::new(
        StoreConfig {
            require_password_match: config.require_password_match,
        },
        prefs.clone(),
    );
    if config.seed_sample_data {
        seed_sample_data(&mut store);
        info!("Seeded sample users and courses");
    }

    // --- 3. Attempt Auto-Login From Saved Credentials ---
    // remember_me is passed as false here so an unchanged pair is not
    // re-persisted.
    match prefs.load().await {
        Ok(saved) if saved.remember_me && !saved.email.is_empty() && !saved.password.is_empty() => {
            match store.login(&saved.email, &saved.password, false).await {
                Ok(user) => info!("Auto-login as {}", user.email),
                Err(e) => {
                    warn!("Auto-login failed: {e}");
                    if let Err(e) = prefs.clear().await {
                        warn!("failed to clear stale credentials: {e}");
                    }
                }
            }
        }
        Ok(_) => info!("No saved credentials; starting anonymous"),
        Err(e) => warn!("Could not read saved credentials: {e}"),
    }

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store: Arc::new(Mutex::new(store)),
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().map_err(|e| {
            ApiError::Internal(format!("invalid CORS origin: {e}"))
        })?)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/state", get(get_state_handler))
        .route("/courses", post(add_course_handler))
        .route("/attendance", post(mark_attendance_handler))
        .route("/attendance/today", get(today_attendance_handler))
        .route("/messages/clear", post(clear_messages_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete
    // application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
