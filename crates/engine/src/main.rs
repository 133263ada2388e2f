//! TrionForge Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::HeaderName;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trionforge_engine::api;
use trionforge_engine::app::{App, Repositories};
use trionforge_engine::infrastructure::{
    app_settings::AppSettings,
    clock::SystemClock,
    identity::InMemoryIdentity,
    memory::{InMemoryCharacterRepo, InMemoryProfileRepo},
    sqlite::SqliteStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be started from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trionforge_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TrionForge Engine");

    // Load configuration
    let settings = AppSettings::from_env();
    tracing::info!(
        vip_accounts = settings.vip_emails.len(),
        max_stat_total = settings.limit_policy.max_stat_total,
        trion_min = settings.limit_policy.trion_min,
        trion_max = settings.limit_policy.trion_max,
        limits_timeout_ms = settings.limits_timeout.as_millis() as u64,
        session_idle_secs = settings.session_idle_timeout.as_secs(),
        max_sessions = settings.max_sessions,
        "Configuration loaded"
    );

    let catalog = settings.load_catalog()?;
    tracing::info!(
        entries = catalog.len(),
        path = ?settings.catalog_path,
        "Trigger catalog loaded"
    );

    let repositories = match &settings.database_path {
        Some(path) => {
            tracing::info!("Opening SQLite database at {}", path);
            let store = Arc::new(SqliteStore::new(path, Arc::new(SystemClock::new())).await?);
            Repositories {
                profile: store.clone(),
                character: store,
            }
        }
        None => {
            tracing::warn!("DATABASE_PATH not set, profiles and characters are kept in memory");
            Repositories {
                profile: Arc::new(InMemoryProfileRepo::new()),
                character: Arc::new(InMemoryCharacterRepo::new()),
            }
        }
    };

    let app = Arc::new(App::new(
        &settings,
        catalog,
        repositories,
        Arc::new(InMemoryIdentity::new()),
    ));

    // Spawn idle session sweeper
    let sweep_app = app.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            sweep_app.sessions.evict_idle();
        }
    });

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(settings.cors_allowed_origins.as_deref()) {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server_host, settings.server_port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed_origins: Option<&str>) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins?;

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static(api::http::SESSION_HEADER),
            axum::http::header::CONTENT_TYPE,
        ]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
