//! Motion Wealth Group backend - library for app logic and testing

pub mod auth;
pub mod blob;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod media;
pub mod rate_limit;
pub mod routes;
pub mod seo;
pub mod state;
pub mod store;
pub mod validators;

#[cfg(test)]
mod test_support;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::{FirebaseVerifier, IdentityVerifier, SharedSecretVerifier};
use crate::blob::{BlobStore, LocalBlobStore, MAX_IMAGE_SIZE};
use crate::config::{AppConfig, ConfigError, IdentityConfig};
use crate::mailer::{ContactRelay, EmailJsRelay, RelayError};
use crate::rate_limit::RateLimiter;
use crate::state::{AppState, SharedState};
use crate::store::{DocumentStore, MemoryStore, PgStore};

/// Room for one maximum-size image plus the other form fields.
const BODY_LIMIT: usize = MAX_IMAGE_SIZE + 1024 * 1024;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("contact relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("invalid HOST/PORT configuration: {0}")]
    Address(String),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// CORS for the configured front-end origins. Unparseable origins are skipped.
pub fn configure_cors(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

fn admin_routes(state: &SharedState) -> Router<SharedState> {
    use routes::{blog, contact, pages, resources, settings, upload};

    Router::new()
        .route("/api/admin/blog", get(blog::admin_list_posts).post(blog::create_post))
        .route("/api/admin/blog/seed", post(blog::seed_posts))
        .route(
            "/api/admin/blog/{id}",
            put(blog::update_post).delete(blog::delete_post),
        )
        .route(
            "/api/admin/resources",
            get(resources::admin_list_resources).post(resources::create_resource),
        )
        .route("/api/admin/resources/seed", post(resources::seed_resources))
        .route(
            "/api/admin/resources/{id}",
            put(resources::update_resource).delete(resources::delete_resource),
        )
        .route("/api/admin/pages", get(pages::admin_list_pages))
        .route(
            "/api/admin/pages/{name}",
            get(pages::admin_get_page).put(pages::admin_put_page),
        )
        .route("/api/admin/pages/id/{id}", delete(pages::admin_delete_page))
        .route(
            "/api/admin/contact-info",
            get(contact::admin_get_contact_info).put(contact::admin_put_contact_info),
        )
        .route(
            "/api/admin/settings/footer-logo",
            get(settings::admin_get_footer_logo).put(settings::admin_put_footer_logo),
        )
        .route("/api/admin/upload", post(upload::upload_image))
        // Multipart enforces its own 2 MB default otherwise.
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin))
}

/// Create and configure the application router.
pub fn create_app(state: SharedState) -> Router {
    let cors = configure_cors(&state.config.allowed_origins);
    tracing::info!(origins = ?state.config.allowed_origins, "CORS configured");

    let auth_limit = middleware::from_fn_with_state(state.auth_limiter.clone(), rate_limit::enforce);
    let contact_limit = middleware::from_fn_with_state(state.contact_limiter.clone(), rate_limit::enforce);

    let mut app = Router::new()
        .route("/api/logs", post(routes::logs::receive_client_logs))
        .route(
            "/api/auth/session",
            post(routes::auth::create_session)
                .layer(auth_limit)
                .delete(routes::auth::delete_session),
        )
        .route("/api/auth/check-admin", get(routes::auth::check_admin))
        .route("/api/pages/{name}", get(routes::pages::get_page))
        .route("/api/blog", get(routes::blog::list_posts))
        .route("/api/blog/{id}", get(routes::blog::get_post))
        .route("/api/resources", get(routes::resources::list_resources))
        .route("/api/contact-info", get(routes::contact::get_contact_info))
        .route(
            "/api/contact",
            post(routes::contact::send_message).layer(contact_limit),
        )
        .route("/api/settings/footer-logo", get(routes::settings::get_footer_logo))
        .route("/sitemap.xml", get(routes::seo::sitemap))
        .route("/robots.txt", get(routes::seo::robots))
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready))
        .merge(admin_routes(&state));

    if let Some(dir) = &state.config.upload_dir {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    app.with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(cors)
}

async fn build_state(config: AppConfig) -> Result<AppState, StartupError> {
    let (store, pool) = match &config.database {
        Some(db_config) => {
            let pool = db::init_pool(db_config).await?;
            db::run_migrations(&pool).await?;
            (Arc::new(PgStore::new(pool.clone())) as Arc<dyn DocumentStore>, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set. Content is kept in memory and lost on restart.");
            (Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>, None)
        }
    };

    let blobs: Option<Arc<dyn BlobStore>> = config.upload_dir.as_ref().map(|dir| {
        tracing::info!(dir = %dir.display(), "serving uploads from local directory");
        Arc::new(LocalBlobStore::new(dir, "/uploads")) as Arc<dyn BlobStore>
    });
    if blobs.is_none() {
        tracing::info!("UPLOAD_DIR not set. Uploaded images are stored inline as data URLs.");
    }

    let verifier: Arc<dyn IdentityVerifier> = match &config.identity {
        IdentityConfig::Firebase { project_id } => Arc::new(FirebaseVerifier::new(project_id.clone())),
        IdentityConfig::SharedSecret { secret } => {
            tracing::warn!("Verifying ID tokens with ID_TOKEN_SECRET. Use only for local development.");
            Arc::new(SharedSecretVerifier::new(secret.clone()))
        }
    };

    let relay: Option<Arc<dyn ContactRelay>> = match config.emailjs.clone() {
        Some(emailjs) => Some(Arc::new(EmailJsRelay::new(emailjs)?) as Arc<dyn ContactRelay>),
        None => {
            tracing::warn!("EmailJS is not configured. The contact form will answer 503.");
            None
        }
    };

    let allowlist = auth::AdminAllowlist::new(config.admin_emails.iter());
    if allowlist.is_empty() {
        tracing::warn!("ADMIN_EMAILS is empty. Nobody can reach the admin routes.");
    }

    Ok(AppState {
        store,
        blobs,
        sessions: auth::SessionStore::new(config.session_ttl, pool),
        verifier,
        allowlist,
        contact_limiter: RateLimiter::new(config.contact_rate_limit).behind_proxy(config.trust_proxy),
        auth_limiter: RateLimiter::new(config.auth_rate_limit).behind_proxy(config.trust_proxy),
        relay,
        config,
    })
}

fn spawn_session_purge(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match state.sessions.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "purged expired admin sessions"),
                Err(e) => tracing::warn!(error = %e, "failed to purge expired admin sessions"),
            }
        }
    });
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(&config.environment, &config.log_level);

    routes::health::init_start_time();

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| StartupError::Address(format!("{}:{} ({})", config.host, config.port, e)))?;

    let state: SharedState = Arc::new(build_state(config).await?);
    spawn_session_purge(state.clone());

    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
