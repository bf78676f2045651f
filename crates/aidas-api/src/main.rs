//! aidas-api - HTTP server for the aidas chat service.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aidas_api::{admin, analyze, auth, conversations, search, turn, upload};
use aidas_api::{AppState, Repos};
use aidas_db::Database;
use aidas_inference::OpenAIBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG controls the filter; LOG_FORMAT switches to JSON output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aidas_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/aidas".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);
    let upload_dir =
        PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));

    tokio::fs::create_dir_all(&upload_dir).await?;

    let db = Database::connect(&database_url).await?;
    db.migrate().await?;
    info!(subsystem = "api", "Database ready");

    let backend = Arc::new(OpenAIBackend::from_env()?);

    let state = AppState {
        repos: Repos::from_database(&db),
        backend,
        upload_dir,
    };

    let app = Router::new()
        // Public
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Session-gated
        .route("/logout", post(auth::logout))
        .route("/conversations", get(conversations::list))
        .route(
            "/conversations/:id",
            get(conversations::messages)
                .patch(conversations::rename)
                .delete(conversations::delete),
        )
        .route("/ask", post(turn::ask))
        .route("/upload", post(upload::upload))
        .route("/search", post(search::search))
        .route("/analyze", post(analyze::analyze))
        // Admin
        .route("/admin", get(admin::panel))
        .route("/admin/approve", post(admin::approve))
        .route("/admin/unapprove", post(admin::unapprove))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(RequestBodyLimitLayer::new(
            aidas_core::defaults::REQUEST_BODY_LIMIT_BYTES,
        ))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!(subsystem = "api", %addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<_> = std::env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
