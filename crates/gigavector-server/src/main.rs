#![allow(clippy::doc_markdown)]
//! GigaVector Server - REST API for the `GigaVector` vector store.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use gigavector_core::GigaConfig;
use gigavector_server::{
    add_vector, create_namespace, delete_namespace, get_namespace, health_check, list_namespaces,
    migration_status, run_vacuum, search, start_migration, ApiDoc, AppState, TlsAcceptorConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// GigaVector Server - an embeddable vector store exposed over HTTP
#[derive(Parser, Debug)]
#[command(name = "gigavector-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "gigavector.toml", env = "GIGAVECTOR_CONFIG")]
    config: PathBuf,

    /// Host address to bind to, overrides the config file
    #[arg(long, env = "GIGAVECTOR_SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on, overrides the config file
    #[arg(short, long, env = "GIGAVECTOR_SERVER_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        GigaConfig::load_from_path(&args.config)?
    } else {
        GigaConfig::load()?
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("{},tower_http=debug", config.logging.level)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GigaVector server...");

    let state = Arc::new(AppState::new());

    let api_router = Router::new()
        .route("/health", get(health_check))
        .route("/namespaces", get(list_namespaces).post(create_namespace))
        .route(
            "/namespaces/{name}",
            get(get_namespace).delete(delete_namespace),
        )
        // 100MB limit for bulk vector uploads
        .route("/namespaces/{name}/vectors", post(add_vector))
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .route("/namespaces/{name}/search", post(search))
        .route("/namespaces/{name}/vacuum", post(run_vacuum))
        .route(
            "/namespaces/{name}/migrations",
            get(migration_status).post(start_migration),
        )
        .with_state(state);

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    let app = api_router
        .merge(Router::<()>::new().merge(swagger_ui))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: std::net::SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    if config.server.tls_enabled() {
        let tls_config = TlsAcceptorConfig::load(
            std::path::Path::new(&config.server.tls_cert_path),
            std::path::Path::new(&config.server.tls_key_path),
            None,
        )?;
        tracing::info!(
            "GigaVector server listening on https://{} ({})",
            addr,
            tls_config.version_string()
        );
        let rustls_config = RustlsConfig::from_config(tls_config.server_config());
        axum_server::bind_rustls(addr, rustls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        tracing::info!("GigaVector server listening on http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
    }

    Ok(())
}
