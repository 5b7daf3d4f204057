use axum::{Router, http::header, routing::get};
use http::{HeaderValue, Method};
use splitledger::{
    LedgerService,
    api::{handlers::api_routes, openapi::ApiDoc},
    config::Config,
    infrastructure::{
        enrichment::{DisabledEnricher, Enricher, gemini::GeminiEnricher},
        storage::in_memory::InMemoryStorage,
    },
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .init();
    info!("Loaded configuration: {:?}", config);

    let enricher: Box<dyn Enricher> = match &config.gemini_api_key {
        Some(key) => Box::new(GeminiEnricher::new(
            config.gemini_api_url.clone(),
            key.clone(),
            config.enrichment_timeout_secs,
        )?),
        None => {
            warn!("GEMINI_API_KEY not set, expense enrichment disabled");
            Box::new(DisabledEnricher)
        }
    };

    let storage = InMemoryStorage::new();
    let service = Arc::new(LedgerService::new(
        storage,
        enricher,
        config.jwt_secret.clone(),
        config.ledger_retry_limit,
    ));

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid origin {}", o);
                None
            }
        })
        .collect();

    let app = Router::new()
        // add / route with a simple health check
        .route("/", get(|| async { "OK" }))
        .nest("/api", api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new()) // Gzip compression
        .layer(TimeoutLayer::new(Duration::from_secs(30))) // 30-second timeout
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true),
        )
        .layer(TraceLayer::new_for_http()); // Request tracing

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
