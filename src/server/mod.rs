pub mod handlers;
mod types;

pub use handlers::AppState;
pub use types::{ERROR_PAGE, FetchQuery};

use crate::{
    Result,
    config::Config,
    engine::{DetectionEngine, NullEngine},
    fetch::HttpFetcher,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue},
    routing::{MethodRouter, options, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::info;

/// Headers stamped on every response, errors included.
pub const CORS_HEADERS: [(&str, &str); 4] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST, PUT, DELETE, OPTIONS"),
    ("access-control-allow-headers", "Content-Type"),
    ("access-control-max-age", "1728000"),
];

fn route_table() -> Vec<(&'static str, MethodRouter<AppState>)> {
    vec![
        (
            "/",
            options(handlers::preflight).get(handlers::fetch_and_process),
        ),
        ("/q", post(handlers::upload_and_process)),
    ]
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new();
    for (path, method_router) in route_table() {
        app = app.route(path, method_router);
    }

    let max_body_bytes = state.max_body_bytes;
    let mut app = app
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CatchPanicLayer::custom(types::panic_page))
        .layer(TraceLayer::new_for_http());

    for (name, value) in CORS_HEADERS {
        app = app.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    app
}

/// Serves with [`NullEngine`]; binaries linking a real backend call [`serve`].
pub async fn run(config: Config) -> Result<()> {
    let engine = NullEngine::new(config.engine.model_path.as_deref());
    serve(config, Box::new(engine)).await
}

pub async fn serve(config: Config, engine: Box<dyn DetectionEngine>) -> Result<()> {
    let fetcher = Arc::new(HttpFetcher::new()?);
    let app_state = AppState::new(&config, engine, fetcher);
    let app = router(app_state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, releasing detection engine");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
