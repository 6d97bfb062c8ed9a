use std::net::SocketAddr;

use axum::http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method};
use log::*;
use service::AppState;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
pub(crate) mod middleware;
mod params;
pub mod router;
pub(crate) mod sse;

pub use self::error::{Error, Result};

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let listen_addr = format!("{}:{}", interface, app_state.config.port);

    info!(
        "Server starting... listening for connections on http://{}",
        listen_addr
    );

    let allowed_origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(middleware::csrf::CSRF_HEADER),
        ])
        .allow_origin(allowed_origins);

    let listener = TcpListener::bind(listen_addr).await?;
    let app = router::define_routes(app_state).layer(cors_layer);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
