use log::{error, info};
use tower_http::cors::CorsLayer;

use chat_service::integration::{self, Config};
use chat_service::state::AppState;

#[tokio::main]
async fn main() {
    integration::init_logger();

    let cfg = Config::default();

    let state = match AppState::init(&cfg) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {e:?}");
            return;
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(cfg.env.allow_origin())
        .allow_methods(cfg.env.allow_methods())
        .allow_headers(cfg.env.allow_headers());

    let app = chat_service::app(state).layer(cors);

    let addr = cfg.env.addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            return;
        }
    };

    info!("Listening on {addr} ({:?})", cfg.env);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server stopped: {e}");
    }
}
