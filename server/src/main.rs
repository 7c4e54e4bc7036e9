use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;

use anthill_server::config::Config;
use anthill_server::routes::create_routes;
use anthill_server::signals::spawn_message_logger;
use anthill_server::state::bootstrap_state;
use anthill_server::utils::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    anthill_server::init_logging();

    let config = Config::from_env();
    let state = Arc::new(bootstrap_state(&config).await?);
    tracing::info!("Storage ready");

    spawn_message_logger(&state.signals);

    let app = create_routes(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::InternalServerError(format!("failed to bind {addr}: {e}")))?;
    tracing::info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::InternalServerError(format!("server failed: {e}")))
}
