use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kassa_config::Settings;
use kassa_server::{routes, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if !settings.template_path.exists() {
        error!(
            "template workbook not found at {}",
            settings.template_path.display()
        );
        std::process::exit(1);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let app = routes::app(AppState::new(settings));

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}
