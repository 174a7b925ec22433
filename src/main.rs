use tokio::net::TcpListener;

use handraise_server::config::{generate_config_template, Config};
use handraise_server::routes;
use handraise_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "handraise_server=info".parse().expect("valid filter")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "handraise_server=info".parse().expect("valid filter")),
            )
            .init();
    }

    tracing::info!("handraise server v{} starting", env!("CARGO_PKG_VERSION"));

    if config.teacher_password == Config::default().teacher_password {
        tracing::warn!(
            "using the built-in teacher password; set HANDRAISE_TEACHER_PASSWORD before \
             exposing this server"
        );
    }

    let state = AppState::new(&config);
    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
