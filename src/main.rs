use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use proconnect_server::{configure, cors, AppError, AppState, Settings};
use std::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> proconnect_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging; RUST_LOG overrides the default level
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    config.validate()?;
    info!("Configuration loaded successfully ({} environment)", config.environment);

    // Connect to the database and install the schema
    let (state, db) = AppState::new(config.clone()).await?;
    info!("Database ready");
    let state = web::Data::new(state);

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at {}:{}", config.server.host, config.server.port);

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&cors_config))
            .app_data(state.clone())
            .configure(configure)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    db.close().await;
    info!("Server stopped");
    Ok(())
}
