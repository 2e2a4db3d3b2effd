mod config;
mod db;
mod dtos;
mod error;
mod gateway;
mod handler;
mod lifecycle;
mod middleware;
mod models;
mod routes;
mod storage;
mod tracing_config;
mod utils;

use axum::http::{
    HeaderValue, Method,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use config::Config;
use db::{DBClient, UserExt};
use dotenv::dotenv;
use gateway::GatewayClient;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub env: Arc<Config>,
    pub db_client: DBClient,
    pub gateway: GatewayClient,
}

#[tokio::main]
async fn main() {
    let _guard = tracing_config::init_tracing();

    dotenv().ok();

    let config = Config::init();

    let db_client = match DBClient::connect(&config.database_url).await {
        Ok(client) => {
            tracing::info!("Connected to the database");
            client
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = db_client.init_schema().await {
        tracing::error!("Failed to initialize database schema: {:?}", err);
        std::process::exit(1);
    }

    // First-run seed: without an admin account the backend is a brick.
    match utils::password::hash(config.admin_password.clone()) {
        Ok(password_hash) => {
            match db_client
                .ensure_admin_user(&config.admin_username, &config.admin_email, &password_hash)
                .await
            {
                Ok(Some(user)) => {
                    tracing::info!(username = %user.username, "Created default admin user")
                }
                Ok(None) => {}
                Err(err) => tracing::error!("Failed to seed admin user: {:?}", err),
            }
        }
        Err(err) => tracing::error!("Failed to hash admin password: {}", err),
    }

    if let Err(err) = storage::ensure_upload_dirs(&config) {
        tracing::error!("Failed to create upload directories: {:?}", err);
        std::process::exit(1);
    }

    // Background sweep alongside the inline per-request one.
    db_client.start_publish_scheduler().await;

    if config.gateway_key_id.is_none() || config.gateway_key_secret.is_none() {
        tracing::warn!("Payment gateway credentials not set; payment endpoints are disabled");
    }

    let gateway = GatewayClient::new(
        reqwest::Client::new(),
        config.gateway_key_id.clone(),
        config.gateway_key_secret.clone(),
        config.gateway_url.clone(),
    );

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_url
                .parse::<HeaderValue>()
                .expect("FRONTEND_URL must be a valid origin"),
        )
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    let port = config.port;
    let app_state = AppState {
        env: Arc::new(config),
        db_client,
        gateway,
    };

    let app = routes::create_router(app_state).layer(cors);

    tracing::info!("Server is running on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind server port");

    axum::serve(listener, app).await.expect("Server error");
}
