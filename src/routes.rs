use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    handler::{
        admin::admin_handler, blog::blog_handler, payment::payment_handler,
        portfolio::portfolio_handler, uploads::uploads_handler,
    },
};

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .merge(portfolio_handler())
        .nest("/blog", blog_handler())
        .nest("/course", payment_handler())
        .nest("/uploads", uploads_handler())
        .nest("/admin", admin_handler(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::DBClient;
    use crate::gateway::GatewayClient;
    use axum::body::Body;
    use axum::http::{Request, Response};
    use std::sync::Arc;
    use tower::ServiceExt;

    pub fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_maxage: 3600,
            port: 0,
            frontend_url: "http://localhost:3000".to_string(),
            upload_dir: std::env::temp_dir().join("portfolio_backend_test_uploads"),
            featured_skills: Vec::new(),
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "admin123".to_string(),
            gateway_key_id: None,
            gateway_key_secret: None,
            gateway_url: "http://127.0.0.1:0".to_string(),
        }
    }

    /// App over the given store with no payment credentials configured.
    pub async fn test_app_with_client(db_client: DBClient) -> Router {
        test_app_with_gateway(db_client, None).await
    }

    /// App over the given store; `gateway_secret` also doubles as the key id
    /// so signature tests can share one constant.
    pub async fn test_app_with_gateway(
        db_client: DBClient,
        gateway_secret: Option<&str>,
    ) -> Router {
        let config = test_config();
        let gateway = GatewayClient::new(
            reqwest::Client::new(),
            gateway_secret.map(|s| format!("key_{}", s)),
            gateway_secret.map(|s| s.to_string()),
            config.gateway_url.clone(),
        );

        let app_state = AppState {
            env: Arc::new(config),
            db_client,
            gateway,
        };

        create_router(app_state)
    }

    /// Collect a response body into JSON.
    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Log in as the seeded admin and return the session cookie pair.
    pub async fn login_and_get_cookie(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::post("/admin/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "username": "admin", "password": "admin123" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let set_cookie = response
            .headers()
            .get("set-cookie")
            .expect("login must set the session cookie")
            .to_str()
            .unwrap();

        // "access_token=...; Path=/; ..." -> "access_token=..."
        set_cookie
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn router_builds() {
        let client = crate::db::connect_in_memory().await;
        let _app = test_app_with_client(client).await;
    }
}
