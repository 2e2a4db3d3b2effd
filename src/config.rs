use std::path::PathBuf;

/// Posts per page on public blog listings.
pub const POSTS_PER_PAGE: i64 = 6;
/// Posts per page on the admin post list.
pub const ADMIN_POSTS_PER_PAGE: i64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub frontend_url: String,
    pub upload_dir: PathBuf,
    /// Skill names surfaced on the homepage; empty means show everything.
    pub featured_skills: Vec<String>,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
    /// Payment gateway credentials. Absent credentials disable the payment
    /// endpoints with a configuration error instead of preventing startup.
    pub gateway_key_id: Option<String>,
    pub gateway_key_secret: Option<String>,
    pub gateway_url: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://site.db".to_string());
        let jwt_secret = std::env::var("JWT_SECRET_KEY")
            .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string());
        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60 * 60 * 24);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);
        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static/uploads"));
        let featured_skills = std::env::var("FEATURED_SKILLS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let admin_username =
            std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
        let admin_password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        let gateway_key_id = std::env::var("PAYMENT_GATEWAY_KEY_ID").ok();
        let gateway_key_secret = std::env::var("PAYMENT_GATEWAY_KEY_SECRET").ok();
        let gateway_url = std::env::var("PAYMENT_GATEWAY_URL")
            .unwrap_or_else(|_| "https://api.razorpay.com".to_string());

        Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            frontend_url,
            upload_dir,
            featured_skills,
            admin_username,
            admin_email,
            admin_password,
            gateway_key_id,
            gateway_key_secret,
            gateway_url,
        }
    }
}
