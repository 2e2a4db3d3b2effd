use axum::{
    extract::{Request, State},
    http::header,
    response::IntoResponse,
    middleware::Next,
};

use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    db::UserExt,
    error::{ErrorMessage, HttpError},
    models::User,
    utils::token,
};

/// Request extension inserted after a successful authentication; handlers
/// extract it to reach the acting admin.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthUser {
    pub user: User,
}

/// Admin-session middleware.
///
/// Pulls the session token from the `access_token` cookie first, then from a
/// bearer `Authorization` header, decodes it and re-loads the user so a
/// deleted account dies with its tokens. Since this backend serves no HTML,
/// an unauthenticated request gets a 401 JSON body (the login endpoint plus
/// the attempted path as `next`) rather than a redirect.
pub async fn auth(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = cookie_jar
        .get("access_token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| {
                    auth_value
                        .strip_prefix("Bearer ")
                        .map(|token| token.to_owned())
                })
        });

    let Some(token) = token else {
        return Err(login_required(&req));
    };

    let user_id = token::decode_token(token, app_state.env.jwt_secret.as_bytes())
        .ok()
        .and_then(|sub| sub.parse::<i64>().ok())
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user = app_state
        .db_client
        .get_user_by_id(user_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, loading session user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    if !user.is_admin {
        return Err(HttpError::new(
            ErrorMessage::PermissionDenied.to_string(),
            axum::http::StatusCode::FORBIDDEN,
        ));
    }

    req.extensions_mut().insert(AuthUser { user });

    Ok(next.run(req).await)
}

fn login_required(req: &Request) -> HttpError {
    HttpError::unauthorized(format!(
        "Please log in to access this page. Login at /admin/login?next={}",
        req.uri().path()
    ))
}
