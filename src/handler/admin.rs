use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{Router, middleware};
use axum_extra::extract::cookie::Cookie;
use chrono::Utc;
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::config::ADMIN_POSTS_PER_PAGE;
use crate::db::{
    AdminPostFilter, NewPost, PostChanges, PostExt, PostSort, SortDirection, TaxonomyExt, UserExt,
};
use crate::dtos::{
    AdminPostDto, AdminPostListQuery, AdminPostListResponseDto, AdminPostSummaryDto,
    CategoryDto, CategoryListResponseDto, CategoryResponseDto, DashboardResponseDto, LoginDto,
    LoginQuery, LoginResponseDto, PaginationDto, Response, SaveCategoryDto, SavePostDto,
    SavePostResponseDto, SaveTagDto, TagDto, TagListResponseDto, TagResponseDto,
    UploadResponseDto,
};
use crate::error::{ErrorMessage, HttpError};
use crate::lifecycle::{ResolvedPublication, resolve_publication};
use crate::models::{Post, PostStatus};
use crate::storage::{self, FileKind};
use crate::utils::slug::slugify;
use crate::utils::{password, token};

pub fn admin_handler(app_state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(edit_post).delete(delete_post),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{id}", axum::routing::delete(delete_category))
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/{id}", axum::routing::delete(delete_tag))
        .route("/uploads", post(upload_file))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            crate::middleware::auth,
        ));

    Router::new()
        .route("/login", post(login))
        .merge(protected)
}

/// Admin login. Unknown usernames and wrong passwords answer with distinct
/// messages; a success sets the `access_token` session cookie and echoes the
/// `?next=` target so the frontend can land back where it started.
#[instrument(skip(app_state, body), fields(username = %body.username))]
pub async fn login(
    Query(query): Query<LoginQuery>,
    State(app_state): State<AppState>,
    Json(body): Json<LoginDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user_by_username(&body.username)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotFound.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password).map_err(|e| {
        tracing::error!("Password error: {}", e);
        HttpError::unauthorized(ErrorMessage::WrongPassword.to_string())
    })?;

    if !password_matched {
        return Err(HttpError::unauthorized(
            ErrorMessage::WrongPassword.to_string(),
        ));
    }

    let access_token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let access_cookie = Cookie::build(("access_token", access_token.clone()))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(app_state.env.jwt_maxage))
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        access_cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?,
    );

    tracing::info!(username = %user.username, "Login successful");

    let response = Json(LoginResponseDto {
        status: "success".to_string(),
        access_token,
        username: user.username,
        redirect: query.next.unwrap_or_else(|| "/admin/dashboard".to_string()),
    });

    Ok((headers, response))
}

pub async fn logout() -> Result<impl IntoResponse, HttpError> {
    // Expire the session cookie; JWTs carry their own expiry server-side.
    let expired = Cookie::build(("access_token", ""))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(0))
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        expired
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?,
    );

    Ok((
        headers,
        Json(Response {
            status: "success",
            message: "You have been logged out".to_string(),
        }),
    ))
}

pub async fn dashboard(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .db_client
        .dashboard_stats()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(DashboardResponseDto {
        status: "success".to_string(),
        data: stats,
    }))
}

pub async fn list_posts(
    Query(params): Query<AdminPostListQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    // The admin list also benefits from fresh sweep results.
    if let Err(e) = app_state.db_client.publish_due_scheduled(Utc::now()).await {
        tracing::warn!("Auto-publish sweep failed: {}", e);
    }

    let status = params.status.as_deref().and_then(|raw| match raw {
        "draft" => Some(PostStatus::Draft),
        "published" => Some(PostStatus::Published),
        "scheduled" => Some(PostStatus::Scheduled),
        _ => None,
    });

    let filter = AdminPostFilter {
        status,
        search: params.search.clone().filter(|s| !s.trim().is_empty()),
        sort: PostSort::from_param(params.sort.as_deref()),
        direction: SortDirection::from_param(params.order.as_deref()),
    };

    let page = params.page.unwrap_or(1);
    let (posts, total) = app_state
        .db_client
        .list_admin_posts(&filter, page, ADMIN_POSTS_PER_PAGE)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(AdminPostListResponseDto {
        status: "success".to_string(),
        data: posts.iter().map(AdminPostSummaryDto::from_post).collect(),
        pagination: PaginationDto::new(page, ADMIN_POSTS_PER_PAGE, total),
    }))
}

pub async fn get_post(
    Path(post_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let post = app_state
        .db_client
        .get_post_by_id(post_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Post not found"))?;

    let response = admin_post_response(&app_state, post, None).await?;
    Ok(Json(response))
}

/// Shared save plumbing: resolve the slug, sanitize content and work out the
/// lifecycle outcome for this save.
struct PreparedSave {
    slug: String,
    content: String,
    resolution: ResolvedPublication,
}

fn prepare_save(body: &SavePostDto, existing: Option<&Post>) -> PreparedSave {
    let slug = body
        .slug
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| match existing {
            // An edit that clears the slug keeps the stored one.
            Some(post) => post.slug.clone(),
            None => slugify(&body.title),
        });

    // Admin-authored HTML still goes through the sanitizer; an XSS payload
    // pasted into the editor must not outlive the save.
    let content = ammonia::clean(&body.content);

    let resolution = resolve_publication(
        body.status,
        body.scheduled_date.as_deref(),
        body.published_date.as_deref(),
        existing.and_then(|p| p.published_date),
        Utc::now(),
    );

    PreparedSave {
        slug,
        content,
        resolution,
    }
}

async fn admin_post_response(
    app_state: &AppState,
    post: Post,
    warning: Option<&'static str>,
) -> Result<SavePostResponseDto, HttpError> {
    let tags = app_state
        .db_client
        .tags_for_post(post.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(SavePostResponseDto {
        status: "success".to_string(),
        data: AdminPostDto::from_post(&post, tags.iter().map(TagDto::from_model).collect()),
        warning: warning.map(|w| w.to_string()),
    })
}

fn map_save_error(e: sqlx::Error) -> HttpError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            HttpError::unique_constraint_violation("A post with this slug already exists")
        }
        other => {
            tracing::error!("DB error, saving post: {}", other);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        }
    }
}

#[instrument(skip(app_state, auth, body), fields(title = %body.title))]
pub async fn create_post(
    State(app_state): State<AppState>,
    axum::Extension(auth): axum::Extension<crate::middleware::AuthUser>,
    Json(body): Json<SavePostDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let prepared = prepare_save(&body, None);

    let new_post = NewPost {
        title: body.title.clone(),
        slug: prepared.slug,
        author_id: auth.user.id,
        content: prepared.content,
        excerpt: body.excerpt.clone(),
        featured_image: body.featured_image.clone(),
        video_url: body.video_url.clone(),
        video_file: body.video_file.clone(),
        category_id: body.category_id,
        previous_post_id: body.previous_post_id,
        status: prepared.resolution.status,
        published_date: prepared.resolution.published_date,
        meta_description: body.meta_description.clone(),
        meta_keywords: body.meta_keywords.clone(),
    };

    let post = app_state
        .db_client
        .create_post(&new_post)
        .await
        .map_err(map_save_error)?;

    app_state
        .db_client
        .set_post_tags(post.id, &body.tag_names())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(slug = %post.slug, status = post.status.to_str(), "Created post");

    let response = admin_post_response(
        &app_state,
        post,
        prepared.resolution.warning.map(|w| w.message()),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(app_state, body), fields(post_id = %post_id))]
pub async fn edit_post(
    Path(post_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<SavePostDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let existing = app_state
        .db_client
        .get_post_by_id(post_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Post not found"))?;

    let prepared = prepare_save(&body, Some(&existing));

    // A replacement upload supersedes the stored file; clean the old one up
    // before the reference is overwritten.
    if let Some(new_image) = body.featured_image.as_deref() {
        if let Some(old_image) = existing.featured_image.as_deref() {
            if old_image != new_image {
                storage::delete_upload(&app_state.env, FileKind::Image, old_image).await;
            }
        }
    }
    if let Some(new_video) = body.video_file.as_deref() {
        if let Some(old_video) = existing.video_file.as_deref() {
            if old_video != new_video {
                storage::delete_upload(&app_state.env, FileKind::Video, old_video).await;
            }
        }
    }

    let changes = PostChanges {
        title: body.title.clone(),
        slug: prepared.slug,
        content: prepared.content,
        excerpt: body.excerpt.clone(),
        featured_image: body.featured_image.clone(),
        video_url: body.video_url.clone(),
        video_file: body.video_file.clone(),
        category_id: body.category_id,
        previous_post_id: body.previous_post_id,
        status: prepared.resolution.status,
        published_date: prepared.resolution.published_date,
        views_count: body.views_count,
        meta_description: body.meta_description.clone(),
        meta_keywords: body.meta_keywords.clone(),
    };

    let post = app_state
        .db_client
        .update_post(post_id, &changes)
        .await
        .map_err(map_save_error)?;

    app_state
        .db_client
        .set_post_tags(post.id, &body.tag_names())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(slug = %post.slug, status = post.status.to_str(), "Updated post");

    let response = admin_post_response(
        &app_state,
        post,
        prepared.resolution.warning.map(|w| w.message()),
    )
    .await?;

    Ok(Json(response))
}

#[instrument(skip(app_state), fields(post_id = %post_id))]
pub async fn delete_post(
    Path(post_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let post = app_state
        .db_client
        .get_post_by_id(post_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Post not found"))?;

    // Stored files go with the post.
    if let Some(image) = post.featured_image.as_deref() {
        storage::delete_upload(&app_state.env, FileKind::Image, image).await;
    }
    if let Some(video) = post.video_file.as_deref() {
        storage::delete_upload(&app_state.env, FileKind::Video, video).await;
    }

    app_state
        .db_client
        .delete_post(post_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => HttpError::not_found("Post not found"),
            other => HttpError::server_error(other.to_string()),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state
        .db_client
        .list_categories()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(CategoryListResponseDto {
        status: "success".to_string(),
        data: categories.iter().map(CategoryDto::from_model).collect(),
    }))
}

pub async fn create_category(
    State(app_state): State<AppState>,
    Json(body): Json<SaveCategoryDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let category = app_state
        .db_client
        .create_category(&body.name, body.slug.as_deref(), body.description.as_deref())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                HttpError::unique_constraint_violation("Category name or slug already exists")
            }
            other => HttpError::server_error(other.to_string()),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponseDto {
            status: "success".to_string(),
            data: CategoryDto::from_model(&category),
        }),
    ))
}

pub async fn delete_category(
    Path(category_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_category(category_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => HttpError::not_found("Category not found"),
            other => HttpError::server_error(other.to_string()),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_tags(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let tags = app_state
        .db_client
        .list_tags()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(TagListResponseDto {
        status: "success".to_string(),
        data: tags.iter().map(TagDto::from_model).collect(),
    }))
}

pub async fn create_tag(
    State(app_state): State<AppState>,
    Json(body): Json<SaveTagDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let tag = app_state
        .db_client
        .create_tag(&body.name, body.slug.as_deref())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                HttpError::unique_constraint_violation("Tag name or slug already exists")
            }
            other => HttpError::server_error(other.to_string()),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(TagResponseDto {
            status: "success".to_string(),
            data: TagDto::from_model(&tag),
        }),
    ))
}

pub async fn delete_tag(
    Path(tag_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_tag(tag_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => HttpError::not_found("Tag not found"),
            other => HttpError::server_error(other.to_string()),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Multipart upload endpoint. Expects a `type` field (`image`, `video` or
/// `resume`) and a `file` field; answers with the stored filename and its
/// public location.
pub async fn upload_file(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let mut kind: Option<FileKind> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?
    {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                kind = FileKind::from_upload_type(&value);
                if kind.is_none() {
                    return Err(HttpError::bad_request("Unknown upload type"));
                }
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| HttpError::bad_request("File name is required"))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                file = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let kind = kind.unwrap_or(FileKind::Image);
    let (name, bytes) = file.ok_or_else(|| HttpError::bad_request("File is required"))?;

    let filename = storage::save_upload(&app_state.env, kind, &name, &bytes).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponseDto {
            status: "success".to_string(),
            location: format!("/uploads/{}/{}", kind.route_segment(), filename),
            filename,
        }),
    ))
}
