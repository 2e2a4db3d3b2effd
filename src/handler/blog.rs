use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use chrono::Utc;
use validator::Validate;

use crate::AppState;
use crate::config::POSTS_PER_PAGE;
use crate::db::{PostExt, PublicPostFilter, TaxonomyExt};
use crate::dtos::{
    CategoryDto, PaginationDto, PostDetailDto, PostDetailQuery, PostDetailResponseDto,
    PostLinkDto, PostListQuery, PostListResponseDto, PostSummaryDto, PageQuery, TagDto,
};
use crate::error::HttpError;
use crate::models::{Category, Post};
use crate::utils::video;

pub fn blog_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{slug}", get(post_detail))
        .route("/category/{slug}", get(posts_by_category))
        .route("/tag/{slug}", get(posts_by_tag))
}

/// Run the auto-publish sweep inline with a public request. A sweep failure
/// is logged and the request proceeds; serving stale listings beats failing
/// them.
async fn sweep_scheduled(app_state: &AppState) {
    if let Err(e) = app_state.db_client.publish_due_scheduled(Utc::now()).await {
        tracing::warn!("Auto-publish sweep failed: {}", e);
    }
}

/// Build listing summaries, resolving each post's category from one lookup
/// of the category table.
async fn summarize(app_state: &AppState, posts: &[Post]) -> Result<Vec<PostSummaryDto>, HttpError> {
    let categories = app_state
        .db_client
        .list_categories()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let category_of = |post: &Post| -> Option<&Category> {
        post.category_id
            .and_then(|id| categories.iter().find(|c| c.id == id))
    };

    Ok(posts
        .iter()
        .map(|post| PostSummaryDto::from_post(post, category_of(post)))
        .collect())
}

async fn listing_response(
    app_state: &AppState,
    filter: &PublicPostFilter,
    page: i64,
    category: Option<CategoryDto>,
    tag: Option<TagDto>,
    search: Option<String>,
) -> Result<Json<PostListResponseDto>, HttpError> {
    let (posts, total) = app_state
        .db_client
        .list_published_posts(filter, page, POSTS_PER_PAGE)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let data = summarize(app_state, &posts).await?;

    Ok(Json(PostListResponseDto {
        status: "success".to_string(),
        data,
        pagination: PaginationDto::new(page, POSTS_PER_PAGE, total),
        category,
        tag,
        search,
    }))
}

pub async fn list_posts(
    Query(params): Query<PostListQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    sweep_scheduled(&app_state).await;

    let page = params.page.unwrap_or(1);
    let mut filter = PublicPostFilter {
        search: params.search.clone(),
        ..Default::default()
    };

    // Filter slugs must resolve; an unknown category or tag is a 404, not an
    // empty listing.
    let mut selected_category = None;
    if let Some(slug) = &params.category {
        let category = app_state
            .db_client
            .get_category_by_slug(slug)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .ok_or_else(|| HttpError::not_found("Category not found"))?;
        filter.category_id = Some(category.id);
        selected_category = Some(CategoryDto::from_model(&category));
    }

    let mut selected_tag = None;
    if let Some(slug) = &params.tag {
        let tag = app_state
            .db_client
            .get_tag_by_slug(slug)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .ok_or_else(|| HttpError::not_found("Tag not found"))?;
        filter.tag_id = Some(tag.id);
        selected_tag = Some(TagDto::from_model(&tag));
    }

    listing_response(
        &app_state,
        &filter,
        page,
        selected_category,
        selected_tag,
        params.search,
    )
    .await
}

pub async fn posts_by_category(
    Path(slug): Path<String>,
    Query(params): Query<PageQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    sweep_scheduled(&app_state).await;

    let category = app_state
        .db_client
        .get_category_by_slug(&slug)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Category not found"))?;

    let filter = PublicPostFilter {
        category_id: Some(category.id),
        ..Default::default()
    };

    listing_response(
        &app_state,
        &filter,
        params.page.unwrap_or(1),
        Some(CategoryDto::from_model(&category)),
        None,
        None,
    )
    .await
}

pub async fn posts_by_tag(
    Path(slug): Path<String>,
    Query(params): Query<PageQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    sweep_scheduled(&app_state).await;

    let tag = app_state
        .db_client
        .get_tag_by_slug(&slug)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Tag not found"))?;

    let filter = PublicPostFilter {
        tag_id: Some(tag.id),
        ..Default::default()
    };

    listing_response(
        &app_state,
        &filter,
        params.page.unwrap_or(1),
        None,
        Some(TagDto::from_model(&tag)),
        None,
    )
    .await
}

pub async fn post_detail(
    Path(slug): Path<String>,
    Query(params): Query<PostDetailQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    sweep_scheduled(&app_state).await;

    let post = app_state
        .db_client
        .get_published_post_by_slug(&slug)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Post not found"))?;

    // The read carries the counter; a refresh counts again.
    app_state
        .db_client
        .increment_views(post.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let category = match post.category_id {
        Some(_) => {
            let categories = app_state
                .db_client
                .list_categories()
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?;
            categories
                .into_iter()
                .find(|c| Some(c.id) == post.category_id)
        }
        None => None,
    };

    let tags = app_state
        .db_client
        .tags_for_post(post.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let related = app_state
        .db_client
        .related_posts(&post, 3)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    let related_posts = summarize(&app_state, &related).await?;

    let previous_post = resolve_previous_post(&app_state, &post, params.prev.as_deref()).await?;

    let video_embed_url = post.video_url.as_deref().map(video::embed_url);

    let detail = PostDetailDto {
        id: post.id,
        title: post.title.clone(),
        slug: post.slug.clone(),
        content: post.content.clone(),
        excerpt: post.excerpt.clone(),
        featured_image: post.featured_image.clone(),
        video_url: post.video_url.clone(),
        video_file: post.video_file.clone(),
        video_embed_url,
        category: category.as_ref().map(CategoryDto::from_model),
        tags: tags.iter().map(TagDto::from_model).collect(),
        published_date: post.published_date,
        created_date: post.created_date,
        updated_date: post.updated_date,
        // Reflect the increment this request just made.
        views_count: post.views_count + 1,
        reading_time_minutes: post.reading_time_minutes(),
        meta_description: post.meta_description.clone(),
        meta_keywords: post.meta_keywords.clone(),
        previous_post,
        related_posts,
    };

    Ok(Json(PostDetailResponseDto {
        status: "success".to_string(),
        data: detail,
    }))
}

/// A `?prev=` slug takes precedence over the post's stored reference. Either
/// way only a published post qualifies; a dangling reference resolves to
/// nothing rather than an error.
async fn resolve_previous_post(
    app_state: &AppState,
    post: &Post,
    prev_slug: Option<&str>,
) -> Result<Option<PostLinkDto>, HttpError> {
    if let Some(slug) = prev_slug {
        let previous = app_state
            .db_client
            .get_published_post_by_slug(slug)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
        return Ok(previous.as_ref().map(PostLinkDto::from_post));
    }

    if let Some(previous_id) = post.previous_post_id {
        let previous = app_state
            .db_client
            .get_post_by_id(previous_id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .filter(|p| p.status == crate::models::PostStatus::Published);
        return Ok(previous.as_ref().map(PostLinkDto::from_post));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::post::tests::{new_post, seeded_client};
    use crate::models::PostStatus;
    use crate::routes::tests::{body_json, test_app_with_client};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn detail_of_draft_post_is_404() {
        let client = seeded_client().await;
        client
            .create_post(&new_post("Hidden", PostStatus::Draft))
            .await
            .unwrap();
        let app = test_app_with_client(client).await;

        let response = app
            .oneshot(Request::get("/blog/hidden").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn detail_increments_views_per_request() {
        let client = seeded_client().await;
        client
            .create_post(&new_post("Counted", PostStatus::Published))
            .await
            .unwrap();
        let app = test_app_with_client(client.clone()).await;

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::get("/blog/counted").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let post = client
            .get_post_by_slug("counted")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.views_count, 2);
    }

    #[tokio::test]
    async fn listing_request_sweeps_due_scheduled_posts() {
        let client = seeded_client().await;
        let mut due = new_post("Was scheduled", PostStatus::Scheduled);
        due.published_date = Some(Utc::now() - Duration::minutes(1));
        let due = client.create_post(&due).await.unwrap();
        let app = test_app_with_client(client.clone()).await;

        let response = app
            .oneshot(Request::get("/blog").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["pagination"]["total"], 1);

        let post = client.get_post_by_id(due.id).await.unwrap().unwrap();
        assert_eq!(post.status, PostStatus::Published);
    }

    #[tokio::test]
    async fn unknown_category_slug_is_404() {
        let client = seeded_client().await;
        let app = test_app_with_client(client).await;

        let response = app
            .oneshot(
                Request::get("/blog/category/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn prev_query_overrides_the_stored_reference(){
        let client = seeded_client().await;
        let first = client
            .create_post(&new_post("Part one", PostStatus::Published))
            .await
            .unwrap();
        let mut second = new_post("Part two", PostStatus::Published);
        second.previous_post_id = Some(first.id);
        client.create_post(&second).await.unwrap();
        client
            .create_post(&new_post("Override", PostStatus::Published))
            .await
            .unwrap();
        let app = test_app_with_client(client).await;

        let response = app
            .clone()
            .oneshot(
                Request::get("/blog/part-two")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["data"]["previousPost"]["slug"], "part-one");

        let response = app
            .oneshot(
                Request::get("/blog/part-two?prev=override")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["data"]["previousPost"]["slug"], "override");
    }

    #[tokio::test]
    async fn video_url_is_mapped_to_an_embed() {
        let client = seeded_client().await;
        let mut post = new_post("With video", PostStatus::Published);
        post.video_url = Some("https://www.youtube.com/watch?v=abc123".to_string());
        client.create_post(&post).await.unwrap();
        let app = test_app_with_client(client).await;

        let response = app
            .oneshot(
                Request::get("/blog/with-video")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(
            json["data"]["videoEmbedUrl"],
            "https://www.youtube.com/embed/abc123"
        );
    }
}
