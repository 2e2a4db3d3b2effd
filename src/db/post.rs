use super::DBClient;
use crate::models::{Post, PostStatus};
use chrono::{DateTime, Utc};

const POST_COLUMNS: &str = "id, title, slug, author_id, content, excerpt, featured_image, \
     video_url, video_file, category_id, previous_post_id, status, published_date, \
     created_date, updated_date, views_count, meta_description, meta_keywords";

/// Filters applied to public blog listings. All are optional and AND'd
/// together on top of the implicit `status = 'published'` predicate.
#[derive(Debug, Default, Clone)]
pub struct PublicPostFilter {
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub search: Option<String>,
}

/// Sortable columns on the admin post list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSort {
    Title,
    Status,
    Views,
    Created,
}

impl PostSort {
    /// Parse the `sort` query parameter; anything unrecognized falls back to
    /// creation date, matching the listing's default.
    pub fn from_param(value: Option<&str>) -> PostSort {
        match value {
            Some("title") => PostSort::Title,
            Some("status") => PostSort::Status,
            Some("views") => PostSort::Views,
            _ => PostSort::Created,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            PostSort::Title => "title",
            PostSort::Status => "status",
            PostSort::Views => "views_count",
            PostSort::Created => "created_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_param(value: Option<&str>) -> SortDirection {
        match value {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Filters and ordering for the admin post list. Unlike the public listing
/// there is no implicit status predicate: drafts and scheduled posts show
/// unless a status filter narrows them away.
#[derive(Debug, Clone)]
pub struct AdminPostFilter {
    pub status: Option<PostStatus>,
    pub search: Option<String>,
    pub sort: PostSort,
    pub direction: SortDirection,
}

impl Default for AdminPostFilter {
    fn default() -> Self {
        AdminPostFilter {
            status: None,
            search: None,
            sort: PostSort::Created,
            direction: SortDirection::Desc,
        }
    }
}

/// Column values for a post insert. Timestamps are stamped by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub author_id: i64,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub video_url: Option<String>,
    pub video_file: Option<String>,
    pub category_id: Option<i64>,
    pub previous_post_id: Option<i64>,
    pub status: PostStatus,
    pub published_date: Option<DateTime<Utc>>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
}

/// Column values for a post update. `views_count`, `featured_image` and
/// `video_file` are `None`-means-keep; everything else overwrites.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub video_url: Option<String>,
    pub video_file: Option<String>,
    pub category_id: Option<i64>,
    pub previous_post_id: Option<i64>,
    pub status: PostStatus,
    pub published_date: Option<DateTime<Utc>>,
    pub views_count: Option<i64>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardStats {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub scheduled_posts: i64,
    pub total_views: i64,
}

pub trait PostExt {
    /// Fetch a post by slug regardless of status (admin and previous-post
    /// resolution paths).
    async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, sqlx::Error>;

    /// Fetch a publicly visible post by slug.
    async fn get_published_post_by_slug(&self, slug: &str) -> Result<Option<Post>, sqlx::Error>;

    async fn get_post_by_id(&self, post_id: i64) -> Result<Option<Post>, sqlx::Error>;

    /// Published posts matching `filter`, newest publication first, plus the
    /// total match count for pagination.
    async fn list_published_posts(
        &self,
        filter: &PublicPostFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Post>, i64), sqlx::Error>;

    /// Admin listing across all statuses with caller-chosen ordering.
    async fn list_admin_posts(
        &self,
        filter: &AdminPostFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Post>, i64), sqlx::Error>;

    /// Published posts sharing the category of `post`, excluding itself.
    async fn related_posts(&self, post: &Post, limit: i64) -> Result<Vec<Post>, sqlx::Error>;

    async fn create_post(&self, new_post: &NewPost) -> Result<Post, sqlx::Error>;

    async fn update_post(&self, post_id: i64, changes: &PostChanges) -> Result<Post, sqlx::Error>;

    async fn delete_post(&self, post_id: i64) -> Result<(), sqlx::Error>;

    /// Bump the view counter by one. Runs as a single UPDATE so concurrent
    /// reads cannot lose increments.
    async fn increment_views(&self, post_id: i64) -> Result<(), sqlx::Error>;

    /// The auto-publish sweep: flip every scheduled post whose publish time
    /// has passed. Each post is updated individually; a failure on one is
    /// logged and does not block the rest. Returns how many were published.
    async fn publish_due_scheduled(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, sqlx::Error>;
}

impl PostExt for DBClient {
    async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE slug = ?1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_published_post_by_slug(&self, slug: &str) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE slug = ?1 AND status = 'published'"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_post_by_id(&self, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_published_posts(
        &self,
        filter: &PublicPostFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Post>, i64), sqlx::Error> {
        let offset = (page - 1) * limit;

        // One static statement; absent filters collapse their predicate to
        // TRUE through the `?N IS NULL` guard.
        let where_clause = "status = 'published' \
             AND (?1 IS NULL OR category_id = ?1) \
             AND (?2 IS NULL OR id IN (SELECT post_id FROM post_tags WHERE tag_id = ?2)) \
             AND (?3 IS NULL \
                  OR title LIKE '%' || ?3 || '%' \
                  OR content LIKE '%' || ?3 || '%' \
                  OR COALESCE(excerpt, '') LIKE '%' || ?3 || '%')";

        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE {where_clause} \
             ORDER BY published_date DESC, created_date DESC \
             LIMIT ?4 OFFSET ?5"
        ))
        .bind(filter.category_id)
        .bind(filter.tag_id)
        .bind(filter.search.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM posts WHERE {where_clause}"
        ))
        .bind(filter.category_id)
        .bind(filter.tag_id)
        .bind(filter.search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((posts, total))
    }

    async fn list_admin_posts(
        &self,
        filter: &AdminPostFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Post>, i64), sqlx::Error> {
        let offset = (page - 1) * limit;

        let where_clause = "(?1 IS NULL OR status = ?1) \
             AND (?2 IS NULL OR title LIKE '%' || ?2 || '%')";

        // Sort column and direction come from closed enums, never from the
        // raw request string.
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE {where_clause} \
             ORDER BY {} {} \
             LIMIT ?3 OFFSET ?4",
            filter.sort.column(),
            filter.direction.keyword()
        ))
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM posts WHERE {where_clause}"
        ))
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((posts, total))
    }

    async fn related_posts(&self, post: &Post, limit: i64) -> Result<Vec<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE status = 'published' \
               AND id != ?1 \
               AND ((?2 IS NULL AND category_id IS NULL) OR category_id = ?2) \
             ORDER BY published_date DESC \
             LIMIT ?3"
        ))
        .bind(post.id)
        .bind(post.category_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_post(&self, new_post: &NewPost) -> Result<Post, sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (title, slug, author_id, content, excerpt, featured_image, \
                 video_url, video_file, category_id, previous_post_id, status, \
                 published_date, created_date, updated_date, views_count, \
                 meta_description, meta_keywords) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0, ?15, ?16) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(&new_post.title)
        .bind(&new_post.slug)
        .bind(new_post.author_id)
        .bind(&new_post.content)
        .bind(new_post.excerpt.as_deref())
        .bind(new_post.featured_image.as_deref())
        .bind(new_post.video_url.as_deref())
        .bind(new_post.video_file.as_deref())
        .bind(new_post.category_id)
        .bind(new_post.previous_post_id)
        .bind(new_post.status)
        .bind(new_post.published_date)
        .bind(now)
        .bind(now)
        .bind(new_post.meta_description.as_deref())
        .bind(new_post.meta_keywords.as_deref())
        .fetch_one(&self.pool)
        .await
    }

    async fn update_post(&self, post_id: i64, changes: &PostChanges) -> Result<Post, sqlx::Error> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET \
                 title = ?1, slug = ?2, content = ?3, excerpt = ?4, \
                 featured_image = COALESCE(?5, featured_image), \
                 video_url = ?6, \
                 video_file = COALESCE(?7, video_file), \
                 category_id = ?8, previous_post_id = ?9, status = ?10, \
                 published_date = ?11, \
                 views_count = COALESCE(?12, views_count), \
                 meta_description = ?13, meta_keywords = ?14, \
                 updated_date = ?15 \
             WHERE id = ?16 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(&changes.title)
        .bind(&changes.slug)
        .bind(&changes.content)
        .bind(changes.excerpt.as_deref())
        .bind(changes.featured_image.as_deref())
        .bind(changes.video_url.as_deref())
        .bind(changes.video_file.as_deref())
        .bind(changes.category_id)
        .bind(changes.previous_post_id)
        .bind(changes.status)
        .bind(changes.published_date)
        .bind(changes.views_count)
        .bind(changes.meta_description.as_deref())
        .bind(changes.meta_keywords.as_deref())
        .bind(Utc::now())
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        post.ok_or(sqlx::Error::RowNotFound)
    }

    async fn delete_post(&self, post_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn increment_views(&self, post_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE posts SET views_count = views_count + 1 WHERE id = ?1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn publish_due_scheduled(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let scheduled: Vec<(i64, Option<DateTime<Utc>>)> = sqlx::query_as(
            "SELECT id, published_date FROM posts WHERE status = 'scheduled'",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut published = 0u64;
        for (post_id, published_date) in scheduled {
            let due = matches!(published_date, Some(date) if date <= now);
            if !due {
                continue;
            }

            let result = sqlx::query(
                "UPDATE posts SET status = 'published' WHERE id = ?1 AND status = 'scheduled'",
            )
            .bind(post_id)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => {
                    tracing::info!(post_id, "Auto-published scheduled post");
                    published += 1;
                }
                Err(e) => {
                    tracing::warn!(post_id, "Failed to auto-publish scheduled post: {}", e);
                }
            }
        }

        Ok(published)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, sqlx::Error> {
        let counts: Vec<(PostStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM posts GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut stats = DashboardStats {
            total_posts: 0,
            published_posts: 0,
            draft_posts: 0,
            scheduled_posts: 0,
            total_views: 0,
        };

        for (status, count) in counts {
            stats.total_posts += count;
            match status {
                PostStatus::Published => stats.published_posts = count,
                PostStatus::Draft => stats.draft_posts = count,
                PostStatus::Scheduled => stats.scheduled_posts = count,
            }
        }

        stats.total_views =
            sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(views_count), 0) FROM posts")
                .fetch_one(&self.pool)
                .await?;

        Ok(stats)
    }
}
