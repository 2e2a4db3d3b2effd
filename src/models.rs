use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// Publication state of a blog post.
///
/// Stored as lowercase TEXT in the `posts.status` column. A post is publicly
/// visible only in the `Published` state; `Scheduled` holds a future
/// `published_date` until the auto-publish sweep flips it.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Scheduled,
}

impl PostStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
        }
    }
}

/// Outcome state of a course-payment attempt.
///
/// `Pending` rows are created at order time and move to `Completed` only
/// after the gateway signature verifies, or to `Failed` on a mismatch.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Completed,
    Failed,
}

impl SubscriptionStatus {
    pub fn to_str(&self) -> &str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Completed => "completed",
            SubscriptionStatus::Failed => "failed",
        }
    }
}

/// Admin account. Exactly one is expected in normal operation (seeded on
/// first run), though nothing in the schema enforces that.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Blog post row. `slug` is unique and auto-derived from the title when the
/// editor leaves it blank. `previous_post_id` is an optional self-reference
/// used by narrative post sequences.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Post {
    pub id: i64,
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
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub views_count: i64,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
}

impl Post {
    /// Estimated reading time in minutes at 200 words per minute, never
    /// reported as zero.
    pub fn reading_time_minutes(&self) -> i64 {
        let words = self.content.split_whitespace().count() as f64;
        ((words / 200.0).round() as i64).max(1)
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Personal profile. Owns the resume child rows (educations, experiences,
/// skills, projects, achievements), which cascade on deletion.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub website_url: Option<String>,
    pub resume_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Education {
    pub id: i64,
    pub profile_id: i64,
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Experience {
    pub id: i64,
    pub profile_id: i64,
    pub company: String,
    pub position: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Skill {
    pub id: i64,
    pub profile_id: i64,
    pub name: String,
    pub category: String,
    pub proficiency_level: i64,
    pub sort_order: i64,
}

impl Skill {
    /// Human-readable label for a skill category key. Unknown keys fall back
    /// to the raw key, matching how grouped views render them.
    pub fn category_display(category: &str) -> &str {
        match category {
            "programming" => "Programming Languages",
            "framework" => "Frameworks & Libraries",
            "database" => "Databases",
            "tools" => "Tools & Technologies",
            "soft" => "Soft Skills",
            "other" => "Other",
            other => other,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Project {
    pub id: i64,
    pub profile_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub github_url: Option<String>,
    pub technologies: Option<String>,
    pub date: Option<NaiveDate>,
    pub featured: bool,
    pub sort_order: i64,
}

impl Project {
    /// Comma-separated `technologies` column split into trimmed entries.
    pub fn technologies_list(&self) -> Vec<String> {
        self.technologies
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Awards and certifications share one table; rows with `sort_order < 10`
/// render as certifications, the rest as achievements.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Achievement {
    pub id: i64,
    pub profile_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub issuer: Option<String>,
    pub certificate_url: Option<String>,
    pub sort_order: i64,
}

/// Purchasable course. `price` is in base currency units; the gateway amount
/// is derived from it in minor units at order time.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
}

/// One course-purchase attempt. A new row is created per gateway order, so
/// repeated attempts for the same (course, email) pair coexist.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct CourseSubscription {
    pub id: i64,
    pub course_id: i64,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_with_content(content: &str) -> Post {
        Post {
            id: 1,
            title: "t".to_string(),
            slug: "t".to_string(),
            author_id: 1,
            content: content.to_string(),
            excerpt: None,
            featured_image: None,
            video_url: None,
            video_file: None,
            category_id: None,
            previous_post_id: None,
            status: PostStatus::Published,
            published_date: Some(Utc::now()),
            created_date: Utc::now(),
            updated_date: Utc::now(),
            views_count: 0,
            meta_description: None,
            meta_keywords: None,
        }
    }

    #[test]
    fn reading_time_has_a_floor_of_one_minute() {
        let post = post_with_content("just a few words");
        assert_eq!(post.reading_time_minutes(), 1);
    }

    #[test]
    fn reading_time_rounds_word_count() {
        let content = vec!["word"; 600].join(" ");
        let post = post_with_content(&content);
        assert_eq!(post.reading_time_minutes(), 3);
    }

    #[test]
    fn technologies_list_splits_and_trims() {
        let project = Project {
            id: 1,
            profile_id: 1,
            title: "p".to_string(),
            description: None,
            image: None,
            url: None,
            github_url: None,
            technologies: Some("Rust, Axum , SQLite".to_string()),
            date: None,
            featured: false,
            sort_order: 0,
        };
        assert_eq!(project.technologies_list(), vec!["Rust", "Axum", "SQLite"]);
    }
}
