use crate::db::DashboardStats;
use crate::models::{
    Achievement, Category, Education, Experience, Post, PostStatus, Profile, Project, Skill, Tag,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// DTOs define the JSON exchanged with clients, kept separate from the row
// models so the wire contract stays stable as the schema moves.

fn default_post_status() -> PostStatus {
    PostStatus::Draft
}

// ============================================================================
// Auth DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginDto {
    #[validate(length(min = 3, max = 80, message = "Username must be 3 to 80 characters"))]
    pub username: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// `?next=` carries the admin page to return to after a successful login.
#[derive(Debug, Deserialize, Default)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponseDto {
    pub status: String,
    pub access_token: String,
    pub username: String,
    pub redirect: String,
}

/// Generic success envelope.
#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

// ============================================================================
// Taxonomy DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl CategoryDto {
    pub fn from_model(category: &Category) -> Self {
        CategoryDto {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TagDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl TagDto {
    pub fn from_model(tag: &Tag) -> Self {
        TagDto {
            id: tag.id,
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        }
    }
}

#[derive(Validate, Debug, Deserialize)]
pub struct SaveCategoryDto {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(max = 100))]
    pub slug: Option<String>,

    pub description: Option<String>,
}

#[derive(Validate, Debug, Deserialize)]
pub struct SaveTagDto {
    #[validate(length(min = 1, max = 50, message = "Name is required"))]
    pub name: String,

    #[validate(length(max = 50))]
    pub slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponseDto {
    pub status: String,
    pub data: CategoryDto,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponseDto {
    pub status: String,
    pub data: Vec<CategoryDto>,
}

#[derive(Debug, Serialize)]
pub struct TagResponseDto {
    pub status: String,
    pub data: TagDto,
}

#[derive(Debug, Serialize)]
pub struct TagListResponseDto {
    pub status: String,
    pub data: Vec<TagDto>,
}

// ============================================================================
// Public blog DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct PostListQuery {
    #[validate(range(min = 1))]
    pub page: Option<i64>,

    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1))]
    pub page: Option<i64>,
}

/// `?prev=` names the slug of a preceding post in a narrative sequence,
/// overriding the post's stored reference.
#[derive(Debug, Deserialize, Default)]
pub struct PostDetailQuery {
    pub prev: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationDto {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PaginationDto {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        PaginationDto {
            page,
            limit,
            total,
            total_pages: (total as f64 / limit as f64).ceil() as i64,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostSummaryDto {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    #[serde(rename = "featuredImage")]
    pub featured_image: Option<String>,
    pub category: Option<CategoryDto>,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(rename = "createdDate")]
    pub created_date: DateTime<Utc>,
    #[serde(rename = "viewsCount")]
    pub views_count: i64,
    #[serde(rename = "readingTimeMinutes")]
    pub reading_time_minutes: i64,
}

impl PostSummaryDto {
    pub fn from_post(post: &Post, category: Option<&Category>) -> Self {
        PostSummaryDto {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            featured_image: post.featured_image.clone(),
            category: category.map(CategoryDto::from_model),
            published_date: post.published_date,
            created_date: post.created_date,
            views_count: post.views_count,
            reading_time_minutes: post.reading_time_minutes(),
        }
    }
}

/// Minimal link to another post (previous-post navigation).
#[derive(Debug, Serialize, Deserialize)]
pub struct PostLinkDto {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

impl PostLinkDto {
    pub fn from_post(post: &Post) -> Self {
        PostLinkDto {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponseDto {
    pub status: String,
    pub data: Vec<PostSummaryDto>,
    pub pagination: PaginationDto,
    pub category: Option<CategoryDto>,
    pub tag: Option<TagDto>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailDto {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(rename = "featuredImage")]
    pub featured_image: Option<String>,
    #[serde(rename = "videoUrl")]
    pub video_url: Option<String>,
    #[serde(rename = "videoFile")]
    pub video_file: Option<String>,
    #[serde(rename = "videoEmbedUrl")]
    pub video_embed_url: Option<String>,
    pub category: Option<CategoryDto>,
    pub tags: Vec<TagDto>,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(rename = "createdDate")]
    pub created_date: DateTime<Utc>,
    #[serde(rename = "updatedDate")]
    pub updated_date: DateTime<Utc>,
    #[serde(rename = "viewsCount")]
    pub views_count: i64,
    #[serde(rename = "readingTimeMinutes")]
    pub reading_time_minutes: i64,
    #[serde(rename = "metaDescription")]
    pub meta_description: Option<String>,
    #[serde(rename = "metaKeywords")]
    pub meta_keywords: Option<String>,
    #[serde(rename = "previousPost")]
    pub previous_post: Option<PostLinkDto>,
    #[serde(rename = "relatedPosts")]
    pub related_posts: Vec<PostSummaryDto>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponseDto {
    pub status: String,
    pub data: PostDetailDto,
}

// ============================================================================
// Admin post DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct AdminPostListQuery {
    #[validate(range(min = 1))]
    pub page: Option<i64>,

    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Create/update payload for a post. `scheduled_date` and `published_date`
/// are raw editor strings; the lifecycle resolution decides what actually
/// gets stored.
#[derive(Debug, Deserialize, Validate)]
pub struct SavePostDto {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,

    #[validate(length(max = 200))]
    pub slug: Option<String>,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    #[validate(length(max = 500))]
    pub excerpt: Option<String>,

    pub featured_image: Option<String>,
    pub video_url: Option<String>,
    pub video_file: Option<String>,
    pub category_id: Option<i64>,
    pub previous_post_id: Option<i64>,

    /// Comma-separated tag names, created on demand.
    pub tags: Option<String>,

    #[serde(default = "default_post_status")]
    pub status: PostStatus,

    pub published_date: Option<String>,
    pub scheduled_date: Option<String>,

    #[validate(range(min = 0, message = "Views count cannot be negative"))]
    pub views_count: Option<i64>,

    #[validate(length(max = 160))]
    pub meta_description: Option<String>,

    #[validate(length(max = 255))]
    pub meta_keywords: Option<String>,
}

impl SavePostDto {
    /// Tag names split out of the comma-separated field.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct AdminPostDto {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(rename = "featuredImage")]
    pub featured_image: Option<String>,
    #[serde(rename = "videoUrl")]
    pub video_url: Option<String>,
    #[serde(rename = "videoFile")]
    pub video_file: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<i64>,
    #[serde(rename = "previousPostId")]
    pub previous_post_id: Option<i64>,
    pub status: PostStatus,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(rename = "createdDate")]
    pub created_date: DateTime<Utc>,
    #[serde(rename = "updatedDate")]
    pub updated_date: DateTime<Utc>,
    #[serde(rename = "viewsCount")]
    pub views_count: i64,
    #[serde(rename = "metaDescription")]
    pub meta_description: Option<String>,
    #[serde(rename = "metaKeywords")]
    pub meta_keywords: Option<String>,
    pub tags: Vec<TagDto>,
}

impl AdminPostDto {
    pub fn from_post(post: &Post, tags: Vec<TagDto>) -> Self {
        AdminPostDto {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone(),
            featured_image: post.featured_image.clone(),
            video_url: post.video_url.clone(),
            video_file: post.video_file.clone(),
            category_id: post.category_id,
            previous_post_id: post.previous_post_id,
            status: post.status,
            published_date: post.published_date,
            created_date: post.created_date,
            updated_date: post.updated_date,
            views_count: post.views_count,
            meta_description: post.meta_description.clone(),
            meta_keywords: post.meta_keywords.clone(),
            tags,
        }
    }
}

/// Post save response; `warning` reports a scheduling downgrade.
#[derive(Debug, Serialize)]
pub struct SavePostResponseDto {
    pub status: String,
    pub data: AdminPostDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminPostSummaryDto {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    #[serde(rename = "viewsCount")]
    pub views_count: i64,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(rename = "createdDate")]
    pub created_date: DateTime<Utc>,
    #[serde(rename = "updatedDate")]
    pub updated_date: DateTime<Utc>,
}

impl AdminPostSummaryDto {
    pub fn from_post(post: &Post) -> Self {
        AdminPostSummaryDto {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            status: post.status,
            views_count: post.views_count,
            published_date: post.published_date,
            created_date: post.created_date,
            updated_date: post.updated_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminPostListResponseDto {
    pub status: String,
    pub data: Vec<AdminPostSummaryDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponseDto {
    pub status: String,
    pub data: DashboardStats,
}

#[derive(Serialize)]
pub struct UploadResponseDto {
    pub status: String,
    pub filename: String,
    pub location: String,
}

// ============================================================================
// Portfolio DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProfileDto {
    pub name: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "profileImage")]
    pub profile_image: Option<String>,
    #[serde(rename = "linkedinUrl")]
    pub linkedin_url: Option<String>,
    #[serde(rename = "githubUrl")]
    pub github_url: Option<String>,
    #[serde(rename = "websiteUrl")]
    pub website_url: Option<String>,
    #[serde(rename = "resumeFile")]
    pub resume_file: Option<String>,
}

impl ProfileDto {
    pub fn from_model(profile: &Profile) -> Self {
        ProfileDto {
            name: profile.name.clone(),
            title: profile.title.clone(),
            bio: profile.bio.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            location: profile.location.clone(),
            profile_image: profile.profile_image.clone(),
            linkedin_url: profile.linkedin_url.clone(),
            github_url: profile.github_url.clone(),
            website_url: profile.website_url.clone(),
            resume_file: profile.resume_file.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillDto {
    pub id: i64,
    pub name: String,
    pub category: String,
    #[serde(rename = "proficiencyLevel")]
    pub proficiency_level: i64,
}

/// Skills bucketed under their display category, in category order.
#[derive(Debug, Serialize)]
pub struct SkillGroupDto {
    pub category: String,
    pub skills: Vec<SkillDto>,
}

impl SkillGroupDto {
    /// Group an already category-ordered skill list, preserving encounter
    /// order of the categories.
    pub fn group(skills: &[Skill]) -> Vec<SkillGroupDto> {
        let mut groups: Vec<SkillGroupDto> = Vec::new();

        for skill in skills {
            let display = Skill::category_display(&skill.category).to_string();
            let dto = SkillDto {
                id: skill.id,
                name: skill.name.clone(),
                category: skill.category.clone(),
                proficiency_level: skill.proficiency_level,
            };

            match groups.last_mut() {
                Some(group) if group.category == display => group.skills.push(dto),
                _ => groups.push(SkillGroupDto {
                    category: display,
                    skills: vec![dto],
                }),
            }
        }

        groups
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "githubUrl")]
    pub github_url: Option<String>,
    pub technologies: Vec<String>,
    pub date: Option<NaiveDate>,
    pub featured: bool,
}

impl ProjectDto {
    pub fn from_model(project: &Project) -> Self {
        ProjectDto {
            id: project.id,
            title: project.title.clone(),
            description: project.description.clone(),
            image: project.image.clone(),
            url: project.url.clone(),
            github_url: project.github_url.clone(),
            technologies: project.technologies_list(),
            date: project.date,
            featured: project.featured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeResponseDto {
    pub status: String,
    pub profile: Option<ProfileDto>,
    #[serde(rename = "featuredProjects")]
    pub featured_projects: Vec<ProjectDto>,
    #[serde(rename = "skillsByCategory")]
    pub skills_by_category: Vec<SkillGroupDto>,
}

#[derive(Debug, Serialize)]
pub struct ResumeResponseDto {
    pub status: String,
    pub profile: Option<ProfileDto>,
    pub educations: Vec<Education>,
    pub experiences: Vec<Experience>,
    #[serde(rename = "skillsByCategory")]
    pub skills_by_category: Vec<SkillGroupDto>,
    pub projects: Vec<ProjectDto>,
    pub certifications: Vec<Achievement>,
    pub achievements: Vec<Achievement>,
    #[serde(rename = "freelanceWork")]
    pub freelance_work: Vec<ProjectDto>,
}

#[derive(Validate, Debug, Deserialize)]
pub struct ContactDto {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,

    #[validate(
        length(max = 120),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,

    #[validate(length(min = 10, max = 2000, message = "Message must be 10 to 2000 characters"))]
    pub message: String,
}

// ============================================================================
// Payment DTOs
// ============================================================================

#[derive(Validate, Debug, Deserialize)]
pub struct CreateOrderDto {
    pub course_id: i64,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResponseDto {
    pub status: String,
    #[serde(rename = "orderId")]
    pub order_id: String,
    /// Amount in minor currency units, as the gateway expects.
    pub amount: i64,
    pub currency: String,
    #[serde(rename = "keyId")]
    pub key_id: String,
}

#[derive(Validate, Debug, Deserialize)]
pub struct VerifyPaymentDto {
    #[validate(length(min = 1, message = "Order id is required"))]
    pub order_id: String,

    #[validate(length(min = 1, message = "Payment id is required"))]
    pub payment_id: String,

    #[validate(length(min = 1, message = "Signature is required"))]
    pub signature: String,

    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPaymentResponseDto {
    pub status: String,
    pub message: String,
    pub email: String,
}

#[derive(Validate, Debug, Deserialize)]
pub struct CheckSubscriptionDto {
    pub course_id: i64,

    /// Optional; falls back to the email bound by the verify-time cookie.
    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckSubscriptionResponseDto {
    pub status: String,
    pub subscribed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_total_pages_up() {
        let pagination = PaginationDto::new(1, 6, 13);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(PaginationDto::new(1, 6, 0).total_pages, 0);
    }

    #[test]
    fn tag_names_split_and_skip_blanks() {
        let dto = SavePostDto {
            title: "t".to_string(),
            slug: None,
            content: "c".to_string(),
            excerpt: None,
            featured_image: None,
            video_url: None,
            video_file: None,
            category_id: None,
            previous_post_id: None,
            tags: Some(" rust, , web ,rust-web".to_string()),
            status: PostStatus::Draft,
            published_date: None,
            scheduled_date: None,
            views_count: None,
            meta_description: None,
            meta_keywords: None,
        };
        assert_eq!(dto.tag_names(), vec!["rust", "web", "rust-web"]);
    }

    #[test]
    fn skills_group_in_category_order() {
        let skill = |id: i64, name: &str, category: &str| Skill {
            id,
            profile_id: 1,
            name: name.to_string(),
            category: category.to_string(),
            proficiency_level: 50,
            sort_order: 0,
        };

        let groups = SkillGroupDto::group(&[
            skill(1, "SQLite", "database"),
            skill(2, "Axum", "framework"),
            skill(3, "Rust", "programming"),
        ]);

        let names: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(
            names,
            vec!["Databases", "Frameworks & Libraries", "Programming Languages"]
        );
        assert_eq!(groups[0].skills[0].name, "SQLite");
    }
}
