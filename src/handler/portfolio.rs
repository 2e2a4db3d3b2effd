use axum::Router;
use axum::extract::{Json, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use validator::Validate;

use crate::AppState;
use crate::db::ProfileExt;
use crate::dtos::{
    ContactDto, HomeResponseDto, ProfileDto, ProjectDto, ResumeResponseDto, SkillGroupDto,
};
use crate::error::HttpError;
use crate::models::Skill;
use crate::storage::{self, FileKind};
use crate::utils::mailto;

/// Achievement rows below this rank render as certifications.
const CERTIFICATION_ORDER_CUTOFF: i64 = 10;
/// How many featured projects the homepage shows.
const FEATURED_PROJECT_LIMIT: i64 = 3;

pub fn portfolio_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/resume", get(resume))
        .route("/contact", post(contact))
        .route("/download-resume", get(download_resume))
}

/// Keep only the homepage-curated skills. An empty curated list means the
/// site owner has not narrowed anything, so everything shows.
fn curate_skills(skills: Vec<Skill>, featured_names: &[String]) -> Vec<Skill> {
    if featured_names.is_empty() {
        return skills;
    }
    skills
        .into_iter()
        .filter(|s| featured_names.iter().any(|name| name == &s.name))
        .collect()
}

pub async fn home(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .db_client
        .get_profile()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let featured_projects = app_state
        .db_client
        .list_featured_projects(FEATURED_PROJECT_LIMIT)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let skills = app_state
        .db_client
        .list_skills()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    let skills = curate_skills(skills, &app_state.env.featured_skills);

    Ok(Json(HomeResponseDto {
        status: "success".to_string(),
        profile: profile.as_ref().map(ProfileDto::from_model),
        featured_projects: featured_projects.iter().map(ProjectDto::from_model).collect(),
        skills_by_category: SkillGroupDto::group(&skills),
    }))
}

pub async fn resume(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .db_client
        .get_profile()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let educations = app_state
        .db_client
        .list_educations()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let experiences = app_state
        .db_client
        .list_experiences()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let skills = app_state
        .db_client
        .list_skills()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let projects = app_state
        .db_client
        .list_projects()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let all_achievements = app_state
        .db_client
        .list_achievements()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    // One ranked list, split into certifications vs achievements at the
    // rank cutoff.
    let (certifications, achievements): (Vec<_>, Vec<_>) = all_achievements
        .into_iter()
        .partition(|a| a.sort_order < CERTIFICATION_ORDER_CUTOFF);

    // Freelance work: the non-featured projects. `projects` is already in
    // date-descending order.
    let freelance_work: Vec<ProjectDto> = projects
        .iter()
        .filter(|p| !p.featured)
        .map(ProjectDto::from_model)
        .collect();

    Ok(Json(ResumeResponseDto {
        status: "success".to_string(),
        profile: profile.as_ref().map(ProfileDto::from_model),
        educations,
        experiences,
        skills_by_category: SkillGroupDto::group(&skills),
        projects: projects.iter().map(ProjectDto::from_model).collect(),
        certifications,
        achievements,
        freelance_work,
    }))
}

/// The contact form never sends mail server-side; it answers with a redirect
/// to a `mailto:` link aimed at the profile owner, and the browser's mail
/// client takes it from there.
pub async fn contact(
    State(app_state): State<AppState>,
    Json(body): Json<ContactDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state
        .db_client
        .get_profile()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let recipient = profile
        .and_then(|p| p.email)
        .unwrap_or_else(|| "your-email@example.com".to_string());

    let link = mailto::contact_link(&recipient, &body.subject, &body.name, &body.email, &body.message);

    Ok(Redirect::to(&link))
}

/// Serve the profile's resume PDF as a download.
pub async fn download_resume(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .db_client
        .get_profile()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let filename = profile
        .and_then(|p| p.resume_file)
        .ok_or_else(|| HttpError::not_found("Resume file not found"))?;

    let path = storage::resolve_upload(&app_state.env, FileKind::Resume, &filename)
        .ok_or_else(|| HttpError::not_found("Resume file not found"))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| HttpError::not_found("Resume file not found"))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((headers, bytes))
}
