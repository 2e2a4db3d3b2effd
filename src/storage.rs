use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::Config;
use crate::error::HttpError;

const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const ALLOWED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi"];
const ALLOWED_RESUME_EXTENSIONS: &[&str] = &["pdf"];

/// The three type-segregated upload stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
    Resume,
}

impl FileKind {
    /// Map the `{file_type}` path segment of the public serving route.
    pub fn from_route(segment: &str) -> Option<FileKind> {
        match segment {
            "images" => Some(FileKind::Image),
            "videos" => Some(FileKind::Video),
            "resumes" => Some(FileKind::Resume),
            _ => None,
        }
    }

    /// Map the upload form's `type` value.
    pub fn from_upload_type(value: &str) -> Option<FileKind> {
        match value {
            "image" => Some(FileKind::Image),
            "video" => Some(FileKind::Video),
            "resume" => Some(FileKind::Resume),
            _ => None,
        }
    }

    pub fn route_segment(&self) -> &'static str {
        match self {
            FileKind::Image => "images",
            FileKind::Video => "videos",
            FileKind::Resume => "resumes",
        }
    }

    fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::Image => ALLOWED_IMAGE_EXTENSIONS,
            FileKind::Video => ALLOWED_VIDEO_EXTENSIONS,
            FileKind::Resume => ALLOWED_RESUME_EXTENSIONS,
        }
    }

    pub fn dir(&self, config: &Config) -> PathBuf {
        config.upload_dir.join(self.route_segment())
    }
}

/// Strip a client-supplied filename down to a safe basename: path
/// separators and anything outside `[A-Za-z0-9._-]` become underscores.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Whether `filename` carries an extension this store accepts.
pub fn is_allowed(kind: FileKind, filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| kind.allowed_extensions().contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Content type for serving, keyed by extension.
pub fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub fn is_pdf(filename: &str) -> bool {
    extension_of(filename).as_deref() == Some("pdf")
}

/// Create the per-kind upload directories. Called once at startup.
pub fn ensure_upload_dirs(config: &Config) -> std::io::Result<()> {
    for kind in [FileKind::Image, FileKind::Video, FileKind::Resume] {
        std::fs::create_dir_all(kind.dir(config))?;
    }
    Ok(())
}

/// Persist an uploaded file and return the stored filename.
///
/// The stored name is the sanitized original prefixed with a timestamp, so
/// repeated uploads of the same file never collide.
pub async fn save_upload(
    config: &Config,
    kind: FileKind,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, HttpError> {
    let safe_name = sanitize_filename(original_name);
    if !is_allowed(kind, &safe_name) {
        return Err(HttpError::bad_request(format!(
            "File type not allowed for {} uploads",
            kind.route_segment()
        )));
    }

    let stored_name = format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), safe_name);
    let dir = kind.dir(config);

    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        tracing::error!("Failed to create upload dir {:?}: {}", dir, e);
        HttpError::server_error("Failed to store uploaded file")
    })?;

    let path = dir.join(&stored_name);
    tokio::fs::write(&path, bytes).await.map_err(|e| {
        tracing::error!("Failed to write upload {:?}: {}", path, e);
        HttpError::server_error("Failed to store uploaded file")
    })?;

    Ok(stored_name)
}

/// Best-effort removal of a stored file; returns whether a file was deleted.
/// Missing files and IO errors are logged, never propagated — deletion is a
/// cleanup side effect, not part of the caller's contract.
pub async fn delete_upload(config: &Config, kind: FileKind, filename: &str) -> bool {
    let safe_name = sanitize_filename(filename);
    if safe_name.is_empty() {
        return false;
    }

    let path = kind.dir(config).join(&safe_name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!("Failed to delete upload {:?}: {}", path, e);
            false
        }
    }
}

/// Resolve a stored file for serving. Returns the full path only when the
/// sanitized name matches the request exactly, which rules out traversal.
pub fn resolve_upload(config: &Config, kind: FileKind, filename: &str) -> Option<PathBuf> {
    if sanitize_filename(filename) != filename || filename.is_empty() {
        return None;
    }
    Some(kind.dir(config).join(filename))
}

/// Does the resolved path point at an existing regular file?
pub async fn upload_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("a/b\\c.png"), "c.png");
    }

    #[test]
    fn sanitize_replaces_odd_characters() {
        assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
    }

    #[test]
    fn extension_allow_lists_are_per_kind() {
        assert!(is_allowed(FileKind::Image, "photo.PNG"));
        assert!(!is_allowed(FileKind::Image, "clip.mp4"));
        assert!(is_allowed(FileKind::Video, "clip.mp4"));
        assert!(is_allowed(FileKind::Resume, "cv.pdf"));
        assert!(!is_allowed(FileKind::Resume, "cv.docx"));
        assert!(!is_allowed(FileKind::Image, "no-extension"));
    }

    #[test]
    fn traversal_names_do_not_resolve() {
        let config = test_config();
        assert!(resolve_upload(&config, FileKind::Image, "../secret.png").is_none());
        assert!(resolve_upload(&config, FileKind::Image, "").is_none());
        assert!(resolve_upload(&config, FileKind::Image, "ok.png").is_some());
    }

    #[test]
    fn route_segments_round_trip() {
        for kind in [FileKind::Image, FileKind::Video, FileKind::Resume] {
            assert_eq!(FileKind::from_route(kind.route_segment()), Some(kind));
        }
        assert_eq!(FileKind::from_route("archives"), None);
    }

    fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test".to_string(),
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

    #[tokio::test]
    async fn save_and_delete_round_trip() {
        let config = test_config();
        let stored = save_upload(&config, FileKind::Image, "pic.png", b"bytes")
            .await
            .unwrap();
        assert!(stored.ends_with("_pic.png"));

        let path = resolve_upload(&config, FileKind::Image, &stored).unwrap();
        assert!(upload_exists(&path).await);

        assert!(delete_upload(&config, FileKind::Image, &stored).await);
        assert!(!upload_exists(&path).await);
    }

    #[tokio::test]
    async fn disallowed_extension_is_rejected() {
        let config = test_config();
        let result = save_upload(&config, FileKind::Image, "script.sh", b"#!/bin/sh").await;
        assert!(result.is_err());
    }
}
