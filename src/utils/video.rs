/// Map a YouTube or Vimeo watch URL to its embeddable player URL.
///
/// Unknown providers pass through unchanged so a raw embed URL keeps
/// working.
pub fn embed_url(url: &str) -> String {
    if url.contains("youtube.com/watch") {
        let video_id = url
            .split("v=")
            .nth(1)
            .map(|rest| rest.split('&').next().unwrap_or(rest))
            .unwrap_or("");
        return format!("https://www.youtube.com/embed/{}", video_id);
    }

    if url.contains("youtu.be") {
        let video_id = url.rsplit('/').next().unwrap_or("");
        return format!("https://www.youtube.com/embed/{}", video_id);
    }

    if url.contains("vimeo.com") {
        let video_id = url.rsplit('/').next().unwrap_or("");
        return format!("https://player.vimeo.com/video/{}", video_id);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_watch_url_becomes_embed() {
        assert_eq!(
            embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn youtube_watch_url_ignores_extra_params() {
        assert_eq!(
            embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn short_youtube_url_becomes_embed() {
        assert_eq!(
            embed_url("https://youtu.be/dQw4w9WgXcQ"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn vimeo_url_becomes_player() {
        assert_eq!(
            embed_url("https://vimeo.com/123456"),
            "https://player.vimeo.com/video/123456"
        );
    }

    #[test]
    fn other_urls_pass_through() {
        let url = "https://example.com/clip.mp4";
        assert_eq!(embed_url(url), url);
    }
}
