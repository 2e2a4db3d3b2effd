use chrono::{DateTime, NaiveDateTime, Utc};

use crate::models::PostStatus;

/// Datetime format accepted from the post editor for scheduled and explicit
/// publish dates.
const EDITOR_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why a requested `scheduled` status was downgraded to `draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleWarning {
    PastScheduledDate,
    InvalidScheduledDate,
}

impl ScheduleWarning {
    pub fn message(&self) -> &'static str {
        match self {
            ScheduleWarning::PastScheduledDate => {
                "Scheduled date must be in the future. Post saved as draft."
            }
            ScheduleWarning::InvalidScheduledDate => {
                "Invalid scheduled date format. Post saved as draft."
            }
        }
    }
}

/// Status and publish date to persist for a post save.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedPublication {
    pub status: PostStatus,
    pub published_date: Option<DateTime<Utc>>,
    pub warning: Option<ScheduleWarning>,
}

fn parse_editor_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), EDITOR_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Resolve the editor's requested status and raw date inputs into what the
/// store will actually hold.
///
/// Rules:
/// - `scheduled` needs a parsable date strictly after `now`; a past, missing
///   or unparsable date downgrades the save to `draft` and reports a warning
///   instead of failing it. A `scheduled` row is therefore never persisted
///   without a future `published_date`.
/// - `published` takes an explicit parsable date as an override, otherwise
///   keeps the post's existing date, otherwise stamps `now` — so a published
///   row always has a `published_date`.
/// - `draft` leaves the existing date untouched.
pub fn resolve_publication(
    requested: PostStatus,
    scheduled_date: Option<&str>,
    published_date: Option<&str>,
    existing_published_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ResolvedPublication {
    match requested {
        PostStatus::Scheduled => {
            let parsed = scheduled_date
                .filter(|raw| !raw.trim().is_empty())
                .map(parse_editor_date);

            match parsed {
                Some(Some(when)) if when > now => ResolvedPublication {
                    status: PostStatus::Scheduled,
                    published_date: Some(when),
                    warning: None,
                },
                Some(Some(_)) => ResolvedPublication {
                    status: PostStatus::Draft,
                    published_date: existing_published_date,
                    warning: Some(ScheduleWarning::PastScheduledDate),
                },
                // Unparsable or absent: the post cannot sit in `scheduled`
                // with no usable date, so it degrades the same way.
                Some(None) | None => ResolvedPublication {
                    status: PostStatus::Draft,
                    published_date: existing_published_date,
                    warning: Some(ScheduleWarning::InvalidScheduledDate),
                },
            }
        }
        PostStatus::Published => {
            let date = published_date
                .and_then(parse_editor_date)
                .or(existing_published_date)
                .unwrap_or(now);
            ResolvedPublication {
                status: PostStatus::Published,
                published_date: Some(date),
                warning: None,
            }
        }
        PostStatus::Draft => ResolvedPublication {
            status: PostStatus::Draft,
            published_date: existing_published_date,
            warning: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn future_scheduled_date_is_accepted() {
        let now = at("2026-01-01 12:00:00");
        let resolved = resolve_publication(
            PostStatus::Scheduled,
            Some("2026-01-02 09:30:00"),
            None,
            None,
            now,
        );
        assert_eq!(resolved.status, PostStatus::Scheduled);
        assert_eq!(resolved.published_date, Some(at("2026-01-02 09:30:00")));
        assert!(resolved.warning.is_none());
    }

    #[test]
    fn past_scheduled_date_downgrades_to_draft() {
        let now = at("2026-01-01 12:00:00");
        let resolved = resolve_publication(
            PostStatus::Scheduled,
            Some("2025-12-31 23:59:59"),
            None,
            None,
            now,
        );
        assert_eq!(resolved.status, PostStatus::Draft);
        assert_eq!(resolved.warning, Some(ScheduleWarning::PastScheduledDate));
    }

    #[test]
    fn scheduled_date_equal_to_now_is_not_future() {
        let now = at("2026-01-01 12:00:00");
        let resolved = resolve_publication(
            PostStatus::Scheduled,
            Some("2026-01-01 12:00:00"),
            None,
            None,
            now,
        );
        assert_eq!(resolved.status, PostStatus::Draft);
        assert_eq!(resolved.warning, Some(ScheduleWarning::PastScheduledDate));
    }

    #[test]
    fn garbage_scheduled_date_downgrades_to_draft() {
        let now = at("2026-01-01 12:00:00");
        let resolved =
            resolve_publication(PostStatus::Scheduled, Some("next tuesday"), None, None, now);
        assert_eq!(resolved.status, PostStatus::Draft);
        assert_eq!(
            resolved.warning,
            Some(ScheduleWarning::InvalidScheduledDate)
        );
    }

    #[test]
    fn missing_scheduled_date_downgrades_to_draft() {
        let now = at("2026-01-01 12:00:00");
        let resolved = resolve_publication(PostStatus::Scheduled, None, None, None, now);
        assert_eq!(resolved.status, PostStatus::Draft);
        assert_eq!(
            resolved.warning,
            Some(ScheduleWarning::InvalidScheduledDate)
        );
    }

    #[test]
    fn publishing_without_a_date_stamps_now() {
        let now = at("2026-01-01 12:00:00");
        let resolved = resolve_publication(PostStatus::Published, None, None, None, now);
        assert_eq!(resolved.status, PostStatus::Published);
        assert_eq!(resolved.published_date, Some(now));
    }

    #[test]
    fn publishing_keeps_an_existing_date() {
        let now = at("2026-01-01 12:00:00");
        let original = at("2025-06-15 08:00:00");
        let resolved = resolve_publication(PostStatus::Published, None, None, Some(original), now);
        assert_eq!(resolved.published_date, Some(original));
    }

    #[test]
    fn publishing_accepts_an_explicit_override() {
        let now = at("2026-01-01 12:00:00");
        let original = at("2025-06-15 08:00:00");
        let resolved = resolve_publication(
            PostStatus::Published,
            None,
            Some("2025-01-01 00:00:00"),
            Some(original),
            now,
        );
        assert_eq!(resolved.published_date, Some(at("2025-01-01 00:00:00")));
    }

    #[test]
    fn draft_leaves_dates_alone() {
        let now = at("2026-01-01 12:00:00");
        let original = at("2025-06-15 08:00:00");
        let resolved = resolve_publication(PostStatus::Draft, None, None, Some(original), now);
        assert_eq!(resolved.status, PostStatus::Draft);
        assert_eq!(resolved.published_date, Some(original));
        assert!(resolved.warning.is_none());
    }
}
