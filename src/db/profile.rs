use super::DBClient;
use crate::models::{Achievement, Education, Experience, Profile, Project, Skill};

/// Read side of the resume data. Each list comes back in its final display
/// order; the multi-key ORDER BY clauses define a single total order, so no
/// secondary in-memory sorting happens in the handlers.
pub trait ProfileExt {
    async fn get_profile(&self) -> Result<Option<Profile>, sqlx::Error>;

    /// Most recent / highest ranked education first.
    async fn list_educations(&self) -> Result<Vec<Education>, sqlx::Error>;

    /// Current positions first, then by recency.
    async fn list_experiences(&self) -> Result<Vec<Experience>, sqlx::Error>;

    /// Grouped-ready ordering: category, then rank, then name.
    async fn list_skills(&self) -> Result<Vec<Skill>, sqlx::Error>;

    async fn list_projects(&self) -> Result<Vec<Project>, sqlx::Error>;

    /// Up to `limit` homepage-featured projects, newest first.
    async fn list_featured_projects(&self, limit: i64) -> Result<Vec<Project>, sqlx::Error>;

    /// Certification/achievement split happens at the call site on
    /// `sort_order`; this returns the whole ranked list.
    async fn list_achievements(&self) -> Result<Vec<Achievement>, sqlx::Error>;
}

impl ProfileExt for DBClient {
    async fn get_profile(&self) -> Result<Option<Profile>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            "SELECT id, name, title, bio, email, phone, location, profile_image, \
                 linkedin_url, github_url, website_url, resume_file, created_at, updated_at \
             FROM profiles ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_educations(&self) -> Result<Vec<Education>, sqlx::Error> {
        sqlx::query_as::<_, Education>(
            "SELECT id, profile_id, institution, degree, field, start_date, end_date, \
                 description, sort_order \
             FROM educations \
             ORDER BY sort_order DESC, start_date DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn list_experiences(&self) -> Result<Vec<Experience>, sqlx::Error> {
        sqlx::query_as::<_, Experience>(
            "SELECT id, profile_id, company, position, start_date, end_date, current, \
                 description, sort_order \
             FROM experiences \
             ORDER BY current DESC, start_date DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, sqlx::Error> {
        sqlx::query_as::<_, Skill>(
            "SELECT id, profile_id, name, category, proficiency_level, sort_order \
             FROM skills \
             ORDER BY category, sort_order, name",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT id, profile_id, title, description, image, url, github_url, \
                 technologies, date, featured, sort_order \
             FROM projects \
             ORDER BY date DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn list_featured_projects(&self, limit: i64) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT id, profile_id, title, description, image, url, github_url, \
                 technologies, date, featured, sort_order \
             FROM projects \
             WHERE featured = 1 \
             ORDER BY date DESC \
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_achievements(&self) -> Result<Vec<Achievement>, sqlx::Error> {
        sqlx::query_as::<_, Achievement>(
            "SELECT id, profile_id, title, description, date, issuer, certificate_url, \
                 sort_order \
             FROM achievements \
             ORDER BY sort_order ASC, date DESC",
        )
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use chrono::NaiveDate;

    async fn seed_profile(client: &DBClient) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO profiles (name, email, created_at, updated_at) \
             VALUES ('Ada', 'ada@example.com', ?1, ?1) RETURNING id",
        )
        .bind(chrono::Utc::now())
        .fetch_one(&client.pool)
        .await
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn experiences_order_current_first_then_recency() {
        let client = connect_in_memory().await;
        let profile_id = seed_profile(&client).await;

        for (company, start, current) in [
            ("Old Corp", "2015-01-01", false),
            ("Now Inc", "2019-05-01", true),
            ("Later Ltd", "2021-03-01", false),
        ] {
            sqlx::query(
                "INSERT INTO experiences (profile_id, company, position, start_date, current) \
                 VALUES (?1, ?2, 'Engineer', ?3, ?4)",
            )
            .bind(profile_id)
            .bind(company)
            .bind(date(start))
            .bind(current)
            .execute(&client.pool)
            .await
            .unwrap();
        }

        let companies: Vec<String> = client
            .list_experiences()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.company)
            .collect();
        assert_eq!(companies, vec!["Now Inc", "Later Ltd", "Old Corp"]);
    }

    #[tokio::test]
    async fn featured_projects_are_capped_and_newest_first() {
        let client = connect_in_memory().await;
        let profile_id = seed_profile(&client).await;

        for (title, when, featured) in [
            ("A", "2020-01-01", true),
            ("B", "2022-01-01", true),
            ("C", "2023-01-01", true),
            ("D", "2024-01-01", true),
            ("Plain", "2025-01-01", false),
        ] {
            sqlx::query(
                "INSERT INTO projects (profile_id, title, date, featured) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(profile_id)
            .bind(title)
            .bind(date(when))
            .bind(featured)
            .execute(&client.pool)
            .await
            .unwrap();
        }

        let titles: Vec<String> = client
            .list_featured_projects(3)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["D", "C", "B"]);
    }

    #[tokio::test]
    async fn deleting_a_profile_cascades_to_children() {
        let client = connect_in_memory().await;
        let profile_id = seed_profile(&client).await;

        sqlx::query(
            "INSERT INTO skills (profile_id, name, category) VALUES (?1, 'Rust', 'programming')",
        )
        .bind(profile_id)
        .execute(&client.pool)
        .await
        .unwrap();

        sqlx::query("DELETE FROM profiles WHERE id = ?1")
            .bind(profile_id)
            .execute(&client.pool)
            .await
            .unwrap();

        assert!(client.list_skills().await.unwrap().is_empty());
    }
}
