use super::DBClient;
use crate::models::{Category, Tag};
use crate::utils::slug::slugify;
use chrono::Utc;

pub trait TaxonomyExt {
    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error>;

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, sqlx::Error>;

    /// Create a category; the slug is derived from the name when not given.
    async fn create_category(
        &self,
        name: &str,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Result<Category, sqlx::Error>;

    async fn delete_category(&self, category_id: i64) -> Result<(), sqlx::Error>;

    async fn list_tags(&self) -> Result<Vec<Tag>, sqlx::Error>;

    async fn get_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, sqlx::Error>;

    async fn create_tag(&self, name: &str, slug: Option<&str>) -> Result<Tag, sqlx::Error>;

    async fn delete_tag(&self, tag_id: i64) -> Result<(), sqlx::Error>;

    /// Find a tag by exact name or create it. The name lookup is
    /// case-sensitive; the store's unique constraint is the backstop when
    /// two concurrent edits race on the same new name.
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, sqlx::Error>;

    /// Replace a post's tag set with `names`, creating unseen tags on the
    /// way. Blank entries are skipped.
    async fn set_post_tags(&self, post_id: i64, names: &[String]) -> Result<Vec<Tag>, sqlx::Error>;

    async fn tags_for_post(&self, post_id: i64) -> Result<Vec<Tag>, sqlx::Error>;
}

impl TaxonomyExt for DBClient {
    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories WHERE slug = ?1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_category(
        &self,
        name: &str,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Result<Category, sqlx::Error> {
        let slug = match slug.filter(|s| !s.trim().is_empty()) {
            Some(explicit) => explicit.to_string(),
            None => slugify(name),
        };

        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug, description, created_at) \
             VALUES (?1, ?2, ?3, ?4) \
             RETURNING id, name, slug, description, created_at",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_category(&self, category_id: i64) -> Result<(), sqlx::Error> {
        // Posts keep existing without a category.
        sqlx::query("UPDATE posts SET category_id = NULL WHERE category_id = ?1")
            .bind(category_id)
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(category_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug, created_at FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    async fn get_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug, created_at FROM tags WHERE slug = ?1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_tag(&self, name: &str, slug: Option<&str>) -> Result<Tag, sqlx::Error> {
        let slug = match slug.filter(|s| !s.trim().is_empty()) {
            Some(explicit) => explicit.to_string(),
            None => slugify(name),
        };

        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, slug, created_at) VALUES (?1, ?2, ?3) \
             RETURNING id, name, slug, created_at",
        )
        .bind(name)
        .bind(slug)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_tag(&self, tag_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = ?1")
            .bind(tag_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, sqlx::Error> {
        let existing =
            sqlx::query_as::<_, Tag>("SELECT id, name, slug, created_at FROM tags WHERE name = ?1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        if let Some(tag) = existing {
            return Ok(tag);
        }

        match self.create_tag(name, None).await {
            Ok(tag) => Ok(tag),
            // Lost the race to another writer: the row is there now.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                sqlx::query_as::<_, Tag>(
                    "SELECT id, name, slug, created_at FROM tags WHERE name = ?1",
                )
                .bind(name)
                .fetch_one(&self.pool)
                .await
            }
            Err(e) => Err(e),
        }
    }

    async fn set_post_tags(&self, post_id: i64, names: &[String]) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query("DELETE FROM post_tags WHERE post_id = ?1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        let mut tags = Vec::new();
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let tag = self.find_or_create_tag(name).await?;
            sqlx::query(
                "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
            )
            .bind(post_id)
            .bind(tag.id)
            .execute(&self.pool)
            .await?;
            tags.push(tag);
        }

        Ok(tags)
    }

    async fn tags_for_post(&self, post_id: i64) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name, t.slug, t.created_at FROM tags t \
             INNER JOIN post_tags pt ON pt.tag_id = t.id \
             WHERE pt.post_id = ?1 \
             ORDER BY t.name",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PostExt;
    use crate::db::post::tests::{new_post, seeded_client};
    use crate::models::PostStatus;

    #[tokio::test]
    async fn category_slug_is_derived_from_name() {
        let client = seeded_client().await;
        let category = client
            .create_category("Web Development", None, Some("All things web"))
            .await
            .unwrap();
        assert_eq!(category.slug, "web-development");
    }

    #[tokio::test]
    async fn tag_upsert_is_case_sensitive_on_name() {
        let client = seeded_client().await;
        let lower = client.find_or_create_tag("rust").await.unwrap();
        let again = client.find_or_create_tag("rust").await.unwrap();
        let upper = client.find_or_create_tag("Rust").await.unwrap();

        assert_eq!(lower.id, again.id);
        assert_ne!(lower.id, upper.id);
    }

    #[tokio::test]
    async fn setting_tags_replaces_the_previous_set() {
        let client = seeded_client().await;
        let post = client
            .create_post(&new_post("Tagged", PostStatus::Draft))
            .await
            .unwrap();

        client
            .set_post_tags(post.id, &["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        client
            .set_post_tags(post.id, &["two".to_string(), "three".to_string()])
            .await
            .unwrap();

        let names: Vec<String> = client
            .tags_for_post(post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["three", "two"]);
    }

    #[tokio::test]
    async fn deleting_a_post_keeps_its_tags() {
        let client = seeded_client().await;
        let post = client
            .create_post(&new_post("Ephemeral", PostStatus::Draft))
            .await
            .unwrap();
        client
            .set_post_tags(post.id, &["keeper".to_string()])
            .await
            .unwrap();

        client.delete_post(post.id).await.unwrap();

        assert!(client.get_tag_by_slug("keeper").await.unwrap().is_some());
        let orphan_links: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post_tags WHERE post_id = ?1")
                .bind(post.id)
                .fetch_one(&client.pool)
                .await
                .unwrap();
        assert_eq!(orphan_links, 0);
    }

    #[tokio::test]
    async fn duplicate_category_slug_conflicts() {
        let client = seeded_client().await;
        client.create_category("News", None, None).await.unwrap();
        let err = client.create_category("News", None, None).await.unwrap_err();
        assert!(matches!(
            &err,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation()
        ));
    }
}
