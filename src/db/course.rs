use super::DBClient;
use crate::models::{Course, CourseSubscription};
use chrono::Utc;

const SUBSCRIPTION_COLUMNS: &str = "id, course_id, email, name, phone, order_id, payment_id, \
     payment_method, amount, currency, status, created_at, updated_at";

pub trait CourseExt {
    async fn get_course(&self, course_id: i64) -> Result<Option<Course>, sqlx::Error>;

    async fn create_course(
        &self,
        title: &str,
        description: Option<&str>,
        price: f64,
    ) -> Result<Course, sqlx::Error>;

    /// Record a new purchase attempt in `pending` state, keyed by the
    /// gateway order id. Repeated attempts for the same course and buyer
    /// create separate rows.
    async fn create_subscription(
        &self,
        course_id: i64,
        email: &str,
        name: &str,
        phone: Option<&str>,
        order_id: &str,
        amount: f64,
        currency: &str,
    ) -> Result<CourseSubscription, sqlx::Error>;

    /// Look up a subscription by its gateway order id, whatever its status.
    async fn get_subscription_by_order(
        &self,
        order_id: &str,
    ) -> Result<Option<CourseSubscription>, sqlx::Error>;

    /// Signature verified: store the payment reference and flip to
    /// `completed`.
    async fn mark_subscription_completed(
        &self,
        order_id: &str,
        payment_id: &str,
        payment_method: Option<&str>,
    ) -> Result<CourseSubscription, sqlx::Error>;

    /// Signature mismatch: flip to `failed`, leaving `payment_id` unset.
    async fn mark_subscription_failed(
        &self,
        order_id: &str,
    ) -> Result<CourseSubscription, sqlx::Error>;

    /// True iff at least one `completed` subscription exists for the exact
    /// (course, email) pair.
    async fn has_completed_subscription(
        &self,
        course_id: i64,
        email: &str,
    ) -> Result<bool, sqlx::Error>;
}

impl CourseExt for DBClient {
    async fn get_course(&self, course_id: i64) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            "SELECT id, title, description, price FROM courses WHERE id = ?1",
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_course(
        &self,
        title: &str,
        description: Option<&str>,
        price: f64,
    ) -> Result<Course, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            "INSERT INTO courses (title, description, price) VALUES (?1, ?2, ?3) \
             RETURNING id, title, description, price",
        )
        .bind(title)
        .bind(description)
        .bind(price)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_subscription(
        &self,
        course_id: i64,
        email: &str,
        name: &str,
        phone: Option<&str>,
        order_id: &str,
        amount: f64,
        currency: &str,
    ) -> Result<CourseSubscription, sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, CourseSubscription>(&format!(
            "INSERT INTO course_subscriptions \
                 (course_id, email, name, phone, order_id, amount, currency, status, \
                  created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8, ?8) \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(course_id)
        .bind(email)
        .bind(name)
        .bind(phone)
        .bind(order_id)
        .bind(amount)
        .bind(currency)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_subscription_by_order(
        &self,
        order_id: &str,
    ) -> Result<Option<CourseSubscription>, sqlx::Error> {
        sqlx::query_as::<_, CourseSubscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM course_subscriptions WHERE order_id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_subscription_completed(
        &self,
        order_id: &str,
        payment_id: &str,
        payment_method: Option<&str>,
    ) -> Result<CourseSubscription, sqlx::Error> {
        let subscription = sqlx::query_as::<_, CourseSubscription>(&format!(
            "UPDATE course_subscriptions \
             SET status = 'completed', payment_id = ?1, payment_method = ?2, updated_at = ?3 \
             WHERE order_id = ?4 \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(payment_id)
        .bind(payment_method)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        subscription.ok_or(sqlx::Error::RowNotFound)
    }

    async fn mark_subscription_failed(
        &self,
        order_id: &str,
    ) -> Result<CourseSubscription, sqlx::Error> {
        let subscription = sqlx::query_as::<_, CourseSubscription>(&format!(
            "UPDATE course_subscriptions \
             SET status = 'failed', updated_at = ?1 \
             WHERE order_id = ?2 \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        subscription.ok_or(sqlx::Error::RowNotFound)
    }

    async fn has_completed_subscription(
        &self,
        course_id: i64,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM course_subscriptions \
             WHERE course_id = ?1 AND email = ?2 AND status = 'completed'",
        )
        .bind(course_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::models::SubscriptionStatus;

    async fn client_with_course() -> (DBClient, Course) {
        let client = connect_in_memory().await;
        let course = client
            .create_course("Rust for Web", Some("From zero to production"), 499.0)
            .await
            .unwrap();
        (client, course)
    }

    #[tokio::test]
    async fn new_subscriptions_start_pending_with_base_amount() {
        let (client, course) = client_with_course().await;

        let sub = client
            .create_subscription(
                course.id,
                "buyer@example.com",
                "Buyer",
                None,
                "order_abc",
                course.price,
                "INR",
            )
            .await
            .unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Pending);
        assert_eq!(sub.amount, 499.0);
        assert_eq!(sub.currency, "INR");
        assert!(sub.payment_id.is_none());
    }

    #[tokio::test]
    async fn completion_records_the_payment_reference() {
        let (client, course) = client_with_course().await;
        client
            .create_subscription(
                course.id,
                "buyer@example.com",
                "Buyer",
                None,
                "order_abc",
                course.price,
                "INR",
            )
            .await
            .unwrap();

        let sub = client
            .mark_subscription_completed("order_abc", "pay_123", Some("card"))
            .await
            .unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Completed);
        assert_eq!(sub.payment_id.as_deref(), Some("pay_123"));
        assert_eq!(sub.payment_method.as_deref(), Some("card"));
    }

    #[tokio::test]
    async fn failure_leaves_payment_id_unset() {
        let (client, course) = client_with_course().await;
        client
            .create_subscription(
                course.id,
                "buyer@example.com",
                "Buyer",
                None,
                "order_abc",
                course.price,
                "INR",
            )
            .await
            .unwrap();

        let sub = client.mark_subscription_failed("order_abc").await.unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Failed);
        assert!(sub.payment_id.is_none());
    }

    #[tokio::test]
    async fn completed_check_requires_the_exact_pair_and_state() {
        let (client, course) = client_with_course().await;
        client
            .create_subscription(
                course.id,
                "buyer@example.com",
                "Buyer",
                None,
                "order_pending",
                course.price,
                "INR",
            )
            .await
            .unwrap();

        // Pending rows do not count.
        assert!(!client
            .has_completed_subscription(course.id, "buyer@example.com")
            .await
            .unwrap());

        client
            .mark_subscription_completed("order_pending", "pay_1", None)
            .await
            .unwrap();

        assert!(client
            .has_completed_subscription(course.id, "buyer@example.com")
            .await
            .unwrap());
        // A different email or course does not match.
        assert!(!client
            .has_completed_subscription(course.id, "other@example.com")
            .await
            .unwrap());
        assert!(!client
            .has_completed_subscription(course.id + 1, "buyer@example.com")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn repeated_attempts_create_separate_rows() {
        let (client, course) = client_with_course().await;
        for order in ["order_1", "order_2"] {
            client
                .create_subscription(
                    course.id,
                    "buyer@example.com",
                    "Buyer",
                    None,
                    order,
                    course.price,
                    "INR",
                )
                .await
                .unwrap();
        }

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM course_subscriptions WHERE course_id = ?1 AND email = ?2",
        )
        .bind(course.id)
        .bind("buyer@example.com")
        .fetch_one(&client.pool)
        .await
        .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn missing_order_is_row_not_found() {
        let (client, _) = client_with_course().await;
        let err = client
            .mark_subscription_completed("order_missing", "pay", None)
            .await
            .unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));
    }
}
