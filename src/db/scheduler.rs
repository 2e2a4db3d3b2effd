use super::DBClient;
use crate::db::PostExt;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

impl DBClient {
    /// Background counterpart to the per-request auto-publish sweep: a
    /// once-a-minute job that promotes due scheduled posts even while no
    /// traffic is hitting the blog. The inline sweep alone already satisfies
    /// the visibility contract; this only shortens the publish latency on a
    /// quiet site.
    pub async fn start_publish_scheduler(&self) {
        let sched = JobScheduler::new().await.unwrap();
        let client = self.clone();

        let job = Job::new_async("0 * * * * *", move |_uuid, _l| {
            let client = client.clone();
            Box::pin(async move {
                match client.publish_due_scheduled(Utc::now()).await {
                    Ok(0) => {}
                    Ok(published) => {
                        tracing::info!(published, "Scheduled-post sweep published posts");
                    }
                    Err(e) => {
                        tracing::error!("Scheduled-post sweep failed: {}", e);
                    }
                }
            })
        })
        .unwrap();

        sched.add(job).await.unwrap();
        // start() spawns the ticker; it does not block.
        sched.start().await.unwrap();
    }
}
