//! Expiry Sweeper
//!
//! The only long-lived background actor. Periodically flips stale pending
//! batches to `expired` in one conditional statement and emits advisory
//! notifications; it performs no other side effects. Read paths enforce
//! expiry themselves, so the sweep is a janitor, not an authority.

use std::time::Duration;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::collaborators::NotificationService;
use crate::db::repository::batch;
use shared::message::NotificationLevel;

pub struct ExpirySweeper {
    pool: SqlitePool,
    notify: NotificationService,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ExpirySweeper {
    pub fn new(
        pool: SqlitePool,
        notify: NotificationService,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            notify,
            interval,
            shutdown,
        }
    }

    /// 主循环：启动先扫一次 → 周期触发
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Expiry sweeper started");

        // Catch up immediately on startup: batches may have gone stale
        // while the server was down
        self.sweep_once().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Expiry sweeper received shutdown signal");
                    break;
                }
            }
            self.sweep_once().await;
        }

        tracing::info!("Expiry sweeper stopped");
    }

    /// One sweep pass; failures are logged and retried next tick
    pub async fn sweep_once(&self) {
        let now = shared::util::now_millis();
        match batch::sweep_expired(&self.pool, now).await {
            Ok(expired) => {
                if expired.is_empty() {
                    return;
                }
                tracing::info!(count = expired.len(), "Expired stale pending batches");
                for (batch_id, owner_id) in expired {
                    self.notify.broadcast_sync(
                        "batch",
                        "expired",
                        &batch_id.to_string(),
                        Some(owner_id),
                        None::<&()>,
                    );
                    self.notify.notify(
                        owner_id,
                        NotificationLevel::Warning,
                        "batch_expired",
                        serde_json::json!({ "batch_id": batch_id }),
                    );
                }
            }
            Err(e) => {
                tracing::error!("Expiry sweep failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{seed_shopper, test_pool};
    use shared::models::BatchStatus;

    fn sweeper(pool: SqlitePool) -> ExpirySweeper {
        ExpirySweeper::new(
            pool,
            NotificationService::new(),
            Duration::from_secs(60),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_sweep_expires_stale_and_notifies() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mut conn = pool.acquire().await.unwrap();
        let stale = batch::insert_pending(&mut conn, 1, 1, 0).await.unwrap();
        drop(conn);

        let sweeper = sweeper(pool.clone());
        let mut rx = sweeper.notify.subscribe();
        sweeper.sweep_once().await;

        let mut conn = pool.acquire().await.unwrap();
        let swept = batch::find_by_id(&mut conn, stale.id).await.unwrap().unwrap();
        assert_eq!(swept.status, BatchStatus::Expired);
        drop(conn);

        // Advisory messages were emitted (sync + notification)
        let first = rx.try_recv().unwrap();
        assert!(first.payload.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn test_sweep_leaves_fresh_batches_alone() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mut conn = pool.acquire().await.unwrap();
        let fresh = batch::insert_pending(&mut conn, 1, i64::MAX, 0).await.unwrap();
        drop(conn);

        sweeper(pool.clone()).sweep_once().await;

        let mut conn = pool.acquire().await.unwrap();
        let kept = batch::find_by_id(&mut conn, fresh.id).await.unwrap().unwrap();
        assert_eq!(kept.status, BatchStatus::Pending);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancellation() {
        let pool = test_pool().await;
        let shutdown = CancellationToken::new();
        let sweeper = ExpirySweeper::new(
            pool,
            NotificationService::new(),
            Duration::from_secs(3600),
            shutdown.clone(),
        );

        let handle = tokio::spawn(sweeper.run());
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper should stop promptly")
            .unwrap();
    }
}
