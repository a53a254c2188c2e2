//! Batch Manager
//!
//! Expiry is enforced here at read/attach/finalize time by comparing `now`
//! to `validate_at`; client countdowns are presentational only. The
//! finalize path calls the Order Creation Collaborator strictly before any
//! status write, so a downstream failure or timeout leaves the batch
//! completely unchanged and a retried finalize is safe.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::collaborators::{NotificationService, OrderCreationCollaborator};
use crate::db::repository::{RepoError, batch, order, shopper};
use crate::money;
use crate::utils::{AppError, AppResult};
use shared::message::NotificationLevel;
use shared::models::{BatchFinalizeResult, BatchStatus, DeliveryBatch, OrderInput};

const RESOURCE: &str = "batch";

#[derive(Clone)]
pub struct BatchManager {
    pool: SqlitePool,
    order_creation: Arc<dyn OrderCreationCollaborator>,
    notify: NotificationService,
    /// Length of the promotional window a new batch stays open
    window_ms: i64,
}

impl BatchManager {
    pub fn new(
        pool: SqlitePool,
        order_creation: Arc<dyn OrderCreationCollaborator>,
        notify: NotificationService,
        window_ms: i64,
    ) -> Self {
        Self {
            pool,
            order_creation,
            notify,
            window_ms,
        }
    }

    /// The owner's current pending batch, or none.
    ///
    /// A pending batch observed past `validate_at` is expired on the spot;
    /// the sweep is a backstop, not the authority.
    pub async fn get_active(&self, owner_id: i64) -> AppResult<Option<DeliveryBatch>> {
        let now = shared::util::now_millis();
        let mut conn = self.pool.acquire().await?;

        let Some(existing) = batch::find_pending_by_owner(&mut conn, owner_id).await? else {
            return Ok(None);
        };
        if !existing.is_stale(now) {
            return Ok(Some(existing));
        }

        // Losing this conditional write is fine: someone else retired it
        if batch::mark_expired(&mut conn, existing.id, now).await? {
            drop(conn);
            self.notify.broadcast_sync(
                RESOURCE,
                "expired",
                &existing.id.to_string(),
                Some(owner_id),
                None::<&()>,
            );
        }
        Ok(None)
    }

    /// Return the owner's pending batch (opening one if none exists, or
    /// transparently replacing one that expired) and attach the order.
    pub async fn open_or_attach(
        &self,
        owner_id: i64,
        order_input: &OrderInput,
    ) -> AppResult<DeliveryBatch> {
        money::validate_amount(order_input.total, "order total")?;

        let now = shared::util::now_millis();
        let mut conn = self.pool.acquire().await?;

        // Shopper must exist; attach never creates identities implicitly
        shopper::engagement_points(&mut conn, owner_id).await?;

        let target = match batch::find_pending_by_owner(&mut conn, owner_id).await? {
            Some(existing) if !existing.is_stale(now) => existing,
            Some(stale) => {
                batch::mark_expired(&mut conn, stale.id, now).await?;
                self.open_pending(&mut conn, owner_id, now).await?
            }
            None => self.open_pending(&mut conn, owner_id, now).await?,
        };

        order::attach(&mut conn, owner_id, order_input, target.id, now).await?;
        drop(conn);

        self.notify.broadcast_sync(
            RESOURCE,
            "order_attached",
            &target.id.to_string(),
            Some(owner_id),
            Some(&order_input.id),
        );
        Ok(target)
    }

    async fn open_pending(
        &self,
        conn: &mut sqlx::SqliteConnection,
        owner_id: i64,
        now: i64,
    ) -> AppResult<DeliveryBatch> {
        match batch::insert_pending(conn, owner_id, now + self.window_ms, now).await {
            Ok(created) => {
                self.notify.broadcast_sync(
                    RESOURCE,
                    "created",
                    &created.id.to_string(),
                    Some(owner_id),
                    Some(&created),
                );
                Ok(created)
            }
            // Unique index: another request opened the batch first, use it
            Err(RepoError::Conflict(_)) => {
                let winner = batch::find_pending_by_owner(conn, owner_id)
                    .await?
                    .ok_or_else(|| AppError::conflict("Pending batch vanished mid-open"))?;
                Ok(winner)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Finalize a pending batch into one externally visible shipment order.
    ///
    /// Already-validated batches replay as a benign no-op returning the
    /// stored order id, so double-submission from duplicate UI actions is
    /// harmless. Expired and cancelled batches are genuine conflicts.
    pub async fn finalize(
        &self,
        batch_id: i64,
        owner_id: i64,
        shipping_method: &str,
    ) -> AppResult<BatchFinalizeResult> {
        let now = shared::util::now_millis();
        let mut conn = self.pool.acquire().await?;

        let current = batch::find_by_id(&mut conn, batch_id)
            .await?
            .filter(|b| b.owner_id == owner_id)
            .ok_or_else(|| AppError::not_found(format!("Batch {batch_id}")))?;

        match current.status {
            BatchStatus::Validated => {
                // Benign replay: hand back the previously produced order
                let shipment_order_id = current
                    .shipment_order_id
                    .ok_or_else(|| AppError::database("Validated batch without order id"))?;
                return Ok(BatchFinalizeResult {
                    batch_id,
                    shipment_order_id,
                    newly_validated: false,
                });
            }
            BatchStatus::Expired => {
                return Err(AppError::conflict("Batch has expired"));
            }
            BatchStatus::Cancelled => {
                return Err(AppError::conflict("Batch was cancelled"));
            }
            BatchStatus::Pending => {}
        }

        if current.is_stale(now) {
            batch::mark_expired(&mut conn, batch_id, now).await?;
            return Err(AppError::conflict("Batch has expired"));
        }

        let line_total = order::sum_for_batch(&mut conn, batch_id).await?;
        drop(conn);

        // Collaborator call happens with no open transaction and before any
        // status write: a failure or timeout leaves no partial state
        let shipment_order_id = self
            .order_creation
            .create_shipment_order(owner_id, batch_id, line_total, shipping_method)
            .await?;

        let mut conn = self.pool.acquire().await?;
        let won = batch::mark_validated(&mut conn, batch_id, shipment_order_id, now).await?;
        if won {
            drop(conn);
            self.notify.broadcast_sync(
                RESOURCE,
                "finalized",
                &batch_id.to_string(),
                Some(owner_id),
                Some(&shipment_order_id),
            );
            self.notify.notify(
                owner_id,
                NotificationLevel::Info,
                "batch_finalized",
                serde_json::json!({ "batch_id": batch_id, "shipment_order_id": shipment_order_id }),
            );
            tracing::info!(batch_id, shipment_order_id, line_total, "Batch finalized");
            return Ok(BatchFinalizeResult {
                batch_id,
                shipment_order_id,
                newly_validated: true,
            });
        }

        // Lost the race: report whatever the winner committed
        let latest = batch::find_by_id(&mut conn, batch_id)
            .await?
            .ok_or_else(|| AppError::database("Batch vanished during finalize"))?;
        match (latest.status, latest.shipment_order_id) {
            (BatchStatus::Validated, Some(winner_order_id)) => Ok(BatchFinalizeResult {
                batch_id,
                shipment_order_id: winner_order_id,
                newly_validated: false,
            }),
            (BatchStatus::Expired, _) => Err(AppError::conflict("Batch has expired")),
            (BatchStatus::Cancelled, _) => Err(AppError::conflict("Batch was cancelled")),
            _ => Err(AppError::database("Finalize lost to an unknown transition")),
        }
    }

    /// Owner-initiated cancellation; terminal. Cancelling an already
    /// cancelled batch replays benignly.
    pub async fn cancel(&self, batch_id: i64, owner_id: i64) -> AppResult<DeliveryBatch> {
        let now = shared::util::now_millis();
        let mut conn = self.pool.acquire().await?;

        let current = batch::find_by_id(&mut conn, batch_id)
            .await?
            .filter(|b| b.owner_id == owner_id)
            .ok_or_else(|| AppError::not_found(format!("Batch {batch_id}")))?;

        match current.status {
            BatchStatus::Cancelled => return Ok(current),
            BatchStatus::Validated => {
                return Err(AppError::conflict("Batch already shipped"));
            }
            BatchStatus::Expired => {
                return Err(AppError::conflict("Batch has expired"));
            }
            BatchStatus::Pending => {}
        }

        batch::mark_cancelled(&mut conn, batch_id, now).await?;
        let latest = batch::find_by_id(&mut conn, batch_id)
            .await?
            .ok_or_else(|| AppError::database("Batch vanished during cancel"))?;
        drop(conn);

        match latest.status {
            BatchStatus::Cancelled => {
                self.notify.broadcast_sync(
                    RESOURCE,
                    "cancelled",
                    &batch_id.to_string(),
                    Some(owner_id),
                    None::<&()>,
                );
                Ok(latest)
            }
            BatchStatus::Validated => Err(AppError::conflict("Batch already shipped")),
            BatchStatus::Expired => Err(AppError::conflict("Batch has expired")),
            BatchStatus::Pending => Err(AppError::database("Cancel write had no effect")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockOrderCreation;
    use crate::db::repository::test_support::{seed_shopper, test_pool, test_pool_concurrent};
    use shared::models::OrderStatus;

    const WINDOW_MS: i64 = 60_000;

    fn manager(pool: SqlitePool) -> BatchManager {
        BatchManager::new(
            pool,
            Arc::new(MockOrderCreation::succeeding()),
            NotificationService::new(),
            WINDOW_MS,
        )
    }

    fn manager_with(pool: SqlitePool, collab: Arc<MockOrderCreation>) -> BatchManager {
        BatchManager::new(pool, collab, NotificationService::new(), WINDOW_MS)
    }

    fn paid_order(id: i64, total: f64) -> OrderInput {
        OrderInput {
            id,
            total,
            status: OrderStatus::Paid,
        }
    }

    #[tokio::test]
    async fn test_first_order_opens_batch_later_orders_attach() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager(pool);

        let first = mgr.open_or_attach(1, &paid_order(100, 20.0)).await.unwrap();
        assert_eq!(first.status, BatchStatus::Pending);

        let second = mgr.open_or_attach(1, &paid_order(101, 30.0)).await.unwrap();
        assert_eq!(second.id, first.id);

        let active = mgr.get_active(1).await.unwrap().unwrap();
        assert_eq!(active.id, first.id);
    }

    #[tokio::test]
    async fn test_get_active_none_without_batch() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager(pool);
        assert!(mgr.get_active(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_batch_replaced_transparently() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager(pool.clone());

        let first = mgr.open_or_attach(1, &paid_order(100, 20.0)).await.unwrap();

        // Force the window into the past
        sqlx::query("UPDATE delivery_batch SET validate_at = 1 WHERE id = ?")
            .bind(first.id)
            .execute(&pool)
            .await
            .unwrap();

        // Read path retires it
        assert!(mgr.get_active(1).await.unwrap().is_none());

        // Attach path opens a brand-new pending batch
        let replacement = mgr.open_or_attach(1, &paid_order(101, 30.0)).await.unwrap();
        assert_ne!(replacement.id, first.id);
        assert_eq!(replacement.status, BatchStatus::Pending);

        let mut conn = pool.acquire().await.unwrap();
        let old = batch::find_by_id(&mut conn, first.id).await.unwrap().unwrap();
        assert_eq!(old.status, BatchStatus::Expired);
    }

    #[tokio::test]
    async fn test_concurrent_attaches_keep_single_pending_batch() {
        let (pool, _guard) = test_pool_concurrent().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager(pool.clone());

        let mut handles = Vec::new();
        for i in 0..6 {
            let mgr = mgr.clone();
            handles.push(tokio::spawn(async move {
                mgr.open_or_attach(1, &paid_order(100 + i, 10.0)).await.unwrap()
            }));
        }
        let mut batch_ids = Vec::new();
        for handle in handles {
            batch_ids.push(handle.await.unwrap().id);
        }

        // Every request landed on the same batch, and only one is pending
        batch_ids.sort_unstable();
        batch_ids.dedup();
        assert_eq!(batch_ids.len(), 1);
        assert_eq!(
            batch::count_by_status(&pool, BatchStatus::Pending).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_finalize_sums_non_excluded_orders() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager(pool.clone());

        let batch = mgr.open_or_attach(1, &paid_order(100, 20.0)).await.unwrap();
        mgr.open_or_attach(1, &paid_order(101, 30.0)).await.unwrap();
        mgr.open_or_attach(
            1,
            &OrderInput { id: 102, total: 50.0, status: OrderStatus::Refunded },
        )
        .await
        .unwrap();

        let result = mgr.finalize(batch.id, 1, "standard").await.unwrap();
        assert!(result.newly_validated);
        assert!(result.shipment_order_id > 0);

        let mut conn = pool.acquire().await.unwrap();
        let validated = batch::find_by_id(&mut conn, batch.id).await.unwrap().unwrap();
        assert_eq!(validated.status, BatchStatus::Validated);
        assert_eq!(validated.shipment_order_id, Some(result.shipment_order_id));
        assert!(validated.validated_at.is_some());
    }

    #[tokio::test]
    async fn test_finalize_replay_returns_same_order_id() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let collab = Arc::new(MockOrderCreation::succeeding());
        let mgr = manager_with(pool, collab.clone());

        let batch = mgr.open_or_attach(1, &paid_order(100, 20.0)).await.unwrap();
        let first = mgr.finalize(batch.id, 1, "standard").await.unwrap();
        let replay = mgr.finalize(batch.id, 1, "standard").await.unwrap();

        assert!(first.newly_validated);
        assert!(!replay.newly_validated);
        assert_eq!(first.shipment_order_id, replay.shipment_order_id);
        // The collaborator was only asked once for the replayed call pair
        assert_eq!(collab.call_count(), 1);
    }

    #[tokio::test]
    async fn test_finalize_concurrent_double_submit_single_transition() {
        let (pool, _guard) = test_pool_concurrent().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager(pool);

        let batch = mgr.open_or_attach(1, &paid_order(100, 20.0)).await.unwrap();

        let a = {
            let mgr = mgr.clone();
            tokio::spawn(async move { mgr.finalize(batch.id, 1, "standard").await.unwrap() })
        };
        let b = {
            let mgr = mgr.clone();
            tokio::spawn(async move { mgr.finalize(batch.id, 1, "standard").await.unwrap() })
        };
        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());

        // Exactly one performed the transition; both see the identical id
        assert_eq!(ra.shipment_order_id, rb.shipment_order_id);
        assert_eq!(
            [ra.newly_validated, rb.newly_validated].iter().filter(|v| **v).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_finalize_downstream_failure_leaves_batch_pending() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager_with(pool.clone(), Arc::new(MockOrderCreation::failing()));

        let batch = mgr.open_or_attach(1, &paid_order(100, 20.0)).await.unwrap();
        let err = mgr.finalize(batch.id, 1, "standard").await.unwrap_err();
        assert!(matches!(err, AppError::Downstream(_)));

        // No partial state: still pending, retry possible
        let mut conn = pool.acquire().await.unwrap();
        let current = batch::find_by_id(&mut conn, batch.id).await.unwrap().unwrap();
        assert_eq!(current.status, BatchStatus::Pending);
        assert_eq!(current.shipment_order_id, None);
        drop(conn);

        let retry_mgr = manager(pool);
        let result = retry_mgr.finalize(batch.id, 1, "standard").await.unwrap();
        assert!(result.newly_validated);
    }

    #[tokio::test]
    async fn test_finalize_stale_batch_conflicts_and_expires() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager(pool.clone());

        let batch = mgr.open_or_attach(1, &paid_order(100, 20.0)).await.unwrap();
        sqlx::query("UPDATE delivery_batch SET validate_at = 1 WHERE id = ?")
            .bind(batch.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = mgr.finalize(batch.id, 1, "standard").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut conn = pool.acquire().await.unwrap();
        let current = batch::find_by_id(&mut conn, batch.id).await.unwrap().unwrap();
        assert_eq!(current.status, BatchStatus::Expired);
    }

    #[tokio::test]
    async fn test_finalize_foreign_batch_hidden() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        seed_shopper(&pool, 2, 0).await;
        let mgr = manager(pool);

        let batch = mgr.open_or_attach(2, &paid_order(100, 20.0)).await.unwrap();
        let err = mgr.finalize(batch.id, 1, "standard").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cancel_is_terminal_and_replays_benignly() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager(pool);

        let batch = mgr.open_or_attach(1, &paid_order(100, 20.0)).await.unwrap();
        let cancelled = mgr.cancel(batch.id, 1).await.unwrap();
        assert_eq!(cancelled.status, BatchStatus::Cancelled);

        // Replay: benign
        let again = mgr.cancel(batch.id, 1).await.unwrap();
        assert_eq!(again.status, BatchStatus::Cancelled);

        // Finalize of a cancelled batch is a genuine conflict
        let err = mgr.finalize(batch.id, 1, "standard").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_cancel_validated_batch_conflicts() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mgr = manager(pool);

        let batch = mgr.open_or_attach(1, &paid_order(100, 20.0)).await.unwrap();
        mgr.finalize(batch.id, 1, "standard").await.unwrap();
        let err = mgr.cancel(batch.id, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
