//! Order Creation Collaborator
//!
//! Produces the externally visible consolidated shipment order at batch
//! finalize. Errors and timeouts surface as `AppError::Downstream`; the
//! caller leaves the batch untouched so a retried finalize is safe.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::utils::{AppError, AppResult};

#[async_trait]
pub trait OrderCreationCollaborator: Send + Sync {
    /// Returns the created shipment order id
    async fn create_shipment_order(
        &self,
        owner_id: i64,
        batch_id: i64,
        line_total: f64,
        shipping_method: &str,
    ) -> AppResult<i64>;
}

// ========== HTTP implementation ==========

#[derive(Debug, Serialize)]
struct ShipmentRequest<'a> {
    owner_id: i64,
    batch_id: i64,
    line_total: f64,
    shipping_method: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShipmentResponse {
    order_id: i64,
}

pub struct HttpOrderCreation {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderCreation {
    pub fn new(base_url: String, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }
}

#[async_trait]
impl OrderCreationCollaborator for HttpOrderCreation {
    async fn create_shipment_order(
        &self,
        owner_id: i64,
        batch_id: i64,
        line_total: f64,
        shipping_method: &str,
    ) -> AppResult<i64> {
        let url = format!("{}/v1/shipment-orders", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ShipmentRequest {
                owner_id,
                batch_id,
                line_total,
                shipping_method,
            })
            .send()
            .await
            .map_err(|e| AppError::downstream(format!("Order service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::downstream(format!(
                "Order service returned {}",
                response.status()
            )));
        }

        let body: ShipmentResponse = response
            .json()
            .await
            .map_err(|e| AppError::downstream(format!("Malformed order response: {e}")))?;

        if body.order_id <= 0 {
            return Err(AppError::downstream("Order service returned an invalid id"));
        }
        Ok(body.order_id)
    }
}

// ========== Mock implementation (dev mode and tests) ==========

/// In-process order creation: hands out snowflake ids, or fails on demand
pub struct MockOrderCreation {
    fail: bool,
    calls: AtomicU64,
}

impl MockOrderCreation {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            calls: AtomicU64::new(0),
        }
    }

    /// Simulates an order-service outage
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderCreationCollaborator for MockOrderCreation {
    async fn create_shipment_order(
        &self,
        _owner_id: i64,
        _batch_id: i64,
        _line_total: f64,
        _shipping_method: &str,
    ) -> AppResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::downstream("mock order service outage"));
        }
        Ok(shared::util::snowflake_id())
    }
}
