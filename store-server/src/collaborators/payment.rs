//! Payment Collaborator
//!
//! Abstract authorize-and-capture call. A declined payment is a normal
//! outcome; transport errors and timeouts surface as `AppError::Downstream`
//! and the caller must leave every local mutation unperformed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::utils::{AppError, AppResult};

/// Outcome of a capture attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Approved { transaction_id: String },
    Declined { reason: String },
}

#[async_trait]
pub trait PaymentCollaborator: Send + Sync {
    async fn authorize_and_capture(&self, amount: f64, currency: &str)
    -> AppResult<PaymentOutcome>;
}

// ========== HTTP implementation ==========

#[derive(Debug, Serialize)]
struct CaptureRequest<'a> {
    amount: f64,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    approved: bool,
    transaction_id: Option<String>,
    reason: Option<String>,
}

/// Payment gateway reached over HTTP
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }
}

#[async_trait]
impl PaymentCollaborator for HttpPaymentGateway {
    async fn authorize_and_capture(
        &self,
        amount: f64,
        currency: &str,
    ) -> AppResult<PaymentOutcome> {
        let url = format!("{}/v1/payments/capture", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&CaptureRequest { amount, currency })
            .send()
            .await
            .map_err(|e| AppError::downstream(format!("Payment gateway unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::downstream(format!(
                "Payment gateway returned {}",
                response.status()
            )));
        }

        let body: CaptureResponse = response
            .json()
            .await
            .map_err(|e| AppError::downstream(format!("Malformed payment response: {e}")))?;

        if body.approved {
            let transaction_id = body.transaction_id.ok_or_else(|| {
                AppError::downstream("Payment approved without a transaction id")
            })?;
            Ok(PaymentOutcome::Approved { transaction_id })
        } else {
            Ok(PaymentOutcome::Declined {
                reason: body.reason.unwrap_or_else(|| "declined".to_string()),
            })
        }
    }
}

// ========== Mock implementation (dev mode and tests) ==========

/// Behavior of the mock gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockBehavior {
    Approve,
    Decline,
    Fail,
}

/// In-process gateway: approves everything by default, or declines/fails
/// on demand. Used when `PAYMENT_BASE_URL` is unset and by the test suites.
pub struct MockPaymentGateway {
    behavior: MockBehavior,
    calls: AtomicU64,
}

impl MockPaymentGateway {
    pub fn approving() -> Self {
        Self {
            behavior: MockBehavior::Approve,
            calls: AtomicU64::new(0),
        }
    }

    pub fn declining() -> Self {
        Self {
            behavior: MockBehavior::Decline,
            calls: AtomicU64::new(0),
        }
    }

    /// Simulates a gateway outage (transport error)
    pub fn failing() -> Self {
        Self {
            behavior: MockBehavior::Fail,
            calls: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentCollaborator for MockPaymentGateway {
    async fn authorize_and_capture(
        &self,
        amount: f64,
        _currency: &str,
    ) -> AppResult<PaymentOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Approve => Ok(PaymentOutcome::Approved {
                transaction_id: format!("mock-{}", uuid::Uuid::new_v4()),
            }),
            MockBehavior::Decline => Ok(PaymentOutcome::Declined {
                reason: format!("insufficient funds for {amount:.2}"),
            }),
            MockBehavior::Fail => Err(AppError::downstream("mock gateway outage")),
        }
    }
}
