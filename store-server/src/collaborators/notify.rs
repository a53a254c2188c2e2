//! Notification Service
//!
//! Fire-and-forget fan-out to UI clients over an in-process broadcast
//! channel. Delivery is strictly advisory: a lost or late message can at
//! worst delay a re-fetch, never corrupt a decision: every mutation
//! re-reads persisted state at mutation time.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use shared::message::{BusMessage, NotificationLevel, NotificationPayload, SyncPayload};

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理。
/// 每种资源类型维护独立的版本号，支持原子递增。
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

/// Broadcast capacity; slow consumers lag and re-fetch, they never block
/// the core transaction
const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct NotificationService {
    sender: broadcast::Sender<BusMessage>,
    versions: Arc<ResourceVersions>,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationService {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            versions: Arc::new(ResourceVersions::new()),
        }
    }

    /// Subscribe a presentation-layer consumer
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }

    /// Announce a resource change with an auto-incremented version
    pub fn broadcast_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        owner_id: Option<i64>,
        data: Option<&T>,
    ) {
        let version = self.versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
            owner_id,
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        if let Err(e) = self.sender.send(BusMessage::sync(&payload)) {
            // No receivers connected; normal in headless operation
            tracing::debug!(resource, action, "Sync broadcast dropped: {e}");
        }
    }

    /// Shopper-facing event; never blocks, never retried
    pub fn notify(
        &self,
        owner_id: i64,
        level: NotificationLevel,
        event: &str,
        body: serde_json::Value,
    ) {
        let payload = NotificationPayload {
            owner_id,
            level,
            event: event.to_string(),
            body,
            created_at: shared::util::now_millis(),
        };
        if let Err(e) = self.sender.send(BusMessage::notification(&payload)) {
            tracing::debug!(owner_id, event, "Notification dropped: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::EventType;

    #[test]
    fn test_versions_increment_per_resource() {
        let v = ResourceVersions::new();
        assert_eq!(v.increment("batch"), 1);
        assert_eq!(v.increment("batch"), 2);
        assert_eq!(v.increment("wallet"), 1);
        assert_eq!(v.get("batch"), 2);
        assert_eq!(v.get("unknown"), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_sync_with_monotonic_versions() {
        let service = NotificationService::new();
        let mut rx = service.subscribe();

        service.broadcast_sync("batch", "created", "1", Some(7), Some(&"payload"));
        service.broadcast_sync("batch", "updated", "1", Some(7), None::<&()>);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.event_type, EventType::Sync);
        let v1 = first.payload.get("version").and_then(|v| v.as_u64()).unwrap();
        let v2 = second.payload.get("version").and_then(|v| v.as_u64()).unwrap();
        assert!(v2 > v1);
    }

    #[test]
    fn test_send_without_subscribers_does_not_panic() {
        let service = NotificationService::new();
        service.notify(1, NotificationLevel::Info, "wallet_awarded", serde_json::json!({}));
    }
}
