//! Audit sink port - append-only security trail delivery.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::AuditEvent;

/// Destination for audit events. Delivery is fire-and-forget: the service
/// never learns about sink failures, so implementations log and swallow
/// their own errors.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Sink that emits audit events as structured log records.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        tracing::info!(
            event_id = %event.event_id,
            user_id = ?event.user_id,
            action = event.action.as_str(),
            ip_address = ?event.ip_address,
            user_agent = ?event.user_agent,
            timestamp = %event.created_utc,
            "Audit event"
        );
    }
}

/// In-memory sink capturing events for tests.
#[derive(Default)]
pub struct MockAuditSink {
    pub events: Mutex<Vec<AuditEvent>>,
}

impl MockAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded action names, in order.
    pub fn actions(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .map(|events| events.iter().map(|e| e.action.as_str()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MockAuditSink {
    async fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
