//! Notification dispatch
//!
//! [`Notifier`] is the seam the placement monitor calls. The dispatcher
//! turns a change into text + payload and hands both to a
//! [`DeliveryChannel`].

use super::message::{build_payload, format_announcement, NotificationPayload, PlacementChange};
use crate::error::MonitorError;
use crate::registry::Destination;
use crate::scoreboard::{PeerFilter, ScoreboardMetadata, ScoreboardSnapshot, TeamDetail};
use async_trait::async_trait;
use std::sync::Arc;

/// Transport to a destination channel
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(
        &self,
        destination: &Destination,
        text: &str,
        payload: &NotificationPayload,
    ) -> Result<(), MonitorError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        destination: &Destination,
        change: &PlacementChange,
        detail: &TeamDetail,
        snapshot: &ScoreboardSnapshot,
        peer_filter: &PeerFilter,
    ) -> Result<(), MonitorError>;
}

pub struct NotificationDispatcher {
    delivery: Arc<dyn DeliveryChannel>,
    metadata: ScoreboardMetadata,
}

impl NotificationDispatcher {
    pub fn new(delivery: Arc<dyn DeliveryChannel>, metadata: ScoreboardMetadata) -> Self {
        Self { delivery, metadata }
    }
}

#[async_trait]
impl Notifier for NotificationDispatcher {
    async fn notify(
        &self,
        destination: &Destination,
        change: &PlacementChange,
        detail: &TeamDetail,
        snapshot: &ScoreboardSnapshot,
        peer_filter: &PeerFilter,
    ) -> Result<(), MonitorError> {
        let text = format_announcement(change);
        let payload = build_payload(detail, snapshot, peer_filter, &self.metadata);

        log::debug!("📣 {} → channel {}", text, destination.channel_id);

        self.delivery.send(destination, &text, &payload).await
    }
}
