//! One-shot capability announcement.
//!
//! After the emulated boot delay, the task builds the descriptor, announces
//! it exactly once, stores the containment relationship in a set-once slot
//! and reports the outcome to the telemetry task. There is no retry.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::watch;

use twinbridge_app::lifecycle::ShutdownSignal;
use twinbridge_app::ports::EventBusClient;
use twinbridge_domain::capability::CapabilityDescriptor;
use twinbridge_domain::error::{LifecycleError, TwinBridgeError};
use twinbridge_domain::relationship::{RelationshipDescriptor, RelationshipInstance};
use twinbridge_domain::value::Value;

use crate::capabilities::{self, INSIDE_RELATIONSHIP};
use crate::config::RelationshipConfig;

/// Outcome of the announcement, as seen by the other tasks.
#[derive(Debug, Clone, Default)]
pub enum Announcement {
    #[default]
    Pending,
    Announced(Arc<CapabilityDescriptor>),
    Failed,
}

/// Relationship handle written once by the announcement, read by anyone after.
pub(crate) type RelationshipSlot = Arc<OnceLock<RelationshipDescriptor>>;

pub(crate) struct AnnouncementTask<B> {
    pub adapter_id: String,
    pub bus: Arc<B>,
    pub delay: Duration,
    pub slot: RelationshipSlot,
    pub outcome: watch::Sender<Announcement>,
    pub relationship: Option<RelationshipConfig>,
    pub shutdown: ShutdownSignal,
}

impl<B: EventBusClient + Send + Sync + 'static> AnnouncementTask<B> {
    pub async fn run(mut self) {
        tracing::info!(
            adapter = %self.adapter_id,
            delay_ms = self.delay.as_millis(),
            "sleeping before announcing capabilities"
        );
        if self.shutdown.sleep(self.delay).await.is_err() {
            tracing::debug!(adapter = %self.adapter_id, "announcement cancelled");
            return;
        }

        let descriptor = match capabilities::describe() {
            Ok(descriptor) => descriptor,
            Err(err) => {
                tracing::error!(adapter = %self.adapter_id, %err, "invalid capability descriptor");
                self.outcome.send_replace(Announcement::Failed);
                return;
            }
        };
        let inside = descriptor.relationship(INSIDE_RELATIONSHIP).cloned();

        tracing::info!(adapter = %self.adapter_id, "announcing capabilities");
        if let Err(err) = self.bus.announce_capabilities(descriptor.clone()).await {
            tracing::error!(adapter = %self.adapter_id, %err, "capability announcement failed");
            self.outcome.send_replace(Announcement::Failed);
            return;
        }

        if let Some(inside) = inside
            && self.slot.set(inside).is_err()
        {
            tracing::warn!(adapter = %self.adapter_id, "relationship handle already set");
        }
        self.outcome
            .send_replace(Announcement::Announced(Arc::new(descriptor)));

        if let Some(relationship) = self.relationship.take() {
            let metadata = relationship
                .metadata
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            match publish_relationship_instance(
                self.bus.as_ref(),
                &self.slot,
                relationship.target,
                metadata,
            )
            .await
            {
                Ok(instance) => tracing::info!(
                    adapter = %self.adapter_id,
                    target = instance.target(),
                    "relationship instance published"
                ),
                Err(err) => tracing::warn!(
                    adapter = %self.adapter_id,
                    %err,
                    "relationship instance not published"
                ),
            }
        }
    }
}

/// Mint an instance of the announced containment relationship and publish it.
///
/// # Errors
///
/// Returns [`LifecycleError::NotAnnounced`] when the relationship handle has
/// not been stored yet (nothing is published), or the bus's
/// [`PublishError`](twinbridge_domain::error::PublishError).
pub(crate) async fn publish_relationship_instance<B: EventBusClient>(
    bus: &B,
    slot: &OnceLock<RelationshipDescriptor>,
    target: String,
    metadata: HashMap<String, Value>,
) -> Result<RelationshipInstance, TwinBridgeError> {
    let relationship = slot.get().ok_or(LifecycleError::NotAnnounced)?;
    let instance = relationship.create_instance(target, metadata);
    bus.publish_relationship_instance(instance.clone()).await?;
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingBus};
    use twinbridge_app::lifecycle::TaskSupervisor;

    fn task(
        bus: &Arc<RecordingBus>,
        supervisor: &TaskSupervisor,
        relationship: Option<RelationshipConfig>,
    ) -> (
        AnnouncementTask<RecordingBus>,
        RelationshipSlot,
        watch::Receiver<Announcement>,
    ) {
        let slot = RelationshipSlot::default();
        let (outcome, outcome_rx) = watch::channel(Announcement::Pending);
        let task = AnnouncementTask {
            adapter_id: "demo".to_string(),
            bus: Arc::clone(bus),
            delay: Duration::from_secs(5),
            slot: Arc::clone(&slot),
            outcome,
            relationship,
            shutdown: supervisor.shutdown_signal(),
        };
        (task, slot, outcome_rx)
    }

    #[tokio::test(start_paused = true)]
    async fn should_announce_once_and_store_relationship() {
        let bus = Arc::new(RecordingBus::default());
        let supervisor = TaskSupervisor::new("demo");
        let (task, slot, outcome) = task(&bus, &supervisor, None);

        task.run().await;

        assert_eq!(bus.announcements(), 1);
        assert_eq!(slot.get().map(RelationshipDescriptor::name), Some(INSIDE_RELATIONSHIP));
        assert!(matches!(*outcome.borrow(), Announcement::Announced(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_configured_relationship_after_announcing() {
        let bus = Arc::new(RecordingBus::default());
        let supervisor = TaskSupervisor::new("demo");
        let (task, _slot, _outcome) = task(&bus, &supervisor, Some(RelationshipConfig::default()));

        task.run().await;

        let calls = bus.calls();
        assert!(matches!(calls[0], Call::Announce(_)));
        match &calls[1] {
            Call::Relationship(instance) => {
                assert_eq!(instance.target(), "building-hq");
                assert_eq!(instance.metadata().get("floor"), Some(&Value::from("f0")));
                assert_eq!(instance.metadata().get("room"), Some(&Value::from("r0")));
            }
            other => panic!("expected relationship instance, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_give_up_without_retry_when_announcement_fails() {
        let bus = Arc::new(RecordingBus::failing_announcement());
        let supervisor = TaskSupervisor::new("demo");
        let (task, slot, outcome) = task(&bus, &supervisor, Some(RelationshipConfig::default()));

        task.run().await;

        assert_eq!(bus.announcements(), 1);
        assert!(bus.calls().is_empty());
        assert!(slot.get().is_none());
        assert!(matches!(*outcome.borrow(), Announcement::Failed));
    }

    #[tokio::test]
    async fn should_refuse_relationship_instance_before_announcement() {
        let bus = RecordingBus::default();
        let slot = OnceLock::new();

        let result =
            publish_relationship_instance(&bus, &slot, "building-hq".to_string(), HashMap::new())
                .await;

        assert!(matches!(
            result,
            Err(TwinBridgeError::Lifecycle(LifecycleError::NotAnnounced))
        ));
        assert!(bus.calls().is_empty());
    }
}
