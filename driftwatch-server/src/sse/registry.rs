//! Per-incident viewer registry
//!
//! Viewers subscribe to one incident and receive only that incident's
//! events. Each viewer owns a bounded mpsc channel; delivery is
//! best-effort and a viewer that cannot keep up is dropped rather than
//! allowed to stall the writer. Groups for different incidents live in
//! separate DashMap shards and do not contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use driftwatch_common::events::IncidentEvent;

struct Viewer {
    id: Uuid,
    tx: mpsc::Sender<IncidentEvent>,
}

type Groups = Arc<DashMap<String, Vec<Viewer>>>;

/// Tracks which viewers are watching which incident.
///
/// Clones share the same underlying map, so the registry can be handed
/// to handlers and the replay loop alike.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    groups: Groups,
    buffer: usize,
}

impl SubscriptionRegistry {
    /// Create a registry whose viewer channels buffer `buffer` events.
    pub fn new(buffer: usize) -> Self {
        Self {
            groups: Arc::new(DashMap::new()),
            buffer,
        }
    }

    /// Register a viewer for one incident.
    ///
    /// Returns the event receiver and a guard that unregisters the
    /// viewer when dropped. Events published before this call are not
    /// replayed.
    pub fn subscribe(&self, incident_id: &str) -> (ViewerGuard, mpsc::Receiver<IncidentEvent>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let viewer_id = Uuid::new_v4();

        self.groups
            .entry(incident_id.to_string())
            .or_default()
            .push(Viewer { id: viewer_id, tx });

        debug!("Viewer {} subscribed to incident {}", viewer_id, incident_id);

        let guard = ViewerGuard {
            groups: Arc::clone(&self.groups),
            incident_id: incident_id.to_string(),
            viewer_id,
        };
        (guard, rx)
    }

    /// Deliver an event to every viewer of one incident.
    ///
    /// A viewer whose channel is full or closed is removed; the
    /// remaining viewers still receive the event. No viewers is not an
    /// error.
    pub fn broadcast(&self, incident_id: &str, event: &IncidentEvent) {
        let Some(mut group) = self.groups.get_mut(incident_id) else {
            return;
        };

        group.retain(|viewer| match viewer.tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    "Viewer {} lagging on incident {}, dropping connection",
                    viewer.id, incident_id
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Viewer {} left incident {}", viewer.id, incident_id);
                false
            }
        });

        let emptied = group.is_empty();
        // Release the shard lock before remove_if re-locks the entry
        drop(group);
        if emptied {
            self.groups.remove_if(incident_id, |_, viewers| viewers.is_empty());
        }
    }

    /// Number of viewers currently watching an incident.
    pub fn viewer_count(&self, incident_id: &str) -> usize {
        self.groups.get(incident_id).map_or(0, |g| g.len())
    }

    /// Number of incidents with at least one viewer.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Removes its viewer from the registry on drop.
pub struct ViewerGuard {
    groups: Groups,
    incident_id: String,
    viewer_id: Uuid,
}

impl Drop for ViewerGuard {
    fn drop(&mut self) {
        let mut emptied = false;
        if let Some(mut group) = self.groups.get_mut(&self.incident_id) {
            group.retain(|v| v.id != self.viewer_id);
            emptied = group.is_empty();
        }
        if emptied {
            self.groups
                .remove_if(&self.incident_id, |_, viewers| viewers.is_empty());
        }
        debug!(
            "Viewer {} unsubscribed from incident {}",
            self.viewer_id, self.incident_id
        );
    }
}
