use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use common::actors::{Actor, ActorType, ControlMessage};
use poller::SignalPoller;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Keeps one poller's schedule alive under supervision. Restarts reuse the
/// same `SignalPoller`, so its dedup state survives them.
pub struct PollerService {
    id: Uuid,
    poller: Arc<SignalPoller>,
}

impl PollerService {
    pub fn new(poller: Arc<SignalPoller>) -> Self {
        Self {
            id: Uuid::new_v4(),
            poller,
        }
    }
}

#[async_trait]
impl Actor for PollerService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::SignalPoller
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let _heartbeat = self.spawn_heartbeat(supervisor_tx.clone());

        let mut handle = self.poller.start();
        info!("Poller for {} is running", handle.query());

        let result = handle.join().await;
        let msg = match result {
            Ok(()) => format!("{}: ticker exited", self.poller.query()),
            Err(e) => format!("{}: ticker died: {}", self.poller.query(), e),
        };
        supervisor_tx
            .send(ControlMessage::Error(self.id, msg.clone()))
            .await?;
        bail!(msg)
    }
}
