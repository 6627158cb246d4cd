use std::time::Duration;

use common::actors::{Actor, ActorType, ControlMessage};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{error, info, warn};
use uuid::Uuid;

pub type ActorFactory = Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

struct ActorSlot {
    name: ActorType,
    label: String,
    factory: ActorFactory,
    current: Option<Running>,
}

struct Running {
    id: Uuid,
    pulse: Instant,
    handle: JoinHandle<()>,
}

pub struct Supervisor {
    slots: Vec<ActorSlot>,
    check_interval: Duration,
    timeout: Duration,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            check_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(3),
        }
    }

    /// `label` tells apart several actors of the same type (one poller per symbol).
    pub fn register_actor(&mut self, name: ActorType, label: impl Into<String>, factory: ActorFactory) {
        self.slots.push(ActorSlot {
            name,
            label: label.into(),
            factory,
            current: None,
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Runs until ctrl-c, or until every actor has shut down.
    pub async fn start(&mut self) {
        let mut check_interval = time::interval(self.check_interval);
        let (supervisor_tx, mut supervisor_rx) = mpsc::channel::<ControlMessage>(512);

        for idx in 0..self.slots.len() {
            self.spawn_actor(idx, supervisor_tx.clone());
        }

        loop {
            tokio::select! {
                // Messages first, so a Shutdown is seen before its finished handle.
                biased;

                Some(msg) = supervisor_rx.recv() => {
                    match msg {
                        ControlMessage::Heartbeat(id) => {
                            if let Some(running) = self.running_mut(id) {
                                running.pulse = Instant::now();
                            }
                        }
                        ControlMessage::Shutdown(id) => {
                            if let Some(idx) = self.slot_of(id) {
                                let slot = &mut self.slots[idx];
                                warn!("{:?}[{}] is shutting down gracefully.", slot.name, slot.label);
                                if let Some(running) = slot.current.take() {
                                    running.handle.abort();
                                }
                            }
                            if self.slots.iter().all(|s| s.current.is_none()) {
                                info!("All actors stopped.");
                                break;
                            }
                        }
                        ControlMessage::Error(id, error_msg) => {
                            if let Some(idx) = self.slot_of(id) {
                                let slot = &mut self.slots[idx];
                                error!("Actor {:?}[{}] reported error: {}", slot.name, slot.label, error_msg);
                            }
                        }
                    }
                }

                _ = check_interval.tick() => {
                    let dead_timeout = Instant::now() - self.timeout;

                    let dead: Vec<usize> = self
                        .slots
                        .iter()
                        .enumerate()
                        .filter(|(_, slot)| {
                            slot.current
                                .as_ref()
                                .is_some_and(|r| r.pulse < dead_timeout || r.handle.is_finished())
                        })
                        .map(|(idx, _)| idx)
                        .collect();

                    for idx in dead {
                        let slot = &mut self.slots[idx];
                        warn!("{:?}[{}] is unresponsive! Restarting.", slot.name, slot.label);
                        if let Some(running) = slot.current.take() {
                            running.handle.abort();
                        }
                        self.spawn_actor(idx, supervisor_tx.clone());
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, stopping actors.");
                    break;
                }
            }
        }

        for slot in self.slots.iter_mut() {
            if let Some(running) = slot.current.take() {
                running.handle.abort();
            }
        }
    }

    fn slot_of(&self, id: Uuid) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.current.as_ref().is_some_and(|r| r.id == id))
    }

    fn running_mut(&mut self, id: Uuid) -> Option<&mut Running> {
        self.slots
            .iter_mut()
            .filter_map(|s| s.current.as_mut())
            .find(|r| r.id == id)
    }

    fn spawn_actor(&mut self, idx: usize, tx: mpsc::Sender<ControlMessage>) {
        let slot = &mut self.slots[idx];
        let mut new_actor = (slot.factory)();
        let id = new_actor.id();
        let name = slot.name;
        let label = slot.label.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = new_actor.run(tx).await {
                error!("Actor {:?}[{}] crashed: {}", name, label, e);
            }
        });

        slot.current = Some(Running {
            id,
            pulse: Instant::now(),
            handle,
        });
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
