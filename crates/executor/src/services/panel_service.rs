use std::io::{self, Write};

use async_trait::async_trait;
use chrono::Local;
use common::{
    actors::{Actor, ActorType, ControlMessage},
    models::SignalQuery,
};
use poller::DisplayState;
use tokio::sync::{mpsc, watch};
use tracing::info;
use uuid::Uuid;

/// Prints every display-state change of one poller to stdout.
pub struct PanelRenderer {
    id: Uuid,
    query: SignalQuery,
    display_rx: watch::Receiver<DisplayState>,
}

impl PanelRenderer {
    pub fn new(query: SignalQuery, display_rx: watch::Receiver<DisplayState>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query,
            display_rx,
        }
    }

    pub fn render(query: &SignalQuery, state: &DisplayState) -> String {
        let stamp = Local::now().format("%H:%M:%S");
        let mut out = format!("[{}] 📊 {}\n", stamp, query);
        for line in state.to_string().lines() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[async_trait]
impl Actor for PanelRenderer {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::PanelRenderer
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let _heartbeat = self.spawn_heartbeat(supervisor_tx.clone());
        info!("Rendering panel for {}", self.query);

        loop {
            let panel = {
                let state = self.display_rx.borrow_and_update();
                Self::render(&self.query, &state)
            };
            {
                let mut stdout = io::stdout().lock();
                stdout.write_all(panel.as_bytes())?;
                stdout.flush()?;
            }

            if self.display_rx.changed().await.is_err() {
                info!("Poller for {} is gone, closing panel", self.query);
                supervisor_tx.send(ControlMessage::Shutdown(self.id)).await?;
                return Ok(());
            }
        }
    }
}
