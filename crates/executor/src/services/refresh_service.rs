use std::sync::Arc;

use async_trait::async_trait;
use common::actors::{Actor, ActorType, ControlMessage};
use futures_util::future::join_all;
use poller::{CycleOutcome, SignalPoller};
use signal_api::SignalClient;
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    List(usize),
    Health,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("r") | Some("refresh") => Self::Refresh,
            Some("list") | Some("l") => match parts.next() {
                None => Self::List(DEFAULT_LIST_LIMIT),
                Some(n) => n
                    .parse::<usize>()
                    .map(Self::List)
                    .unwrap_or_else(|_| Self::Unknown(line.trim().to_string())),
            },
            Some("health") | Some("h") => Self::Health,
            Some("q") | Some("quit") => Self::Quit,
            Some(_) => Self::Unknown(line.trim().to_string()),
        }
    }
}

/// Manual refresh trigger and a few read-only API commands, driven by stdin.
pub struct RefreshListener {
    id: Uuid,
    pollers: Vec<Arc<SignalPoller>>,
    client: SignalClient,
}

impl RefreshListener {
    pub fn new(pollers: Vec<Arc<SignalPoller>>, client: SignalClient) -> Self {
        Self {
            id: Uuid::new_v4(),
            pollers,
            client,
        }
    }

    async fn refresh_all(&self) {
        let outcomes = join_all(self.pollers.iter().map(|p| p.fetch_once())).await;
        for (poller, outcome) in self.pollers.iter().zip(outcomes) {
            if outcome == CycleOutcome::Coalesced {
                info!("{}: refresh skipped, a fetch is already running", poller.query());
            }
        }
    }

    async fn list(&self, limit: usize) {
        match self.client.recent_signals().await {
            Ok(signals) if signals.is_empty() => println!("No signals recorded yet."),
            Ok(signals) => {
                for s in signals.iter().take(limit) {
                    let id = s.id.as_ref().map(ToString::to_string).unwrap_or_default();
                    let created = s
                        .created_at_utc()
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("#{:<6} {}  {}", id, created, s.headline());
                }
            }
            Err(e) => warn!("Failed to list signals: {}", e),
        }
    }

    async fn health(&self) {
        match self.client.health().await {
            Ok(true) => println!("Signal API at {} is healthy.", self.client.base_url()),
            Ok(false) => println!("Signal API at {} reports not ok.", self.client.base_url()),
            Err(e) => warn!("Health check failed: {}", e),
        }
    }

    /// Handles commands until `quit` (returns `true`) or end of input (`false`).
    /// Lines that are not valid UTF-8 are skipped.
    async fn serve<R: AsyncBufRead + Unpin>(&self, reader: R) -> std::io::Result<bool> {
        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(false),
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    warn!("Ignoring unreadable input: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match Command::parse(&line) {
                Command::Refresh => self.refresh_all().await,
                Command::List(n) => self.list(n).await,
                Command::Health => self.health().await,
                Command::Quit => return Ok(true),
                Command::Unknown(raw) => warn!("Unknown command: {}", raw),
            }
        }
    }
}

#[async_trait]
impl Actor for RefreshListener {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::RefreshListener
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let _heartbeat = self.spawn_heartbeat(supervisor_tx.clone());
        info!("Commands: [enter]/r = refresh, list [n], health, q = stop listening");

        if self.serve(BufReader::new(io::stdin())).await? {
            info!("Refresh listener stopped; pollers keep running");
        } else {
            info!("stdin closed; pollers keep running");
        }
        supervisor_tx.send(ControlMessage::Shutdown(self.id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn listener() -> RefreshListener {
        let client = SignalClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        RefreshListener::new(Vec::new(), client)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(""), Command::Refresh);
        assert_eq!(Command::parse("  R "), Command::Refresh);
        assert_eq!(Command::parse("refresh"), Command::Refresh);
        assert_eq!(Command::parse("list"), Command::List(10));
        assert_eq!(Command::parse("list 3"), Command::List(3));
        assert_eq!(Command::parse("health"), Command::Health);
        assert_eq!(Command::parse("quit"), Command::Quit);
        assert_eq!(
            Command::parse("list many"),
            Command::Unknown("list many".to_string())
        );
        assert_eq!(Command::parse("buy"), Command::Unknown("buy".to_string()));
    }

    #[tokio::test]
    async fn test_unreadable_line_is_skipped() {
        let input: &[u8] = b"\xff\xfe\nbogus\nq\nrefresh\n";
        assert!(listener().serve(input).await.unwrap());
    }

    #[tokio::test]
    async fn test_end_of_input_stops_without_quit() {
        let input: &[u8] = b"\xc3\n";
        assert!(!listener().serve(input).await.unwrap());
    }
}
