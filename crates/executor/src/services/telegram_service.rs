use async_trait::async_trait;
use common::{
    actors::{Actor, ActorType, ControlMessage},
    config::TelegramConfig,
    models::Signal,
};
use poller::Notifier;
use teloxide::prelude::*;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Queues a text message per notification for the Telegram actor.
pub struct TelegramRelay {
    tx: broadcast::Sender<String>,
}

impl TelegramRelay {
    pub fn new(tx: broadcast::Sender<String>) -> Self {
        Self { tx }
    }

    pub fn format(signal: &Signal) -> String {
        let mut msg = format!("📊 New signal: {}", signal.headline());
        if let Some(tf) = signal.timeframe.as_deref() {
            msg.push_str(&format!(" [{}]", tf));
        }
        if let Some(reason) = signal.reason.as_deref() {
            msg.push_str(&format!("\nReason: {}", reason));
        }
        if let Some(conf) = signal.confidence.or(signal.ml_confidence) {
            msg.push_str(&format!("\nConfidence: {:.2}", conf));
        }
        msg
    }
}

impl Notifier for TelegramRelay {
    fn notify(&self, signal: &Signal) {
        if self.tx.send(Self::format(signal)).is_err() {
            debug!("No Telegram service listening, dropping notification");
        }
    }
}

pub struct TelegramService {
    id: Uuid,
    bot: Bot,
    chat_id: ChatId,
    rx: broadcast::Receiver<String>,
}

impl TelegramService {
    pub fn new(config: &TelegramConfig, rx: broadcast::Receiver<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bot: Bot::new(config.token.clone()),
            chat_id: ChatId(config.chat_id),
            rx,
        }
    }
}

#[async_trait]
impl Actor for TelegramService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::TelegramRelay
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let _heartbeat = self.spawn_heartbeat(supervisor_tx.clone());
        info!("Starting Telegram Notification Service");

        loop {
            match self.rx.recv().await {
                Ok(msg) => {
                    // Send message and log error if it fails, but don't crash
                    if let Err(e) = self.bot.send_message(self.chat_id, msg).await {
                        error!("Failed to send Telegram message: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    error!("Telegram service lagged behind. Missed {} messages.", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Telegram notification channel closed. Stopping service.");
                    supervisor_tx.send(ControlMessage::Shutdown(self.id)).await?;
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::{Side, SignalId};

    #[test]
    fn test_relay_formats_and_queues() {
        let (tx, mut rx) = broadcast::channel(4);
        let relay = TelegramRelay::new(tx);

        relay.notify(&Signal {
            id: Some(SignalId::Number(12)),
            symbol: Some("ETHUSDT".to_string()),
            timeframe: Some("5m".to_string()),
            side: Some(Side::Sell),
            entry: Some(3000.0),
            reason: Some("bearish BOS".to_string()),
            confidence: Some(0.7),
            ..Default::default()
        });

        let msg = rx.try_recv().unwrap();
        assert_eq!(
            msg,
            "📊 New signal: SELL ETHUSDT @ 3000.00 [5m]\nReason: bearish BOS\nConfidence: 0.70"
        );
    }

    #[test]
    fn test_relay_without_listener_does_not_panic() {
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        TelegramRelay::new(tx).notify(&Signal::default());
    }
}
