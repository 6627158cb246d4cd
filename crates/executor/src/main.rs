use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::sync::broadcast;
use tracing::{info, warn};

use common::actors::{Actor, ActorType};
use common::config::DeskConfig;
use common::logger;
use poller::{FallbackNotifier, Fanout, Notifier, SignalPoller};
use signal_api::{SignalClient, SignalSource};

use crate::actors::supervisor::Supervisor;
use crate::services::alerts::{ConsoleAlert, OffloadedNotifier, TerminalBell};
use crate::services::panel_service::PanelRenderer;
use crate::services::poller_service::PollerService;
use crate::services::refresh_service::RefreshListener;
use crate::services::telegram_service::{TelegramRelay, TelegramService};

mod actors;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    info!("Signal desk starting up...");

    let config = DeskConfig::from_env().context("Invalid configuration")?;
    info!(
        "API {} | symbols {:?} | timeframe {} | every {:?}",
        config.api_base, config.symbols, config.timeframe, config.poll_interval
    );

    let client = SignalClient::new(&config.api_base, config.http_timeout)?;
    // Off the startup path so the first poll is not held up by a dead API.
    let health_client = client.clone();
    tokio::spawn(async move {
        match health_client.health().await {
            Ok(true) => info!("Signal API is up"),
            Ok(false) => warn!("Signal API reports not ok, polling anyway"),
            Err(e) => warn!("Signal API health check failed ({}), polling anyway", e),
        }
    });

    let mut supervisor = Supervisor::new();

    let mut fanout = Fanout::new().with(Arc::new(OffloadedNotifier::new(Arc::new(
        FallbackNotifier::new(TerminalBell::new(config.alert_beeps), ConsoleAlert::stderr()),
    ))));

    if let Some(telegram) = config.telegram.clone() {
        let (telegram_tx, telegram_rx) = broadcast::channel::<String>(64);
        fanout = fanout.with(Arc::new(TelegramRelay::new(telegram_tx)));
        supervisor.register_actor(
            ActorType::TelegramRelay,
            "telegram",
            Box::new(move || -> Box<dyn Actor> {
                Box::new(TelegramService::new(&telegram, telegram_rx.resubscribe()))
            }),
        );
    }

    let notifier: Arc<dyn Notifier> = Arc::new(fanout);
    let source: Arc<dyn SignalSource> = Arc::new(client.clone());

    let pollers: Vec<Arc<SignalPoller>> = config
        .queries()
        .into_iter()
        .map(|query| {
            Arc::new(SignalPoller::new(
                query,
                config.poll_interval,
                source.clone(),
                notifier.clone(),
            ))
        })
        .collect();

    for poller in &pollers {
        let label = poller.query().to_string();

        let for_panel = poller.clone();
        supervisor.register_actor(
            ActorType::PanelRenderer,
            label.clone(),
            Box::new(move || -> Box<dyn Actor> {
                Box::new(PanelRenderer::new(
                    for_panel.query().clone(),
                    for_panel.subscribe(),
                ))
            }),
        );

        let for_service = poller.clone();
        supervisor.register_actor(
            ActorType::SignalPoller,
            label,
            Box::new(move || -> Box<dyn Actor> { Box::new(PollerService::new(for_service.clone())) }),
        );
    }

    let for_refresh = pollers.clone();
    supervisor.register_actor(
        ActorType::RefreshListener,
        "stdin",
        Box::new(move || -> Box<dyn Actor> {
            Box::new(RefreshListener::new(for_refresh.clone(), client.clone()))
        }),
    );

    info!("Supervising {} actors", supervisor.len());
    supervisor.start().await;
    info!("Signal desk stopped.");
    Ok(())
}
