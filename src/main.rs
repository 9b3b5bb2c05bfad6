use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use intake_bot::channels::{Channel, CliChannel, Messenger, TelegramChannel};
use intake_bot::config::{BotConfig, RecordStoreConfig};
use intake_bot::menu::MenuResolver;
use intake_bot::records::{LibSqlRecordStore, RecordStore, SheetsRecordStore};
use intake_bot::router::{DialogueRouter, InboundEvent};
use intake_bot::session::{SessionStore, UserId};

type Job = (InboundEvent, Arc<dyn Messenger>);

/// A transport's inbound and outbound halves.
fn register<C>(channel: Arc<C>) -> (Arc<dyn Channel>, Arc<dyn Messenger>)
where
    C: Channel + Messenger + 'static,
{
    let inbound: Arc<dyn Channel> = channel.clone();
    let outbound: Arc<dyn Messenger> = channel;
    (inbound, outbound)
}

/// One worker per user drains that user's events in arrival order.
fn spawn_user_worker(
    router: Arc<DialogueRouter>,
    user_id: UserId,
) -> (mpsc::UnboundedSender<Job>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
    let handle = tokio::spawn(async move {
        debug!(user_id = %user_id, "User worker started");
        while let Some((event, messenger)) = rx.recv().await {
            router
                .handle_and_send(messenger.as_ref(), &user_id, event)
                .await;
        }
    });
    (tx, handle)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("Invalid configuration")?;

    eprintln!("🤱 Intake bot v{}", env!("CARGO_PKG_VERSION"));

    let questionnaire = config
        .flow
        .questionnaire()
        .context("Invalid questionnaire")?;

    let records: Arc<dyn RecordStore> = match &config.records {
        RecordStoreConfig::Sheets(sheets) => {
            eprintln!(
                "   Records: Google Sheets ({}, range {})",
                sheets.spreadsheet_id, sheets.range
            );
            Arc::new(SheetsRecordStore::new(sheets.clone()))
        }
        RecordStoreConfig::LibSql { path } => {
            eprintln!("   Records: libSQL ({})", path.display());
            Arc::new(
                LibSqlRecordStore::new_local(path, questionnaire.columns())
                    .await
                    .context("Failed to open record database")?,
            )
        }
    };

    let router = Arc::new(
        DialogueRouter::new(
            Arc::new(SessionStore::in_memory()),
            MenuResolver::default(),
            questionnaire,
            records,
        )
        .with_intro_profiles(config.flow.intro_profiles.clone()),
    );

    let mut channels = Vec::new();
    let mut active_channels = Vec::new();

    if let Some(telegram) = &config.telegram {
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            if telegram.allowed_users.iter().any(|u| u == "*") {
                "everyone".to_string()
            } else {
                telegram.allowed_users.join(", ")
            }
        );
        let channel = Arc::new(TelegramChannel::new(
            telegram.bot_token.clone(),
            telegram.allowed_users.clone(),
        ));
        channel
            .health_check()
            .await
            .context("Telegram getMe failed; check BOT_TOKEN")?;
        channels.push(register(channel));
        active_channels.push("telegram");
    }

    if config.cli_enabled {
        channels.push(register(Arc::new(CliChannel::new())));
        active_channels.push("cli");
    }

    eprintln!("   Channels: {}\n", active_channels.join(", "));

    let mut streams = Vec::with_capacity(channels.len());
    for (channel, messenger) in &channels {
        let stream = channel
            .start()
            .await
            .with_context(|| format!("Failed to start {} channel", channel.name()))?;
        let messenger = Arc::clone(messenger);
        streams.push(
            stream
                .map(move |event| (event, Arc::clone(&messenger)))
                .boxed(),
        );
    }
    let mut events = futures::stream::select_all(streams);
    let mut queues: HashMap<UserId, mpsc::UnboundedSender<Job>> = HashMap::new();
    let mut workers = Vec::new();

    loop {
        tokio::select! {
            next = events.next() => {
                let Some((incoming, messenger)) = next else {
                    info!("All channels closed");
                    break;
                };
                debug!(
                    channel = incoming.channel,
                    user_id = %incoming.user_id,
                    event = incoming.event.kind(),
                    "Event received"
                );
                let mut job = (incoming.event, messenger);
                if let Some(queue) = queues.get(&incoming.user_id) {
                    match queue.send(job) {
                        Ok(()) => continue,
                        Err(mpsc::error::SendError(returned)) => job = returned,
                    }
                }
                let (queue, worker) =
                    spawn_user_worker(Arc::clone(&router), incoming.user_id.clone());
                workers.push(worker);
                if queue.send(job).is_ok() {
                    queues.insert(incoming.user_id, queue);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    for (channel, _) in &channels {
        if let Err(e) = channel.shutdown().await {
            warn!(channel = channel.name(), error = %e, "Channel shutdown failed");
        }
    }

    // Closing the queues lets each worker finish what it already received.
    drop(queues);
    for worker in workers {
        if let Err(e) = worker.await {
            warn!(error = %e, "User worker panicked");
        }
    }

    Ok(())
}
