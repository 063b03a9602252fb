//! `doorman run` — start the bot service.

use super::config::DoormanConfig;
use doorman::admission::{AdmissionProcessor, ProcessorConfig};
use doorman::ledger::{DepartureLedger, JsonFileStore};
use doorman::telegram::{BotApi, BotSettings, DoormanBot};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Load config, wire the components, and run the update loop until stopped.
pub async fn execute(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = DoormanConfig::load(config_path)?;

    init_logging(&config.logging.level);

    // Missing token or an empty monitored set prevents startup; everything
    // past this point is contained and logged, never fatal.
    let token = config
        .resolve_token()
        .ok_or("Bot token is required: set telegram.token or TELEGRAM_BOT_TOKEN")?;

    let monitored = config.monitored_channels();
    if monitored.is_empty() {
        return Err("At least one monitored channel is required (channels.monitored)".into());
    }

    info!(
        "Monitoring channels: {}",
        monitored
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let ledger = Arc::new(DepartureLedger::open(Box::new(JsonFileStore::new(
        config.ledger.path.clone(),
    ))));

    let client = BotApi::new(token);

    let processor_config = ProcessorConfig {
        monitored,
        min_account_age_days: config.moderation.min_account_age_days,
        channel_pause: Duration::from_secs(config.moderation.channel_pause_secs),
    };
    let processor = AdmissionProcessor::new(client.clone(), ledger.clone(), processor_config);

    let settings = BotSettings {
        batch_delay: Duration::from_secs(config.moderation.batch_delay_secs),
    };
    let bot = DoormanBot::new(client, processor, ledger, settings);

    info!("Bot started and polling for updates...");
    bot.run().await;

    Ok(())
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
