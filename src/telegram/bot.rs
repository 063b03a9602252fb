//! Doorman Telegram Bot
//!
//! Main bot implementation that:
//! - Dispatches operator commands (/approve_all, /approve_user, ...)
//! - Enforces admin privilege via getChatMember before acting
//! - Tracks membership transitions into the departure ledger
//! - Schedules batch admission runs and reports summaries back

use super::commands::{help_message, parse_command, Command};
use super::traits::*;
use crate::admission::{AdmissionProcessor, ChannelTarget, MembershipTracker};
use crate::ledger::DepartureLedger;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Telegram caps message length; longer ledger listings are split.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Bot-level settings
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Delay before a scheduled batch run starts. Effectively "next tick";
    /// kept configurable so tests run without waiting.
    pub batch_delay: Duration,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            batch_delay: Duration::from_secs(1),
        }
    }
}

/// Doorman bot: command front end over the admission engine.
pub struct DoormanBot<C: TelegramClient> {
    client: C,
    processor: Arc<AdmissionProcessor<C>>,
    tracker: MembershipTracker,
    ledger: Arc<DepartureLedger>,
    settings: BotSettings,
}

impl<C: TelegramClient> DoormanBot<C> {
    pub fn new(
        client: C,
        processor: AdmissionProcessor<C>,
        ledger: Arc<DepartureLedger>,
        settings: BotSettings,
    ) -> Self {
        let monitored = processor.config().monitored.clone();
        let tracker = MembershipTracker::new(ledger.clone(), monitored);
        Self {
            client,
            processor: Arc::new(processor),
            tracker,
            ledger,
            settings,
        }
    }

    /// Main update loop. Runs until the process is stopped.
    pub async fn run(&self) {
        loop {
            match self.client.next_updates().await {
                Ok(updates) => {
                    for update in updates {
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch updates: {}", e);
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// Handle one update. Public so tests can drive the bot directly.
    pub async fn handle_update(&self, update: Update) {
        match update {
            Update::Message(message) => self.handle_message(message).await,
            Update::Member(transition) => {
                self.tracker.observe(&transition).await;
            }
        }
    }

    async fn handle_message(&self, message: IncomingMessage) {
        let command = parse_command(&message.text);
        if let Command::Unknown(text) = &command {
            debug!("Ignoring non-command message: {}", text);
            return;
        }

        if command.requires_group_chat() && !message.chat_kind.accepts_commands() {
            self.reply(
                message.chat,
                "This command can only be used in group/channel chats.",
            )
            .await;
            return;
        }

        if command.requires_admin() && !self.verify_admin(&message).await {
            return;
        }

        match command {
            Command::ApproveAll { channel } => self.start_approval(&message, channel).await,
            Command::ApproveUser { user, channel } => {
                self.manual_approve(&message, user, channel).await
            }
            Command::ListLeftUsers => self.list_left_users(message.chat).await,
            Command::ListChannels => self.list_channels(message.chat).await,
            Command::Help => self.reply(message.chat, &help_message()).await,
            Command::Unknown(_) => unreachable!("filtered above"),
        }
    }

    /// Check the sender is an administrator or creator of the issuing chat.
    /// Replies with the error on failure and returns false.
    async fn verify_admin(&self, message: &IncomingMessage) -> bool {
        match self
            .client
            .chat_member_status(message.chat, message.sender)
            .await
        {
            Ok(status) if status.is_privileged() => true,
            Ok(_) => {
                self.reply(
                    message.chat,
                    "You need to be an admin to use this command.",
                )
                .await;
                false
            }
            Err(e) => {
                warn!("Admin check failed for {}: {}", message.sender, e);
                self.reply(message.chat, "Error verifying admin status.").await;
                false
            }
        }
    }

    /// /approve_all: validate the optional channel argument, then schedule a
    /// batch run and report back when it completes.
    async fn start_approval(&self, message: &IncomingMessage, channel: Option<String>) {
        let target = match channel {
            None => {
                self.reply(message.chat, "Starting approval process for all channels...")
                    .await;
                ChannelTarget::All
            }
            Some(arg) => match self.parse_monitored_channel(&arg) {
                Some(chat) => {
                    self.reply(
                        message.chat,
                        &format!("Starting approval process for {}...", chat),
                    )
                    .await;
                    ChannelTarget::One(chat)
                }
                None => {
                    self.reply(
                        message.chat,
                        &format!("Channel {} not found in monitored channels.", arg),
                    )
                    .await;
                    return;
                }
            },
        };

        self.schedule_batch(message.chat, target);
    }

    /// Arrange for one admission run, asynchronously relative to the
    /// triggering command, and deliver exactly one outcome to `origin`:
    /// the summary, or an error message if the run itself fell over.
    fn schedule_batch(&self, origin: ChatId, target: ChannelTarget) {
        let client = self.client.clone();
        let processor = self.processor.clone();
        let delay = self.settings.batch_delay;

        tokio::spawn(async move {
            sleep(delay).await;

            // Per-channel failures are absorbed into the report; a panic in
            // the run itself is contained here and surfaced as an error.
            let outcome = tokio::spawn(async move { processor.run(target).await }).await;

            let text = match outcome {
                Ok(report) => report.summary(),
                Err(e) => {
                    error!("Batch admission run failed: {}", e);
                    format!("Error processing join requests: {}", e)
                }
            };

            if let Err(e) = client.send_message(origin, &text).await {
                error!("Failed to deliver run summary to {}: {}", origin, e);
            }
        });
    }

    /// /approve_user: manual override, always wins over the classifier.
    async fn manual_approve(
        &self,
        message: &IncomingMessage,
        user: Option<String>,
        channel: Option<String>,
    ) {
        let Some(user) = user else {
            self.reply(
                message.chat,
                "Please provide a user ID to approve. Usage: /approve_user <user_id> [channel]",
            )
            .await;
            return;
        };

        let Ok(user_id) = user.parse::<i64>() else {
            self.reply(message.chat, "Please provide a valid numeric user ID.")
                .await;
            return;
        };
        let user_id = UserId(user_id);

        // An unmonitored channel argument routes through: approve_manually
        // skips it and the "No channels were approved" reply explains the
        // no-op. An unparseable one can never match a monitored id either.
        let channel = match channel {
            None => None,
            Some(arg) => match arg.parse::<i64>() {
                Ok(id) => Some(ChatId(id)),
                Err(_) => {
                    self.reply(
                        message.chat,
                        &format!("No channels were approved for user {}.", user_id),
                    )
                    .await;
                    return;
                }
            },
        };

        let approved = self.processor.approve_manually(user_id, channel).await;

        if approved.is_empty() {
            self.reply(
                message.chat,
                &format!("No channels were approved for user {}.", user_id),
            )
            .await;
        } else {
            let channels = approved
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            self.reply(
                message.chat,
                &format!("User {} has been manually approved for {}.", user_id, channels),
            )
            .await;
        }
    }

    /// /list_left_users: dump the ledger, split across messages if long.
    async fn list_left_users(&self, chat: ChatId) {
        let snapshot = self.ledger.snapshot().await;

        if snapshot.is_empty() {
            self.reply(chat, "No users in the manual approval list.").await;
            return;
        }

        let mut text = String::from("Users requiring manual approval:\n\n");
        for (user, channels) in snapshot {
            let channels = channels
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            text.push_str(&format!("User ID: {}\nChannels: {}\n\n", user, channels));
        }

        for part in split_message(&text, MAX_MESSAGE_CHARS) {
            self.reply(chat, &part).await;
        }
    }

    /// /list_channels: show the monitored set.
    async fn list_channels(&self, chat: ChatId) {
        let monitored = &self.processor.config().monitored;
        if monitored.is_empty() {
            self.reply(chat, "No channels are being monitored.").await;
            return;
        }

        let channels = monitored
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");
        self.reply(chat, &format!("Channels monitored by this bot:\n{}", channels))
            .await;
    }

    /// A channel argument is valid when it parses as a chat id and is in the
    /// monitored set.
    fn parse_monitored_channel(&self, arg: &str) -> Option<ChatId> {
        let chat = ChatId(arg.parse::<i64>().ok()?);
        self.processor.config().is_monitored(chat).then_some(chat)
    }

    async fn reply(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.client.send_message(chat, text).await {
            error!("Failed to send message to {}: {}", chat, e);
        }
    }
}

/// Split a message into chunks of at most `limit` characters, on char
/// boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        if count == limit {
            parts.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() || parts.is_empty() {
        parts.push(current);
    }
    parts
}
