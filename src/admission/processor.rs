//! Admission Processor
//!
//! Drains pending join requests for a target set of channels and applies the
//! departure ledger plus the suspicion classifier to approve or reject each
//! one. Channels are processed sequentially, never in parallel: the
//! inter-channel pause exists to avoid bursting the Bot API, and concurrency
//! would defeat that control.
//!
//! Failure policy (one level per failure, nothing here is fatal):
//! - per-item: a request that cannot be evaluated is rejected
//! - per-channel: a failed fetch becomes an error line in the report and the
//!   remaining channels still run
//! - approve/decline call failures are logged, never retried

use super::classifier::{classify, Verdict};
use super::report::RunReport;
use crate::ledger::DepartureLedger;
use crate::telegram::traits::{ChatId, JoinRequest, TelegramClient, UserId};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Channels one processor run acts on. Resolved once per run and held
/// immutable for that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    /// Every monitored channel.
    All,
    /// One specific monitored channel.
    One(ChatId),
}

/// Tunables for the processor, injected rather than hardcoded so tests run
/// without wall-clock waits.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// The monitored channel set. Requests and events for any other chat are
    /// ignored.
    pub monitored: Vec<ChatId>,

    /// Minimum account age before a known-age account passes the classifier.
    pub min_account_age_days: i64,

    /// Courtesy pause between channels. Rate control, not correctness.
    pub channel_pause: Duration,
}

impl ProcessorConfig {
    pub fn new(monitored: Vec<ChatId>) -> Self {
        Self {
            monitored,
            min_account_age_days: super::classifier::DEFAULT_MIN_ACCOUNT_AGE_DAYS,
            channel_pause: Duration::from_secs(1),
        }
    }

    pub fn is_monitored(&self, chat: ChatId) -> bool {
        self.monitored.contains(&chat)
    }
}

/// Batch join-request processor over a ledger, a classifier, and a client.
pub struct AdmissionProcessor<C: TelegramClient> {
    client: C,
    ledger: Arc<DepartureLedger>,
    config: ProcessorConfig,
}

impl<C: TelegramClient> AdmissionProcessor<C> {
    pub fn new(client: C, ledger: Arc<DepartureLedger>, config: ProcessorConfig) -> Self {
        Self {
            client,
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Channels a target resolves to. An unmonitored `One` target resolves
    /// to nothing; callers validate before scheduling a run.
    fn resolve(&self, target: ChannelTarget) -> Vec<ChatId> {
        match target {
            ChannelTarget::All => self.config.monitored.clone(),
            ChannelTarget::One(chat) if self.config.is_monitored(chat) => vec![chat],
            ChannelTarget::One(_) => Vec::new(),
        }
    }

    /// Run one batch admission pass over the resolved target.
    ///
    /// Each channel is processed independently: a failed fetch records an
    /// error line and the run continues with the next channel.
    pub async fn run(&self, target: ChannelTarget) -> RunReport {
        let mut report = RunReport::new();

        for chat in self.resolve(target) {
            match self.client.pending_join_requests(chat).await {
                Ok(requests) => {
                    let (approved, rejected) = self.drain_channel(chat, requests).await;
                    report.record_tally(chat, approved, rejected);
                    sleep(self.config.channel_pause).await;
                }
                Err(e) => {
                    error!("Error processing {}: {}", chat, e);
                    report.record_error(chat, &e);
                }
            }
        }

        report
    }

    /// Evaluate every pending request for one channel, in fetch order.
    async fn drain_channel(&self, chat: ChatId, requests: Vec<JoinRequest>) -> (u64, u64) {
        let mut approved = 0;
        let mut rejected = 0;

        for request in requests {
            let user = &request.user;

            // A prior departure is sufficient cause regardless of the
            // current profile; the classifier is not consulted.
            if self.ledger.has_left(user.id, chat).await {
                self.decline(chat, user.id).await;
                info!("Declined {} (previously left {})", user.label(), chat);
                rejected += 1;
                continue;
            }

            match classify(user, Utc::now(), self.config.min_account_age_days) {
                Verdict::Legitimate => {
                    self.approve(chat, user.id).await;
                    info!("Approved {} for {}", user.label(), chat);
                    approved += 1;
                }
                Verdict::Suspicious(reason) => {
                    self.decline(chat, user.id).await;
                    warn!("Declined {} for {}: {}", user.label(), chat, reason);
                    rejected += 1;
                }
            }
        }

        (approved, rejected)
    }

    /// Manually approve one user, clearing any departure record first.
    ///
    /// Manual approval always wins: the approve call is issued regardless of
    /// what the classifier would say, and regardless of whether a request is
    /// currently pending. Channels outside the monitored set are silently
    /// skipped. Returns the channels an approve call was issued for.
    pub async fn approve_manually(&self, user: UserId, channel: Option<ChatId>) -> Vec<ChatId> {
        let channels = match channel {
            Some(chat) => vec![chat],
            None => self.config.monitored.clone(),
        };

        let mut approved = Vec::new();
        for chat in channels {
            if !self.config.is_monitored(chat) {
                continue;
            }

            if self.ledger.clear(user, chat).await {
                info!("Cleared departure record for {} in {}", user, chat);
            }

            self.approve(chat, user).await;
            info!("Manually approved {} for {}", user, chat);
            approved.push(chat);
        }

        approved
    }

    /// Fire-and-forget approve; failures are logged, not retried.
    async fn approve(&self, chat: ChatId, user: UserId) {
        if let Err(e) = self.client.approve_join_request(chat, user).await {
            error!("Failed to approve {} for {}: {}", user, chat, e);
        }
    }

    /// Fire-and-forget decline; failures are logged, not retried.
    async fn decline(&self, chat: ChatId, user: UserId) {
        if let Err(e) = self.client.decline_join_request(chat, user).await {
            error!("Failed to decline {} for {}: {}", user, chat, e);
        }
    }
}
