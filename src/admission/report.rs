//! Run Report
//!
//! Accumulated outcome of one batch admission pass: per-channel status lines
//! plus running totals. Built up during the run and immutable once handed to
//! the caller.

use crate::telegram::traits::ChatId;

/// Per-channel outcomes and totals for one admission run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    lines: Vec<String>,
    total_approved: u64,
    total_rejected: u64,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed channel's tally and add it to the totals.
    pub fn record_tally(&mut self, chat: ChatId, approved: u64, rejected: u64) {
        self.lines.push(format!(
            "{}: approved {}, rejected {}",
            chat, approved, rejected
        ));
        self.total_approved += approved;
        self.total_rejected += rejected;
    }

    /// Record a channel that failed entirely. Totals are unaffected.
    pub fn record_error(&mut self, chat: ChatId, error: &dyn std::fmt::Display) {
        self.lines.push(format!("Error processing {}: {}", chat, error));
    }

    pub fn total_approved(&self) -> u64 {
        self.total_approved
    }

    pub fn total_rejected(&self) -> u64 {
        self.total_rejected
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Render the operator-facing summary message.
    pub fn summary(&self) -> String {
        format!(
            "Approval sweep complete!\nTotal approved: {}\nTotal rejected: {}\n\n{}",
            self.total_approved,
            self.total_rejected,
            self.lines.join("\n")
        )
    }
}
