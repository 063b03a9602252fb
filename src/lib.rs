//! Doorman - Telegram Channel Admission Bot
//!
//! Moderates membership admission to a set of monitored broadcast channels:
//! decides, for each pending join request, whether to admit or reject the
//! requester, and remembers which users previously departed a channel so
//! they are never silently re-admitted.
//!
//! Core pieces:
//! - durable departure ledger (`ledger`)
//! - pure suspicion classifier and batch processor (`admission`)
//! - Bot API integration and command front end (`telegram`)

pub mod admission;
pub mod ledger;
pub mod telegram;
