//! Admission-Decision Engine
//!
//! The core of the bot: decides, for each pending join request on a monitored
//! channel, whether to admit or reject the requester.
//!
//! - `classifier`: pure suspicion heuristics over a user profile
//! - `processor`: batch join-request drain with per-channel isolation,
//!   rate pacing, and the manual-override path
//! - `report`: per-channel tallies and totals for one run
//! - `tracker`: membership transitions -> departure-ledger writes

pub mod classifier;
pub mod processor;
pub mod report;
pub mod tracker;

pub use classifier::{classify, Verdict, DEFAULT_MIN_ACCOUNT_AGE_DAYS, SUSPICIOUS_KEYWORDS};
pub use processor::{AdmissionProcessor, ChannelTarget, ProcessorConfig};
pub use report::RunReport;
pub use tracker::MembershipTracker;
