//! Telegram Integration Module
//!
//! Everything that touches the messaging platform:
//! - `traits`: client abstraction and domain types
//! - `api`: Bot API implementation over HTTP
//! - `mock`: in-memory client for tests
//! - `commands`: operator command parsing
//! - `bot`: dispatch loop and batch-run orchestration

pub mod api;
pub mod bot;
pub mod commands;
pub mod mock;
pub mod traits;

pub use api::BotApi;
pub use bot::{split_message, BotSettings, DoormanBot, MAX_MESSAGE_CHARS};
pub use commands::{help_message, parse_command, Command};
pub use mock::MockTelegramClient;
pub use traits::{
    ChatId, ChatKind, IncomingMessage, JoinRequest, MemberStatus, MemberTransition,
    TelegramClient, TelegramError, TelegramResult, Update, UserId, UserProfile,
};
