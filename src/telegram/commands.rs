//! Operator Command Parsing
//!
//! Parses the slash commands operators issue in group chats. Validation of
//! arguments (numeric ids, monitored-channel membership, privilege) happens
//! in the bot dispatch layer; the parser only shapes the text.

/// Parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Process all pending join requests, optionally for one channel
    ApproveAll { channel: Option<String> },

    /// Manually approve a user, optionally for one channel. A missing user
    /// argument still parses; dispatch replies with usage.
    ApproveUser {
        user: Option<String>,
        channel: Option<String>,
    },

    /// List users requiring manual approval
    ListLeftUsers,

    /// List monitored channels
    ListChannels,

    /// Show help
    Help,

    /// Not a command we know
    Unknown(String),
}

impl Command {
    /// Command syntax and description for help text.
    ///
    /// Returns a (syntax, description) tuple; `None` for Unknown.
    pub fn help_text(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Command::ApproveAll { .. } => Some((
                "/approve_all [channel]",
                "Process all pending join requests",
            )),
            Command::ApproveUser { .. } => Some((
                "/approve_user <user_id> [channel]",
                "Manually approve a user",
            )),
            Command::ListLeftUsers => Some((
                "/list_left_users",
                "List users requiring manual approval",
            )),
            Command::ListChannels => Some(("/list_channels", "List all monitored channels")),
            Command::Help => Some(("/help", "Show this help message")),
            Command::Unknown(_) => None,
        }
    }

    /// Whether this command requires admin privilege in the issuing chat.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::ApproveAll { .. } | Command::ApproveUser { .. } | Command::ListLeftUsers
        )
    }

    /// Whether this command may only be issued from a group-like chat.
    /// Moderation commands act on channel state; the informational ones
    /// answer anywhere, including private chats.
    pub fn requires_group_chat(&self) -> bool {
        matches!(
            self,
            Command::ApproveAll { .. } | Command::ApproveUser { .. } | Command::ListLeftUsers
        )
    }
}

/// Full help message listing every user-facing command.
pub fn help_message() -> String {
    let commands = [
        Command::ApproveAll { channel: None },
        Command::ApproveUser {
            user: None,
            channel: None,
        },
        Command::ListLeftUsers,
        Command::ListChannels,
        Command::Help,
    ];

    let mut text = String::from("Hi! I am a multi-channel approval bot.\n\nCommands:\n");
    for command in commands {
        if let Some((syntax, description)) = command.help_text() {
            text.push_str(&format!("{} - {}\n", syntax, description));
        }
    }
    text
}

/// Parse a message into a command.
pub fn parse_command(text: &str) -> Command {
    let text = text.trim();

    if !text.starts_with('/') {
        return Command::Unknown(text.to_string());
    }

    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.is_empty() {
        return Command::Unknown(text.to_string());
    }

    // Commands may carry a bot-name suffix in groups: /approve_all@doorman_bot
    let name = parts[0].split('@').next().unwrap_or(parts[0]);

    match name {
        "/approve_all" => Command::ApproveAll {
            channel: parts.get(1).map(|s| s.to_string()),
        },

        "/approve_user" => Command::ApproveUser {
            user: parts.get(1).map(|s| s.to_string()),
            channel: parts.get(2).map(|s| s.to_string()),
        },

        "/list_left_users" => Command::ListLeftUsers,

        "/list_channels" => Command::ListChannels,

        "/start" | "/help" => Command::Help,

        _ => Command::Unknown(text.to_string()),
    }
}
