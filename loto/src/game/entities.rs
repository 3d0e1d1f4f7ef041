use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::constants::{ANONYMOUS_NAME, MAX_CHAT_LENGTH, MAX_NAME_LENGTH};

/// Money unit. Balances may go negative.
pub type Chips = i64;

/// Stable identifier of one client connection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A player's display name, trimmed and length-capped.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(s: &str) -> Self {
        let name = truncate_chars(s.trim(), MAX_NAME_LENGTH);
        if name.is_empty() {
            Self(ANONYMOUS_NAME.to_string())
        } else {
            Self(name)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for DisplayName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for DisplayName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DisplayName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Round phase of the table.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Idle,
    Betting,
    Playing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Idle => "idle",
            Self::Betting => "betting",
            Self::Playing => "playing",
        };
        write!(f, "{repr}")
    }
}

/// A seated player.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Player {
    pub name: DisplayName,
    pub balance: Chips,
    /// Bought a ticket this round.
    pub has_ticket: bool,
    /// Ticket accepted by the host. Only set while `has_ticket` is.
    pub is_approved: bool,
}

impl Player {
    pub fn new(name: DisplayName, balance: Chips) -> Self {
        Self {
            name,
            balance,
            has_ticket: false,
            is_approved: false,
        }
    }

    /// Holds a ticket the host hasn't approved yet.
    pub fn is_pending(&self) -> bool {
        self.has_ticket && !self.is_approved
    }

    pub fn can_claim(&self) -> bool {
        self.has_ticket && self.is_approved
    }

    pub(crate) fn clear_ticket(&mut self) {
        self.has_ticket = false;
        self.is_approved = false;
    }
}

/// Client-facing projection of one player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: ConnectionId,
    pub name: DisplayName,
    pub balance: Chips,
    pub has_ticket: bool,
    pub is_approved: bool,
    pub is_host: bool,
}

/// Full table snapshot pushed after every state change.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    pub players: Vec<PlayerView>,
    pub pot: Chips,
    pub ticket_price: Chips,
    pub game_state: Phase,
}

impl GameStateView {
    pub fn player(&self, id: &ConnectionId) -> Option<&PlayerView> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn host(&self) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.is_host)
    }
}

/// Severity of a system log line.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// One line of the shared chat panel.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ChatEntry {
    User {
        sender: String,
        content: String,
        timestamp: i64,
    },
    System {
        sub_type: LogLevel,
        content: String,
        timestamp: i64,
    },
}

impl ChatEntry {
    pub fn user(sender: impl Into<String>, content: &str) -> Self {
        Self::User {
            sender: sender.into(),
            content: truncate_chars(content, MAX_CHAT_LENGTH),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn system(sub_type: LogLevel, content: impl Into<String>) -> Self {
        Self::System {
            sub_type,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::User { content, .. } | Self::System { content, .. } => content,
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
