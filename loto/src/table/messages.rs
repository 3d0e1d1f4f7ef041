//! Table actor message types.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::game::entities::{ChatEntry, Chips, ConnectionId, GameStateView};
use crate::sheet::Cell;

/// Something a connected client asked the table to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    /// Take a seat, optionally presenting the host secret
    Join {
        name: String,
        secret: Option<String>,
    },

    /// Say something in the shared chat
    Chat { text: String },

    /// Host: open a betting round at `price` per ticket
    OpenBetting { price: Chips },

    /// Buy a ticket for this round
    BuyTicket,

    /// Host: accept a pending ticket
    Approve { target: ConnectionId },

    /// Host: demote an approved ticket or refund a pending one
    Revoke { target: ConnectionId },

    /// Host: close betting and begin drawing
    StartGame,

    /// Host: draw the next number
    CallNumber,

    /// Claim a win with the rows of a sheet
    CheckWin { rows: Vec<Vec<Cell>> },

    /// Host: abandon the round
    Reset,
}

impl PlayerAction {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::Join { .. } => "join",
            PlayerAction::Chat { .. } => "chat",
            PlayerAction::OpenBetting { .. } => "open_betting",
            PlayerAction::BuyTicket => "buy_ticket",
            PlayerAction::Approve { .. } => "approve",
            PlayerAction::Revoke { .. } => "revoke",
            PlayerAction::StartGame => "start_game",
            PlayerAction::CallNumber => "call_number",
            PlayerAction::CheckWin { .. } => "check_win",
            PlayerAction::Reset => "reset",
        }
    }

    /// Only the host may do this
    pub fn is_host_only(&self) -> bool {
        matches!(
            self,
            PlayerAction::OpenBetting { .. }
                | PlayerAction::Approve { .. }
                | PlayerAction::Revoke { .. }
                | PlayerAction::StartGame
                | PlayerAction::CallNumber
                | PlayerAction::Reset
        )
    }
}

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// A transport connection opened; events for it go to `sender`
    Connect {
        connection_id: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
    },

    /// A transport connection closed
    Disconnect { connection_id: ConnectionId },

    /// A client action
    Action {
        connection_id: ConnectionId,
        action: PlayerAction,
    },

    /// Get current table state
    GetState {
        response: oneshot::Sender<TableStateResponse>,
    },

    /// Stop the actor
    Close,
}

/// Role of the receiving connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdate {
    pub is_host: bool,
}

/// End-of-round announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOver {
    pub winner_name: String,
    pub win_amount: Chips,
}

/// Events pushed from the table to connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Whether the receiving connection is the host
    RoleUpdate(RoleUpdate),

    /// Full table snapshot
    UpdateGameState(GameStateView),

    /// Chat line or system log line
    ReceiveChat(ChatEntry),

    /// Every number called so far, oldest first
    SyncNumbers(Vec<u8>),

    /// Clear any locally shown called numbers
    GameReset,

    /// A number was just called
    NewNumber(u8),

    /// The receiver's win claim was refused or missed
    CheckFail,

    /// Someone won the pot
    GameOver(GameOver),
}

/// Table state response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStateResponse {
    /// Table name
    pub table_name: String,

    /// Client-facing snapshot
    pub view: GameStateView,

    /// Numbers called this round, oldest first
    pub called_numbers: Vec<u8>,

    /// Most recent call, if any
    pub last_called: Option<u8>,

    /// Open transport connections
    pub connection_count: usize,

    /// Whether someone holds the host seat
    pub has_host: bool,
}

/// Errors talking to a table actor
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table is closed")]
    Closed,
}
