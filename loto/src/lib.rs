//! # Loto
//!
//! A shared-table loto (bingo) game: sheet generation, the round state
//! machine and an async actor that serializes every player action.
//!
//! A round moves through three phases:
//!
//! - **Idle**: players join and chat, nothing is at stake
//! - **Betting**: the host sets a ticket price, players buy tickets and the
//!   host approves or rejects them
//! - **Playing**: the host calls numbers and any approved player may claim a
//!   win with a fully called row
//!
//! A win pays the whole pot and returns the table to Idle.
//!
//! ## Core Modules
//!
//! - [`sheet`]: 3-ticket sheets with unique numbers and fixed column ranges
//! - [`game`]: Session record, host authority and win evaluation
//! - [`table`]: Tokio actor that owns the session and broadcasts events
//!
//! ## Example
//!
//! ```
//! use loto::{Session, GameSettings, entities::{ConnectionId, DisplayName}};
//!
//! let mut session = Session::new(GameSettings {
//!     starting_balance: 500,
//!     host_secret: Some("secret".to_string()),
//! });
//! let host = ConnectionId::new();
//! session.join(host, DisplayName::new("host"), Some("secret"));
//! session.open_betting(&host, 10).unwrap();
//! ```

/// Sheet and ticket generation.
pub mod sheet;
pub use sheet::{Sheet, Ticket, generate_sheet, generate_ticket};

/// Session state, rules and win evaluation.
pub mod game;
pub use game::{
    CalledNumbers, GameSettings, Session, SessionError,
    constants::{self, DEFAULT_NOTABLE_PURCHASE, DEFAULT_STARTING_BALANCE},
    entities, functional,
};

/// Async table actor.
pub mod table;
pub use table::{PlayerAction, ServerEvent, TableActor, TableConfig, TableHandle};
