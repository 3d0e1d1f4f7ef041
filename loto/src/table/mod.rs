//! The table: one shared loto session behind an async actor.
//!
//! This module implements:
//! - TableActor: owns the [`Session`](crate::game::Session) and applies actions one at a time
//! - TableHandle: cloneable sender used by transports
//! - Event types pushed to connected clients
//!
//! ## Architecture
//!
//! The table runs in its own Tokio task with an mpsc message inbox. Each
//! connection registers an outbound channel on connect; after every action
//! the actor pushes the resulting events without awaiting, so a slow client
//! never stalls the table.
//!
//! ## Example
//!
//! ```no_run
//! use loto::table::{PlayerAction, TableActor, TableConfig};
//! use loto::entities::ConnectionId;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, handle) = TableActor::new(TableConfig::default());
//!     tokio::spawn(actor.run());
//!
//!     let id = ConnectionId::new();
//!     let mut events = handle.connect(id).await.unwrap();
//!     handle
//!         .act(id, PlayerAction::Join { name: "alice".into(), secret: None })
//!         .await
//!         .unwrap();
//!     let first = events.recv().await;
//! }
//! ```

pub mod actor;
pub mod config;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use config::TableConfig;
pub use messages::{
    GameOver, PlayerAction, RoleUpdate, ServerEvent, TableError, TableMessage, TableStateResponse,
};
