//! Table configuration models.

use serde::{Deserialize, Serialize};

use crate::game::{
    GameSettings,
    constants::{DEFAULT_NOTABLE_PURCHASE, DEFAULT_STARTING_BALANCE},
    entities::Chips,
};

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Balance given to each joining player (default: 500)
    pub starting_balance: Chips,

    /// Secret that grants the host seat on join
    pub host_secret: Option<String>,

    /// Ticket price from which purchases are announced (default: 10)
    pub notable_purchase: Chips,

    /// Capacity of the actor inbox
    pub inbox_capacity: usize,

    /// Per-connection outbound event buffer
    pub subscriber_buffer: usize,

    /// Fixed seed for number draws; `None` seeds from the OS
    pub rng_seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Loto Table".to_string(),
            starting_balance: DEFAULT_STARTING_BALANCE,
            host_secret: None,
            notable_purchase: DEFAULT_NOTABLE_PURCHASE,
            inbox_capacity: 256,
            subscriber_buffer: 64,
            rng_seed: None,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.starting_balance < 0 {
            return Err("Starting balance cannot be negative".to_string());
        }

        if self.notable_purchase < 0 {
            return Err("Notable purchase threshold cannot be negative".to_string());
        }

        if self.host_secret.as_deref().is_some_and(str::is_empty) {
            return Err("Host secret cannot be empty".to_string());
        }

        if self.inbox_capacity == 0 || self.subscriber_buffer == 0 {
            return Err("Channel capacities must be at least 1".to_string());
        }

        Ok(())
    }

    /// Rules handed to the session
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            starting_balance: self.starting_balance,
            host_secret: self.host_secret.clone(),
        }
    }
}
