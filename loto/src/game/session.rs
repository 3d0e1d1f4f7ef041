//! The shared table record and the rules that mutate it.
//!
//! [`Session`] owns the roster, the host seat, the round phase, the pot and
//! the called numbers. Every operation checks authority, phase and data
//! before touching anything, so a rejected call leaves the session exactly
//! as it was.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::{
    called_numbers::CalledNumbers,
    constants::{DEFAULT_STARTING_BALANCE, MAX_TICKET_PRICE},
    entities::{Chips, ConnectionId, DisplayName, GameStateView, Phase, Player, PlayerView},
    functional::winning_row,
};
use crate::sheet::{Cell, MAX_NUMBER};

/// Reasons an action is refused.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum SessionError {
    #[error("only the host can do that")]
    NotHost,
    #[error("player is not at the table")]
    UnknownPlayer,
    #[error("not allowed while {actual}, table must be {expected}")]
    WrongPhase { expected: Phase, actual: Phase },
    #[error("already holding a ticket this round")]
    AlreadyHasTicket,
    #[error("no ticket waiting for approval")]
    NoPendingTicket,
    #[error("player has no ticket")]
    NoTicket,
    #[error("ticket not bought or not approved")]
    TicketNotApproved,
    #[error("ticket price must be between 1 and {max}, got {0}", max = MAX_TICKET_PRICE)]
    InvalidPrice(Chips),
    #[error("chip amount out of range")]
    ChipOverflow,
    #[error("pot is empty")]
    EmptyPot,
    #[error("all numbers have been called")]
    AllNumbersCalled,
}

/// Table rules fixed for the lifetime of a session.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub starting_balance: Chips,
    /// Secret that makes a joining connection the host. `None` disables hosting.
    pub host_secret: Option<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
            host_secret: None,
        }
    }
}

/// Result of a join.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinOutcome {
    pub name: DisplayName,
    /// The connection was already seated; only its name changed.
    pub rejoined: bool,
    /// The connection presented the host secret.
    pub claimed_host: bool,
    /// Host that lost the seat to this join.
    pub demoted: Option<(ConnectionId, DisplayName)>,
}

/// Result of a disconnect.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeaveOutcome {
    pub player: Player,
    pub was_host: bool,
}

/// Result of a ticket purchase.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Purchase {
    pub name: DisplayName,
    pub price: Chips,
    pub balance: Chips,
    /// The purchase pushed the balance below zero.
    pub in_debt: bool,
}

/// Result of a host revoking a ticket.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Revocation {
    /// Approved ticket sent back to pending. No money moves.
    Demoted { name: DisplayName },
    /// Pending ticket cancelled and its price refunded.
    Refunded { name: DisplayName, amount: Chips },
}

/// Result of a win claim that passed validation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WinCheck {
    Won {
        name: DisplayName,
        amount: Chips,
        row: usize,
    },
    Missed {
        name: DisplayName,
    },
}

/// The one shared table.
#[derive(Debug)]
pub struct Session {
    settings: GameSettings,
    players: HashMap<ConnectionId, Player>,
    host: Option<ConnectionId>,
    phase: Phase,
    ticket_price: Chips,
    pot: Chips,
    called: CalledNumbers,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

impl From<GameSettings> for Session {
    fn from(settings: GameSettings) -> Self {
        Self::new(settings)
    }
}

impl Session {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            players: HashMap::new(),
            host: None,
            phase: Phase::Idle,
            ticket_price: 0,
            pot: 0,
            called: CalledNumbers::new(),
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    pub fn ticket_price(&self) -> Chips {
        self.ticket_price
    }

    pub fn host(&self) -> Option<ConnectionId> {
        self.host
    }

    pub fn is_host(&self, id: &ConnectionId) -> bool {
        self.host.as_ref() == Some(id)
    }

    pub fn player(&self, id: &ConnectionId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn called_numbers(&self) -> &CalledNumbers {
        &self.called
    }

    /// Seat a connection, or rename it if it is already seated.
    ///
    /// A rejoin keeps the player's balance and ticket state, so leaving a
    /// debt behind takes a new connection.
    ///
    /// Presenting the host secret moves the host seat to this connection.
    /// Any previous host is reported in [`JoinOutcome::demoted`].
    pub fn join(
        &mut self,
        id: ConnectionId,
        name: DisplayName,
        secret: Option<&str>,
    ) -> JoinOutcome {
        let rejoined = match self.players.get_mut(&id) {
            Some(player) => {
                player.name = name.clone();
                true
            }
            None => {
                self.players
                    .insert(id, Player::new(name.clone(), self.settings.starting_balance));
                false
            }
        };

        let claimed_host = secret.is_some_and(|s| self.secret_matches(s));
        let mut demoted = None;
        if claimed_host {
            if let Some(previous) = self.host.filter(|previous| previous != &id) {
                demoted = self
                    .players
                    .get(&previous)
                    .map(|p| (previous, p.name.clone()));
            }
            self.host = Some(id);
        } else if secret.is_some() {
            debug!("Connection {id} presented a wrong host secret");
        }

        JoinOutcome {
            name,
            rejoined,
            claimed_host,
            demoted,
        }
    }

    /// Remove a connection. A departing host leaves the table host-less.
    pub fn leave(&mut self, id: &ConnectionId) -> Result<LeaveOutcome, SessionError> {
        let player = self.players.remove(id).ok_or(SessionError::UnknownPlayer)?;
        let was_host = self.is_host(id);
        if was_host {
            self.host = None;
        }
        Ok(LeaveOutcome { player, was_host })
    }

    /// Start a betting round at `price` per ticket.
    pub fn open_betting(&mut self, caller: &ConnectionId, price: Chips) -> Result<(), SessionError> {
        self.require_host(caller)?;
        if !(1..=MAX_TICKET_PRICE).contains(&price) {
            return Err(SessionError::InvalidPrice(price));
        }

        self.ticket_price = price;
        self.pot = 0;
        self.called.clear();
        self.phase = Phase::Betting;
        self.clear_tickets();
        Ok(())
    }

    /// Buy one ticket at the current price. Balances may go negative.
    pub fn buy_ticket(&mut self, caller: &ConnectionId) -> Result<Purchase, SessionError> {
        self.require_phase(Phase::Betting)?;
        let price = self.ticket_price;
        let player = self
            .players
            .get_mut(caller)
            .ok_or(SessionError::UnknownPlayer)?;
        if player.has_ticket {
            return Err(SessionError::AlreadyHasTicket);
        }

        let balance = player
            .balance
            .checked_sub(price)
            .ok_or(SessionError::ChipOverflow)?;
        let pot = self.pot.checked_add(price).ok_or(SessionError::ChipOverflow)?;

        let in_debt = player.balance < price;
        player.balance = balance;
        player.has_ticket = true;
        player.is_approved = false;
        self.pot = pot;

        Ok(Purchase {
            name: player.name.clone(),
            price,
            balance: player.balance,
            in_debt,
        })
    }

    /// Accept a pending ticket.
    pub fn approve(
        &mut self,
        caller: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<DisplayName, SessionError> {
        self.require_host(caller)?;
        let player = self
            .players
            .get_mut(target)
            .ok_or(SessionError::UnknownPlayer)?;
        if !player.is_pending() {
            return Err(SessionError::NoPendingTicket);
        }
        player.is_approved = true;
        Ok(player.name.clone())
    }

    /// Step a ticket back: approved goes to pending, pending is refunded.
    pub fn revoke(
        &mut self,
        caller: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<Revocation, SessionError> {
        self.require_host(caller)?;
        let price = self.ticket_price;
        let player = self
            .players
            .get_mut(target)
            .ok_or(SessionError::UnknownPlayer)?;
        if !player.has_ticket {
            return Err(SessionError::NoTicket);
        }

        if player.is_approved {
            player.is_approved = false;
            return Ok(Revocation::Demoted {
                name: player.name.clone(),
            });
        }

        let balance = player
            .balance
            .checked_add(price)
            .ok_or(SessionError::ChipOverflow)?;
        let pot = self.pot.checked_sub(price).ok_or(SessionError::ChipOverflow)?;

        player.balance = balance;
        player.clear_ticket();
        self.pot = pot;
        Ok(Revocation::Refunded {
            name: player.name.clone(),
            amount: price,
        })
    }

    /// Close betting and begin calling numbers. Returns the pot.
    pub fn start_game(&mut self, caller: &ConnectionId) -> Result<Chips, SessionError> {
        self.require_host(caller)?;
        self.require_phase(Phase::Betting)?;
        if self.pot <= 0 {
            return Err(SessionError::EmptyPot);
        }
        self.phase = Phase::Playing;
        Ok(self.pot)
    }

    /// Draw a number that hasn't been called yet.
    pub fn call_number<R>(&mut self, caller: &ConnectionId, rng: &mut R) -> Result<u8, SessionError>
    where
        R: Rng + ?Sized,
    {
        self.require_host(caller)?;
        self.require_phase(Phase::Playing)?;
        if self.called.is_exhausted() {
            return Err(SessionError::AllNumbersCalled);
        }

        loop {
            let number = rng.random_range(1..=MAX_NUMBER);
            if self.called.insert(number) {
                return Ok(number);
            }
        }
    }

    /// Judge a win claim against the called numbers.
    ///
    /// Any row whose numbers have all been called wins the whole pot and
    /// ends the round.
    pub fn check_win<R>(&mut self, caller: &ConnectionId, rows: &[R]) -> Result<WinCheck, SessionError>
    where
        R: AsRef<[Cell]>,
    {
        let player = self.players.get(caller).ok_or(SessionError::UnknownPlayer)?;
        if !player.can_claim() {
            return Err(SessionError::TicketNotApproved);
        }
        self.require_phase(Phase::Playing)?;

        let Some(row) = winning_row(rows, &self.called) else {
            return Ok(WinCheck::Missed {
                name: player.name.clone(),
            });
        };

        let amount = self.pot;
        let player = self
            .players
            .get_mut(caller)
            .ok_or(SessionError::UnknownPlayer)?;
        player.balance = player
            .balance
            .checked_add(amount)
            .ok_or(SessionError::ChipOverflow)?;
        let name = player.name.clone();
        self.pot = 0;
        self.phase = Phase::Idle;

        Ok(WinCheck::Won { name, amount, row })
    }

    /// Abandon the round. Balances and roster are kept; the pot is dropped.
    pub fn reset(&mut self, caller: &ConnectionId) -> Result<(), SessionError> {
        self.require_host(caller)?;
        self.called.clear();
        self.pot = 0;
        self.phase = Phase::Idle;
        self.clear_tickets();
        Ok(())
    }

    /// Snapshot for clients, ordered by name.
    pub fn view(&self) -> GameStateView {
        let mut players: Vec<PlayerView> = self
            .players
            .iter()
            .map(|(id, p)| PlayerView {
                id: *id,
                name: p.name.clone(),
                balance: p.balance,
                has_ticket: p.has_ticket,
                is_approved: p.is_approved,
                is_host: self.is_host(id),
            })
            .collect();
        players.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        GameStateView {
            players,
            pot: self.pot,
            ticket_price: self.ticket_price,
            game_state: self.phase,
        }
    }

    fn secret_matches(&self, presented: &str) -> bool {
        match &self.settings.host_secret {
            Some(expected) => presented.as_bytes().ct_eq(expected.as_bytes()).into(),
            None => false,
        }
    }

    fn require_host(&self, caller: &ConnectionId) -> Result<(), SessionError> {
        if self.is_host(caller) {
            Ok(())
        } else {
            Err(SessionError::NotHost)
        }
    }

    fn require_phase(&self, expected: Phase) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn clear_tickets(&mut self) {
        for player in self.players.values_mut() {
            player.clear_ticket();
        }
    }
}
