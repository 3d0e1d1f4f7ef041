//! Table actor implementation with message handling.

use super::{
    config::TableConfig,
    messages::{
        GameOver, PlayerAction, RoleUpdate, ServerEvent, TableError, TableMessage,
        TableStateResponse,
    },
};
use crate::{
    game::{
        Revocation, Session, SessionError, WinCheck,
        constants::UNKNOWN_SENDER,
        entities::{ChatEntry, Chips, ConnectionId, DisplayName, LogLevel},
    },
    sheet::Cell,
};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    subscriber_buffer: usize,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, subscriber_buffer: usize) -> Self {
        Self {
            sender,
            subscriber_buffer,
        }
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), TableError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::Closed)
    }

    /// Register a connection and get the receiving end of its event stream.
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
    ) -> Result<mpsc::Receiver<ServerEvent>, TableError> {
        let (sender, receiver) = mpsc::channel(self.subscriber_buffer);
        self.send(TableMessage::Connect {
            connection_id,
            sender,
        })
        .await?;
        Ok(receiver)
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<(), TableError> {
        self.send(TableMessage::Disconnect { connection_id }).await
    }

    pub async fn act(
        &self,
        connection_id: ConnectionId,
        action: PlayerAction,
    ) -> Result<(), TableError> {
        self.send(TableMessage::Action {
            connection_id,
            action,
        })
        .await
    }

    /// Snapshot of the table
    pub async fn state(&self) -> Result<TableStateResponse, TableError> {
        let (response, receiver) = oneshot::channel();
        self.send(TableMessage::GetState { response }).await?;
        receiver.await.map_err(|_| TableError::Closed)
    }

    pub async fn close(&self) -> Result<(), TableError> {
        self.send(TableMessage::Close).await
    }

    /// The actor has stopped and dropped its inbox
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Table actor owning the one shared session.
///
/// Message handlers never await, so every action is applied and broadcast
/// completely before the next message is read from the inbox.
pub struct TableActor {
    /// Table configuration
    config: TableConfig,

    /// Roster, host seat, phase, pot and called numbers
    session: Session,

    /// Source for number draws
    rng: Box<dyn RngCore + Send>,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Outbound event channels, one per open connection
    subscribers: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor.
    ///
    /// Draws come from `config.rng_seed` when set, otherwise from OS entropy.
    pub fn new(config: TableConfig) -> (Self, TableHandle) {
        let rng: Box<dyn RngCore + Send> = match config.rng_seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_os_rng()),
        };
        Self::with_rng(config, rng)
    }

    /// Create a table actor drawing numbers from `rng`
    pub fn with_rng(config: TableConfig, rng: Box<dyn RngCore + Send>) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let handle = TableHandle::new(sender, config.subscriber_buffer.max(1));

        let actor = Self {
            session: Session::new(config.game_settings()),
            config,
            rng,
            inbox,
            subscribers: HashMap::new(),
            is_closed: false,
        };

        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table '{}' starting", self.config.name);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);

            if self.is_closed {
                break;
            }
        }

        log::info!("Table '{}' closed", self.config.name);
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Connect {
                connection_id,
                sender,
            } => {
                log::debug!("Connection {connection_id} opened");
                self.subscribers.insert(connection_id, sender);
            }

            TableMessage::Disconnect { connection_id } => self.handle_disconnect(connection_id),

            TableMessage::Action {
                connection_id,
                action,
            } => self.handle_action(connection_id, action),

            TableMessage::GetState { response } => {
                let _ = response.send(self.get_state());
            }

            TableMessage::Close => {
                log::info!("Table '{}' closing", self.config.name);
                self.is_closed = true;
                self.subscribers.clear();
            }
        }
    }

    fn handle_action(&mut self, id: ConnectionId, action: PlayerAction) {
        let action_name = action.name();
        let host_only = action.is_host_only();
        let result = match action {
            PlayerAction::Join { name, secret } => {
                self.handle_join(id, DisplayName::new(&name), secret.as_deref());
                Ok(())
            }
            PlayerAction::Chat { text } => {
                self.handle_chat(id, &text);
                Ok(())
            }
            PlayerAction::OpenBetting { price } => self.handle_open_betting(id, price),
            PlayerAction::BuyTicket => self.handle_buy_ticket(id),
            PlayerAction::Approve { target } => self.handle_approve(id, target),
            PlayerAction::Revoke { target } => self.handle_revoke(id, target),
            PlayerAction::StartGame => self.handle_start_game(id),
            PlayerAction::CallNumber => self.handle_call_number(id),
            PlayerAction::CheckWin { rows } => self.handle_check_win(id, &rows),
            PlayerAction::Reset => self.handle_reset(id),
        };

        match result {
            Ok(()) => {}
            Err(SessionError::NotHost) if host_only => {
                log::debug!("Ignoring host-only {action_name} from non-host connection {id}");
            }
            Err(e) => {
                log::debug!("Ignoring {action_name} from connection {id}: {e}");
            }
        }
    }

    fn handle_join(&mut self, id: ConnectionId, name: DisplayName, secret: Option<&str>) {
        let outcome = self.session.join(id, name, secret);

        if outcome.rejoined {
            log::info!("Connection {id} renamed to '{}'", outcome.name);
        } else {
            log::info!("'{}' joined the table", outcome.name);
            self.broadcast_system_log(LogLevel::Info, format!("{} joined the table!", outcome.name));
        }

        if outcome.claimed_host {
            if let Some((previous, previous_name)) = &outcome.demoted {
                self.send_to(previous, ServerEvent::RoleUpdate(RoleUpdate { is_host: false }));
                self.broadcast_system_log(
                    LogLevel::Warning,
                    format!("{previous_name} lost the host seat to {}.", outcome.name),
                );
            }
            log::info!("'{}' is now the host", outcome.name);
            self.send_to(&id, ServerEvent::RoleUpdate(RoleUpdate { is_host: true }));
            self.broadcast_system_log(LogLevel::Success, format!("{} is now the host!", outcome.name));
        } else {
            let is_host = self.session.is_host(&id);
            self.send_to(&id, ServerEvent::RoleUpdate(RoleUpdate { is_host }));
        }

        self.broadcast_game_state();
        let history = self.session.called_numbers().as_slice().to_vec();
        self.send_to(&id, ServerEvent::SyncNumbers(history));
    }

    fn handle_disconnect(&mut self, id: ConnectionId) {
        self.subscribers.remove(&id);

        match self.session.leave(&id) {
            Ok(outcome) => {
                log::info!("'{}' left the table", outcome.player.name);
                self.broadcast_system_log(
                    LogLevel::Info,
                    format!("{} left the table.", outcome.player.name),
                );
                if outcome.was_host {
                    log::warn!("Host disconnected, table has no host");
                    self.broadcast_system_log(
                        LogLevel::Error,
                        "The host left. The table waits for the host to return.",
                    );
                }
                self.broadcast_game_state();
            }
            Err(_) => log::debug!("Connection {id} closed without joining"),
        }
    }

    fn handle_chat(&mut self, id: ConnectionId, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let sender = self
            .session
            .player(&id)
            .map_or_else(|| UNKNOWN_SENDER.to_string(), |p| p.name.to_string());
        self.broadcast(ServerEvent::ReceiveChat(ChatEntry::user(sender, text)));
    }

    fn handle_open_betting(&mut self, id: ConnectionId, price: Chips) -> Result<(), SessionError> {
        if let Err(e) = self.session.open_betting(&id, price) {
            if let SessionError::InvalidPrice(price) = e {
                log::warn!("Host tried to open betting at {price}");
            }
            return Err(e);
        }

        log::info!("Betting opened at {price} per ticket");
        self.broadcast(ServerEvent::GameReset);
        self.broadcast_game_state();
        self.broadcast_system_log(
            LogLevel::Warning,
            format!("Betting is open! Tickets cost {price}."),
        );
        Ok(())
    }

    fn handle_buy_ticket(&mut self, id: ConnectionId) -> Result<(), SessionError> {
        let purchase = self.session.buy_ticket(&id)?;
        log::debug!(
            "'{}' bought a ticket for {}, balance {}",
            purchase.name,
            purchase.price,
            purchase.balance
        );

        self.broadcast_game_state();
        if purchase.in_debt {
            self.broadcast_system_log(
                LogLevel::Error,
                format!("{} bought a ticket on credit! Balance: {}", purchase.name, purchase.balance),
            );
        } else if purchase.price >= self.config.notable_purchase {
            self.broadcast_system_log(
                LogLevel::Info,
                format!("{} bought a ticket for {}.", purchase.name, purchase.price),
            );
        }
        Ok(())
    }

    fn handle_approve(&mut self, id: ConnectionId, target: ConnectionId) -> Result<(), SessionError> {
        let name = self.session.approve(&id, &target)?;
        log::debug!("Approved ticket of '{name}'");
        self.broadcast_game_state();
        Ok(())
    }

    fn handle_revoke(&mut self, id: ConnectionId, target: ConnectionId) -> Result<(), SessionError> {
        match self.session.revoke(&id, &target)? {
            Revocation::Demoted { name } => {
                log::debug!("Approval of '{name}' withdrawn");
                self.broadcast_game_state();
            }
            Revocation::Refunded { name, amount } => {
                log::debug!("Refunded {amount} to '{name}'");
                self.broadcast_game_state();
                self.broadcast_system_log(
                    LogLevel::Warning,
                    format!("{name}'s ticket was rejected and {amount} refunded."),
                );
            }
        }
        Ok(())
    }

    fn handle_start_game(&mut self, id: ConnectionId) -> Result<(), SessionError> {
        let pot = self.session.start_game(&id)?;
        log::info!("Game started with pot {pot}");
        self.broadcast_game_state();
        self.broadcast_system_log(
            LogLevel::Success,
            format!("Betting closed! The pot is {pot}. Let's play!"),
        );
        Ok(())
    }

    fn handle_call_number(&mut self, id: ConnectionId) -> Result<(), SessionError> {
        let number = self.session.call_number(&id, self.rng.as_mut())?;
        log::debug!(
            "Called {number} ({} of 90)",
            self.session.called_numbers().len()
        );
        self.broadcast(ServerEvent::NewNumber(number));
        self.broadcast_game_state();
        Ok(())
    }

    fn handle_check_win(&mut self, id: ConnectionId, rows: &[Vec<Cell>]) -> Result<(), SessionError> {
        let check = match self.session.check_win(&id, rows) {
            Ok(check) => check,
            Err(SessionError::TicketNotApproved) => {
                let name = self.player_name(&id);
                self.send_to(&id, ServerEvent::CheckFail);
                self.broadcast_system_log(
                    LogLevel::Error,
                    format!("{name} called a win without an approved ticket!"),
                );
                return Ok(());
            }
            Err(e @ SessionError::WrongPhase { .. }) => {
                self.send_to(&id, ServerEvent::CheckFail);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let name = self.player_name(&id);
        self.broadcast_system_log(LogLevel::Warning, format!("{name} is checking for a win..."));

        match check {
            WinCheck::Won { name, amount, row } => {
                log::info!("'{name}' won {amount} with row {row}");
                self.broadcast_game_state();
                self.broadcast_system_log(
                    LogLevel::Success,
                    format!("{name} wins the pot of {amount}!"),
                );
                self.broadcast(ServerEvent::GameOver(GameOver {
                    winner_name: name.to_string(),
                    win_amount: amount,
                }));
            }
            WinCheck::Missed { name } => {
                log::debug!("'{name}' claimed a win without a full row");
                self.broadcast_system_log(LogLevel::Error, format!("{name}'s claim fell short."));
                self.send_to(&id, ServerEvent::CheckFail);
            }
        }
        Ok(())
    }

    fn handle_reset(&mut self, id: ConnectionId) -> Result<(), SessionError> {
        self.session.reset(&id)?;
        log::info!("Table reset by host");
        self.broadcast(ServerEvent::GameReset);
        self.broadcast_game_state();
        self.broadcast_system_log(LogLevel::Warning, "The host reset the table.");
        Ok(())
    }

    fn get_state(&self) -> TableStateResponse {
        TableStateResponse {
            table_name: self.config.name.clone(),
            view: self.session.view(),
            called_numbers: self.session.called_numbers().as_slice().to_vec(),
            last_called: self.session.called_numbers().last(),
            connection_count: self.subscribers.len(),
            has_host: self.session.host().is_some(),
        }
    }

    fn player_name(&self, id: &ConnectionId) -> String {
        self.session
            .player(id)
            .map_or_else(|| UNKNOWN_SENDER.to_string(), |p| p.name.to_string())
    }

    fn broadcast_game_state(&mut self) {
        self.broadcast(ServerEvent::UpdateGameState(self.session.view()));
    }

    fn broadcast_system_log(&mut self, level: LogLevel, content: impl Into<String>) {
        self.broadcast(ServerEvent::ReceiveChat(ChatEntry::system(level, content)));
    }

    /// Push an event to every open connection, dropping closed ones
    fn broadcast(&mut self, event: ServerEvent) {
        self.subscribers.retain(|id, sender| {
            match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Connection {id} channel full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Connection {id} gone, removing");
                    false
                }
            }
        });
    }

    fn send_to(&mut self, id: &ConnectionId, event: ServerEvent) {
        let Some(sender) = self.subscribers.get(id) else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("Connection {id} channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("Connection {id} gone, removing");
                self.subscribers.remove(id);
            }
        }
    }
}
