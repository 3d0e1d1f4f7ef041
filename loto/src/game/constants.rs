use super::entities::Chips;

/// Balance every player starts with.
pub const DEFAULT_STARTING_BALANCE: Chips = 500;

/// Highest ticket price a host may set.
pub const MAX_TICKET_PRICE: Chips = 1_000_000;

/// Ticket price from which a purchase is announced in the table log.
pub const DEFAULT_NOTABLE_PURCHASE: Chips = 10;

/// Longest display name kept, in characters.
pub const MAX_NAME_LENGTH: usize = 32;

/// Longest chat message kept, in characters.
pub const MAX_CHAT_LENGTH: usize = 500;

/// Name shown for players who joined with a blank name.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Sender shown for chat from connections that never joined.
pub const UNKNOWN_SENDER: &str = "Stranger";
