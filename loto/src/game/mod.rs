//! Loto game engine - the shared session record and its rules.
//!
//! This module provides:
//! - Player, phase and view entities
//! - The ordered called-number record
//! - Win evaluation over submitted rows
//! - [`Session`], the single mutable table record

pub mod called_numbers;
pub mod constants;
pub mod entities;
pub mod functional;
pub mod session;

pub use called_numbers::CalledNumbers;
pub use session::{
    GameSettings, JoinOutcome, LeaveOutcome, Purchase, Revocation, Session, SessionError,
    WinCheck,
};
