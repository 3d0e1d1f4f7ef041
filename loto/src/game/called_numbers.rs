//! Record of the numbers the host has drawn this round.

use crate::sheet::MAX_NUMBER;

const SLOTS: usize = MAX_NUMBER as usize + 1;

/// Called numbers in call order, with constant-time membership.
#[derive(Clone, Debug)]
pub struct CalledNumbers {
    order: Vec<u8>,
    marked: [bool; SLOTS],
}

impl CalledNumbers {
    pub fn new() -> Self {
        Self {
            order: Vec::with_capacity(MAX_NUMBER as usize),
            marked: [false; SLOTS],
        }
    }

    /// Record a call. Returns `false` for repeats and numbers outside `1..=90`.
    pub fn insert(&mut self, number: u8) -> bool {
        if number == 0 || number > MAX_NUMBER || self.marked[number as usize] {
            return false;
        }
        self.marked[number as usize] = true;
        self.order.push(number);
        true
    }

    pub fn contains(&self, number: u8) -> bool {
        self.marked.get(number as usize).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Every number from 1 to 90 has been called.
    pub fn is_exhausted(&self) -> bool {
        self.order.len() >= MAX_NUMBER as usize
    }

    /// Most recent call.
    pub fn last(&self) -> Option<u8> {
        self.order.last().copied()
    }

    /// All calls, oldest first.
    pub fn as_slice(&self) -> &[u8] {
        &self.order
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.marked = [false; SLOTS];
    }
}

impl Default for CalledNumbers {
    fn default() -> Self {
        Self::new()
    }
}
