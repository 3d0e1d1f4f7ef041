//! Win evaluation over player-submitted rows.

use super::called_numbers::CalledNumbers;
use crate::sheet::Cell;

/// A row wins when it has at least one number and all of them were called.
pub fn row_is_complete(row: &[Cell], called: &CalledNumbers) -> bool {
    let mut numbers = row.iter().flatten().peekable();
    numbers.peek().is_some() && numbers.all(|&n| called.contains(n))
}

/// Index of the first winning row, if any.
pub fn winning_row<R>(rows: &[R], called: &CalledNumbers) -> Option<usize>
where
    R: AsRef<[Cell]>,
{
    rows.iter()
        .position(|row| row_is_complete(row.as_ref(), called))
}

/// Numbers on a row that haven't been called yet.
pub fn missing_numbers(row: &[Cell], called: &CalledNumbers) -> Vec<u8> {
    row.iter()
        .flatten()
        .copied()
        .filter(|&n| !called.contains(n))
        .collect()
}
