//! Loto sheet generation.
//!
//! A [`Sheet`] is three [`Ticket`]s generated together. Each ticket is a
//! 3x9 grid where every row holds exactly five numbers and every column
//! draws from a fixed decade (`1-9`, `10-19`, ..., `80-90`). Numbers are
//! drawn from per-column pools that are shared by all three tickets, so a
//! number never appears twice anywhere on the sheet.
//!
//! ## Example
//!
//! ```
//! use loto::sheet::generate_sheet;
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let sheet = generate_sheet(&mut rng);
//! assert_eq!(sheet.rows().count(), 9);
//! assert_eq!(sheet.numbers().count(), 45);
//! ```

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Number of columns on a ticket.
pub const COLUMNS: usize = 9;

/// Number of rows on a ticket.
pub const ROWS_PER_TICKET: usize = 3;

/// Number of tickets on a sheet.
pub const TICKETS_PER_SHEET: usize = 3;

/// Filled cells per row.
pub const NUMBERS_PER_ROW: usize = 5;

/// Highest number that can be called or printed on a ticket.
pub const MAX_NUMBER: u8 = 90;

/// Value range of each column. The last column also takes 90.
pub const COLUMN_RANGES: [RangeInclusive<u8>; COLUMNS] = [
    1..=9,
    10..=19,
    20..=29,
    30..=39,
    40..=49,
    50..=59,
    60..=69,
    70..=79,
    80..=90,
];

/// A single cell: empty or holding one number.
pub type Cell = Option<u8>;

/// One row of a ticket.
pub type Row = [Cell; COLUMNS];

/// A 3x9 loto ticket.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ticket([Row; ROWS_PER_TICKET]);

impl Ticket {
    pub fn rows(&self) -> &[Row; ROWS_PER_TICKET] {
        &self.0
    }

    /// Cell at `(row, column)`, `None` when empty or out of bounds.
    pub fn cell(&self, row: usize, column: usize) -> Cell {
        self.0.get(row).and_then(|r| r.get(column)).copied().flatten()
    }

    /// All numbers on the ticket in row-major order.
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().flat_map(|row| row.iter().flatten().copied())
    }
}

/// Three tickets generated together with no repeated number.
///
/// Serializes as the flat list of its nine rows.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(into = "Vec<Row>", try_from = "Vec<Row>")]
pub struct Sheet([Ticket; TICKETS_PER_SHEET]);

impl From<Sheet> for Vec<Row> {
    fn from(sheet: Sheet) -> Self {
        sheet.rows().copied().collect()
    }
}

impl TryFrom<Vec<Row>> for Sheet {
    type Error = String;

    fn try_from(rows: Vec<Row>) -> Result<Self, Self::Error> {
        if rows.len() != ROWS_PER_TICKET * TICKETS_PER_SHEET {
            return Err(format!(
                "sheet needs {} rows, got {}",
                ROWS_PER_TICKET * TICKETS_PER_SHEET,
                rows.len()
            ));
        }
        let tickets = std::array::from_fn(|t| {
            Ticket(std::array::from_fn(|r| rows[t * ROWS_PER_TICKET + r]))
        });
        Ok(Self(tickets))
    }
}

impl Sheet {
    pub fn tickets(&self) -> &[Ticket; TICKETS_PER_SHEET] {
        &self.0
    }

    /// The nine rows of the sheet, ticket by ticket.
    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.0.iter().flat_map(|ticket| ticket.rows().iter())
    }

    /// All numbers on the sheet in row-major order.
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().flat_map(Ticket::numbers)
    }

    /// Rows as owned vectors, the shape a win claim is submitted in.
    pub fn to_claim(&self) -> Vec<Vec<Cell>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

/// Generate a complete three-ticket sheet.
///
/// Every column starts from an independently shuffled pool holding its
/// whole range. For each ticket, each row picks five columns by shuffling
/// the column indices and taking the first five. Each column then takes as
/// many numbers from the front of its pool as the ticket has filled cells
/// in that column, sorts them, and writes them top to bottom.
pub fn generate_sheet<R>(rng: &mut R) -> Sheet
where
    R: Rng + ?Sized,
{
    let mut pools: [Vec<u8>; COLUMNS] = std::array::from_fn(|column| {
        let mut pool: Vec<u8> = COLUMN_RANGES[column].clone().collect();
        pool.shuffle(rng);
        pool
    });

    let tickets = std::array::from_fn(|_| fill_ticket(rng, &mut pools));
    Sheet(tickets)
}

/// Generate a single ticket.
///
/// This is the first ticket of a fresh sheet. Tickets from separate calls
/// are independent and may share numbers.
pub fn generate_ticket<R>(rng: &mut R) -> Ticket
where
    R: Rng + ?Sized,
{
    generate_sheet(rng).0[0]
}

fn fill_ticket<R>(rng: &mut R, pools: &mut [Vec<u8>; COLUMNS]) -> Ticket
where
    R: Rng + ?Sized,
{
    let mut layout = [[false; COLUMNS]; ROWS_PER_TICKET];

    for row in 0..ROWS_PER_TICKET {
        let mut columns: Vec<usize> = (0..COLUMNS).collect();
        columns.shuffle(rng);

        let mut picked = 0;
        for column in columns {
            if picked == NUMBERS_PER_ROW {
                break;
            }
            // Skip columns whose pool can't cover another cell.
            let reserved = layout.iter().filter(|r| r[column]).count();
            if pools[column].len() <= reserved {
                continue;
            }
            layout[row][column] = true;
            picked += 1;
        }
    }

    let mut rows = [[None; COLUMNS]; ROWS_PER_TICKET];
    for (column, pool) in pools.iter_mut().enumerate() {
        let filled: Vec<usize> = (0..ROWS_PER_TICKET)
            .filter(|&row| layout[row][column])
            .collect();
        if filled.is_empty() {
            continue;
        }

        let take = filled.len().min(pool.len());
        let mut drawn: Vec<u8> = pool.drain(..take).collect();
        drawn.sort_unstable();

        for (row, number) in filled.into_iter().zip(drawn) {
            rows[row][column] = Some(number);
        }
    }

    Ticket(rows)
}
