//! Sheet Generation Example
//!
//! Generates a sheet, calls numbers until one of its rows is complete and
//! shows which row won.

use loto::{CalledNumbers, generate_sheet, functional::{missing_numbers, winning_row}};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);
    let mut rng = StdRng::seed_from_u64(seed);

    println!("=== Loto Sheet (seed {seed}) ===\n");
    let sheet = generate_sheet(&mut rng);
    for (t, ticket) in sheet.tickets().iter().enumerate() {
        println!("Ticket {}", t + 1);
        for row in ticket.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| cell.map_or_else(|| " .".to_string(), |n| format!("{n:2}")))
                .collect();
            println!("  {}", cells.join(" "));
        }
        println!();
    }

    let mut deck: Vec<u8> = (1..=90).collect();
    deck.shuffle(&mut rng);

    let claim = sheet.to_claim();
    let mut called = CalledNumbers::new();
    for n in deck {
        called.insert(n);
        if let Some(row) = winning_row(&claim, &called) {
            println!(
                "Row {} complete after {} calls (last call: {n})",
                row + 1,
                called.len()
            );
            break;
        }
    }

    let closest = claim
        .iter()
        .map(|row| missing_numbers(row, &called).len())
        .filter(|&missing| missing > 0)
        .min();
    if let Some(missing) = closest {
        println!("Runner-up row was {missing} number(s) short");
    }
}
