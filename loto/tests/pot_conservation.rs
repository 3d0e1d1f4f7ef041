//! Chip conservation across arbitrary betting rounds.
//!
//! Whatever order purchases, approvals and revocations arrive in, the sum
//! of all balances plus the pot must stay equal to what the players were
//! seated with, until a reset forfeits the pot.

use loto::{
    GameSettings, Session,
    entities::{Chips, ConnectionId, DisplayName},
};
use proptest::prelude::*;

const SECRET: &str = "conservation";
const STARTING_BALANCE: Chips = 500;

#[derive(Clone, Debug)]
enum Step {
    Buy(usize),
    Approve(usize),
    Revoke(usize),
}

fn step_strategy(players: usize) -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..players).prop_map(Step::Buy),
        (0..players).prop_map(Step::Approve),
        (0..players).prop_map(Step::Revoke),
    ]
}

fn seated(players: usize) -> (Session, ConnectionId, Vec<ConnectionId>) {
    let mut session = Session::new(GameSettings {
        starting_balance: STARTING_BALANCE,
        host_secret: Some(SECRET.to_string()),
    });
    let host = ConnectionId::new();
    session.join(host, DisplayName::new("host"), Some(SECRET));
    let ids = (0..players)
        .map(|i| {
            let id = ConnectionId::new();
            session.join(id, DisplayName::new(&format!("p{i}")), None);
            id
        })
        .collect();
    (session, host, ids)
}

fn total_chips(session: &Session, host: &ConnectionId, ids: &[ConnectionId]) -> Chips {
    let balances: Chips = ids
        .iter()
        .chain(std::iter::once(host))
        .map(|id| session.player(id).map_or(0, |p| p.balance))
        .sum();
    balances + session.pot()
}

proptest! {
    #[test]
    fn test_betting_conserves_chips(
        price in 1i64..=600,
        steps in prop::collection::vec(step_strategy(5), 0..60),
    ) {
        let (mut session, host, ids) = seated(5);
        let expected = STARTING_BALANCE * 6;
        session.open_betting(&host, price).unwrap();

        for step in steps {
            // Rejections are fine; only the totals matter.
            let _ = match step {
                Step::Buy(i) => session.buy_ticket(&ids[i]).map(|_| ()),
                Step::Approve(i) => session.approve(&host, &ids[i]).map(|_| ()),
                Step::Revoke(i) => session.revoke(&host, &ids[i]).map(|_| ()),
            };
            prop_assert_eq!(total_chips(&session, &host, &ids), expected);

            let tickets = ids
                .iter()
                .filter(|id| session.player(id).is_some_and(|p| p.has_ticket))
                .count() as Chips;
            prop_assert_eq!(session.pot(), tickets * price);
        }
    }

    #[test]
    fn test_approval_never_set_without_ticket(
        steps in prop::collection::vec(step_strategy(3), 0..40),
    ) {
        let (mut session, host, ids) = seated(3);
        session.open_betting(&host, 10).unwrap();

        for step in steps {
            let _ = match step {
                Step::Buy(i) => session.buy_ticket(&ids[i]).map(|_| ()),
                Step::Approve(i) => session.approve(&host, &ids[i]).map(|_| ()),
                Step::Revoke(i) => session.revoke(&host, &ids[i]).map(|_| ()),
            };
            for id in &ids {
                let player = session.player(id).unwrap();
                prop_assert!(player.has_ticket || !player.is_approved);
            }
        }
    }
}

#[test]
fn test_reset_forfeits_pot_only() {
    let (mut session, host, ids) = seated(3);
    session.open_betting(&host, 20).unwrap();
    for id in &ids {
        session.buy_ticket(id).unwrap();
    }
    assert_eq!(session.pot(), 60);

    session.reset(&host).unwrap();

    assert_eq!(session.pot(), 0);
    assert_eq!(total_chips(&session, &host, &ids), STARTING_BALANCE * 4 - 60);
}
