//! Canonical hand-history archive format (§4.7, §6, C9): a line-oriented,
//! key-value text record ("PHH-style") for completed hands. `convert`
//! builds a `HandRecord` out of the raw entries a hand actually produced
//! and reconstructs an equivalent entry stream back out of one, so the
//! archive is bidirectional end to end — not just at the `HandRecord ↔
//! text` layer `parser`/`writer` cover.

mod convert;
mod error;
mod parser;
mod record;
mod writer;

pub use convert::{entries_from_hand_record, hand_record_from_entries};
pub use error::ArchiveError;
pub use parser::{parse_file, parse_hand};
pub use record::{Action, HandRecord};
pub use writer::{write_file, write_hand};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tablemesh_codec::{Card, Variant};

    fn s1_hand() -> HandRecord {
        HandRecord {
            variant: Variant::TexasHoldem,
            antes: vec![0, 0],
            blinds_or_straddles: vec![50, 100],
            min_bet: 100,
            starting_stacks: vec![1000, 1000],
            actions: vec![
                Action::DealHole {
                    seat: 1,
                    cards: vec![Card::from_str("As").unwrap(), Card::from_str("Ah").unwrap()],
                },
                Action::DealHole {
                    seat: 2,
                    cards: vec![Card::from_str("Ks").unwrap(), Card::from_str("Kd").unwrap()],
                },
                Action::BetRaise { seat: 1, amount: 300 },
                Action::CheckCall {
                    seat: 2,
                    amount: Some(300),
                },
                Action::DealBoard {
                    cards: vec![
                        Card::from_str("Kh").unwrap(),
                        Card::from_str("7s").unwrap(),
                        Card::from_str("2c").unwrap(),
                    ],
                },
                Action::CheckCall {
                    seat: 2,
                    amount: None,
                },
                Action::BetRaise { seat: 1, amount: 400 },
                Action::Fold { seat: 2 },
            ],
            players: vec!["A".into(), "B".into()],
            event: "Home Game".into(),
            day: 30,
            month: 7,
            year: 2026,
            hand: Some(1),
            level: None,
            casino: None,
            city: None,
            region: None,
            country: None,
            currency: None,
        }
    }

    /// S1's literal action list: `"d dh p1 …"`, `"d dh p2 …"`, `"p1 cbr
    /// 300"`, `"p2 cc 300"`, `"d db Kh7s2c"`, `"p2 cc"`, `"p1 cbr 400"`,
    /// `"p2 f"`.
    #[test]
    fn s1_hand_writes_the_published_action_strings() {
        let text = write_hand(&s1_hand());
        let actions_line = text.lines().find(|l| l.starts_with("actions")).unwrap();
        assert!(actions_line.contains("\"d dh p1 AsAh\""));
        assert!(actions_line.contains("\"d dh p2 KsKd\""));
        assert!(actions_line.contains("\"p1 cbr 300\""));
        assert!(actions_line.contains("\"p2 cc 300\""));
        assert!(actions_line.contains("\"d db Kh7s2c\""));
        assert!(actions_line.contains("\"p2 cc\""));
        assert!(actions_line.contains("\"p1 cbr 400\""));
        assert!(actions_line.contains("\"p2 f\""));
    }

    #[test]
    fn parse_emit_round_trips_modulo_whitespace() {
        let original = s1_hand();
        let text = write_hand(&original);
        let parsed = parse_hand(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn file_with_multiple_hands_separated_by_blank_lines_parses() {
        let a = s1_hand();
        let mut b = s1_hand();
        b.hand = Some(2);
        let text = write_file(&[a.clone(), b.clone()]);
        let parsed = parse_file(&text).unwrap();
        assert_eq!(parsed, vec![a, b]);
    }

    #[test]
    fn file_with_dash_separator_also_parses() {
        let a = s1_hand();
        let text = format!("{}\n---\n{}", write_hand(&a), write_hand(&a));
        let parsed = parse_file(&text).unwrap();
        assert_eq!(parsed, vec![a.clone(), a]);
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let text = "variant = \"NT\"\n";
        assert_eq!(
            parse_hand(text).unwrap_err(),
            ArchiveError::MissingKey("antes")
        );
    }

    #[test]
    fn malformed_action_string_is_rejected() {
        let text = write_hand(&s1_hand()).replace("\"p2 f\"", "\"p2 bogus\"");
        assert_eq!(
            parse_hand(&text).unwrap_err(),
            ArchiveError::MalformedAction("p2 bogus".into())
        );
    }
}
