//! Playing cards, shared by the mental-poker commitment protocol, the
//! state replay board/hole cards, and the hand-archive grammar (§4.7).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    const ORDER: [char; 13] = [
        '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
    ];

    pub fn to_char(self) -> char {
        Self::ORDER[self as usize]
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ORDER.iter().position(|&r| r == c).map(|i| {
            // Safety-free: index is bounded by ORDER's own length.
            const VARIANTS: [Rank; 13] = [
                Rank::Two,
                Rank::Three,
                Rank::Four,
                Rank::Five,
                Rank::Six,
                Rank::Seven,
                Rank::Eight,
                Rank::Nine,
                Rank::Ten,
                Rank::Jack,
                Rank::Queen,
                Rank::King,
                Rank::Ace,
            ];
            VARIANTS[i]
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub fn to_char(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'c' => Some(Suit::Clubs),
            'd' => Some(Suit::Diamonds),
            'h' => Some(Suit::Hearts),
            's' => Some(Suit::Spades),
            _ => None,
        }
    }
}

/// One playing card: a rank character from `23456789TJQKA` followed by a
/// suit character from `cdhs` (§4.7), e.g. `As`, `Kh`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// All 52 cards of a standard deck, in a fixed canonical order
    /// (rank-major, suit-minor) used as the un-shuffled reference deck for
    /// mental-poker deck seeding (§4.5).
    pub fn standard_deck() -> Vec<Card> {
        let ranks = [
            Rank::Two,
            Rank::Three,
            Rank::Four,
            Rank::Five,
            Rank::Six,
            Rank::Seven,
            Rank::Eight,
            Rank::Nine,
            Rank::Ten,
            Rank::Jack,
            Rank::Queen,
            Rank::King,
            Rank::Ace,
        ];
        let suits = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
        let mut deck = Vec::with_capacity(52);
        for &rank in &ranks {
            for &suit in &suits {
                deck.push(Card::new(rank, suit));
            }
        }
        deck
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl std::str::FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 2 {
            return Err(CardParseError);
        }
        let rank = Rank::from_char(chars[0]).ok_or(CardParseError)?;
        let suit = Suit::from_char(chars[1]).ok_or(CardParseError)?;
        Ok(Card::new(rank, suit))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardParseError;

impl fmt::Display for CardParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a valid two-character card")
    }
}

impl std::error::Error for CardParseError {}

/// Parses a concatenated run of two-character card groups, e.g. `"AsKh"`
/// into `[As, Kh]` (§4.7 board/hole-card encoding).
pub fn parse_card_sequence(s: &str) -> Result<Vec<Card>, CardParseError> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(CardParseError);
    }
    chars
        .chunks(2)
        .map(|pair| format!("{}{}", pair[0], pair[1]).parse())
        .collect()
}

/// Renders a run of cards back into the concatenated grammar (§4.7).
pub fn render_card_sequence(cards: &[Card]) -> String {
    cards.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_and_renders_a_card() {
        let card = Card::from_str("As").unwrap();
        assert_eq!(card.rank, Rank::Ace);
        assert_eq!(card.suit, Suit::Spades);
        assert_eq!(card.to_string(), "As");
    }

    #[test]
    fn standard_deck_has_52_unique_cards() {
        let deck = Card::standard_deck();
        assert_eq!(deck.len(), 52);
        let unique: std::collections::HashSet<_> = deck.iter().map(|c| c.to_string()).collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn card_sequence_round_trips() {
        let cards = vec![
            Card::from_str("As").unwrap(),
            Card::from_str("Kh").unwrap(),
            Card::from_str("7s").unwrap(),
        ];
        let rendered = render_card_sequence(&cards);
        assert_eq!(rendered, "AsKh7s");
        assert_eq!(parse_card_sequence(&rendered).unwrap(), cards);
    }

    #[test]
    fn rejects_malformed_card() {
        assert!(Card::from_str("Zz").is_err());
        assert!(Card::from_str("A").is_err());
    }
}
