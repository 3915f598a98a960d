//! Deterministic deck seeding, hole-card commitments, and reveal
//! verification (§4.5, C7). Never decides hand strength — callers get
//! back plaintext card identities only; evaluation is out of scope (§1).

mod error;

pub use error::MentalPokerError;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use tablemesh_codec::{parse_card_sequence, render_card_sequence, Card};
use tablemesh_crypto::{hash, open, seal, Hash32, SessionKey};
use tablemesh_identity::NodeId;

/// `deck_seed := hash(hand_number ‖ sorted_concat(participant_node_ids))`
/// (§4.5). Every participant derives the same seed from public
/// information, which is the basis of the fairness property.
pub fn compute_deck_seed(hand_number: u64, participant_ids: &[NodeId]) -> Hash32 {
    let mut sorted = participant_ids.to_vec();
    sorted.sort();
    let mut buf = Vec::with_capacity(8 + sorted.len() * 32);
    buf.extend_from_slice(&hand_number.to_le_bytes());
    for id in &sorted {
        buf.extend_from_slice(id.as_hash().as_bytes());
    }
    hash(&buf)
}

/// Deterministically shuffles a standard 52-card deck from `seed`: same
/// seed, same permutation, on every node that computes it (§4.5 fairness
/// property — no single player can bias the distribution without
/// colluding with every other participant, since the seed is a function
/// of all their ids).
pub fn shuffled_deck(seed: Hash32) -> Vec<Card> {
    let mut rng = ChaCha20Rng::from_seed(*seed.as_bytes());
    let mut deck = Card::standard_deck();
    deck.shuffle(&mut rng);
    deck
}

/// A committed, encrypted hole-card deal for one player (§4.5 "The log
/// contains `(commitment, E)`").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deal {
    pub player_id: NodeId,
    pub commitment: Hash32,
    pub encrypted: Vec<u8>,
}

/// Computes `commitment := hash(C)` and seals `C` under the player's
/// session key, ready to be placed in a `CARDS_DEALT` entry (§4.5).
pub fn commit_hole_cards(player_id: NodeId, session_key: &SessionKey, cards: &[Card]) -> Deal {
    let plaintext = render_card_sequence(cards).into_bytes();
    let commitment = hash(&plaintext);
    let encrypted = seal(session_key, &plaintext);
    Deal {
        player_id,
        commitment,
        encrypted,
    }
}

/// Decrypts a dealt blob back into cards, for the owning player only (no
/// other participant holds the session key).
pub fn open_hole_cards(
    session_key: &SessionKey,
    encrypted: &[u8],
) -> Result<Vec<Card>, MentalPokerError> {
    let plaintext = open(session_key, encrypted).map_err(|_| MentalPokerError::BadAuthenticator)?;
    let text = String::from_utf8(plaintext).map_err(|_| MentalPokerError::MalformedCards)?;
    parse_card_sequence(&text).map_err(|_| MentalPokerError::MalformedCards)
}

/// Verifies a showdown reveal against the commitment published earlier
/// (§4.5 "Reveal proof"): any observer recomputes `hash(plaintext)` and
/// compares. A mismatch means the player attempted to reveal different
/// cards than they committed to.
pub fn verify_reveal(commitment: Hash32, revealed_cards: &[Card]) -> Result<(), MentalPokerError> {
    let plaintext = render_card_sequence(revealed_cards).into_bytes();
    if hash(&plaintext) == commitment {
        Ok(())
    } else {
        Err(MentalPokerError::CommitmentMismatch)
    }
}

/// Slices consecutive `count`-card hands for `num_players` starting at the
/// front of an already-shuffled deck, in seat order.
pub fn deal_hole_cards(deck: &[Card], num_players: usize, count: usize) -> Vec<Vec<Card>> {
    (0..num_players)
        .map(|seat| deck[seat * count..(seat + 1) * count].to_vec())
        .collect()
}

/// Board cards for community-card variants, read from `deck` starting at
/// `offset` (after hole cards have been dealt and a conventional burn, if
/// any, has been skipped by the caller).
pub fn deal_board(deck: &[Card], offset: usize, count: usize) -> Vec<Card> {
    deck[offset..offset + count].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tablemesh_crypto::generate_keypair;

    fn participant() -> NodeId {
        let (_, pk) = generate_keypair();
        NodeId::from_public_key(&pk)
    }

    #[test]
    fn deck_seed_is_deterministic_across_independent_computations() {
        let a = participant();
        let b = participant();
        let seed1 = compute_deck_seed(42, &[a, b]);
        let seed2 = compute_deck_seed(42, &[b, a]); // order-independent: sorted internally
        assert_eq!(seed1, seed2);
    }

    #[test]
    fn deck_seed_differs_by_hand_number_or_participants() {
        let a = participant();
        let b = participant();
        let c = participant();
        assert_ne!(
            compute_deck_seed(1, &[a, b]),
            compute_deck_seed(2, &[a, b])
        );
        assert_ne!(
            compute_deck_seed(1, &[a, b]),
            compute_deck_seed(1, &[a, c])
        );
    }

    #[test]
    fn shuffled_deck_is_a_permutation_of_all_52_cards() {
        let seed = compute_deck_seed(1, &[participant()]);
        let deck = shuffled_deck(seed);
        assert_eq!(deck.len(), 52);
        let unique: std::collections::HashSet<_> = deck.iter().map(|c| c.to_string()).collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn shuffled_deck_is_deterministic_given_the_same_seed() {
        let seed = compute_deck_seed(7, &[participant(), participant()]);
        assert_eq!(shuffled_deck(seed), shuffled_deck(seed));
    }

    #[test]
    fn commit_then_open_round_trips_hole_cards() {
        let key = SessionKey::generate();
        let cards = vec![Card::from_str("As").unwrap(), Card::from_str("Ah").unwrap()];
        let deal = commit_hole_cards(participant(), &key, &cards);
        let opened = open_hole_cards(&key, &deal.encrypted).unwrap();
        assert_eq!(opened, cards);
    }

    /// S2: A's hole cards `AsAh` are committed; revealing `AsAh` verifies,
    /// revealing `KsKh` instead is rejected.
    #[test]
    fn reveal_matching_commitment_is_accepted_mismatch_is_rejected() {
        let cards = vec![Card::from_str("As").unwrap(), Card::from_str("Ah").unwrap()];
        let commitment = hash(render_card_sequence(&cards).as_bytes());

        assert!(verify_reveal(commitment, &cards).is_ok());

        let wrong = vec![Card::from_str("Ks").unwrap(), Card::from_str("Kh").unwrap()];
        assert_eq!(
            verify_reveal(commitment, &wrong).unwrap_err(),
            MentalPokerError::CommitmentMismatch
        );
    }

    #[test]
    fn deal_hole_cards_slices_in_seat_order() {
        let deck = Card::standard_deck();
        let hands = deal_hole_cards(&deck, 3, 2);
        assert_eq!(hands.len(), 3);
        assert_eq!(hands[0], deck[0..2]);
        assert_eq!(hands[1], deck[2..4]);
        assert_eq!(hands[2], deck[4..6]);
    }
}
