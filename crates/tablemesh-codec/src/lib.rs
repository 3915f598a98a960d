//! Typed payload encoding/decoding for log entries (§4.2, C4).
//!
//! The codec is total (every valid payload encodes, every valid byte string
//! either decodes or returns [`CodecError::MalformedPayload`]) and
//! deterministic (same payload → same bytes), which the §8 round-trip law
//! `decode(encode(payload)) == payload` depends on.

mod card;
mod entry;
mod error;
mod kinds;
mod wire;

pub use card::{parse_card_sequence, render_card_sequence, Card, CardParseError, Rank, Suit};
pub use entry::{Entry, Payload, MAX_PAYLOAD_LEN};
pub use error::CodecError;
pub use kinds::{
    ActionKind, CardsDealtPayload, ChatMessagePayload, ChipTransferPayload, EntryKind,
    HandResultPayload, HandStartPayload, HandStartSeat, PlayerActionPayload, PlayerCards,
    PlayerJoinPayload, PlayerLeavePayload, RevealProof, Round, TableCreatePayload,
    TournamentEventPayload, Variant, Winner,
};
pub use wire::{Reader, Writer};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use tablemesh_crypto::generate_keypair;
    use tablemesh_identity::NodeId;

    fn arb_payload() -> impl Strategy<Value = Payload> {
        any::<(u64, u64, u64, u64)>().prop_map(|(table_id, a, b, amount)| {
            let (sk, pk) = generate_keypair();
            let player_id = NodeId::from_public_key(&pk);
            Payload::PlayerAction(PlayerActionPayload {
                table_id,
                hand_number: a,
                action_number: b,
                player_id,
                action: ActionKind::Bet,
                amount,
                signature: sk.sign(&amount.to_le_bytes()),
            })
        })
    }

    proptest! {
        #[test]
        fn payload_encode_decode_round_trips(payload in arb_payload()) {
            let bytes = payload.encode_bytes();
            let decoded = Payload::decode_bytes(payload.kind(), &bytes).unwrap();
            prop_assert_eq!(decoded, payload);
        }
    }
}
