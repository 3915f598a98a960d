//! Typed payload schemas for every log entry kind (§6).

use crate::card::{parse_card_sequence, render_card_sequence, Card};
use crate::error::CodecError;
use crate::wire::{Reader, Writer};
use serde::{Deserialize, Serialize};
use tablemesh_identity::NodeId;

/// Stable on-the-wire tag values for each entry kind (§6). Values are
/// implementation-defined but must be stable, per the spec; `Unknown`
/// preserves any tag this build does not recognise verbatim (§4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    PlayerJoin,
    PlayerLeave,
    TableCreate,
    HandStart,
    PlayerAction,
    CardsDealt,
    HandResult,
    ChatMessage,
    ChipTransfer,
    TournamentEvent,
    Unknown(u16),
}

impl EntryKind {
    pub fn tag(self) -> u16 {
        match self {
            EntryKind::PlayerJoin => 1,
            EntryKind::PlayerLeave => 2,
            EntryKind::TableCreate => 3,
            EntryKind::HandStart => 4,
            EntryKind::PlayerAction => 5,
            EntryKind::CardsDealt => 6,
            EntryKind::HandResult => 7,
            EntryKind::ChatMessage => 8,
            EntryKind::ChipTransfer => 9,
            EntryKind::TournamentEvent => 10,
            EntryKind::Unknown(tag) => tag,
        }
    }

    pub fn from_tag(tag: u16) -> Self {
        match tag {
            1 => EntryKind::PlayerJoin,
            2 => EntryKind::PlayerLeave,
            3 => EntryKind::TableCreate,
            4 => EntryKind::HandStart,
            5 => EntryKind::PlayerAction,
            6 => EntryKind::CardsDealt,
            7 => EntryKind::HandResult,
            8 => EntryKind::ChatMessage,
            9 => EntryKind::ChipTransfer,
            10 => EntryKind::TournamentEvent,
            other => EntryKind::Unknown(other),
        }
    }
}

/// Round marker carried by `HAND_START`/`CARDS_DEALT`/table state (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Round {
    Preflop,
    Flop,
    Turn,
    River,
    Draw1,
    Draw2,
    Draw3,
    Showdown,
}

impl Round {
    fn tag(self) -> u8 {
        match self {
            Round::Preflop => 0,
            Round::Flop => 1,
            Round::Turn => 2,
            Round::River => 3,
            Round::Draw1 => 4,
            Round::Draw2 => 5,
            Round::Draw3 => 6,
            Round::Showdown => 7,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, CodecError> {
        Ok(match tag {
            0 => Round::Preflop,
            1 => Round::Flop,
            2 => Round::Turn,
            3 => Round::River,
            4 => Round::Draw1,
            5 => Round::Draw2,
            6 => Round::Draw3,
            7 => Round::Showdown,
            _ => return Err(CodecError::MalformedPayload),
        })
    }
}

/// A player's wagering action (§4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

impl ActionKind {
    fn tag(self) -> u8 {
        match self {
            ActionKind::Fold => 0,
            ActionKind::Check => 1,
            ActionKind::Call => 2,
            ActionKind::Bet => 3,
            ActionKind::Raise => 4,
            ActionKind::AllIn => 5,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, CodecError> {
        Ok(match tag {
            0 => ActionKind::Fold,
            1 => ActionKind::Check,
            2 => ActionKind::Call,
            3 => ActionKind::Bet,
            4 => ActionKind::Raise,
            5 => ActionKind::AllIn,
            _ => return Err(CodecError::MalformedPayload),
        })
    }
}

fn write_node_id(w: &mut Writer, id: &NodeId) {
    w.bytes_fixed(id.as_hash().as_bytes());
}

fn read_node_id(r: &mut Reader) -> Result<NodeId, CodecError> {
    let bytes = r.bytes_fixed(32)?;
    let arr: [u8; 32] = bytes.try_into().map_err(|_| CodecError::MalformedPayload)?;
    Ok(NodeId::from_hash_bytes(arr))
}

fn write_signature(w: &mut Writer, sig: &tablemesh_crypto::Signature) {
    w.bytes_fixed(sig.as_bytes());
}

fn read_signature(r: &mut Reader) -> Result<tablemesh_crypto::Signature, CodecError> {
    let bytes = r.bytes_fixed(64)?;
    let arr: [u8; 64] = bytes.try_into().map_err(|_| CodecError::MalformedPayload)?;
    Ok(tablemesh_crypto::Signature::from_bytes(arr))
}

fn write_cards(w: &mut Writer, cards: &[Card]) {
    w.u8(cards.len() as u8);
    w.string(&render_card_sequence(cards));
}

fn read_cards(r: &mut Reader) -> Result<Vec<Card>, CodecError> {
    let expected = r.u8()? as usize;
    let text = r.string()?;
    let cards = parse_card_sequence(&text).map_err(|_| CodecError::MalformedPayload)?;
    if cards.len() != expected {
        return Err(CodecError::MalformedPayload);
    }
    Ok(cards)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJoinPayload {
    pub player_id: NodeId,
    pub display_name: String,
    pub seat: u8,
    pub buy_in: u64,
    pub timestamp: u64,
}

impl PlayerJoinPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        write_node_id(&mut w, &self.player_id);
        w.string(&self.display_name);
        w.u8(self.seat);
        w.u64(self.buy_in);
        w.u64(self.timestamp);
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let payload = Self {
            player_id: read_node_id(&mut r)?,
            display_name: r.string()?,
            seat: r.u8()?,
            buy_in: r.u64()?,
            timestamp: r.u64()?,
        };
        finish(r, payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLeavePayload {
    pub player_id: NodeId,
    pub seat: u8,
    pub cash_out: u64,
    pub timestamp: u64,
}

impl PlayerLeavePayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        write_node_id(&mut w, &self.player_id);
        w.u8(self.seat);
        w.u64(self.cash_out);
        w.u64(self.timestamp);
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let payload = Self {
            player_id: read_node_id(&mut r)?,
            seat: r.u8()?,
            cash_out: r.u64()?,
            timestamp: r.u64()?,
        };
        finish(r, payload)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    TexasHoldem,
    Omaha,
    SevenCardStud,
    Razz,
    TripleDraw,
}

impl Variant {
    fn tag(self) -> u8 {
        match self {
            Variant::TexasHoldem => 0,
            Variant::Omaha => 1,
            Variant::SevenCardStud => 2,
            Variant::Razz => 3,
            Variant::TripleDraw => 4,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, CodecError> {
        Ok(match tag {
            0 => Variant::TexasHoldem,
            1 => Variant::Omaha,
            2 => Variant::SevenCardStud,
            3 => Variant::Razz,
            4 => Variant::TripleDraw,
            _ => return Err(CodecError::MalformedPayload),
        })
    }

    /// PHH `variant` tag text (§4.7); the evaluator behind each tag is out
    /// of scope (§1), this crate only needs the label.
    pub fn phh_tag(self) -> &'static str {
        match self {
            Variant::TexasHoldem => "NT",
            Variant::Omaha => "PO",
            Variant::SevenCardStud => "F7",
            Variant::Razz => "R",
            Variant::TripleDraw => "FT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCreatePayload {
    pub table_id: u64,
    pub name: String,
    pub variant: Variant,
    pub max_players: u8,
    pub small_blind: u64,
    pub big_blind: u64,
    pub min_buy_in: u64,
    pub max_buy_in: u64,
    pub creator_id: NodeId,
}

impl TableCreatePayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u64(self.table_id);
        w.string(&self.name);
        w.u8(self.variant.tag());
        w.u8(self.max_players);
        w.u64(self.small_blind);
        w.u64(self.big_blind);
        w.u64(self.min_buy_in);
        w.u64(self.max_buy_in);
        write_node_id(&mut w, &self.creator_id);
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let payload = Self {
            table_id: r.u64()?,
            name: r.string()?,
            variant: Variant::from_tag(r.u8()?)?,
            max_players: r.u8()?,
            small_blind: r.u64()?,
            big_blind: r.u64()?,
            min_buy_in: r.u64()?,
            max_buy_in: r.u64()?,
            creator_id: read_node_id(&mut r)?,
        };
        finish(r, payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandStartSeat {
    pub seat: u8,
    pub player_id: NodeId,
    pub stack: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandStartPayload {
    pub table_id: u64,
    pub hand_number: u64,
    pub dealer_button: u8,
    pub seats: Vec<HandStartSeat>,
    /// `hash(hand_number || sorted_concat(participant_node_ids))` (§4.5).
    pub deck_seed: tablemesh_crypto::Hash32,
}

impl HandStartPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u64(self.table_id);
        w.u64(self.hand_number);
        w.u8(self.dealer_button);
        w.u8(self.seats.len() as u8);
        for seat in &self.seats {
            w.u8(seat.seat);
            write_node_id(&mut w, &seat.player_id);
            w.u64(seat.stack);
        }
        w.bytes_fixed(self.deck_seed.as_bytes());
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let table_id = r.u64()?;
        let hand_number = r.u64()?;
        let dealer_button = r.u8()?;
        let seat_count = r.u8()? as usize;
        let mut seats = Vec::with_capacity(seat_count);
        for _ in 0..seat_count {
            seats.push(HandStartSeat {
                seat: r.u8()?,
                player_id: read_node_id(&mut r)?,
                stack: r.u64()?,
            });
        }
        let seed_bytes: [u8; 32] = r
            .bytes_fixed(32)?
            .try_into()
            .map_err(|_| CodecError::MalformedPayload)?;
        let payload = Self {
            table_id,
            hand_number,
            dealer_button,
            seats,
            deck_seed: seed_bytes.into(),
        };
        finish(r, payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerActionPayload {
    pub table_id: u64,
    pub hand_number: u64,
    pub action_number: u64,
    pub player_id: NodeId,
    pub action: ActionKind,
    pub amount: u64,
    /// The acting player's own signature over the action content, distinct
    /// from the entry's authoring signature — lets any observer confirm
    /// the action was authorised by the player even when relayed by
    /// another origin node (§6).
    pub signature: tablemesh_crypto::Signature,
}

impl PlayerActionPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u64(self.table_id);
        w.u64(self.hand_number);
        w.u64(self.action_number);
        write_node_id(&mut w, &self.player_id);
        w.u8(self.action.tag());
        w.u64(self.amount);
        write_signature(&mut w, &self.signature);
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let payload = Self {
            table_id: r.u64()?,
            hand_number: r.u64()?,
            action_number: r.u64()?,
            player_id: read_node_id(&mut r)?,
            action: ActionKind::from_tag(r.u8()?)?,
            amount: r.u64()?,
            signature: read_signature(&mut r)?,
        };
        finish(r, payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCards {
    pub player_id: NodeId,
    /// AEAD-sealed hole cards (`nonce || ciphertext`, §4.5).
    pub encrypted_cards: Vec<u8>,
    pub commitment: tablemesh_crypto::Hash32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardsDealtPayload {
    pub table_id: u64,
    pub hand_number: u64,
    pub round: Round,
    pub players: Vec<PlayerCards>,
    pub board: Vec<Card>,
}

impl CardsDealtPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u64(self.table_id);
        w.u64(self.hand_number);
        w.u8(self.round.tag());
        w.u8(self.players.len() as u8);
        for player in &self.players {
            write_node_id(&mut w, &player.player_id);
            w.bytes(&player.encrypted_cards);
            w.bytes_fixed(player.commitment.as_bytes());
        }
        write_cards(&mut w, &self.board);
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let table_id = r.u64()?;
        let hand_number = r.u64()?;
        let round = Round::from_tag(r.u8()?)?;
        let player_count = r.u8()? as usize;
        let mut players = Vec::with_capacity(player_count);
        for _ in 0..player_count {
            let player_id = read_node_id(&mut r)?;
            let encrypted_cards = r.bytes()?;
            let commitment_bytes: [u8; 32] = r
                .bytes_fixed(32)?
                .try_into()
                .map_err(|_| CodecError::MalformedPayload)?;
            players.push(PlayerCards {
                player_id,
                encrypted_cards,
                commitment: commitment_bytes.into(),
            });
        }
        let board = read_cards(&mut r)?;
        let payload = Self {
            table_id,
            hand_number,
            round,
            players,
            board,
        };
        finish(r, payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub player_id: NodeId,
    pub amount: u64,
    /// Human-readable hand-strength label; evaluation itself is out of
    /// scope (§1), this is just the archived description.
    pub best_hand: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealProof {
    pub player_id: NodeId,
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResultPayload {
    pub table_id: u64,
    pub hand_number: u64,
    pub winners: Vec<Winner>,
    pub rake: u64,
    pub reveals: Vec<RevealProof>,
}

impl HandResultPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u64(self.table_id);
        w.u64(self.hand_number);
        w.u8(self.winners.len() as u8);
        for winner in &self.winners {
            write_node_id(&mut w, &winner.player_id);
            w.u64(winner.amount);
            w.string(&winner.best_hand);
        }
        w.u64(self.rake);
        w.u8(self.reveals.len() as u8);
        for reveal in &self.reveals {
            write_node_id(&mut w, &reveal.player_id);
            write_cards(&mut w, &reveal.cards);
        }
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let table_id = r.u64()?;
        let hand_number = r.u64()?;
        let winner_count = r.u8()? as usize;
        let mut winners = Vec::with_capacity(winner_count);
        for _ in 0..winner_count {
            winners.push(Winner {
                player_id: read_node_id(&mut r)?,
                amount: r.u64()?,
                best_hand: r.string()?,
            });
        }
        let rake = r.u64()?;
        let reveal_count = r.u8()? as usize;
        let mut reveals = Vec::with_capacity(reveal_count);
        for _ in 0..reveal_count {
            reveals.push(RevealProof {
                player_id: read_node_id(&mut r)?,
                cards: read_cards(&mut r)?,
            });
        }
        let payload = Self {
            table_id,
            hand_number,
            winners,
            rake,
            reveals,
        };
        finish(r, payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    pub table_id: u64,
    pub sender_id: NodeId,
    pub text: String,
    pub timestamp: u64,
    pub signature: tablemesh_crypto::Signature,
}

impl ChatMessagePayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u64(self.table_id);
        write_node_id(&mut w, &self.sender_id);
        w.string(&self.text);
        w.u64(self.timestamp);
        write_signature(&mut w, &self.signature);
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let payload = Self {
            table_id: r.u64()?,
            sender_id: read_node_id(&mut r)?,
            text: r.string()?,
            timestamp: r.u64()?,
            signature: read_signature(&mut r)?,
        };
        finish(r, payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipTransferPayload {
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub amount: u64,
    pub reason: String,
    pub timestamp: u64,
    pub from_signature: tablemesh_crypto::Signature,
    pub to_signature: tablemesh_crypto::Signature,
}

impl ChipTransferPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        write_node_id(&mut w, &self.from_id);
        write_node_id(&mut w, &self.to_id);
        w.u64(self.amount);
        w.string(&self.reason);
        w.u64(self.timestamp);
        write_signature(&mut w, &self.from_signature);
        write_signature(&mut w, &self.to_signature);
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let payload = Self {
            from_id: read_node_id(&mut r)?,
            to_id: read_node_id(&mut r)?,
            amount: r.u64()?,
            reason: r.string()?,
            timestamp: r.u64()?,
            from_signature: read_signature(&mut r)?,
            to_signature: read_signature(&mut r)?,
        };
        finish(r, payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentEventPayload {
    pub tournament_id: u64,
    pub event_type: String,
    pub blind_level: u32,
    pub small_blind: u64,
    pub big_blind: u64,
    pub ante: u64,
    pub players_remaining: u32,
    pub tables_remaining: u32,
    pub timestamp: u64,
}

impl TournamentEventPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u64(self.tournament_id);
        w.string(&self.event_type);
        w.u32(self.blind_level);
        w.u64(self.small_blind);
        w.u64(self.big_blind);
        w.u64(self.ante);
        w.u32(self.players_remaining);
        w.u32(self.tables_remaining);
        w.u64(self.timestamp);
        w.into_vec()
    }

    pub fn decode(mut r: Reader) -> Result<Self, CodecError> {
        let payload = Self {
            tournament_id: r.u64()?,
            event_type: r.string()?,
            blind_level: r.u32()?,
            small_blind: r.u64()?,
            big_blind: r.u64()?,
            ante: r.u64()?,
            players_remaining: r.u32()?,
            tables_remaining: r.u32()?,
            timestamp: r.u64()?,
        };
        finish(r, payload)
    }
}

fn finish<T>(r: Reader, payload: T) -> Result<T, CodecError> {
    if r.remaining().is_empty() {
        Ok(payload)
    } else {
        Err(CodecError::TrailingBytes)
    }
}
