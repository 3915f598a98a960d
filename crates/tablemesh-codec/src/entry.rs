use crate::error::CodecError;
use crate::kinds::{
    CardsDealtPayload, ChatMessagePayload, ChipTransferPayload, EntryKind, HandResultPayload,
    HandStartPayload, PlayerActionPayload, PlayerJoinPayload, PlayerLeavePayload,
    TableCreatePayload, TournamentEventPayload,
};
use crate::wire::{Reader, Writer};
use serde::{Deserialize, Serialize};
use tablemesh_crypto::Signature;
use tablemesh_identity::NodeId;

/// Bounded payload size (§3, §8): `append_local` with exactly 4 KiB succeeds,
/// 4 KiB + 1 fails with `PayloadTooLarge`.
pub const MAX_PAYLOAD_LEN: usize = 4096;

/// The typed payload carried by a log entry (§6). `Unknown` preserves any
/// tag this build does not recognise, verbatim, per §4.2.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    PlayerJoin(PlayerJoinPayload),
    PlayerLeave(PlayerLeavePayload),
    TableCreate(TableCreatePayload),
    HandStart(HandStartPayload),
    PlayerAction(PlayerActionPayload),
    CardsDealt(CardsDealtPayload),
    HandResult(HandResultPayload),
    ChatMessage(ChatMessagePayload),
    ChipTransfer(ChipTransferPayload),
    TournamentEvent(TournamentEventPayload),
    Unknown { tag: u16, bytes: Vec<u8> },
}

impl Payload {
    pub fn kind(&self) -> EntryKind {
        match self {
            Payload::PlayerJoin(_) => EntryKind::PlayerJoin,
            Payload::PlayerLeave(_) => EntryKind::PlayerLeave,
            Payload::TableCreate(_) => EntryKind::TableCreate,
            Payload::HandStart(_) => EntryKind::HandStart,
            Payload::PlayerAction(_) => EntryKind::PlayerAction,
            Payload::CardsDealt(_) => EntryKind::CardsDealt,
            Payload::HandResult(_) => EntryKind::HandResult,
            Payload::ChatMessage(_) => EntryKind::ChatMessage,
            Payload::ChipTransfer(_) => EntryKind::ChipTransfer,
            Payload::TournamentEvent(_) => EntryKind::TournamentEvent,
            Payload::Unknown { tag, .. } => EntryKind::Unknown(*tag),
        }
    }

    pub fn encode_bytes(&self) -> Vec<u8> {
        match self {
            Payload::PlayerJoin(p) => p.encode(),
            Payload::PlayerLeave(p) => p.encode(),
            Payload::TableCreate(p) => p.encode(),
            Payload::HandStart(p) => p.encode(),
            Payload::PlayerAction(p) => p.encode(),
            Payload::CardsDealt(p) => p.encode(),
            Payload::HandResult(p) => p.encode(),
            Payload::ChatMessage(p) => p.encode(),
            Payload::ChipTransfer(p) => p.encode(),
            Payload::TournamentEvent(p) => p.encode(),
            Payload::Unknown { bytes, .. } => bytes.clone(),
        }
    }

    pub fn decode_bytes(kind: EntryKind, bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(match kind {
            EntryKind::PlayerJoin => Payload::PlayerJoin(PlayerJoinPayload::decode(Reader::new(bytes))?),
            EntryKind::PlayerLeave => {
                Payload::PlayerLeave(PlayerLeavePayload::decode(Reader::new(bytes))?)
            }
            EntryKind::TableCreate => {
                Payload::TableCreate(TableCreatePayload::decode(Reader::new(bytes))?)
            }
            EntryKind::HandStart => Payload::HandStart(HandStartPayload::decode(Reader::new(bytes))?),
            EntryKind::PlayerAction => {
                Payload::PlayerAction(PlayerActionPayload::decode(Reader::new(bytes))?)
            }
            EntryKind::CardsDealt => {
                Payload::CardsDealt(CardsDealtPayload::decode(Reader::new(bytes))?)
            }
            EntryKind::HandResult => {
                Payload::HandResult(HandResultPayload::decode(Reader::new(bytes))?)
            }
            EntryKind::ChatMessage => {
                Payload::ChatMessage(ChatMessagePayload::decode(Reader::new(bytes))?)
            }
            EntryKind::ChipTransfer => {
                Payload::ChipTransfer(ChipTransferPayload::decode(Reader::new(bytes))?)
            }
            EntryKind::TournamentEvent => {
                Payload::TournamentEvent(TournamentEventPayload::decode(Reader::new(bytes))?)
            }
            EntryKind::Unknown(tag) => Payload::Unknown {
                tag,
                bytes: bytes.to_vec(),
            },
        })
    }
}

/// An immutable, signed log entry (§3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub sequence: u64,
    /// Milliseconds since epoch; advisory, not authoritative (§3).
    pub timestamp: u64,
    pub origin_node_id: NodeId,
    /// 0 for global events, else the table the entry concerns (§3).
    pub table_id: u64,
    pub payload: Payload,
    pub signature: Signature,
}

impl Entry {
    /// The bytes the signature covers: every field except the signature
    /// itself (§3, mirrors the "signatures are excluded from preimages"
    /// convention used throughout the corpus's commitment schemes).
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u64(self.sequence);
        w.u64(self.timestamp);
        w.bytes_fixed(self.origin_node_id.as_hash().as_bytes());
        w.u64(self.table_id);
        w.u16(self.payload.kind().tag());
        w.bytes(&self.payload.encode_bytes());
        w.into_vec()
    }

    /// Full wire encoding: signing bytes plus the detached signature.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.signing_bytes();
        buf.extend_from_slice(self.signature.as_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let sequence = r.u64()?;
        let timestamp = r.u64()?;
        let origin_bytes: [u8; 32] = r
            .bytes_fixed(32)?
            .try_into()
            .map_err(|_| CodecError::MalformedPayload)?;
        let table_id = r.u64()?;
        let kind = EntryKind::from_tag(r.u16()?);
        let payload_bytes = r.bytes()?;
        if payload_bytes.len() > MAX_PAYLOAD_LEN {
            return Err(CodecError::PayloadTooLarge);
        }
        let signature_bytes: [u8; 64] = r
            .bytes_fixed(64)?
            .try_into()
            .map_err(|_| CodecError::MalformedPayload)?;
        if !r.remaining().is_empty() {
            return Err(CodecError::TrailingBytes);
        }
        let payload = Payload::decode_bytes(kind, &payload_bytes)?;
        Ok(Entry {
            sequence,
            timestamp,
            origin_node_id: NodeId::from_hash_bytes(origin_bytes),
            table_id,
            payload,
            signature: tablemesh_crypto::Signature::from_bytes(signature_bytes),
        })
    }
}
