//! Wire messages for the propose/vote/commit protocol (§4.4).

use crate::error::ConsensusError;
use tablemesh_codec::{Entry, Reader, Writer};
use tablemesh_identity::NodeId;

fn write_node_id(w: &mut Writer, id: &NodeId) {
    w.bytes_fixed(id.as_hash().as_bytes());
}

fn read_node_id(r: &mut Reader) -> Result<NodeId, ConsensusError> {
    let bytes = r
        .bytes_fixed(32)
        .map_err(|_| ConsensusError::MalformedMessage)?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| ConsensusError::MalformedMessage)?;
    Ok(NodeId::from_hash_bytes(arr))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposePayload {
    pub leader: NodeId,
    pub round_number: u64,
    pub entry: Entry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VotePayload {
    pub voter: NodeId,
    pub leader: NodeId,
    pub round_number: u64,
    pub accept: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitPayload {
    pub leader: NodeId,
    pub round_number: u64,
    pub entry: Entry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsensusMessage {
    Propose(ProposePayload),
    Vote(VotePayload),
    Commit(CommitPayload),
}

impl ConsensusMessage {
    fn tag(&self) -> u8 {
        match self {
            ConsensusMessage::Propose(_) => 1,
            ConsensusMessage::Vote(_) => 2,
            ConsensusMessage::Commit(_) => 3,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u8(self.tag());
        match self {
            ConsensusMessage::Propose(p) => {
                write_node_id(&mut w, &p.leader);
                w.u64(p.round_number);
                w.bytes(&p.entry.encode());
            }
            ConsensusMessage::Vote(p) => {
                write_node_id(&mut w, &p.voter);
                write_node_id(&mut w, &p.leader);
                w.u64(p.round_number);
                w.u8(p.accept as u8);
            }
            ConsensusMessage::Commit(p) => {
                write_node_id(&mut w, &p.leader);
                w.u64(p.round_number);
                w.bytes(&p.entry.encode());
            }
        }
        w.into_vec()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ConsensusError> {
        let mut r = Reader::new(bytes);
        let tag = r.u8().map_err(|_| ConsensusError::MalformedMessage)?;
        Ok(match tag {
            1 => {
                let leader = read_node_id(&mut r)?;
                let round_number = r.u64().map_err(|_| ConsensusError::MalformedMessage)?;
                let entry_bytes = r.bytes().map_err(|_| ConsensusError::MalformedMessage)?;
                let entry =
                    Entry::decode(&entry_bytes).map_err(|_| ConsensusError::MalformedMessage)?;
                ConsensusMessage::Propose(ProposePayload {
                    leader,
                    round_number,
                    entry,
                })
            }
            2 => {
                let voter = read_node_id(&mut r)?;
                let leader = read_node_id(&mut r)?;
                let round_number = r.u64().map_err(|_| ConsensusError::MalformedMessage)?;
                let accept = r.u8().map_err(|_| ConsensusError::MalformedMessage)? != 0;
                ConsensusMessage::Vote(VotePayload {
                    voter,
                    leader,
                    round_number,
                    accept,
                })
            }
            3 => {
                let leader = read_node_id(&mut r)?;
                let round_number = r.u64().map_err(|_| ConsensusError::MalformedMessage)?;
                let entry_bytes = r.bytes().map_err(|_| ConsensusError::MalformedMessage)?;
                let entry =
                    Entry::decode(&entry_bytes).map_err(|_| ConsensusError::MalformedMessage)?;
                ConsensusMessage::Commit(CommitPayload {
                    leader,
                    round_number,
                    entry,
                })
            }
            other => {
                let _ = other;
                return Err(ConsensusError::MalformedMessage);
            }
        })
    }
}
