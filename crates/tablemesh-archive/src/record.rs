use tablemesh_codec::{Card, Variant};

/// One action-list entry in the grammar from §4.7. Seats are 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    DealHole { seat: u8, cards: Vec<Card> },
    DealBoard { cards: Vec<Card> },
    Fold { seat: u8 },
    CheckCall { seat: u8, amount: Option<u64> },
    BetRaise { seat: u8, amount: u64 },
    StandPatDraw { seat: u8, new_cards: Option<Vec<Card>> },
    ShowMuck { seat: u8, cards: Option<Vec<Card>> },
}

/// A completed hand, ready to be written out or as parsed back in (§4.7,
/// §3 "Hand record (archive)"). Field order mirrors the canonical key
/// order from §4.7 exactly; `write_hand` relies on that field order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandRecord {
    pub variant: Variant,
    pub antes: Vec<u64>,
    pub blinds_or_straddles: Vec<u64>,
    pub min_bet: u64,
    pub starting_stacks: Vec<u64>,
    pub actions: Vec<Action>,
    pub players: Vec<String>,
    pub event: String,
    pub day: u32,
    pub month: u32,
    pub year: u32,
    pub hand: Option<u64>,
    pub level: Option<u32>,
    pub casino: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
}
