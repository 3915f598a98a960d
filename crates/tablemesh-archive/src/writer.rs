use crate::record::{Action, HandRecord};
use tablemesh_codec::render_card_sequence;

fn render_action(action: &Action) -> String {
    match action {
        Action::DealHole { seat, cards } => {
            format!("d dh p{seat} {}", render_card_sequence(cards))
        }
        Action::DealBoard { cards } => format!("d db {}", render_card_sequence(cards)),
        Action::Fold { seat } => format!("p{seat} f"),
        Action::CheckCall { seat, amount } => match amount {
            Some(amount) => format!("p{seat} cc {amount}"),
            None => format!("p{seat} cc"),
        },
        Action::BetRaise { seat, amount } => format!("p{seat} cbr {amount}"),
        Action::StandPatDraw { seat, new_cards } => match new_cards {
            Some(cards) => format!("p{seat} sd {}", render_card_sequence(cards)),
            None => format!("p{seat} sd"),
        },
        Action::ShowMuck { seat, cards } => match cards {
            Some(cards) => format!("p{seat} sm {}", render_card_sequence(cards)),
            None => format!("p{seat} sm"),
        },
    }
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn number_array(values: &[u64]) -> String {
    let inner = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}

fn string_array(values: &[String]) -> String {
    let inner = values
        .iter()
        .map(|v| quoted(v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}

/// Serialises one hand into the canonical key order from §4.7. Required
/// keys are always emitted; optional keys (`hand`, `level`, `casino`,
/// `city`, `region`, `country`, `currency`) are emitted only when present.
pub fn write_hand(record: &HandRecord) -> String {
    let mut lines = Vec::new();
    lines.push(format!("variant = {}", quoted(record.variant.phh_tag())));
    lines.push(format!("antes = {}", number_array(&record.antes)));
    lines.push(format!(
        "blinds_or_straddles = {}",
        number_array(&record.blinds_or_straddles)
    ));
    lines.push(format!("min_bet = {}", record.min_bet));
    lines.push(format!(
        "starting_stacks = {}",
        number_array(&record.starting_stacks)
    ));
    let actions = record
        .actions
        .iter()
        .map(render_action)
        .collect::<Vec<_>>();
    lines.push(format!("actions = {}", string_array(&actions)));
    lines.push(format!("players = {}", string_array(&record.players)));
    lines.push(format!("event = {}", quoted(&record.event)));
    lines.push(format!("day = {}", record.day));
    lines.push(format!("month = {}", record.month));
    lines.push(format!("year = {}", record.year));
    if let Some(hand) = record.hand {
        lines.push(format!("hand = {hand}"));
    }
    if let Some(level) = record.level {
        lines.push(format!("level = {level}"));
    }
    if let Some(casino) = &record.casino {
        lines.push(format!("casino = {}", quoted(casino)));
    }
    if let Some(city) = &record.city {
        lines.push(format!("city = {}", quoted(city)));
    }
    if let Some(region) = &record.region {
        lines.push(format!("region = {}", quoted(region)));
    }
    if let Some(country) = &record.country {
        lines.push(format!("country = {}", quoted(country)));
    }
    if let Some(currency) = &record.currency {
        lines.push(format!("currency = {}", quoted(currency)));
    }
    lines.join("\n")
}

/// Serialises a whole archive file: successive hands separated by a blank
/// line (§6 "a blank line separates successive hand records").
pub fn write_file(records: &[HandRecord]) -> String {
    records
        .iter()
        .map(write_hand)
        .collect::<Vec<_>>()
        .join("\n\n")
}
