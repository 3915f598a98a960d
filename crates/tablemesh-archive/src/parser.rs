use crate::error::ArchiveError;
use crate::record::{Action, HandRecord};
use std::collections::HashMap;
use tablemesh_codec::{parse_card_sequence, Variant};

enum Value {
    Scalar(String),
    Array(Vec<String>),
}

fn unquote(token: &str) -> String {
    let token = token.trim();
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        token[1..token.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\")
    } else {
        token.to_string()
    }
}

fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.starts_with('[') && raw.ends_with(']') {
        let inner = &raw[1..raw.len() - 1];
        if inner.trim().is_empty() {
            return Value::Array(Vec::new());
        }
        Value::Array(inner.split(',').map(unquote).collect())
    } else {
        Value::Scalar(unquote(raw))
    }
}

fn parse_kv_lines(text: &str) -> HashMap<String, Value> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((key, value)) = line.split_once(" = ") {
            map.insert(key.trim().to_string(), parse_value(value));
        }
    }
    map
}

fn require_scalar<'a>(
    map: &'a HashMap<String, Value>,
    key: &'static str,
) -> Result<&'a str, ArchiveError> {
    match map.get(key) {
        Some(Value::Scalar(s)) => Ok(s.as_str()),
        Some(Value::Array(_)) => Err(ArchiveError::MalformedValue {
            key,
            value: "expected a scalar, found an array".into(),
        }),
        None => Err(ArchiveError::MissingKey(key)),
    }
}

fn require_u64(map: &HashMap<String, Value>, key: &'static str) -> Result<u64, ArchiveError> {
    require_scalar(map, key)?
        .parse()
        .map_err(|_| ArchiveError::MalformedValue {
            key,
            value: require_scalar(map, key).unwrap_or_default().to_string(),
        })
}

fn require_u32(map: &HashMap<String, Value>, key: &'static str) -> Result<u32, ArchiveError> {
    require_u64(map, key).map(|v| v as u32)
}

fn optional_u64(map: &HashMap<String, Value>, key: &'static str) -> Option<u64> {
    match map.get(key) {
        Some(Value::Scalar(s)) => s.parse().ok(),
        _ => None,
    }
}

fn optional_u32(map: &HashMap<String, Value>, key: &'static str) -> Option<u32> {
    optional_u64(map, key).map(|v| v as u32)
}

fn optional_string(map: &HashMap<String, Value>, key: &'static str) -> Option<String> {
    match map.get(key) {
        Some(Value::Scalar(s)) => Some(s.clone()),
        _ => None,
    }
}

fn require_number_array(
    map: &HashMap<String, Value>,
    key: &'static str,
) -> Result<Vec<u64>, ArchiveError> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|s| {
                s.parse().map_err(|_| ArchiveError::MalformedValue {
                    key,
                    value: s.clone(),
                })
            })
            .collect(),
        Some(Value::Scalar(_)) => Err(ArchiveError::MalformedValue {
            key,
            value: "expected an array, found a scalar".into(),
        }),
        None => Err(ArchiveError::MissingKey(key)),
    }
}

fn require_string_array(
    map: &HashMap<String, Value>,
    key: &'static str,
) -> Result<Vec<String>, ArchiveError> {
    match map.get(key) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::Scalar(_)) => Err(ArchiveError::MalformedValue {
            key,
            value: "expected an array, found a scalar".into(),
        }),
        None => Err(ArchiveError::MissingKey(key)),
    }
}

fn variant_from_tag(tag: &str) -> Result<Variant, ArchiveError> {
    Ok(match tag {
        "NT" => Variant::TexasHoldem,
        "PO" => Variant::Omaha,
        "F7" => Variant::SevenCardStud,
        "R" => Variant::Razz,
        "FT" => Variant::TripleDraw,
        other => {
            return Err(ArchiveError::MalformedValue {
                key: "variant",
                value: other.to_string(),
            })
        }
    })
}

/// Parses one `"p<N> ..."`/`"d ..."` action string (§4.7 grammar).
fn parse_action(raw: &str) -> Result<Action, ArchiveError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let fail = || ArchiveError::MalformedAction(raw.to_string());
    match tokens.as_slice() {
        ["d", "dh", seat, cards] => {
            let seat = parse_seat(seat).ok_or_else(fail)?;
            let cards = parse_card_sequence(cards)
                .map_err(|_| ArchiveError::MalformedCards(cards.to_string()))?;
            Ok(Action::DealHole { seat, cards })
        }
        ["d", "db", cards] => {
            let cards = parse_card_sequence(cards)
                .map_err(|_| ArchiveError::MalformedCards(cards.to_string()))?;
            Ok(Action::DealBoard { cards })
        }
        [seat, "f"] => Ok(Action::Fold {
            seat: parse_seat(seat).ok_or_else(fail)?,
        }),
        [seat, "cc"] => Ok(Action::CheckCall {
            seat: parse_seat(seat).ok_or_else(fail)?,
            amount: None,
        }),
        [seat, "cc", amount] => Ok(Action::CheckCall {
            seat: parse_seat(seat).ok_or_else(fail)?,
            amount: Some(amount.parse().map_err(|_| fail())?),
        }),
        [seat, "cbr", amount] => Ok(Action::BetRaise {
            seat: parse_seat(seat).ok_or_else(fail)?,
            amount: amount.parse().map_err(|_| fail())?,
        }),
        [seat, "sd"] => Ok(Action::StandPatDraw {
            seat: parse_seat(seat).ok_or_else(fail)?,
            new_cards: None,
        }),
        [seat, "sd", cards] => Ok(Action::StandPatDraw {
            seat: parse_seat(seat).ok_or_else(fail)?,
            new_cards: Some(
                parse_card_sequence(cards)
                    .map_err(|_| ArchiveError::MalformedCards(cards.to_string()))?,
            ),
        }),
        [seat, "sm"] => Ok(Action::ShowMuck {
            seat: parse_seat(seat).ok_or_else(fail)?,
            cards: None,
        }),
        [seat, "sm", cards] => Ok(Action::ShowMuck {
            seat: parse_seat(seat).ok_or_else(fail)?,
            cards: Some(
                parse_card_sequence(cards)
                    .map_err(|_| ArchiveError::MalformedCards(cards.to_string()))?,
            ),
        }),
        _ => Err(fail()),
    }
}

fn parse_seat(token: &str) -> Option<u8> {
    token.strip_prefix('p')?.parse().ok()
}

/// Parses a single hand record from its key-value text block.
pub fn parse_hand(text: &str) -> Result<HandRecord, ArchiveError> {
    let map = parse_kv_lines(text);
    let variant = variant_from_tag(require_scalar(&map, "variant")?)?;
    let antes = require_number_array(&map, "antes")?;
    let blinds_or_straddles = require_number_array(&map, "blinds_or_straddles")?;
    let min_bet = require_u64(&map, "min_bet")?;
    let starting_stacks = require_number_array(&map, "starting_stacks")?;
    let actions = require_string_array(&map, "actions")?
        .iter()
        .map(|s| parse_action(s))
        .collect::<Result<Vec<_>, _>>()?;
    let players = require_string_array(&map, "players")?;
    let event = require_scalar(&map, "event")?.to_string();
    let day = require_u32(&map, "day")?;
    let month = require_u32(&map, "month")?;
    let year = require_u32(&map, "year")?;

    Ok(HandRecord {
        variant,
        antes,
        blinds_or_straddles,
        min_bet,
        starting_stacks,
        actions,
        players,
        event,
        day,
        month,
        year,
        hand: optional_u64(&map, "hand"),
        level: optional_u32(&map, "level"),
        casino: optional_string(&map, "casino"),
        city: optional_string(&map, "city"),
        region: optional_string(&map, "region"),
        country: optional_string(&map, "country"),
        currency: optional_string(&map, "currency"),
    })
}

/// Parses a multi-hand archive file. Records are separated by a blank
/// line or a `---` line, either accepted per §6.
pub fn parse_file(text: &str) -> Result<Vec<HandRecord>, ArchiveError> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() || line.trim() == "---" {
            if !current.trim().is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        blocks.push(current);
    }
    blocks.iter().map(|b| parse_hand(b)).collect()
}
