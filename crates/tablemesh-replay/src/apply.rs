use crate::error::ReplayError;
use crate::state::{SeatState, SeatStatus, TableState};
use tablemesh_codec::{ActionKind, Entry, Payload};

/// The pure per-entry transition (§4.6). Entries for a different
/// `table_id` than `state.table_id` are a caller bug, not a data error:
/// `replay_prefix` never calls `apply` with one, so this asserts rather
/// than returning a `Result` variant nobody else can produce.
pub fn apply(state: &TableState, entry: &Entry) -> Result<TableState, ReplayError> {
    assert_eq!(
        entry.table_id, state.table_id,
        "apply called with an entry for the wrong table"
    );
    let mut state = state.clone();
    match &entry.payload {
        Payload::PlayerJoin(p) => {
            if state.seats.contains_key(&p.seat) {
                return Err(ReplayError::SeatOccupied(p.seat));
            }
            state.seats.insert(
                p.seat,
                SeatState {
                    player_id: p.player_id,
                    display_name: p.display_name.clone(),
                    chips: p.buy_in,
                    current_bet: 0,
                    committed_this_hand: 0,
                    status: SeatStatus::Active,
                    hole_commitment: None,
                    revealed_cards: None,
                },
            );
            Ok(state)
        }
        Payload::PlayerLeave(p) => {
            if !state.seats.contains_key(&p.seat) {
                return Err(ReplayError::SeatEmpty(p.seat));
            }
            state.seats.remove(&p.seat);
            Ok(state)
        }
        Payload::TableCreate(_) => Ok(state),
        Payload::HandStart(p) => {
            if p.seats.len() < 2 {
                return Err(ReplayError::NotEnoughPlayers);
            }
            state.hand_number = p.hand_number;
            state.button_seat = p.dealer_button;
            state.round = Some(tablemesh_codec::Round::Preflop);
            state.pot = 0;
            state.current_bet = 0;
            state.min_raise = 0;
            state.board.clear();
            state.applied_actions.clear();
            state.acted_since_last_raise.clear();
            for hand_seat in &p.seats {
                let seat = state
                    .seats
                    .get_mut(&hand_seat.seat)
                    .ok_or(ReplayError::SeatEmpty(hand_seat.seat))?;
                seat.chips = hand_seat.stack;
                seat.current_bet = 0;
                seat.committed_this_hand = 0;
                seat.status = SeatStatus::Active;
                seat.hole_commitment = None;
                seat.revealed_cards = None;
            }
            Ok(state)
        }
        Payload::PlayerAction(p) => {
            if state.hand_number != p.hand_number {
                return Err(ReplayError::WrongHand {
                    action_hand: p.hand_number,
                    active_hand: Some(state.hand_number),
                });
            }
            if state.applied_actions.contains_key(&p.action_number) {
                // Idempotent re-application (§4.6): the action already
                // landed, so replaying it again is a no-op.
                return Ok(state);
            }
            let (seat_no, _) = state
                .seat_by_player(p.player_id)
                .ok_or(ReplayError::PlayerNotSeated(p.player_id))?;
            apply_action(&mut state, seat_no, p.action, p.amount)?;
            state.applied_actions.insert(p.action_number, seat_no as u64);
            maybe_advance_round(&mut state);
            Ok(state)
        }
        Payload::CardsDealt(p) => {
            state.round = Some(p.round);
            for player_cards in &p.players {
                if let Some((_, seat)) = state
                    .seats
                    .iter_mut()
                    .find(|(_, s)| s.player_id == player_cards.player_id)
                {
                    seat.hole_commitment = Some(player_cards.commitment);
                }
            }
            if !p.board.is_empty() {
                state.board = p.board.clone();
            }
            Ok(state)
        }
        Payload::HandResult(p) => {
            for reveal in &p.reveals {
                if let Some((_, seat)) = state
                    .seats
                    .iter_mut()
                    .find(|(_, s)| s.player_id == reveal.player_id)
                {
                    seat.revealed_cards = Some(reveal.cards.clone());
                }
            }
            for winner in &p.winners {
                if let Some((_, seat)) = state
                    .seats
                    .iter_mut()
                    .find(|(_, s)| s.player_id == winner.player_id)
                {
                    seat.chips += winner.amount;
                }
            }
            state.completed_hands.push(crate::state::CompletedHand {
                hand_number: p.hand_number,
                winners: p.winners.clone(),
                rake: p.rake,
                board: state.board.clone(),
            });
            state.round = Some(tablemesh_codec::Round::Showdown);
            state.pot = 0;
            Ok(state)
        }
        Payload::ChatMessage(_) | Payload::ChipTransfer(_) | Payload::TournamentEvent(_) => {
            Ok(state)
        }
        Payload::Unknown { tag, .. } => {
            tracing::warn!(tag, "skipping unrecognised entry kind during replay");
            Ok(state)
        }
    }
}

fn apply_action(
    state: &mut TableState,
    seat_no: u8,
    action: ActionKind,
    amount: u64,
) -> Result<(), ReplayError> {
    let prev_current_bet = state.current_bet;
    let seat = state.seats.get_mut(&seat_no).expect("seat looked up by caller");
    match action {
        ActionKind::Fold => {
            seat.status = SeatStatus::Folded;
        }
        ActionKind::Check => {
            if state.current_bet != seat.current_bet {
                return Err(ReplayError::IllegalCheck);
            }
        }
        ActionKind::Call => {
            let delta = state.current_bet.saturating_sub(seat.current_bet);
            let delta = delta.min(seat.chips);
            seat.chips -= delta;
            seat.current_bet += delta;
            seat.committed_this_hand += delta;
            state.pot += delta;
            if seat.chips == 0 {
                seat.status = SeatStatus::AllIn;
            }
        }
        ActionKind::Bet | ActionKind::Raise => {
            if amount <= prev_current_bet {
                return Err(ReplayError::NonRaisingBet(amount));
            }
            let delta = amount - seat.current_bet;
            if delta > seat.chips {
                return Err(ReplayError::NoChipsRemaining);
            }
            seat.chips -= delta;
            seat.committed_this_hand += delta;
            state.pot += delta;
            seat.current_bet = amount;
            state.min_raise = amount - prev_current_bet;
            state.current_bet = amount;
            state.acted_since_last_raise.clear();
        }
        ActionKind::AllIn => {
            let delta = seat.chips;
            seat.current_bet += delta;
            seat.committed_this_hand += delta;
            state.pot += delta;
            seat.chips = 0;
            seat.status = SeatStatus::AllIn;
            if seat.current_bet > state.current_bet {
                state.min_raise = seat.current_bet - state.current_bet;
                state.current_bet = seat.current_bet;
                state.acted_since_last_raise.clear();
            }
        }
    }
    state.acted_since_last_raise.insert(seat_no);
    Ok(())
}

/// Round advances once every seat still able to act (not folded, not
/// all-in) has matched `current_bet` and has acted since the last raise
/// (§4.6). Advancing itself is left to `CARDS_DEALT`/`HAND_START` entries
/// in the log — this only clears the per-street bookkeeping so the next
/// street starts clean, matching the real node's behaviour of waiting for
/// the dealer's own `CARDS_DEALT` entry before flipping `state.round`.
fn maybe_advance_round(state: &mut TableState) {
    let pending: Vec<u8> = state
        .seats
        .iter()
        .filter(|(_, s)| matches!(s.status, SeatStatus::Active))
        .filter(|(seat, s)| s.current_bet != state.current_bet || !state.acted_since_last_raise.contains(seat))
        .map(|(seat, _)| *seat)
        .collect();
    if pending.is_empty() {
        for (_, seat) in state.seats.iter_mut() {
            seat.current_bet = 0;
        }
        state.current_bet = 0;
        state.acted_since_last_raise.clear();
    }
}
