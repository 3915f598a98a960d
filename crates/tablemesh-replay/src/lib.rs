//! Deterministic fold of a table's log entries into game state (§4.6, C8).
//!
//! [`apply`] is the pure per-entry transition; [`replay_prefix`] is the
//! driver that orders and folds a whole log slice. Neither ever panics on
//! bad input from the network — see [`ReplayError`] and the driver's
//! skip-and-warn behaviour, which is what makes partial replay safe.

mod apply;
mod driver;
mod error;
mod side_pots;
mod state;

pub use apply::apply;
pub use driver::{ordering_key, replay_prefix};
pub use error::ReplayError;
pub use side_pots::{compute_side_pots, SidePot};
pub use state::{CompletedHand, SeatState, SeatStatus, TableState};
