//! Per-turn chat state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `idle -> awaiting response -> idle`.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::ChatState;
pub use transition::{transition, TransitionError};
