//! Background workers.
//!
//! Components whose work is a loop rather than a listener. `Ticker` shows
//! both shapes a `start` routine may take:
//! - Spawned: `start` spawns the loop and returns immediately
//! - Blocking: `start` runs the loop itself and returns when it ends

pub mod ticker;

pub use ticker::{Ticker, TickerMode};
