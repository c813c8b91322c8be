//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Listener adapter start(ctx)
//!     → listener.rs (parse address, bind)
//!     → serve loop (axum, hyper, tonic, ...) until stop is requested
//! Listener adapter stop(ctx)
//!     → request graceful stop → wait for the serve loop or ctx deadline
//! ```
//!
//! # Design Decisions
//! - Bind failures surface as start errors, which trigger orchestrated shutdown
//! - Adapters own zero orchestration logic

pub mod listener;
pub mod serve;

pub use listener::{bind, ListenerError};
pub use serve::{AlreadyStarted, ServeComponent};
