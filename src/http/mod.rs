//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! ComponentSet::graceful
//!     → server.rs start (bind, axum::serve with graceful shutdown)
//!     → [requests served until stop]
//!     → server.rs stop (signal graceful shutdown, wait for drain or deadline)
//! ```

pub mod server;

pub use server::{listen_and_serve, HttpServer};
