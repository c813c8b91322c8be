//! TCP listener binding.
//!
//! # Responsibilities
//! - Parse the configured address
//! - Bind a Tokio listener, reporting failures as start errors

use std::net::SocketAddr;

use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The address could not be parsed.
    InvalidAddress(String),
    /// Failed to bind to address.
    Bind(SocketAddr, std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::InvalidAddress(addr) => write!(f, "Invalid bind address: {}", addr),
            ListenerError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::InvalidAddress(_) => None,
            ListenerError::Bind(_, e) => Some(e),
        }
    }
}

/// Bind a TCP listener to `address`.
pub async fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = address
        .parse()
        .map_err(|_| ListenerError::InvalidAddress(address.to_string()))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ListenerError::Bind(addr, e))?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}
