// Error taxonomy for the router client.
//
// Only two failure classes ever cross into the host's config flow:
// `Transport` (cannot connect) and `Authentication` (credentials refused).
// Routine per-page scraping variance never becomes an `Error` -- page
// fetches degrade to an empty body instead.

use thiserror::Error;

/// Errors surfaced by [`RouterClient`](crate::RouterClient).
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure: connect refused, TLS handshake, timeout.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// Both login schemes completed without yielding a `sysauth` cookie.
    #[error("authentication failed: {message}")]
    Authentication { message: String },
}
