//! Async client for the Cudy router's LuCI web admin interface.
//!
//! The router exposes no API -- only the HTML/CGI pages its own web UI
//! uses. This crate owns everything HTTP-shaped about talking to it:
//!
//! - **[`RouterClient`]** -- authenticated page fetches under
//!   `/cgi-bin/luci/`, with transparent re-login on 403 and bounded
//!   backoff retry for transient failures.
//! - **[`AuthSession`]** -- the `sysauth` cookie lifecycle. Two login
//!   schemes exist across firmware generations (salted-hash and
//!   plaintext); [`RouterClient::authenticate`] tries both.
//! - **Actions** -- reboot, modem reset, band switch, SMS, AT commands,
//!   and mesh LED control, each implemented by replaying the admin UI's
//!   own form submission (see [`ActionOutcome`]).
//!
//! Parsing the fetched HTML into typed data is `cudymon-core`'s job.

mod actions;
mod auth;
mod client;
pub mod error;
pub mod session;
pub mod transport;

pub use actions::ActionOutcome;
pub use client::RouterClient;
pub use error::Error;
pub use session::{AuthScheme, AuthSession};
pub use transport::{TlsMode, TransportConfig};
