// HTTP transport configuration.
//
// The router speaks HTTPS with a self-signed certificate, detects login
// success via `Set-Cookie` on redirect responses, and serves one client
// at a time -- so the built client never follows redirects and defaults
// to skipping certificate verification.

use std::time::Duration;

use crate::error::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TLS certificate handling for the router connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Verify certificates against the system roots.
    Verify,
    /// Accept any certificate. Consumer routers ship self-signed certs,
    /// so this is the default.
    #[default]
    AcceptInvalid,
}

/// Settings for building the underlying `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build the HTTP client: no redirect following (login and action
    /// flows inspect 302 responses directly), configured timeout, and
    /// optional certificate bypass.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.timeout);

        if self.tls == TlsMode::AcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(Error::Transport)
    }
}
