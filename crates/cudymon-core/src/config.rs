// ── Router connection configuration ──
//
// The host plugin framework owns config storage and its UI flow; this
// is only the validated value type the core consumes.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use cudymon_api::TlsMode;

use crate::error::CoreError;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(90);

/// Connection settings for one router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Host or URL; a bare host gets an `https://` scheme.
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Deadline for one whole poll cycle.
    pub poll_timeout: Duration,
    pub tls: TlsMode,
}

impl RouterConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            tls: TlsMode::default(),
        }
    }

    /// The normalized base URL for the router.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        let normalized = normalize_host(&self.host);
        if normalized.is_empty() {
            return Err(CoreError::Validation {
                field: "host".into(),
                reason: "must not be empty".into(),
            });
        }
        Url::parse(&normalized).map_err(|err| CoreError::Validation {
            field: "host".into(),
            reason: err.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.username.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "username".into(),
                reason: "must not be empty".into(),
            });
        }
        self.base_url().map(|_| ())
    }
}

/// Ensure a scheme (https by default -- the routers redirect plain HTTP
/// anyway) and strip trailing slashes.
pub fn normalize_host(host: &str) -> String {
    let trimmed = host.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };
    with_scheme.trim_end_matches('/').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str) -> RouterConfig {
        RouterConfig::new(host, "admin", SecretString::from("secret".to_owned()))
    }

    #[test]
    fn bare_host_gets_https_scheme() {
        assert_eq!(normalize_host("192.168.10.1"), "https://192.168.10.1");
        assert_eq!(normalize_host("http://r.local/"), "http://r.local");
        assert_eq!(normalize_host(" https://r.local// "), "https://r.local");
    }

    #[test]
    fn base_url_round_trip() {
        let url = config("192.168.10.1").base_url().expect("url");
        assert_eq!(url.as_str(), "https://192.168.10.1/");
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(matches!(
            config("").base_url(),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn empty_username_is_rejected() {
        let mut cfg = config("192.168.10.1");
        cfg.username = String::new();
        assert!(cfg.validate().is_err());
    }
}
