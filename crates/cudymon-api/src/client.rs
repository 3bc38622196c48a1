// Router HTTP client.
//
// Wraps `reqwest::Client` with LuCI URL construction, the shared
// authenticated session, and the fetch policy: one transparent
// re-authentication on 403, exponential backoff for transient
// failures, and empty-body degradation for everything else. Login
// flows live in `auth.rs`, control actions in `actions.rs`.

use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, REFERER, USER_AGENT};
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::session::AuthSession;
use crate::transport::TransportConfig;

/// The firmware rejects requests without a browser-looking agent string.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Transient statuses worth retrying before giving up on a page.
const RETRY_BUDGET: u32 = 2;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Async client for one Cudy router's LuCI admin interface.
///
/// All status pages and actions live under `/cgi-bin/luci/`. The session
/// cookie is shared mutable state: it sits behind a `tokio::sync::Mutex`
/// so a re-authentication triggered by one fetch cannot race another.
pub struct RouterClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    session: Mutex<AuthSession>,
}

impl RouterClient {
    /// Create a client for the given router base URL.
    ///
    /// `base_url` should be the router root (e.g. `https://192.168.10.1`).
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password,
            session: Mutex::new(AuthSession::new()),
        })
    }

    /// The router base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// A snapshot of the current session state.
    pub async fn session(&self) -> AuthSession {
        self.session.lock().await.clone()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }

    pub(crate) fn session_lock(&self) -> &Mutex<AuthSession> {
        &self.session
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn base_str(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Build a full URL for a path under `/cgi-bin/luci/`.
    pub(crate) fn luci_url(&self, path: &str) -> String {
        format!("{}/cgi-bin/luci/{path}", self.base_str())
    }

    /// The `Referer` most pages expect: the admin landing page.
    pub(crate) fn admin_referer(&self) -> String {
        self.luci_url("admin")
    }

    // ── Page fetch ───────────────────────────────────────────────────

    /// Fetch a status page using the authenticated session.
    ///
    /// A 403 triggers exactly one re-authentication before the call is
    /// abandoned; transient statuses (5xx/429/408) and connect/timeout
    /// errors are retried with exponential backoff inside a small fixed
    /// budget. On give-up the result is an empty string -- scraping
    /// absence is not an error. `silent` only gates logging.
    pub async fn get_page(&self, path: &str, silent: bool) -> String {
        let url = self.luci_url(path);
        let mut reauthed = false;
        let mut retries_left = RETRY_BUDGET;
        let mut backoff = RETRY_BASE_DELAY;

        loop {
            let cookie = { self.session.lock().await.cookie_header() };
            let mut request = self
                .http
                .get(&url)
                .header(USER_AGENT, BROWSER_USER_AGENT)
                .header(REFERER, self.admin_referer());
            if let Some(cookie) = cookie {
                request = request.header(COOKIE, cookie);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::FORBIDDEN {
                        if !reauthed && self.authenticate().await.is_ok() {
                            reauthed = true;
                            continue;
                        }
                        if !silent {
                            debug!("authentication refused while fetching {path}");
                        }
                        return String::new();
                    }
                    if status.is_success() {
                        return response.text().await.unwrap_or_default();
                    }
                    if is_retryable(status) && retries_left > 0 {
                        retries_left -= 1;
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    if !silent {
                        debug!("failed to retrieve {path}: HTTP {status}");
                    }
                    return String::new();
                }
                Err(err) => {
                    if (err.is_connect() || err.is_timeout()) && retries_left > 0 {
                        retries_left -= 1;
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    if !silent {
                        debug!("transport error fetching {path}: {err}");
                    }
                    return String::new();
                }
            }
        }
    }

    // ── Model detection ──────────────────────────────────────────────

    /// Best-effort hardware model scraped from the login page banner.
    ///
    /// The model string keys the feature-support matrix; `"default"` is
    /// returned whenever the banner gives nothing away, which maps to the
    /// permissive all-modules policy.
    pub async fn get_model(&self) -> String {
        let login_url = self.luci_url("");
        let response = self
            .http
            .get(&login_url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await;

        let Ok(response) = response else {
            return "default".into();
        };
        // The login page may answer 403 and still carry the banner HTML.
        let html = response.text().await.unwrap_or_default();
        extract_model(&html).unwrap_or_else(|| "default".into())
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

/// Probe the login HTML for a model designation, most explicit first.
fn extract_model(html: &str) -> Option<String> {
    if html.is_empty() {
        return None;
    }

    // Hidden field or data attribute some builds embed outright.
    for pattern in [
        r#"name="modelname"[^>]*value="([^"]+)""#,
        r#"data-model="([^"]+)""#,
    ] {
        if let Some(found) = first_capture(pattern, html) {
            return Some(found);
        }
    }

    // Fall back to a model-code shaped token in the title or banner,
    // e.g. "WR3000S V1.0", "P5", "M1800".
    let code = r"\b((?:[A-Z]{1,3}\d{3,4}[A-Z]?|P\d)(?:\s+V\d+(?:\.\d+)?)?)\b";
    for scope_pattern in [r"<title>([^<]*)</title>", r#"class="[^"]*banner[^"]*"[^>]*>([^<]*)<"#] {
        if let Some(scope) = first_capture(scope_pattern, html) {
            if let Some(found) = first_capture(code, &scope) {
                return Some(found);
            }
        }
    }
    None
}

fn first_capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let captured = re.captures(text)?.get(1)?.as_str().trim();
    if captured.is_empty() {
        None
    } else {
        Some(captured.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_model_from_hidden_field() {
        let html = r#"<input type="hidden" name="modelname" value="WR3000S V1.0">"#;
        assert_eq!(extract_model(html).as_deref(), Some("WR3000S V1.0"));
    }

    #[test]
    fn extract_model_from_title() {
        let html = "<title>Cudy P5 - Login</title>";
        assert_eq!(extract_model(html).as_deref(), Some("P5"));
    }

    #[test]
    fn extract_model_absent() {
        assert_eq!(extract_model("<html><body>Login</body></html>"), None);
        assert_eq!(extract_model(""), None);
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::FORBIDDEN));
    }
}
