// Login flows.
//
// Two incompatible schemes exist in the wild. The modern one (5G-era
// firmware) salts and double-hashes the password with per-session
// values scraped from the login page; the legacy one posts plaintext.
// For both, the only success signal is a `sysauth` cookie in the
// response -- the HTTP status is unreliable.

use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, COOKIE, ORIGIN, REFERER, USER_AGENT};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::client::{BROWSER_USER_AGENT, RouterClient};
use crate::error::Error;
use crate::session::AuthScheme;

/// Delay before the single modern-flow retry. The login page rotates its
/// token between the GET and the POST on some builds; a short pause and a
/// fresh page resolves the race.
const MODERN_RETRY_DELAY: Duration = Duration::from_millis(400);

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

pub(crate) fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// The LuCI password derivation: `sha256(sha256(password + salt) + token)`.
fn compute_luci_password(password: &str, salt: &str, token: &str) -> String {
    let inner = sha256_hex(&format!("{password}{salt}"));
    if token.is_empty() {
        inner
    } else {
        sha256_hex(&format!("{inner}{token}"))
    }
}

/// Pull a hidden form field's value out of raw HTML.
pub(crate) fn extract_hidden(html: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"name="{}"[^>]*value="([^"]*)""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(html)?.get(1)?.as_str();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

impl RouterClient {
    /// Establish (or refresh) the session.
    ///
    /// Tries the modern salted-hash flow, retries it once after a short
    /// delay, then falls back to the legacy plaintext flow. Idempotent
    /// and safe to call repeatedly; any previous cookie is discarded
    /// first. The error distinguishes the two outcomes the host setup
    /// flow cares about: [`Error::Transport`] (cannot connect) vs
    /// [`Error::Authentication`] (credentials refused by both schemes).
    pub async fn authenticate(&self) -> Result<(), Error> {
        let mut session = self.session_lock().lock().await;
        session.invalidate();

        let mut last_transport: Option<reqwest::Error> = None;

        for attempt in 0..2u8 {
            if attempt > 0 {
                tokio::time::sleep(MODERN_RETRY_DELAY).await;
            }
            match self.login_modern().await {
                Ok(Some(cookie)) => {
                    debug!("modern login succeeded");
                    session.establish(cookie, AuthScheme::Modern);
                    return Ok(());
                }
                Ok(None) => debug!("modern login yielded no sysauth cookie"),
                Err(err) => {
                    debug!("transport error during modern login: {err}");
                    last_transport = Some(err);
                }
            }
        }

        debug!("modern login failed, trying legacy");
        match self.login_legacy().await {
            Ok(Some(cookie)) => {
                debug!("legacy login succeeded");
                session.establish(cookie, AuthScheme::Legacy);
                Ok(())
            }
            Ok(None) => Err(Error::Authentication {
                message: "no sysauth cookie from either login scheme".into(),
            }),
            Err(err) => Err(Error::Transport(last_transport.unwrap_or(err))),
        }
    }

    /// Modern flow: GET the login page, lift `_csrf`/`token`/`salt` from
    /// its hidden fields, POST the derived hash. Returns the `sysauth`
    /// cookie value, or `None` if the flow completed without one (missing
    /// salt/token pair, or credentials refused).
    async fn login_modern(&self) -> Result<Option<String>, reqwest::Error> {
        let login_url = self.luci_url("");

        // The page may answer 403 and still contain the form fields.
        let response = self
            .http()
            .get(&login_url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, BROWSER_ACCEPT)
            .header(REFERER, format!("{}/", self.base_str()))
            .send()
            .await?;
        let page_status = response.status();

        // Carry any pre-session cookies from the GET into the POST.
        let carried: Vec<String> = response
            .cookies()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect();
        let html = response.text().await.unwrap_or_default();

        let csrf = extract_hidden(&html, "_csrf").unwrap_or_default();
        let token = extract_hidden(&html, "token");
        let salt = extract_hidden(&html, "salt");
        debug!(
            "login page HTTP {page_status}, csrf: {}, token: {}, salt: {}",
            !csrf.is_empty(),
            token.is_some(),
            salt.is_some()
        );

        let (Some(token), Some(salt)) = (token, salt) else {
            return Ok(None);
        };

        let luci_password =
            compute_luci_password(self.password().expose_secret(), &salt, &token);
        let form = [
            ("_csrf", csrf.as_str()),
            ("token", token.as_str()),
            ("salt", salt.as_str()),
            ("luci_username", self.username()),
            ("luci_password", luci_password.as_str()),
            ("zonename", "UTC"),
            ("timeclock", "0"),
        ];

        let mut request = self
            .http()
            .post(&login_url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, BROWSER_ACCEPT)
            .header(REFERER, format!("{}/", self.base_str()))
            .header(ORIGIN, self.base_str().to_owned())
            .form(&form);
        if !carried.is_empty() {
            request = request.header(COOKIE, carried.join("; "));
        }
        let response = request.send().await?;

        // Success is defined by the cookie alone, not the status code.
        Ok(response
            .cookies()
            .find(|c| c.name() == "sysauth")
            .map(|c| c.value().to_owned()))
    }

    /// Legacy flow: plaintext POST to the bare login endpoint. Success
    /// requires an OK/redirect status *and* the `sysauth` cookie.
    async fn login_legacy(&self) -> Result<Option<String>, reqwest::Error> {
        let login_url = format!("{}/cgi-bin/luci", self.base_str());
        let form = [
            ("luci_username", self.username()),
            ("luci_password", self.password().expose_secret()),
            ("luci_language", "en"),
        ];

        let response = self
            .http()
            .post(&login_url)
            .header(COOKIE, "")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::FOUND {
            return Ok(None);
        }
        Ok(response
            .cookies()
            .find(|c| c.name() == "sysauth")
            .map(|c| c.value().to_owned()))
    }
}
