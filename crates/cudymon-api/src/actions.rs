// Control actions.
//
// Every action replays a form the admin UI itself would submit: GET the
// page, lift the per-page anti-replay `token` hidden field, POST the
// page's own field names alongside it. Nothing here raises for a refused
// action -- callers inspect the returned status code.

use regex::{Regex, RegexBuilder};
use reqwest::StatusCode;
use reqwest::header::{COOKIE, ORIGIN, REFERER, USER_AGENT};
use tracing::{debug, warn};

use crate::auth::extract_hidden;
use crate::client::{BROWSER_USER_AGENT, RouterClient};

/// Outcome of a form-replay action: the HTTP status of the POST and an
/// excerpt of the response (or the failure reason). `status` 0 means the
/// POST never completed.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub status: u16,
    pub detail: String,
}

impl ActionOutcome {
    /// The firmware acknowledges actions with 200 or a 302 redirect.
    pub fn succeeded(&self) -> bool {
        matches!(self.status, 200 | 302)
    }

    fn completed(status: StatusCode, body: &str) -> Self {
        Self {
            status: status.as_u16(),
            detail: excerpt(body, 220),
        }
    }

    fn failed(detail: impl ToString) -> Self {
        Self {
            status: 0,
            detail: excerpt(&detail.to_string(), 220),
        }
    }
}

/// Character-boundary-safe prefix for response excerpts.
fn excerpt(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

/// The reserved client id the mesh endpoints use for the main router.
const MAIN_ROUTER_MAC: &str = "00:00:00:00:00:00";

impl RouterClient {
    // ── Request helpers ──────────────────────────────────────────────

    async fn fetch_action_page(
        &self,
        url: &str,
        referer: &str,
    ) -> Result<(StatusCode, String), reqwest::Error> {
        let cookie = { self.session_lock().lock().await.cookie_header() };
        let mut request = self
            .http()
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(REFERER, referer);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    async fn post_action_form(
        &self,
        url: &str,
        referer: &str,
        fields: &[(&str, &str)],
    ) -> Result<(StatusCode, String), reqwest::Error> {
        let cookie = { self.session_lock().lock().await.cookie_header() };
        let mut request = self
            .http()
            .post(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(REFERER, referer)
            .header(ORIGIN, self.base_str().to_owned())
            .form(fields);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    /// GET `page`, extract its token, POST the standard `cbi` envelope
    /// plus `extra` fields. The common shape of almost every action.
    async fn replay_form(
        &self,
        page: &str,
        referer_page: &str,
        extra: &[(&str, &str)],
    ) -> ActionOutcome {
        let url = self.luci_url(page);
        let referer = self.luci_url(referer_page);

        let (page_status, html) = match self.fetch_action_page(&url, &referer).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!("action page {page} unreachable: {err}");
                return ActionOutcome::failed(err);
            }
        };
        let Some(token) = extract_hidden(&html, "token") else {
            warn!("no token on {page} (HTTP {page_status})");
            return ActionOutcome::failed(format!("no token on {page}"));
        };

        let mut fields: Vec<(&str, &str)> =
            vec![("token", token.as_str()), ("timeclock", "0"), ("cbi.submit", "1")];
        fields.extend_from_slice(extra);

        match self.post_action_form(&url, &referer, &fields).await {
            Ok((status, body)) => ActionOutcome::completed(status, &body),
            Err(err) => {
                warn!("action POST to {page} failed: {err}");
                ActionOutcome::failed(err)
            }
        }
    }

    // ── Router-wide actions ──────────────────────────────────────────

    /// Trigger a full router reboot.
    pub async fn reboot_router(&self) -> ActionOutcome {
        self.replay_form(
            "admin/system/reboot/reboot",
            "admin/panel",
            &[("cbi.apply", "OK")],
        )
        .await
    }

    /// Restart the cellular connection via the modem reset form.
    pub async fn restart_5g_connection(&self) -> ActionOutcome {
        self.replay_form(
            "admin/network/gcom/reset",
            "admin/network/gcom/status",
            &[("cbid.reset.1.reset", "Modem Reset")],
        )
        .await
    }

    /// Select a cellular band. Discovers the band `<select>` on the
    /// settings page rather than hardcoding its field name, which varies
    /// across firmware builds.
    pub async fn switch_5g_band(&self, band_value: &str) -> ActionOutcome {
        let page = "admin/network/gcom/setting";
        let url = self.luci_url(page);
        let referer = self.admin_referer();

        let (_, html) = match self.fetch_action_page(&url, &referer).await {
            Ok(fetched) => fetched,
            Err(err) => return ActionOutcome::failed(err),
        };
        let Some(token) = extract_hidden(&html, "token") else {
            return ActionOutcome::failed(format!("no token on {page}"));
        };
        let Some(select_name) = find_band_select(&html) else {
            return ActionOutcome::failed("no band select found");
        };

        let fields = [
            ("token", token.as_str()),
            ("timeclock", "0"),
            ("cbi.submit", "1"),
            (select_name.as_str(), band_value),
        ];
        match self.post_action_form(&url, &referer, &fields).await {
            Ok((status, body)) => ActionOutcome::completed(status, &body),
            Err(err) => ActionOutcome::failed(err),
        }
    }

    /// Send an SMS through the modem's compose form.
    pub async fn send_sms(&self, phone_number: &str, message: &str) -> ActionOutcome {
        self.replay_form(
            "admin/network/gcom/sms/smsnew?nomodal=&iface=4g",
            "admin/network/gcom/sms",
            &[
                ("cbid.smsnew.1.phone", phone_number),
                ("cbid.smsnew.1.content", message),
                ("cbid.smsnew.1.send", "Send"),
            ],
        )
        .await
    }

    /// Run an AT command against the modem. On success the detail is the
    /// command output lifted from the response textarea.
    pub async fn send_at_command(&self, command: &str) -> ActionOutcome {
        let page = "admin/network/gcom/atcmd?embedded=&iface=4g";
        let url = self.luci_url(page);
        let referer = self.luci_url("admin/network/gcom/config");

        let (_, html) = match self.fetch_action_page(&url, &referer).await {
            Ok(fetched) => fetched,
            Err(err) => return ActionOutcome::failed(err),
        };
        let Some(token) = extract_hidden(&html, "token") else {
            return ActionOutcome::failed("no token on AT command page");
        };

        let fields = [
            ("token", token.as_str()),
            ("timeclock", "0"),
            ("cbi.submit", "1"),
            ("cbid.atcmd.1.command", command),
            ("cbid.atcmd.1.refresh", "AT Command"),
        ];
        match self.post_action_form(&url, &referer, &fields).await {
            Ok((status, body)) => {
                if let Some(output) = extract_at_response(&body) {
                    ActionOutcome {
                        status: status.as_u16(),
                        detail: output,
                    }
                } else {
                    ActionOutcome {
                        status: status.as_u16(),
                        detail: excerpt(&body, 500),
                    }
                }
            }
            Err(err) => ActionOutcome::failed(err),
        }
    }

    // ── Mesh device actions ──────────────────────────────────────────
    //
    // Mesh management endpoints differ between firmware generations, so
    // these probe a short list of candidate pages and field layouts and
    // accept the first acknowledged POST.

    /// Reboot one mesh satellite by MAC address.
    pub async fn reboot_mesh_device(&self, mac_address: &str) -> ActionOutcome {
        let endpoints = [
            "admin/network/mesh/node",
            "admin/network/mesh/reboot",
            "admin/network/mesh/manage",
        ];
        let referer = self.luci_url("admin/network/mesh");

        for endpoint in endpoints {
            let url = self.luci_url(endpoint);
            let html = self.get_page(endpoint, true).await;
            let Some(token) = extract_hidden(&html, "token") else {
                continue;
            };

            let patterns: [&[(&str, &str)]; 3] = [
                &[("mac", mac_address), ("action", "reboot")],
                &[
                    ("cbid.mesh.1.mac", mac_address),
                    ("cbid.mesh.1.reboot", "Reboot"),
                ],
                &[("node_mac", mac_address), ("reboot", "1")],
            ];
            for extra in patterns {
                let mut fields: Vec<(&str, &str)> =
                    vec![("token", token.as_str()), ("timeclock", "0"), ("cbi.submit", "1")];
                fields.extend_from_slice(extra);

                match self.post_action_form(&url, &referer, &fields).await {
                    Ok((status, _)) if matches!(status.as_u16(), 200 | 302) => {
                        debug!("mesh reboot for {mac_address} accepted via {endpoint}");
                        return ActionOutcome {
                            status: status.as_u16(),
                            detail: format!("reboot initiated for {mac_address}"),
                        };
                    }
                    Ok(_) => {}
                    Err(err) => {
                        debug!("mesh reboot attempt on {endpoint} failed: {err}");
                        break;
                    }
                }
            }
        }

        warn!("failed to reboot mesh device {mac_address}: no working endpoint");
        ActionOutcome::failed(format!("failed to reboot mesh device {mac_address}"))
    }

    /// Switch a mesh satellite's status LEDs on or off.
    pub async fn set_mesh_led(&self, mac_address: &str, enabled: bool) -> ActionOutcome {
        let endpoints = [
            "admin/network/mesh/led",
            "admin/network/mesh/settings",
            "admin/system/led",
        ];
        let referer = self.luci_url("admin/network/mesh");
        let led_value = if enabled { "1" } else { "0" };
        let trigger = if enabled { "default-on" } else { "none" };

        for endpoint in endpoints {
            let url = self.luci_url(endpoint);
            let html = self.get_page(endpoint, true).await;
            let Some(token) = extract_hidden(&html, "token") else {
                continue;
            };

            let patterns: [&[(&str, &str)]; 4] = [
                &[("mac", mac_address), ("led", led_value)],
                &[("cbid.led.1.enable", led_value), ("node_mac", mac_address)],
                &[("led_enable", led_value), ("mac_address", mac_address)],
                // Global LED trigger -- no per-device addressing.
                &[("cbid.system.led.trigger", trigger)],
            ];
            for extra in patterns {
                let mut fields: Vec<(&str, &str)> =
                    vec![("token", token.as_str()), ("timeclock", "0"), ("cbi.submit", "1")];
                fields.extend_from_slice(extra);

                match self.post_action_form(&url, &referer, &fields).await {
                    Ok((status, _)) if matches!(status.as_u16(), 200 | 302) => {
                        debug!(
                            "mesh LED {} for {mac_address} accepted via {endpoint}",
                            if enabled { "on" } else { "off" }
                        );
                        return ActionOutcome {
                            status: status.as_u16(),
                            detail: format!(
                                "LED {} for {mac_address}",
                                if enabled { "on" } else { "off" }
                            ),
                        };
                    }
                    Ok(_) => {}
                    Err(err) => {
                        debug!("mesh LED attempt on {endpoint} failed: {err}");
                        break;
                    }
                }
            }
        }

        warn!("failed to set mesh LED for {mac_address}: no working endpoint");
        ActionOutcome::failed(format!("failed to set LED for mesh device {mac_address}"))
    }

    /// Switch the main router's own LEDs. The mesh endpoints address the
    /// main unit through the reserved all-zero client id.
    pub async fn set_main_router_led(&self, enabled: bool) -> ActionOutcome {
        self.set_mesh_led(MAIN_ROUTER_MAC, enabled).await
    }

    /// Read back a mesh device's LED state.
    ///
    /// `None` when no candidate page could be fetched at all; `Some(true)`
    /// when pages were reachable but carried no recognizable state (the
    /// firmware defaults LEDs to on).
    pub async fn get_mesh_led_state(&self, mac_address: &str) -> Option<bool> {
        let endpoints = [
            "admin/network/mesh/led",
            "admin/network/mesh/settings",
            "admin/network/mesh/status",
        ];

        let mut fetched_any = false;
        for endpoint in endpoints {
            let html = self.get_page(endpoint, true).await;
            if html.is_empty() {
                continue;
            }
            fetched_any = true;

            let lowered = html.to_lowercase();
            if !lowered.contains(&mac_address.to_lowercase()) && !lowered.contains("led") {
                continue;
            }
            if matches_ci(&html, r#"led["\s]*[:=]\s*["']?(?:on|1|true|enabled)"#) {
                return Some(true);
            }
            if matches_ci(&html, r#"led["\s]*[:=]\s*["']?(?:off|0|false|disabled)"#) {
                return Some(false);
            }
            if matches_ci(&html, r#"name="[^"]*led[^"]*"[^>]*checked"#) {
                return Some(true);
            }
        }

        if fetched_any { Some(true) } else { None }
    }
}

fn matches_ci(text: &str, pattern: &str) -> bool {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .is_ok_and(|re| re.is_match(text))
}

/// The `<select>` controlling band choice carries "band" somewhere in its
/// field name.
fn find_band_select(html: &str) -> Option<String> {
    let re = RegexBuilder::new(r#"<select[^>]*name="([^"]*band[^"]*)""#)
        .case_insensitive(true)
        .build()
        .ok()?;
    Some(re.captures(html)?.get(1)?.as_str().to_owned())
}

/// AT command output comes back inside a dedicated textarea.
fn extract_at_response(html: &str) -> Option<String> {
    let re =
        Regex::new(r#"<textarea[^>]*id="cbid\.atcmd\.1\._custom"[^>]*>([^<]*)</textarea>"#).ok()?;
    let output = re.captures(html)?.get(1)?.as_str().trim();
    if output.is_empty() {
        None
    } else {
        Some(output.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_select_discovery() {
        let html = r#"<form><select name="cbid.setting.1.lte_band"><option>B1</option></select></form>"#;
        assert_eq!(
            find_band_select(html).as_deref(),
            Some("cbid.setting.1.lte_band")
        );
        assert_eq!(find_band_select("<select name=\"mode\">"), None);
    }

    #[test]
    fn at_response_extraction() {
        let html = r#"<textarea readonly id="cbid.atcmd.1._custom">+CSQ: 22,99

OK</textarea>"#;
        assert_eq!(
            extract_at_response(html).as_deref(),
            Some("+CSQ: 22,99\n\nOK")
        );
        assert_eq!(extract_at_response("<textarea></textarea>"), None);
    }

    #[test]
    fn outcome_success_codes() {
        let ok = ActionOutcome {
            status: 302,
            detail: String::new(),
        };
        assert!(ok.succeeded());
        let denied = ActionOutcome {
            status: 403,
            detail: String::new(),
        };
        assert!(!denied.succeeded());
    }
}
