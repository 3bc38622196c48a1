// Connected-devices parsers: the per-client list (with per-device
// speeds) and the client-count summary.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};

use crate::model::{Device, Field, FieldMap};
use crate::scrape::text::{as_int, parse_speed};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static TR_SEL: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static TD_DIV_SEL: LazyLock<Selector> = LazyLock::new(|| selector("td div"));
static MOBILE_P_SEL: LazyLock<Selector> = LazyLock::new(|| selector("p.visible-xs"));

/// Descendant text with `<br>` elements rendered as newlines -- the
/// device list packs two facts into one paragraph separated by a break.
fn text_with_br(element: ElementRef<'_>) -> String {
    fn walk(node: ego_tree::NodeRef<'_, scraper::Node>, out: &mut String) {
        for child in node.children() {
            match child.value() {
                scraper::Node::Text(text) => out.push_str(&text),
                scraper::Node::Element(el) if el.name() == "br" => out.push('\n'),
                scraper::Node::Element(_) => walk(child, out),
                _ => {}
            }
        }
    }
    let mut out = String::new();
    walk(*element, &mut out);
    out
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Extract every client row. Cells are identified by div id suffix
/// (`…ipmac`, `…speed`, `…hostname`), each holding a two-line
/// mobile-view paragraph.
fn get_all_devices(input_html: &str) -> Vec<Device> {
    let mut devices = Vec::new();
    if input_html.is_empty() {
        return devices;
    }
    let document = Html::parse_document(input_html);

    for table in document.select(&TABLE_SEL) {
        for row in table.select(&TR_SEL) {
            let mut ip = None;
            let mut mac = None;
            let mut up_speed = None;
            let mut down_speed = None;
            let mut hostname = None;

            for col in row.select(&TD_DIV_SEL) {
                let Some(div_id) = col.value().attr("id") else {
                    continue;
                };
                let Some(content_el) = col.select(&MOBILE_P_SEL).next() else {
                    continue;
                };
                let content = text_with_br(content_el);
                let content = content.trim();
                if !content.contains('\n') {
                    continue;
                }
                let lines: Vec<&str> = content.split('\n').map(str::trim).collect();
                if div_id.ends_with("ipmac") && lines.len() >= 2 {
                    ip = non_empty(lines[0]);
                    mac = non_empty(lines[1]);
                }
                if div_id.ends_with("speed") && lines.len() >= 2 {
                    up_speed = non_empty(lines[0]);
                    down_speed = non_empty(lines[1]);
                }
                if div_id.ends_with("hostname") {
                    hostname = non_empty(lines[0]);
                }
            }

            if mac.is_some() || ip.is_some() {
                devices.push(Device {
                    hostname,
                    ip,
                    mac,
                    up_speed_mbps: up_speed.as_deref().and_then(parse_speed),
                    down_speed_mbps: down_speed.as_deref().and_then(parse_speed),
                });
            }
        }
    }

    devices
}

/// Parse the devices page: count, top talkers, summed totals, and full
/// records for the clients the host asked to track by MAC or hostname.
pub fn parse_devices(
    input_html: &str,
    device_list: Option<&str>,
) -> (FieldMap, BTreeMap<String, Device>) {
    let devices = get_all_devices(input_html);

    let mut data = FieldMap::new();
    #[allow(clippy::cast_possible_wrap)]
    data.insert("device_count".into(), Field::of(devices.len() as i64));

    let mut detailed = BTreeMap::new();
    if devices.is_empty() {
        return (data, detailed);
    }

    let speed_or_zero = |speed: Option<f64>| speed.unwrap_or(0.0);
    if let Some(top_down) = devices
        .iter()
        .max_by(|a, b| speed_or_zero(a.down_speed_mbps).total_cmp(&speed_or_zero(b.down_speed_mbps)))
    {
        data.insert(
            "top_downloader_speed".into(),
            Field::maybe(top_down.down_speed_mbps),
        );
        data.insert(
            "top_downloader_mac".into(),
            Field::maybe(top_down.mac.clone()),
        );
        data.insert(
            "top_downloader_hostname".into(),
            Field::maybe(top_down.hostname.clone()),
        );
    }
    if let Some(top_up) = devices
        .iter()
        .max_by(|a, b| speed_or_zero(a.up_speed_mbps).total_cmp(&speed_or_zero(b.up_speed_mbps)))
    {
        data.insert(
            "top_uploader_speed".into(),
            Field::maybe(top_up.up_speed_mbps),
        );
        data.insert("top_uploader_mac".into(), Field::maybe(top_up.mac.clone()));
        data.insert(
            "top_uploader_hostname".into(),
            Field::maybe(top_up.hostname.clone()),
        );
    }

    let wanted: Vec<&str> = device_list
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();
    for device in &devices {
        if let Some(mac) = &device.mac {
            if wanted.contains(&mac.as_str()) {
                detailed.insert(mac.clone(), device.clone());
            }
        }
        if let Some(hostname) = &device.hostname {
            if wanted.contains(&hostname.as_str()) {
                detailed.insert(hostname.clone(), device.clone());
            }
        }
    }

    let total_down: f64 = devices.iter().map(|d| d.down_speed_mbps.unwrap_or(0.0)).sum();
    let total_up: f64 = devices.iter().map(|d| d.up_speed_mbps.unwrap_or(0.0)).sum();
    data.insert("total_down_speed".into(), Field::of(total_down));
    data.insert("total_up_speed".into(), Field::of(total_up));

    (data, detailed)
}

// ── Client-count summary ────────────────────────────────────────────

const WIFI_2G_ALIASES: &[&str] = &[
    "2.4G Clients",
    "2.4G clients",
    "2.4GHz Clients",
    "WiFi 2.4G Clients",
    "Wireless 2.4G",
    "2.4G",
    "2.4 GHz",
    "2.4GHz",
    "WLAN 2.4G",
    "Wi-Fi 2.4G",
    "2.4G WiFi",
];

const WIFI_5G_ALIASES: &[&str] = &[
    "5G Clients",
    "5G clients",
    "5GHz Clients",
    "WiFi 5G Clients",
    "Wireless 5G",
    "5G",
    "5 GHz",
    "5GHz",
    "WLAN 5G",
    "Wi-Fi 5G",
    "5G WiFi",
];

const TOTAL_ALIASES: &[&str] = &[
    "Total Clients",
    "Total clients",
    "Total",
    "Connected Clients",
    "Online Clients",
    "All Clients",
    "Clients",
    "Online",
    "Connected",
];

fn regex_ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static pattern")
}

static JS_2G_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        regex_ci(r#"["']?(?:wifi_?2g|wlan_?2g|clients_?2g|2g_?clients)["']?\s*[=:]\s*(\d+)"#),
        regex_ci(r"2\.4[Gg].*?(\d+)\s*(?:client|device)"),
    ]
});
static JS_5G_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        regex_ci(r#"["']?(?:wifi_?5g|wlan_?5g|clients_?5g|5g_?clients)["']?\s*[=:]\s*(\d+)"#),
        regex_ci(r"5[Gg].*?(\d+)\s*(?:client|device)"),
    ]
});
static JS_TOTAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        regex_ci(r#"["']?(?:total_?clients|clients_?total|online_?clients)["']?\s*[=:]\s*(\d+)"#),
        regex_ci(r"(?:total|all).*?(\d+)\s*(?:client|device)"),
    ]
});

fn int_alias(
    raw: &std::collections::HashMap<String, String>,
    aliases: &[&str],
) -> Option<i64> {
    aliases
        .iter()
        .find_map(|key| raw.get(*key).and_then(|v| as_int(v)))
}

fn js_fallback(input_html: &str, patterns: &[Regex]) -> Option<i64> {
    patterns.iter().find_map(|re| {
        re.captures(input_html)
            .and_then(|caps| caps.get(1))
            .and_then(|m| as_int(m.as_str()))
    })
}

/// Parse the connected-client counts. Labeled rows first; when no table
/// yields anything, counts embedded in inline JavaScript are scanned.
/// A missing total is computed as the sum of the known categories.
pub fn parse_devices_status(input_html: &str) -> FieldMap {
    let raw = crate::scrape::tables::parse_tables(input_html);

    let mut wifi_2g = int_alias(&raw, WIFI_2G_ALIASES);
    let mut wifi_5g = int_alias(&raw, WIFI_5G_ALIASES);
    let wired = raw.get("Wired").and_then(|v| as_int(v));
    let mut total = int_alias(&raw, TOTAL_ALIASES);

    if !input_html.is_empty() && wifi_2g.is_none() && wifi_5g.is_none() && total.is_none() {
        wifi_2g = js_fallback(input_html, &JS_2G_PATTERNS);
        wifi_5g = js_fallback(input_html, &JS_5G_PATTERNS);
        total = js_fallback(input_html, &JS_TOTAL_PATTERNS);
    }

    if total.is_none() && (wifi_2g.is_some() || wifi_5g.is_some()) {
        total = Some(wifi_2g.unwrap_or(0) + wifi_5g.unwrap_or(0) + wired.unwrap_or(0));
    }

    let mut data = FieldMap::new();
    data.insert("wifi_2g_clients".into(), Field::maybe(wifi_2g));
    data.insert("wifi_5g_clients".into(), Field::maybe(wifi_5g));
    data.insert("wired_clients".into(), Field::maybe(wired));
    data.insert("total_clients".into(), Field::maybe(total));
    data
}
