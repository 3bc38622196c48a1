// Mesh topology page parsers.
//
// Mesh pages are the least consistent surface of the firmware: the same
// topology may be rendered as styled panels, plain table rows, id-hinted
// divs, or a JSON blob inside a script tag, depending on build. The
// strategies below are probed in priority order and the first one that
// yields any device wins. Satellite panels often show only a display
// name -- those records get a deterministic pseudo-MAC so their identity
// is stable across polls.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::model::{MacAddress, MeshDevice, MeshStatus};
use crate::scrape::tables::{element_text, element_text_lines, parse_tables};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn regex_ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static pattern")
}

static PANEL_SEL: LazyLock<Selector> = LazyLock::new(|| selector("div.panel"));
static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static TR_SEL: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| selector("td, th"));
static DIV_SEL: LazyLock<Selector> = LazyLock::new(|| selector("div"));

static MAC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}").expect("static pattern"));
static IP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").expect("static pattern"));
static MESHY_ID_RE: LazyLock<Regex> = LazyLock::new(|| regex_ci("mesh|node|satellite"));

/// What the mesh status HTML yielded before reconciliation with the
/// clients JSON feed.
#[derive(Debug, Clone, Default)]
pub struct MeshScan {
    /// Coarse satellite count from the status panel (main router already
    /// subtracted), possibly refined by structural extraction.
    pub satellite_count: u32,
    /// The main router's configured device name, when shown.
    pub main_router_name: Option<String>,
    /// Deduplicated satellite records, main router excluded.
    pub devices: Vec<MeshDevice>,
}

/// Per-client facts from the devstatus/devlist detail pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshClientDetail {
    pub model: Option<String>,
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub firmware_version: Option<String>,
    pub backhaul: Option<String>,
    pub connected_devices: u32,
    pub status: MeshStatus,
}

/// Parse the concatenated mesh status HTML.
pub fn parse_mesh_devices(input_html: &str) -> MeshScan {
    let mut scan = MeshScan::default();
    if input_html.is_empty() {
        return scan;
    }

    // Coarse count and main-router name from the simple status panel.
    let raw = parse_tables(input_html);
    if let Some(units) = raw.get("Mesh Units").and_then(|v| v.trim().parse::<u32>().ok()) {
        scan.satellite_count = units.saturating_sub(1);
    }
    if let Some(name) = raw.get("Device Name").filter(|v| !v.is_empty()) {
        // The main router is represented by the primary entity, not a
        // mesh record; only its name is carried.
        scan.main_router_name = Some(name.clone());
    }

    let document = Html::parse_document(input_html);
    let mut found: Vec<MeshDevice> = Vec::new();

    // Strategy 1: styled panels (richest layout).
    for (index, panel) in document.select(&PANEL_SEL).enumerate() {
        if let Some(device) = extract_from_element(panel) {
            found.push(device);
        } else if let Some(device) = extract_nameplate_panel(panel, index) {
            found.push(device);
        }
    }

    // Strategy 2: table rows.
    if found.is_empty() {
        for table in document.select(&TABLE_SEL) {
            for row in table.select(&TR_SEL) {
                if let Some(device) = extract_from_row(row) {
                    found.push(device);
                }
            }
        }
    }

    // Strategy 3: id-hinted divs.
    if found.is_empty() {
        for div in document.select(&DIV_SEL) {
            let Some(id) = div.value().attr("id") else {
                continue;
            };
            if MESHY_ID_RE.is_match(id) {
                if let Some(device) = extract_from_element(div) {
                    found.push(device);
                }
            }
        }
    }

    // Strategy 4: embedded JSON arrays in script text.
    if found.is_empty() {
        found = extract_from_script(input_html);
    }

    // Deduplicate by MAC and fold out the main router.
    let mut seen = std::collections::HashSet::new();
    for device in found {
        if device.is_main_router {
            continue;
        }
        if device.name.as_deref().is_some_and(|name| {
            matches!(
                name.to_lowercase().as_str(),
                "main router" | "mainrouter" | "main_router" | "router"
            )
        }) {
            continue;
        }
        if seen.insert(device.mac_address.clone()) {
            scan.devices.push(device);
        }
    }

    if !scan.devices.is_empty() {
        #[allow(clippy::cast_possible_truncation)]
        {
            scan.satellite_count = scan.devices.len() as u32;
        }
        debug!(
            "mesh scan found {} satellite device(s)",
            scan.devices.len()
        );
    }

    scan
}

// ── Strategy helpers ────────────────────────────────────────────────

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        regex_ci(r"(?:Device\s*Name|Name|Hostname)[:\s]*([^\n]+)"),
        regex_ci(r"Node\s*Name[:\s]*([^\n]+)"),
    ]
});
static MODEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        regex_ci(r"(?:Model|Device\s*Model|Product)[:\s]*([^\n]+)"),
        Regex::new(r"(Cudy\s*[A-Z0-9]+)").expect("static pattern"),
    ]
});
static FIRMWARE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        regex_ci(r"(?:Firmware\s*Version|Firmware|FW|Version)[:\s]*([^\n]+)"),
        Regex::new(r"(\d+\.\d+\.\d+[^\n]*)").expect("static pattern"),
    ]
});

fn first_capture(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_owned())
    })
}

fn status_from_text(text: &str) -> MeshStatus {
    if regex_ci(r"offline|disconnected").is_match(text) {
        MeshStatus::Offline
    } else {
        MeshStatus::Online
    }
}

/// Generic extraction from any DOM element whose text exposes a real MAC.
fn extract_from_element(element: ElementRef<'_>) -> Option<MeshDevice> {
    let text = element_text_lines(element);
    let mac = MAC_RE.find(&text)?;

    let mut device = MeshDevice::placeholder(MacAddress::new(mac.as_str()));
    device.name = first_capture(&text, &NAME_PATTERNS);
    device.model = first_capture(&text, &MODEL_PATTERNS);
    device.firmware_version = first_capture(&text, &FIRMWARE_PATTERNS);
    device.ip_address = IP_RE
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned());
    device.status = status_from_text(&text);
    Some(device)
}

/// Satellite panels frequently carry nothing but a display name; the
/// static HTML loads firmware/IP/model via AJAX later. Such panels get
/// a name-derived pseudo-MAC.
fn extract_nameplate_panel(element: ElementRef<'_>, index: usize) -> Option<MeshDevice> {
    let text = element_text_lines(element);
    let lowered = text.to_lowercase();
    let trimmed = lowered.trim();

    let short_names = ["mesh", "satellite", "node", "extender", "repeater"];
    let is_short_name = short_names
        .iter()
        .any(|name| trimmed == *name || trimmed.starts_with(&format!("{name} ")));

    if text.len() < 20 && !is_short_name {
        return None;
    }

    // Navigation and chrome panels, unless they also carry a device name.
    let chrome = ["logout", "menu", "settings", "wizard", "more details"];
    let specific_name_re = regex_ci(r"(Main\s*Router|Satellite|Node\s*\d+)");
    if chrome.iter().any(|word| lowered.contains(word))
        && !specific_name_re.is_match(&text)
        && trimmed != "mesh"
    {
        return None;
    }

    // Label-only panels repeat the column header without data.
    if lowered.matches("device name").count() > 1 && !lowered.contains("main router") {
        return None;
    }

    let mut device = MeshDevice::placeholder(MacAddress::new(""));
    if let Some(mac) = MAC_RE.find(&text) {
        device.mac_address = MacAddress::new(mac.as_str());
    }

    if is_short_name {
        device.name = Some(text.trim().to_owned());
        debug!("mesh panel {index} is a bare nameplate: {:?}", device.name);
    } else if let Some(caps) = specific_name_re.captures(&text) {
        device.name = Some(caps[1].trim().to_owned());
    } else if let Some(caps) =
        regex_ci(r"Device\s*Name[:\s]+([A-Za-z][A-Za-z0-9\s\-_]+?)(?:\s+(?:Mesh|Device|Status|More)|$)")
            .captures(&text)
    {
        let candidate = caps[1].trim().to_owned();
        if !matches!(
            candidate.to_lowercase().as_str(),
            "device name" | "name" | "hostname" | "device"
        ) {
            device.name = Some(candidate);
        }
    }

    if let Some(caps) = Regex::new(r"((?:Cudy\s*)?[A-Z]?\d{3,4}[A-Z]?)")
        .expect("static pattern")
        .captures(&text)
    {
        device.model = Some(caps[1].trim().to_owned());
    }
    if let Some(caps) = Regex::new(r"(\d+\.\d+\.\d+(?:\.\d+)?)")
        .expect("static pattern")
        .captures(&text)
    {
        device.firmware_version = Some(caps[1].to_owned());
    }
    if let Some(caps) = IP_RE.captures(&text) {
        device.ip_address = Some(caps[1].to_owned());
    }
    device.status = if regex_ci(r"offline|disconnected|down").is_match(&text) {
        MeshStatus::Offline
    } else {
        MeshStatus::Online
    };

    let name = device.name.clone()?;
    if device.mac_address.as_str().is_empty() {
        device.mac_address = MacAddress::from_name(&name);
        device.pseudo_identity = true;
    }
    if regex_ci(r"Main\s*Router").is_match(&name) {
        device.is_main_router = true;
    }
    Some(device)
}

/// Table-row extraction: needs at least two cells and a real MAC
/// somewhere in the row.
fn extract_from_row(row: ElementRef<'_>) -> Option<MeshDevice> {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL_SEL).collect();
    if cells.len() < 2 {
        return None;
    }
    let text = cells
        .iter()
        .map(|cell| element_text(*cell))
        .collect::<Vec<_>>()
        .join(" ");
    let mac = MAC_RE.find(&text)?;

    let mut device = MeshDevice::placeholder(MacAddress::new(mac.as_str()));

    let first_cell = element_text(cells[0]);
    if !MAC_RE.is_match(&first_cell) && !first_cell.is_empty() {
        device.name = Some(first_cell);
    }
    device.ip_address = cells.iter().find_map(|cell| {
        IP_RE
            .captures(&element_text(*cell))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned())
    });
    if let Some(caps) = regex_ci(r"(Cudy\s*[A-Z0-9]+|M[0-9]{4})").captures(&text) {
        device.model = Some(caps[1].to_owned());
    }
    if let Some(caps) = Regex::new(r"(\d+\.\d+\.\d+)")
        .expect("static pattern")
        .captures(&text)
    {
        device.firmware_version = Some(caps[1].to_owned());
    }
    Some(device)
}

static SCRIPT_ARRAY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?s)(?:meshNodes|mesh_nodes|nodes)\s*[=:]\s*(\[.*?\])\s*[;,]",
        r"(?s)(?:satellites|mesh_devices)\s*[=:]\s*(\[.*?\])\s*[;,]",
        r"(?s)(?:unit_list|mesh_units)\s*[=:]\s*(\[.*?\])\s*[;,]",
        r#"(?s)"nodes"\s*:\s*(\[.*?\])"#,
        r#"(?s)"devices"\s*:\s*(\[.*?\])"#,
    ]
    .iter()
    .map(|pattern| regex_ci(pattern))
    .collect()
});

fn json_str(item: &JsonValue, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(JsonValue::as_str))
        .map(str::to_owned)
}

/// Last-resort extraction: `meshNodes = [...]`-style arrays embedded in
/// inline scripts.
fn extract_from_script(input_html: &str) -> Vec<MeshDevice> {
    let mut devices = Vec::new();

    for pattern in SCRIPT_ARRAY_PATTERNS.iter() {
        let Some(caps) = pattern.captures(input_html) else {
            continue;
        };
        let Ok(JsonValue::Array(items)) = serde_json::from_str::<JsonValue>(&caps[1]) else {
            continue;
        };
        for item in items {
            let Some(mac) = json_str(&item, &["mac", "mac_address", "macAddress"]) else {
                continue;
            };
            if mac.is_empty() {
                continue;
            }
            let mut device = MeshDevice::placeholder(MacAddress::new(&mac));
            device.name = json_str(&item, &["name", "hostname"]);
            device.model = json_str(&item, &["model", "device_model"]);
            device.firmware_version = json_str(&item, &["firmware", "fw_version", "version"]);
            device.ip_address = json_str(&item, &["ip", "ip_address"]);
            device.status = match json_str(&item, &["status"]).as_deref() {
                Some(status) if status.eq_ignore_ascii_case("offline") => MeshStatus::Offline,
                _ => MeshStatus::Online,
            };
            devices.push(device);
        }
    }

    devices
}

// ── Per-client detail pages ─────────────────────────────────────────

static CBI_CONTENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cbi-table-\d+-content$").expect("static pattern"));
static CBI_DATA_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cbi-table-\d+-data$").expect("static pattern"));
static CBI_ROW_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cbi-table-\d+").expect("static pattern"));

fn find_div_by_id<'a>(row: ElementRef<'a>, id_pattern: &Regex) -> Option<ElementRef<'a>> {
    row.descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| {
            el.value().name() == "div"
                && el
                    .value()
                    .attr("id")
                    .is_some_and(|id| id_pattern.is_match(id))
        })
}

/// Parse a mesh client's devstatus page (label/value rows keyed by
/// `cbi-table-*-content` / `cbi-table-*-data` div ids), plus the devlist
/// page whose row count is the client's connected-device count.
pub fn parse_mesh_client_status(
    devstatus_html: &str,
    devlist_html: Option<&str>,
) -> Option<MeshClientDetail> {
    if devstatus_html.is_empty() {
        return None;
    }

    let mut detail = MeshClientDetail::default();
    let document = Html::parse_document(devstatus_html);

    for row in document.select(&TR_SEL) {
        let Some(content) = find_div_by_id(row, &CBI_CONTENT_ID_RE) else {
            continue;
        };
        let Some(data) = find_div_by_id(row, &CBI_DATA_ID_RE) else {
            continue;
        };
        let label = element_text(content).to_lowercase();
        let value = element_text(data);

        match label.as_str() {
            "model" => detail.model = Some(value),
            "device name" | "name" => detail.name = Some(value),
            "ip address" | "ip-address" | "ipaddress" => detail.ip_address = Some(value),
            "mac-address" | "mac address" | "macaddress" => {
                detail.mac_address = Some(value.to_uppercase());
            }
            "firmware version" | "firmware" => detail.firmware_version = Some(value),
            "backhaul" => detail.backhaul = Some(value),
            "status" => {
                let lowered = value.to_lowercase();
                if lowered.contains("offline") {
                    detail.status = MeshStatus::Offline;
                } else if lowered.contains("online") {
                    detail.status = MeshStatus::Online;
                }
            }
            _ => {}
        }
    }

    if let Some(devlist_html) = devlist_html.filter(|html| !html.is_empty()) {
        let devlist = Html::parse_document(devlist_html);
        let count = devlist
            .select(&TR_SEL)
            .filter(|row| {
                row.value()
                    .attr("id")
                    .is_some_and(|id| CBI_ROW_ID_RE.is_match(id))
            })
            .count();
        #[allow(clippy::cast_possible_truncation)]
        {
            detail.connected_devices = count as u32;
        }
    }

    let meaningful = detail.name.is_some()
        || detail.mac_address.is_some()
        || detail.model.is_some()
        || detail.connected_devices > 0;
    if meaningful {
        debug!("parsed mesh client detail: {detail:?}");
        Some(detail)
    } else {
        None
    }
}
