// ── Mesh identity reconciliation ──
//
// Facts about one physical mesh unit arrive from three places: scraped
// status HTML, the clients JSON feed, and per-client detail pages. This
// module owns the merge rules:
//
// - records are keyed by canonical MAC; a MAC match always beats a
//   name match,
// - JSON-sourced fields win over HTML-scraped ones on conflict, except
//   `connected_devices`, which only the HTML detail pages provide,
// - a pseudo-MAC placeholder is replaced in place when a record with the
//   same display name arrives under a real MAC,
// - the reserved all-zero client id is the main router: its LED state is
//   lifted, but it never joins the satellite set.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::model::{MacAddress, MeshDevice, MeshReport, MeshStatus};
use crate::pages::mesh::{MeshClientDetail, MeshScan};

/// One entry of the clients JSON endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeshClientEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub sysreport: SysReport,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SysReport {
    #[serde(default)]
    pub hardware: Option<String>,
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub firmware: Option<String>,
    #[serde(default)]
    pub ipaddr: Option<String>,
    #[serde(default)]
    pub ledstatus: Option<String>,
}

static JSON_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("static pattern"));

/// Lift the client array out of the endpoint body. The endpoint wraps
/// the array in page chrome on some builds, so the array is located by
/// pattern rather than parsed wholesale.
pub fn parse_clients_json(body: &str) -> Vec<MeshClientEntry> {
    let Some(found) = JSON_ARRAY_RE.find(body) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<MeshClientEntry>>(found.as_str()) {
        Ok(entries) => entries.into_iter().filter(|e| !e.id.is_empty()).collect(),
        Err(err) => {
            debug!("could not parse mesh clients JSON: {err}");
            Vec::new()
        }
    }
}

/// The 12-hex client ids referenced from the status HTML (tab anchors
/// and per-client links).
pub fn client_ids_in_html(mesh_html: &str) -> Vec<String> {
    static TAB_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"tab-([0-9A-Fa-f]{12})-").expect("static pattern"));
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"client=([0-9A-Fa-f]{12})").expect("static pattern"));

    let mut ids: Vec<String> = TAB_RE
        .captures_iter(mesh_html)
        .chain(LINK_RE.captures_iter(mesh_html))
        .map(|caps| caps[1].to_owned())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Convert one JSON client entry into a (partial) mesh device record.
///
/// The hardware string (e.g. `"RE1200 V1.0"`) is preferred as the model
/// name, falling back to the board/model codes. Only the literal
/// `"connected"` state maps to online.
pub fn device_from_json(entry: &MeshClientEntry) -> Option<(MacAddress, MeshDevice)> {
    if entry.id.len() != 12 {
        return None;
    }
    let mac = MacAddress::new(&entry.id);

    let model = entry
        .sysreport
        .hardware
        .as_deref()
        .filter(|h| !h.is_empty())
        .and_then(|h| h.split(' ').next())
        .map(str::to_owned)
        .or_else(|| entry.sysreport.board.clone())
        .or_else(|| entry.sysreport.model.clone());

    let mut device = MeshDevice::placeholder(mac.clone());
    device.name = entry.name.clone();
    device.model = model;
    device.firmware_version = entry.sysreport.firmware.clone();
    device.ip_address = entry.sysreport.ipaddr.clone();
    device.status = if entry.state.as_deref() == Some("connected") {
        MeshStatus::Online
    } else {
        MeshStatus::Offline
    };
    device.led_status = entry.sysreport.ledstatus.clone();
    Some((mac, device))
}

fn is_unknown(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => v.is_empty() || v == "Unknown",
    }
}

/// Fold the HTML detail pages into a record. When the record came from
/// the JSON feed, JSON fields keep precedence and HTML only fills gaps;
/// `connected_devices` is always taken from HTML because the JSON feed
/// lacks it.
pub fn apply_detail(device: &mut MeshDevice, detail: &MeshClientDetail, from_json: bool) {
    device.connected_devices = detail.connected_devices;
    device.backhaul = detail.backhaul.clone();

    if is_unknown(device.name.as_deref()) {
        device.name.clone_from(&detail.name);
    }
    if is_unknown(device.model.as_deref()) {
        device.model.clone_from(&detail.model);
    }
    if is_unknown(device.firmware_version.as_deref()) {
        device.firmware_version.clone_from(&detail.firmware_version);
    }
    if is_unknown(device.ip_address.as_deref()) {
        device.ip_address.clone_from(&detail.ip_address);
    }
    if !from_json {
        device.status = detail.status;
    }
}

/// Merge an incoming record into the device set.
///
/// Tie-break order: an existing record under the same MAC is updated in
/// place; otherwise a pseudo-MAC placeholder with the same display name
/// is replaced (the real MAC takes over as the key); otherwise the
/// record is inserted fresh.
pub fn merge_device(
    devices: &mut BTreeMap<MacAddress, MeshDevice>,
    incoming: MeshDevice,
) {
    if let Some(existing) = devices.get_mut(&incoming.mac_address) {
        overlay(existing, incoming);
        return;
    }

    let incoming_name = incoming.name.as_deref().map(str::to_lowercase);
    let placeholder_key = incoming_name.and_then(|name| {
        devices
            .iter()
            .find(|(_, device)| {
                device.pseudo_identity
                    && device
                        .name
                        .as_deref()
                        .is_some_and(|existing| existing.to_lowercase() == name)
            })
            .map(|(key, _)| key.clone())
    });

    if let Some(key) = placeholder_key {
        debug!(
            "replacing placeholder {key} with real identity {}",
            incoming.mac_address
        );
        devices.remove(&key);
    }
    devices.insert(incoming.mac_address.clone(), incoming);
}

/// Overlay `incoming` onto an existing record with the same MAC:
/// present fields win, absent fields keep what was already known.
fn overlay(existing: &mut MeshDevice, incoming: MeshDevice) {
    if incoming.name.is_some() {
        existing.name = incoming.name;
    }
    if incoming.model.is_some() {
        existing.model = incoming.model;
    }
    if incoming.firmware_version.is_some() {
        existing.firmware_version = incoming.firmware_version;
    }
    if incoming.ip_address.is_some() {
        existing.ip_address = incoming.ip_address;
    }
    if incoming.backhaul.is_some() {
        existing.backhaul = incoming.backhaul;
    }
    if incoming.led_status.is_some() {
        existing.led_status = incoming.led_status;
    }
    existing.status = incoming.status;
    existing.connected_devices = incoming.connected_devices;
    existing.pseudo_identity = false;
}

/// Seed a report from the HTML scan.
pub fn report_from_scan(scan: MeshScan) -> MeshReport {
    let mut report = MeshReport {
        satellite_count: scan.satellite_count,
        main_router_name: scan.main_router_name,
        main_router_led_status: None,
        devices: BTreeMap::new(),
    };
    for device in scan.devices {
        report.devices.insert(device.mac_address.clone(), device);
    }
    report
}
