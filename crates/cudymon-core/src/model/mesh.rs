// ── Mesh domain types ──
//
// A mesh unit's facts arrive from up to three partially-overlapping
// sources (HTML panels, the clients JSON feed, per-client detail pages);
// `MeshDevice` is the merged record, keyed by canonical MAC.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

/// Two-valued connection state. Only the JSON feed's literal
/// `"connected"` maps to `Online`; every other reported state collapses
/// to `Offline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshStatus {
    #[default]
    Online,
    Offline,
}

/// One mesh unit (satellite, or the main router before it is folded out
/// of the satellite set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDevice {
    /// Canonical identity. Synthesized from the display name when no real
    /// MAC was visible (see [`MacAddress::from_name`]).
    pub mac_address: MacAddress,
    pub name: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub ip_address: Option<String>,
    pub status: MeshStatus,
    /// Client count behind this unit. HTML-only -- the JSON feed never
    /// carries it.
    pub connected_devices: u32,
    pub backhaul: Option<String>,
    pub led_status: Option<String>,

    /// True when the record matched main-router markers and must be
    /// folded into the primary entity instead of the satellite set.
    #[serde(skip)]
    pub(crate) is_main_router: bool,
    /// True when `mac_address` was synthesized from the name; such
    /// records are replaced in place once a real MAC shows up.
    #[serde(skip)]
    pub(crate) pseudo_identity: bool,
}

impl MeshDevice {
    /// An empty record carrying only an identity.
    pub fn placeholder(mac_address: MacAddress) -> Self {
        Self {
            mac_address,
            name: None,
            model: None,
            firmware_version: None,
            ip_address: None,
            status: MeshStatus::default(),
            connected_devices: 0,
            backhaul: None,
            led_status: None,
            is_main_router: false,
            pseudo_identity: false,
        }
    }
}

/// The reconciled mesh topology for one poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshReport {
    /// Satellite units only; the main router is never counted.
    pub satellite_count: u32,
    /// The main router's configured mesh device name, when the status
    /// panel exposes it.
    pub main_router_name: Option<String>,
    /// The main router's LED state, lifted from the all-zero client id
    /// in the JSON feed.
    pub main_router_led_status: Option<String>,
    pub devices: BTreeMap<MacAddress, MeshDevice>,
}
