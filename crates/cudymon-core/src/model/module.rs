// ── Module names and the poll snapshot ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::device::Device;
use super::field::{Field, FieldMap, Value};
use super::mesh::MeshReport;

/// The closed set of router subsystems a poll can report on.
///
/// A module's presence in a [`Snapshot`] means it was attempted for the
/// current hardware model; absence means the feature matrix excluded it.
/// Absent is deliberately distinct from present-with-all-null-fields.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Modem,
    Devices,
    System,
    DataUsage,
    Sms,
    #[strum(serialize = "wifi_2g")]
    #[serde(rename = "wifi_2g")]
    Wifi2g,
    #[strum(serialize = "wifi_5g")]
    #[serde(rename = "wifi_5g")]
    Wifi5g,
    Lan,
    Vpn,
    Wan,
    Dhcp,
    Mesh,
}

/// Everything one poll produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Per-module field maps, present iff the module was attempted.
    pub modules: BTreeMap<Module, FieldMap>,
    /// Full records for the clients named in the host's device-list
    /// option, keyed by whichever identifier (MAC or hostname) matched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub detailed_devices: BTreeMap<String, Device>,
    /// Reconciled mesh topology, when the mesh module was attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshReport>,
}

impl Snapshot {
    pub fn module(&self, module: Module) -> Option<&FieldMap> {
        self.modules.get(&module)
    }

    pub fn field(&self, module: Module, key: &str) -> Option<&Field> {
        self.modules.get(&module)?.get(key)
    }

    /// Convenience accessor for a field's primary value.
    pub fn value(&self, module: Module, key: &str) -> Option<&Value> {
        self.field(module, key)?.value.as_ref()
    }
}
