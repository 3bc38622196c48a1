// ── MAC address identity ──
//
// MACs are the primary key for mesh devices and come in from three
// sources with three different spellings: colon-separated HTML text,
// dash-separated panel text, and bare 12-hex JSON ids. Everything is
// normalized to colon-separated upper-hex so records merge correctly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// MAC address, normalized to colon-separated upper-hex
/// (`AA:BB:CC:DD:EE:FF`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a normalized MAC from any common spelling: colon- or
    /// dash-separated, bare 12-hex, any letter case. Input that isn't
    /// 12 hex digits after separator stripping is kept as-is (uppercased,
    /// dashes to colons) rather than rejected -- scraped text is messy.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        let stripped: String = raw.chars().filter(|c| *c != ':' && *c != '-').collect();
        if stripped.len() == 12 && stripped.chars().all(|c| c.is_ascii_hexdigit()) {
            let upper = stripped.to_uppercase();
            let grouped: Vec<&str> = (0..6)
                .filter_map(|i| upper.get(i * 2..i * 2 + 2))
                .collect();
            return Self(grouped.join(":"));
        }
        Self(raw.to_uppercase().replace('-', ":"))
    }

    /// Deterministic pseudo-MAC for a device that only exposes a display
    /// name. Derived from a one-way hash of the name so repeated polls
    /// produce a stable identity; the locally-administered unicast bit is
    /// set so it can never collide with a real burned-in address.
    pub fn from_name(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(&digest[..6]);
        bytes[0] = (bytes[0] & 0xFC) | 0x02;
        let grouped: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
        Self(grouped.join(":"))
    }

    /// The reserved all-zero id the mesh endpoints use for the main router.
    pub fn is_all_zero(&self) -> bool {
        self.0 == "00:00:00:00:00:00"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare 12-hex form used in per-client AJAX URLs.
    pub fn as_hex12(&self) -> String {
        self.0.replace(':', "")
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}
