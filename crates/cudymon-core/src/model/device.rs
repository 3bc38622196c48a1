// Connected-client record.
//
// Ephemeral: rebuilt from the devices page on every poll, no identity
// carried across polls.

use serde::{Deserialize, Serialize};

/// One client currently attached to the router.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Device {
    pub hostname: Option<String>,
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub up_speed_mbps: Option<f64>,
    pub down_speed_mbps: Option<f64>,
}
