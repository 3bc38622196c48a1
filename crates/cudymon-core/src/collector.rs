// ── Poll orchestration ──
//
// Sequences which pages get fetched for one poll tick, gated by the
// feature matrix, and merges the per-page parser outputs into one
// snapshot. Pages are fetched sequentially: the router's embedded web
// server serves one management client, and every fetch shares the one
// authenticated session.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use cudymon_api::{RouterClient, TransportConfig};

use crate::config::RouterConfig;
use crate::error::CoreError;
use crate::features::is_supported;
use crate::mesh::{
    apply_detail, client_ids_in_html, device_from_json, merge_device, parse_clients_json,
    report_from_scan,
};
use crate::model::{Field, FieldMap, MacAddress, MeshDevice, MeshReport, Module, Snapshot};
use crate::pages::data_usage::parse_data_usage;
use crate::pages::devices::{parse_devices, parse_devices_status};
use crate::pages::mesh::{parse_mesh_client_status, parse_mesh_devices};
use crate::pages::modem::parse_modem_info;
use crate::pages::network::{
    has_meaningful_values, parse_dhcp_status, parse_lan_status, parse_vpn_status,
    parse_wan_status, wan_markers_present,
};
use crate::pages::sms::parse_sms_status;
use crate::pages::system::parse_system_status;
use crate::pages::wifi::parse_wifi_status;

/// Host-provided options for one poll.
#[derive(Debug, Clone, Default)]
pub struct PollOptions {
    /// Comma-separated MACs/hostnames to track in full detail.
    pub device_list: Option<String>,
}

/// The router backend: owns the HTTP client and drives poll cycles.
pub struct CudyRouter {
    client: RouterClient,
    poll_timeout: Duration,
}

impl CudyRouter {
    pub fn new(config: &RouterConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let base_url = config.base_url()?;
        let transport = TransportConfig {
            tls: config.tls,
            timeout: config.request_timeout,
        };
        let client = RouterClient::new(
            base_url,
            config.username.clone(),
            config.password.clone(),
            &transport,
        )?;
        Ok(Self {
            client,
            poll_timeout: config.poll_timeout,
        })
    }

    /// The underlying client, for control actions.
    pub fn client(&self) -> &RouterClient {
        &self.client
    }

    /// Establish or refresh the session. See
    /// [`RouterClient::authenticate`] for the error split the host setup
    /// flow relies on.
    pub async fn authenticate(&self) -> Result<(), cudymon_api::Error> {
        self.client.authenticate().await
    }

    /// Best-effort hardware model from the login page banner;
    /// `"default"` when unknown.
    pub async fn get_model(&self) -> String {
        self.client.get_model().await
    }

    /// Run one poll cycle.
    ///
    /// Individual page failures degrade to empty/partial modules inside
    /// an `Ok` snapshot; the only reported error is the overall poll
    /// deadline.
    pub async fn get_data(
        &self,
        options: &PollOptions,
        device_model: &str,
    ) -> Result<Snapshot, CoreError> {
        match tokio::time::timeout(
            self.poll_timeout,
            collect(&self.client, options, device_model),
        )
        .await
        {
            Ok(snapshot) => Ok(snapshot),
            Err(_) => Err(CoreError::Timeout(self.poll_timeout)),
        }
    }
}

/// Fetch and parse every supported module for the given model.
pub async fn collect(
    client: &RouterClient,
    options: &PollOptions,
    device_model: &str,
) -> Snapshot {
    let mut snapshot = Snapshot::default();

    if is_supported(device_model, Module::Modem.as_ref()) {
        let status = client.get_page("admin/network/gcom/status", false).await;
        let detail = client
            .get_page("admin/network/gcom/status?detail=1&iface=4g", false)
            .await;
        snapshot
            .modules
            .insert(Module::Modem, parse_modem_info(&format!("{status}{detail}")));
    }

    if is_supported(device_model, Module::Devices.as_ref()) {
        let devlist_html = client
            .get_page("admin/network/devices/devlist?detail=1", false)
            .await;
        let (mut fields, detailed) =
            parse_devices(&devlist_html, options.device_list.as_deref());

        // Client counts: the status page when it actually mentions
        // clients, with the main panel appended as a fallback source.
        let mut status_html = client
            .get_page("admin/network/devices/status?detail=1", false)
            .await;
        if status_html.is_empty() || !status_html.to_lowercase().contains("client") {
            status_html.push_str(&client.get_page("admin/panel", false).await);
        }
        fields.extend(parse_devices_status(&status_html));

        snapshot.modules.insert(Module::Devices, fields);
        snapshot.detailed_devices = detailed;
    }

    if is_supported(device_model, Module::System.as_ref()) {
        // No single reliable source for firmware/local time: concatenate
        // every candidate endpoint before parsing.
        let status = client.get_page("admin/system/status", false).await;
        let panel = client.get_page("admin/panel", false).await;
        let overview = client.get_page("admin/status/overview", true).await;
        let system_page = client.get_page("admin/system/system", true).await;
        snapshot.modules.insert(
            Module::System,
            parse_system_status(&format!("{status}{panel}{overview}{system_page}")),
        );
    }

    if is_supported(device_model, Module::DataUsage.as_ref()) {
        let html = client
            .get_page("admin/network/gcom/statistics?iface=4g", false)
            .await;
        snapshot
            .modules
            .insert(Module::DataUsage, parse_data_usage(&html));
    }

    if is_supported(device_model, Module::Sms.as_ref()) {
        let html = client.get_page("admin/network/gcom/sms/status", false).await;
        snapshot.modules.insert(Module::Sms, parse_sms_status(&html));
    }

    if is_supported(device_model, Module::Wifi2g.as_ref()) {
        let html = client
            .get_page("admin/network/wireless/status?iface=wlan00", false)
            .await;
        snapshot
            .modules
            .insert(Module::Wifi2g, parse_wifi_status(&html));
    }

    if is_supported(device_model, Module::Wifi5g.as_ref()) {
        let html = client
            .get_page("admin/network/wireless/status?iface=wlan10", false)
            .await;
        snapshot
            .modules
            .insert(Module::Wifi5g, parse_wifi_status(&html));
    }

    if is_supported(device_model, Module::Lan.as_ref()) {
        let html = client.get_page("admin/network/lan/status", false).await;
        snapshot.modules.insert(Module::Lan, parse_lan_status(&html));
    }

    if is_supported(device_model, Module::Vpn.as_ref()) {
        let html = client
            .get_page("admin/network/vpn/openvpns/status?status=", false)
            .await;
        snapshot.modules.insert(Module::Vpn, parse_vpn_status(&html));
    }

    if is_supported(device_model, Module::Wan.as_ref()) {
        // Some models expose a generic/empty WAN page: probe for marker
        // words and real values before accepting the module.
        let html = client
            .get_page("admin/network/wan/status?detail=1&iface=wan", true)
            .await;
        if !html.is_empty() && wan_markers_present(&html) {
            let wan_data = parse_wan_status(&html);
            if has_meaningful_values(&wan_data) {
                snapshot.modules.insert(Module::Wan, wan_data);
            }
        }
    }

    if is_supported(device_model, Module::Dhcp.as_ref()) {
        let html = client
            .get_page("admin/services/dhcp/status?detail=1", false)
            .await;
        snapshot.modules.insert(Module::Dhcp, parse_dhcp_status(&html));
    }

    if is_supported(device_model, Module::Mesh.as_ref()) {
        let report = collect_mesh(client).await;
        let mut fields = FieldMap::new();
        fields.insert(
            "mesh_count".into(),
            Field::of(i64::from(report.satellite_count)),
        );
        snapshot.modules.insert(Module::Mesh, fields);
        snapshot.mesh = Some(report);
    }

    snapshot
}

/// Candidate mesh status endpoints across firmware generations. All are
/// probed silently; responses that never mention mesh concepts are
/// discarded as irrelevant.
const MESH_ENDPOINTS: &[&str] = &[
    "admin/network/mesh/status",
    "admin/network/mesh",
    "admin/network/mesh/topology",
    "admin/network/mesh/nodes",
    "admin/easymesh/status",
    "admin/easymesh",
];

async fn collect_mesh(client: &RouterClient) -> MeshReport {
    let mut mesh_html = String::new();
    for endpoint in MESH_ENDPOINTS {
        let result = client.get_page(endpoint, true).await;
        if result.is_empty() {
            continue;
        }
        let lowered = result.to_lowercase();
        if lowered.contains("mesh") || lowered.contains("node") || lowered.contains("satellite") {
            debug!("found mesh data at {endpoint} ({} bytes)", result.len());
            mesh_html.push_str(&result);
        }
    }

    let scan = parse_mesh_devices(&mesh_html);
    let mut report = report_from_scan(scan);

    // The clients JSON endpoint is the most reliable source when it
    // exists: per-unit hardware, firmware, IP, state, and LED status.
    let clients_body = client
        .get_page("admin/network/mesh/clients?clients=all", true)
        .await;
    let entries = parse_clients_json(&clients_body);

    let mut json_devices: BTreeMap<MacAddress, MeshDevice> = BTreeMap::new();
    for entry in &entries {
        if let Some((mac, device)) = device_from_json(entry) {
            json_devices.insert(mac, device);
        }
    }

    // Every client id referenced anywhere: JSON ids plus tab/link ids
    // embedded in the status HTML, deduplicated on the canonical MAC so
    // mixed-case spellings of one unit are fetched once.
    let mut macs: Vec<MacAddress> = entries
        .iter()
        .filter(|entry| entry.id.len() == 12)
        .map(|entry| MacAddress::new(&entry.id))
        .collect();
    macs.extend(client_ids_in_html(&mesh_html).iter().map(MacAddress::new));
    macs.sort();
    macs.dedup();
    debug!("mesh client macs: {macs:?}");

    for mac in macs {
        // The all-zero id is the main router: lift its LED state for the
        // primary entity and keep it out of the satellite set.
        if mac.is_all_zero() {
            if let Some(main) = json_devices.get(&mac) {
                report.main_router_led_status = main.led_status.clone();
            }
            continue;
        }

        // The per-client AJAX pages address units by bare 12-hex id.
        let hex = mac.as_hex12();

        let from_json = json_devices.contains_key(&mac);
        let mut info = json_devices
            .get(&mac)
            .cloned()
            .unwrap_or_else(|| MeshDevice::placeholder(mac.clone()));

        // Two detail pages per client: status (backhaul, firmware) and
        // the connected-device list (row count).
        let devstatus = client
            .get_page(
                &format!("admin/network/mesh/client/devstatus?embedded=&client={hex}"),
                true,
            )
            .await;
        let devlist = client
            .get_page(
                &format!("admin/network/mesh/client/devlist?embedded=&client={hex}"),
                true,
            )
            .await;
        if !devstatus.is_empty() {
            if let Some(detail) = parse_mesh_client_status(&devstatus, Some(&devlist)) {
                apply_detail(&mut info, &detail, from_json);
            }
        }

        if info.name.as_deref().is_none_or(str::is_empty) {
            info.name = Some(format!("Mesh Device {}", &hex[6..]));
        }
        merge_device(&mut report.devices, info);
    }

    if !report.devices.is_empty() {
        #[allow(clippy::cast_possible_truncation)]
        {
            report.satellite_count = report.devices.len() as u32;
        }
    }
    report
}
