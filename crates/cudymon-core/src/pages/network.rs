// WAN / LAN / DHCP / VPN status parsers.

use crate::model::{Field, FieldMap};
use crate::scrape::tables::parse_tables;
use crate::scrape::text::{
    clean_text, first_non_empty, get_seconds_duration, split_upload_download,
};

/// Words that mark a WAN status page as genuinely populated. Some models
/// expose a generic, empty WAN page; the collector probes for these
/// before accepting the module.
pub const WAN_MARKERS: &[&str] = &["public ip", "ip address", "gateway", "subnet", "protocol"];

pub fn wan_markers_present(input_html: &str) -> bool {
    let lowered = input_html.to_lowercase();
    WAN_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// True when at least one field carries a real value -- an all-null WAN
/// parse means the page was a stub and the module should be dropped.
pub fn has_meaningful_values(data: &FieldMap) -> bool {
    data.values().any(|field| {
        field
            .value
            .as_ref()
            .is_some_and(|value| value.as_str() != Some(""))
    })
}

pub fn parse_wan_status(input_html: &str) -> FieldMap {
    let raw = parse_tables(input_html);

    let (session_upload, session_download) = split_upload_download(
        first_non_empty(&raw, &["Upload / Download", "Upload/Download", "Upload/Down"])
            .unwrap_or(""),
    );

    let connected_time =
        first_non_empty(&raw, &["Connected Time", "Connect Time", "Connection Time"])
            .and_then(get_seconds_duration);

    let text_field = |aliases: &[&str]| {
        Field::maybe(first_non_empty(&raw, aliases).and_then(clean_text))
    };

    let mut data = FieldMap::new();
    data.insert(
        "protocol".into(),
        text_field(&["Protocol", "Connection Type", "WAN Protocol"]),
    );
    data.insert("connected_time".into(), Field::maybe(connected_time));
    data.insert(
        "mac_address".into(),
        text_field(&["MAC-Address", "MAC Address", "WAN MAC"]),
    );
    data.insert(
        "public_ip".into(),
        text_field(&["Public IP", "Public IPv4", "WAN Public IP"]),
    );
    data.insert("wan_ip".into(), text_field(&["IP Address", "WAN IP", "IP"]));
    data.insert(
        "subnet_mask".into(),
        text_field(&["Subnet Mask", "Subnet", "Netmask", "Mask"]),
    );
    data.insert(
        "gateway".into(),
        text_field(&["Gateway", "Default Gateway"]),
    );
    data.insert(
        "dns".into(),
        text_field(&["DNS", "Preferred DNS", "Primary DNS"]),
    );
    data.insert("session_upload".into(), Field::maybe(session_upload));
    data.insert("session_download".into(), Field::maybe(session_download));
    data
}

pub fn parse_lan_status(input_html: &str) -> FieldMap {
    let raw = parse_tables(input_html);

    let mut data = FieldMap::new();
    data.insert(
        "ip_address".into(),
        Field::maybe(raw.get("IP Address").cloned()),
    );
    data.insert(
        "mac_address".into(),
        Field::maybe(raw.get("MAC-Address").cloned()),
    );
    data
}

pub fn parse_dhcp_status(input_html: &str) -> FieldMap {
    let raw = parse_tables(input_html);

    let text_field = |aliases: &[&str]| {
        Field::maybe(first_non_empty(&raw, aliases).and_then(clean_text))
    };

    let mut data = FieldMap::new();
    data.insert(
        "dhcp_ip_start".into(),
        text_field(&["IP Start", "Start IP"]),
    );
    data.insert("dhcp_ip_end".into(), text_field(&["IP End", "End IP"]));
    data.insert(
        "dhcp_prefered_dns".into(),
        text_field(&["Preferred DNS", "DNS", "Primary DNS"]),
    );
    data.insert(
        "dhcp_default_gateway".into(),
        text_field(&["Default Gateway", "Gateway"]),
    );
    data.insert(
        "dhcp_leasetime".into(),
        text_field(&["Leasetime", "Lease Time"]),
    );
    data
}

pub fn parse_vpn_status(input_html: &str) -> FieldMap {
    let raw = parse_tables(input_html);

    let mut data = FieldMap::new();
    data.insert(
        "protocol".into(),
        Field::maybe(raw.get("Protocol").cloned()),
    );
    data.insert(
        "vpn_clients".into(),
        Field::maybe(raw.get("Devices").cloned()),
    );
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    const WAN_FIXTURE: &str = r#"
        <table>
            <tr><th>Protocol</th><td>DHCP</td></tr>
            <tr><th>Public IP</th><td>*203.0.113.10*</td></tr>
            <tr><th>IP Address</th><td>10.64.0.2</td></tr>
            <tr><th>Subnet Mask</th><td>255.255.255.0</td></tr>
            <tr><th>Gateway</th><td>192.0.2.1</td></tr>
            <tr><th>Upload / Download</th><td>10.00 MB / 200.50 MB</td></tr>
        </table>"#;

    #[test]
    fn wan_fields_cleaned_and_split() {
        let data = parse_wan_status(WAN_FIXTURE);
        assert_eq!(data["protocol"].value, Some(Value::Text("DHCP".into())));
        // Decoration asterisks are stripped from the public IP.
        assert_eq!(
            data["public_ip"].value,
            Some(Value::Text("203.0.113.10".into()))
        );
        assert_eq!(data["gateway"].value, Some(Value::Text("192.0.2.1".into())));
        assert_eq!(data["session_upload"].value, Some(Value::Float(10.0)));
        assert_eq!(data["session_download"].value, Some(Value::Float(200.5)));
    }

    #[test]
    fn wan_placeholder_values_dropped() {
        let html = "<table><tr><th>Public IP</th><td>-</td></tr></table>";
        let data = parse_wan_status(html);
        assert_eq!(data["public_ip"].value, None);
        assert!(!has_meaningful_values(&data));
    }

    #[test]
    fn wan_marker_probe() {
        assert!(wan_markers_present(WAN_FIXTURE));
        assert!(!wan_markers_present("<html><body>Status</body></html>"));
    }

    #[test]
    fn lan_fields() {
        let html = r#"
            <table>
                <tr><th>IP Address</th><td>192.168.10.1</td></tr>
                <tr><th>MAC-Address</th><td>AA:BB:CC:00:11:22</td></tr>
            </table>"#;
        let data = parse_lan_status(html);
        assert_eq!(
            data["ip_address"].value,
            Some(Value::Text("192.168.10.1".into()))
        );
        assert_eq!(
            data["mac_address"].value,
            Some(Value::Text("AA:BB:CC:00:11:22".into()))
        );
    }

    #[test]
    fn dhcp_alias_fallbacks() {
        let html = r#"
            <table>
                <tr><th>Start IP</th><td>192.168.10.100</td></tr>
                <tr><th>End IP</th><td>192.168.10.200</td></tr>
                <tr><th>Lease Time</th><td>12h</td></tr>
            </table>"#;
        let data = parse_dhcp_status(html);
        assert_eq!(
            data["dhcp_ip_start"].value,
            Some(Value::Text("192.168.10.100".into()))
        );
        assert_eq!(
            data["dhcp_ip_end"].value,
            Some(Value::Text("192.168.10.200".into()))
        );
        assert_eq!(
            data["dhcp_leasetime"].value,
            Some(Value::Text("12h".into()))
        );
    }

    #[test]
    fn vpn_fields() {
        let html = r#"
            <table>
                <tr><th>Protocol</th><td>OpenVPN</td></tr>
                <tr><th>Devices</th><td>2</td></tr>
            </table>"#;
        let data = parse_vpn_status(html);
        assert_eq!(data["protocol"].value, Some(Value::Text("OpenVPN".into())));
        assert_eq!(data["vpn_clients"].value, Some(Value::Text("2".into())));
    }
}
