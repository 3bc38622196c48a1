// WiFi status page parser (shared by the 2.4G and 5G interfaces).

use crate::model::{Field, FieldMap};
use crate::scrape::tables::parse_tables;
use crate::scrape::text::as_int;

pub fn parse_wifi_status(input_html: &str) -> FieldMap {
    let raw = parse_tables(input_html);

    // The radio state never appears as a labeled field -- the page header
    // simply says "Enabled" when the radio is up.
    let enabled = input_html.contains("Enabled");

    let mut data = FieldMap::new();
    data.insert("ssid".into(), Field::maybe(raw.get("SSID").cloned()));
    data.insert(
        "channel".into(),
        Field::maybe(raw.get("Channel").and_then(|v| as_int(v))),
    );
    data.insert("enabled".into(), Field::of(enabled));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn parses_ssid_and_channel() {
        let html = r#"
            <h3>WiFi Enabled</h3>
            <table>
                <tr><th>SSID</th><td>HomeNet-5G</td></tr>
                <tr><th>Channel</th><td>36</td></tr>
            </table>"#;
        let data = parse_wifi_status(html);
        assert_eq!(
            data["ssid"].value,
            Some(Value::Text("HomeNet-5G".into()))
        );
        assert_eq!(data["channel"].value, Some(Value::Int(36)));
        assert_eq!(data["enabled"].value, Some(Value::Bool(true)));
    }

    #[test]
    fn disabled_radio_with_no_table() {
        let data = parse_wifi_status("<h3>WiFi Disabled</h3>");
        assert_eq!(data["ssid"].value, None);
        assert_eq!(data["channel"].value, None);
        assert_eq!(data["enabled"].value, Some(Value::Bool(false)));
    }
}
