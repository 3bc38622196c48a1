// Cellular modem status parser.
//
// The page mixes labeled rows with facts that only exist in markup: the
// active SIM slot is the class name of an icon, and carrier-aggregation
// components may arrive either as one combined "PCC" label or as
// discrete band/bandwidth labels that have to be reassembled before
// band extraction.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::model::{Field, FieldMap, Value};
use crate::scrape::tables::parse_tables;
use crate::scrape::text::{
    as_int, first_non_empty, get_band, get_seconds_duration, hex_as_int, split_upload_download,
};

/// Sentinel for facts the page knows nothing about, as opposed to a
/// known zero.
const UNAVAILABLE: &str = "unavailable";

static SIM_ICON_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"i.icon[class*="sim"]"#).expect("static selector"));

pub fn parse_modem_info(input_html: &str) -> FieldMap {
    let raw = parse_tables(input_html);

    let cellid = first_non_empty(&raw, &["Cell ID", "CellID"]).and_then(hex_as_int);

    // Carrier aggregation: prefer the combined PCC label; otherwise
    // rebuild it from discrete band/bandwidth labels so the band
    // canonicalizer sees the shape it knows.
    let band_value = first_non_empty(&raw, &["Band", "Current Band", "LTE Band", "Active Band"]);
    let dl_bandwidth = first_non_empty(&raw, &["DL Bandwidth", "Bandwidth", "DL BW"]);
    let pcc: Option<String> = raw
        .get("PCC")
        .filter(|v| !v.is_empty())
        .cloned()
        .or_else(|| match (band_value, dl_bandwidth) {
            (Some(band), Some(bandwidth)) => Some(format!("BAND {band} / {bandwidth}")),
            (Some(band), None) => Some(band.to_owned()),
            _ => None,
        });
    let scc1 = first_non_empty(&raw, &["SCC", "SCC1"]);
    let scc2 = raw.get("SCC2").map(String::as_str);
    let scc3 = raw.get("SCC3").map(String::as_str);
    let scc4 = raw.get("SCC4").map(String::as_str);

    let pcc_band = pcc.as_deref().and_then(get_band);
    let scc1_band = scc1.and_then(get_band);
    let scc2_band = scc2.and_then(get_band);
    let scc3_band = scc3.and_then(get_band);
    let scc4_band = scc4.and_then(get_band);

    let visible_band = {
        let components: Vec<&str> = [&pcc_band, &scc1_band, &scc2_band, &scc3_band]
            .iter()
            .filter_map(|c| c.as_deref())
            .collect();
        if components.is_empty() {
            None
        } else {
            Some(components.join("+"))
        }
    };

    let (session_upload, session_download) = split_upload_download(
        first_non_empty(&raw, &["Upload / Download", "Upload/Download"]).unwrap_or(""),
    );

    let rssi = raw.get("RSSI").and_then(|v| as_int(v));

    let network = raw
        .get("Network Type")
        .map(|v| v.replace(" ...", ""))
        .filter(|v| !v.is_empty());

    let mut data = FieldMap::new();
    data.insert(
        "network".into(),
        Field::maybe(network)
            .with_attr("mcc", raw.get("MCC").cloned())
            .with_attr("mnc", raw.get("MNC").cloned()),
    );
    data.insert(
        "connected_time".into(),
        Field::maybe(raw.get("Connected Time").and_then(|v| get_seconds_duration(v))),
    );
    data.insert(
        "signal".into(),
        Field::of(match signal_bars(rssi) {
            Some(bars) => Value::Int(bars),
            None => Value::Text(UNAVAILABLE.into()),
        }),
    );
    data.insert("rssi".into(), Field::maybe(rssi));
    data.insert(
        "rsrp".into(),
        Field::maybe(raw.get("RSRP").and_then(|v| as_int(v))),
    );
    data.insert(
        "rsrq".into(),
        Field::maybe(raw.get("RSRQ").and_then(|v| as_int(v))),
    );
    data.insert(
        "sinr".into(),
        Field::maybe(raw.get("SINR").and_then(|v| as_int(v))),
    );
    data.insert(
        "sim".into(),
        Field::of(Value::Text(
            sim_slot(input_html).unwrap_or_else(|| UNAVAILABLE.into()),
        )),
    );
    data.insert(
        "band".into(),
        Field::maybe(visible_band)
            .with_attr("pcc", pcc_band)
            .with_attr("scc1", scc1_band)
            .with_attr("scc2", scc2_band)
            .with_attr("scc3", scc3_band)
            .with_attr("scc4", scc4_band),
    );
    data.insert(
        "cell".into(),
        Field::maybe(raw.get("Cell ID").cloned())
            .with_attr("id", cellid)
            .with_attr("enb", cellid.filter(|c| *c != 0).map(|c| c / 256))
            .with_attr("sector", cellid.filter(|c| *c != 0).map(|c| c % 256))
            .with_attr("pcid", raw.get("PCID").and_then(|v| as_int(v))),
    );
    data.insert(
        "public_ip".into(),
        Field::maybe(raw.get("Public IP").cloned()),
    );
    data.insert(
        "wan_ip".into(),
        Field::maybe(
            raw.get("IP Address")
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty()),
        ),
    );
    data.insert("imsi".into(), Field::maybe(raw.get("IMSI").cloned()));
    data.insert("imei".into(), Field::maybe(raw.get("IMEI").cloned()));
    data.insert("iccid".into(), Field::maybe(raw.get("ICCID").cloned()));
    data.insert(
        "mode".into(),
        Field::maybe(
            raw.get("Mode")
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty()),
        ),
    );
    data.insert(
        "bandwidth".into(),
        Field::maybe(raw.get("DL Bandwidth").cloned()),
    );
    data.insert("session_upload".into(), Field::maybe(session_upload));
    data.insert("session_download".into(), Field::maybe(session_download));
    data
}

/// Bucket RSSI into 0–4 signal bars. Zero/absent RSSI means the modem
/// reported nothing -- callers show the unavailable sentinel instead.
fn signal_bars(rssi: Option<i64>) -> Option<i64> {
    let rssi = rssi.filter(|v| *v != 0)?;
    Some(match rssi {
        v if v > 20 => 4,
        v if v > 15 => 3,
        v if v > 10 => 2,
        v if v > 5 => 1,
        _ => 0,
    })
}

/// The active SIM slot is encoded in an icon's class list, not a row.
fn sim_slot(input_html: &str) -> Option<String> {
    let document = Html::parse_document(input_html);
    let icon = document.select(&SIM_ICON_SEL).next()?;
    let class = icon.value().classes().find(|c| c.contains("sim"))?;
    if class.contains("sim1") {
        Some("Sim 1".into())
    } else if class.contains("sim2") {
        Some("Sim 2".into())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEM_FIXTURE: &str = r#"
        <i class="icon icon-sim1"></i>
        <table>
            <tr><th>Network Type</th><td>5G-SA ...</td></tr>
            <tr><th>RSSI</th><td>22</td></tr>
            <tr><th>RSRP</th><td>-89</td></tr>
            <tr><th>Cell ID</th><td>1A2B3C</td></tr>
            <tr><th>PCID</th><td>101</td></tr>
            <tr><th>Band</th><td>78</td></tr>
            <tr><th>DL Bandwidth</th><td>100 MHz</td></tr>
            <tr><th>SCC</th><td>n41</td></tr>
            <tr><th>Connected Time</th><td>03:01:16</td></tr>
            <tr><th>Upload / Download</th><td>51.60 MB / 368.07 MB</td></tr>
            <tr><th>Public IP</th><td>198.51.100.20</td></tr>
        </table>"#;

    #[test]
    fn assembles_band_from_discrete_labels() {
        let data = parse_modem_info(MODEM_FIXTURE);
        // "78" + "100 MHz" → "BAND 78 / 100 MHz" → B78, plus SCC n41.
        assert_eq!(data["band"].value, Some(Value::Text("B78+B41".into())));
        assert_eq!(
            data["band"].attributes["pcc"],
            Some(Value::Text("B78".into()))
        );
        assert_eq!(
            data["band"].attributes["scc1"],
            Some(Value::Text("B41".into()))
        );
        assert_eq!(data["band"].attributes["scc4"], None);
    }

    #[test]
    fn cell_id_is_hex_with_derived_enb_and_sector() {
        let data = parse_modem_info(MODEM_FIXTURE);
        let cell = &data["cell"];
        assert_eq!(cell.value, Some(Value::Text("1A2B3C".into())));
        assert_eq!(cell.attributes["id"], Some(Value::Int(0x1A2B3C)));
        assert_eq!(cell.attributes["enb"], Some(Value::Int(0x1A2B3C / 256)));
        assert_eq!(cell.attributes["sector"], Some(Value::Int(0x1A2B3C % 256)));
        assert_eq!(cell.attributes["pcid"], Some(Value::Int(101)));
    }

    #[test]
    fn signal_and_sim_and_network() {
        let data = parse_modem_info(MODEM_FIXTURE);
        assert_eq!(data["signal"].value, Some(Value::Int(4)));
        assert_eq!(data["rssi"].value, Some(Value::Int(22)));
        assert_eq!(data["rsrp"].value, Some(Value::Int(-89)));
        assert_eq!(data["sim"].value, Some(Value::Text("Sim 1".into())));
        // Trailing ellipsis is stripped off the network type.
        assert_eq!(data["network"].value, Some(Value::Text("5G-SA".into())));
    }

    #[test]
    fn session_totals_split_from_combined_field() {
        let data = parse_modem_info(MODEM_FIXTURE);
        assert_eq!(data["session_upload"].value, Some(Value::Float(51.6)));
        assert_eq!(data["session_download"].value, Some(Value::Float(368.07)));
    }

    #[test]
    fn absent_rssi_reads_unavailable_not_null() {
        let data = parse_modem_info("<table><tr><th>Mode</th><td>TDD</td></tr></table>");
        assert_eq!(
            data["signal"].value,
            Some(Value::Text("unavailable".into()))
        );
        assert_eq!(data["rssi"].value, None);
        assert_eq!(data["sim"].value, Some(Value::Text("unavailable".into())));
    }

    #[test]
    fn signal_buckets() {
        assert_eq!(signal_bars(Some(25)), Some(4));
        assert_eq!(signal_bars(Some(18)), Some(3));
        assert_eq!(signal_bars(Some(12)), Some(2));
        assert_eq!(signal_bars(Some(7)), Some(1));
        assert_eq!(signal_bars(Some(3)), Some(0));
        assert_eq!(signal_bars(Some(0)), None);
        assert_eq!(signal_bars(None), None);
    }

    #[test]
    fn empty_page_degrades_to_nulls() {
        let data = parse_modem_info("");
        assert_eq!(data["band"].value, None);
        assert_eq!(data["cell"].value, None);
        assert_eq!(data["session_upload"].value, None);
    }
}
