// System status parser.
//
// No single firmware build exposes version/uptime/time on one reliable
// page, so the collector concatenates up to four candidate endpoints
// before calling this. The firmware label itself has been seen under a
// dozen spellings, with a scripted/attribute fallback for builds that
// only mention it inline.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::model::{Field, FieldMap};
use crate::scrape::tables::parse_tables;
use crate::scrape::text::{first_match, first_non_empty, get_seconds_duration};

const FIRMWARE_ALIASES: &[&str] = &[
    "Firmware Version",
    "Firmware",
    "Software Version",
    "Version",
    "FW Version",
    "Firmware Ver",
    "Firmware Ver.",
    "System Version",
    "Router Firmware",
    "Current Version",
    "SW Version",
    "Build Version",
    "Release",
];

const LOCAL_TIME_ALIASES: &[&str] = &[
    "Local Time",
    "System Time",
    "Time",
    "Current Time",
    "Router Time",
];

fn regex_ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static pattern")
}

static FIRMWARE_FALLBACKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // JS variable or data attribute.
        r#"["']?(?:firmware|fw|version)["']?\s*[=:]\s*["']([\d.]+[^"']*)["'\s,]"#,
        r#"data-firmware=["']([^"']*)["'\s]"#,
        // A bare version number sitting in an element.
        r">\s*([vV]?\d+\.\d+\.\d+[^<]*)\s*<",
        r"Firmware[:\s]+([vV]?\d+\.\d+\.\d+[^\s<]*)",
        // Header-styled status table variant.
        r"Firmware Version</th><th[^>]*>([^<]+)<",
    ]
    .iter()
    .map(|pattern| regex_ci(pattern))
    .collect()
});

pub fn parse_system_status(input_html: &str) -> FieldMap {
    let raw = parse_tables(input_html);

    let uptime = first_non_empty(&raw, &["Uptime", "System Uptime"])
        .and_then(get_seconds_duration);

    let mut firmware = first_non_empty(&raw, FIRMWARE_ALIASES).map(str::to_owned);
    if firmware.is_none() && !input_html.is_empty() {
        let fallbacks: Vec<&Regex> = FIRMWARE_FALLBACKS.iter().collect();
        firmware = first_match(input_html, &fallbacks);
    }

    let local_time = first_non_empty(&raw, LOCAL_TIME_ALIASES).map(str::to_owned);

    let mut data = FieldMap::new();
    data.insert("uptime".into(), Field::maybe(uptime));
    data.insert("local_time".into(), Field::maybe(local_time));
    data.insert("firmware_version".into(), Field::maybe(firmware));
    data
}
