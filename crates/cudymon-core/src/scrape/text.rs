// ── Text and unit normalizers ──
//
// Every function here is total over arbitrary strings: empty input,
// the `"-"` placeholder, and garbage all come back as `None` (or a
// documented fallback), never a panic. The firmware's pages are too
// inconsistent for anything stricter.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{Days, Months, TimeDelta, Utc};
use regex::{Regex, RegexBuilder};

fn regex_ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static pattern")
}

// ── Ordered-lookup combinators ──────────────────────────────────────

/// First non-empty value among the alias labels, probed in order.
///
/// Every logical field appears under several observed label spellings
/// across firmware builds; alias lists are empirical and preserved
/// verbatim.
pub fn first_non_empty<'a>(data: &'a HashMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|key| data.get(*key).map(String::as_str).filter(|v| !v.is_empty()))
}

/// First capture group of the first pattern that matches, probed in order.
pub fn first_match(text: &str, patterns: &[&Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_owned())
    })
}

// ── Numeric parses ──────────────────────────────────────────────────

/// Tolerant integer parse; `"-"` and friends come back as `None`.
pub fn as_int(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Tolerant hexadecimal parse (cell IDs are hex on the modem page).
pub fn hex_as_int(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    i64::from_str_radix(digits, 16).ok()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Transfer speed ──────────────────────────────────────────────────

/// Parse a transfer-speed string to megabits per second.
///
/// Suffix-driven; an unrecognized suffix reads as zero traffic rather
/// than `None` -- a quirk of the observed firmware kept for parity.
pub fn parse_speed(input: &str) -> Option<f64> {
    if input.is_empty() {
        return None;
    }
    let lower = input.to_lowercase();
    let number = || {
        input
            .split(' ')
            .next()
            .and_then(|token| token.parse::<f64>().ok())
    };

    if lower.ends_with(" kbps") {
        return number().map(|v| round2(v / 1024.0));
    }
    if lower.ends_with(" mbps") {
        return number();
    }
    if lower.ends_with(" gbps") {
        return number().map(|v| v * 1024.0);
    }
    if lower.ends_with(" bps") {
        return number().map(|v| round2(v / 1024.0 / 1024.0));
    }
    Some(0.0)
}

// ── Data size ───────────────────────────────────────────────────────

static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| regex_ci(r"^([\d.]+)\s*(KB|MB|GB|TB|B)"));

/// Parse a data-size string like `"219.49 GB"` to megabytes.
pub fn parse_data_size(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let caps = SIZE_RE.captures(trimmed)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_uppercase();
    Some(match unit.as_str() {
        "B" => value / 1024.0 / 1024.0,
        "KB" => value / 1024.0,
        "GB" => value * 1024.0,
        "TB" => value * 1024.0 * 1024.0,
        _ => value, // MB
    })
}

/// Split a combined `"<upload> / <download>"` session counter.
pub fn split_upload_download(input: &str) -> (Option<f64>, Option<f64>) {
    match input.split_once(" / ") {
        Some((up, down)) => (parse_data_size(up.trim()), parse_data_size(down.trim())),
        None => (None, None),
    }
}

// ── Durations ───────────────────────────────────────────────────────

/// Parse an uptime/connected-time string to seconds.
///
/// Accepts a trailing `HH:MM:SS` token and preceding `<n> year/month/
/// week/day` pairs. Month and year lengths are not fixed, so the
/// calendar-relative part is resolved by walking back from "now" and
/// measuring the gap -- not by multiplying day counts.
pub fn get_seconds_duration(input: &str) -> Option<f64> {
    let lowered = input.to_lowercase();
    let parts: Vec<&str> = lowered.split_whitespace().collect();
    if parts.is_empty() {
        return None;
    }

    let mut months: u32 = 0;
    let mut days: u64 = 0;
    let mut clock_seconds: i64 = 0;

    for (i, part) in parts.iter().enumerate() {
        if part.matches(':').count() == 2 {
            let mut fields = part.split(':');
            let hours = fields.next().and_then(as_int).unwrap_or(0);
            let minutes = fields.next().and_then(as_int).unwrap_or(0);
            let seconds = fields.next().and_then(as_int).unwrap_or(0);
            clock_seconds += hours * 3600 + minutes * 60 + seconds;
        } else if i == 0 {
            // A leading count has no suffix yet; it is consumed when its
            // unit token shows up.
        } else if part.starts_with("year") {
            months += preceding_count(&parts, i) * 12;
        } else if part.starts_with("month") {
            months += preceding_count(&parts, i);
        } else if part.starts_with("week") {
            days += u64::from(preceding_count(&parts, i)) * 7;
        } else if part.starts_with("day") {
            days += u64::from(preceding_count(&parts, i));
        }
    }

    let now = Utc::now();
    let mut then = now;
    if months > 0 {
        then = then.checked_sub_months(Months::new(months))?;
    }
    if days > 0 {
        then = then.checked_sub_days(Days::new(days))?;
    }
    then = then.checked_sub_signed(TimeDelta::seconds(clock_seconds))?;

    #[allow(clippy::cast_precision_loss)]
    Some((now - then).num_milliseconds() as f64 / 1000.0)
}

fn preceding_count(parts: &[&str], i: usize) -> u32 {
    i.checked_sub(1)
        .and_then(|prev| parts.get(prev))
        .and_then(|token| token.parse().ok())
        .unwrap_or(0)
}

// ── Bands ───────────────────────────────────────────────────────────

static BAND_SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| regex_ci(r"BAND\s*(\d+)\s*/\s*\d+\s*MHz"));
static BAND_BARE_RE: LazyLock<Regex> = LazyLock::new(|| regex_ci(r"^[Bn](\d+)$"));
static BAND_WORDED_RE: LazyLock<Regex> =
    LazyLock::new(|| regex_ci(r"(?:LTE|NR|5G)?\s*Band\s*(\d+)"));

/// Canonicalize a band descriptor to a `B<n>` token.
///
/// Tries, in order: `"BAND n / m MHz"`, bare `"Bn"`/`"nN"`,
/// `"LTE/NR/5G Band n"`, and finally bare digits. First match wins.
pub fn get_band(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(band) = first_match(
        trimmed,
        &[&BAND_SLASH_RE, &BAND_BARE_RE, &BAND_WORDED_RE].map(LazyLock::force),
    ) {
        return Some(format!("B{band}"));
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("B{trimmed}"));
    }
    None
}

// ── Text cleanup ────────────────────────────────────────────────────

/// Normalize a plain-text value: strip decoration asterisks, drop
/// dash/n-a style placeholders entirely.
pub fn clean_text(input: &str) -> Option<String> {
    let cleaned = input.replace('*', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    if matches!(
        cleaned.to_lowercase().as_str(),
        "-" | "--" | "n/a" | "na" | "unknown"
    ) {
        return None;
    }
    Some(cleaned.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn speed_unit_conversions() {
        assert_eq!(parse_speed("512 Kbps"), Some(0.5));
        assert_eq!(parse_speed("12.5 Mbps"), Some(12.5));
        assert_eq!(parse_speed("1 Gbps"), Some(1024.0));
        assert_eq!(parse_speed("1048576 bps"), Some(1.0));
    }

    #[test]
    fn speed_unknown_suffix_reads_zero() {
        assert_eq!(parse_speed("12 parsecs"), Some(0.0));
        assert_eq!(parse_speed("-"), Some(0.0));
    }

    #[test]
    fn speed_totality() {
        assert_eq!(parse_speed(""), None);
        assert_eq!(parse_speed("fast kbps"), None);
    }

    #[test]
    fn data_size_conversions() {
        assert_eq!(parse_data_size("1 GB"), Some(1024.0));
        assert_eq!(parse_data_size("219.49 GB"), Some(224_757.76));
        assert_eq!(parse_data_size("512 KB"), Some(0.5));
        assert_eq!(parse_data_size("368.07 MB"), Some(368.07));
        assert_eq!(parse_data_size("2 TB"), Some(2_097_152.0));
    }

    #[test]
    fn data_size_totality() {
        assert_eq!(parse_data_size(""), None);
        assert_eq!(parse_data_size("-"), None);
        assert_eq!(parse_data_size("lots"), None);
    }

    #[test]
    fn upload_download_split() {
        assert_eq!(
            split_upload_download("51.60 MB / 368.07 MB"),
            (Some(51.6), Some(368.07))
        );
        assert_eq!(split_upload_download("51.60 MB"), (None, None));
    }

    #[test]
    fn duration_clock_only() {
        assert_eq!(get_seconds_duration("01:02:03"), Some(3723.0));
    }

    #[test]
    fn duration_with_days() {
        assert_eq!(get_seconds_duration("1 day 01:00:00"), Some(90000.0));
        assert_eq!(get_seconds_duration("2 Days 00:00:10"), Some(172_810.0));
    }

    #[test]
    fn duration_with_weeks() {
        assert_eq!(get_seconds_duration("1 week 00:00:00"), Some(604_800.0));
    }

    #[test]
    fn duration_totality() {
        assert_eq!(get_seconds_duration(""), None);
        // Unrecognized tokens accumulate nothing; the gap is zero.
        assert_eq!(get_seconds_duration("garbage"), Some(0.0));
    }

    #[test]
    fn band_patterns_in_order() {
        assert_eq!(get_band("BAND 3 / 20 MHz").as_deref(), Some("B3"));
        assert_eq!(get_band("BAND3 / 20MHz").as_deref(), Some("B3"));
        assert_eq!(get_band("B7").as_deref(), Some("B7"));
        assert_eq!(get_band("n78").as_deref(), Some("B78"));
        assert_eq!(get_band("LTE Band 3").as_deref(), Some("B3"));
        assert_eq!(get_band("NR Band 78").as_deref(), Some("B78"));
        assert_eq!(get_band("28").as_deref(), Some("B28"));
        assert_eq!(get_band("garbage"), None);
        assert_eq!(get_band(""), None);
    }

    #[test]
    fn int_parses_tolerate_placeholders() {
        assert_eq!(as_int("42"), Some(42));
        assert_eq!(as_int(" -13 "), Some(-13));
        assert_eq!(as_int("-"), None);
        assert_eq!(as_int(""), None);
        assert_eq!(hex_as_int("1A2B3C"), Some(0x1A2B3C));
        assert_eq!(hex_as_int("0x1f"), Some(31));
        assert_eq!(hex_as_int("-"), None);
    }

    #[test]
    fn alias_lookup_takes_first_hit() {
        let data = map(&[("Firmware", ""), ("Software Version", "2.1.8")]);
        assert_eq!(
            first_non_empty(&data, &["Firmware Version", "Firmware", "Software Version"]),
            Some("2.1.8")
        );
        assert_eq!(first_non_empty(&data, &["Release"]), None);
    }

    #[test]
    fn clean_text_strips_placeholders() {
        assert_eq!(clean_text("*203.0.113.10*").as_deref(), Some("203.0.113.10"));
        assert_eq!(clean_text("  DHCP "), Some("DHCP".to_owned()));
        assert_eq!(clean_text("-"), None);
        assert_eq!(clean_text("N/A"), None);
        assert_eq!(clean_text("unknown"), None);
        assert_eq!(clean_text(""), None);
    }
}
