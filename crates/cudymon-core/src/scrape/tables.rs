// ── Generic label/value extraction ──
//
// At least three incompatible page-template generations are in the
// wild. Rows are probed with a cascade of structural patterns and the
// first one producing two cell-like values wins; pages that use
// div-grids instead of tables get a second pass. Unrecognized layouts
// degrade to fewer pairs, never to an error.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static TR_SEL: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static TD_MOBILE_P_SEL: LazyLock<Selector> = LazyLock::new(|| selector("td p.visible-xs"));
static TD_SEL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static TH_SEL: LazyLock<Selector> = LazyLock::new(|| selector("th"));
static P_SEL: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static SPAN_SEL: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static DIV_SEL: LazyLock<Selector> = LazyLock::new(|| selector("div"));

static ROWISH_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| class_re("row|item|info"));
static LABELISH_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| class_re("label|key|name|title"));
static VALUEISH_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| class_re("value|data|content"));

fn class_re(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static pattern")
}

/// All descendant text, concatenated and trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Descendant text with each piece trimmed and newline-joined -- keeps
/// line structure for the regex extractors that scan panel text.
pub(crate) fn element_text_lines(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Record `value` under `key`, disambiguating colliding labels with an
/// incrementing numeric suffix (`"SCC"`, `"SCC2"`, …) instead of
/// overwriting. A previously recorded empty value may be overwritten --
/// it was a label-only marker row.
pub(crate) fn add_unique(data: &mut HashMap<String, String>, key: &str, value: &str) {
    let mut unique_key = key.to_owned();
    let mut i = 1;
    while data.get(&unique_key).is_some_and(|existing| !existing.is_empty()) {
        i += 1;
        unique_key = format!("{key}{i}");
    }
    data.insert(unique_key, value.to_owned());
}

/// Extract label→value pairs from every table (and div-grid) in the
/// document.
///
/// Per row, the first pattern yielding at least two cell-like values
/// wins:
/// 1. nested mobile-view paragraphs (`td p.visible-xs`),
/// 2. direct `td` cells, preferring a nested `p`/`span`'s text,
/// 3. a `th`/`td` label/value pair.
///
/// Rows yielding exactly one value are still recorded with an empty
/// value -- some layouts split label and value across adjacent rows, and
/// dropping label-only rows would silently lose fields.
pub fn parse_tables(input_html: &str) -> HashMap<String, String> {
    let mut data = HashMap::new();
    if input_html.is_empty() {
        return data;
    }
    let document = Html::parse_document(input_html);

    for table in document.select(&TABLE_SEL) {
        for row in table.select(&TR_SEL) {
            let row_data = extract_row(row);
            match row_data.len() {
                0 => {}
                1 => add_unique(&mut data, &row_data[0], ""),
                _ => add_unique(&mut data, &row_data[0], &row_data[1].replace('\n', "")),
            }
        }
    }

    // Second pass: div-grid layouts (class-hinted containers with
    // class-hinted label/value children).
    for div in document.select(&DIV_SEL) {
        let Some(class) = div.value().attr("class") else {
            continue;
        };
        if !ROWISH_CLASS_RE.is_match(class) {
            continue;
        }
        let label = find_by_class(div, &LABELISH_CLASS_RE).map(element_text);
        let value = find_by_class(div, &VALUEISH_CLASS_RE).map(element_text);
        if let (Some(label), Some(value)) = (label, value) {
            if !label.is_empty() && !data.contains_key(&label) {
                add_unique(&mut data, &label, &value.replace('\n', ""));
            }
        }
    }

    data
}

fn extract_row(row: ElementRef<'_>) -> Vec<String> {
    // Pattern 1: mobile-view paragraphs.
    let mut row_data: Vec<String> = row
        .select(&TD_MOBILE_P_SEL)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    // Pattern 2: direct cells, nested p/span preferred over the cell's
    // own text when both exist.
    if row_data.len() < 2 {
        row_data = row
            .select(&TD_SEL)
            .map(|td| {
                td.select(&P_SEL)
                    .next()
                    .or_else(|| td.select(&SPAN_SEL).next())
                    .map_or_else(|| element_text(td), element_text)
            })
            .filter(|text| !text.is_empty())
            .collect();
    }

    // Pattern 3: th/td label/value pair.
    if row_data.len() < 2 {
        if let (Some(th), Some(td)) = (row.select(&TH_SEL).next(), row.select(&TD_SEL).next()) {
            let label = element_text(th);
            if !label.is_empty() {
                row_data = vec![label, element_text(td)];
            }
        }
    }

    row_data
}

/// First descendant element (any tag) whose class attribute matches.
fn find_by_class<'a>(root: ElementRef<'a>, class_pattern: &Regex) -> Option<ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.id() != root.id())
        .find(|el| {
            el.value()
                .attr("class")
                .is_some_and(|class| class_pattern.is_match(class))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_paragraph_pattern() {
        let html = r#"
            <table><tr>
                <td><p class="visible-xs">SSID</p></td>
                <td><p class="visible-xs">HomeNet</p></td>
            </tr></table>"#;
        let data = parse_tables(html);
        assert_eq!(data.get("SSID").map(String::as_str), Some("HomeNet"));
    }

    #[test]
    fn direct_cell_pattern_prefers_nested_text() {
        let html = r#"
            <table><tr>
                <td>Channel</td>
                <td><span>36</span> ignored</td>
            </tr></table>"#;
        let data = parse_tables(html);
        assert_eq!(data.get("Channel").map(String::as_str), Some("36"));
    }

    #[test]
    fn th_td_pair_pattern() {
        // No visible-xs paragraphs and no div layout -- only the
        // th/td convention.
        let html = r#"
            <table>
                <tr><th>Public IP</th><td>203.0.113.10</td></tr>
                <tr><th>Protocol</th><td>DHCP</td></tr>
            </table>"#;
        let data = parse_tables(html);
        assert_eq!(data.get("Public IP").map(String::as_str), Some("203.0.113.10"));
        assert_eq!(data.get("Protocol").map(String::as_str), Some("DHCP"));
    }

    #[test]
    fn label_only_row_is_kept() {
        let html = "<table><tr><td>Connected Devices</td></tr></table>";
        let data = parse_tables(html);
        assert_eq!(data.get("Connected Devices").map(String::as_str), Some(""));
    }

    #[test]
    fn duplicate_labels_get_numeric_suffixes() {
        let html = r#"
            <table>
                <tr><th>SCC</th><td>B1</td></tr>
                <tr><th>SCC</th><td>B3</td></tr>
                <tr><th>SCC</th><td>B7</td></tr>
            </table>"#;
        let data = parse_tables(html);
        assert_eq!(data.get("SCC").map(String::as_str), Some("B1"));
        assert_eq!(data.get("SCC2").map(String::as_str), Some("B3"));
        assert_eq!(data.get("SCC3").map(String::as_str), Some("B7"));
    }

    #[test]
    fn div_grid_fallback() {
        let html = r#"
            <div class="info-row">
                <div class="label">Uptime</div>
                <div class="value">01:02:03</div>
            </div>"#;
        let data = parse_tables(html);
        assert_eq!(data.get("Uptime").map(String::as_str), Some("01:02:03"));
    }

    #[test]
    fn parsing_is_idempotent() {
        let html = r#"
            <table><tr><th>RSSI</th><td>22</td></tr></table>
            <div class="item"><span class="key">Mode</span><span class="data">TDD</span></div>"#;
        assert_eq!(parse_tables(html), parse_tables(html));
    }

    #[test]
    fn garbage_degrades_to_empty() {
        assert!(parse_tables("").is_empty());
        assert!(parse_tables("not html at all").is_empty());
        assert!(parse_tables("<table><tr></tr></table>").is_empty());
    }
}
