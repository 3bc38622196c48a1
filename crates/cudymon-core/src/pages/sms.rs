// SMS status page parser.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::model::{Field, FieldMap};
use crate::scrape::tables::{element_text, parse_tables};
use crate::scrape::text::as_int;

static UNREAD_HEADER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th.text-primary").expect("static selector"));

pub fn parse_sms_status(input_html: &str) -> FieldMap {
    let raw = parse_tables(input_html);

    // The new-message count lives in the page header: a highlighted
    // header cell followed by a sibling cell holding the number.
    let unread = unread_count(input_html).unwrap_or(0);

    let mut data = FieldMap::new();
    data.insert(
        "inbox_count".into(),
        Field::maybe(raw.get("Inbox").and_then(|v| as_int(v))),
    );
    data.insert(
        "outbox_count".into(),
        Field::maybe(raw.get("Outbox").and_then(|v| as_int(v))),
    );
    data.insert("unread_count".into(), Field::of(unread));
    data
}

fn unread_count(input_html: &str) -> Option<i64> {
    let document = Html::parse_document(input_html);
    let header = document.select(&UNREAD_HEADER_SEL).next()?;
    let sibling = header
        .next_siblings()
        .filter_map(scraper::ElementRef::wrap)
        .find(|el| el.value().name() == "th")?;
    as_int(&element_text(sibling))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn parses_counts_and_unread_header() {
        let html = r#"
            <table><tr>
                <th class="text-primary">New Message</th><th>3</th>
            </tr></table>
            <table>
                <tr><th>Inbox</th><td>12</td></tr>
                <tr><th>Outbox</th><td>4</td></tr>
            </table>"#;
        let data = parse_sms_status(html);
        assert_eq!(data["inbox_count"].value, Some(Value::Int(12)));
        assert_eq!(data["outbox_count"].value, Some(Value::Int(4)));
        assert_eq!(data["unread_count"].value, Some(Value::Int(3)));
    }

    #[test]
    fn missing_header_means_zero_unread() {
        let data = parse_sms_status("<table><tr><th>Inbox</th><td>-</td></tr></table>");
        assert_eq!(data["inbox_count"].value, None);
        assert_eq!(data["unread_count"].value, Some(Value::Int(0)));
    }
}
