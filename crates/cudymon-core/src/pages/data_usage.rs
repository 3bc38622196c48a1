// Cellular data-usage statistics page parser.

use crate::model::{Field, FieldMap};
use crate::scrape::tables::parse_tables;
use crate::scrape::text::parse_data_size;

pub fn parse_data_usage(input_html: &str) -> FieldMap {
    let raw = parse_tables(input_html);
    let size_of = |label: &str| raw.get(label).and_then(|v| parse_data_size(v));

    let mut data = FieldMap::new();
    data.insert(
        "current_traffic".into(),
        Field::maybe(size_of("Current Traffic:")),
    );
    data.insert(
        "monthly_traffic".into(),
        Field::maybe(size_of("Monthly Traffic:")),
    );
    data.insert(
        "total_traffic".into(),
        Field::maybe(size_of("Total Traffic:")),
    );
    data
}
