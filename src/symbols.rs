use crate::models::{PropertyValue, Record, TextSpan, STOCK_NAME_FIELD, TICKER_FIELD};

/// Ticker symbol for a record: `Stock name` first, `Ticker` second.
///
/// The first non-empty span list wins. A blank first span yields `None`
/// without falling through to the next field.
pub fn resolve_symbol(record: &Record) -> Option<String> {
    let stock_name = record
        .property(STOCK_NAME_FIELD)
        .and_then(PropertyValue::rich_text_spans);
    let spans = non_empty(stock_name).or_else(|| {
        non_empty(record.property(TICKER_FIELD).and_then(PropertyValue::title_spans))
    })?;

    spans
        .first()
        .map(|span| span.plain_text.as_str())
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn non_empty(spans: Option<&[TextSpan]>) -> Option<&[TextSpan]> {
    spans.filter(|spans| !spans.is_empty())
}

/// Rounds a price to two decimal places.
///
/// Works on the exact binary value with ties to even, so `0.125` becomes
/// `0.12` and `2.675` (stored just below the tie) becomes `2.67`.
pub fn round_price(value: f64) -> f64 {
    format!("{:.2}", value).parse::<f64>().unwrap_or(value)
}
