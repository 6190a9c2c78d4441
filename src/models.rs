use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

pub const STOCK_NAME_FIELD: &str = "Stock name";
pub const TICKER_FIELD: &str = "Ticker";
pub const CURRENT_PRICE_FIELD: &str = "Current price";

/// One page of the target data source.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: HashMap<String, PropertyValue>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    RichText {
        #[serde(default)]
        rich_text: Vec<TextSpan>,
    },
    Title {
        #[serde(default)]
        title: Vec<TextSpan>,
    },
    Number {
        #[serde(default)]
        number: Option<f64>,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    pub fn rich_text<S: Into<String>>(spans: impl IntoIterator<Item = S>) -> Self {
        PropertyValue::RichText {
            rich_text: spans.into_iter().map(TextSpan::plain).collect(),
        }
    }

    pub fn title<S: Into<String>>(spans: impl IntoIterator<Item = S>) -> Self {
        PropertyValue::Title {
            title: spans.into_iter().map(TextSpan::plain).collect(),
        }
    }

    pub fn rich_text_spans(&self) -> Option<&[TextSpan]> {
        match self {
            PropertyValue::RichText { rich_text } => Some(rich_text),
            _ => None,
        }
    }

    pub fn title_spans(&self) -> Option<&[TextSpan]> {
        match self {
            PropertyValue::Title { title } => Some(title),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number { number } => *number,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextSpan {
    #[serde(default)]
    pub plain_text: String,
}

impl TextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
        }
    }
}

/// Latest daily close for a symbol. Lives for a single iteration only.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    pub close: f64,
    pub as_of: Option<DateTime<Utc>>,
}

// A property whose shape does not match its declared type is kept as
// `Unsupported` so one odd column never fails the whole listing.
fn deserialize_properties<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, PropertyValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let parsed = serde_json::from_value::<PropertyValue>(value)
                .unwrap_or(PropertyValue::Unsupported);
            (name, parsed)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_page_properties_by_type() {
        let page = json!({
            "object": "page",
            "id": "page-1",
            "properties": {
                "Stock name": {
                    "id": "a1",
                    "type": "rich_text",
                    "rich_text": [
                        { "type": "text", "text": { "content": "AAPL" }, "plain_text": "AAPL", "href": null }
                    ]
                },
                "Ticker": {
                    "id": "title",
                    "type": "title",
                    "title": [
                        { "type": "text", "text": { "content": "Apple" }, "plain_text": "Apple" }
                    ]
                },
                "Current price": { "id": "b2", "type": "number", "number": 182.5 },
                "Sector": { "id": "c3", "type": "select", "select": { "name": "Tech" } }
            }
        });

        let record: Record = serde_json::from_value(page).unwrap();
        assert_eq!(record.id, "page-1");
        assert_eq!(
            record.property(STOCK_NAME_FIELD),
            Some(&PropertyValue::rich_text(["AAPL"]))
        );
        assert_eq!(
            record.property(TICKER_FIELD).and_then(PropertyValue::title_spans),
            Some(&[TextSpan::plain("Apple")][..])
        );
        assert_eq!(
            record.property(CURRENT_PRICE_FIELD).and_then(PropertyValue::number),
            Some(182.5)
        );
        assert_eq!(record.property("Sector"), Some(&PropertyValue::Unsupported));
    }

    #[test]
    fn malformed_property_becomes_unsupported() {
        let page = json!({
            "id": "page-2",
            "properties": {
                "Stock name": { "type": "rich_text", "rich_text": "not-a-list" },
                "Ticker": { "type": "title" },
                "Current price": { "type": "number", "number": null },
                "Broken": 42
            }
        });

        let record: Record = serde_json::from_value(page).unwrap();
        assert_eq!(record.property(STOCK_NAME_FIELD), Some(&PropertyValue::Unsupported));
        assert_eq!(
            record
                .property(TICKER_FIELD)
                .and_then(PropertyValue::title_spans)
                .map(<[TextSpan]>::is_empty),
            Some(true)
        );
        assert_eq!(
            record.property(CURRENT_PRICE_FIELD).and_then(PropertyValue::number),
            None
        );
        assert_eq!(record.property("Broken"), Some(&PropertyValue::Unsupported));
    }

    #[test]
    fn missing_properties_is_empty_map() {
        let record: Record = serde_json::from_value(json!({ "id": "page-3" })).unwrap();
        assert!(record.properties.is_empty());

        let record: Record =
            serde_json::from_value(json!({ "id": "page-4", "properties": null })).unwrap();
        assert!(record.properties.is_empty());
    }
}
