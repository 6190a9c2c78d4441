use crate::context::AppContext;
use crate::models::{PropertyValue, CURRENT_PRICE_FIELD};
use crate::providers::RecordStore;
use crate::symbols::resolve_symbol;
use anyhow::{Context, Result};
use log::info;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRow {
    pub record_id: String,
    pub symbol: Option<String>,
    pub current_price: Option<f64>,
}

pub async fn run(app: &AppContext) -> Result<Vec<SymbolRow>> {
    let notion = app.notion()?;
    info!(
        "Resolving symbols for data source {}",
        notion.data_source_id()
    );
    let rows = collect_symbols(&notion).await?;

    for row in &rows {
        let price = row
            .current_price
            .map(|price| price.to_string())
            .unwrap_or_else(|| "-".to_string());
        match row.symbol.as_deref() {
            Some(symbol) => info!("{}  {}  current price {}", row.record_id, symbol, price),
            None => info!("{}  (no symbol)", row.record_id),
        }
    }
    let resolved = rows.iter().filter(|row| row.symbol.is_some()).count();
    info!("{} of {} record(s) have a ticker symbol", resolved, rows.len());

    Ok(rows)
}

pub async fn collect_symbols<S: RecordStore>(store: &S) -> Result<Vec<SymbolRow>> {
    let records = store
        .list_records()
        .await
        .context("failed to list records")?;
    Ok(records
        .iter()
        .map(|record| SymbolRow {
            record_id: record.id.clone(),
            symbol: resolve_symbol(record),
            current_price: record
                .property(CURRENT_PRICE_FIELD)
                .and_then(PropertyValue::number),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Record, STOCK_NAME_FIELD, TICKER_FIELD};
    use anyhow::anyhow;

    struct StaticStore(Vec<Record>);

    impl RecordStore for StaticStore {
        async fn list_records(&self) -> Result<Vec<Record>> {
            Ok(self.0.clone())
        }

        async fn update_record_price(&self, _record_id: &str, _price: f64) -> Result<()> {
            Err(anyhow!("listing symbols must not write"))
        }
    }

    #[tokio::test]
    async fn rows_follow_listing_order() {
        let store = StaticStore(vec![
            Record::new("a")
                .with_property(STOCK_NAME_FIELD, PropertyValue::rich_text(["AAPL"]))
                .with_property(CURRENT_PRICE_FIELD, PropertyValue::Number { number: Some(150.0) }),
            Record::new("b"),
            Record::new("c").with_property(TICKER_FIELD, PropertyValue::title(["MSFT"])),
        ]);

        let rows = collect_symbols(&store).await.unwrap();

        assert_eq!(
            rows,
            vec![
                SymbolRow {
                    record_id: "a".to_string(),
                    symbol: Some("AAPL".to_string()),
                    current_price: Some(150.0),
                },
                SymbolRow {
                    record_id: "b".to_string(),
                    symbol: None,
                    current_price: None,
                },
                SymbolRow {
                    record_id: "c".to_string(),
                    symbol: Some("MSFT".to_string()),
                    current_price: None,
                },
            ]
        );
    }
}
