use crate::models::{PriceQuote, Record};
use anyhow::Result;

/// Remote collection of records that carry a price field.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn list_records(&self) -> Result<Vec<Record>>;
    async fn update_record_price(&self, record_id: &str, price: f64) -> Result<()>;
}

/// Market data source for daily closes.
#[allow(async_fn_in_trait)]
pub trait QuoteSource {
    /// `Ok(None)` when the provider has no recent history for `symbol`.
    async fn fetch_latest_close(&self, symbol: &str) -> Result<Option<PriceQuote>>;
}
