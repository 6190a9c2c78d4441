use crate::config::DEFAULT_REQUEST_DELAY;
use crate::context::AppContext;
use crate::models::{PriceQuote, Record};
use crate::providers::{QuoteSource, RecordStore};
use crate::symbols::resolve_symbol;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Pause after each record that reached the market data provider.
    pub request_delay: Duration,
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            request_delay: DEFAULT_REQUEST_DELAY,
            dry_run: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub total: usize,
    pub updated: usize,
    pub skipped_no_symbol: usize,
    pub skipped_no_quote: usize,
    pub failed: usize,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} record(s): {} updated, {} without symbol, {} without price data, {} failed",
            self.total, self.updated, self.skipped_no_symbol, self.skipped_no_quote, self.failed
        )
    }
}

#[derive(Debug, Error)]
pub enum RecordFailure {
    #[error("price lookup for {symbol} failed: {source:#}")]
    Quote {
        symbol: String,
        source: anyhow::Error,
    },
    #[error("writing price for record {record_id} failed: {source:#}")]
    Update {
        record_id: String,
        source: anyhow::Error,
    },
}

enum RecordOutcome {
    Updated(PriceQuote),
    NoQuote,
}

pub async fn run(app: &AppContext, options: SyncOptions) -> Result<SyncSummary> {
    let notion = app.notion()?;
    let yahoo = app.yahoo();
    info!(
        "Reading records from data source {}{}",
        notion.data_source_id(),
        if options.dry_run { " (dry run)" } else { "" }
    );
    sync_records(&notion, &yahoo, options).await
}

/// Lists every record once, then refreshes prices one record at a time.
///
/// A listing failure aborts the run. Anything that goes wrong for a single
/// record is logged and counted, and the loop moves on.
pub async fn sync_records<S, Q>(store: &S, quotes: &Q, options: SyncOptions) -> Result<SyncSummary>
where
    S: RecordStore,
    Q: QuoteSource,
{
    let records = store
        .list_records()
        .await
        .context("failed to list records")?;
    let mut summary = SyncSummary {
        total: records.len(),
        ..SyncSummary::default()
    };
    if records.is_empty() {
        info!("No records to sync");
        return Ok(summary);
    }
    info!("Syncing prices for {} record(s)", records.len());

    let last_index = records.len() - 1;
    for (index, record) in records.iter().enumerate() {
        let Some(symbol) = resolve_symbol(record) else {
            warn!("Skipping record {}: no ticker symbol", record.id);
            summary.skipped_no_symbol += 1;
            continue;
        };

        info!("Querying {} for record {}", symbol, record.id);
        match sync_record(store, quotes, record, &symbol, options.dry_run).await {
            Ok(RecordOutcome::Updated(quote)) => {
                let as_of = close_date_suffix(&quote);
                if options.dry_run {
                    info!("Would update {} to {}{}", symbol, quote.close, as_of);
                } else {
                    info!("Updated {} to {}{}", symbol, quote.close, as_of);
                }
                summary.updated += 1;
            }
            Ok(RecordOutcome::NoQuote) => {
                warn!("No price data for {}", symbol);
                summary.skipped_no_quote += 1;
            }
            Err(failure) => {
                warn!("{}", failure);
                summary.failed += 1;
            }
        }

        if index < last_index && !options.request_delay.is_zero() {
            sleep(options.request_delay).await;
        }
    }

    info!("Sync finished: {}", summary);
    Ok(summary)
}

fn close_date_suffix(quote: &PriceQuote) -> String {
    quote
        .as_of
        .map(|date| format!(" (close of {})", date.format("%Y-%m-%d")))
        .unwrap_or_default()
}

async fn sync_record<S, Q>(
    store: &S,
    quotes: &Q,
    record: &Record,
    symbol: &str,
    dry_run: bool,
) -> Result<RecordOutcome, RecordFailure>
where
    S: RecordStore,
    Q: QuoteSource,
{
    let quote = quotes
        .fetch_latest_close(symbol)
        .await
        .map_err(|source| RecordFailure::Quote {
            symbol: symbol.to_string(),
            source,
        })?;
    let Some(quote) = quote else {
        return Ok(RecordOutcome::NoQuote);
    };

    if !dry_run {
        store
            .update_record_price(&record.id, quote.close)
            .await
            .map_err(|source| RecordFailure::Update {
                record_id: record.id.clone(),
                source,
            })?;
    }
    Ok(RecordOutcome::Updated(quote))
}
