use crate::models::PriceQuote;
use crate::providers::QuoteSource;
use crate::symbols::round_price;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Daily chart endpoint, asked for a single one-day period.
pub struct YahooClient<'a> {
    http: &'a Client,
    base_url: String,
}

impl<'a> YahooClient<'a> {
    pub fn new(http: &'a Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chart(&self, symbol: &str) -> Result<Option<ChartResponse>> {
        let url = chart_url(&self.base_url, symbol)?;
        let path = url.path().to_string();
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT))
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;

        // Unknown symbols come back as 404 with a chart error body.
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Yahoo has no chart for {}", symbol);
            return Ok(None);
        }

        let response = response
            .error_for_status()
            .with_context(|| format!("GET {} returned error", path))?;
        let chart = response
            .json::<ChartResponse>()
            .await
            .context("failed to parse Yahoo chart response")?;
        Ok(Some(chart))
    }
}

impl QuoteSource for YahooClient<'_> {
    async fn fetch_latest_close(&self, symbol: &str) -> Result<Option<PriceQuote>> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(anyhow!("cannot query an empty symbol"));
        }
        let Some(chart) = self.fetch_chart(symbol).await? else {
            return Ok(None);
        };
        latest_close(symbol, chart)
    }
}

// Each piece is pushed as its own path segment, so `/`, `?` and `#` in a
// symbol are percent-encoded instead of reshaping the request.
fn chart_url(base_url: &str, symbol: &str) -> Result<Url> {
    let mut url =
        Url::parse(base_url).with_context(|| format!("invalid Yahoo base URL {}", base_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Yahoo base URL {} cannot carry a path", base_url))?
        .pop_if_empty()
        .extend(["v8", "finance", "chart", symbol]);
    Ok(url)
}

fn latest_close(symbol: &str, response: ChartResponse) -> Result<Option<PriceQuote>> {
    if let Some(error) = response.chart.error {
        let description = error.description.unwrap_or_default();
        return Err(anyhow!(
            "Yahoo chart error for {}: {} {}",
            symbol,
            error.code.unwrap_or_default(),
            description
        ));
    }

    let Some(result) = response.chart.result.into_iter().flatten().next() else {
        return Ok(None);
    };
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    // Rows with a null close are dropped, so the last row with a value is the latest close.
    let latest = closes.iter().enumerate().rev().find_map(|(index, close)| {
        (*close)
            .filter(|value| value.is_finite())
            .map(|value| (index, value))
    });

    Ok(latest.map(|(index, close)| PriceQuote {
        symbol: symbol.to_string(),
        close: round_price(close),
        as_of: result
            .timestamp
            .get(index)
            .and_then(|seconds| parse_timestamp(*seconds)),
    }))
}

fn parse_timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ChartResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn chart_url_encodes_symbol_as_one_segment() {
        let plain = chart_url("https://query1.finance.yahoo.com", "AAPL").unwrap();
        assert_eq!(
            plain.as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/AAPL"
        );

        let awkward = chart_url("http://127.0.0.1:4000", "BRK/B?x#y").unwrap();
        assert_eq!(awkward.path(), "/v8/finance/chart/BRK%2FB%3Fx%23y");
        assert_eq!(awkward.query(), None);
        assert_eq!(awkward.fragment(), None);

        let dotted = chart_url("http://127.0.0.1:4000/", "2330.TW").unwrap();
        assert_eq!(dotted.path(), "/v8/finance/chart/2330.TW");

        assert!(chart_url("not a url", "AAPL").is_err());
    }

    #[test]
    fn takes_last_close_rounded() {
        let chart = parse(
            r#"{"chart":{"result":[{
                "meta":{"symbol":"AAPL","currency":"USD"},
                "timestamp":[1760448600],
                "indicators":{"quote":[{"open":[121.0],"close":[123.456],"volume":[1000]}]}
            }],"error":null}}"#,
        );
        let quote = latest_close("AAPL", chart).unwrap().unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.close, 123.46);
        assert_eq!(quote.as_of, Utc.timestamp_opt(1760448600, 0).single());
    }

    #[test]
    fn skips_trailing_null_closes() {
        let chart = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1,2,3],
                "indicators":{"quote":[{"close":[10.0,150.004,null]}]}
            }],"error":null}}"#,
        );
        let quote = latest_close("AAPL", chart).unwrap().unwrap();
        assert_eq!(quote.close, 150.0);
        assert_eq!(quote.as_of, Utc.timestamp_opt(2, 0).single());
    }

    #[test]
    fn empty_history_is_none() {
        let no_rows = parse(
            r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#,
        );
        assert_eq!(latest_close("MSFT", no_rows).unwrap(), None);

        let all_null = parse(
            r#"{"chart":{"result":[{"timestamp":[1],"indicators":{"quote":[{"close":[null]}]}}],"error":null}}"#,
        );
        assert_eq!(latest_close("MSFT", all_null).unwrap(), None);

        let no_result = parse(r#"{"chart":{"result":null,"error":null}}"#);
        assert_eq!(latest_close("MSFT", no_result).unwrap(), None);

        let empty_result = parse(r#"{"chart":{"result":[]}}"#);
        assert_eq!(latest_close("MSFT", empty_result).unwrap(), None);
    }

    #[test]
    fn chart_error_is_surfaced() {
        let chart = parse(
            r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid range"}}}"#,
        );
        let err = latest_close("AAPL", chart).unwrap_err();
        assert!(err.to_string().contains("Invalid range"));
    }
}
