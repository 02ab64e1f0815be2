use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sdo_core::{PricePoint, Result, SdoError, SourceKind, SourceSettings};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Provider of a historical price series, oldest point first.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<PricePoint>>;
    fn name(&self) -> String;
}

pub fn source_from_settings(settings: &SourceSettings) -> Result<Box<dyn PriceSource>> {
    match settings.kind {
        SourceKind::Yahoo => Ok(Box::new(YahooSource::new(
            settings.ticker.clone(),
            settings.range.clone(),
            settings.interval.clone(),
        ))),
        SourceKind::Csv => {
            let path = settings.path.clone().ok_or_else(|| {
                SdoError::Configuration("csv source requires a path".to_string())
            })?;
            Ok(Box::new(CsvSource::new(path, settings.column.clone())))
        }
    }
}

/// Daily closes from the Yahoo Finance chart endpoint.
pub struct YahooSource {
    client: reqwest::Client,
    base_url: String,
    ticker: String,
    range: String,
    interval: String,
}

impl YahooSource {
    pub fn new(ticker: String, range: String, interval: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: YAHOO_CHART_URL.to_string(),
            ticker,
            range,
            interval,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/{}?range={}&interval={}",
            self.base_url, self.ticker, self.range, self.interval
        )
    }
}

#[async_trait]
impl PriceSource for YahooSource {
    async fn fetch(&self) -> Result<Vec<PricePoint>> {
        let url = self.url();
        info!("Fetching {} prices from {}", self.ticker, url);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SdoError::Data(format!(
                "Yahoo Finance returned {} for ticker '{}'",
                response.status(),
                self.ticker
            )));
        }

        let json: serde_json::Value = response.json().await?;
        let points = parse_chart(&json)?;

        if points.is_empty() {
            return Err(SdoError::Data(format!(
                "No data found for ticker '{}'",
                self.ticker
            )));
        }

        info!("Fetched {} closes for {}", points.len(), self.ticker);
        Ok(points)
    }

    fn name(&self) -> String {
        format!("yahoo:{}", self.ticker)
    }
}

/// Extracts `(timestamp, close)` pairs from a chart response, skipping null closes.
pub fn parse_chart(json: &serde_json::Value) -> Result<Vec<PricePoint>> {
    if let Some(error) = json["chart"]["error"].as_object() {
        let description = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown error");
        return Err(SdoError::Data(format!("Yahoo Finance error: {}", description)));
    }

    let chart = &json["chart"]["result"][0];
    let timestamps = chart["timestamp"]
        .as_array()
        .ok_or_else(|| SdoError::Data("No timestamps in response".to_string()))?;
    let closes = chart["indicators"]["quote"][0]["close"]
        .as_array()
        .ok_or_else(|| SdoError::Data("No close prices in response".to_string()))?;

    let mut points: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let value = close.as_f64()?;
            let timestamp = ts.as_i64().and_then(|ts| DateTime::from_timestamp(ts, 0));
            Some(PricePoint { timestamp, value })
        })
        .collect();

    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

/// Prices from a CSV file with a header row, e.g. a Yahoo Finance export.
pub struct CsvSource {
    path: PathBuf,
    column: String,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>, column: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            column: column.into(),
        }
    }
}

#[async_trait]
impl PriceSource for CsvSource {
    async fn fetch(&self) -> Result<Vec<PricePoint>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let points = parse_csv(bytes.as_slice(), &self.column)?;

        if points.is_empty() {
            return Err(SdoError::Data(format!(
                "No prices in {}",
                self.path.display()
            )));
        }

        info!("Loaded {} prices from {}", points.len(), self.path.display());
        Ok(points)
    }

    fn name(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

/// Reads the `column` values (case-insensitive header match) from CSV data.
///
/// A lone column is used whatever its name. Empty and `null` cells are skipped.
/// When every row carries a `date`/`timestamp` the result is sorted by it.
pub fn parse_csv<R: std::io::Read>(reader: R, column: &str) -> Result<Vec<PricePoint>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let value_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .or(if headers.len() == 1 { Some(0) } else { None })
        .ok_or_else(|| SdoError::Data(format!("CSV has no '{}' column", column)))?;
    let time_idx = headers.iter().position(|h| {
        ["date", "timestamp", "datetime", "time"]
            .iter()
            .any(|name| h.eq_ignore_ascii_case(name))
    });

    let mut points = Vec::new();
    let mut skipped = 0;
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let cell = record.get(value_idx).unwrap_or("");
        if cell.is_empty() || cell.eq_ignore_ascii_case("null") {
            skipped += 1;
            continue;
        }

        let value: f64 = cell.parse().map_err(|_| {
            SdoError::Data(format!("Invalid price '{}' on data row {}", cell, row + 1))
        })?;
        let timestamp = time_idx
            .and_then(|idx| record.get(idx))
            .and_then(parse_timestamp);

        points.push(PricePoint { timestamp, value });
    }

    if skipped > 0 {
        warn!("Skipped {} rows without a price", skipped);
    }

    if points.iter().all(|p| p.timestamp.is_some()) {
        points.sort_by_key(|p| p.timestamp);
    }
    Ok(points)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chart_skips_null_closes() {
        let body = json!({
            "chart": {
                "result": [{
                    "timestamp": [1700000000, 1700086400, 1700172800],
                    "indicators": { "quote": [{ "close": [189.5, null, 190.25] }] }
                }],
                "error": null
            }
        });

        let points = parse_chart(&body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 189.5);
        assert_eq!(points[1].value, 190.25);
        assert!(points[0].timestamp < points[1].timestamp);
    }

    #[test]
    fn test_parse_chart_error() {
        let body = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        let err = parse_chart(&body).unwrap_err();
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn test_parse_csv_yahoo_export() {
        let data = "Date,Open,High,Low,Close,Adj Close,Volume\n\
                    2024-01-03,184.2,185.8,183.4,184.25,183.9,58414500\n\
                    2024-01-02,187.1,188.4,183.8,185.64,185.2,82488700\n\
                    2024-01-04,182.1,183.0,180.8,null,null,71983600\n";

        let points = parse_csv(data.as_bytes(), "close").unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 185.64);
        assert_eq!(points[1].value, 184.25);
    }

    #[test]
    fn test_parse_csv_single_column() {
        let points = parse_csv("price\n1.5\n2.5\n".as_bytes(), "close").unwrap();
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.5, 2.5]);
        assert!(points[0].timestamp.is_none());
    }

    #[test]
    fn test_parse_csv_bad_value() {
        let err = parse_csv("close\n1.0\nabc\n".as_bytes(), "close").unwrap_err();
        assert!(matches!(err, SdoError::Data(_)));
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let err = parse_csv("open,high\n1,2\n".as_bytes(), "close").unwrap_err();
        assert!(err.to_string().contains("'close'"));
    }

    #[test]
    fn test_source_from_settings_requires_csv_path() {
        let settings = SourceSettings {
            kind: SourceKind::Csv,
            ..SourceSettings::default()
        };
        assert!(matches!(
            source_from_settings(&settings),
            Err(SdoError::Configuration(_))
        ));

        let yahoo = source_from_settings(&SourceSettings::default()).unwrap();
        assert_eq!(yahoo.name(), "yahoo:AAPL");
    }

    #[tokio::test]
    async fn test_csv_source_reads_file() {
        let path = std::env::temp_dir().join(format!("sdo-feed-{}.csv", std::process::id()));
        std::fs::write(&path, "timestamp,close\n1700000000,10.0\n1700086400,11.0\n").unwrap();

        let source = CsvSource::new(&path, "close");
        let points = source.fetch().await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.timestamp.is_some()));
    }
}
