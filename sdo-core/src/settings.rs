use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorSettings,
    pub stream: StreamSettings,
    pub source: SourceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Total number of observers kept (N).
    pub capacity: usize,
    /// Nearest observers used per score (k).
    pub active_observers: usize,
    pub threshold: f64,
    /// Fixed seed for reproducible sampling; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            capacity: 50,
            active_observers: 5,
            threshold: 25.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub warmup_window: usize,
    pub stream_length: usize,
    pub adapt_every: usize,
    pub adapt_window: usize,
    pub report_every: usize,
    pub delay_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            warmup_window: 200,
            stream_length: 1000,
            adapt_every: 500,
            adapt_window: 200,
            report_every: 100,
            delay_ms: 10,
        }
    }
}

impl StreamSettings {
    pub fn required_points(&self) -> usize {
        self.warmup_window + self.stream_length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Yahoo,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub ticker: String,
    pub range: String,
    pub interval: String,
    pub path: Option<PathBuf>,
    pub column: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::Yahoo,
            ticker: "AAPL".to_string(),
            range: "5y".to_string(),
            interval: "1d".to_string(),
            path: None,
            column: "close".to_string(),
        }
    }
}
