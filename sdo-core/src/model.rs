use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of the input stream, e.g. a daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: Option<DateTime<Utc>>,
    pub value: f64,
}

impl PricePoint {
    pub fn new(value: f64) -> Self {
        Self {
            timestamp: None,
            value,
        }
    }

    pub fn at(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            value,
        }
    }
}

pub fn values(points: &[PricePoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}
