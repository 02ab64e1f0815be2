pub mod detector;
pub mod observer;
pub mod sampling;
pub mod shared;

pub use detector::{nearest_median_distance, SdoDetector};
pub use observer::ObserverSet;
pub use shared::SharedDetector;

use chrono::{DateTime, Utc};
use sdo_core::{DetectorSettings, Result, SdoError};
use serde::{Deserialize, Serialize};

/// Share of the capacity refreshed per adaptation is `1 / REPLACEMENT_DIVISOR` (20%).
pub const REPLACEMENT_DIVISOR: usize = 5;

/// Detector parameters. Validated on construction and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectorConfig {
    capacity: usize,
    active_observers: usize,
    threshold: f64,
}

impl DetectorConfig {
    pub fn new(capacity: usize, active_observers: usize, threshold: f64) -> Result<Self> {
        if capacity == 0 {
            return Err(SdoError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }

        if active_observers == 0 || active_observers > capacity {
            return Err(SdoError::InvalidConfig(format!(
                "active observers must be within 1..={}, got {}",
                capacity, active_observers
            )));
        }

        if !threshold.is_finite() || threshold < 0.0 {
            return Err(SdoError::InvalidConfig(format!(
                "threshold must be a finite non-negative number, got {}",
                threshold
            )));
        }

        Ok(Self {
            capacity,
            active_observers,
            threshold,
        })
    }

    pub fn from_settings(settings: &DetectorSettings) -> Result<Self> {
        Self::new(
            settings.capacity,
            settings.active_observers,
            settings.threshold,
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_observers(&self) -> usize {
        self.active_observers
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Observers replaced per adaptation: `floor(0.2 * capacity)`.
    pub fn replacement_count(&self) -> usize {
        self.capacity / REPLACEMENT_DIVISOR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorState {
    Uninitialized,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub score: f64,
    pub is_anomaly: bool,
}

/// A flagged point as recorded by a stream driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub id: uuid::Uuid,
    pub index: usize,
    pub timestamp: Option<DateTime<Utc>>,
    pub value: f64,
    pub score: f64,
    pub threshold: f64,
    pub description: String,
}

impl AnomalyRecord {
    pub fn new(
        index: usize,
        timestamp: Option<DateTime<Utc>>,
        value: f64,
        classification: Classification,
        threshold: f64,
    ) -> Self {
        let description = format!(
            "Outlier at point {}: value {:.4} scored {:.4} against threshold {:.4}",
            index, value, classification.score, threshold
        );

        Self {
            id: uuid::Uuid::new_v4(),
            index,
            timestamp,
            value,
            score: classification.score,
            threshold,
            description,
        }
    }
}

pub(crate) fn ensure_finite(values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(SdoError::NonFinite(*v)),
        None => Ok(()),
    }
}
