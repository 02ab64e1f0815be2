use crate::{
    ensure_finite, sampling::sample_without_replacement, Classification, DetectorConfig,
    DetectorState, ObserverSet,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sdo_core::{Result, SdoError};
use tracing::{debug, info};

/// Median of the `k` smallest absolute distances between `point` and `observers`.
///
/// `k` is clamped to the number of observers; `None` when that leaves nothing to
/// score against. The result does not depend on the order of `observers`.
pub fn nearest_median_distance(observers: &[f64], point: f64, k: usize) -> Option<f64> {
    let k = k.min(observers.len());
    if k == 0 {
        return None;
    }

    let mut distances: Vec<f64> = observers.iter().map(|o| (o - point).abs()).collect();
    if k < distances.len() {
        distances.select_nth_unstable_by(k - 1, f64::total_cmp);
    }

    let nearest = &mut distances[..k];
    nearest.sort_unstable_by(f64::total_cmp);

    let mid = k / 2;
    if k % 2 == 0 {
        Some((nearest[mid - 1] + nearest[mid]) / 2.0)
    } else {
        Some(nearest[mid])
    }
}

/// Sparse data observer detector for a scalar stream.
///
/// Holds a bounded set of sampled observers. Points are scored by their distance
/// to the nearest observers, and [`SdoDetector::adapt`] gradually refreshes the
/// set from recent data. Every failing call leaves the observers untouched.
pub struct SdoDetector<R = ChaCha8Rng> {
    config: DetectorConfig,
    observers: ObserverSet,
    state: DetectorState,
    rng: R,
}

impl SdoDetector<ChaCha8Rng> {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(config: DetectorConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_seed(config: DetectorConfig, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(config, seed),
            None => Self::new(config),
        }
    }
}

impl<R: Rng> SdoDetector<R> {
    pub fn with_rng(config: DetectorConfig, rng: R) -> Self {
        Self {
            observers: ObserverSet::new(config.capacity()),
            config,
            state: DetectorState::Uninitialized,
            rng,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == DetectorState::Active
    }

    /// Current observers, oldest first.
    pub fn observers(&self) -> Vec<f64> {
        self.observers.to_vec()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Seeds the observers with `min(window.len(), capacity)` distinct samples.
    ///
    /// Calling it again on an active detector replaces every observer.
    pub fn initialize(&mut self, window: &[f64]) -> Result<()> {
        if window.is_empty() {
            return Err(SdoError::EmptyWindow);
        }
        ensure_finite(window)?;

        let sampled = sample_without_replacement(&mut self.rng, window, self.config.capacity());
        self.observers.replace_all(sampled);
        self.state = DetectorState::Active;

        info!(
            observers = self.observers.len(),
            capacity = self.config.capacity(),
            window = window.len(),
            "Observers initialized"
        );
        Ok(())
    }

    pub fn score(&self, point: f64) -> Result<f64> {
        self.ensure_active()?;
        if !point.is_finite() {
            return Err(SdoError::NonFinite(point));
        }

        nearest_median_distance(
            self.observers.as_slice(),
            point,
            self.config.active_observers(),
        )
        .ok_or(SdoError::InsufficientObservers)
    }

    /// Flags `point` when its score is strictly above the threshold.
    pub fn classify(&self, point: f64) -> Result<Classification> {
        let score = self.score(point)?;
        Ok(Classification {
            score,
            is_anomaly: score > self.config.threshold(),
        })
    }

    /// Replaces up to 20% of the capacity, oldest observers first, with samples of
    /// `recent`. Returns the number of observers inserted.
    pub fn adapt(&mut self, recent: &[f64]) -> Result<usize> {
        self.ensure_active()?;
        if recent.is_empty() {
            return Err(SdoError::EmptyWindow);
        }
        ensure_finite(recent)?;

        let fresh =
            sample_without_replacement(&mut self.rng, recent, self.config.replacement_count());

        let mut evicted = 0;
        for value in &fresh {
            if self.observers.push(*value).is_some() {
                evicted += 1;
            }
        }

        debug!(
            inserted = fresh.len(),
            evicted,
            observers = self.observers.len(),
            "Observers adapted"
        );
        Ok(fresh.len())
    }

    /// Drops every observer and returns to the uninitialized state.
    pub fn reset(&mut self) {
        self.observers.clear();
        self.state = DetectorState::Uninitialized;
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            DetectorState::Active => Ok(()),
            DetectorState::Uninitialized => Err(SdoError::Uninitialized),
        }
    }
}
