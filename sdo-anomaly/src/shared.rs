use crate::{Classification, DetectorConfig, DetectorState, SdoDetector};
use parking_lot::RwLock;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use sdo_core::Result;
use std::sync::Arc;

/// Cloneable handle for classifying from several tasks while one writer adapts.
///
/// Scoring takes the read lock, initialization and adaptation the write lock, so a
/// reader always sees the most recently adapted observers. Never hold the guard
/// across an `.await`.
pub struct SharedDetector<R = ChaCha8Rng> {
    inner: Arc<RwLock<SdoDetector<R>>>,
}

impl<R> Clone for SharedDetector<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Rng> SharedDetector<R> {
    pub fn new(detector: SdoDetector<R>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(detector)),
        }
    }

    pub fn config(&self) -> DetectorConfig {
        *self.inner.read().config()
    }

    pub fn state(&self) -> DetectorState {
        self.inner.read().state()
    }

    pub fn initialize(&self, window: &[f64]) -> Result<()> {
        self.inner.write().initialize(window)
    }

    pub fn score(&self, point: f64) -> Result<f64> {
        self.inner.read().score(point)
    }

    pub fn classify(&self, point: f64) -> Result<Classification> {
        self.inner.read().classify(point)
    }

    pub fn adapt(&self, recent: &[f64]) -> Result<usize> {
        self.inner.write().adapt(recent)
    }

    /// Copy of the current observers, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        self.inner.read().observers()
    }

    pub fn reset(&self) {
        self.inner.write().reset()
    }
}

impl<R: Rng> From<SdoDetector<R>> for SharedDetector<R> {
    fn from(detector: SdoDetector<R>) -> Self {
        Self::new(detector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdo_core::SdoError;
    use std::thread;

    fn shared() -> SharedDetector {
        let config = DetectorConfig::new(10, 3, 2.0).unwrap();
        SdoDetector::with_seed(config, 3).into()
    }

    #[test]
    fn test_clones_share_state() {
        let detector = shared();
        let other = detector.clone();
        assert!(matches!(other.classify(1.0), Err(SdoError::Uninitialized)));

        detector.initialize(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(other.state(), DetectorState::Active);
        assert_eq!(other.score(2.0).unwrap(), 1.0);
    }

    #[test]
    fn test_reader_sees_latest_adaptation() {
        let detector = shared();
        let window: Vec<f64> = (0..10).map(f64::from).collect();
        detector.initialize(&window).unwrap();

        let reader = detector.clone();
        detector.adapt(&[50.0, 50.0]).unwrap();

        let snapshot = reader.snapshot();
        assert_eq!(snapshot.len(), 10);
        assert_eq!(&snapshot[8..], &[50.0, 50.0]);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let detector = shared();
        let window: Vec<f64> = (0..10).map(f64::from).collect();
        detector.initialize(&window).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let reader = detector.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        let result = reader.classify(i as f64 % 20.0).unwrap();
                        assert!(result.score >= 0.0);
                    }
                })
            })
            .collect();

        for round in 0..50 {
            let recent: Vec<f64> = (0..10).map(|i| (round * 10 + i) as f64).collect();
            detector.adapt(&recent).unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(detector.snapshot().len(), 10);
    }
}
