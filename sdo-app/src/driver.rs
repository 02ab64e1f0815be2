use futures::{Stream, StreamExt};
use sdo_anomaly::{AnomalyRecord, SharedDetector};
use sdo_core::{model, PricePoint, Result, SdoError, StreamSettings};
use sdo_feed::PriceStream;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Feeds a price stream through the detector and owns the adaptation cadence.
pub struct StreamDriver {
    detector: SharedDetector,
    settings: StreamSettings,
    history: VecDeque<f64>,
    scores: Vec<f64>,
    anomalies: Vec<AnomalyRecord>,
    processed: usize,
    adaptations: usize,
    skipped_adaptations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamSummary {
    pub points: usize,
    pub anomalies: Vec<AnomalyRecord>,
    pub adaptations: usize,
    pub skipped_adaptations: usize,
    pub threshold: f64,
    pub score_mean: Option<f64>,
    pub score_std_dev: Option<f64>,
    pub score_max: Option<f64>,
    pub observers: Vec<f64>,
}

impl StreamDriver {
    pub fn new(detector: SharedDetector, settings: StreamSettings) -> Self {
        Self {
            detector,
            history: VecDeque::with_capacity(settings.adapt_window),
            settings,
            scores: Vec::new(),
            anomalies: Vec::new(),
            processed: 0,
            adaptations: 0,
            skipped_adaptations: 0,
        }
    }

    pub fn ensure_enough_data(&self, available: usize) -> Result<()> {
        let required = self.settings.required_points();
        if available < required {
            return Err(SdoError::Data(format!(
                "Not enough data points ({}) for a stream of {} with a warm-up window of {}",
                available, self.settings.stream_length, self.settings.warmup_window
            )));
        }
        Ok(())
    }

    /// Seeds the detector from the head of `stream`.
    pub fn warm_up(&mut self, stream: &mut PriceStream) -> Result<()> {
        let warmup = stream.take_warmup(self.settings.warmup_window);
        self.detector.initialize(&model::values(&warmup))?;
        info!(points = warmup.len(), "Detector warmed up");
        Ok(())
    }

    /// Classifies one point, returning its record when it is flagged.
    pub fn process(&mut self, point: PricePoint) -> Result<Option<AnomalyRecord>> {
        let classification = self.detector.classify(point.value)?;
        self.processed += 1;
        let idx = self.processed;

        if self.history.len() >= self.settings.adapt_window {
            self.history.pop_front();
        }
        self.history.push_back(point.value);
        self.scores.push(classification.score);

        debug!(
            index = idx,
            value = point.value,
            score = classification.score,
            "Point scored"
        );

        let record = if classification.is_anomaly {
            let record = AnomalyRecord::new(
                idx - 1,
                point.timestamp,
                point.value,
                classification,
                self.detector.config().threshold(),
            );
            self.anomalies.push(record.clone());
            Some(record)
        } else {
            None
        };

        if idx % self.settings.adapt_every == 0 {
            self.adapt()?;
        }

        if idx % self.settings.report_every == 0 {
            info!(
                points = idx,
                anomalies = self.anomalies.len(),
                "Stream progress"
            );
        }

        Ok(record)
    }

    /// Processes at most `stream_length` points from `points`.
    pub async fn run<S, F>(&mut self, points: S, mut on_anomaly: F) -> Result<()>
    where
        S: Stream<Item = PricePoint> + Unpin,
        F: FnMut(&AnomalyRecord),
    {
        let limit = self.settings.stream_length.saturating_sub(self.processed);
        let mut points = points.take(limit);

        while let Some(point) = points.next().await {
            if let Some(record) = self.process(point)? {
                on_anomaly(&record);
            }
        }

        info!(
            points = self.processed,
            anomalies = self.anomalies.len(),
            "Data stream completed"
        );
        Ok(())
    }

    pub fn summary(&self) -> StreamSummary {
        let (score_mean, score_std_dev, score_max) = if self.scores.is_empty() {
            (None, None, None)
        } else {
            let std_dev = self.scores.iter().std_dev();
            (
                Some(self.scores.iter().mean()),
                (!std_dev.is_nan()).then_some(std_dev),
                Some(Statistics::max(self.scores.iter())),
            )
        };

        StreamSummary {
            points: self.processed,
            anomalies: self.anomalies.clone(),
            adaptations: self.adaptations,
            skipped_adaptations: self.skipped_adaptations,
            threshold: self.detector.config().threshold(),
            score_mean,
            score_std_dev,
            score_max,
            observers: self.detector.snapshot(),
        }
    }

    fn adapt(&mut self) -> Result<()> {
        if self.history.len() < self.settings.adapt_window {
            self.skipped_adaptations += 1;
            warn!(
                available = self.history.len(),
                required = self.settings.adapt_window,
                "Skipping adaptation, recent window too short"
            );
            return Ok(());
        }

        let recent: Vec<f64> = self.history.iter().copied().collect();
        let replaced = self.detector.adapt(&recent)?;
        self.adaptations += 1;
        info!(replaced, point = self.processed, "Observers adapted to recent data");
        Ok(())
    }
}
