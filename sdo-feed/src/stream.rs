use futures::stream::{self, BoxStream, StreamExt};
use sdo_core::PricePoint;
use std::time::Duration;

/// One-pass stream over a fetched price series.
///
/// Consumed points are gone; re-create the stream from the source to replay.
#[derive(Debug)]
pub struct PriceStream {
    points: std::vec::IntoIter<PricePoint>,
    consumed: usize,
}

impl PriceStream {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self {
            points: points.into_iter(),
            consumed: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.points.len()
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Pulls up to `n` points for detector initialization.
    pub fn take_warmup(&mut self, n: usize) -> Vec<PricePoint> {
        self.by_ref().take(n).collect()
    }

    /// Turns the remaining points into an async stream with `delay` between items.
    pub fn paced(self, delay: Duration) -> BoxStream<'static, PricePoint> {
        let points = stream::iter(self);
        if delay.is_zero() {
            points.boxed()
        } else {
            tokio_stream::StreamExt::throttle(points, delay).boxed()
        }
    }
}

impl Iterator for PriceStream {
    type Item = PricePoint;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.points.next()?;
        self.consumed += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.points.size_hint()
    }
}
