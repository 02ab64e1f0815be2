//! Price series providers and the one-pass stream fed to the detector.

pub mod source;
pub mod stream;

pub use source::{source_from_settings, CsvSource, PriceSource, YahooSource};
pub use stream::PriceStream;
