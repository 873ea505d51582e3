//! Histograms, timings and distributions. The three wire types aggregate
//! identically; they differ only in which lines they collect.

use aggregate::{Captured, Entry, Extrema, Kind};
use error::QueryError;
use metric::MetricType;

/// Kinds whose values are samples of a population.
pub trait Sampled: Kind {}

/// Histograms, wire type `h`.
#[derive(Debug)]
pub enum Histogram {}

/// Timings, wire type `ms`.
#[derive(Debug)]
pub enum Timing {}

/// Distributions, wire type `d`.
#[derive(Debug)]
pub enum Distribution {}

macro_rules! sampled_kind {
    ($kind:ident, $metric_type:expr) => {
        impl Kind for $kind {
            fn metric_type() -> MetricType {
                $metric_type
            }
        }

        impl Sampled for $kind {}

        impl Extrema for $kind {
            fn points(entries: &[Entry]) -> Result<Vec<f64>, QueryError> {
                raw_points(entries)
            }
        }
    };
}

sampled_kind!(Histogram, MetricType::Histogram);
sampled_kind!(Timing, MetricType::Timing);
sampled_kind!(Distribution, MetricType::Distribution);

// Sampling only changes how many times a value is assumed to have happened,
// not which values exist.
fn raw_points(entries: &[Entry]) -> Result<Vec<f64>, QueryError> {
    let mut res = Vec::new();
    for entry in entries {
        res.extend(entry.parsed()?);
    }
    Ok(res)
}

impl<K: Sampled> Captured<K> {
    /// The sample-weighted mean, or 0 when nothing was captured.
    ///
    /// Every value of a line carries that line's `1 / sample_rate` weight.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::aggregate::{Captured, Entry, Histogram};
    ///
    /// let hist: Captured<Histogram> = Captured::new(vec![
    ///     Entry::new(vec!["1"], None, None),
    ///     Entry::new(vec!["2"], Some(0.5), None),
    ///     Entry::new(vec!["3", "7"], Some(0.5), None),
    /// ]);
    ///
    /// assert_eq!(hist.avg().unwrap(), 25.0 / 7.0);
    /// assert_eq!(hist.min().unwrap(), 1.0);
    /// assert_eq!(hist.max().unwrap(), 7.0);
    /// ```
    pub fn avg(&self) -> Result<f64, QueryError> {
        let mut sum = 0.0;
        let mut weights = 0.0;
        for entry in self.iter() {
            let weight = entry.weight();
            for val in entry.parsed()? {
                sum += val * weight;
                weights += weight;
            }
        }
        if weights == 0.0 {
            Ok(0.0)
        } else {
            Ok(sum / weights)
        }
    }
}
