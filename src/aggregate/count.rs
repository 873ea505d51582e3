use aggregate::{Captured, Kind};
use error::QueryError;
use metric::MetricType;

/// Counters, wire type `c`.
#[derive(Debug)]
pub enum Count {}

impl Kind for Count {
    fn metric_type() -> MetricType {
        MetricType::Counter
    }
}

impl Captured<Count> {
    /// The estimated true count.
    ///
    /// Each line contributes the sum of its values scaled by `1 /
    /// sample_rate`. An empty collection totals 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::aggregate::{Captured, Count, Entry};
    ///
    /// let count: Captured<Count> = Captured::new(vec![
    ///     Entry::new(vec!["1"], None, None),
    ///     Entry::new(vec!["2"], Some(0.5), None),
    ///     Entry::new(vec!["3", "7"], Some(0.5), None),
    /// ]);
    ///
    /// assert_eq!(count.total().unwrap(), 25.0);
    /// ```
    pub fn total(&self) -> Result<f64, QueryError> {
        let mut total = 0.0;
        for entry in self.iter() {
            let sum: f64 = entry.parsed()?.iter().sum();
            total += sum * entry.weight();
        }
        Ok(total)
    }
}
