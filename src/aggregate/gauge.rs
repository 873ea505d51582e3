use aggregate::{parse_value, Captured, Entry, Extrema, Kind};
use error::QueryError;
use metric::MetricType;

/// Gauges, wire type `g`.
#[derive(Debug)]
pub enum Gauge {}

impl Kind for Gauge {
    fn metric_type() -> MetricType {
        MetricType::Gauge
    }
}

impl Extrema for Gauge {
    fn points(entries: &[Entry]) -> Result<Vec<f64>, QueryError> {
        replay(entries)
    }
}

// A `-` token before any value is established is an absolute negative, never
// a decrement from nothing.
fn replay(entries: &[Entry]) -> Result<Vec<f64>, QueryError> {
    let mut current: Option<f64> = None;
    let mut res = Vec::new();
    for entry in entries {
        for token in &entry.values {
            let val = parse_value(token)?;
            let next = if token.starts_with('+') {
                current.unwrap_or(0.0) + val
            } else if token.starts_with('-') {
                match current {
                    Some(cur) => cur - val.abs(),
                    None => val,
                }
            } else {
                val
            };
            current = Some(next);
            res.push(next);
        }
    }
    Ok(res)
}

impl Captured<Gauge> {
    /// The gauge's value after each raw token, in arrival order.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::aggregate::{Captured, Entry, Gauge};
    ///
    /// let gauge: Captured<Gauge> = Captured::new(vec![
    ///     Entry::new(vec!["-3", "+7"], None, None),
    ///     Entry::new(vec!["-2"], None, None),
    ///     Entry::new(vec!["10"], None, None),
    /// ]);
    ///
    /// assert_eq!(gauge.values().unwrap(), vec![-3.0, 4.0, 2.0, 10.0]);
    /// ```
    pub fn values(&self) -> Result<Vec<f64>, QueryError> {
        replay(self.entries())
    }

    /// The final value, or 0 if the gauge was never set.
    pub fn last(&self) -> Result<f64, QueryError> {
        Ok(replay(self.entries())?.last().cloned().unwrap_or(0.0))
    }
}
