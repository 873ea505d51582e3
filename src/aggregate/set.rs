use aggregate::{Captured, Kind};
use error::QueryError;
use metric::MetricType;
use ordered_float::OrderedFloat;
use std::collections::BTreeSet;

/// Sets, wire type `s`.
#[derive(Debug)]
pub enum Set {}

impl Kind for Set {
    fn metric_type() -> MetricType {
        MetricType::Set
    }
}

impl Captured<Set> {
    /// The distinct members across every value of every line.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::aggregate::{Captured, Entry, Set};
    ///
    /// let set: Captured<Set> = Captured::new(vec![
    ///     Entry::new(vec!["1"], None, None),
    ///     Entry::new(vec!["2"], Some(0.5), None),
    ///     Entry::new(vec!["3", "2"], Some(0.5), None),
    /// ]);
    ///
    /// let unique: Vec<f64> = set.unique().unwrap().into_iter().map(|x| x.0).collect();
    /// assert_eq!(unique, vec![1.0, 2.0, 3.0]);
    /// ```
    pub fn unique(&self) -> Result<BTreeSet<OrderedFloat<f64>>, QueryError> {
        let mut res = BTreeSet::new();
        for entry in self.iter() {
            for val in entry.parsed()? {
                res.insert(OrderedFloat(val));
            }
        }
        Ok(res)
    }
}
