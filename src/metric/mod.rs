//! The decoded form of a statsd line and the tags that ride along with it.

use error::ParseError;
use protocols::statsd;
use std::fmt;
use std::str::FromStr;
use std::sync;

mod criteria;
mod tagset;

pub use self::criteria::{Criteria, Criterion};
pub use self::tagset::{matches, TagSet};

/// The wire type of a statsd metric, the code after the first `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// `c`
    Counter,
    /// `g`
    Gauge,
    /// `h`
    Histogram,
    /// `ms`
    Timing,
    /// `d`
    Distribution,
    /// `s`
    Set,
}

impl MetricType {
    /// Interpret a wire type code.
    pub fn from_code(code: &str) -> Option<MetricType> {
        match code {
            "c" => Some(MetricType::Counter),
            "g" => Some(MetricType::Gauge),
            "h" => Some(MetricType::Histogram),
            "ms" => Some(MetricType::Timing),
            "d" => Some(MetricType::Distribution),
            "s" => Some(MetricType::Set),
            _ => None,
        }
    }

    /// The wire type code.
    pub fn code(&self) -> &'static str {
        match *self {
            MetricType::Counter => "c",
            MetricType::Gauge => "g",
            MetricType::Histogram => "h",
            MetricType::Timing => "ms",
            MetricType::Distribution => "d",
            MetricType::Set => "s",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
            MetricType::Timing => "timing",
            MetricType::Distribution => "distribution",
            MetricType::Set => "set",
        };
        f.write_str(name)
    }
}

/// A single decoded statsd line.
///
/// Values are kept as the raw wire tokens. Sign prefixes matter to gauges and
/// are only interpreted once a capture is queried.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metric {
    /// The metric name, everything before the first `:`.
    pub name: String,
    /// Raw value tokens, in emitted order. Never empty.
    pub values: Vec<String>,
    /// Wire type.
    pub kind: MetricType,
    /// The `|@` sample rate, taken literally.
    pub sample_rate: Option<f64>,
    /// The `|#` tags, if any were sent.
    pub tags: Option<sync::Arc<TagSet>>,
    /// The `|c:` container id.
    pub container_id: Option<String>,
    /// The `|T` timestamp, unix seconds.
    pub timestamp: Option<i64>,
}

impl Metric {
    /// Make a builder for metrics
    ///
    /// The metric has no values until `value` is called; a metric must have
    /// at least one before it is serialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::metric::{Metric, MetricType};
    ///
    /// let m = Metric::new("foo", MetricType::Gauge).value("+1").value("-2");
    ///
    /// assert_eq!(m.name, "foo");
    /// assert_eq!(m.values, vec!["+1", "-2"]);
    /// assert_eq!(m.to_string(), "foo:+1:-2|g");
    /// ```
    pub fn new<S>(name: S, kind: MetricType) -> Metric
    where
        S: Into<String>,
    {
        Metric {
            name: name.into(),
            values: Vec::new(),
            kind: kind,
            sample_rate: None,
            tags: None,
            container_id: None,
            timestamp: None,
        }
    }

    /// Append a raw value token.
    pub fn value<S>(mut self, value: S) -> Metric
    where
        S: Into<String>,
    {
        self.values.push(value.into());
        self
    }

    /// Set the sample rate.
    pub fn sample_rate(mut self, rate: f64) -> Metric {
        self.sample_rate = Some(rate);
        self
    }

    /// Add a literal tag token, `key:value` or a bare flag.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::metric::{Metric, MetricType};
    ///
    /// let m = Metric::new("foo", MetricType::Counter).value("1")
    ///     .tag("tag1:a")
    ///     .tag("tag2");
    ///
    /// let tags = m.tags.as_ref().unwrap();
    /// assert!(tags.contains("tag2"));
    /// assert!(tags["tag1"].contains("a"));
    /// ```
    pub fn tag<S>(mut self, token: S) -> Metric
    where
        S: Into<String>,
    {
        {
            let tags = self.tags.get_or_insert_with(Default::default);
            sync::Arc::make_mut(tags).insert(token);
        }
        if self.tags.as_ref().map_or(false, |t| t.is_empty()) {
            self.tags = None;
        }
        self
    }

    /// Set the container id.
    pub fn container_id<S>(mut self, id: S) -> Metric
    where
        S: Into<String>,
    {
        self.container_id = Some(id.into());
        self
    }

    /// Set the metric timestamp, unix seconds.
    pub fn timestamp(mut self, time: i64) -> Metric {
        self.timestamp = Some(time);
        self
    }

    /// Weight of this line when reconstructing the true population,
    /// `1 / sample_rate`. Rates above 1 are applied as-is.
    pub fn weight(&self) -> f64 {
        match self.sample_rate {
            Some(rate) => 1.0 / rate,
            None => 1.0,
        }
    }
}

impl FromStr for Metric {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Metric, ParseError> {
        statsd::parse_line(line)
    }
}

impl fmt::Display for Metric {
    /// Serialize in DogStatsd emission order.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for value in &self.values {
            write!(f, ":{}", value)?;
        }
        write!(f, "|{}", self.kind.code())?;
        if let Some(rate) = self.sample_rate {
            write!(f, "|@{}", rate)?;
        }
        if let Some(ref tags) = self.tags {
            let tokens: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
            write!(f, "|#{}", tokens.join(","))?;
        }
        if let Some(ref id) = self.container_id {
            write!(f, "|c:{}", id)?;
        }
        if let Some(time) = self.timestamp {
            write!(f, "|T{}", time)?;
        }
        Ok(())
    }
}
