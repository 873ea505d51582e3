//! Error taxonomy for decoding wire lines and querying captured metrics.

use metric::MetricType;
use thiserror::Error;

/// A statsd line that could not be decoded.
///
/// Parsing is pure, so a line that fails once fails always. Callers decide
/// whether to drop or surface it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No `|` between the value list and the type code.
    #[error("missing type separator")]
    MissingType,
    /// No `:` between the metric name and its values.
    #[error("missing value separator")]
    MissingValue,
    /// The metric name is empty.
    #[error("empty metric name")]
    EmptyName,
    /// One of the `:` separated value tokens is empty.
    #[error("empty value token")]
    EmptyValue,
    /// The type code is empty.
    #[error("empty metric type")]
    EmptyType,
    /// The type code is not one of `c`, `g`, `h`, `ms`, `d` or `s`.
    #[error("unknown metric type {0:?}")]
    UnknownType(String),
    /// The `|@` section is not a float.
    #[error("sample rate {0:?} is not a number")]
    BadSampleRate(String),
    /// The `|T` section is not an integer.
    #[error("timestamp {0:?} is not an integer")]
    BadTimestamp(String),
}

/// A query over captured metrics that has no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// An extremum was asked of an empty collection without a default.
    #[error("extremum of an empty collection")]
    EmptyRange,
    /// A value token could not be interpreted as a number.
    #[error("value {0:?} is not numeric")]
    NonNumeric(String),
    /// The capture never saw the metric with this kind.
    #[error("no {kind} metric named {name:?} was captured")]
    NoSuchMetric {
        /// Requested metric name.
        name: String,
        /// Requested wire kind.
        kind: MetricType,
    },
}
