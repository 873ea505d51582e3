//! Summaries of everything a capture holds, one per metric name and kind.

use aggregate::{Captured, Count, Distribution, Extrema, Gauge, Histogram, Kind, Sampled, Set,
                Timing};
use capture::Capture;
use error::QueryError;
use metric::{Criteria, MetricType};
use serde_json;
use std::fmt;

/// Kind-appropriate statistics of a `Captured` collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Stats {
    /// Counters.
    Count {
        /// Lines captured.
        entries: usize,
        /// Sample-weighted total.
        total: f64,
    },
    /// Gauges.
    Gauge {
        /// Lines captured.
        entries: usize,
        /// Final value.
        last: f64,
        /// Smallest running value, if any.
        min: Option<f64>,
        /// Largest running value, if any.
        max: Option<f64>,
    },
    /// Histograms, timings and distributions.
    Sampled {
        /// Lines captured.
        entries: usize,
        /// Sample-weighted mean.
        avg: f64,
        /// Smallest value, if any.
        min: Option<f64>,
        /// Largest value, if any.
        max: Option<f64>,
    },
    /// Sets.
    Set {
        /// Lines captured.
        entries: usize,
        /// Distinct members, ascending.
        unique: Vec<f64>,
    },
}

fn fmt_opt(val: Option<f64>) -> String {
    match val {
        Some(v) => format!("{}", v),
        None => "-".to_string(),
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Stats::Count { entries, total } => write!(f, "entries={} total={}", entries, total),
            Stats::Gauge {
                entries,
                last,
                min,
                max,
            } => write!(
                f,
                "entries={} last={} min={} max={}",
                entries,
                last,
                fmt_opt(min),
                fmt_opt(max)
            ),
            Stats::Sampled {
                entries,
                avg,
                min,
                max,
            } => write!(
                f,
                "entries={} avg={} min={} max={}",
                entries,
                avg,
                fmt_opt(min),
                fmt_opt(max)
            ),
            Stats::Set {
                entries,
                ref unique,
            } => write!(f, "entries={} unique={}", entries, unique.len()),
        }
    }
}

/// The statistics of one tag-value group of a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    /// Values of the split keys, in key order.
    pub values: Vec<String>,
    /// Statistics of the group.
    pub stats: Stats,
}

/// The statistics of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Metric name.
    pub name: String,
    /// Wire type.
    pub kind: MetricType,
    /// Statistics over every matching entry.
    pub stats: Stats,
    /// Per split-group statistics. Empty when no split keys were given.
    pub groups: Vec<Group>,
}

/// Kinds that can be summarized.
pub trait Summarize: Kind + Sized {
    /// Compute the statistics of `captured`.
    fn stats(captured: &Captured<Self>) -> Result<Stats, QueryError>;
}

fn optional(res: Result<f64, QueryError>) -> Result<Option<f64>, QueryError> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(QueryError::EmptyRange) => Ok(None),
        Err(e) => Err(e),
    }
}

impl Summarize for Count {
    fn stats(captured: &Captured<Count>) -> Result<Stats, QueryError> {
        Ok(Stats::Count {
            entries: captured.len(),
            total: captured.total()?,
        })
    }
}

impl Summarize for Gauge {
    fn stats(captured: &Captured<Gauge>) -> Result<Stats, QueryError> {
        Ok(Stats::Gauge {
            entries: captured.len(),
            last: captured.last()?,
            min: optional(captured.min())?,
            max: optional(captured.max())?,
        })
    }
}

fn sampled_stats<K: Sampled + Extrema>(captured: &Captured<K>) -> Result<Stats, QueryError> {
    Ok(Stats::Sampled {
        entries: captured.len(),
        avg: captured.avg()?,
        min: optional(captured.min())?,
        max: optional(captured.max())?,
    })
}

impl Summarize for Histogram {
    fn stats(captured: &Captured<Histogram>) -> Result<Stats, QueryError> {
        sampled_stats(captured)
    }
}

impl Summarize for Timing {
    fn stats(captured: &Captured<Timing>) -> Result<Stats, QueryError> {
        sampled_stats(captured)
    }
}

impl Summarize for Distribution {
    fn stats(captured: &Captured<Distribution>) -> Result<Stats, QueryError> {
        sampled_stats(captured)
    }
}

impl Summarize for Set {
    fn stats(captured: &Captured<Set>) -> Result<Stats, QueryError> {
        Ok(Stats::Set {
            entries: captured.len(),
            unique: captured.unique()?.into_iter().map(|x| x.0).collect(),
        })
    }
}

fn summarize_kind<K: Summarize>(
    capture: &Capture,
    name: &str,
    split: &[String],
    filter: &Criteria,
) -> Result<Option<Summary>, QueryError> {
    let captured = capture.get::<K>(name).filter(filter);
    if captured.is_empty() {
        return Ok(None);
    }
    let mut groups = Vec::new();
    if !split.is_empty() {
        for (values, group) in captured.split_many(split) {
            groups.push(Group {
                values: values,
                stats: K::stats(&group)?,
            });
        }
    }
    Ok(Some(Summary {
        name: name.to_string(),
        kind: K::metric_type(),
        stats: K::stats(&captured)?,
        groups: groups,
    }))
}

/// Summarize every metric of `capture` whose entries match `filter`, in
/// order of first arrival, breaking each down by the `split` tag keys.
pub fn summarize(
    capture: &Capture,
    split: &[String],
    filter: &Criteria,
) -> Result<Vec<Summary>, QueryError> {
    let mut res = Vec::new();
    for (name, kind) in capture.names() {
        let summary = match kind {
            MetricType::Counter => summarize_kind::<Count>(capture, &name, split, filter)?,
            MetricType::Gauge => summarize_kind::<Gauge>(capture, &name, split, filter)?,
            MetricType::Histogram => summarize_kind::<Histogram>(capture, &name, split, filter)?,
            MetricType::Timing => summarize_kind::<Timing>(capture, &name, split, filter)?,
            MetricType::Distribution => {
                summarize_kind::<Distribution>(capture, &name, split, filter)?
            }
            MetricType::Set => summarize_kind::<Set>(capture, &name, split, filter)?,
        };
        if let Some(summary) = summary {
            res.push(summary);
        }
    }
    Ok(res)
}

/// Render summaries one metric per line, groups indented beneath.
pub fn render_text(summaries: &[Summary], split: &[String]) -> String {
    let mut out = String::new();
    for summary in summaries {
        out.push_str(&format!("{} {} {}\n", summary.kind, summary.name, summary.stats));
        for group in &summary.groups {
            let labels: Vec<String> = split
                .iter()
                .zip(group.values.iter())
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            out.push_str(&format!("  {} {}\n", labels.join(","), group.stats));
        }
    }
    out
}

/// Render summaries as a JSON array.
pub fn render_json(summaries: &[Summary]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summaries)
}

#[cfg(test)]
mod test {
    use super::*;

    fn capture(lines: &str) -> Capture {
        let capture = Capture::new();
        for line in lines.lines() {
            capture.append(line.parse().unwrap());
        }
        capture.close();
        capture
    }

    #[test]
    fn test_summarize_every_kind() {
        let cap = capture(
            "req:1|c|#route:a\n\
             temp:5|g\n\
             temp:-2|g\n\
             lat:10|ms|@0.5\n\
             lat:20|ms\n\
             users:7|s\n\
             users:7|s\n\
             size:3|h\n\
             load:1|d\n\
             req:2|c|#route:b",
        );

        let summaries = summarize(&cap, &[], &Criteria::new()).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["req", "temp", "lat", "users", "size", "load"]);

        assert_eq!(
            summaries[0].stats,
            Stats::Count {
                entries: 2,
                total: 3.0,
            }
        );
        assert_eq!(
            summaries[1].stats,
            Stats::Gauge {
                entries: 2,
                last: 3.0,
                min: Some(3.0),
                max: Some(5.0),
            }
        );
        assert_eq!(
            summaries[2].stats,
            Stats::Sampled {
                entries: 2,
                avg: 40.0 / 3.0,
                min: Some(10.0),
                max: Some(20.0),
            }
        );
        assert_eq!(
            summaries[3].stats,
            Stats::Set {
                entries: 2,
                unique: vec![7.0],
            }
        );
        assert!(summaries.iter().all(|s| s.groups.is_empty()));
    }

    #[test]
    fn test_summarize_split_and_filter() {
        let cap = capture(
            "req:1|c|#route:a,env:test\n\
             req:3|c|#route:b,env:test\n\
             req:5|c|#route:a,env:prod\n\
             other:1|c|#env:prod",
        );
        let split = vec!["route".to_string()];

        let summaries = summarize(&cap, &split, &Criteria::from(("env", "test"))).unwrap();
        assert_eq!(1, summaries.len());
        assert_eq!(summaries[0].groups.len(), 2);
        assert_eq!(summaries[0].groups[0].values, vec!["a".to_string()]);
        assert_eq!(
            summaries[0].groups[0].stats,
            Stats::Count {
                entries: 1,
                total: 1.0,
            }
        );

        let text = render_text(&summaries, &split);
        assert_eq!(
            text,
            "counter req entries=2 total=4\n  route=a entries=1 total=1\n  route=b entries=1 total=3\n"
        );
    }

    #[test]
    fn test_render_json() {
        let cap = capture("req:1|c\nusers:2|s");
        let summaries = summarize(&cap, &[], &Criteria::new()).unwrap();

        let json: serde_json::Value = serde_json::from_str(&render_json(&summaries).unwrap()).unwrap();
        assert_eq!(json[0]["name"], "req");
        assert_eq!(json[0]["kind"], "counter");
        assert_eq!(json[0]["stats"]["total"], 1.0);
        assert_eq!(json[1]["stats"]["unique"][0], 2.0);
    }

    #[test]
    fn test_non_numeric_fails_report() {
        let cap = capture("users:alice|s");
        assert_eq!(
            Err(QueryError::NonNumeric("alice".to_string())),
            summarize(&cap, &[], &Criteria::new())
        );
    }
}
