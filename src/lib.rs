//! statsd-capture is a StatsD / DogStatsd decoder and in-memory query engine
//! meant to sit behind a fake statsd server in tests. Datagrams are decoded
//! line by line, fanned out to every open capture session and then queried
//! per metric name with kind-appropriate statistics:
//!
//!  * counters are summed and reweighted by their sample rate,
//!  * gauges are replayed to resolve `+` / `-` deltas,
//!  * histograms, timings and distributions expose weighted means and extrema,
//!  * sets expose their distinct members.
//!
//! Every collection can be filtered and split by tags, so a test can assert on
//! exactly the slice of telemetry it cares about.
//!
//! ```
//! use statsd_capture::capture::Hub;
//! use statsd_capture::metric::Criteria;
//!
//! let hub = Hub::default();
//! let capture = hub.capture();
//! hub.ingest("req:1|c|#route:a\nreq:3|c|#route:b\nreq:2|c|@0.5|#route:a\n");
//! capture.close();
//!
//! let count = capture.get_count("req");
//! assert_eq!(count.total().unwrap(), 8.0);
//! assert_eq!(count.filter(&Criteria::from(("route", "a"))).total().unwrap(), 5.0);
//! ```
#![allow(unknown_lints)]
#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]
#![warn(missing_docs)]
extern crate chrono;
extern crate clap;
extern crate ordered_float;
extern crate serde;
extern crate serde_json;
extern crate thiserror;
extern crate toml;

#[macro_use]
extern crate log;

#[macro_use]
extern crate serde_derive;

#[cfg(test)]
extern crate quickcheck;

pub mod aggregate;
pub mod capture;
pub mod config;
pub mod error;
pub mod metric;
pub mod protocols;
pub mod report;
