//! The wire protocols a capture must decode.

pub mod statsd;
