//! StatsD / DogStatsd line decoding.

use error::ParseError;
use metric::{Metric, MetricType, TagSet};
use std::str::FromStr;
use std::sync;

/// Parse one statsd line.
///
/// Valid line formats are:
///
/// - `<str:name>:<value>[:<value>...]|<str:type>`
/// - followed by any of, in any order:
///   `|@<f64:sample_rate>`, `|#<tag>[,<tag>...]`, `|c:<str:container_id>`,
///   `|T<i64:timestamp>`
///
/// Values are kept verbatim. Unrecognised `|` sections are skipped and a
/// repeated section replaces the earlier one.
///
/// # Examples
///
/// ```
/// use statsd_capture::protocols::statsd::parse_line;
/// use statsd_capture::metric::MetricType;
///
/// let m = parse_line("testns.test.counter:1:-4|c|#tag1:a,tag2|@0.5").unwrap();
///
/// assert_eq!(m.name, "testns.test.counter");
/// assert_eq!(m.values, vec!["1", "-4"]);
/// assert_eq!(m.kind, MetricType::Counter);
/// assert_eq!(m.sample_rate, Some(0.5));
/// assert!(m.tags.unwrap().contains("tag2"));
/// ```
pub fn parse_line(src: &str) -> Result<Metric, ParseError> {
    let src = src.trim_end_matches(&['\r', '\n'][..]);
    let mut sections = src.split('|');
    let head = sections.next().unwrap_or("");
    let code = match sections.next() {
        Some(code) => code,
        None => return Err(ParseError::MissingType),
    };

    let colon_idx = match head.find(':') {
        Some(idx) => idx,
        None => return Err(ParseError::MissingValue),
    };
    let name = &head[..colon_idx];
    if name.is_empty() {
        return Err(ParseError::EmptyName);
    }
    let mut values = Vec::new();
    for val in head[(colon_idx + 1)..].split(':') {
        if val.is_empty() {
            return Err(ParseError::EmptyValue);
        }
        values.push(val.to_string());
    }

    if code.is_empty() {
        return Err(ParseError::EmptyType);
    }
    let kind = match MetricType::from_code(code) {
        Some(kind) => kind,
        None => return Err(ParseError::UnknownType(code.to_string())),
    };

    let mut metric = Metric::new(name, kind);
    metric.values = values;
    for section in sections {
        if section.starts_with('@') {
            let rate = &section[1..];
            match f64::from_str(rate) {
                Ok(f) => metric.sample_rate = Some(f),
                Err(_) => return Err(ParseError::BadSampleRate(rate.to_string())),
            }
        } else if section.starts_with('#') {
            let tags = TagSet::parse(section[1..].split(','));
            metric.tags = if tags.is_empty() {
                None
            } else {
                Some(sync::Arc::new(tags))
            };
        } else if section.starts_with("c:") {
            metric.container_id = Some(section[2..].to_string());
        } else if section.starts_with('T') {
            let time = &section[1..];
            match i64::from_str(time) {
                Ok(t) => metric.timestamp = Some(t),
                Err(_) => return Err(ParseError::BadTimestamp(time.to_string())),
            }
        }
    }
    Ok(metric)
}

/// Parse every line of a datagram.
///
/// Multiple metrics may be sent in a single UDP packet separated by newlines.
/// Each line succeeds or fails on its own; blank lines are skipped.
pub fn parse_datagram(source: &str) -> Vec<Result<Metric, ParseError>> {
    source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    #[test]
    fn test_parse_simple() {
        let m = parse_line("35.ns_bloo:654.12|ms").unwrap();

        assert_eq!(m.name, "35.ns_bloo");
        assert_eq!(m.values, vec!["654.12"]);
        assert_eq!(m.kind, MetricType::Timing);
        assert_eq!(m.sample_rate, None);
        assert_eq!(m.tags, None);
        assert_eq!(m.container_id, None);
        assert_eq!(m.timestamp, None);
    }

    #[test]
    fn test_parse_all_sections() {
        let m = parse_line("ns.bla:0:+5:-3|g|@2|#tag1:a,tag2|c:blabla|T1234567890").unwrap();

        assert_eq!(m.values, vec!["0", "+5", "-3"]);
        assert_eq!(m.kind, MetricType::Gauge);
        assert_eq!(m.sample_rate, Some(2.0));
        assert_eq!(
            m.tags.as_ref().map(|t| (**t).clone()),
            Some(TagSet::parse(vec!["tag1:a", "tag2"]))
        );
        assert_eq!(m.container_id, Some("blabla".to_string()));
        assert_eq!(m.timestamp, Some(1234567890));
    }

    #[test]
    fn test_parse_sections_any_order() {
        let lhs = parse_line("foo:1|h|T10|c:box|#a:b|@0.25").unwrap();
        let rhs = parse_line("foo:1|h|@0.25|#a:b|c:box|T10").unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_parse_skips_unknown_sections() {
        let m = parse_line("foo:1|d|e:it-false,cn-nginx|#a|card:low").unwrap();
        assert_eq!(m.kind, MetricType::Distribution);
        assert!(m.tags.unwrap().contains("a"));
        assert_eq!(m.container_id, None);
    }

    #[test]
    fn test_parse_trailing_newline() {
        let m = parse_line("foo:1|s\r\n").unwrap();
        assert_eq!(m.kind, MetricType::Set);
        assert_eq!(m.values, vec!["1"]);
    }

    #[test]
    fn test_parse_empty_tags_section() {
        let m = parse_line("foo:1|c|#").unwrap();
        assert_eq!(m.tags, None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Err(ParseError::MissingType), parse_line("foo:1"));
        assert_eq!(Err(ParseError::MissingType), parse_line(""));
        assert_eq!(Err(ParseError::MissingValue), parse_line("foo|c"));
        assert_eq!(Err(ParseError::EmptyName), parse_line(":1|c"));
        assert_eq!(Err(ParseError::EmptyValue), parse_line("foo:|c"));
        assert_eq!(Err(ParseError::EmptyValue), parse_line("foo:1::2|c"));
        assert_eq!(Err(ParseError::EmptyType), parse_line("foo:1|"));
        assert_eq!(
            Err(ParseError::UnknownType("x".to_string())),
            parse_line("foo:1|x")
        );
        assert_eq!(
            Err(ParseError::BadSampleRate("half".to_string())),
            parse_line("foo:1|c|@half")
        );
        assert_eq!(
            Err(ParseError::BadTimestamp("1.5".to_string())),
            parse_line("foo:1|c|T1.5")
        );
    }

    #[test]
    fn test_parse_datagram_isolates_failures() {
        let res = parse_datagram("zrth:0|g\nfst:-1.1|ms\nbad line\n\nsnd:+2.2|g\nfth:4|q\n");

        assert_eq!(5, res.len());
        assert_eq!(res[0].as_ref().unwrap().name, "zrth");
        assert_eq!(res[1].as_ref().unwrap().values, vec!["-1.1"]);
        assert_eq!(res[2], Err(ParseError::MissingType));
        assert_eq!(res[3].as_ref().unwrap().values, vec!["+2.2"]);
        assert_eq!(res[4], Err(ParseError::UnknownType("q".to_string())));
    }

    #[test]
    fn test_round_trip() {
        fn inner(m: Metric) -> TestResult {
            match parse_line(&m.to_string()) {
                Ok(parsed) => {
                    assert_eq!(m, parsed);
                    TestResult::passed()
                }
                Err(e) => {
                    println!("\n\nMETRIC: {:?} | LINE: {} | ERR: {:?}", m, m, e);
                    TestResult::failed()
                }
            }
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(Metric) -> TestResult);
    }
}
