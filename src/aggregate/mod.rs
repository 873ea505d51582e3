//! Captured metric collections and the query algebra over them.
//!
//! A `Captured<K>` is the ordered run of entries that share one metric name and
//! one wire type `K`, cut from a capture snapshot at query time. Filtering and
//! splitting by tags work the same for every kind; the statistics each kind
//! exposes live in the per-kind modules.

use error::QueryError;
use metric::{self, Criteria, Metric, MetricType, TagSet};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::slice::Iter;
use std::str::FromStr;
use std::sync;

mod count;
mod gauge;
mod sampled;
mod set;

pub use self::count::Count;
pub use self::gauge::Gauge;
pub use self::sampled::{Distribution, Histogram, Sampled, Timing};
pub use self::set::Set;

/// A wire type a `Captured` collection can hold.
pub trait Kind {
    /// The wire type accepted into the collection.
    fn metric_type() -> MetricType;
}

/// Kinds with a natural ordering over their points, for `min` and `max`.
pub trait Extrema: Kind {
    /// The points extrema are taken over, in arrival order.
    fn points(entries: &[Entry]) -> Result<Vec<f64>, QueryError>;
}

/// Interpret a raw value token. A leading `+` or `-` is part of the number.
pub fn parse_value(token: &str) -> Result<f64, QueryError> {
    f64::from_str(token).map_err(|_| QueryError::NonNumeric(token.to_string()))
}

/// One captured line, reduced to what aggregation needs.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Raw value tokens.
    pub values: Vec<String>,
    /// The line's sample rate, if any.
    pub sample_rate: Option<f64>,
    /// The line's tags, if any.
    pub tags: Option<sync::Arc<TagSet>>,
}

impl Entry {
    /// Build an entry from raw tokens.
    pub fn new<S>(values: Vec<S>, sample_rate: Option<f64>, tags: Option<TagSet>) -> Entry
    where
        S: Into<String>,
    {
        Entry {
            values: values.into_iter().map(|v| v.into()).collect(),
            sample_rate: sample_rate,
            tags: tags.map(sync::Arc::new),
        }
    }

    /// `1 / sample_rate`, or 1 when the line was not sampled.
    pub fn weight(&self) -> f64 {
        match self.sample_rate {
            Some(rate) => 1.0 / rate,
            None => 1.0,
        }
    }

    /// The values interpreted as numbers.
    pub fn parsed(&self) -> Result<Vec<f64>, QueryError> {
        self.values.iter().map(|v| parse_value(v)).collect()
    }

    /// The line's tags, if any.
    pub fn tags(&self) -> Option<&TagSet> {
        self.tags.as_ref().map(|t| &**t)
    }

    /// Determine if this entry's tags satisfy `criteria`.
    pub fn matches(&self, criteria: &Criteria) -> bool {
        metric::matches(self.tags(), criteria)
    }
}

impl<'a> From<&'a Metric> for Entry {
    fn from(m: &'a Metric) -> Entry {
        Entry {
            values: m.values.clone(),
            sample_rate: m.sample_rate,
            tags: m.tags.clone(),
        }
    }
}

/// The entries of one metric name and kind, in arrival order.
pub struct Captured<K> {
    entries: Vec<Entry>,
    kind: PhantomData<K>,
}

impl<K> Clone for Captured<K> {
    fn clone(&self) -> Captured<K> {
        Captured::new(self.entries.clone())
    }
}

impl<K> PartialEq for Captured<K> {
    fn eq(&self, other: &Captured<K>) -> bool {
        self.entries == other.entries
    }
}

impl<K: Kind> fmt::Debug for Captured<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Captured")
            .field("kind", &K::metric_type())
            .field("entries", &self.entries)
            .finish()
    }
}

impl<K> Default for Captured<K> {
    fn default() -> Captured<K> {
        Captured::new(Vec::new())
    }
}

impl<K> Captured<K> {
    /// Wrap already-selected entries.
    pub fn new(entries: Vec<Entry>) -> Captured<K> {
        Captured {
            entries: entries,
            kind: PhantomData,
        }
    }

    /// The entries, in arrival order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Iterate the entries in arrival order.
    pub fn iter(&self) -> Iter<Entry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Determine if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn select<F>(&self, pred: F) -> Captured<K>
    where
        F: Fn(&Entry) -> bool,
    {
        Captured::new(self.entries.iter().filter(|e| pred(*e)).cloned().collect())
    }

    /// Entries whose tags satisfy every criterion.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::aggregate::{Captured, Count, Entry};
    /// use statsd_capture::metric::{Criteria, TagSet};
    ///
    /// let count: Captured<Count> = Captured::new(vec![
    ///     Entry::new(vec!["1"], None, Some(TagSet::parse(vec!["tag1:a", "tag2"]))),
    ///     Entry::new(vec!["3"], None, Some(TagSet::parse(vec!["tag1:a", "tag3"]))),
    /// ]);
    ///
    /// assert_eq!(count.filter(&Criteria::from(("tag1", "a"))).total().unwrap(), 4.0);
    /// assert_eq!(count.filter_not(&Criteria::from("tag2")).total().unwrap(), 3.0);
    /// assert_eq!(count.filter_not(&Criteria::from(("tag1", "a"))).total().unwrap(), 0.0);
    /// ```
    pub fn filter(&self, criteria: &Criteria) -> Captured<K> {
        self.select(|e| e.matches(criteria))
    }

    /// Entries whose tags fail the criteria as a whole. Together with
    /// `filter` over the same criteria this partitions the collection.
    pub fn filter_not(&self, criteria: &Criteria) -> Captured<K> {
        self.select(|e| !e.matches(criteria))
    }

    /// Group entries by their value under `key`.
    ///
    /// An entry with several values under `key` lands in every one of those
    /// groups. Entries without `key` are left out.
    pub fn split(&self, key: &str) -> BTreeMap<String, Captured<K>> {
        let mut groups: BTreeMap<String, Captured<K>> = BTreeMap::new();
        for entry in &self.entries {
            if let Some(vals) = entry.tags().and_then(|t| t.get(key)) {
                for val in vals {
                    groups
                        .entry(val.clone())
                        .or_insert_with(Captured::default)
                        .entries
                        .push(entry.clone());
                }
            }
        }
        groups
    }

    /// Group entries by their values under several keys at once, grouped
    /// under value tuples ordered like `keys`.
    ///
    /// Multi-valued keys contribute every combination. Entries missing any of
    /// the keys are left out.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::aggregate::{Captured, Count, Entry};
    /// use statsd_capture::metric::TagSet;
    ///
    /// let count: Captured<Count> = Captured::new(vec![
    ///     Entry::new(vec!["1"], None, Some(TagSet::parse(vec!["tag1:a", "tag2:a"]))),
    ///     Entry::new(vec!["3"], None, Some(TagSet::parse(vec!["tag1:a", "tag2:b"]))),
    ///     Entry::new(vec!["10"], None, Some(TagSet::parse(vec!["tag1:b", "tag2:a"]))),
    ///     Entry::new(vec!["3"], None, Some(TagSet::parse(vec!["tag1:b"]))),
    /// ]);
    ///
    /// let split = count.split_many(&["tag1", "tag2"]);
    /// assert_eq!(3, split.len());
    /// let key = vec!["b".to_string(), "a".to_string()];
    /// assert_eq!(split[&key].total().unwrap(), 10.0);
    /// ```
    pub fn split_many<S>(&self, keys: &[S]) -> BTreeMap<Vec<String>, Captured<K>>
    where
        S: AsRef<str>,
    {
        let mut groups: BTreeMap<Vec<String>, Captured<K>> = BTreeMap::new();
        for entry in &self.entries {
            let tags = match entry.tags() {
                Some(tags) => tags,
                None => continue,
            };
            let mut combos: Vec<Vec<String>> = vec![Vec::with_capacity(keys.len())];
            for key in keys {
                let vals = match tags.get(key.as_ref()) {
                    Some(vals) => vals,
                    None => {
                        combos.clear();
                        break;
                    }
                };
                combos = combos
                    .into_iter()
                    .flat_map(|prefix| {
                        vals.iter().map(move |val| {
                            let mut combo = prefix.clone();
                            combo.push(val.clone());
                            combo
                        })
                    })
                    .collect();
            }
            for combo in combos {
                groups
                    .entry(combo)
                    .or_insert_with(Captured::default)
                    .entries
                    .push(entry.clone());
            }
        }
        groups
    }

    /// Every distinct value seen under `key`.
    pub fn tag_values(&self, key: &str) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter_map(|e| e.tags().and_then(|t| t.get(key)))
            .flat_map(|vals| vals.iter().cloned())
            .collect()
    }

    /// Every literal tag token seen, bare or keyed.
    pub fn tags(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter_map(|e| e.tags())
            .flat_map(|t| t.iter().cloned())
            .collect()
    }

    /// One entry per raw value, each keeping its line's sample rate and tags.
    pub fn unbunch(&self) -> Captured<K> {
        let mut entries = Vec::new();
        for entry in &self.entries {
            for value in &entry.values {
                entries.push(Entry {
                    values: vec![value.clone()],
                    sample_rate: entry.sample_rate,
                    tags: entry.tags.clone(),
                });
            }
        }
        Captured::new(entries)
    }
}

impl<K: Kind> Captured<K> {
    /// Select the metrics named `name` whose wire type is `K`'s, keeping
    /// their order.
    pub fn collect<'a, I>(name: &str, metrics: I) -> Captured<K>
    where
        I: IntoIterator<Item = &'a Metric>,
    {
        let kind = K::metric_type();
        Captured::new(
            metrics
                .into_iter()
                .filter(|m| m.kind == kind && m.name == name)
                .map(Entry::from)
                .collect(),
        )
    }

    /// The wire type this collection holds.
    pub fn metric_type(&self) -> MetricType {
        K::metric_type()
    }
}

impl<K: Extrema> Captured<K> {
    /// Largest point. Fails with `QueryError::EmptyRange` when there are none.
    pub fn max(&self) -> Result<f64, QueryError> {
        K::points(&self.entries)?
            .into_iter()
            .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.max(x))))
            .ok_or(QueryError::EmptyRange)
    }

    /// Smallest point. Fails with `QueryError::EmptyRange` when there are none.
    pub fn min(&self) -> Result<f64, QueryError> {
        K::points(&self.entries)?
            .into_iter()
            .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.min(x))))
            .ok_or(QueryError::EmptyRange)
    }

    /// Like `max`, answering `default` for an empty collection.
    pub fn max_or(&self, default: f64) -> Result<f64, QueryError> {
        match self.max() {
            Err(QueryError::EmptyRange) => Ok(default),
            res => res,
        }
    }

    /// Like `min`, answering `default` for an empty collection.
    pub fn min_or(&self, default: f64) -> Result<f64, QueryError> {
        match self.min() {
            Err(QueryError::EmptyRange) => Ok(default),
            res => res,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

    const KEYS: &[&str] = &["tag1", "tag2", "tag3"];
    const VALS: &[&str] = &["a", "b", "c"];

    impl Arbitrary for Entry {
        fn arbitrary<G: Gen>(g: &mut G) -> Entry {
            let value_count = g.gen_range(1, 4);
            let values: Vec<String> = (0..value_count)
                .map(|_| format!("{}", g.gen_range(-100, 100)))
                .collect();
            let sample_rate = if g.gen() {
                Some(*g.choose(&[0.1, 0.25, 0.5, 1.0, 2.0]).unwrap())
            } else {
                None
            };
            let tags = if g.gen_weighted_bool(5) {
                None
            } else {
                let mut tokens = Vec::new();
                for _ in 0..g.gen_range(0, 4) {
                    let key = *g.choose(KEYS).unwrap();
                    if g.gen_weighted_bool(4) {
                        tokens.push(key.to_string());
                    } else {
                        tokens.push(format!("{}:{}", key, g.choose(VALS).unwrap()));
                    }
                }
                Some(TagSet::parse(tokens))
            };
            Entry::new(values, sample_rate, tags)
        }
    }

    #[derive(Clone, Debug)]
    struct ArbCriteria(Criteria);

    impl Arbitrary for ArbCriteria {
        fn arbitrary<G: Gen>(g: &mut G) -> ArbCriteria {
            let mut criteria = Criteria::new();
            for _ in 0..g.gen_range(0, 3) {
                let key = *g.choose(KEYS).unwrap();
                let val = *g.choose(VALS).unwrap();
                criteria = match g.gen_range(0, 3) {
                    0 => criteria.token(key),
                    1 => criteria.token(format!("{}:{}", key, val)),
                    _ => criteria.pair(key, val),
                };
            }
            ArbCriteria(criteria)
        }
    }

    fn entry(values: &[&str], tags: &[&str]) -> Entry {
        let tags = if tags.is_empty() {
            None
        } else {
            Some(TagSet::parse(tags.to_vec()))
        };
        Entry::new(values.to_vec(), None, tags)
    }

    #[test]
    fn test_filter_partitions() {
        fn inner(entries: Vec<Entry>, criteria: ArbCriteria) -> TestResult {
            let cap: Captured<Count> = Captured::new(entries.clone());
            let yes = cap.filter(&criteria.0);
            let no = cap.filter_not(&criteria.0);
            assert_eq!(entries.len(), yes.len() + no.len());
            for e in &entries {
                let in_yes = yes.iter().any(|y| y == e);
                let in_no = no.iter().any(|n| n == e);
                assert!(in_yes || in_no);
                if e.matches(&criteria.0) {
                    assert!(in_yes);
                } else {
                    assert!(in_no);
                }
            }
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(Vec<Entry>, ArbCriteria) -> TestResult);
    }

    #[test]
    fn test_split_excludes_missing_keys() {
        fn inner(entries: Vec<Entry>, many: bool) -> TestResult {
            let cap: Captured<Count> = Captured::new(entries);
            let keys: &[&str] = if many { &["tag1", "tag2"] } else { &["tag1"] };
            for (combo, group) in cap.split_many(keys) {
                assert_eq!(keys.len(), combo.len());
                for e in group.iter() {
                    let tags = e.tags().expect("grouped entry without tags");
                    for (key, val) in keys.iter().zip(combo.iter()) {
                        assert!(tags.get(key).map_or(false, |vs| vs.contains(val)));
                    }
                }
            }
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(Vec<Entry>, bool) -> TestResult);
    }

    #[test]
    fn test_split_repeated_key() {
        let cap: Captured<Count> = Captured::new(vec![
            entry(&["1"], &["tag1:a", "tag2"]),
            entry(&["3"], &["tag1:a", "tag3"]),
            entry(&["1"], &["tag1:a", "tag1:b"]),
            entry(&["3"], &["tag1:b"]),
            entry(&["3"], &[]),
        ]);

        let split = cap.split("tag1");
        let keys: Vec<&String> = split.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(split["a"].total().unwrap(), 5.0);
        assert_eq!(split["b"].total().unwrap(), 4.0);
        assert_eq!(split["a"].len(), 3);
    }

    #[test]
    fn test_split_preserves_order() {
        let cap: Captured<Gauge> = Captured::new(vec![
            entry(&["1"], &["host:a"]),
            entry(&["2"], &["host:b"]),
            entry(&["+5"], &["host:a"]),
        ]);

        let split = cap.split("host");
        assert_eq!(split["a"].values().unwrap(), vec![1.0, 6.0]);
        assert_eq!(split["b"].last().unwrap(), 2.0);
    }

    #[test]
    fn test_split_many_cartesian() {
        let cap: Captured<Count> = Captured::new(vec![
            entry(&["1"], &["tag1:a", "tag1:b", "tag2:x", "tag2:y"]),
            entry(&["2"], &["tag1:a"]),
        ]);

        let split = cap.split_many(&["tag1", "tag2"]);
        assert_eq!(4, split.len());
        for group in split.values() {
            assert_eq!(group.total().unwrap(), 1.0);
        }
        assert!(cap.split_many::<&str>(&[]).len() <= 1);
    }

    #[test]
    fn test_tag_introspection() {
        let cap: Captured<Count> = Captured::new(vec![
            entry(&["1"], &["tag1:a", "tag2"]),
            entry(&["3"], &["tag1:a", "tag3"]),
            entry(&["1"], &["tag1:b"]),
            entry(&["1"], &[]),
        ]);

        let tags: Vec<String> = cap.tags().into_iter().collect();
        assert_eq!(tags, vec!["tag1:a", "tag1:b", "tag2", "tag3"]);
        let vals: Vec<String> = cap.tag_values("tag1").into_iter().collect();
        assert_eq!(vals, vec!["a", "b"]);
        assert!(cap.tag_values("tag2").is_empty());
    }

    #[test]
    fn test_collect_by_name_and_kind() {
        let metrics = vec![
            Metric::new("foo", MetricType::Counter).value("1"),
            Metric::new("foo", MetricType::Gauge).value("7"),
            Metric::new("bar", MetricType::Counter).value("2"),
            Metric::new("foo", MetricType::Counter).value("3").sample_rate(0.5),
        ];

        let count: Captured<Count> = Captured::collect("foo", &metrics);
        assert_eq!(2, count.len());
        assert_eq!(count.total().unwrap(), 7.0);
        let gauge: Captured<Gauge> = Captured::collect("foo", &metrics);
        assert_eq!(gauge.last().unwrap(), 7.0);
        let hist: Captured<Histogram> = Captured::collect("foo", &metrics);
        assert!(hist.is_empty());
    }

    #[test]
    fn test_non_numeric_value() {
        let cap: Captured<Histogram> = Captured::new(vec![entry(&["abc"], &[])]);
        assert_eq!(Err(QueryError::NonNumeric("abc".to_string())), cap.avg());
        assert_eq!(Err(QueryError::NonNumeric("abc".to_string())), cap.max_or(1.0));
    }

    #[test]
    fn test_parse_value_signs() {
        assert_eq!(Ok(6.0), parse_value("+6"));
        assert_eq!(Ok(-45.5), parse_value("-45.5"));
        assert!(parse_value("").is_err());
    }
}
