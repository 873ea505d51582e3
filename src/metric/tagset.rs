//! tagset is the DogStatsd `#k:v,flag,...` segment that rides along with each
//! `metric::Metric`. Think of it as a set of literal tokens with a derived
//! key / values index on the side. Identically named metrics are told apart by
//! their tags when a capture is filtered or split.

use metric::criteria::{Criteria, Criterion};
use std::collections::btree_map;
use std::collections::btree_set;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::ops::Index;

/// The set of tags attached to a metric.
///
/// A token is either `key:value` or a bare flag. Keyed tokens are split at the
/// first `:`, so `url:http://x` has key `url` and value `http://x`. Repeated
/// keys accumulate: `tag1:a,tag1:b` gives `tag1 => {a, b}`.
#[derive(Clone, Debug, Default, Eq, Serialize)]
#[serde(into = "Vec<String>")]
pub struct TagSet {
    tokens: BTreeSet<String>,
    index: BTreeMap<String, BTreeSet<String>>,
}

impl Hash for TagSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for token in &self.tokens {
            token.hash(state);
        }
    }
}

impl PartialEq for TagSet {
    fn eq(&self, other: &TagSet) -> bool {
        self.tokens == other.tokens
    }
}

impl TagSet {
    /// Build a tagset from literal tokens. Empty tokens are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::metric::TagSet;
    ///
    /// let tags = TagSet::parse(vec!["tag1:a", "tag2", "tag1:b", "tag2"]);
    ///
    /// assert_eq!(3, tags.len());
    /// assert!(tags.contains("tag2"));
    /// assert!(!tags.contains("tag1"));
    /// assert_eq!(2, tags.get("tag1").unwrap().len());
    /// assert!(tags.get("tag2").is_none());
    /// ```
    pub fn parse<I, S>(tokens: I) -> TagSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags = TagSet::default();
        for token in tokens {
            tags.insert(token);
        }
        tags
    }

    /// Insert a literal token, updating the key index when it is keyed.
    ///
    /// Returns false if the token was empty or already present.
    pub fn insert<S>(&mut self, token: S) -> bool
    where
        S: Into<String>,
    {
        let token = token.into();
        if token.is_empty() || self.tokens.contains(&token) {
            return false;
        }
        if let Some(colon_idx) = token.find(':') {
            let key = &token[..colon_idx];
            let val = &token[(colon_idx + 1)..];
            self.index
                .entry(key.to_string())
                .or_insert_with(BTreeSet::new)
                .insert(val.to_string());
        }
        self.tokens.insert(token)
    }

    /// Exact literal membership. A bare `tag2` does not match `tag2:x`.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// The values seen under `key`, or `None` if the key never appeared.
    pub fn get(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.index.get(key)
    }

    /// Keys of the derived index, in sorted order.
    pub fn keys(&self) -> btree_map::Keys<String, BTreeSet<String>> {
        self.index.keys()
    }

    /// Value sets of the derived index, in key order.
    pub fn values(&self) -> btree_map::Values<String, BTreeSet<String>> {
        self.index.values()
    }

    /// Key / value-set pairs of the derived index.
    pub fn items(&self) -> btree_map::Iter<String, BTreeSet<String>> {
        self.index.iter()
    }

    /// The literal tokens, deduplicated and sorted.
    pub fn iter(&self) -> btree_set::Iter<String> {
        self.tokens.iter()
    }

    /// Number of distinct literal tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Determine if the tagset has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Determine if every criterion holds for this tagset.
    ///
    /// A token criterion needs that literal token to be present. A pair
    /// criterion needs its value among the values under its key. No criteria
    /// at all always matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use statsd_capture::metric::{Criteria, TagSet};
    ///
    /// let tags = TagSet::parse(vec!["tag1:a", "tag2", "tag3:b", "tag1:b"]);
    ///
    /// assert!(tags.matches(&Criteria::new()));
    /// assert!(tags.matches(&Criteria::new().token("tag2").pair("tag1", "a")));
    /// assert!(!tags.matches(&Criteria::from("tag4")));
    /// assert!(!tags.matches(&Criteria::from("tag1:c")));
    /// ```
    pub fn matches(&self, criteria: &Criteria) -> bool {
        criteria.iter().all(|criterion| match *criterion {
            Criterion::Token(ref token) => self.contains(token),
            Criterion::Pair(ref key, ref val) => {
                self.get(key).map_or(false, |vals| vals.contains(val))
            }
        })
    }
}

/// Match an optional tagset. Absent tags only satisfy empty criteria.
pub fn matches(tags: Option<&TagSet>, criteria: &Criteria) -> bool {
    match tags {
        Some(tags) => tags.matches(criteria),
        None => criteria.is_empty(),
    }
}

impl<'a> Index<&'a str> for TagSet {
    type Output = BTreeSet<String>;

    /// Panics if `key` never appeared; use `get` to probe.
    fn index(&self, key: &'a str) -> &BTreeSet<String> {
        match self.index.get(key) {
            Some(vals) => vals,
            None => panic!("no tag key {:?} in tagset", key),
        }
    }
}

impl From<TagSet> for Vec<String> {
    fn from(tags: TagSet) -> Vec<String> {
        tags.tokens.into_iter().collect()
    }
}

impl<S> FromIterator<S> for TagSet
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> TagSet {
        TagSet::parse(iter)
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
