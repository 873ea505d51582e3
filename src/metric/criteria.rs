//! Match criteria over a `TagSet`.

use std::slice::Iter;

/// A single condition on a tagset.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Criterion {
    /// The literal token, bare or keyed, must be present.
    Token(String),
    /// The value must be among the values seen under the key.
    Pair(String, String),
}

/// An ordered conjunction of `Criterion`s.
///
/// # Examples
///
/// ```
/// use statsd_capture::metric::{Criteria, Criterion};
///
/// let criteria = Criteria::new().token("tag2").pair("tag1", "a");
/// assert_eq!(2, criteria.len());
///
/// let same = Criteria::tokens(vec!["tag2"]).and(Criteria::pairs(vec![("tag1", "a")]));
/// assert_eq!(criteria, same);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Criteria {
    inner: Vec<Criterion>,
}

impl Criteria {
    /// No criteria. Matches everything, including absent tags.
    pub fn new() -> Criteria {
        Criteria::default()
    }

    /// Require a literal token.
    pub fn token<S>(mut self, token: S) -> Criteria
    where
        S: Into<String>,
    {
        self.inner.push(Criterion::Token(token.into()));
        self
    }

    /// Require `val` under `key`.
    pub fn pair<K, V>(mut self, key: K, val: V) -> Criteria
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.push(Criterion::Pair(key.into(), val.into()));
        self
    }

    /// Require every literal token of `tokens`.
    pub fn tokens<I, S>(tokens: I) -> Criteria
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tokens.into_iter().fold(Criteria::new(), |c, t| c.token(t))
    }

    /// Require every key / value of `pairs`.
    pub fn pairs<I, K, V>(pairs: I) -> Criteria
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().fold(Criteria::new(), |c, (k, v)| c.pair(k, v))
    }

    /// Conjunction of self and `other`.
    pub fn and(mut self, other: Criteria) -> Criteria {
        self.inner.extend(other.inner);
        self
    }

    /// Iterate the criteria in insertion order.
    pub fn iter(&self) -> Iter<Criterion> {
        self.inner.iter()
    }

    /// Number of criteria.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Determine if there are no criteria.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<'a> From<&'a str> for Criteria {
    fn from(token: &'a str) -> Criteria {
        Criteria::new().token(token)
    }
}

impl<'a, 'b> From<(&'a str, &'b str)> for Criteria {
    fn from(pair: (&'a str, &'b str)) -> Criteria {
        Criteria::new().pair(pair.0, pair.1)
    }
}

impl From<Criterion> for Criteria {
    fn from(criterion: Criterion) -> Criteria {
        Criteria {
            inner: vec![criterion],
        }
    }
}
