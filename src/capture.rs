//! Capture sessions and the hub that feeds them.
//!
//! A `Capture` owns the ordered log of every metric appended while it was
//! open. A `Hub` sits between the network listener and the sessions a test has
//! opened, decoding datagrams and handing each metric to every open session.
//! Both are safe to share between the listener thread and the test thread.

use aggregate::{Captured, Count, Distribution, Gauge, Histogram, Kind, Set, Timing};
use chrono::{DateTime, Utc};
use error::{ParseError, QueryError};
use metric::{Metric, MetricType};
use protocols::statsd::parse_datagram;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

struct Log {
    metrics: Vec<Arc<Metric>>,
    closed_at: Option<DateTime<Utc>>,
}

struct Inner {
    opened_at: DateTime<Utc>,
    log: Mutex<Log>,
}

/// One capture session.
///
/// Handles are cheap to clone and all point at the same log. Appends are
/// accepted until `close` is called; after that the contents are fixed and
/// every query answers the same way forever.
///
/// # Examples
///
/// ```
/// use statsd_capture::capture::Capture;
///
/// let capture = Capture::new();
/// assert!(capture.append("foo:1|c".parse().unwrap()));
/// capture.close();
/// assert!(!capture.append("foo:1|c".parse().unwrap()));
///
/// assert_eq!(capture.get_count("foo").total().unwrap(), 1.0);
/// ```
#[derive(Clone)]
pub struct Capture {
    inner: Arc<Inner>,
}

impl Default for Capture {
    fn default() -> Capture {
        Capture::new()
    }
}

impl Capture {
    /// Open a new, empty session.
    pub fn new() -> Capture {
        Capture {
            inner: Arc::new(Inner {
                opened_at: Utc::now(),
                log: Mutex::new(Log {
                    metrics: Vec::new(),
                    closed_at: None,
                }),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<Log> {
        // A panicking reader cannot leave the log half-written: pushes are the
        // only mutation.
        match self.inner.log.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append a metric. Returns false, dropping the metric, if the session is
    /// closed.
    pub fn append(&self, metric: Metric) -> bool {
        self.append_shared(Arc::new(metric))
    }

    /// Append an already shared metric.
    pub fn append_shared(&self, metric: Arc<Metric>) -> bool {
        let mut log = self.lock();
        if log.closed_at.is_some() {
            return false;
        }
        log.metrics.push(metric);
        true
    }

    /// Stop accepting metrics. Closing twice keeps the first close time.
    pub fn close(&self) {
        let mut log = self.lock();
        if log.closed_at.is_none() {
            log.closed_at = Some(Utc::now());
            debug!(
                "capture opened at {} closed with {} metrics",
                self.inner.opened_at.to_rfc3339(),
                log.metrics.len()
            );
        }
    }

    /// Determine if the session still accepts metrics.
    pub fn is_open(&self) -> bool {
        self.lock().closed_at.is_none()
    }

    /// When the session was opened.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.inner.opened_at
    }

    /// When the session was closed, if it has been.
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.lock().closed_at
    }

    /// Number of metrics captured so far.
    pub fn len(&self) -> usize {
        self.lock().metrics.len()
    }

    /// Determine if nothing was captured yet.
    pub fn is_empty(&self) -> bool {
        self.lock().metrics.is_empty()
    }

    /// Everything appended so far, in order.
    ///
    /// Later snapshots of the same session only ever extend earlier ones.
    pub fn snapshot(&self) -> Vec<Arc<Metric>> {
        self.lock().metrics.clone()
    }

    /// The distinct metric names and types seen, in order of first arrival.
    pub fn names(&self) -> Vec<(String, MetricType)> {
        let mut res: Vec<(String, MetricType)> = Vec::new();
        for m in self.snapshot() {
            if !res.iter().any(|&(ref name, kind)| kind == m.kind && *name == m.name) {
                res.push((m.name.clone(), m.kind));
            }
        }
        res
    }

    /// The entries named `name` of kind `K`, possibly none.
    pub fn get<K: Kind>(&self, name: &str) -> Captured<K> {
        let snapshot = self.snapshot();
        Captured::collect(name, snapshot.iter().map(|m| &**m))
    }

    /// The entries named `name` of kind `K`, failing if there are none.
    pub fn require<K: Kind>(&self, name: &str) -> Result<Captured<K>, QueryError> {
        let captured = self.get::<K>(name);
        if captured.is_empty() {
            Err(QueryError::NoSuchMetric {
                name: name.to_string(),
                kind: K::metric_type(),
            })
        } else {
            Ok(captured)
        }
    }

    /// The counter `name`, possibly empty.
    pub fn get_count(&self, name: &str) -> Captured<Count> {
        self.get(name)
    }

    /// The gauge `name`, possibly empty.
    pub fn get_gauge(&self, name: &str) -> Captured<Gauge> {
        self.get(name)
    }

    /// The histogram `name`, possibly empty.
    pub fn get_histogram(&self, name: &str) -> Captured<Histogram> {
        self.get(name)
    }

    /// The timing `name`, possibly empty.
    pub fn get_timing(&self, name: &str) -> Captured<Timing> {
        self.get(name)
    }

    /// The distribution `name`, possibly empty.
    pub fn get_distribution(&self, name: &str) -> Captured<Distribution> {
        self.get(name)
    }

    /// The set `name`, possibly empty.
    pub fn get_set(&self, name: &str) -> Captured<Set> {
        self.get(name)
    }

    /// The counter `name`, which must have fired at least once.
    pub fn count(&self, name: &str) -> Result<Captured<Count>, QueryError> {
        self.require(name)
    }

    /// The gauge `name`, which must have fired at least once.
    pub fn gauge(&self, name: &str) -> Result<Captured<Gauge>, QueryError> {
        self.require(name)
    }

    /// The histogram `name`, which must have fired at least once.
    pub fn histogram(&self, name: &str) -> Result<Captured<Histogram>, QueryError> {
        self.require(name)
    }

    /// The timing `name`, which must have fired at least once.
    pub fn timing(&self, name: &str) -> Result<Captured<Timing>, QueryError> {
        self.require(name)
    }

    /// The distribution `name`, which must have fired at least once.
    pub fn distribution(&self, name: &str) -> Result<Captured<Distribution>, QueryError> {
        self.require(name)
    }

    /// The set `name`, which must have fired at least once.
    pub fn set(&self, name: &str) -> Result<Captured<Set>, QueryError> {
        self.require(name)
    }
}

/// Fan-out from decoded datagrams to the open capture sessions.
///
/// Share it behind an `Arc` between the listener, which calls `ingest`, and
/// tests, which call `capture`. Closed sessions are forgotten on the next
/// ingest.
#[derive(Default)]
pub struct Hub {
    sessions: Mutex<Vec<Capture>>,
    good_lines: AtomicUsize,
    bad_lines: AtomicUsize,
}

impl Hub {
    fn sessions(&self) -> MutexGuard<Vec<Capture>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Open a new session that receives every metric ingested from now until
    /// it is closed.
    pub fn capture(&self) -> Capture {
        let capture = Capture::new();
        let mut sessions = self.sessions();
        sessions.push(capture.clone());
        debug!(
            "capture opened at {}, {} sessions registered",
            capture.opened_at().to_rfc3339(),
            sessions.len()
        );
        capture
    }

    /// Hand a metric to every open session.
    ///
    /// The session list stays locked for the whole fan-out, so every session
    /// sees metrics in the same order.
    pub fn ingest_metric(&self, metric: Metric) {
        let metric = Arc::new(metric);
        let mut sessions = self.sessions();
        sessions.retain(|s| s.is_open());
        for session in sessions.iter() {
            session.append_shared(Arc::clone(&metric));
        }
    }

    /// Decode a datagram and ingest every line that parses.
    ///
    /// Bad lines do not stop their siblings. They are logged and handed back
    /// so the caller can decide whether to surface them.
    pub fn ingest(&self, datagram: &str) -> Vec<ParseError> {
        let mut errors = Vec::new();
        for res in parse_datagram(datagram) {
            match res {
                Ok(metric) => {
                    trace!("LINE: {}", metric);
                    self.good_lines.fetch_add(1, Ordering::Relaxed);
                    self.ingest_metric(metric);
                }
                Err(e) => {
                    self.bad_lines.fetch_add(1, Ordering::Relaxed);
                    warn!("BAD LINE in {:?}: {}", datagram, e);
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// Number of sessions still registered, some possibly closed since the
    /// last ingest.
    pub fn sessions_registered(&self) -> usize {
        self.sessions().len()
    }

    /// Lines decoded successfully since the hub was made.
    pub fn good_lines(&self) -> usize {
        self.good_lines.load(Ordering::Relaxed)
    }

    /// Lines rejected since the hub was made.
    pub fn bad_lines(&self) -> usize {
        self.bad_lines.load(Ordering::Relaxed)
    }
}
