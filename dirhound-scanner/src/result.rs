use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::time::Duration;

/// A path waiting to be probed. Depth 0 comes from the wordlist, deeper
/// candidates were discovered by crawling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub depth: usize,
}

impl Candidate {
    pub fn new(path: impl Into<String>, depth: usize) -> Self {
        Self {
            path: path.into(),
            depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub url: String,
    pub status_code: u16,
    #[serde(rename = "response_time", serialize_with = "as_secs_f64")]
    pub elapsed: Duration,
    pub content_length: u64,
    pub content_type: Option<String>,
}

fn as_secs_f64<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Matched probes keyed by `(url, status_code)`, kept in completion order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    keys: HashSet<(String, u16)>,
    entries: Vec<ProbeResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an entry with the same url and status is already present.
    pub fn insert(&mut self, result: ProbeResult) -> bool {
        if !self.keys.insert((result.url.clone(), result.status_code)) {
            return false;
        }
        self.entries.push(result);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProbeResult> {
        self.entries.iter()
    }

    /// Results ordered by url, then status code.
    pub fn sorted(&self) -> Vec<&ProbeResult> {
        let mut sorted: Vec<&ProbeResult> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.url.cmp(&b.url).then(a.status_code.cmp(&b.status_code)));
        sorted
    }

    pub fn count_in(&self, range: std::ops::RangeInclusive<u16>) -> usize {
        self.entries
            .iter()
            .filter(|r| range.contains(&r.status_code))
            .count()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ProbeResult;
    type IntoIter = std::slice::Iter<'a, ProbeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
