//! Search index and filter over point features

use crate::feature::{FeatureId, GeoFeature};
use instant::Instant;
use std::time::Duration;

/// Maximum number of results listed at once
pub const DISPLAY_LIMIT: usize = 80;

/// Quiet period after the last keystroke before the query is evaluated
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(120);

/// Lowercase, collapse whitespace runs to one space and trim
///
/// Applying it twice gives the same result as applying it once.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flat index of every point feature, in load order
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<(FeatureId, String)>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SearchIndex {
    pub fn build(features: &[GeoFeature]) -> Self {
        Self {
            entries: features
                .iter()
                .map(|f| (f.id, normalize(&f.search_text())))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Features whose normalized text contains the normalized query
    ///
    /// The empty query matches everything. At most [`DISPLAY_LIMIT`] ids are
    /// returned, the true number of matches is kept in `total`.
    pub fn filter(&self, query: &str) -> SearchResult {
        #[cfg(feature = "profiling")]
        profiling::scope!("search::filter");

        let query = normalize(query);
        let mut shown = Vec::new();
        let mut total = 0;
        for (id, text) in &self.entries {
            if query.is_empty() || text.contains(&query) {
                total += 1;
                if shown.len() < DISPLAY_LIMIT {
                    shown.push(*id);
                }
            }
        }
        SearchResult { query, shown, total }
    }
}

/// Outcome of one filter pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// The normalized query
    pub query: String,
    pub shown: Vec<FeatureId>,
    pub total: usize,
}

impl SearchResult {
    pub fn omitted(&self) -> usize {
        self.total - self.shown.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.omitted() > 0
    }

    /// Hint shown under a truncated list
    pub fn hint(&self) -> Option<String> {
        self.is_truncated().then(|| {
            format!(
                "Показано {} из {}. Уточните запрос.",
                self.shown.len(),
                self.total
            )
        })
    }
}

/// Fires once after input has been quiet for a fixed delay
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Re-arm the timer from `now`
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True exactly once when the deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Search box state: raw input, debounce timer and the settled result
#[derive(Debug, Clone)]
pub struct SearchState {
    pub input: String,
    debouncer: Debouncer,
    result: SearchResult,
}

impl SearchState {
    /// Start with the full list for `index`
    pub fn new(index: &SearchIndex) -> Self {
        Self {
            input: String::new(),
            debouncer: Debouncer::new(SEARCH_DEBOUNCE),
            result: index.filter(""),
        }
    }

    /// Call after each edit of `input`
    pub fn input_changed(&mut self, now: Instant) {
        self.debouncer.trigger(now);
    }

    /// Evaluate the query once the debounce settles
    ///
    /// Returns true when the result was recomputed.
    pub fn poll(&mut self, now: Instant, index: &SearchIndex) -> bool {
        if self.debouncer.poll(now) {
            self.result = index.filter(&self.input);
            tracing::trace!(
                query = %self.result.query,
                total = self.result.total,
                "Search filtered"
            );
            true
        } else {
            false
        }
    }

    /// Reset the query and show the full list without waiting
    pub fn clear(&mut self, index: &SearchIndex) {
        self.input.clear();
        self.debouncer.cancel();
        self.result = index.filter("");
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }
}
