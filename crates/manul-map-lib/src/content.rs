//! Editable page content
//!
//! Labels and captions can be overridden from a JSON document. A UI element
//! is bound to a dotted path (`map.legend.title`, `faq.items.0.question`)
//! and receives the value found there, if any.

use crate::loader::{ResourceFetcher, parse_json};
use crate::markup::Markup;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Default location of the content document
pub const DEFAULT_CONTENT_PATH: &str = "data/site.json";

/// Look up a dotted path; numeric segments index arrays
///
/// Empty segments are ignored, and an empty path finds nothing.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.').filter(|s| !s.is_empty()).peekable();
    segments.peek()?;

    let mut current = doc;
    for segment in segments {
        current = match current {
            Value::Array(items) if segment.bytes().all(|b| b.is_ascii_digit()) => {
                items.get(segment.parse::<usize>().ok()?)?
            }
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Text form of a looked-up value; `null` counts as missing
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Loads the content document once and keeps it for the session
#[derive(Debug, Default)]
pub struct ContentStore {
    cached: OnceLock<Arc<Value>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The document, fetching it on first use
    ///
    /// Failures are logged and give `None`; only a successful load is
    /// cached, so a later call fetches again.
    pub async fn load(&self, fetcher: &dyn ResourceFetcher, path: &str) -> Option<Arc<Value>> {
        if let Some(doc) = self.cached.get() {
            return Some(doc.clone());
        }

        let loaded = match fetcher.fetch(path).await {
            Ok(text) => parse_json::<Value>(&fetcher.describe(path), &text),
            Err(err) => Err(err),
        };
        match loaded {
            Ok(doc) => {
                tracing::info!(path, "Loaded page content");
                Some(self.cached.get_or_init(|| Arc::new(doc)).clone())
            }
            Err(err) => {
                tracing::warn!("Page content unavailable: {err}");
                None
            }
        }
    }

    pub fn get(&self) -> Option<Arc<Value>> {
        self.cached.get().cloned()
    }
}

/// How a bound element receives its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSlot {
    /// Plain text, shown as is
    Text,
    /// Markup subset, rendered with formatting
    Markup,
    /// Hint text of an input field
    Placeholder,
}

#[derive(Debug, Clone)]
struct Binding {
    slot: ContentSlot,
    path: String,
}

/// Element ids bound to content paths, with the values applied so far
#[derive(Debug, Clone, Default)]
pub struct ContentBindings {
    bindings: HashMap<String, Binding>,
    values: HashMap<String, String>,
}

impl ContentBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, element: &str, slot: ContentSlot, path: &str) -> Self {
        self.bindings.insert(
            element.to_string(),
            Binding {
                slot,
                path: path.to_string(),
            },
        );
        self
    }

    /// Fill every binding whose path resolves in `doc`
    ///
    /// Missing paths leave the element unchanged. Returns the number of
    /// elements that received a value.
    pub fn apply(&mut self, doc: &Value) -> usize {
        let mut applied = 0;
        for (element, binding) in &self.bindings {
            if let Some(text) = lookup(doc, &binding.path).and_then(value_text) {
                self.values.insert(element.clone(), text);
                applied += 1;
            }
        }
        tracing::debug!(applied, bound = self.bindings.len(), "Applied page content");
        applied
    }

    /// Text for a text or placeholder slot, or `fallback`
    pub fn text<'a>(&'a self, element: &str, fallback: &'a str) -> &'a str {
        match self.bindings.get(element) {
            Some(Binding {
                slot: ContentSlot::Text | ContentSlot::Placeholder,
                ..
            }) => self.values.get(element).map(String::as_str).unwrap_or(fallback),
            _ => fallback,
        }
    }

    /// Markup for a markup slot, if content provided one
    pub fn markup(&self, element: &str) -> Option<Markup> {
        match self.bindings.get(element) {
            Some(Binding {
                slot: ContentSlot::Markup,
                ..
            }) => self.values.get(element).map(|v| Markup::trusted(v.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::FakeFetcher;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "map": {
                "title": "Где живёт манул",
                "intro": "<b>Манул</b> живёт в степях",
                "search": { "placeholder": "Поиск…" },
                "count": 3,
                "missing": null
            },
            "faq": { "items": [ { "q": "Кто такой манул?" }, { "q": "Где он живёт?" } ] }
        })
    }

    #[test]
    fn test_lookup_paths() {
        let doc = doc();
        assert_eq!(lookup(&doc, "map.title"), Some(&json!("Где живёт манул")));
        assert_eq!(lookup(&doc, "faq.items.1.q"), Some(&json!("Где он живёт?")));
        assert_eq!(lookup(&doc, "map..title"), Some(&json!("Где живёт манул")));
        assert_eq!(lookup(&doc, "faq.items.7.q"), None);
        assert_eq!(lookup(&doc, "map.title.deeper"), None);
        assert_eq!(lookup(&doc, ""), None);
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!(3)), Some("3".to_string()));
        assert_eq!(value_text(&json!(true)), Some("true".to_string()));
        assert_eq!(value_text(&Value::Null), None);
    }

    #[test]
    fn test_apply_bindings() {
        let mut bindings = ContentBindings::new()
            .bind("title", ContentSlot::Text, "map.title")
            .bind("intro", ContentSlot::Markup, "map.intro")
            .bind("search", ContentSlot::Placeholder, "map.search.placeholder")
            .bind("gone", ContentSlot::Text, "map.missing")
            .bind("absent", ContentSlot::Text, "nowhere.at.all");

        assert_eq!(bindings.apply(&doc()), 3);
        assert_eq!(bindings.text("title", "Карта"), "Где живёт манул");
        assert_eq!(bindings.text("search", "Поиск"), "Поиск…");
        assert_eq!(bindings.text("gone", "keep"), "keep");
        assert_eq!(bindings.text("absent", "keep"), "keep");
        assert_eq!(bindings.text("intro", "plain"), "plain");
        let intro = bindings.markup("intro").unwrap();
        assert_eq!(intro.plain_text(), "Манул живёт в степях");
        assert!(bindings.markup("title").is_none());
    }

    #[tokio::test]
    async fn test_store_caches_success_only() {
        let store = ContentStore::new();
        let failing = FakeFetcher::default();
        assert!(store.load(&failing, DEFAULT_CONTENT_PATH).await.is_none());
        assert!(store.get().is_none());

        let fetcher = FakeFetcher::default().with(DEFAULT_CONTENT_PATH, r#"{"map": {"title": "t"}}"#);
        let first = store.load(&fetcher, DEFAULT_CONTENT_PATH).await.unwrap();
        let second = store.load(&fetcher, DEFAULT_CONTENT_PATH).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.requested.lock().unwrap().len(), 1);
    }
}
