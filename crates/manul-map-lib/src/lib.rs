//! Manul Map Library - layer, search and data-loading core
//!
//! This library holds everything the habitat map does that is not drawing:
//! loading the three static JSON documents, turning records into plottable
//! features, keeping layer visibility consistent across every UI surface,
//! filtering features by free text and steering the viewport.
//!
//! # Architecture
//!
//! - **[`load_geo_data`]**: concurrent, all-or-nothing fetch of zoos, reserves and range
//! - **[`Scene`]**: rendered features grouped into layers, with popup markup
//! - **[`LayerVisibilityStore`]**: the single owner of per-layer visibility
//! - **[`SearchIndex`]**: normalized free-text filter over point features
//! - **[`ViewSynchronizer`]**: result selection, delayed popups and fit-all
//! - **[`MapSurface`]**: the narrow interface the widget toolkit implements
//!
//! The [`content`] and [`auth`] modules carry the two collaborators the map
//! page is wired to: dotted-path text substitution and the identity provider.

pub mod auth;
mod bounds;
pub mod content;
mod feature;
mod layers;
mod loader;
pub mod markup;
mod scene;
mod search;
mod session;
mod surface;
pub mod utils;
mod view;

// Public API exports
pub use bounds::Bounds;
pub use feature::{FeatureId, FeatureKind, GeoFeature, PointRecord, PolygonRecord, RangeDocument, RangePolygon};
pub use layers::{AggregateVisibility, FIT_PADDING, LayerName, LayerVisibilityStore, VisibilitySet};
#[cfg(not(target_arch = "wasm32"))]
pub use loader::FileFetcher;
pub use loader::{
    FetchFuture, GeoData, GeoSources, HttpFetcher, ResourceFetcher, load_geo_data, parse_json,
};
pub use scene::{DEFAULT_RANGE_NAME, Graphic, GraphicHandle, GraphicShape, LayerGroup, Scene};
pub use search::{DISPLAY_LIMIT, Debouncer, SEARCH_DEBOUNCE, SearchIndex, SearchResult, SearchState, normalize};
pub use session::{MapSession, SessionState};
pub use surface::MapSurface;
pub use view::{MIN_SELECT_ZOOM, POPUP_OPEN_DELAY, ViewSynchronizer};

/// Number of characters of an unparsable payload kept for diagnostics
pub const PARSE_SNIPPET_CHARS: usize = 120;

/// Error types for loading the map data
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("bad JSON in {url} ({reason}). First 120 chars: {snippet}")]
    Parse {
        url: String,
        reason: String,
        snippet: String,
    },
}

impl LoadError {
    /// The resource the error refers to
    pub fn url(&self) -> &str {
        match self {
            Self::Fetch { url, .. } | Self::Parse { url, .. } => url,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        let _: fn(&[GeoFeature]) -> SearchIndex = SearchIndex::build;
        let _: fn() -> LayerVisibilityStore = LayerVisibilityStore::new;
        let _: fn(GeoData) -> Scene = Scene::build;
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::Fetch {
            url: "https://example.org/data/zoos.json".into(),
            reason: "HTTP 404".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch https://example.org/data/zoos.json: HTTP 404"
        );
        assert_eq!(err.url(), "https://example.org/data/zoos.json");
    }
}
