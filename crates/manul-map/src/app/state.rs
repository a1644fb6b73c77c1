//! Application state management
//!
//! Everything the UI mutates lives here and is only touched on the UI thread.
//! Background tasks (the data load, the content load and account requests)
//! hand their results over through [`Slot`]s that are drained once per frame.

use crate::app::auth_panel::AuthPanel;
use crate::app::map_view::MapView;
use crate::app::settings::Settings;
use crate::app::storage::{Preferences, StorageBackend, default_storage_backend};
use crate::app::tiles::TileTheme;
use crate::entrypoints::async_runtime;
use manul_map_lib::content::{ContentBindings, ContentSlot, ContentStore};
use manul_map_lib::{
    GeoData, LayerVisibilityStore, LoadError, MapSession, ResourceFetcher, Scene, SearchIndex, SearchState,
    SessionState, ViewSynchronizer, load_geo_data,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Result handed from a background task to the UI thread
pub type Slot<T> = Arc<Mutex<Option<T>>>;

pub fn new_slot<T>() -> Slot<T> {
    Arc::new(Mutex::new(None))
}

/// Store a value and wake the UI
pub fn fill_slot<T>(slot: &Slot<T>, value: T, ctx: &egui::Context) {
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(value);
    }
    ctx.request_repaint();
}

pub fn take_slot<T>(slot: &Slot<T>) -> Option<T> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

/// Content paths bound to UI elements
pub fn content_bindings() -> ContentBindings {
    ContentBindings::new()
        .bind("title", ContentSlot::Text, "map.title")
        .bind("intro", ContentSlot::Markup, "map.intro")
        .bind("search", ContentSlot::Placeholder, "map.search.placeholder")
        .bind("search_empty", ContentSlot::Text, "map.search.empty")
        .bind("legend", ContentSlot::Text, "map.legend.title")
        .bind("load_failed", ContentSlot::Text, "map.error")
}

/// Main application state
pub struct AppState {
    pub session: MapSession,
    /// Empty until the data is loaded
    pub scene: Arc<Scene>,
    pub index: SearchIndex,
    pub search: SearchState,
    pub store: LayerVisibilityStore,
    pub view: ViewSynchronizer,
    pub prefs: Preferences,
    storage: Option<Box<dyn StorageBackend>>,
    pub content: ContentBindings,
    pub auth: AuthPanel,
    pub fullscreen: bool,
    load_slot: Slot<manul_map_lib::Result<GeoData>>,
    content_slot: Slot<Arc<Value>>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let storage = match default_storage_backend() {
            Ok(backend) => Some(backend),
            Err(e) => {
                tracing::warn!("Preferences will not be saved: {e}");
                None
            }
        };
        Self::with_storage(settings, storage)
    }

    pub fn with_storage(settings: &Settings, storage: Option<Box<dyn StorageBackend>>) -> Self {
        let prefs = match storage.as_deref() {
            Some(_) if settings.ignore_persisted => {
                tracing::info!("Ignoring persisted preferences (--ignore-persisted flag)");
                Preferences::default()
            }
            Some(backend) => Preferences::load(backend),
            None => Preferences::default(),
        };

        let mut store = LayerVisibilityStore::new();
        store.on_layer_toggled(|layer, visible| {
            tracing::info!(layer = layer.label(), visible, "Layer toggled");
        });

        let index = SearchIndex::default();
        Self {
            session: MapSession::new(),
            scene: Arc::new(Scene::default()),
            search: SearchState::new(&index),
            index,
            store,
            view: ViewSynchronizer::new(),
            prefs,
            storage,
            content: content_bindings(),
            auth: AuthPanel::new(settings.identity_provider()),
            fullscreen: false,
            load_slot: new_slot(),
            content_slot: new_slot(),
        }
    }

    pub fn storage(&self) -> Option<&dyn StorageBackend> {
        self.storage.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.session.state() == SessionState::Ready
    }

    /// Kick off the data and content loads
    pub fn start_loading(&mut self, settings: &Settings, ctx: &egui::Context) {
        if !self.session.begin_loading() {
            return;
        }

        let fetcher = match settings.fetcher() {
            Ok(fetcher) => fetcher,
            Err(e) => {
                self.session.complete(Err(e));
                return;
            }
        };
        tracing::info!(source = %fetcher.describe(""), "Loading map data");

        {
            let fetcher = fetcher.clone();
            let sources = settings.sources();
            let slot = self.load_slot.clone();
            let ctx = ctx.clone();
            async_runtime::spawn(async move {
                let result = load_geo_data(fetcher.as_ref(), &sources).await;
                fill_slot(&slot, result, &ctx);
            });
        }

        self.start_content_loading(fetcher, settings.content.clone(), ctx);
    }

    fn start_content_loading(&self, fetcher: Arc<dyn ResourceFetcher>, path: String, ctx: &egui::Context) {
        let slot = self.content_slot.clone();
        let ctx = ctx.clone();
        async_runtime::spawn(async move {
            let store = ContentStore::new();
            if let Some(doc) = store.load(fetcher.as_ref(), &path).await {
                fill_slot(&slot, doc, &ctx);
            }
        });
    }

    /// Drain finished background work; returns true if anything arrived
    pub fn poll_background(&mut self, map: &mut MapView) -> bool {
        let mut changed = false;

        if let Some(outcome) = take_slot(&self.load_slot) {
            changed = true;
            self.finish_loading(outcome, map);
        }

        if let Some(doc) = take_slot(&self.content_slot) {
            changed = true;
            self.content.apply(&doc);
        }

        changed | self.auth.poll()
    }

    pub(crate) fn finish_loading(&mut self, outcome: Result<GeoData, LoadError>, map: &mut MapView) {
        let Some(scene) = self.session.complete(outcome) else {
            return;
        };
        self.index = SearchIndex::build(scene.features());
        self.search = SearchState::new(&self.index);
        self.store.show_all(&scene, map);
        self.scene = Arc::new(scene);
    }

    /// Earliest pending timer (search debounce or delayed popup)
    pub fn next_deadline(&self) -> Option<instant::Instant> {
        match (self.search.deadline(), self.view.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn set_theme(&mut self, theme: TileTheme) {
        if self.prefs.theme != theme {
            tracing::debug!(theme = theme.key(), "Tile theme changed");
            self.prefs.set_theme(theme, self.storage.as_deref());
        }
    }

    pub fn toggle_search_collapsed(&mut self) {
        let collapsed = !self.prefs.search_collapsed;
        self.prefs.set_search_collapsed(collapsed, self.storage.as_deref());
    }

    pub fn toggle_ui_hidden(&mut self) {
        let hidden = !self.prefs.ui_hidden;
        self.prefs.set_ui_hidden(hidden, self.storage.as_deref());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::storage::THEME_KEY;
    use crate::app::storage::tests::MemoryStorage;
    use clap::Parser;
    use manul_map_lib::{LayerName, MapSurface, PointRecord, PolygonRecord, RangeDocument};

    fn point(name: &str, lat: f64, lng: f64) -> PointRecord {
        PointRecord {
            name: name.to_string(),
            country: "Россия".to_string(),
            region: None,
            lat,
            lng,
        }
    }

    pub(crate) fn sample_data() -> GeoData {
        GeoData {
            zoos: vec![
                point("Московский зоопарк", 55.76, 37.58),
                point("Новосибирский зоопарк", 55.06, 82.91),
                point("Зоопарк Лейпциг", 51.35, 12.37),
            ],
            reserves: vec![point("Даурский", 50.08, 115.7), point("Убсунурская котловина", 50.6, 93.0)],
            range: RangeDocument {
                polygons: vec![PolygonRecord {
                    name: None,
                    coords: vec![[40.0, 80.0], [40.0, 120.0], [55.0, 120.0], [55.0, 80.0]],
                }],
            },
        }
    }

    pub(crate) fn test_state() -> AppState {
        let settings = Settings::parse_from(["manul-map"]);
        AppState::with_storage(&settings, Some(Box::new(MemoryStorage::default())))
    }

    #[test]
    fn test_ready_builds_index_and_shows_all() {
        let mut state = test_state();
        let mut map = MapView::new();
        map.set_layer_attached(LayerName::Range, false);
        assert!(state.session.begin_loading());

        state.finish_loading(Ok(sample_data()), &mut map);
        assert!(state.is_ready());
        assert_eq!(state.index.len(), 5);
        assert_eq!(state.search.result().shown.len(), 5);
        assert!(map.attached().get(LayerName::Range));
    }

    #[test]
    fn test_failed_load_renders_nothing() {
        let mut state = test_state();
        let mut map = MapView::new();
        assert!(state.session.begin_loading());

        let slot_error = LoadError::Fetch {
            url: "data/zoos.json".into(),
            reason: "HTTP 404".into(),
        };
        state.load_slot.lock().unwrap().replace(Err(slot_error));
        assert!(state.poll_background(&mut map));

        assert_eq!(state.session.state(), SessionState::LoadFailed);
        assert!(state.scene.features().is_empty());
        assert!(state.index.is_empty());
        // Nothing left to deliver
        assert!(!state.poll_background(&mut map));
    }

    #[test]
    fn test_content_applies_to_bindings() {
        let mut state = test_state();
        let mut map = MapView::new();
        let doc = serde_json::json!({"map": {"title": "Где живёт манул"}});
        state.content_slot.lock().unwrap().replace(Arc::new(doc));
        state.poll_background(&mut map);
        assert_eq!(state.content.text("title", "Карта"), "Где живёт манул");
        assert_eq!(state.content.text("legend", "Слои"), "Слои");
    }

    #[test]
    fn test_preferences_are_written() {
        let mut state = test_state();
        state.set_theme(TileTheme::Light);
        state.toggle_ui_hidden();
        assert_eq!(state.prefs.theme, TileTheme::Light);
        assert!(state.prefs.ui_hidden);
        let storage = state.storage().unwrap();
        assert_eq!(storage.get_string(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_ignore_persisted_skips_reading() {
        let storage = MemoryStorage::default();
        storage.set_string(THEME_KEY, "relief").unwrap();
        let settings = Settings::parse_from(["manul-map", "--ignore-persisted"]);
        let state = AppState::with_storage(&settings, Some(Box::new(storage)));
        assert_eq!(state.prefs.theme, TileTheme::Dark);
    }
}
