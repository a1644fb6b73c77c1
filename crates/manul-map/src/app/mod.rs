//! Application module
//!
//! - Full-screen map with the range polygons and point markers
//! - Top bar with counts, show/hide-all, tile theme and account
//! - Collapsible search panel with layer chips and the result list
//! - Legend overlay bound to the same layer store as the chips
//! - One blocking notice when the data cannot be loaded

mod auth_panel;
mod map_view;
mod plugin;
pub(crate) mod settings;
mod state;
mod storage;
mod tiles;
mod ui_panels;

use crate::app::map_view::MapView;
use crate::app::plugin::{FeaturePlugin, MapClick, PluginFeedback};
use crate::app::settings::Settings;
use crate::app::state::AppState;
use crate::app::tiles::ThemeTiles;
use eframe::egui;
use manul_map_lib::MapSurface;
use std::sync::{Arc, Mutex};
use walkers::Map;

/// Main application structure
pub struct ManulMapApp {
    state: AppState,

    /// One tile cache per theme
    tiles: ThemeTiles,

    /// Camera, attached layers and open popup
    map: MapView,

    /// Click and popup anchor reported by the plugin each frame
    feedback: Arc<Mutex<PluginFeedback>>,
}

impl ManulMapApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::from_cli();
        let mut state = AppState::new(&settings);
        state.start_loading(&settings, &cc.egui_ctx);

        Self {
            state,
            tiles: ThemeTiles::new(&cc.egui_ctx),
            map: MapView::new(),
            feedback: Arc::new(Mutex::new(PluginFeedback::default())),
        }
    }

    fn take_feedback(&self) -> (Option<MapClick>, Option<egui::Pos2>) {
        match self.feedback.lock() {
            Ok(mut feedback) => (feedback.click.take(), feedback.popup_anchor),
            Err(_) => (None, None),
        }
    }

    fn handle_click(&mut self, click: MapClick) {
        match click {
            MapClick::Graphic(handle) => {
                tracing::debug!(layer = handle.layer().key(), "Opened popup from map click");
                self.map.open_popup(handle);
            }
            MapClick::Empty => self.map.close_popup(),
        }
    }
}

#[profiling::all_functions]
impl eframe::App for ManulMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = instant::Instant::now();

        self.state.poll_background(&mut self.map);
        if self.state.is_ready() {
            self.state.search.poll(now, &self.state.index);
            self.state.view.poll(now, &self.state.store, &mut self.map);
        }

        ctx.input(|i| {
            if i.key_pressed(egui::Key::Escape) {
                self.map.close_popup();
            }
        });

        let show_panels = self.state.is_ready() && !self.state.prefs.ui_hidden;
        if show_panels {
            ui_panels::top_bar(ctx, &mut self.state, &mut self.map);
            ui_panels::search_panel(ctx, &mut self.state, &mut self.map);
        }

        let theme = self.state.prefs.theme;
        let attached = self.map.attached();
        let open_popup = self.map.popup();
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let tiles = self.tiles.get_mut(theme);
                let mut map = Map::new(
                    Some(tiles),
                    &mut self.map.memory,
                    walkers::lat_lon(map_view::INITIAL_CENTER.0, map_view::INITIAL_CENTER.1),
                );
                // Nothing is drawn over the tiles unless the data loaded
                if self.state.is_ready() {
                    map = map.with_plugin(FeaturePlugin::new(
                        self.state.scene.clone(),
                        attached,
                        open_popup,
                        theme.is_dark(),
                        self.feedback.clone(),
                    ));
                }
                let response = ui.add(map);
                self.map.set_viewport(response.rect.size());
                self.map.clamp_zoom();

                ui_panels::attribution(ui, theme);
                if self.state.is_ready() {
                    if self.state.prefs.ui_hidden {
                        ui_panels::show_ui_button(ui, &mut self.state);
                    } else {
                        ui_panels::legend(ui, &mut self.state, &mut self.map);
                    }
                }
            });

        let (click, anchor) = self.take_feedback();
        if let Some(click) = click {
            self.handle_click(click);
        }
        match anchor {
            Some(anchor) => ui_panels::popup(ctx, &self.state.scene, &mut self.map, anchor),
            // Opened this frame; the plugin places it on the next one
            None if self.map.popup().is_some() => ctx.request_repaint(),
            None => {}
        }

        ui_panels::failure_notice(ctx, &self.state);
        self.state.auth.window(ctx);

        // Wake up for the search debounce and the delayed popup
        if let Some(deadline) = self.state.next_deadline() {
            let now = instant::Instant::now();
            let wait = if deadline > now {
                deadline - now
            } else {
                std::time::Duration::ZERO
            };
            ctx.request_repaint_after(wait);
        }
    }
}
