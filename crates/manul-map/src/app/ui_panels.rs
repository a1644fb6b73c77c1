//! UI panels for the application
//!
//! The top bar, the search side panel, the legend overlay, the popup bubble
//! and the failure notice. Every layer control goes through the one
//! [`LayerVisibilityStore`](manul_map_lib::LayerVisibilityStore) so chips,
//! legend and map attachment can never disagree.

use crate::app::map_view::MapView;
use crate::app::plugin::marker_color;
use crate::app::state::AppState;
use crate::app::tiles::TileTheme;
use egui::text::LayoutJob;
use egui::{Color32, FontId, RichText, TextFormat, Ui};
use manul_map_lib::markup::{Fragment, Markup};
use manul_map_lib::{FeatureId, FeatureKind, LayerName, MapSurface, Scene};

const RANGE_COLOR: Color32 = Color32::from_rgb(249, 115, 22);

fn layer_color(layer: LayerName) -> Color32 {
    match layer {
        LayerName::Zoos => marker_color(FeatureKind::Zoo),
        LayerName::Reserves => marker_color(FeatureKind::Reserve),
        LayerName::Range => RANGE_COLOR,
    }
}

/// Lay out popup markup with bold and small runs
pub fn markup_job(markup: &Markup, text_color: Color32, strong_color: Color32) -> LayoutJob {
    let mut job = LayoutJob::default();
    for fragment in markup.fragments() {
        match fragment {
            Fragment::Text { text, bold, small } => {
                let format = TextFormat {
                    font_id: FontId::proportional(if small { 12.0 } else { 14.5 }),
                    color: if bold { strong_color } else { text_color },
                    ..Default::default()
                };
                job.append(&text, 0.0, format);
            }
            Fragment::LineBreak => job.append("\n", 0.0, TextFormat::default()),
        }
    }
    job
}

/// Title, counts and the global actions
pub fn top_bar(ctx: &egui::Context, state: &mut AppState, map: &mut MapView) {
    egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
        ui.horizontal_wrapped(|ui| {
            ui.heading(state.content.text("title", "Карта манула"));

            if state.is_ready() {
                ui.separator();
                ui.label(format!(
                    "{}: {} · {}: {}",
                    LayerName::Zoos.label(),
                    state.scene.count(FeatureKind::Zoo),
                    LayerName::Reserves.label(),
                    state.scene.count(FeatureKind::Reserve)
                ));
                ui.separator();

                let label = state.store.aggregate().toggle_label();
                if ui.button(format!("🎯 {label}")).clicked() {
                    let scene = state.scene.clone();
                    state.view.fit_all(&scene, &mut state.store, map);
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                state.auth.header_ui(ui);
                ui.separator();

                let fullscreen_icon = if state.fullscreen { "🗗" } else { "⛶" };
                if ui.button(fullscreen_icon).on_hover_text("Полный экран").clicked() {
                    state.fullscreen = !state.fullscreen;
                    ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(state.fullscreen));
                }
                if ui.button("👁").on_hover_text("Скрыть панели").clicked() {
                    state.toggle_ui_hidden();
                }

                let mut theme = state.prefs.theme;
                egui::ComboBox::from_id_salt("tile_theme")
                    .selected_text(theme.label())
                    .show_ui(ui, |ui| {
                        for option in TileTheme::ALL {
                            ui.selectable_value(&mut theme, option, option.label());
                        }
                    });
                state.set_theme(theme);
            });
        });
    });
}

/// One chip per layer
fn layer_chips(ui: &mut Ui, state: &mut AppState, map: &mut MapView) {
    ui.horizontal_wrapped(|ui| {
        for layer in LayerName::ALL {
            let visible = state.store.is_visible(layer);
            let text = RichText::new(format!("● {}", layer.label())).color(if visible {
                layer_color(layer)
            } else {
                ui.visuals().weak_text_color()
            });
            if ui.selectable_label(visible, text).clicked() {
                state.store.toggle(layer, map);
            }
        }
    });
}

/// Search box with its result list; collapsible
pub fn search_panel(ctx: &egui::Context, state: &mut AppState, map: &mut MapView) {
    if !state.is_ready() {
        return;
    }

    if state.prefs.search_collapsed {
        egui::SidePanel::left("search_panel_collapsed")
            .resizable(false)
            .exact_width(36.0)
            .show(ctx, |ui| {
                if ui.button("🔍").on_hover_text("Показать поиск").clicked() {
                    state.toggle_search_collapsed();
                }
            });
        return;
    }

    egui::SidePanel::left("search_panel")
        .default_width(320.0)
        .min_width(260.0)
        .max_width(460.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Поиск");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("◀").on_hover_text("Свернуть").clicked() {
                        state.toggle_search_collapsed();
                    }
                });
            });

            if let Some(intro) = state.content.markup("intro") {
                let visuals = ui.visuals();
                let job = markup_job(&intro, visuals.text_color(), visuals.strong_text_color());
                ui.label(job);
            }

            layer_chips(ui, state, map);
            ui.separator();

            ui.horizontal(|ui| {
                let placeholder = state.content.text("search", "Название, страна или регион").to_string();
                let response = ui.add(
                    egui::TextEdit::singleline(&mut state.search.input)
                        .hint_text(placeholder)
                        .desired_width(ui.available_width() - 32.0),
                );
                if response.changed() {
                    state.search.input_changed(instant::Instant::now());
                }
                if ui.small_button("✕").on_hover_text("Очистить").clicked() {
                    state.search.clear(&state.index);
                }
            });

            let selected = results_list(ui, state);
            if let Some(id) = selected {
                let scene = state.scene.clone();
                state
                    .view
                    .select_result(id, &scene, &mut state.store, map, instant::Instant::now());
            }
        });
}

/// Returns the feature the user picked
fn results_list(ui: &mut Ui, state: &AppState) -> Option<FeatureId> {
    profiling::scope!("results_list");

    let result = state.search.result();
    let mut selected = None;

    if result.total == 0 {
        ui.weak(state.content.text("search_empty", "Ничего не найдено"));
        return None;
    }
    if let Some(hint) = result.hint() {
        ui.weak(hint);
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for id in &result.shown {
                let Some(feature) = state.scene.feature(*id) else {
                    continue;
                };
                let response = ui
                    .horizontal(|ui| {
                        ui.label(
                            RichText::new(feature.kind.badge())
                                .small()
                                .color(marker_color(feature.kind)),
                        );
                        ui.vertical(|ui| {
                            ui.label(RichText::new(&feature.name).strong());
                            ui.weak(feature.location_line());
                        });
                    })
                    .response
                    .interact(egui::Sense::click());
                if response.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }
                if response.clicked() {
                    selected = Some(*id);
                }
                ui.separator();
            }
        });
    selected
}

/// Legend overlaid on the bottom-left corner of the map
pub fn legend(ui: &mut Ui, state: &mut AppState, map: &mut MapView) {
    let rect = ui.max_rect();
    egui::Area::new(egui::Id::new("legend"))
        .fixed_pos(rect.left_bottom() + egui::vec2(10.0, -10.0))
        .pivot(egui::Align2::LEFT_BOTTOM)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.strong(state.content.text("legend", "Слои"));
                for layer in LayerName::ALL {
                    let mut visible = state.store.is_visible(layer);
                    ui.horizontal(|ui| {
                        let (dot, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                        ui.painter().circle_filled(dot.center(), 5.0, layer_color(layer));
                        if ui.checkbox(&mut visible, layer.label()).changed() {
                            state.store.set_visible(layer, visible, map);
                        }
                    });
                }
            });
        });
}

/// Small button that brings the panels back
pub fn show_ui_button(ui: &mut Ui, state: &mut AppState) {
    let rect = ui.max_rect();
    egui::Area::new(egui::Id::new("show_ui"))
        .fixed_pos(rect.right_top() + egui::vec2(-10.0, 10.0))
        .pivot(egui::Align2::RIGHT_TOP)
        .show(ui.ctx(), |ui| {
            if ui.button("👁 Показать панели").clicked() {
                state.toggle_ui_hidden();
            }
        });
}

/// Popup bubble above a feature
pub fn popup(ctx: &egui::Context, scene: &Scene, map: &mut MapView, anchor: egui::Pos2) {
    let Some(graphic) = map.popup().and_then(|p| scene.graphic(p)) else {
        return;
    };
    let mut close = false;
    egui::Area::new(egui::Id::new("feature_popup"))
        .fixed_pos(anchor - egui::vec2(0.0, 12.0))
        .pivot(egui::Align2::CENTER_BOTTOM)
        .order(egui::Order::Foreground)
        .constrain(true)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(260.0);
                ui.horizontal_top(|ui| {
                    let visuals = ui.visuals();
                    let job = markup_job(&graphic.popup, visuals.text_color(), visuals.strong_text_color());
                    ui.label(job);
                    close = ui.small_button("✕").clicked();
                });
            });
        });
    if close {
        map.close_popup();
    }
}

/// Blocking notice after a failed load
pub fn failure_notice(ctx: &egui::Context, state: &AppState) {
    let Some(error) = state.session.failure() else {
        return;
    };
    egui::Modal::new(egui::Id::new("load_failed")).show(ctx, |ui| {
        ui.set_max_width(420.0);
        ui.heading("⚠ Не удалось загрузить карту");
        ui.add_space(6.0);
        ui.label(state.content.text(
            "load_failed",
            "Данные карты недоступны. Обновите страницу или попробуйте позже.",
        ));
        ui.add_space(6.0);
        ui.collapsing("Подробности", |ui| {
            ui.monospace(error.to_string());
        });
    });
}

/// Tile attribution along the bottom edge of the map
pub fn attribution(ui: &mut Ui, theme: TileTheme) {
    let attribution = theme.attribution();
    let rect = ui.max_rect();
    let color = if theme.is_dark() {
        Color32::from_white_alpha(180)
    } else {
        Color32::from_black_alpha(180)
    };
    ui.painter().text(
        rect.right_bottom() + egui::vec2(-6.0, -4.0),
        egui::Align2::RIGHT_BOTTOM,
        attribution.text,
        FontId::proportional(10.0),
        color,
    );
}
