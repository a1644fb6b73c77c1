//! Walkers plugin drawing the range polygons and the point markers
//!
//! The plugin is rebuilt every frame from the shared scene. It also does the
//! work that needs the frame's projection: hit-testing clicks and locating
//! the open popup on screen. Both results go back to the app through
//! [`PluginFeedback`].

use egui::{Color32, Pos2, Stroke};
use geo::TriangulateEarcut;
use manul_map_lib::{FeatureKind, Graphic, GraphicHandle, GraphicShape, LayerName, Scene, VisibilitySet};
use std::sync::{Arc, Mutex};
use walkers::{Plugin, Projector};

/// Marker radius in points
pub const MARKER_RADIUS: f32 = 6.0;

/// Click tolerance around a marker, in points
const MARKER_HIT_RADIUS: f32 = 10.0;

/// Outcome of a click on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapClick {
    Graphic(GraphicHandle),
    Empty,
}

/// What the plugin learned while drawing
#[derive(Debug, Default)]
pub struct PluginFeedback {
    pub click: Option<MapClick>,
    /// Screen position the open popup points at
    pub popup_anchor: Option<Pos2>,
}

pub fn marker_color(kind: FeatureKind) -> Color32 {
    match kind {
        FeatureKind::Zoo => Color32::from_rgb(245, 158, 11),
        FeatureKind::Reserve => Color32::from_rgb(34, 197, 94),
    }
}

/// Plugin for rendering the scene on the map
pub struct FeaturePlugin {
    scene: Arc<Scene>,
    attached: VisibilitySet,
    popup: Option<GraphicHandle>,
    dark: bool,
    feedback: Arc<Mutex<PluginFeedback>>,
}

impl FeaturePlugin {
    pub fn new(
        scene: Arc<Scene>,
        attached: VisibilitySet,
        popup: Option<GraphicHandle>,
        dark: bool,
        feedback: Arc<Mutex<PluginFeedback>>,
    ) -> Self {
        Self {
            scene,
            attached,
            popup,
            dark,
            feedback,
        }
    }

    fn range_colors(&self) -> (Color32, Color32) {
        let line = if self.dark {
            Color32::from_rgb(255, 196, 120)
        } else {
            Color32::from_rgb(194, 65, 12)
        };
        (line, line.gamma_multiply(0.18))
    }

    fn render_polygon(&self, graphic: &Graphic, projector: &Projector, painter: &egui::Painter) {
        let GraphicShape::Polygon(polygon) = &graphic.shape else {
            return;
        };
        let project = |lat: f64, lng: f64| project_pos(projector, lat, lng);
        let (line, fill) = self.range_colors();

        // Range outlines can be concave, so the fill is triangulated
        let mut mesh = egui::Mesh::default();
        for triangle in polygon.to_geo().earcut_triangles() {
            let base = mesh.vertices.len() as u32;
            for corner in triangle.to_array() {
                mesh.colored_vertex(project(corner.y, corner.x), fill);
            }
            mesh.add_triangle(base, base + 1, base + 2);
        }
        painter.add(egui::Shape::mesh(mesh));

        let mut ring: Vec<Pos2> = polygon
            .coordinates
            .iter()
            .map(|(lat, lng)| project(*lat, *lng))
            .collect();
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }

        // Soft glow under a dashed outline
        painter.add(egui::Shape::line(ring.clone(), Stroke::new(6.0, line.gamma_multiply(0.25))));
        painter.extend(egui::Shape::dashed_line(&ring, Stroke::new(2.0, line), 8.0, 5.0));
    }

    fn render_marker(&self, graphic: &Graphic, projector: &Projector, painter: &egui::Painter) {
        let GraphicShape::Marker { kind, lat, lng, .. } = graphic.shape else {
            return;
        };
        let center = project_pos(projector, lat, lng);
        let outline = if self.dark { Color32::WHITE } else { Color32::from_gray(30) };
        painter.circle(center, MARKER_RADIUS, marker_color(kind), Stroke::new(1.5, outline));
    }

    /// Graphic under a screen position, if any
    fn hit(&self, pos: Pos2, projector: &Projector) -> Option<GraphicHandle> {
        let here = projector.unproject(pos.to_vec2());
        let edge = projector.unproject((pos + egui::vec2(MARKER_HIT_RADIUS, 0.0)).to_vec2());
        let radius_deg = (edge.x() - here.x()).abs();
        self.scene.hit_test(here.y(), here.x(), radius_deg, &self.attached)
    }
}

fn project_pos(projector: &Projector, lat: f64, lng: f64) -> Pos2 {
    projector.project(walkers::lat_lon(lat, lng)).to_pos2()
}

impl Plugin for FeaturePlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("FeaturePlugin::run");

        let painter = ui.painter();

        if self.attached.get(LayerName::Range) {
            profiling::scope!("render_range");
            for graphic in self.scene.layer(LayerName::Range).graphics() {
                self.render_polygon(graphic, projector, painter);
            }
        }

        {
            profiling::scope!("render_markers");
            // Reserves first so zoos stay on top where they overlap
            for layer in [LayerName::Reserves, LayerName::Zoos] {
                if !self.attached.get(layer) {
                    continue;
                }
                for graphic in self.scene.layer(layer).graphics() {
                    self.render_marker(graphic, projector, painter);
                }
            }
        }

        if let Some(hover) = response.hover_pos()
            && matches!(self.hit(hover, projector), Some(h) if h.layer() != LayerName::Range)
        {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        let click = if response.clicked() {
            response.interact_pointer_pos().map(|pos| match self.hit(pos, projector) {
                Some(handle) => MapClick::Graphic(handle),
                None => MapClick::Empty,
            })
        } else {
            None
        };

        let popup_anchor = self
            .popup
            .filter(|p| self.attached.get(p.layer()))
            .and_then(|p| self.scene.graphic(p))
            .and_then(Graphic::anchor)
            .map(|(lat, lng)| project_pos(projector, lat, lng));

        if let Ok(mut feedback) = self.feedback.lock() {
            if click.is_some() {
                feedback.click = click;
            }
            feedback.popup_anchor = popup_anchor;
        }
    }
}
