use crate::algorithms::{auto_layout, picking, placement};
use crate::config::EditorConfig;
use crate::layout::{LayoutState, NodeLayout};
use crate::model::{Genogram, Point};
use std::collections::HashMap;

/// Spatial queries over the layout state, parameterised by grid and hit slack.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutEngine {
    pub grid_size: f64,
    pub hit_tolerance: f64,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        LayoutEngine::from_config(&EditorConfig::default())
    }
}

impl LayoutEngine {
    pub fn from_config(config: &EditorConfig) -> Self {
        LayoutEngine { grid_size: config.grid_size, hit_tolerance: config.hit_tolerance }
    }

    pub fn snap_to_grid(&self, p: Point) -> Point {
        placement::snap_to_grid(p, self.grid_size)
    }

    pub fn find_non_colliding_position(&self, candidate: Point, original: Point, nodes: &HashMap<String, NodeLayout>) -> Point {
        placement::find_non_colliding_position(candidate, original, nodes, self.grid_size)
    }

    /// Snaps when the canvas asks for it, then resolves exact overlaps.
    pub fn place_new_node(&self, layout: &LayoutState, click: Point) -> Point {
        let candidate = if layout.canvas.grid_snap { self.snap_to_grid(click) } else { click };
        self.find_non_colliding_position(candidate, click, &layout.nodes)
    }

    pub fn find_node_at_point(&self, layout: &LayoutState, g: &Genogram, p: Point) -> Option<String> {
        picking::find_node_at_point(layout, g, p, self.hit_tolerance)
    }

    pub fn find_nodes_in_rect(&self, layout: &LayoutState, g: &Genogram, a: Point, b: Point) -> Vec<String> {
        picking::find_nodes_in_rect(layout, g, a, b)
    }

    pub fn find_text_at_point(&self, layout: &LayoutState, g: &Genogram, p: Point) -> Option<String> {
        picking::find_text_at_point(layout, g, p)
    }

    pub fn find_connection_at_point(&self, layout: &LayoutState, g: &Genogram, p: Point) -> Option<String> {
        picking::find_connection_at_point(layout, g, p, self.hit_tolerance)
    }

    pub fn auto_layout_by_generation(&self, g: &Genogram, layout: &LayoutState, origin: Point) -> Vec<(String, Point)> {
        auto_layout::auto_layout_by_generation(g, layout, origin)
    }
}
