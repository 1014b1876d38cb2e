use crate::model::{Genogram, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_GRID_SIZE: f64 = 20.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasState {
    pub zoom: f64,
    pub offset: Point,
    pub grid_snap: bool,
    pub grid_size: f64,
    pub background_color: String,
}

impl Default for CanvasState {
    fn default() -> Self {
        CanvasState {
            zoom: 1.0,
            offset: Point::default(),
            grid_snap: true,
            grid_size: DEFAULT_GRID_SIZE,
            background_color: "#FFFFFF".to_string(),
        }
    }
}

impl CanvasState {
    pub fn screen_to_canvas(&self, p: Point) -> Point {
        Point { x: (p.x - self.offset.x) / self.zoom, y: (p.y - self.offset.y) / self.zoom }
    }

    pub fn canvas_to_screen(&self, p: Point) -> Point {
        Point { x: p.x * self.zoom + self.offset.x, y: p.y * self.zoom + self.offset.y }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLayout {
    pub position: Point,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "visible_default")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeLayout {
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayout {
    pub position: Point,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

fn visible_default() -> bool {
    true
}

impl NodeLayout {
    pub fn at(position: Point, z_index: i32) -> Self {
        NodeLayout { position, z_index, selected: false, visible: true, locked: false }
    }
}

impl EdgeLayout {
    pub fn with_z(z_index: i32) -> Self {
        EdgeLayout { z_index, selected: false, visible: true }
    }
}

impl TextLayout {
    pub fn at(position: Point, z_index: i32) -> Self {
        TextLayout { position, z_index, selected: false, visible: true }
    }
}

/// Ids of selected items, each list sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selection {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
    pub texts: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.texts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len() + self.texts.len()
    }

    pub fn nodes(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Selection { nodes: ids.into_iter().map(Into::into).collect(), ..Selection::default() }
    }
}

/// Renderer-facing runtime state, parallel to the genogram.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutState {
    pub canvas: CanvasState,
    pub nodes: HashMap<String, NodeLayout>,
    pub edges: HashMap<String, EdgeLayout>,
    pub texts: HashMap<String, TextLayout>,
}

impl LayoutState {
    pub fn new() -> Self {
        LayoutState::default()
    }

    /// Rebuilds layout entries from domain positions, keeping any entry in
    /// `saved` for ids that still exist. New z-indices follow `order`.
    pub fn reconstruct(g: &Genogram, saved: &LayoutState) -> LayoutState {
        let mut out = LayoutState { canvas: saved.canvas.clone(), ..LayoutState::default() };
        let mut subject_ids: Vec<&String> = g.subjects.keys().collect();
        subject_ids.sort();
        for id in subject_ids {
            let entry = match saved.nodes.get(id) {
                Some(n) => n.clone(),
                None => {
                    let z = out.next_z_index();
                    NodeLayout::at(g.subjects[id].layout.center, z)
                }
            };
            out.nodes.insert(id.clone(), entry);
        }
        let mut connection_ids: Vec<&String> = g.connections.keys().collect();
        connection_ids.sort();
        for id in connection_ids {
            let entry = match saved.edges.get(id) {
                Some(e) => e.clone(),
                None => EdgeLayout::with_z(out.next_z_index()),
            };
            out.edges.insert(id.clone(), entry);
        }
        let mut annotation_ids: Vec<&String> = g.annotations.keys().collect();
        annotation_ids.sort();
        for id in annotation_ids {
            let entry = match saved.texts.get(id) {
                Some(t) => t.clone(),
                None => {
                    let z = out.next_z_index();
                    TextLayout::at(g.annotations[id].layout.center, z)
                }
            };
            out.texts.insert(id.clone(), entry);
        }
        out
    }

    pub fn next_z_index(&self) -> i32 {
        let max_node = self.nodes.values().map(|n| n.z_index).max();
        let max_edge = self.edges.values().map(|e| e.z_index).max();
        let max_text = self.texts.values().map(|t| t.z_index).max();
        [max_node, max_edge, max_text].into_iter().flatten().max().map_or(0, |z| z + 1)
    }

    pub fn selection(&self) -> Selection {
        fn selected<T>(map: &HashMap<String, T>, f: impl Fn(&T) -> bool) -> Vec<String> {
            let mut ids: Vec<String> = map.iter().filter(|(_, v)| f(v)).map(|(k, _)| k.clone()).collect();
            ids.sort();
            ids
        }
        Selection {
            nodes: selected(&self.nodes, |n| n.selected),
            edges: selected(&self.edges, |e| e.selected),
            texts: selected(&self.texts, |t| t.selected),
        }
    }

    pub fn clear_selection(&mut self) {
        self.nodes.values_mut().for_each(|n| n.selected = false);
        self.edges.values_mut().for_each(|e| e.selected = false);
        self.texts.values_mut().for_each(|t| t.selected = false);
    }

    /// Marks every id in `sel` as selected; ids without a layout entry are skipped.
    pub fn apply_selection(&mut self, sel: &Selection) {
        for id in &sel.nodes {
            if let Some(n) = self.nodes.get_mut(id) {
                n.selected = true;
            }
        }
        for id in &sel.edges {
            if let Some(e) = self.edges.get_mut(id) {
                e.selected = true;
            }
        }
        for id in &sel.texts {
            if let Some(t) = self.texts.get_mut(id) {
                t.selected = true;
            }
        }
    }

    pub fn restore_selection(&mut self, sel: &Selection) {
        self.clear_selection();
        self.apply_selection(sel);
    }
}
