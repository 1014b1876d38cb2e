use crate::model::{ConnectionKind, Point};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolMode {
    #[default]
    Select,
    MultiSelect,
    Pan,
    Connect,
    CreateNode,
}

/// Keyboard modifiers held during a mouse event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

/// Items being dragged, with the canvas position each started from.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragState {
    pub start: Point,
    pub current: Point,
    pub nodes: Vec<(String, Point)>,
    pub texts: Vec<(String, Point)>,
}

impl DragState {
    pub fn delta(&self) -> Point {
        Point { x: self.current.x - self.start.x, y: self.current.y - self.start.y }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionBox {
    pub start: Point,
    pub current: Point,
    pub additive: bool,
    /// Nodes the box would select if released now.
    pub preview_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPreview {
    /// Subject id, or a partner connection id when drawing a couple's child link.
    pub source_id: String,
    pub kind: ConnectionKind,
    pub start: Point,
    pub current: Point,
    pub target_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCreationPreview {
    pub position: Point,
}

/// Screen-space anchor of an in-progress pan drag.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PanGesture {
    pub last: Point,
}

/// Everything about an unfinished gesture. None of this enters undo history.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionState {
    pub mode: ToolMode,
    pub connection_kind: ConnectionKind,
    pub drag: Option<DragState>,
    pub selection_box: Option<SelectionBox>,
    pub connection: Option<ConnectionPreview>,
    pub node_preview: Option<NodeCreationPreview>,
    pub pan: Option<PanGesture>,
    pub hover_id: Option<String>,
}

impl Default for InteractionState {
    fn default() -> Self {
        InteractionState {
            mode: ToolMode::Select,
            connection_kind: ConnectionKind::Relation,
            drag: None,
            selection_box: None,
            connection: None,
            node_preview: None,
            pan: None,
            hover_id: None,
        }
    }
}

impl InteractionState {
    pub fn reset_gestures(&mut self) {
        self.drag = None;
        self.selection_box = None;
        self.connection = None;
        self.node_preview = None;
        self.pan = None;
        self.hover_id = None;
    }

    pub fn is_idle(&self) -> bool {
        self.drag.is_none()
            && self.selection_box.is_none()
            && self.connection.is_none()
            && self.node_preview.is_none()
            && self.pan.is_none()
    }
}
