//! View-only commands: they run through the manager but never enter history.

use super::Reversible;
use crate::layout::Selection;
use crate::model::Point;
use crate::state::EditorState;

#[derive(Clone, Debug)]
pub struct SetZoom {
    pub zoom: f64,
    /// New canvas offset, for zooming around an anchor point.
    pub offset: Option<Point>,
    previous: Option<(f64, Point)>,
}

impl SetZoom {
    pub fn new(zoom: f64) -> Self {
        SetZoom { zoom, offset: None, previous: None }
    }

    pub fn with_offset(zoom: f64, offset: Point) -> Self {
        SetZoom { zoom, offset: Some(offset), previous: None }
    }
}

impl Reversible for SetZoom {
    fn execute(&mut self, state: &mut EditorState) {
        let canvas = &mut state.layout.canvas;
        if self.previous.is_none() {
            self.previous = Some((canvas.zoom, canvas.offset));
        }
        canvas.zoom = self.zoom;
        if let Some(offset) = self.offset {
            canvas.offset = offset;
        }
    }

    fn undo(&mut self, state: &mut EditorState) {
        if let Some((zoom, offset)) = self.previous {
            state.layout.canvas.zoom = zoom;
            state.layout.canvas.offset = offset;
        }
    }

    fn description(&self) -> &'static str {
        "zoom"
    }

    fn records_history(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug)]
pub struct Pan {
    pub delta: Point,
    previous: Option<Point>,
}

impl Pan {
    pub fn new(dx: f64, dy: f64) -> Self {
        Pan { delta: Point::new(dx, dy), previous: None }
    }
}

impl Reversible for Pan {
    fn execute(&mut self, state: &mut EditorState) {
        let offset = &mut state.layout.canvas.offset;
        if self.previous.is_none() {
            self.previous = Some(*offset);
        }
        offset.x += self.delta.x;
        offset.y += self.delta.y;
    }

    fn undo(&mut self, state: &mut EditorState) {
        if let Some(prev) = self.previous {
            state.layout.canvas.offset = prev;
        }
    }

    fn description(&self) -> &'static str {
        "pan"
    }

    fn records_history(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug)]
pub struct SetGridSnap {
    pub enabled: bool,
    previous: Option<bool>,
}

impl SetGridSnap {
    pub fn new(enabled: bool) -> Self {
        SetGridSnap { enabled, previous: None }
    }
}

impl Reversible for SetGridSnap {
    fn execute(&mut self, state: &mut EditorState) {
        let canvas = &mut state.layout.canvas;
        if self.previous.is_none() {
            self.previous = Some(canvas.grid_snap);
        }
        canvas.grid_snap = self.enabled;
    }

    fn undo(&mut self, state: &mut EditorState) {
        if let Some(prev) = self.previous {
            state.layout.canvas.grid_snap = prev;
        }
    }

    fn description(&self) -> &'static str {
        "toggle grid snap"
    }

    fn records_history(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug)]
pub struct Select {
    pub targets: Selection,
    pub clear_others: bool,
    previous: Option<Selection>,
}

impl Select {
    pub fn new(targets: Selection, clear_others: bool) -> Self {
        Select { targets, clear_others, previous: None }
    }
}

impl Reversible for Select {
    fn execute(&mut self, state: &mut EditorState) {
        if self.previous.is_none() {
            self.previous = Some(state.layout.selection());
        }
        if self.clear_others {
            state.layout.clear_selection();
        }
        state.layout.apply_selection(&self.targets);
    }

    fn undo(&mut self, state: &mut EditorState) {
        if let Some(prev) = &self.previous {
            state.layout.restore_selection(prev);
        }
    }

    fn description(&self) -> &'static str {
        "select"
    }

    fn records_history(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug, Default)]
pub struct DeselectAll {
    previous: Option<Selection>,
}

impl DeselectAll {
    pub fn new() -> Self {
        DeselectAll::default()
    }
}

impl Reversible for DeselectAll {
    fn execute(&mut self, state: &mut EditorState) {
        if self.previous.is_none() {
            self.previous = Some(state.layout.selection());
        }
        state.layout.clear_selection();
    }

    fn undo(&mut self, state: &mut EditorState) {
        if let Some(prev) = &self.previous {
            state.layout.restore_selection(prev);
        }
    }

    fn description(&self) -> &'static str {
        "deselect all"
    }

    fn records_history(&self) -> bool {
        false
    }
}
