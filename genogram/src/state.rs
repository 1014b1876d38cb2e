use crate::clock::{timestamp, SharedClock, SystemClock};
use crate::index::ConnectionIndex;
use crate::layout::LayoutState;
use crate::model::Genogram;
use std::fmt;
use std::rc::Rc;

/// The single mutable value every command runs against.
#[derive(Clone)]
pub struct EditorState {
    pub genogram: Genogram,
    pub layout: LayoutState,
    pub index: ConnectionIndex,
    clock: SharedClock,
}

impl EditorState {
    pub fn new(clock: SharedClock) -> Self {
        let genogram = Genogram::new("Untitled", timestamp(clock.now_millis()));
        EditorState { genogram, layout: LayoutState::new(), index: ConnectionIndex::new(), clock }
    }

    /// Assembles a state from loaded parts; the index is rebuilt from the
    /// connection map.
    pub fn from_parts(genogram: Genogram, layout: LayoutState, clock: SharedClock) -> Self {
        let mut index = ConnectionIndex::new();
        index.rebuild(genogram.connections.values());
        EditorState { genogram, layout, index, clock }
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn now_stamp(&self) -> String {
        timestamp(self.clock.now_millis())
    }
}

impl Default for EditorState {
    fn default() -> Self {
        EditorState::new(Rc::new(SystemClock))
    }
}

impl PartialEq for EditorState {
    fn eq(&self, other: &Self) -> bool {
        self.genogram == other.genogram && self.layout == other.layout && self.index == other.index
    }
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorState")
            .field("genogram", &self.genogram)
            .field("layout", &self.layout)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
