pub mod model;
pub mod layout;
pub mod geometry {
    pub mod math;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod auto_layout;
    pub mod picking;
    pub mod placement;
}
pub mod clock;
pub mod commands;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod index;
pub mod json;
pub mod state;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use commands::{ChangeScope, Command, CompositeCommand, Reversible};
pub use config::{EditorConfig, ViewSettings};
pub use editor::{Editor, InteractionState, Modifiers, ToolMode};
pub use engine::LayoutEngine;
pub use error::DocumentError;
pub use events::{ChangeReason, EditorEvent, ListenerId};
pub use history::{CommandManager, HistoryStatus, Recorded};
pub use index::ConnectionIndex;
pub use json::EditorDocument;
pub use layout::{LayoutState, Selection};
pub use model::{Genogram, Point};
pub use state::EditorState;
