//! Reversible mutations of [`EditorState`].
//!
//! Every concrete command captures what it needs to undo itself the first
//! time it executes and keeps that backup across later execute/undo cycles.
//! Commands whose target id is absent do nothing.

mod annotation;
mod composite;
mod connection;
mod subject;
mod view;

pub use annotation::{AddAnnotation, AnnotationUpdate, DeleteAnnotation, MoveAnnotation, UpdateAnnotation};
pub use composite::CompositeCommand;
pub use connection::{AddConnection, ConnectionUpdate, DeleteConnection, UpdateConnection};
pub use subject::{AddSubject, DeleteSubject, MoveSubject, SubjectUpdate, UpdateSubject};
pub use view::{DeselectAll, Pan, Select, SetGridSnap, SetZoom};

use crate::state::EditorState;

pub trait Reversible {
    fn execute(&mut self, state: &mut EditorState);
    fn undo(&mut self, state: &mut EditorState);
    fn description(&self) -> &'static str;
    /// View-only commands run but are never pushed onto the undo stack.
    fn records_history(&self) -> bool {
        true
    }
}

/// What part of the editor a command touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeScope {
    View,
    Selection,
    Structure,
}

#[derive(Clone, Debug)]
pub enum Command {
    AddSubject(AddSubject),
    DeleteSubject(DeleteSubject),
    UpdateSubject(UpdateSubject),
    MoveSubject(MoveSubject),
    AddConnection(AddConnection),
    DeleteConnection(DeleteConnection),
    UpdateConnection(UpdateConnection),
    AddAnnotation(AddAnnotation),
    DeleteAnnotation(DeleteAnnotation),
    UpdateAnnotation(UpdateAnnotation),
    MoveAnnotation(MoveAnnotation),
    SetZoom(SetZoom),
    Pan(Pan),
    SetGridSnap(SetGridSnap),
    Select(Select),
    DeselectAll(DeselectAll),
    Composite(CompositeCommand),
}

macro_rules! dispatch {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            Command::AddSubject($c) => $body,
            Command::DeleteSubject($c) => $body,
            Command::UpdateSubject($c) => $body,
            Command::MoveSubject($c) => $body,
            Command::AddConnection($c) => $body,
            Command::DeleteConnection($c) => $body,
            Command::UpdateConnection($c) => $body,
            Command::AddAnnotation($c) => $body,
            Command::DeleteAnnotation($c) => $body,
            Command::UpdateAnnotation($c) => $body,
            Command::MoveAnnotation($c) => $body,
            Command::SetZoom($c) => $body,
            Command::Pan($c) => $body,
            Command::SetGridSnap($c) => $body,
            Command::Select($c) => $body,
            Command::DeselectAll($c) => $body,
            Command::Composite($c) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident),* $(,)?) => {
        $(impl From<$variant> for Command {
            fn from(c: $variant) -> Self {
                Command::$variant(c)
            }
        })*
    };
}

impl_from!(
    AddSubject, DeleteSubject, UpdateSubject, MoveSubject, AddConnection, DeleteConnection,
    UpdateConnection, AddAnnotation, DeleteAnnotation, UpdateAnnotation, MoveAnnotation, SetZoom,
    Pan, SetGridSnap, Select, DeselectAll,
);

impl From<CompositeCommand> for Command {
    fn from(c: CompositeCommand) -> Self {
        Command::Composite(c)
    }
}

impl Command {
    pub fn execute(&mut self, state: &mut EditorState) {
        dispatch!(self, c => c.execute(state))
    }

    pub fn undo(&mut self, state: &mut EditorState) {
        dispatch!(self, c => c.undo(state))
    }

    pub fn description(&self) -> &'static str {
        dispatch!(self, c => c.description())
    }

    pub fn records_history(&self) -> bool {
        dispatch!(self, c => c.records_history())
    }

    pub fn scope(&self) -> ChangeScope {
        match self {
            Command::SetZoom(_) | Command::Pan(_) | Command::SetGridSnap(_) => ChangeScope::View,
            Command::Select(_) | Command::DeselectAll(_) => ChangeScope::Selection,
            Command::Composite(c) => c.commands().iter().map(Command::scope).max().unwrap_or(ChangeScope::View),
            _ => ChangeScope::Structure,
        }
    }

    /// Two consecutive edits of the same target collapse into one undo step.
    pub fn can_merge(&self, other: &Command) -> bool {
        match (self, other) {
            (Command::UpdateSubject(a), Command::UpdateSubject(b)) => a.id == b.id,
            (Command::MoveSubject(a), Command::MoveSubject(b)) => a.id == b.id,
            (Command::UpdateConnection(a), Command::UpdateConnection(b)) => a.id == b.id,
            (Command::UpdateAnnotation(a), Command::UpdateAnnotation(b)) => a.id == b.id,
            (Command::MoveAnnotation(a), Command::MoveAnnotation(b)) => a.id == b.id,
            _ => false,
        }
    }

    /// Combines `self` with the later `next`. The result keeps `self`'s
    /// backups, so undoing it restores the state from before `self`.
    /// Callers check [`Command::can_merge`] first; otherwise `self` is returned.
    pub fn merge(self, next: Command) -> Command {
        match (self, next) {
            (Command::UpdateSubject(a), Command::UpdateSubject(b)) => a.merge(b).into(),
            (Command::MoveSubject(a), Command::MoveSubject(b)) => a.merge(b).into(),
            (Command::UpdateConnection(a), Command::UpdateConnection(b)) => a.merge(b).into(),
            (Command::UpdateAnnotation(a), Command::UpdateAnnotation(b)) => a.merge(b).into(),
            (Command::MoveAnnotation(a), Command::MoveAnnotation(b)) => a.merge(b).into(),
            (first, _) => first,
        }
    }
}

/// Bumps `updatedAt` on execute and puts the old value back on undo.
#[derive(Clone, Debug, Default)]
pub(crate) struct Touch {
    previous: Option<String>,
}

impl Touch {
    pub(crate) fn apply(&mut self, state: &mut EditorState) {
        let now = state.now_stamp();
        let meta = &mut state.genogram.metadata;
        if self.previous.is_none() {
            self.previous = Some(meta.updated_at.clone());
        }
        meta.updated_at = now;
    }

    pub(crate) fn revert(&self, state: &mut EditorState) {
        if let Some(prev) = &self.previous {
            state.genogram.metadata.updated_at = prev.clone();
        }
    }
}
