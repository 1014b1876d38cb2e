use crate::editor::ToolMode;
use crate::layout::Selection;
use serde::Serialize;

/// Token returned by `on`/`subscribe`; pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ListenerId(pub u32);

/// Synchronous observer list. Listeners run in subscription order and must
/// not call back into the emitter.
pub struct Listeners<E> {
    entries: Vec<(ListenerId, Box<dyn FnMut(&E)>)>,
    next_id: u32,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Listeners { entries: Vec::new(), next_id: 1 }
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Listeners::default()
    }

    pub fn add(&mut self, f: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, Box::new(f)));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(lid, _)| *lid != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, f) in self.entries.iter_mut() {
            f(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeReason {
    Execute,
    Undo,
    Redo,
    Load,
    AutoSave,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    StateChange { reason: ChangeReason },
    SelectionChange { selection: Selection },
    ViewChange,
    ToolChange { mode: ToolMode },
    InteractionChange,
}

impl EditorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::StateChange { .. } => "state-change",
            EditorEvent::SelectionChange { .. } => "selection-change",
            EditorEvent::ViewChange => "view-change",
            EditorEvent::ToolChange { .. } => "tool-change",
            EditorEvent::InteractionChange => "interaction-change",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn removed_listener_stops_receiving() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut l: Listeners<u32> = Listeners::new();
        let s = seen.clone();
        let id = l.add(move |e| s.borrow_mut().push(*e));
        l.emit(&1);
        assert!(l.remove(id));
        assert!(!l.remove(id));
        l.emit(&2);
        assert_eq!(*seen.borrow(), vec![1]);
    }
}
