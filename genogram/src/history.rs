use crate::clock::SharedClock;
use crate::commands::{Command, CompositeCommand};
use crate::config::EditorConfig;
use crate::events::{ListenerId, Listeners};
use crate::state::EditorState;
use log::debug;
use serde::Serialize;
use std::collections::VecDeque;

pub const DEFAULT_MAX_HISTORY: usize = 100;
pub const DEFAULT_MERGE_THRESHOLD_MS: u64 = 300;

struct HistoryEntry {
    command: Command,
    generation: u64,
}

/// How `execute` disposed of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recorded {
    /// Ran without touching the stacks (view-only or empty).
    Transient,
    Pushed,
    /// Folded into the entry on top of the undo stack.
    Merged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_count: usize,
    pub redo_count: usize,
    pub dirty: bool,
}

/// Undo/redo stacks with time-windowed merging and a saved checkpoint.
///
/// Every entry carries a generation number that is never reused; the saved
/// checkpoint remembers the generation on top of the undo stack (or the base
/// generation below the oldest entry), so undoing past a save and editing
/// again correctly reports unsaved changes.
pub struct CommandManager {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    last_execute_ms: Option<u64>,
    next_generation: u64,
    base_generation: u64,
    saved_generation: u64,
    max_history_size: usize,
    merge_threshold_ms: u64,
    auto_merge: bool,
    clock: SharedClock,
    listeners: Listeners<HistoryStatus>,
}

impl CommandManager {
    pub fn new(clock: SharedClock) -> Self {
        CommandManager {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            last_execute_ms: None,
            next_generation: 1,
            base_generation: 0,
            saved_generation: 0,
            max_history_size: DEFAULT_MAX_HISTORY,
            merge_threshold_ms: DEFAULT_MERGE_THRESHOLD_MS,
            auto_merge: true,
            clock,
            listeners: Listeners::new(),
        }
    }

    pub fn from_config(config: &EditorConfig, clock: SharedClock) -> Self {
        let mut m = CommandManager::new(clock);
        m.max_history_size = config.max_history_size.max(1);
        m.merge_threshold_ms = config.merge_threshold_ms;
        m.auto_merge = config.auto_merge;
        m
    }

    pub fn set_max_history_size(&mut self, n: usize) {
        self.max_history_size = n.max(1);
        self.enforce_capacity();
    }

    pub fn set_merge_threshold_ms(&mut self, ms: u64) {
        self.merge_threshold_ms = ms;
    }

    pub fn set_auto_merge(&mut self, on: bool) {
        self.auto_merge = on;
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    pub fn execute(&mut self, mut command: Command, state: &mut EditorState) -> Recorded {
        if !command.records_history() {
            command.execute(state);
            return Recorded::Transient;
        }
        let now = self.clock.now_millis();
        let mergeable = self.auto_merge
            && self.within_merge_window(now)
            && self.undo_stack.back().is_some_and(|top| top.command.can_merge(&command));
        if mergeable {
            if let Some(mut top) = self.undo_stack.pop_back() {
                top.command.undo(state);
                let mut merged = top.command.merge(command);
                merged.execute(state);
                debug!("history: merged {} into top entry", merged.description());
                let generation = self.bump_generation();
                self.undo_stack.push_back(HistoryEntry { command: merged, generation });
                self.redo_stack.clear();
                self.last_execute_ms = Some(now);
                self.notify();
                return Recorded::Merged;
            }
        }
        command.execute(state);
        debug!("history: executed {}", command.description());
        self.push(command);
        self.redo_stack.clear();
        self.last_execute_ms = Some(now);
        self.notify();
        Recorded::Pushed
    }

    /// Runs `commands` in order and records them as one undo step.
    pub fn execute_transaction(&mut self, mut commands: Vec<Command>, state: &mut EditorState) -> Recorded {
        if commands.is_empty() {
            return Recorded::Transient;
        }
        for c in commands.iter_mut() {
            c.execute(state);
        }
        let command = match commands.len() {
            1 => commands.remove(0),
            _ => Command::Composite(CompositeCommand::new(commands)),
        };
        if !command.records_history() {
            return Recorded::Transient;
        }
        debug!("history: executed transaction ({})", command.description());
        self.push(command);
        self.redo_stack.clear();
        self.last_execute_ms = Some(self.clock.now_millis());
        self.notify();
        Recorded::Pushed
    }

    pub fn undo(&mut self, state: &mut EditorState) -> bool {
        let Some(mut entry) = self.undo_stack.pop_back() else {
            return false;
        };
        entry.command.undo(state);
        debug!("history: undo {}", entry.command.description());
        self.redo_stack.push(entry);
        self.last_execute_ms = None;
        self.notify();
        true
    }

    pub fn redo(&mut self, state: &mut EditorState) -> bool {
        let Some(mut entry) = self.redo_stack.pop() else {
            return false;
        };
        entry.command.execute(state);
        debug!("history: redo {}", entry.command.description());
        self.undo_stack.push_back(entry);
        self.enforce_capacity();
        self.last_execute_ms = None;
        self.notify();
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<&'static str> {
        self.undo_stack.back().map(|e| e.command.description())
    }

    pub fn redo_description(&self) -> Option<&'static str> {
        self.redo_stack.last().map(|e| e.command.description())
    }

    /// Drops both stacks; the current state becomes the saved baseline.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.base_generation = self.bump_generation();
        self.saved_generation = self.base_generation;
        self.last_execute_ms = None;
        self.notify();
    }

    pub fn mark_saved(&mut self) {
        self.saved_generation = self.current_generation();
        self.notify();
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.current_generation() != self.saved_generation
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_count: self.undo_count(),
            redo_count: self.redo_count(),
            dirty: self.has_unsaved_changes(),
        }
    }

    pub fn subscribe(&mut self, f: impl FnMut(&HistoryStatus) + 'static) -> ListenerId {
        self.listeners.add(f)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn within_merge_window(&self, now: u64) -> bool {
        self.last_execute_ms
            .is_some_and(|last| now.saturating_sub(last) < self.merge_threshold_ms)
    }

    fn current_generation(&self) -> u64 {
        self.undo_stack.back().map_or(self.base_generation, |e| e.generation)
    }

    fn bump_generation(&mut self) -> u64 {
        let g = self.next_generation;
        self.next_generation += 1;
        g
    }

    fn push(&mut self, command: Command) {
        let generation = self.bump_generation();
        self.undo_stack.push_back(HistoryEntry { command, generation });
        self.enforce_capacity();
    }

    fn enforce_capacity(&mut self) {
        while self.undo_stack.len() > self.max_history_size {
            if let Some(evicted) = self.undo_stack.pop_front() {
                debug!("history: evicted oldest entry {}", evicted.command.description());
                self.base_generation = evicted.generation;
            }
        }
    }

    fn notify(&mut self) {
        let status = self.status();
        self.listeners.emit(&status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::commands::{AddSubject, MoveSubject};
    use crate::model::{PersonAttribute, Point, Subject, SubjectEntity};
    use std::rc::Rc;

    fn setup() -> (Rc<ManualClock>, CommandManager, EditorState, String) {
        let clock = Rc::new(ManualClock::new(10_000));
        let mut state = EditorState::new(clock.clone());
        let mut m = CommandManager::new(clock.clone());
        let s = Subject::new(SubjectEntity::person(PersonAttribute::default()), Point::default());
        let id = s.id.clone();
        m.execute(AddSubject::new(s).into(), &mut state);
        clock.advance(1_000);
        (clock, m, state, id)
    }

    #[test]
    fn saved_marker_survives_undo_then_new_edit() {
        let (clock, mut m, mut state, id) = setup();
        m.mark_saved();
        assert!(!m.has_unsaved_changes());
        m.undo(&mut state);
        assert!(m.has_unsaved_changes());
        clock.advance(1_000);
        m.execute(MoveSubject::new(&id, Point::new(5.0, 5.0)).into(), &mut state);
        // Same stack length as when saved, but different content.
        assert_eq!(m.undo_count(), 1);
        assert!(m.has_unsaved_changes());
    }

    #[test]
    fn merge_refreshes_generation() {
        let (clock, mut m, mut state, id) = setup();
        m.execute(MoveSubject::new(&id, Point::new(20.0, 0.0)).into(), &mut state);
        m.mark_saved();
        clock.advance(50);
        assert_eq!(m.execute(MoveSubject::new(&id, Point::new(40.0, 0.0)).into(), &mut state), Recorded::Merged);
        assert!(m.has_unsaved_changes());
    }

    #[test]
    fn listeners_see_status_changes() {
        let (_clock, mut m, mut state, _id) = setup();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let s = seen.clone();
        let token = m.subscribe(move |st| s.borrow_mut().push(*st));
        m.undo(&mut state);
        m.redo(&mut state);
        assert!(m.unsubscribe(token));
        m.undo(&mut state);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].can_redo && !seen[0].can_undo);
        assert!(seen[1].can_undo && !seen[1].can_redo);
    }
}
