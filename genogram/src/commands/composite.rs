use super::{Command, Reversible};
use crate::state::EditorState;

/// Ordered group applied as one history entry; undone in reverse.
#[derive(Clone, Debug, Default)]
pub struct CompositeCommand {
    commands: Vec<Command>,
}

impl CompositeCommand {
    pub fn new(commands: Vec<Command>) -> Self {
        CompositeCommand { commands }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Reversible for CompositeCommand {
    fn execute(&mut self, state: &mut EditorState) {
        for c in self.commands.iter_mut() {
            c.execute(state);
        }
    }

    fn undo(&mut self, state: &mut EditorState) {
        for c in self.commands.iter_mut().rev() {
            c.undo(state);
        }
    }

    fn description(&self) -> &'static str {
        "transaction"
    }

    fn records_history(&self) -> bool {
        self.commands.iter().any(Command::records_history)
    }
}
