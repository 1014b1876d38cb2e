use super::{Reversible, Touch};
use crate::layout::EdgeLayout;
use crate::model::{Connection, ConnectionEntity, ConnectionLayout};
use crate::state::EditorState;

#[derive(Clone, Debug)]
pub struct AddConnection {
    pub connection: Connection,
    edge: Option<EdgeLayout>,
    applied: bool,
    touch: Touch,
}

impl AddConnection {
    pub fn new(connection: Connection) -> Self {
        AddConnection { connection, edge: None, applied: false, touch: Touch::default() }
    }
}

impl Reversible for AddConnection {
    fn execute(&mut self, state: &mut EditorState) {
        if state.genogram.connections.contains_key(&self.connection.id) {
            return;
        }
        let edge = self.edge.get_or_insert_with(|| EdgeLayout::with_z(state.layout.next_z_index())).clone();
        state.index.add(&self.connection);
        state.genogram.connections.insert(self.connection.id.clone(), self.connection.clone());
        state.layout.edges.insert(self.connection.id.clone(), edge);
        self.touch.apply(state);
        self.applied = true;
    }

    fn undo(&mut self, state: &mut EditorState) {
        if !self.applied {
            return;
        }
        if let Some(current) = state.genogram.connections.remove(&self.connection.id) {
            state.index.remove(&current);
        }
        state.layout.edges.remove(&self.connection.id);
        self.touch.revert(state);
        self.applied = false;
    }

    fn description(&self) -> &'static str {
        "add connection"
    }
}

/// Removes one connection. Couple-child links that point at a deleted
/// partner connection are the caller's to cascade.
#[derive(Clone, Debug)]
pub struct DeleteConnection {
    pub id: String,
    backup: Option<(Connection, Option<EdgeLayout>)>,
    touch: Touch,
}

impl DeleteConnection {
    pub fn new(id: impl Into<String>) -> Self {
        DeleteConnection { id: id.into(), backup: None, touch: Touch::default() }
    }
}

impl Reversible for DeleteConnection {
    fn execute(&mut self, state: &mut EditorState) {
        let Some(current) = state.genogram.connections.remove(&self.id) else {
            return;
        };
        let edge = state.layout.edges.remove(&self.id);
        state.index.remove(&current);
        if self.backup.is_none() {
            self.backup = Some((current, edge));
        }
        self.touch.apply(state);
    }

    fn undo(&mut self, state: &mut EditorState) {
        let Some((conn, edge)) = &self.backup else {
            return;
        };
        if state.genogram.connections.contains_key(&self.id) {
            return;
        }
        state.index.add(conn);
        state.genogram.connections.insert(self.id.clone(), conn.clone());
        if let Some(edge) = edge {
            state.layout.edges.insert(self.id.clone(), edge.clone());
        }
        self.touch.revert(state);
    }

    fn description(&self) -> &'static str {
        "delete connection"
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionUpdate {
    pub entity: Option<ConnectionEntity>,
    pub layout: Option<ConnectionLayout>,
}

impl ConnectionUpdate {
    fn then(self, next: ConnectionUpdate) -> ConnectionUpdate {
        ConnectionUpdate { entity: next.entity.or(self.entity), layout: next.layout.or(self.layout) }
    }
}

/// Changes a connection in place; a new entity re-keys the index.
#[derive(Clone, Debug)]
pub struct UpdateConnection {
    pub id: String,
    pub update: ConnectionUpdate,
    previous: Option<Connection>,
    touch: Touch,
}

impl UpdateConnection {
    pub fn new(id: impl Into<String>, update: ConnectionUpdate) -> Self {
        UpdateConnection { id: id.into(), update, previous: None, touch: Touch::default() }
    }

    pub(crate) fn merge(self, next: UpdateConnection) -> UpdateConnection {
        UpdateConnection {
            id: self.id,
            update: self.update.then(next.update),
            previous: self.previous,
            touch: self.touch,
        }
    }
}

fn replace_connection(state: &mut EditorState, next: Connection) {
    if let Some(old) = state.genogram.connections.get(&next.id) {
        state.index.remove(old);
    }
    state.index.add(&next);
    state.genogram.connections.insert(next.id.clone(), next);
}

impl Reversible for UpdateConnection {
    fn execute(&mut self, state: &mut EditorState) {
        let Some(current) = state.genogram.connections.get(&self.id) else {
            return;
        };
        if self.previous.is_none() {
            self.previous = Some(current.clone());
        }
        let mut next = current.clone();
        if let Some(entity) = &self.update.entity {
            next.entity = entity.clone();
        }
        if let Some(layout) = &self.update.layout {
            next.layout = layout.clone();
        }
        replace_connection(state, next);
        self.touch.apply(state);
    }

    fn undo(&mut self, state: &mut EditorState) {
        let Some(prev) = &self.previous else {
            return;
        };
        if state.genogram.connections.contains_key(&self.id) {
            replace_connection(state, prev.clone());
            self.touch.revert(state);
        }
    }

    fn description(&self) -> &'static str {
        "update connection"
    }
}
