use super::{Reversible, Touch};
use crate::layout::{EdgeLayout, NodeLayout};
use crate::model::{Connection, Point, Subject, SubjectEntity, SubjectStyle};
use crate::state::EditorState;
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
pub struct AddSubject {
    pub subject: Subject,
    node: Option<NodeLayout>,
    applied: bool,
    touch: Touch,
}

impl AddSubject {
    pub fn new(subject: Subject) -> Self {
        AddSubject { subject, node: None, applied: false, touch: Touch::default() }
    }
}

impl Reversible for AddSubject {
    fn execute(&mut self, state: &mut EditorState) {
        if state.genogram.subjects.contains_key(&self.subject.id) {
            return;
        }
        let center = self.subject.layout.center;
        let node = self
            .node
            .get_or_insert_with(|| NodeLayout::at(center, state.layout.next_z_index()))
            .clone();
        state.genogram.subjects.insert(self.subject.id.clone(), self.subject.clone());
        state.layout.nodes.insert(self.subject.id.clone(), node);
        self.touch.apply(state);
        self.applied = true;
    }

    fn undo(&mut self, state: &mut EditorState) {
        if !self.applied {
            return;
        }
        state.genogram.subjects.remove(&self.subject.id);
        state.layout.nodes.remove(&self.subject.id);
        self.touch.revert(state);
        self.applied = false;
    }

    fn description(&self) -> &'static str {
        "add subject"
    }
}

#[derive(Clone, Debug)]
struct SubjectBackup {
    subject: Subject,
    node: Option<NodeLayout>,
    connections: Vec<(Connection, Option<EdgeLayout>)>,
}

/// Removes a subject together with every connection that references it,
/// directly or through a removed partner connection.
#[derive(Clone, Debug)]
pub struct DeleteSubject {
    pub id: String,
    backup: Option<SubjectBackup>,
    touch: Touch,
}

impl DeleteSubject {
    pub fn new(id: impl Into<String>) -> Self {
        DeleteSubject { id: id.into(), backup: None, touch: Touch::default() }
    }
}

/// Connection ids reachable from `root` through references, excluding `root`.
fn dependent_connections(state: &EditorState, root: &str) -> Vec<String> {
    let mut found: BTreeSet<String> = BTreeSet::new();
    let mut pending = vec![root.to_string()];
    while let Some(id) = pending.pop() {
        for conn in state.index.connections_of(&id) {
            if found.insert(conn.clone()) {
                pending.push(conn);
            }
        }
    }
    found.into_iter().collect()
}

impl Reversible for DeleteSubject {
    fn execute(&mut self, state: &mut EditorState) {
        let Some(subject) = state.genogram.subjects.get(&self.id) else {
            return;
        };
        if self.backup.is_none() {
            let connections = dependent_connections(state, &self.id)
                .into_iter()
                .filter_map(|cid| {
                    let c = state.genogram.connections.get(&cid)?.clone();
                    let edge = state.layout.edges.get(&cid).cloned();
                    Some((c, edge))
                })
                .collect();
            self.backup = Some(SubjectBackup {
                subject: subject.clone(),
                node: state.layout.nodes.get(&self.id).cloned(),
                connections,
            });
        }
        if let Some(backup) = &self.backup {
            for (c, _) in &backup.connections {
                if let Some(current) = state.genogram.connections.remove(&c.id) {
                    state.index.remove(&current);
                    state.layout.edges.remove(&c.id);
                }
            }
        }
        state.genogram.subjects.remove(&self.id);
        state.layout.nodes.remove(&self.id);
        self.touch.apply(state);
    }

    fn undo(&mut self, state: &mut EditorState) {
        let Some(backup) = &self.backup else {
            return;
        };
        if state.genogram.subjects.contains_key(&self.id) {
            return;
        }
        state.genogram.subjects.insert(self.id.clone(), backup.subject.clone());
        if let Some(node) = &backup.node {
            state.layout.nodes.insert(self.id.clone(), node.clone());
        }
        for (c, edge) in &backup.connections {
            if state.genogram.connections.contains_key(&c.id) {
                continue;
            }
            state.index.add(c);
            state.genogram.connections.insert(c.id.clone(), c.clone());
            if let Some(edge) = edge {
                state.layout.edges.insert(c.id.clone(), edge.clone());
            }
        }
        self.touch.revert(state);
    }

    fn description(&self) -> &'static str {
        "delete subject"
    }
}

/// Partial update; `None` fields are left alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubjectUpdate {
    pub entity: Option<SubjectEntity>,
    pub style: Option<SubjectStyle>,
}

impl SubjectUpdate {
    fn then(self, next: SubjectUpdate) -> SubjectUpdate {
        SubjectUpdate { entity: next.entity.or(self.entity), style: next.style.or(self.style) }
    }
}

#[derive(Clone, Debug)]
pub struct UpdateSubject {
    pub id: String,
    pub update: SubjectUpdate,
    previous: Option<Subject>,
    touch: Touch,
}

impl UpdateSubject {
    pub fn new(id: impl Into<String>, update: SubjectUpdate) -> Self {
        UpdateSubject { id: id.into(), update, previous: None, touch: Touch::default() }
    }

    pub(crate) fn merge(self, next: UpdateSubject) -> UpdateSubject {
        UpdateSubject {
            id: self.id,
            update: self.update.then(next.update),
            previous: self.previous,
            touch: self.touch,
        }
    }
}

impl Reversible for UpdateSubject {
    fn execute(&mut self, state: &mut EditorState) {
        let Some(subject) = state.genogram.subjects.get_mut(&self.id) else {
            return;
        };
        if self.previous.is_none() {
            self.previous = Some(subject.clone());
        }
        if let Some(entity) = &self.update.entity {
            subject.entity = entity.clone();
        }
        if let Some(style) = &self.update.style {
            subject.layout.style = style.clone();
        }
        self.touch.apply(state);
    }

    fn undo(&mut self, state: &mut EditorState) {
        let Some(prev) = &self.previous else {
            return;
        };
        if let Some(subject) = state.genogram.subjects.get_mut(&self.id) {
            *subject = prev.clone();
            self.touch.revert(state);
        }
    }

    fn description(&self) -> &'static str {
        "update subject"
    }
}

#[derive(Clone, Debug)]
pub struct MoveSubject {
    pub id: String,
    pub to: Point,
    from: Option<Point>,
    touch: Touch,
}

impl MoveSubject {
    pub fn new(id: impl Into<String>, to: Point) -> Self {
        MoveSubject { id: id.into(), to, from: None, touch: Touch::default() }
    }

    pub(crate) fn merge(self, next: MoveSubject) -> MoveSubject {
        MoveSubject { id: self.id, to: next.to, from: self.from, touch: self.touch }
    }
}

fn place_subject(state: &mut EditorState, id: &str, p: Point) {
    if let Some(subject) = state.genogram.subjects.get_mut(id) {
        subject.layout.center = p;
    }
    if let Some(node) = state.layout.nodes.get_mut(id) {
        node.position = p;
    }
}

impl Reversible for MoveSubject {
    fn execute(&mut self, state: &mut EditorState) {
        let Some(subject) = state.genogram.subjects.get(&self.id) else {
            return;
        };
        if self.from.is_none() {
            self.from = Some(subject.layout.center);
        }
        place_subject(state, &self.id, self.to);
        self.touch.apply(state);
    }

    fn undo(&mut self, state: &mut EditorState) {
        let Some(from) = self.from else {
            return;
        };
        if state.genogram.subjects.contains_key(&self.id) {
            place_subject(state, &self.id, from);
            self.touch.revert(state);
        }
    }

    fn description(&self) -> &'static str {
        "move subject"
    }
}
