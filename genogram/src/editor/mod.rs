//! The editor facade: the one object a rendering layer talks to.
//!
//! High-level operations validate their arguments, build commands and hand
//! them to the [`CommandManager`]. Mouse handlers only touch
//! [`InteractionState`] until the gesture ends. Listeners registered with
//! [`Editor::on`] are told about every change.

mod interaction;

pub use interaction::{
    ConnectionPreview, DragState, InteractionState, Modifiers, NodeCreationPreview, PanGesture, SelectionBox,
    ToolMode,
};

use crate::clock::{SharedClock, SystemClock};
use crate::commands::{
    AddAnnotation, AddConnection, AddSubject, AnnotationUpdate, ChangeScope, Command, ConnectionUpdate,
    DeleteAnnotation, DeleteConnection, DeleteSubject, DeselectAll, MoveAnnotation, MoveSubject, Pan, Select,
    SetGridSnap, SetZoom, SubjectUpdate, UpdateAnnotation, UpdateConnection, UpdateSubject,
};
use crate::config::{EditorConfig, ViewSettings};
use crate::engine::LayoutEngine;
use crate::error::DocumentError;
use crate::events::{ChangeReason, EditorEvent, ListenerId, Listeners};
use crate::history::{CommandManager, HistoryStatus, Recorded};
use crate::json::{self, EditorDocument};
use crate::layout::{LayoutState, Selection};
use crate::model::{
    Annotation, AnimalAttribute, Connection, ConnectionEntity, ConnectionKind, FetusAttribute, Genogram,
    GroupAttribute, InfluenceAttribute, InfluenceStatus, ParentChildAttribute, ParentChildStatus,
    PartnerAttribute, PersonAttribute, Point, RelationAttribute, RelationStatus, Subject, SubjectEntity,
};
use crate::state::EditorState;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::rc::Rc;

/// Zoom step applied per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

pub struct Editor {
    state: EditorState,
    history: CommandManager,
    engine: LayoutEngine,
    view_settings: ViewSettings,
    interaction: InteractionState,
    config: EditorConfig,
    clock: SharedClock,
    listeners: Listeners<EditorEvent>,
    last_auto_save_ms: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Editor::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Editor::with_clock(config, Rc::new(SystemClock))
    }

    /// Builds an editor on an injected clock. Tests pass a `ManualClock`.
    pub fn with_clock(config: EditorConfig, clock: SharedClock) -> Self {
        let state = fresh_state(&config, clock.clone(), None);
        Editor {
            state,
            history: CommandManager::from_config(&config, clock.clone()),
            engine: LayoutEngine::from_config(&config),
            view_settings: ViewSettings::default(),
            interaction: InteractionState::default(),
            last_auto_save_ms: clock.now_millis(),
            config,
            clock,
            listeners: Listeners::new(),
        }
    }

    // Accessors

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn genogram(&self) -> &Genogram {
        &self.state.genogram
    }

    pub fn layout(&self) -> &LayoutState {
        &self.state.layout
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn view_settings(&self) -> &ViewSettings {
        &self.view_settings
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn history(&self) -> &CommandManager {
        &self.history
    }

    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }

    pub fn selected_items(&self) -> Selection {
        self.state.layout.selection()
    }

    /// Connections that reference `id`, sorted.
    pub fn connections_of(&self, id: &str) -> Vec<String> {
        self.state.index.connections_of(id)
    }

    /// Parent-child connections whose parent is `parent_ref`, sorted.
    pub fn children_of(&self, parent_ref: &str) -> Vec<String> {
        self.state.index.children_of(parent_ref)
    }

    // Events

    pub fn on(&mut self, f: impl FnMut(&EditorEvent) + 'static) -> ListenerId {
        self.listeners.add(f)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn emit(&mut self, event: EditorEvent) {
        debug!("editor: emit {}", event.name());
        self.listeners.emit(&event);
    }

    // Command plumbing

    /// Runs one command through the history. Returns `None` when the
    /// document is read-only and the command would change it.
    pub fn execute(&mut self, command: Command) -> Option<Recorded> {
        let scope = command.scope();
        if !self.allows(scope, command.description()) {
            return None;
        }
        let before = self.state.layout.selection();
        let recorded = self.history.execute(command, &mut self.state);
        self.after_change(scope, ChangeReason::Execute, before);
        Some(recorded)
    }

    /// Runs several commands as one undo step.
    pub fn execute_transaction(&mut self, commands: Vec<Command>) -> Option<Recorded> {
        let Some(scope) = commands.iter().map(Command::scope).max() else {
            return Some(Recorded::Transient);
        };
        if !self.allows(scope, "transaction") {
            return None;
        }
        let before = self.state.layout.selection();
        let recorded = self.history.execute_transaction(commands, &mut self.state);
        self.after_change(scope, ChangeReason::Execute, before);
        Some(recorded)
    }

    pub fn undo(&mut self) -> bool {
        if !self.allows(ChangeScope::Structure, "undo") {
            return false;
        }
        let before = self.state.layout.selection();
        if !self.history.undo(&mut self.state) {
            return false;
        }
        self.after_change(ChangeScope::Structure, ChangeReason::Undo, before);
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.allows(ChangeScope::Structure, "redo") {
            return false;
        }
        let before = self.state.layout.selection();
        if !self.history.redo(&mut self.state) {
            return false;
        }
        self.after_change(ChangeScope::Structure, ChangeReason::Redo, before);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    fn allows(&self, scope: ChangeScope, what: &str) -> bool {
        if scope == ChangeScope::Structure && self.view_settings.read_only {
            warn!("editor: {what} rejected, document is read-only");
            return false;
        }
        true
    }

    fn after_change(&mut self, scope: ChangeScope, reason: ChangeReason, before: Selection) {
        match scope {
            ChangeScope::Structure => self.emit(EditorEvent::StateChange { reason }),
            ChangeScope::View => self.emit(EditorEvent::ViewChange),
            ChangeScope::Selection => {}
        }
        let after = self.state.layout.selection();
        if after != before {
            self.emit(EditorEvent::SelectionChange { selection: after });
        }
    }

    fn applied(recorded: Option<Recorded>) -> bool {
        recorded.is_some()
    }

    fn snap_if_enabled(&self, p: Point) -> Point {
        if self.state.layout.canvas.grid_snap {
            self.engine.snap_to_grid(p)
        } else {
            p
        }
    }

    // Subjects

    /// Adds a subject near `position`, snapped and nudged off any node
    /// already occupying that spot. Returns the new id.
    pub fn add_subject(&mut self, entity: SubjectEntity, position: Point) -> Option<String> {
        if !finite(position) {
            warn!("editor: add subject rejected, non-finite position");
            return None;
        }
        let center = self.engine.place_new_node(&self.state.layout, position);
        let subject = Subject::new(entity, center);
        let id = subject.id.clone();
        self.execute(AddSubject::new(subject).into())?;
        Some(id)
    }

    pub fn add_person(&mut self, position: Point, attribute: PersonAttribute) -> Option<String> {
        self.add_subject(SubjectEntity::person(attribute), position)
    }

    pub fn add_animal(&mut self, position: Point, attribute: AnimalAttribute) -> Option<String> {
        self.add_subject(SubjectEntity::Animal { attribute, memo: None }, position)
    }

    pub fn add_fetus(&mut self, position: Point, attribute: FetusAttribute) -> Option<String> {
        self.add_subject(SubjectEntity::Fetus { attribute, memo: None }, position)
    }

    pub fn update_subject(&mut self, id: &str, update: SubjectUpdate) -> bool {
        if !self.state.genogram.subjects.contains_key(id) {
            return false;
        }
        Self::applied(self.execute(UpdateSubject::new(id, update).into()))
    }

    /// Removes a subject with every connection that depends on it.
    pub fn delete_person(&mut self, id: &str) -> bool {
        if !self.state.genogram.subjects.contains_key(id) {
            return false;
        }
        Self::applied(self.execute(DeleteSubject::new(id).into()))
    }

    pub fn move_person(&mut self, id: &str, to: Point) -> bool {
        if !self.state.genogram.subjects.contains_key(id) || !finite(to) {
            return false;
        }
        let to = self.snap_if_enabled(to);
        Self::applied(self.execute(MoveSubject::new(id, to).into()))
    }

    /// Moves several subjects as one undo step. Unknown ids are skipped.
    pub fn move_multiple_persons(&mut self, moves: &[(String, Point)]) -> bool {
        let commands: Vec<Command> = moves
            .iter()
            .filter(|(id, to)| self.state.genogram.subjects.contains_key(id) && finite(*to))
            .map(|(id, to)| MoveSubject::new(id.clone(), self.snap_if_enabled(*to)).into())
            .collect();
        if commands.is_empty() {
            return false;
        }
        Self::applied(self.execute_transaction(commands))
    }

    // Connections

    fn add_connection(&mut self, entity: ConnectionEntity) -> Option<String> {
        let connection = Connection::new(entity);
        let id = connection.id.clone();
        self.execute(AddConnection::new(connection).into())?;
        Some(id)
    }

    fn distinct_subjects(&self, a: &str, b: &str, what: &str) -> bool {
        let subjects = &self.state.genogram.subjects;
        if a == b || !subjects.contains_key(a) || !subjects.contains_key(b) {
            warn!("editor: {what} needs two distinct existing subjects");
            return false;
        }
        true
    }

    /// Children must be distinct existing subjects, none of them among the
    /// subjects `parent_ref` resolves to.
    fn valid_children(&self, parent_ref: &str, child_ids: &[&str]) -> bool {
        let g = &self.state.genogram;
        let parents = g.resolve_parents(parent_ref);
        if parents.is_empty() {
            warn!("editor: child relationship rejected, unknown parent {parent_ref}");
            return false;
        }
        let distinct: HashSet<&str> = child_ids.iter().copied().collect();
        let valid = !child_ids.is_empty()
            && distinct.len() == child_ids.len()
            && child_ids.iter().all(|c| g.subjects.contains_key(*c) && !parents.contains(c));
        if !valid {
            warn!("editor: child relationship rejected, invalid children");
        }
        valid
    }

    /// Applies the same rules as the `add_*` operations to a replacement
    /// entity for connection `id`. A partner link that is some child link's
    /// parent keeps its kind and may not take one of those children as a
    /// partner.
    fn valid_replacement(&self, id: &str, entity: &ConnectionEntity) -> bool {
        let dependants: Vec<&Connection> = self
            .state
            .index
            .children_of(id)
            .iter()
            .filter_map(|c| self.state.genogram.connections.get(c))
            .collect();
        if !dependants.is_empty() {
            let Some(pair) = entity.partner_subjects() else {
                warn!("editor: connection {id} is a parent of child links and must stay a partner link");
                return false;
            };
            let takes_child = dependants.iter().any(|c| match &c.entity {
                ConnectionEntity::ParentChild { attribute, .. } => {
                    attribute.child_refs.iter().any(|child| pair.contains(child))
                }
                _ => false,
            });
            if takes_child {
                warn!("editor: connection {id} rejected, a child cannot partner its own parent link");
                return false;
            }
        }
        match entity {
            ConnectionEntity::Relation { attribute, .. } => {
                let [a, b] = &attribute.subjects;
                self.distinct_subjects(a, b, "emotional relationship")
            }
            ConnectionEntity::Partner { attribute, .. } => {
                let [a, b] = &attribute.subjects;
                self.distinct_subjects(a, b, "partner relationship")
            }
            ConnectionEntity::Influence { attribute, .. } => {
                self.distinct_subjects(&attribute.start_ref, &attribute.end_ref, "influence relationship")
            }
            ConnectionEntity::ParentChild { attribute, .. } => {
                if attribute.parent_ref == id {
                    warn!("editor: connection {id} cannot be its own parent");
                    return false;
                }
                let children: Vec<&str> = attribute.child_refs.iter().map(String::as_str).collect();
                self.valid_children(&attribute.parent_ref, &children)
            }
            ConnectionEntity::Group { attribute, .. } => {
                let subjects = &self.state.genogram.subjects;
                let distinct: HashSet<&String> = attribute.member_ids.iter().collect();
                let valid = distinct.len() >= 2
                    && distinct.len() == attribute.member_ids.len()
                    && attribute.member_ids.iter().all(|m| subjects.contains_key(m));
                if !valid {
                    warn!("editor: group rejected, needs at least two distinct existing subjects");
                }
                valid
            }
        }
    }

    pub fn add_partner_relationship(&mut self, a: &str, b: &str) -> Option<String> {
        self.add_partner_relationship_with(PartnerAttribute {
            status: Default::default(),
            subjects: [a.to_string(), b.to_string()],
            detail: Default::default(),
        })
    }

    pub fn add_partner_relationship_with(&mut self, attribute: PartnerAttribute) -> Option<String> {
        let [a, b] = &attribute.subjects;
        if !self.distinct_subjects(a, b, "partner relationship") {
            return None;
        }
        self.add_connection(ConnectionEntity::Partner { attribute, memo: None })
    }

    /// Links `child_id` to a parent, which is either a subject or a partner
    /// connection standing for the couple.
    pub fn add_child_relationship(&mut self, parent_ref: &str, child_id: &str) -> Option<String> {
        self.add_children_relationship(parent_ref, &[child_id], ParentChildStatus::Biological)
    }

    /// Twins share one parent-child connection.
    pub fn add_twin_relationship(&mut self, parent_ref: &str, a: &str, b: &str, identical: bool) -> Option<String> {
        let status = if identical { ParentChildStatus::IdenticalTwins } else { ParentChildStatus::Twins };
        self.add_children_relationship(parent_ref, &[a, b], status)
    }

    pub fn add_children_relationship(
        &mut self,
        parent_ref: &str,
        child_ids: &[&str],
        status: ParentChildStatus,
    ) -> Option<String> {
        if !self.valid_children(parent_ref, child_ids) {
            return None;
        }
        let attribute = ParentChildAttribute {
            status,
            parent_ref: parent_ref.to_string(),
            child_refs: child_ids.iter().map(|c| c.to_string()).collect(),
        };
        self.add_connection(ConnectionEntity::ParentChild { attribute, memo: None })
    }

    pub fn add_emotional_relationship(&mut self, a: &str, b: &str, status: RelationStatus) -> Option<String> {
        if !self.distinct_subjects(a, b, "emotional relationship") {
            return None;
        }
        let attribute = RelationAttribute { status, subjects: [a.to_string(), b.to_string()] };
        self.add_connection(ConnectionEntity::Relation { attribute, memo: None })
    }

    pub fn add_influence_relationship(&mut self, from: &str, to: &str, status: InfluenceStatus) -> Option<String> {
        if !self.distinct_subjects(from, to, "influence relationship") {
            return None;
        }
        let attribute = InfluenceAttribute { status, start_ref: from.to_string(), end_ref: to.to_string() };
        self.add_connection(ConnectionEntity::Influence { attribute, memo: None })
    }

    pub fn add_group(&mut self, member_ids: Vec<String>) -> Option<String> {
        let mut members = member_ids;
        members.sort();
        members.dedup();
        if members.len() < 2 || !members.iter().all(|m| self.state.genogram.subjects.contains_key(m)) {
            warn!("editor: group rejected, needs at least two existing subjects");
            return None;
        }
        self.add_connection(ConnectionEntity::Group { attribute: GroupAttribute { member_ids: members }, memo: None })
    }

    /// Replaces a connection's entity and/or layout. A new entity is held to
    /// the rules of the matching `add_*` operation.
    pub fn update_connection(&mut self, id: &str, update: ConnectionUpdate) -> bool {
        if !self.state.genogram.connections.contains_key(id) {
            return false;
        }
        if let Some(entity) = &update.entity {
            if !self.valid_replacement(id, entity) {
                return false;
            }
        }
        Self::applied(self.execute(UpdateConnection::new(id, update).into()))
    }

    /// Deletes a connection and, for a partner link, the child links that use
    /// it as their parent, all as one undo step.
    pub fn delete_relationship(&mut self, id: &str) -> bool {
        if !self.state.genogram.connections.contains_key(id) {
            return false;
        }
        let mut commands: Vec<Command> =
            self.state.index.children_of(id).into_iter().map(|c| DeleteConnection::new(c).into()).collect();
        commands.push(DeleteConnection::new(id).into());
        Self::applied(self.execute_transaction(commands))
    }

    // Annotations

    pub fn add_annotation(&mut self, text: impl Into<String>, position: Point) -> Option<String> {
        if !finite(position) {
            return None;
        }
        let annotation = Annotation::new(text, self.snap_if_enabled(position));
        let id = annotation.id.clone();
        self.execute(AddAnnotation::new(annotation).into())?;
        Some(id)
    }

    /// Rapid successive calls on one annotation merge into one undo step.
    pub fn update_annotation_text(&mut self, id: &str, text: impl Into<String>) -> bool {
        self.update_annotation(id, AnnotationUpdate::text(text))
    }

    pub fn update_annotation(&mut self, id: &str, update: AnnotationUpdate) -> bool {
        if !self.state.genogram.annotations.contains_key(id) {
            return false;
        }
        Self::applied(self.execute(UpdateAnnotation::new(id, update).into()))
    }

    pub fn move_annotation(&mut self, id: &str, to: Point) -> bool {
        if !self.state.genogram.annotations.contains_key(id) || !finite(to) {
            return false;
        }
        let to = self.snap_if_enabled(to);
        Self::applied(self.execute(MoveAnnotation::new(id, to).into()))
    }

    pub fn delete_annotation(&mut self, id: &str) -> bool {
        if !self.state.genogram.annotations.contains_key(id) {
            return false;
        }
        Self::applied(self.execute(DeleteAnnotation::new(id).into()))
    }

    // Selection and view

    pub fn select(&mut self, targets: Selection, clear_others: bool) {
        self.execute(Select::new(targets, clear_others).into());
    }

    pub fn select_all(&mut self) {
        let layout = &self.state.layout;
        let mut all = Selection {
            nodes: layout.nodes.keys().cloned().collect(),
            edges: layout.edges.keys().cloned().collect(),
            texts: layout.texts.keys().cloned().collect(),
        };
        all.nodes.sort();
        all.edges.sort();
        all.texts.sort();
        self.select(all, true);
    }

    pub fn deselect_all(&mut self) {
        self.execute(DeselectAll::new().into());
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        let zoom = self.config.clamp_zoom(zoom);
        if zoom != self.state.layout.canvas.zoom {
            self.execute(SetZoom::new(zoom).into());
        }
    }

    /// Zooms by `factor` keeping the canvas point under the screen `anchor`
    /// fixed.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point) {
        if !factor.is_finite() || factor <= 0.0 || !finite(anchor) {
            return;
        }
        let canvas = &self.state.layout.canvas;
        let zoom = self.config.clamp_zoom(canvas.zoom * factor);
        if zoom == canvas.zoom {
            return;
        }
        let under = canvas.screen_to_canvas(anchor);
        let offset = Point { x: anchor.x - under.x * zoom, y: anchor.y - under.y * zoom };
        self.execute(SetZoom::with_offset(zoom, offset).into());
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() || (dx == 0.0 && dy == 0.0) {
            return;
        }
        self.execute(Pan::new(dx, dy).into());
    }

    pub fn set_grid_snap(&mut self, enabled: bool) {
        self.execute(SetGridSnap::new(enabled).into());
    }

    pub fn set_view_settings(&mut self, settings: ViewSettings) {
        if settings != self.view_settings {
            self.view_settings = settings;
            self.emit(EditorEvent::ViewChange);
        }
    }

    /// Deletes every selected edge, node and annotation in one transaction.
    /// Child links hanging off a selected partner edge go with it.
    pub fn delete_selected(&mut self) -> bool {
        let selection = self.state.layout.selection();
        if selection.is_empty() {
            return false;
        }
        let mut commands: Vec<Command> = Vec::with_capacity(selection.len());
        let mut edges: Vec<String> = Vec::new();
        for id in &selection.edges {
            edges.extend(self.state.index.children_of(id));
            edges.push(id.clone());
        }
        let mut seen = HashSet::new();
        edges.retain(|id| seen.insert(id.clone()));
        commands.extend(edges.into_iter().map(|id| Command::from(DeleteConnection::new(id))));
        commands.extend(selection.nodes.iter().map(|id| Command::from(DeleteSubject::new(id.clone()))));
        commands.extend(selection.texts.iter().map(|id| Command::from(DeleteAnnotation::new(id.clone()))));
        debug!("editor: deleting {} selected item(s)", selection.len());
        Self::applied(self.execute_transaction(commands))
    }

    /// Arranges subjects in generation rows as one undo step.
    pub fn auto_layout(&mut self) -> bool {
        let positions = self.engine.auto_layout_by_generation(&self.state.genogram, &self.state.layout, Point::default());
        let commands: Vec<Command> = positions
            .into_iter()
            .filter(|(id, p)| self.state.layout.nodes.get(id).is_some_and(|n| n.position != *p))
            .map(|(id, p)| MoveSubject::new(id, p).into())
            .collect();
        if commands.is_empty() {
            return false;
        }
        info!("editor: auto layout moved {} subject(s)", commands.len());
        Self::applied(self.execute_transaction(commands))
    }

    // Tools and pointer input

    pub fn set_tool_mode(&mut self, mode: ToolMode) {
        if self.interaction.mode == mode {
            return;
        }
        self.interaction.mode = mode;
        self.interaction.reset_gestures();
        self.emit(EditorEvent::ToolChange { mode });
    }

    /// Kind of connection the Connect tool draws.
    pub fn set_connection_kind(&mut self, kind: ConnectionKind) {
        if self.interaction.connection_kind != kind {
            self.interaction.connection_kind = kind;
            self.emit(EditorEvent::InteractionChange);
        }
    }

    pub fn cancel_interaction(&mut self) {
        if !self.interaction.is_idle() {
            self.interaction.reset_gestures();
            self.emit(EditorEvent::InteractionChange);
        }
    }

    fn to_canvas(&self, screen: Point) -> Point {
        self.state.layout.canvas.screen_to_canvas(screen)
    }

    fn node_at(&self, p: Point) -> Option<String> {
        self.engine.find_node_at_point(&self.state.layout, &self.state.genogram, p)
    }

    pub fn handle_mouse_down(&mut self, screen: Point, modifiers: Modifiers) {
        if !finite(screen) {
            return;
        }
        let p = self.to_canvas(screen);
        match self.interaction.mode {
            ToolMode::Select | ToolMode::MultiSelect => self.begin_select_gesture(p, modifiers),
            ToolMode::Pan => self.interaction.pan = Some(PanGesture { last: screen }),
            ToolMode::Connect => self.begin_connection(p),
            ToolMode::CreateNode => {
                let position = self.engine.place_new_node(&self.state.layout, p);
                self.interaction.node_preview = Some(NodeCreationPreview { position });
            }
        }
        self.emit(EditorEvent::InteractionChange);
    }

    fn begin_select_gesture(&mut self, p: Point, modifiers: Modifiers) {
        let additive = self.interaction.mode == ToolMode::MultiSelect || modifiers.shift || modifiers.ctrl;
        let g = &self.state.genogram;
        let layout = &self.state.layout;
        if let Some(id) = self.engine.find_node_at_point(layout, g, p) {
            if !layout.nodes.get(&id).is_some_and(|n| n.selected) {
                self.select(Selection::nodes([id]), !additive);
            }
            self.begin_drag(p);
        } else if let Some(id) = self.engine.find_text_at_point(layout, g, p) {
            if !layout.texts.get(&id).is_some_and(|t| t.selected) {
                self.select(Selection { texts: vec![id], ..Selection::default() }, !additive);
            }
            self.begin_drag(p);
        } else if let Some(id) = self.engine.find_connection_at_point(layout, g, p) {
            self.select(Selection { edges: vec![id], ..Selection::default() }, !additive);
        } else {
            if !additive && !self.state.layout.selection().is_empty() {
                self.deselect_all();
            }
            self.interaction.selection_box =
                Some(SelectionBox { start: p, current: p, additive, preview_ids: Vec::new() });
        }
    }

    fn begin_drag(&mut self, p: Point) {
        let layout = &self.state.layout;
        let mut nodes: Vec<(String, Point)> = layout
            .nodes
            .iter()
            .filter(|(_, n)| n.selected && !n.locked)
            .map(|(id, n)| (id.clone(), n.position))
            .collect();
        let mut texts: Vec<(String, Point)> =
            layout.texts.iter().filter(|(_, t)| t.selected).map(|(id, t)| (id.clone(), t.position)).collect();
        nodes.sort_by(|a, b| a.0.cmp(&b.0));
        texts.sort_by(|a, b| a.0.cmp(&b.0));
        self.interaction.drag = Some(DragState { start: p, current: p, nodes, texts });
    }

    fn begin_connection(&mut self, p: Point) {
        let kind = self.interaction.connection_kind;
        let source = match self.node_at(p) {
            Some(id) => Some(id),
            // A child link can also start from a partner line.
            None if kind == ConnectionKind::ParentChild => self
                .engine
                .find_connection_at_point(&self.state.layout, &self.state.genogram, p)
                .filter(|id| {
                    self.state.genogram.connections.get(id).is_some_and(|c| c.entity.kind() == ConnectionKind::Partner)
                }),
            None => None,
        };
        if let Some(source_id) = source {
            self.interaction.connection =
                Some(ConnectionPreview { source_id, kind, start: p, current: p, target_id: None });
        }
    }

    pub fn handle_mouse_move(&mut self, screen: Point) {
        if !finite(screen) {
            return;
        }
        let p = self.to_canvas(screen);
        let mut pan_delta = None;
        let changed = if let Some(drag) = self.interaction.drag.as_mut() {
            drag.current = p;
            true
        } else if let Some(b) = self.interaction.selection_box.as_mut() {
            b.current = p;
            b.preview_ids = self.engine.find_nodes_in_rect(&self.state.layout, &self.state.genogram, b.start, p);
            true
        } else if let Some(c) = self.interaction.connection.as_mut() {
            c.current = p;
            c.target_id = self
                .engine
                .find_node_at_point(&self.state.layout, &self.state.genogram, p)
                .filter(|t| *t != c.source_id);
            true
        } else if let Some(pan) = self.interaction.pan.as_mut() {
            pan_delta = Some((screen.x - pan.last.x, screen.y - pan.last.y));
            pan.last = screen;
            false
        } else if let Some(preview) = self.interaction.node_preview.as_mut() {
            preview.position = self.engine.place_new_node(&self.state.layout, p);
            true
        } else {
            let hover = self.engine.find_node_at_point(&self.state.layout, &self.state.genogram, p);
            let changed = hover != self.interaction.hover_id;
            self.interaction.hover_id = hover;
            changed
        };
        if let Some((dx, dy)) = pan_delta {
            self.pan(dx, dy);
        }
        if changed {
            self.emit(EditorEvent::InteractionChange);
        }
    }

    pub fn handle_mouse_up(&mut self, screen: Point) {
        if !finite(screen) {
            return;
        }
        let p = self.to_canvas(screen);
        if let Some(mut drag) = self.interaction.drag.take() {
            drag.current = p;
            self.finish_drag(&drag);
        } else if let Some(b) = self.interaction.selection_box.take() {
            let ids = self.engine.find_nodes_in_rect(&self.state.layout, &self.state.genogram, b.start, p);
            if !ids.is_empty() {
                self.select(Selection::nodes(ids), !b.additive);
            }
        } else if let Some(c) = self.interaction.connection.take() {
            match self.node_at(p).filter(|t| *t != c.source_id) {
                Some(target) => self.finish_connection(c.kind, &c.source_id, &target),
                None => debug!("editor: connection released without a target"),
            }
        } else if self.interaction.pan.take().is_some() {
            // Pan deltas were applied on move.
        } else if self.interaction.node_preview.take().is_some() {
            self.add_person(p, PersonAttribute::default());
        } else {
            return;
        }
        self.emit(EditorEvent::InteractionChange);
    }

    fn finish_drag(&mut self, drag: &DragState) {
        let d = drag.delta();
        if d.x == 0.0 && d.y == 0.0 {
            return;
        }
        let shift = |origin: Point| self.snap_if_enabled(Point { x: origin.x + d.x, y: origin.y + d.y });
        let mut commands: Vec<Command> =
            drag.nodes.iter().map(|(id, origin)| MoveSubject::new(id.clone(), shift(*origin)).into()).collect();
        commands.extend(drag.texts.iter().map(|(id, origin)| Command::from(MoveAnnotation::new(id.clone(), shift(*origin)))));
        self.execute_transaction(commands);
    }

    fn finish_connection(&mut self, kind: ConnectionKind, source: &str, target: &str) {
        let created = match kind {
            ConnectionKind::Partner => self.add_partner_relationship(source, target),
            ConnectionKind::ParentChild => self.add_child_relationship(source, target),
            ConnectionKind::Relation => self.add_emotional_relationship(source, target, RelationStatus::default()),
            ConnectionKind::Influence => self.add_influence_relationship(source, target, InfluenceStatus::default()),
            ConnectionKind::Group => self.add_group(vec![source.to_string(), target.to_string()]),
        };
        if created.is_none() {
            debug!("editor: {kind:?} connection from {source} to {target} not created");
        }
    }

    /// Wheel up zooms in around the pointer.
    pub fn handle_wheel(&mut self, delta_y: f64, screen: Point) {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return;
        }
        let factor = if delta_y < 0.0 { WHEEL_ZOOM_STEP } else { 1.0 / WHEEL_ZOOM_STEP };
        self.zoom_at(factor, screen);
    }

    // Documents

    pub fn serialize(&self) -> EditorDocument {
        json::to_document(&self.state, &self.view_settings)
    }

    /// Replaces the whole document. History is cleared and the loaded state
    /// counts as saved.
    pub fn deserialize(&mut self, doc: EditorDocument) {
        let needs_layout = needs_auto_layout(&doc);
        let (mut state, view_settings) = json::from_document(doc, self.clock.clone());
        if needs_layout {
            let updated_at = state.genogram.metadata.updated_at.clone();
            let positions = self.engine.auto_layout_by_generation(&state.genogram, &state.layout, Point::default());
            for (id, p) in positions {
                Command::from(MoveSubject::new(id, p)).execute(&mut state);
            }
            state.genogram.metadata.updated_at = updated_at;
            info!("editor: laid out imported document without coordinates");
        }
        info!(
            "editor: loaded document {} ({} subjects, {} connections)",
            state.genogram.id,
            state.genogram.subjects.len(),
            state.genogram.connections.len()
        );
        self.install(state, view_settings);
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        json::to_json(&self.serialize())
    }

    pub fn from_json(&mut self, text: &str) -> Result<(), DocumentError> {
        let doc = json::from_json(text).map_err(|err| {
            warn!("editor: document rejected: {err}");
            err
        })?;
        self.deserialize(doc);
        Ok(())
    }

    pub fn new_document(&mut self, title: &str) {
        let state = fresh_state(&self.config, self.clock.clone(), Some(title));
        info!("editor: new document {}", state.genogram.id);
        let view_settings = self.view_settings.clone();
        self.install(state, view_settings);
    }

    fn install(&mut self, state: EditorState, view_settings: ViewSettings) {
        self.engine.grid_size = state.layout.canvas.grid_size;
        self.state = state;
        self.view_settings = view_settings;
        self.interaction.reset_gestures();
        self.history.clear();
        self.last_auto_save_ms = self.clock.now_millis();
        self.emit(EditorEvent::StateChange { reason: ChangeReason::Load });
        self.emit(EditorEvent::SelectionChange { selection: self.state.layout.selection() });
        self.emit(EditorEvent::ViewChange);
    }

    /// Call periodically. Emits an auto-save notification once the interval
    /// has elapsed and there are unsaved changes; persisting is up to the
    /// listener.
    pub fn poll_auto_save(&mut self) -> bool {
        let Some(interval) = self.config.auto_save_interval_ms else {
            return false;
        };
        let now = self.clock.now_millis();
        if now.saturating_sub(self.last_auto_save_ms) < interval {
            return false;
        }
        self.last_auto_save_ms = now;
        if !self.history.has_unsaved_changes() {
            return false;
        }
        self.emit(EditorEvent::StateChange { reason: ChangeReason::AutoSave });
        true
    }
}

fn finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

fn fresh_state(config: &EditorConfig, clock: SharedClock, title: Option<&str>) -> EditorState {
    let mut state = EditorState::new(clock);
    if let Some(title) = title {
        state.genogram.metadata.title = title.to_string();
    }
    state.layout.canvas.grid_snap = config.grid_snap;
    state.layout.canvas.grid_size = config.grid_size;
    state
}

/// Imported data with no saved layout and every subject stacked on one
/// point gets arranged by generation.
fn needs_auto_layout(doc: &EditorDocument) -> bool {
    let subjects = &doc.genogram.subjects;
    doc.layout.nodes.is_empty()
        && subjects.len() > 1
        && subjects.iter().all(|s| s.layout.center == subjects[0].layout.center)
}
