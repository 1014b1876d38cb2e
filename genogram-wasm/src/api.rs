use crate::interop::{from_js, from_js_or_default, parse_name, to_js};
use crate::GenogramEditor;
use genogram::commands::{AnnotationUpdate, ConnectionUpdate, SubjectUpdate};
use genogram::model::{
    AnimalAttribute, AnnotationStyle, ConnectionEntity, ConnectionKind, ConnectionLayout, FetusAttribute,
    InfluenceStatus, PersonAttribute, Point, RelationStatus, SubjectEntity, SubjectStyle,
};
use genogram::{EditorConfig, ListenerId, Modifiers, Selection, ToolMode, ViewSettings};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
type JsValue = wasm_bindgen::JsValue;
use crate::error;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SubjectPatch {
    entity: Option<SubjectEntity>,
    style: Option<SubjectStyle>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ConnectionPatch {
    entity: Option<ConnectionEntity>,
    layout: Option<ConnectionLayout>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct AnnotationPatch {
    text: Option<String>,
    style: Option<AnnotationStyle>,
}

#[derive(Deserialize)]
struct MoveTo {
    id: String,
    x: f64,
    y: f64,
}

fn finite_xy(x: f64, y: f64) -> Result<Point, JsValue> {
    if !x.is_finite() {
        return Err(error::non_finite("x"));
    }
    if !y.is_finite() {
        return Err(error::non_finite("y"));
    }
    Ok(Point::new(x, y))
}

fn id_or_rejected(id: Option<String>, operation: &str) -> JsValue {
    match id {
        Some(id) => error::ok(JsValue::from_str(&id)),
        None => error::rejected(operation),
    }
}

impl GenogramEditor {
    fn guard_writable(&self) -> Result<(), JsValue> {
        if self.inner.view_settings().read_only {
            Err(error::read_only())
        } else {
            Ok(())
        }
    }

    fn deserialize_inner(&mut self, doc: JsValue) -> Result<(), JsValue> {
        let value = from_js::<serde_json::Value>(doc).map_err(|msg| error::err("invalid_json", msg, None))?;
        let doc = genogram::json::from_json_value(value).map_err(|e| error::document(&e))?;
        self.inner.deserialize(doc);
        Ok(())
    }
}

#[wasm_bindgen]
impl GenogramEditor {
    /// `config` is a partial `EditorConfig` object, or null for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> GenogramEditor {
        let config = from_js_or_default::<EditorConfig>(config).unwrap_or_else(|e| {
            log::warn!("genogram-wasm: ignoring invalid config: {e}");
            EditorConfig::default()
        });
        GenogramEditor::rs_new(config)
    }

    // Subjects
    pub fn add_person(&mut self, x: f64, y: f64, attribute: JsValue) -> Option<String> {
        let attribute = from_js_or_default::<PersonAttribute>(attribute).ok()?;
        self.inner.add_person(Point::new(x, y), attribute)
    }
    pub fn add_person_res(&mut self, x: f64, y: f64, attribute: JsValue) -> JsValue {
        let p = match finite_xy(x, y) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let attribute = match from_js_or_default::<PersonAttribute>(attribute) {
            Ok(a) => a,
            Err(msg) => return error::invalid_argument("attribute", msg),
        };
        if let Err(e) = self.guard_writable() {
            return e;
        }
        id_or_rejected(self.inner.add_person(p, attribute), "add_person")
    }
    pub fn add_animal(&mut self, x: f64, y: f64, attribute: JsValue) -> Option<String> {
        let attribute = from_js_or_default::<AnimalAttribute>(attribute).ok()?;
        self.inner.add_animal(Point::new(x, y), attribute)
    }
    pub fn add_fetus(&mut self, x: f64, y: f64, attribute: JsValue) -> Option<String> {
        let attribute = from_js_or_default::<FetusAttribute>(attribute).ok()?;
        self.inner.add_fetus(Point::new(x, y), attribute)
    }
    pub fn update_subject(&mut self, id: &str, patch: JsValue) -> bool {
        match from_js::<SubjectPatch>(patch) {
            Ok(p) => self.inner.update_subject(id, SubjectUpdate { entity: p.entity, style: p.style }),
            Err(_) => false,
        }
    }
    pub fn update_subject_res(&mut self, id: &str, patch: JsValue) -> JsValue {
        if !self.inner.genogram().subjects.contains_key(id) {
            return error::invalid_id("subject", id);
        }
        let p = match from_js::<SubjectPatch>(patch) {
            Ok(p) => p,
            Err(msg) => return error::invalid_argument("patch", msg),
        };
        if let Err(e) = self.guard_writable() {
            return e;
        }
        let ok = self.inner.update_subject(id, SubjectUpdate { entity: p.entity, style: p.style });
        error::ok(JsValue::from_bool(ok))
    }
    pub fn delete_person(&mut self, id: &str) -> bool {
        self.inner.delete_person(id)
    }
    pub fn delete_person_res(&mut self, id: &str) -> JsValue {
        if !self.inner.genogram().subjects.contains_key(id) {
            return error::invalid_id("subject", id);
        }
        if let Err(e) = self.guard_writable() {
            return e;
        }
        error::ok(JsValue::from_bool(self.inner.delete_person(id)))
    }
    pub fn move_person(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.inner.move_person(id, Point::new(x, y))
    }
    pub fn move_person_res(&mut self, id: &str, x: f64, y: f64) -> JsValue {
        let p = match finite_xy(x, y) {
            Ok(p) => p,
            Err(e) => return e,
        };
        if !self.inner.genogram().subjects.contains_key(id) {
            return error::invalid_id("subject", id);
        }
        if let Err(e) = self.guard_writable() {
            return e;
        }
        error::ok(JsValue::from_bool(self.inner.move_person(id, p)))
    }
    /// `moves` is an array of `{id, x, y}`.
    pub fn move_multiple_persons(&mut self, moves: JsValue) -> bool {
        let Ok(moves) = from_js::<Vec<MoveTo>>(moves) else {
            return false;
        };
        let moves: Vec<(String, Point)> = moves.into_iter().map(|m| (m.id, Point::new(m.x, m.y))).collect();
        self.inner.move_multiple_persons(&moves)
    }

    // Connections
    pub fn add_partner_relationship(&mut self, a: &str, b: &str) -> Option<String> {
        self.inner.add_partner_relationship(a, b)
    }
    pub fn add_partner_relationship_res(&mut self, a: &str, b: &str) -> JsValue {
        for id in [a, b] {
            if !self.inner.genogram().subjects.contains_key(id) {
                return error::invalid_id("subject", id);
            }
        }
        if a == b {
            return error::invalid_argument("b", "partners must be two different subjects");
        }
        if let Err(e) = self.guard_writable() {
            return e;
        }
        id_or_rejected(self.inner.add_partner_relationship(a, b), "add_partner_relationship")
    }
    pub fn add_child_relationship(&mut self, parent_ref: &str, child_id: &str) -> Option<String> {
        self.inner.add_child_relationship(parent_ref, child_id)
    }
    pub fn add_child_relationship_res(&mut self, parent_ref: &str, child_id: &str) -> JsValue {
        if self.inner.genogram().resolve_parents(parent_ref).is_empty() {
            return error::invalid_id("parent", parent_ref);
        }
        if !self.inner.genogram().subjects.contains_key(child_id) {
            return error::invalid_id("subject", child_id);
        }
        if let Err(e) = self.guard_writable() {
            return e;
        }
        id_or_rejected(self.inner.add_child_relationship(parent_ref, child_id), "add_child_relationship")
    }
    pub fn add_twin_relationship(&mut self, parent_ref: &str, a: &str, b: &str, identical: bool) -> Option<String> {
        self.inner.add_twin_relationship(parent_ref, a, b, identical)
    }
    /// `status` is a wire name such as `"CLOSE"`; empty means the default.
    pub fn add_emotional_relationship(&mut self, a: &str, b: &str, status: &str) -> Option<String> {
        let status = if status.is_empty() { RelationStatus::default() } else { parse_name(status)? };
        self.inner.add_emotional_relationship(a, b, status)
    }
    pub fn add_influence_relationship(&mut self, from: &str, to: &str, status: &str) -> Option<String> {
        let status = if status.is_empty() { InfluenceStatus::default() } else { parse_name(status)? };
        self.inner.add_influence_relationship(from, to, status)
    }
    pub fn add_group(&mut self, member_ids: JsValue) -> Option<String> {
        let members = from_js::<Vec<String>>(member_ids).ok()?;
        self.inner.add_group(members)
    }
    pub fn update_connection(&mut self, id: &str, patch: JsValue) -> bool {
        match from_js::<ConnectionPatch>(patch) {
            Ok(p) => self.inner.update_connection(id, ConnectionUpdate { entity: p.entity, layout: p.layout }),
            Err(_) => false,
        }
    }
    pub fn update_connection_res(&mut self, id: &str, patch: JsValue) -> JsValue {
        if !self.inner.genogram().connections.contains_key(id) {
            return error::invalid_id("connection", id);
        }
        let p = match from_js::<ConnectionPatch>(patch) {
            Ok(p) => p,
            Err(msg) => return error::invalid_argument("patch", msg),
        };
        if let Err(e) = self.guard_writable() {
            return e;
        }
        if self.inner.update_connection(id, ConnectionUpdate { entity: p.entity, layout: p.layout }) {
            error::ok(JsValue::TRUE)
        } else {
            error::invalid_argument("patch", "entity references unknown ids")
        }
    }
    pub fn delete_relationship(&mut self, id: &str) -> bool {
        self.inner.delete_relationship(id)
    }
    pub fn delete_relationship_res(&mut self, id: &str) -> JsValue {
        if !self.inner.genogram().connections.contains_key(id) {
            return error::invalid_id("connection", id);
        }
        if let Err(e) = self.guard_writable() {
            return e;
        }
        error::ok(JsValue::from_bool(self.inner.delete_relationship(id)))
    }
    pub fn connections_of(&self, id: &str) -> Vec<String> {
        self.inner.connections_of(id)
    }
    pub fn children_of(&self, parent_ref: &str) -> Vec<String> {
        self.inner.children_of(parent_ref)
    }

    // Annotations
    pub fn add_annotation(&mut self, text: &str, x: f64, y: f64) -> Option<String> {
        self.inner.add_annotation(text, Point::new(x, y))
    }
    pub fn update_annotation_text(&mut self, id: &str, text: &str) -> bool {
        self.inner.update_annotation_text(id, text)
    }
    pub fn update_annotation(&mut self, id: &str, patch: JsValue) -> bool {
        match from_js::<AnnotationPatch>(patch) {
            Ok(p) => self.inner.update_annotation(id, AnnotationUpdate { text: p.text, style: p.style }),
            Err(_) => false,
        }
    }
    pub fn move_annotation(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.inner.move_annotation(id, Point::new(x, y))
    }
    pub fn delete_annotation(&mut self, id: &str) -> bool {
        self.inner.delete_annotation(id)
    }

    // Selection and view
    /// `selection` is `{nodes?, edges?, texts?}`.
    pub fn select(&mut self, selection: JsValue, clear_others: bool) -> bool {
        match from_js::<Selection>(selection) {
            Ok(s) => {
                self.inner.select(s, clear_others);
                true
            }
            Err(_) => false,
        }
    }
    pub fn select_all(&mut self) {
        self.inner.select_all();
    }
    pub fn deselect_all(&mut self) {
        self.inner.deselect_all();
    }
    pub fn get_selected_items(&self) -> JsValue {
        to_js(&self.inner.selected_items())
    }
    pub fn set_zoom(&mut self, zoom: f64) {
        self.inner.set_zoom(zoom);
    }
    pub fn zoom_at(&mut self, factor: f64, x: f64, y: f64) {
        self.inner.zoom_at(factor, Point::new(x, y));
    }
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.inner.pan(dx, dy);
    }
    pub fn set_grid_snap(&mut self, enabled: bool) {
        self.inner.set_grid_snap(enabled);
    }
    pub fn delete_selected(&mut self) -> bool {
        self.inner.delete_selected()
    }
    pub fn auto_layout(&mut self) -> bool {
        self.inner.auto_layout()
    }

    // History
    pub fn undo(&mut self) -> bool {
        self.inner.undo()
    }
    pub fn redo(&mut self) -> bool {
        self.inner.redo()
    }
    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }
    pub fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }
    pub fn mark_saved(&mut self) {
        self.inner.mark_saved();
    }
    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.has_unsaved_changes()
    }
    pub fn history_status(&self) -> JsValue {
        to_js(&self.inner.history_status())
    }

    // Tools and pointer input
    /// Mode names: `select`, `multiSelect`, `pan`, `connect`, `createNode`.
    pub fn set_tool_mode(&mut self, mode: &str) -> bool {
        match parse_name::<ToolMode>(mode) {
            Some(m) => {
                self.inner.set_tool_mode(m);
                true
            }
            None => false,
        }
    }
    pub fn set_connection_kind(&mut self, kind: &str) -> bool {
        match parse_name::<ConnectionKind>(kind) {
            Some(k) => {
                self.inner.set_connection_kind(k);
                true
            }
            None => false,
        }
    }
    pub fn handle_mouse_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool) {
        self.inner.handle_mouse_down(Point::new(x, y), Modifiers { shift, ctrl });
    }
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        self.inner.handle_mouse_move(Point::new(x, y));
    }
    pub fn handle_mouse_up(&mut self, x: f64, y: f64) {
        self.inner.handle_mouse_up(Point::new(x, y));
    }
    pub fn handle_wheel(&mut self, delta_y: f64, x: f64, y: f64) {
        self.inner.handle_wheel(delta_y, Point::new(x, y));
    }
    pub fn cancel_interaction(&mut self) {
        self.inner.cancel_interaction();
    }

    // Documents
    pub fn serialize(&self) -> JsValue {
        to_js(&self.inner.serialize())
    }
    pub fn deserialize(&mut self, doc: JsValue) -> bool {
        self.deserialize_inner(doc).is_ok()
    }
    pub fn deserialize_res(&mut self, doc: JsValue) -> JsValue {
        match self.deserialize_inner(doc) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => e,
        }
    }
    pub fn to_json(&self) -> Option<String> {
        self.inner.to_json().ok()
    }
    pub fn from_json(&mut self, text: &str) -> bool {
        self.inner.from_json(text).is_ok()
    }
    pub fn from_json_res(&mut self, text: &str) -> JsValue {
        match self.inner.from_json(text) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::document(&e),
        }
    }
    pub fn new_document(&mut self, title: &str) {
        self.inner.new_document(title);
    }
    pub fn poll_auto_save(&mut self) -> bool {
        self.inner.poll_auto_save()
    }

    // Accessors
    pub fn get_genogram(&self) -> JsValue {
        to_js(&self.inner.serialize().genogram)
    }
    pub fn get_layout(&self) -> JsValue {
        to_js(&self.inner.serialize().layout)
    }
    pub fn get_interaction(&self) -> JsValue {
        to_js(self.inner.interaction())
    }
    pub fn get_view_settings(&self) -> JsValue {
        to_js(self.inner.view_settings())
    }
    pub fn set_view_settings(&mut self, settings: JsValue) -> bool {
        match from_js_or_default::<ViewSettings>(settings) {
            Ok(s) => {
                self.inner.set_view_settings(s);
                true
            }
            Err(_) => false,
        }
    }
    pub fn get_config(&self) -> JsValue {
        to_js(self.inner.config())
    }

    // Events
    /// `listener(eventType, event)` runs synchronously after every change.
    /// Returns a token for `off`.
    pub fn on(&mut self, listener: js_sys::Function) -> u32 {
        let id = self.inner.on(move |event| {
            let payload = to_js(event);
            if let Err(e) = listener.call2(&JsValue::NULL, &JsValue::from_str(event.name()), &payload) {
                log::warn!("genogram-wasm: listener threw: {e:?}");
            }
        });
        id.0
    }
    pub fn off(&mut self, token: u32) -> bool {
        self.inner.off(ListenerId(token))
    }
}
