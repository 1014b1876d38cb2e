use crate::clock::SharedClock;
use crate::config::ViewSettings;
use crate::error::DocumentError;
use crate::layout::{CanvasState, EdgeLayout, LayoutState, NodeLayout, TextLayout};
use crate::model::{new_id, Annotation, Connection, Genogram, GenogramView, Metadata, Subject, SCHEMA_VERSION};
use crate::state::EditorState;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenogramDocument {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub view: GenogramView,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    #[serde(default)]
    pub canvas: CanvasState,
    #[serde(default)]
    pub nodes: Vec<(String, NodeLayout)>,
    #[serde(default)]
    pub edges: Vec<(String, EdgeLayout)>,
    #[serde(default)]
    pub texts: Vec<(String, TextLayout)>,
}

/// The serialized form exchanged with persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorDocument {
    pub genogram: GenogramDocument,
    #[serde(default)]
    pub layout: LayoutDocument,
    #[serde(default)]
    pub view_settings: ViewSettings,
}

fn sorted_values<T: Clone>(map: &std::collections::HashMap<String, T>) -> Vec<T> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys.into_iter().map(|k| map[k].clone()).collect()
}

fn sorted_entries<T: Clone>(map: &std::collections::HashMap<String, T>) -> Vec<(String, T)> {
    let mut entries: Vec<(String, T)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// Maps become arrays sorted by id so equal states serialize identically.
pub fn to_document(state: &EditorState, view_settings: &ViewSettings) -> EditorDocument {
    let g = &state.genogram;
    EditorDocument {
        genogram: GenogramDocument {
            id: g.id.clone(),
            version: g.version.clone(),
            metadata: g.metadata.clone(),
            subjects: sorted_values(&g.subjects),
            connections: sorted_values(&g.connections),
            annotations: sorted_values(&g.annotations),
            view: g.view.clone(),
        },
        layout: LayoutDocument {
            canvas: state.layout.canvas.clone(),
            nodes: sorted_entries(&state.layout.nodes),
            edges: sorted_entries(&state.layout.edges),
            texts: sorted_entries(&state.layout.texts),
        },
        view_settings: view_settings.clone(),
    }
}

/// Rebuilds editor state from a document. Layout entries for unknown ids are
/// dropped and missing ones are rebuilt from domain positions; the
/// connection index is rebuilt from scratch.
pub fn from_document(doc: EditorDocument, clock: SharedClock) -> (EditorState, ViewSettings) {
    let gd = doc.genogram;
    let genogram = Genogram {
        id: gd.id,
        version: gd.version,
        metadata: gd.metadata,
        subjects: gd.subjects.into_iter().map(|s| (s.id.clone(), s)).collect(),
        connections: gd.connections.into_iter().map(|c| (c.id.clone(), c)).collect(),
        annotations: gd.annotations.into_iter().map(|a| (a.id.clone(), a)).collect(),
        view: gd.view,
    };
    let saved = LayoutState {
        canvas: doc.layout.canvas,
        nodes: doc.layout.nodes.into_iter().collect(),
        edges: doc.layout.edges.into_iter().collect(),
        texts: doc.layout.texts.into_iter().collect(),
    };
    let layout = LayoutState::reconstruct(&genogram, &saved);
    (EditorState::from_parts(genogram, layout, clock), doc.view_settings)
}

pub fn to_json(doc: &EditorDocument) -> Result<String, DocumentError> {
    Ok(serde_json::to_string(doc)?)
}

pub fn to_json_value(doc: &EditorDocument) -> Result<Value, DocumentError> {
    Ok(serde_json::to_value(doc)?)
}

/// Parses a document, repairing legacy shapes first.
pub fn from_json(text: &str) -> Result<EditorDocument, DocumentError> {
    let value: Value = serde_json::from_str(text)?;
    from_json_value(value)
}

pub fn from_json_value(mut value: Value) -> Result<EditorDocument, DocumentError> {
    let repaired = migrate_document(&mut value)?;
    if repaired > 0 {
        warn!("document migration filled {repaired} legacy field(s)");
    }
    Ok(serde_json::from_value(value)?)
}

fn fill(obj: &mut Map<String, Value>, key: &str, default: Value) -> usize {
    if obj.contains_key(key) {
        0
    } else {
        obj.insert(key.to_string(), default);
        1
    }
}

/// Accepts `{id: item}` maps where arrays are expected.
fn as_array(obj: &mut Map<String, Value>, key: &str) -> usize {
    match obj.get_mut(key) {
        None | Some(Value::Null) => {
            obj.insert(key.to_string(), Value::Array(Vec::new()));
            1
        }
        Some(Value::Object(map)) => {
            let items: Vec<Value> = std::mem::take(map).into_iter().map(|(_, v)| v).collect();
            obj.insert(key.to_string(), Value::Array(items));
            1
        }
        Some(_) => 0,
    }
}

fn default_extra_info() -> Value {
    json!({ "enable": false, "job": null, "education": null, "region": null, "shortNote": null })
}

fn migrate_subject(subject: &mut Value) -> usize {
    let Some(obj) = subject.as_object_mut() else { return 0 };
    let mut n = fill(obj, "layout", json!({ "center": { "x": 0.0, "y": 0.0 } }));
    if let Some(layout) = obj.get_mut("layout").and_then(Value::as_object_mut) {
        n += fill(layout, "center", json!({ "x": 0.0, "y": 0.0 }));
    }
    let Some(entity) = obj.get_mut("entity").and_then(Value::as_object_mut) else { return n };
    n += fill(entity, "memo", Value::Null);
    if entity.get("type").and_then(Value::as_str) != Some("PERSON") {
        return n;
    }
    let Some(attr) = entity.get_mut("attribute").and_then(Value::as_object_mut) else { return n };
    n += fill(attr, "isIP", Value::Bool(false));
    n += fill(attr, "extraInfo", default_extra_info());
    if let Some(extra) = attr.get_mut("extraInfo").and_then(Value::as_object_mut) {
        n += fill(extra, "enable", Value::Bool(false));
        for key in ["job", "education", "region", "shortNote"] {
            n += fill(extra, key, Value::Null);
        }
    }
    n
}

/// Single schema-evolution pass over a raw document. Returns the number of
/// fields it had to fill or reshape.
pub fn migrate_document(value: &mut Value) -> Result<usize, DocumentError> {
    let Some(root) = value.as_object_mut() else {
        return Err(DocumentError::InvalidDocument("root must be an object".into()));
    };
    let mut n = 0;
    // Bare genogram without the layout envelope.
    if !root.contains_key("genogram") && root.contains_key("subjects") {
        let inner = std::mem::take(root);
        root.insert("genogram".to_string(), Value::Object(inner));
        n += 1;
    }
    n += fill(root, "layout", json!({}));
    n += fill(root, "viewSettings", json!({}));
    let Some(g) = root.get_mut("genogram").and_then(Value::as_object_mut) else {
        return Err(DocumentError::InvalidDocument("missing genogram object".into()));
    };
    n += fill(g, "id", Value::String(new_id()));
    if g.get("version").and_then(Value::as_str) != Some(SCHEMA_VERSION) {
        g.insert("version".to_string(), Value::String(SCHEMA_VERSION.to_string()));
        n += 1;
    }
    n += fill(g, "metadata", json!({}));
    for key in ["subjects", "connections", "annotations"] {
        n += as_array(g, key);
    }
    if let Some(subjects) = g.get_mut("subjects").and_then(Value::as_array_mut) {
        n += subjects.iter_mut().map(migrate_subject).sum::<usize>();
    }
    Ok(n)
}
