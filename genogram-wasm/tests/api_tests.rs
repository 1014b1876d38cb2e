use genogram_wasm::GenogramEditor;
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn get(v: &JsValue, key: &str) -> JsValue {
    Reflect::get(v, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn is_ok(v: &JsValue) -> bool {
    get(v, "ok").as_bool() == Some(true)
}

fn is_err_code(v: &JsValue, code: &str) -> bool {
    if get(v, "ok").as_bool() != Some(false) {
        return false;
    }
    get(&get(v, "error"), "code").as_string().map_or(false, |c| c == code)
}

fn obj(pairs: &[(&str, JsValue)]) -> JsValue {
    let o = Object::new();
    for (k, v) in pairs {
        Reflect::set(&o, &JsValue::from_str(k), v).unwrap();
    }
    o.into()
}

#[wasm_bindgen_test]
fn invalid_ids_return_typed_errors() {
    let mut ed = GenogramEditor::new(JsValue::NULL);
    assert!(is_err_code(&ed.delete_person_res("nope"), "invalid_id"));
    assert!(is_err_code(&ed.move_person_res("nope", 0.0, 0.0), "invalid_id"));
    assert!(is_err_code(&ed.delete_relationship_res("nope"), "invalid_id"));
    assert!(is_err_code(&ed.add_child_relationship_res("nope", "also-nope"), "invalid_id"));
    assert!(!ed.can_undo(), "state mutated on error");
}

#[wasm_bindgen_test]
fn non_finite_coordinates_are_rejected() {
    let mut ed = GenogramEditor::new(JsValue::NULL);
    let r = ed.add_person_res(f64::NAN, 0.0, JsValue::NULL);
    assert!(is_err_code(&r, "non_finite"));
    assert_eq!(get(&get(&get(&r, "error"), "data"), "param").as_string().as_deref(), Some("x"));

    let id = ed.add_person(0.0, 0.0, JsValue::NULL).unwrap();
    assert!(is_err_code(&ed.move_person_res(&id, 0.0, f64::INFINITY), "non_finite"));
}

#[wasm_bindgen_test]
fn partner_and_child_envelopes() {
    let mut ed = GenogramEditor::new(JsValue::NULL);
    let a = ed.add_person(0.0, 0.0, JsValue::NULL).unwrap();
    let b = ed.add_person(200.0, 0.0, JsValue::NULL).unwrap();
    let c = ed.add_person(100.0, 200.0, JsValue::NULL).unwrap();

    assert!(is_err_code(&ed.add_partner_relationship_res(&a, &a), "invalid_argument"));
    let r = ed.add_partner_relationship_res(&a, &b);
    assert!(is_ok(&r));
    let partner = get(&r, "value").as_string().unwrap();

    let r = ed.add_child_relationship_res(&partner, &c);
    assert!(is_ok(&r));
    assert_eq!(ed.children_of(&partner).len(), 1);
    assert_eq!(ed.connections_of(&c).len(), 1);

    assert!(is_ok(&ed.delete_relationship_res(&partner)));
    assert!(ed.children_of(&partner).is_empty());
    assert!(ed.undo());
    assert_eq!(ed.children_of(&partner).len(), 1);
}

#[wasm_bindgen_test]
fn read_only_blocks_structural_edits() {
    let mut ed = GenogramEditor::new(JsValue::NULL);
    let id = ed.add_person(0.0, 0.0, JsValue::NULL).unwrap();
    assert!(ed.set_view_settings(obj(&[("readOnly", JsValue::TRUE)])));

    assert!(is_err_code(&ed.add_person_res(40.0, 0.0, JsValue::NULL), "read_only"));
    assert!(is_err_code(&ed.delete_person_res(&id), "read_only"));
    assert!(ed.add_person(40.0, 0.0, JsValue::NULL).is_none());
    assert!(!ed.undo());

    // View changes still go through.
    ed.set_zoom(2.0);
    assert_eq!(get(&get(&get(&ed.serialize(), "layout"), "canvas"), "zoom").as_f64(), Some(2.0));
}

#[wasm_bindgen_test]
fn serialize_deserialize_round_trip() {
    let mut ed = GenogramEditor::new(JsValue::NULL);
    let a = ed.add_person(0.0, 0.0, JsValue::NULL).unwrap();
    let b = ed.add_person(200.0, 0.0, JsValue::NULL).unwrap();
    ed.add_partner_relationship(&a, &b).unwrap();
    ed.add_annotation("note", 40.0, 40.0).unwrap();
    let json = ed.to_json().unwrap();

    let mut other = GenogramEditor::new(JsValue::NULL);
    assert!(is_ok(&other.deserialize_res(ed.serialize())));
    assert_eq!(other.to_json().unwrap(), json);
    assert!(!other.can_undo(), "loading clears history");

    let mut third = GenogramEditor::new(JsValue::NULL);
    assert!(is_ok(&third.from_json_res(&json)));
    assert_eq!(third.to_json().unwrap(), json);
}

#[wasm_bindgen_test]
fn malformed_documents_report_codes() {
    let mut ed = GenogramEditor::new(JsValue::NULL);
    assert!(is_err_code(&ed.from_json_res("{not json"), "invalid_json"));
    assert!(is_err_code(&ed.from_json_res("[1, 2]"), "invalid_document"));
    assert!(is_err_code(&ed.deserialize_res(JsValue::from_f64(3.0)), "invalid_document"));
    assert!(!ed.from_json("{}"));
}

#[wasm_bindgen_test]
fn tool_modes_parse_by_wire_name() {
    let mut ed = GenogramEditor::new(JsValue::NULL);
    assert!(ed.set_tool_mode("createNode"));
    assert_eq!(get(&ed.get_interaction(), "mode").as_string().as_deref(), Some("createNode"));
    assert!(!ed.set_tool_mode("lasso"));
    assert!(ed.set_connection_kind("PARTNER"));
    assert!(!ed.set_connection_kind("partner"));

    ed.handle_mouse_down(43.0, 38.0, false, false);
    ed.handle_mouse_up(43.0, 38.0);
    let genogram = ed.get_genogram();
    assert_eq!(Array::from(&get(&genogram, "subjects")).length(), 1);
}

#[wasm_bindgen_test]
fn listeners_receive_event_names_until_removed() {
    let mut ed = GenogramEditor::new(JsValue::NULL);
    let seen = Array::new();
    let f = Function::new_with_args("type, event", "this.push(type)").bind0(&seen);
    let token = ed.on(f);

    ed.add_person(0.0, 0.0, JsValue::NULL).unwrap();
    let names: Vec<String> = seen.iter().filter_map(|v| v.as_string()).collect();
    assert!(names.iter().any(|n| n == "state-change"));

    assert!(ed.off(token));
    let before = seen.length();
    ed.add_person(100.0, 0.0, JsValue::NULL).unwrap();
    assert_eq!(seen.length(), before);
    assert!(!ed.off(token));
}
