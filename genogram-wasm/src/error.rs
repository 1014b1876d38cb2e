use crate::interop::{new_obj, set_kv};
use genogram::DocumentError;
use wasm_bindgen::JsValue;

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data {
        set_kv(&e, "data", &d);
    }
    set_kv(&root, "error", &e.into());
    root.into()
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    let d = new_obj();
    set_kv(&d, "param", &JsValue::from_str(param));
    err("non_finite", format!("parameter '{param}' must be finite"), Some(d.into()))
}

#[inline]
pub fn invalid_id(kind: &str, id: &str) -> JsValue {
    let d = new_obj();
    set_kv(&d, "kind", &JsValue::from_str(kind));
    set_kv(&d, "id", &JsValue::from_str(id));
    err("invalid_id", format!("invalid {kind} id"), Some(d.into()))
}

#[inline]
pub fn invalid_argument(param: &str, message: impl Into<String>) -> JsValue {
    let d = new_obj();
    set_kv(&d, "param", &JsValue::from_str(param));
    err("invalid_argument", message, Some(d.into()))
}

#[inline]
pub fn rejected(operation: &str) -> JsValue {
    let d = new_obj();
    set_kv(&d, "operation", &JsValue::from_str(operation));
    err("rejected", format!("{operation} was rejected"), Some(d.into()))
}

#[inline]
pub fn read_only() -> JsValue {
    err("read_only", "document is read-only", None)
}

pub fn document(e: &DocumentError) -> JsValue {
    err(e.code(), e.to_string(), None)
}
