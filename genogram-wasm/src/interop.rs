use js_sys::{Object, Reflect};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::JsValue;

pub fn new_obj() -> Object {
    Object::new()
}

pub fn set_kv(obj: &Object, k: &str, v: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(k), v);
}

/// Plain JS objects (not `Map`s) so hosts can JSON.stringify the result.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    let ser = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&ser).unwrap_or(JsValue::NULL)
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, String> {
    serde_wasm_bindgen::from_value(value).map_err(|e| e.to_string())
}

/// `null`/`undefined` mean "use the default".
pub fn from_js_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, String> {
    if value.is_null() || value.is_undefined() {
        return Ok(T::default());
    }
    from_js(value)
}

/// Parses a serde enum from its wire name, e.g. `"PARTNER"` or `"connect"`.
pub fn parse_name<T: DeserializeOwned>(name: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
}
