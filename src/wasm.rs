use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::codec;
use crate::render::RenderMode;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = JSON)]
    fn parse(s: &str) -> JsValue;
}

fn to_js(value: &serde_json::Value) -> JsValue {
    match serde_json::to_string(value) {
        Ok(json_str) => parse(&json_str),
        Err(_) => JsValue::NULL,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    id: &'a str,
    code: i32,
    name: &'a str,
    message: &'a str,
    kind: Option<&'static str>,
    depth: usize,
    causes: Vec<&'a str>,
}

/// Renders a wire payload. Undecodable input renders the decode warning.
#[wasm_bindgen]
pub fn render(json: &str, detailed: bool) -> String {
    let err = codec::decode_or_warning(json.as_bytes());
    let mode = if detailed {
        RenderMode::Detailed
    } else {
        RenderMode::Compact
    };
    err.format(mode)
}

/// Summary of a wire payload: id, code, name, message, kind, depth and
/// cause messages, or `{"error": ...}` when it does not decode.
#[wasm_bindgen]
pub fn inspect(json: &str) -> JsValue {
    let err = match codec::decode_str(json) {
        Ok(err) => err,
        Err(e) => return error_result(&e.to_string()),
    };
    let summary = Summary {
        id: err.id(),
        code: err.code(),
        name: err.name(),
        message: err.message(),
        kind: err.kind().map(|kind| kind.name()),
        depth: err.depth(),
        causes: err.causes().map(|cause| cause.message()).collect(),
    };
    serde_wasm_bindgen::to_value(&summary).unwrap_or(JsValue::NULL)
}

/// Whether any level of a wire payload carries `message`.
#[wasm_bindgen]
pub fn contains_message(json: &str, message: &str) -> bool {
    codec::decode_str(json).is_ok_and(|err| err.contains_message(message))
}

fn error_result(msg: &str) -> JsValue {
    let obj = serde_json::json!({"error": msg});
    to_js(&obj)
}
