//! OpenAI pass-through helpers
//!
//! The pass-through path forwards the front request body nearly verbatim;
//! only the `model` field is touched, both on the way up (bare upstream
//! model) and on the way down (namespaced `freerouter/<model>`). Messages,
//! tools, and usage fields flow through untouched, so unknown fields
//! survive.

use serde_json::Value;

use crate::translate::anthropic::public_model;

/// Prepare the upstream request body from the raw front body
pub fn prepare_body(raw: &Value, bare_model: &str, stream: bool) -> Value {
    let mut body = raw.clone();
    if let Some(obj) = body.as_object_mut() {
        obj.insert("model".to_owned(), Value::String(bare_model.to_owned()));
        if stream {
            obj.insert("stream".to_owned(), Value::Bool(true));
        } else {
            obj.remove("stream");
        }
    }
    body
}

/// Rewrite the `model` field of a response or chunk to the public namespace
pub fn rewrite_model(value: &mut Value, bare_model: &str) {
    if let Some(obj) = value.as_object_mut() {
        obj.insert("model".to_owned(), Value::String(public_model(bare_model)));
    }
}
