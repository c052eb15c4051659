//! Island props resolution and the serialized props codec.
//!
//! The payload written into an island's props attribute is plain JSON of
//! the resolved props object. `decode_props(encode_props(p)) == p` for every
//! JSON-representable object.

use isle_core::RouteParams;
use isle_islands::{PropValue, Props};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{RenderError, RenderResult};

/// Props after per-request resolution.
pub type ResolvedProps = Map<String, Value>;

/// Per-request values that props may refer to.
#[derive(Debug, Clone, Default)]
pub struct PropScope<'a> {
    pub params: Option<&'a RouteParams>,
    pub data: Option<&'a Value>,
}

/// Resolve one prop value. Function references have no JSON form.
pub fn resolve_prop(value: &PropValue, scope: &PropScope<'_>) -> Result<Value, String> {
    match value {
        PropValue::Json(v) => Ok(v.clone()),
        PropValue::Param(name) => Ok(scope
            .params
            .and_then(|p| p.get(name))
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null)),
        PropValue::Data(pointer) => Ok(scope
            .data
            .and_then(|d| d.pointer(pointer))
            .cloned()
            .unwrap_or(Value::Null)),
        PropValue::Function(name) => Err(format!("function `{}` cannot be serialized", name)),
    }
}

/// Resolve island props. Any non-serializable prop fails the render.
pub fn resolve_island_props(
    component: &str,
    props: &Props,
    scope: &PropScope<'_>,
) -> RenderResult<ResolvedProps> {
    props
        .iter()
        .map(|(name, value)| {
            resolve_prop(value, scope)
                .map(|v| (name.clone(), v))
                .map_err(|reason| RenderError::NonSerializableProp {
                    component: component.to_string(),
                    prop: name.clone(),
                    reason,
                })
        })
        .collect()
}

/// Resolve props of a server-only component. Function references are
/// dropped since server components never run client handlers.
pub fn resolve_server_props(props: &Props, scope: &PropScope<'_>) -> ResolvedProps {
    props
        .iter()
        .filter_map(|(name, value)| resolve_prop(value, scope).ok().map(|v| (name.clone(), v)))
        .collect()
}

/// Encode resolved props as the JSON payload of an island placeholder.
pub fn encode_props(props: &ResolvedProps) -> RenderResult<String> {
    Ok(serde_json::to_string(props)?)
}

/// Errors decoding a props payload.
#[derive(Error, Debug)]
pub enum PropsError {
    #[error("Malformed props payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Props payload is not an object")]
    NotAnObject,
}

/// Decode a props payload. An empty payload decodes to an empty object.
pub fn decode_props(payload: &str) -> Result<ResolvedProps, PropsError> {
    if payload.trim().is_empty() {
        return Ok(ResolvedProps::new());
    }
    match serde_json::from_str::<Value>(payload)? {
        Value::Object(map) => Ok(map),
        _ => Err(PropsError::NotAnObject),
    }
}
