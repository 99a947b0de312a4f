//! Inbound frame classification
//!
//! A frame is a control-plane request when its top-level object carries a
//! `method` key; every other JSON object belongs to the pass-through channel.

use serde_json::{Map, Value};

use super::types::RpcRequest;
use crate::error::FrameError;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Control(RpcRequest),
    PassThrough,
}

pub fn parse_frame(text: &str) -> Result<Frame, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(|_| FrameError::InvalidJson)?;
    let Value::Object(mut obj) = value else {
        return Err(FrameError::NotAnObject);
    };

    if !obj.contains_key("method") {
        return Ok(Frame::PassThrough);
    }

    let id = obj.get("id").and_then(request_id).ok_or(FrameError::InvalidId)?;
    let method = obj
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if method.is_empty() {
        return Err(FrameError::EmptyMethod);
    }

    let params = match obj.remove("params") {
        Some(Value::Object(params)) => params,
        _ => Map::new(),
    };
    let token = obj.get("token").and_then(Value::as_str).map(str::to_string);

    Ok(Frame::Control(RpcRequest {
        id,
        method,
        params,
        token,
    }))
}

/// Non-negative integer id; integral floats are accepted
fn request_id(value: &Value) -> Option<u64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(id) = n.as_u64() {
        return Some(id);
    }
    let f = n.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}
