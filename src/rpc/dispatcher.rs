//! Control-plane routing
//!
//! Decodes one inbound frame, authenticates it and calls the installed
//! [`AutomationHandler`]. Pass-through frames are only classified here; the
//! dispatch loop forwards them to the channel.

use serde_json::Value;
use tracing::{debug, warn};

use super::frame::{parse_frame, Frame};
use super::types::{RpcRequest, RpcResponse};
use crate::automation::{AutomationHandler, TargetDescriptor};
use crate::error::{AutomationError, FrameError, Result};

/// Outcome of routing a single frame
#[derive(Debug, PartialEq)]
pub enum Routed {
    Reply(RpcResponse),
    PassThrough,
    Dropped(FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Resolve,
    ExecuteAction,
    ReadProperty,
    Screenshot,
    DumpTree,
}

impl Method {
    fn parse(method: &str) -> Option<Self> {
        match method {
            "resolve" => Some(Self::Resolve),
            "execute_action" => Some(Self::ExecuteAction),
            "read_property" => Some(Self::ReadProperty),
            "screenshot" => Some(Self::Screenshot),
            "dump_tree" => Some(Self::DumpTree),
            _ => None,
        }
    }
}

pub struct RpcDispatcher {
    token: Option<String>,
    handler: Option<Box<dyn AutomationHandler>>,
}

impl RpcDispatcher {
    /// An empty token disables authentication
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            handler: None,
        }
    }

    pub fn with_handler(mut self, handler: impl AutomationHandler + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn set_handler(&mut self, handler: Option<Box<dyn AutomationHandler>>) {
        self.handler = handler;
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn dispatch(&mut self, text: &str) -> Routed {
        match parse_frame(text) {
            Ok(Frame::Control(request)) => Routed::Reply(self.handle_request(request)),
            Ok(Frame::PassThrough) => Routed::PassThrough,
            Err(e) => {
                debug!("Dropping frame: {}", e);
                Routed::Dropped(e)
            }
        }
    }

    pub fn handle_request(&mut self, request: RpcRequest) -> RpcResponse {
        let id = request.id;

        if let Some(expected) = &self.token {
            if request.token.as_deref() != Some(expected.as_str()) {
                warn!("Rejecting unauthorized request {} ({})", id, request.method);
                return RpcResponse::error(id, "unauthorized");
            }
        }

        let Some(method) = Method::parse(&request.method) else {
            debug!("Unknown method {} in request {}", request.method, id);
            return RpcResponse::error(id, "unknown method");
        };

        let outcome = match self.handler.as_deref_mut() {
            Some(handler) => call(handler, method, &request),
            None => Err(AutomationError::HandlerNotConfigured),
        };

        match outcome {
            Ok(result) => {
                debug!("Request {} ({}) succeeded", id, request.method);
                RpcResponse::success(id, result)
            }
            Err(e) => {
                warn!("Request {} ({}) failed: {}", id, request.method, e);
                RpcResponse::error(id, e.to_string())
            }
        }
    }
}

fn call(
    handler: &mut dyn AutomationHandler,
    method: Method,
    request: &RpcRequest,
) -> Result<Value> {
    let target = TargetDescriptor::from_json(request.param("target"));

    match method {
        Method::Resolve => {
            let desc = handler.resolve(&target.unwrap_or_default())?;
            Ok(serde_json::to_value(desc).unwrap_or_default())
        }
        Method::ExecuteAction => {
            handler.execute_action(
                request.str_param("action"),
                target.as_ref(),
                request.param("value"),
            )?;
            Ok(Value::Null)
        }
        Method::ReadProperty => handler.read_property(
            &target.unwrap_or_default(),
            request.str_param("property"),
        ),
        Method::Screenshot => handler.screenshot(request.str_param("path")).map(Value::String),
        Method::DumpTree => {
            let entries = handler.dump_tree()?;
            Ok(serde_json::to_value(entries).unwrap_or_default())
        }
    }
}
