//! Automation engine: target resolution, action dispatch and introspection

pub mod actions;
pub mod generic;
pub mod resolve;
pub mod target;

use serde_json::Value;

use crate::error::Result;

pub use generic::GenericHandler;
pub use target::{ObjectDescriptor, TargetDescriptor, TargetKind};

/// Facade the RPC dispatcher routes control-plane requests to
///
/// Implementations run on the dispatch thread, one call at a time, so they may
/// keep plain mutable state.
pub trait AutomationHandler: Send {
    fn resolve(&mut self, target: &TargetDescriptor) -> Result<ObjectDescriptor>;

    /// Run an automation verb; `target` is `None` when the request carried
    /// no target or an empty one
    fn execute_action(
        &mut self,
        action: &str,
        target: Option<&TargetDescriptor>,
        value: &Value,
    ) -> Result<()>;

    fn read_property(&mut self, target: &TargetDescriptor, property: &str) -> Result<Value>;

    /// Save an image of the root surface and return its absolute path
    fn screenshot(&mut self, path: &str) -> Result<String>;

    /// Every descendant of the root, depth-first pre-order
    fn dump_tree(&mut self) -> Result<Vec<ObjectDescriptor>>;
}
