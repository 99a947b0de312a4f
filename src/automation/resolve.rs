//! Target resolution engine
//!
//! Maps a `TargetDescriptor` to one object of the live tree. Every lookup walks
//! the tree afresh; nothing is cached between requests.

use super::target::{TargetDescriptor, TargetKind};
use crate::error::{AutomationError, Result};
use crate::object::{descendants, ObjectRef};

/// Attributes compared, in order, by text/title lookups
const TEXT_ATTRIBUTES: [&str; 3] = ["text", "title", "windowTitle"];

pub fn require_root(root: Option<&ObjectRef>) -> Result<&ObjectRef> {
    root.ok_or(AutomationError::RootNotConfigured)
}

/// Resolve `target` against the tree under `root`
pub fn resolve(root: Option<&ObjectRef>, target: &TargetDescriptor) -> Result<ObjectRef> {
    let root = require_root(root)?;
    let value = target.value.trim();
    if value.is_empty() {
        return Err(AutomationError::InvalidTarget);
    }

    let kind = TargetKind::parse(&target.kind).ok_or_else(|| {
        AutomationError::UnsupportedTargetKind(target.kind.trim().to_lowercase())
    })?;

    let not_found = |by: &'static str| AutomationError::NotFound {
        by,
        value: value.to_string(),
    };

    match kind {
        TargetKind::ObjectName | TargetKind::Id => {
            find_by_object_name(root, value).ok_or_else(|| not_found("objectName"))
        }
        TargetKind::Path => {
            // Only the leaf segment is looked up; ancestry is not checked.
            let leaf = value.rsplit('.').next().unwrap_or(value);
            find_by_object_name(root, leaf).ok_or_else(|| not_found("path"))
        }
        TargetKind::Text | TargetKind::Title => {
            find_by_text(root, value).ok_or_else(|| not_found("text/title"))
        }
    }
}

/// Exact name match on the root, then on descendants; otherwise the first
/// descendant whose dotted name ends in `.<name>`
pub fn find_by_object_name(root: &ObjectRef, name: &str) -> Option<ObjectRef> {
    if root.object_name() == name {
        return Some(root.clone());
    }

    let all = descendants(root);
    if let Some(exact) = all.iter().find(|o| o.object_name() == name) {
        return Some(exact.clone());
    }

    let suffix = format!(".{name}");
    all.into_iter().find(|o| o.object_name().ends_with(&suffix))
}

/// First descendant whose `text`, `title` or `windowTitle` equals `text`
pub fn find_by_text(root: &ObjectRef, text: &str) -> Option<ObjectRef> {
    descendants(root).into_iter().find(|obj| {
        TEXT_ATTRIBUTES
            .iter()
            .filter_map(|attr| obj.property(attr))
            .any(|v| v.to_text() == text)
    })
}
