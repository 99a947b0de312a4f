use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::object::UiObject;

/// Indirect reference to an object: `{kind, value}`
///
/// Never holds the object itself, so the same descriptor can be replayed
/// against a tree that changed between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

impl TargetDescriptor {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    pub fn object_name(value: impl Into<String>) -> Self {
        Self::new("objectName", value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new("text", value)
    }

    /// Read a descriptor from request params
    ///
    /// Returns `None` when the entry is absent, not an object, or an empty
    /// object. Non-string `kind`/`value` fields read as empty strings.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object().filter(|o| !o.is_empty())?;
        let field = |name: &str| {
            obj.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            kind: field("kind"),
            value: field("value"),
        })
    }
}

/// Addressing modes understood by the resolution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    ObjectName,
    Id,
    Path,
    Text,
    Title,
}

impl TargetKind {
    /// Parse a kind, ignoring case and surrounding whitespace
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_lowercase().as_str() {
            "objectname" => Some(Self::ObjectName),
            "id" => Some(Self::Id),
            "path" => Some(Self::Path),
            "text" => Some(Self::Text),
            "title" => Some(Self::Title),
            _ => None,
        }
    }
}

/// Snapshot of a resolved object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    pub object_name: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl ObjectDescriptor {
    /// Full descriptor returned by `resolve`
    pub fn snapshot(obj: &dyn UiObject) -> Self {
        Self {
            title: obj.property("title").map(|v| v.to_json()),
            visible: obj.property("visible").and_then(|v| v.as_bool()),
            ..Self::tree_entry(obj)
        }
    }

    /// Reduced descriptor used by `dump_tree`: name, type and text only
    pub fn tree_entry(obj: &dyn UiObject) -> Self {
        Self {
            object_name: obj.object_name(),
            type_name: obj.type_name(),
            text: obj.property("text").map(|v| v.to_json()),
            title: None,
            visible: None,
        }
    }
}
