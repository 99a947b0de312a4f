//! Capability model consumed by the automation engine
//!
//! The host application exposes its UI as a tree of [`UiObject`]s. Every object
//! carries a name, a type identifier, a property bag and invoke-by-name methods.
//! Native behaviours (clicking, checking, text entry, ...) are optional facets
//! discovered at runtime through the `as_*` accessors, so the engine never needs
//! to know the concrete widget type.
//!
//! ## Facets
//!
//! | Facet | Typical widget |
//! |-------|----------------|
//! | [`Clickable`] | push button, check box, radio button |
//! | [`Checkable`] | check box, radio button, toggle |
//! | [`TextEntry`] | line edit |
//! | [`Selectable`] | combo box |
//! | [`Slider`] | slider |
//! | [`Listable`] | multi-selection list |
//! | [`Tabular`] | checkable item model |
//! | [`Closable`] | window, dialog |
//! | [`Renderable`] | anything that can be grabbed as an image |

pub mod tree;
pub mod value;

use image::RgbaImage;
use std::sync::Arc;

pub use tree::descendants;
pub use value::PropValue;

/// Shared reference to an object in the host tree
pub type ObjectRef = Arc<dyn UiObject>;

/// An addressable object in the host application's UI tree
pub trait UiObject: Send + Sync {
    /// Object name, empty if unnamed
    fn object_name(&self) -> String;

    /// Toolkit type identifier (e.g. `PushButton`)
    fn type_name(&self) -> String;

    /// Direct children in toolkit order
    fn children(&self) -> Vec<ObjectRef>;

    /// Read a named attribute; `None` if the object has no such attribute
    fn property(&self, name: &str) -> Option<PropValue>;

    /// Write a named attribute; returns `false` if the attribute does not exist
    /// or rejects the value
    fn set_property(&self, name: &str, value: PropValue) -> bool;

    /// Invoke a named zero- or one-argument method; returns `false` if no method
    /// with that name and arity exists
    fn invoke(&self, method: &str, arg: Option<PropValue>) -> bool;

    fn as_clickable(&self) -> Option<&dyn Clickable> {
        None
    }

    fn as_checkable(&self) -> Option<&dyn Checkable> {
        None
    }

    fn as_text_entry(&self) -> Option<&dyn TextEntry> {
        None
    }

    fn as_selectable(&self) -> Option<&dyn Selectable> {
        None
    }

    fn as_slider(&self) -> Option<&dyn Slider> {
        None
    }

    fn as_listable(&self) -> Option<&dyn Listable> {
        None
    }

    fn as_tabular(&self) -> Option<&dyn Tabular> {
        None
    }

    fn as_closable(&self) -> Option<&dyn Closable> {
        None
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        None
    }
}

pub trait Clickable {
    fn click(&self);
}

pub trait Checkable {
    fn set_checked(&self, checked: bool);
}

pub trait TextEntry {
    fn set_text(&self, text: &str);
}

/// Index/text selection (combo boxes and similar)
pub trait Selectable {
    /// Index of the item whose text equals `text` exactly
    fn find_text(&self, text: &str) -> Option<usize>;
    fn set_current_index(&self, index: i64);
    fn set_current_text(&self, text: &str);
}

pub trait Slider {
    fn set_value(&self, value: i64);
}

/// Multi-item list with per-item selection
pub trait Listable {
    fn item_count(&self) -> usize;
    fn item_text(&self, index: usize) -> Option<String>;
    fn set_item_selected(&self, index: usize, selected: bool);
}

/// Row model with a per-row check state
pub trait Tabular {
    fn row_count(&self) -> usize;
    fn row_label(&self, row: usize) -> Option<String>;
    /// Returns `false` if the model rejects the check state for this row
    fn set_row_checked(&self, row: usize, checked: bool) -> bool;
}

pub trait Closable {
    fn close(&self);
}

pub trait Renderable {
    /// Grab the object's current appearance
    fn render(&self) -> anyhow::Result<RgbaImage>;
}

/// Host primitive that drains pending reactive updates (queued signal
/// deliveries, layout passes, bindings) synchronously
pub trait EventPump: Send + Sync {
    fn flush(&self);
}

/// Pump for hosts that apply every update immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPump;

impl EventPump for NoopPump {
    fn flush(&self) {}
}
