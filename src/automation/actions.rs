//! Action dispatcher
//!
//! Each verb tries the native facet first and then falls back to the generic
//! property and invoke-by-name paths in a fixed order. The helper chains below
//! return `false` when every step was unavailable so the verb can report a
//! specific error.

use serde_json::Value;
use std::collections::HashSet;

use super::resolve::{find_by_object_name, find_by_text, require_root, resolve};
use super::target::TargetDescriptor;
use crate::error::{AutomationError, Result};
use crate::object::{ObjectRef, PropValue, UiObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Click,
    Input,
    Upload,
    Select,
    SwitchPage,
    Slide,
    Toggle,
    SingleSelect,
    MultiSelect,
    DropdownMultiSelect,
    ClosePage,
}

impl Verb {
    fn parse(action: &str) -> Option<Self> {
        Some(match action {
            "click" => Self::Click,
            "input" => Self::Input,
            "upload" => Self::Upload,
            "select" => Self::Select,
            "switch_page" => Self::SwitchPage,
            "slide" => Self::Slide,
            "toggle" => Self::Toggle,
            "single_select" => Self::SingleSelect,
            "multi_select" => Self::MultiSelect,
            "dropdown_multi_select" => Self::DropdownMultiSelect,
            "close_page" => Self::ClosePage,
            _ => return None,
        })
    }
}

/// Execute `action` against the tree under `root`
///
/// Does not flush the host; the caller flushes after a successful return.
pub fn execute(
    root: Option<&ObjectRef>,
    action: &str,
    target: Option<&TargetDescriptor>,
    value: &Value,
) -> Result<()> {
    let root = require_root(root)?;
    let op = action.trim().to_lowercase();
    let verb = Verb::parse(&op);

    if verb == Some(Verb::MultiSelect) {
        return multi_select(root, value);
    }

    let obj = match (verb, target) {
        (Some(Verb::ClosePage), None) => root.clone(),
        _ => resolve(Some(root), target.unwrap_or(&TargetDescriptor::default()))?,
    };
    let obj = obj.as_ref();

    let Some(verb) = verb else {
        return Err(AutomationError::UnsupportedAction(action.to_string()));
    };

    match verb {
        Verb::Click => require(click_object(obj), "click not supported by target"),
        Verb::Input => require(
            set_text_value(obj, &value_text(value)),
            "input requires a text-capable target",
        ),
        Verb::Upload => require(
            set_text_value(obj, &absolute_path(&value_text(value))),
            "upload requires a text-capable target",
        ),
        Verb::Select => require(
            set_current_text(obj, &value_text(value)),
            "select requires currentText/currentIndex support",
        ),
        Verb::SwitchPage => match page_index(value) {
            Some(index) => require(
                set_current_index(obj, index),
                "switch_page(index) not supported",
            ),
            None => require(
                set_current_text(obj, &value_text(value)),
                "switch_page(text) not supported",
            ),
        },
        Verb::Slide => {
            let level = value_int(value);
            let applied = match obj.as_slider() {
                Some(slider) => {
                    slider.set_value(level);
                    true
                }
                None => obj.set_property("value", PropValue::Int(level)),
            };
            require(applied, "slide requires slider/value target")
        }
        Verb::Toggle => match value {
            Value::Bool(checked) => {
                require(set_checked(obj, *checked), "toggle(bool) not supported")
            }
            _ => require(click_object(obj), "toggle requires click or checked support"),
        },
        Verb::SingleSelect => require(
            set_checked(obj, true) || click_object(obj),
            "single_select not supported",
        ),
        Verb::DropdownMultiSelect => dropdown_multi_select(obj, value),
        Verb::ClosePage => require(close_object(obj), "close_page not supported"),
        Verb::MultiSelect => multi_select(root, value),
    }
}

fn require(applied: bool, message: &str) -> Result<()> {
    if applied {
        Ok(())
    } else {
        Err(AutomationError::not_supported(message))
    }
}

fn multi_select(root: &ObjectRef, value: &Value) -> Result<()> {
    for item in value_items(value) {
        let token = item.trim();
        let found = if token.is_empty() {
            None
        } else {
            find_by_object_name(root, token).or_else(|| find_by_text(root, token))
        };
        let Some(option) = found else {
            return Err(AutomationError::not_supported(format!(
                "multi_select option not found: {item}"
            )));
        };
        if !(set_checked(option.as_ref(), true) || click_object(option.as_ref())) {
            return Err(AutomationError::not_supported(format!(
                "multi_select option not checkable: {item}"
            )));
        }
    }
    Ok(())
}

fn dropdown_multi_select(obj: &dyn UiObject, value: &Value) -> Result<()> {
    let wanted: Vec<String> = value_items(value);
    let set: HashSet<&str> = wanted.iter().map(String::as_str).collect();

    if let Some(list) = obj.as_listable() {
        for i in 0..list.item_count() {
            let label = list.item_text(i).unwrap_or_default();
            list.set_item_selected(i, set.contains(label.as_str()));
        }
        return Ok(());
    }

    if let Some(model) = obj.as_tabular() {
        for row in 0..model.row_count() {
            let label = model.row_label(row).unwrap_or_default();
            model.set_row_checked(row, set.contains(label.as_str()));
        }
        return Ok(());
    }

    let list = PropValue::List(wanted.iter().map(|s| PropValue::from(s.as_str())).collect());
    if obj.set_property("selectedValues", list.clone())
        || obj.set_property("selectedItems", list)
    {
        return Ok(());
    }
    Err(AutomationError::not_supported(
        "dropdown_multi_select not supported",
    ))
}

pub(crate) fn click_object(obj: &dyn UiObject) -> bool {
    if let Some(clickable) = obj.as_clickable() {
        clickable.click();
        return true;
    }
    obj.invoke("click", None) || obj.invoke("toggle", None)
}

pub(crate) fn set_checked(obj: &dyn UiObject, checked: bool) -> bool {
    if let Some(checkable) = obj.as_checkable() {
        checkable.set_checked(checked);
        return true;
    }
    obj.set_property("checked", PropValue::Bool(checked))
        || obj.invoke("setChecked", Some(PropValue::Bool(checked)))
}

pub(crate) fn set_text_value(obj: &dyn UiObject, text: &str) -> bool {
    if let Some(entry) = obj.as_text_entry() {
        entry.set_text(text);
        return true;
    }
    obj.set_property("text", PropValue::from(text))
        || obj.invoke("setText", Some(PropValue::from(text)))
}

pub(crate) fn set_current_text(obj: &dyn UiObject, text: &str) -> bool {
    if let Some(selectable) = obj.as_selectable() {
        match selectable.find_text(text) {
            Some(index) => selectable.set_current_index(index as i64),
            None => selectable.set_current_text(text),
        }
        return true;
    }
    obj.set_property("currentText", PropValue::from(text))
        || obj.invoke("setCurrentText", Some(PropValue::from(text)))
}

pub(crate) fn set_current_index(obj: &dyn UiObject, index: i64) -> bool {
    if let Some(selectable) = obj.as_selectable() {
        selectable.set_current_index(index);
        return true;
    }
    obj.set_property("currentIndex", PropValue::Int(index))
        || obj.invoke("setCurrentIndex", Some(PropValue::Int(index)))
}

pub(crate) fn close_object(obj: &dyn UiObject) -> bool {
    if let Some(closable) = obj.as_closable() {
        closable.close();
        return true;
    }
    obj.invoke("close", None) || obj.set_property("visible", PropValue::Bool(false))
}

/// Text form of a request value; null becomes the empty string
fn value_text(value: &Value) -> String {
    PropValue::from(value).to_text()
}

/// Integer form of a request value; floats truncate, unparsable text is zero
fn value_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

/// Index requested by `switch_page`, if the value is numeric
fn page_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(_) => Some(value_int(value)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Items of an array value, or the value itself as a single item
fn value_items(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_text).collect(),
        Value::Null => Vec::new(),
        other => vec![value_text(other)],
    }
}

fn absolute_path(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    std::path::absolute(raw)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| raw.to_string())
}
