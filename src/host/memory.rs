//! In-process reference host
//!
//! `MemoryHost` models a retained-mode toolkit closely enough to drive the
//! automation engine without a real windowing system: objects carry declared
//! properties, named methods and a facet set, and signal reactions are queued
//! until the host's event pump is flushed.

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::object::{
    Checkable, Clickable, Closable, EventPump, Listable, ObjectRef, PropValue, Renderable,
    Selectable, Slider, Tabular, TextEntry, UiObject,
};

type Slot = Arc<dyn Fn() + Send + Sync>;
type Guard = Arc<dyn Fn(&MemoryObject, &PropValue) -> bool + Send + Sync>;

/// Host-side implementation of an invoke-by-name method
pub type MethodFn = Arc<dyn Fn(&MemoryObject, Option<&PropValue>) -> bool + Send + Sync>;

/// Native capabilities a `MemoryObject` can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Clickable,
    Checkable,
    TextEntry,
    Selectable,
    Slider,
    Listable,
    Tabular,
    Closable,
    Renderable,
}

/// One entry of a list, combo or item model
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    label: String,
    selected: bool,
    checked: bool,
}

impl Row {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            selected: false,
            checked: false,
        }
    }
}

#[derive(Clone, Default)]
struct UpdateQueue {
    pending: Arc<Mutex<VecDeque<Slot>>>,
}

impl UpdateQueue {
    fn post(&self, slot: Slot) {
        self.pending.lock().push_back(slot);
    }
}

/// Owner of the pending-update queue shared by every object it creates
#[derive(Clone, Default)]
pub struct MemoryHost {
    queue: UpdateQueue,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building an object attached to this host's update queue
    pub fn object(&self, name: &str, type_name: &str) -> ObjectBuilder {
        ObjectBuilder {
            queue: self.queue.clone(),
            name: name.to_string(),
            type_name: type_name.to_string(),
            facets: HashSet::new(),
            props: BTreeMap::new(),
            methods: HashMap::new(),
            guards: HashMap::new(),
            rows: Vec::new(),
            fill: [0xf0, 0xf0, 0xf0, 0xff],
        }
    }

    /// Number of queued reactions not yet delivered
    pub fn pending(&self) -> usize {
        self.queue.pending.lock().len()
    }
}

impl EventPump for MemoryHost {
    fn flush(&self) {
        // Reactions may emit further signals; keep draining until settled.
        loop {
            let next = self.queue.pending.lock().pop_front();
            match next {
                Some(slot) => slot(),
                None => break,
            }
        }
    }
}

struct Method {
    arity: usize,
    f: MethodFn,
}

pub struct ObjectBuilder {
    queue: UpdateQueue,
    name: String,
    type_name: String,
    facets: HashSet<Facet>,
    props: BTreeMap<String, PropValue>,
    methods: HashMap<String, Method>,
    guards: HashMap<String, Guard>,
    rows: Vec<Row>,
    fill: [u8; 4],
}

impl ObjectBuilder {
    pub fn facet(mut self, facet: Facet) -> Self {
        self.facets.insert(facet);
        self
    }

    pub fn facets(mut self, facets: &[Facet]) -> Self {
        self.facets.extend(facets.iter().copied());
        self
    }

    /// Declare a property with its initial value
    pub fn prop(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.to_string(), value.into());
        self
    }

    pub fn method0<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&MemoryObject) -> bool + Send + Sync + 'static,
    {
        self.methods.insert(
            name.to_string(),
            Method {
                arity: 0,
                f: Arc::new(move |obj: &MemoryObject, _: Option<&PropValue>| f(obj)),
            },
        );
        self
    }

    pub fn method1<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&MemoryObject, &PropValue) -> bool + Send + Sync + 'static,
    {
        self.methods.insert(
            name.to_string(),
            Method {
                arity: 1,
                f: Arc::new(move |obj: &MemoryObject, arg: Option<&PropValue>| {
                    arg.is_some_and(|a| f(obj, a))
                }),
            },
        );
        self
    }

    /// Only accept external writes to `name` when `accept` holds
    ///
    /// Applies to `set_property`; host-side `set` calls are not checked.
    pub fn guard<F>(mut self, name: &str, accept: F) -> Self
    where
        F: Fn(&MemoryObject, &PropValue) -> bool + Send + Sync + 'static,
    {
        self.guards.insert(name.to_string(), Arc::new(accept));
        self
    }

    /// Items of a combo, list or model, in display order
    pub fn rows<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.rows = labels.into_iter().map(Row::new).collect();
        self
    }

    /// Solid RGBA colour used when rendering
    pub fn fill(mut self, rgba: [u8; 4]) -> Self {
        self.fill = rgba;
        self
    }

    pub fn build(mut self) -> Arc<MemoryObject> {
        let facets = self.facets.clone();
        let mut declare = |name: &str, value: PropValue| {
            self.props.entry(name.to_string()).or_insert(value);
        };

        if facets.contains(&Facet::TextEntry) {
            declare("text", PropValue::from(""));
        }
        if facets.contains(&Facet::Checkable) {
            declare("checked", PropValue::Bool(false));
        }
        if facets.contains(&Facet::Selectable) {
            declare("currentIndex", PropValue::Int(-1));
            declare("currentText", PropValue::from(""));
        }
        if facets.contains(&Facet::Slider) {
            declare("value", PropValue::Int(0));
        }
        if facets.contains(&Facet::Listable) {
            declare("selectedItems", PropValue::List(Vec::new()));
        }
        if facets.contains(&Facet::Tabular) {
            declare("checkedItems", PropValue::List(Vec::new()));
        }
        if facets.contains(&Facet::Closable) || facets.contains(&Facet::Renderable) {
            declare("visible", PropValue::Bool(true));
        }

        Arc::new(MemoryObject {
            name: self.name,
            type_name: self.type_name,
            facets,
            props: Mutex::new(self.props),
            methods: self.methods,
            guards: self.guards,
            rows: Mutex::new(self.rows),
            children: Mutex::new(Vec::new()),
            slots: Mutex::new(HashMap::new()),
            queue: self.queue,
            fill: self.fill,
        })
    }
}

/// Object in a `MemoryHost` tree
pub struct MemoryObject {
    name: String,
    type_name: String,
    facets: HashSet<Facet>,
    props: Mutex<BTreeMap<String, PropValue>>,
    methods: HashMap<String, Method>,
    guards: HashMap<String, Guard>,
    rows: Mutex<Vec<Row>>,
    children: Mutex<Vec<Arc<MemoryObject>>>,
    slots: Mutex<HashMap<String, Vec<Slot>>>,
    queue: UpdateQueue,
    fill: [u8; 4],
}

impl MemoryObject {
    pub fn add_child(&self, child: Arc<MemoryObject>) {
        self.children.lock().push(child);
    }

    pub fn has_facet(&self, facet: Facet) -> bool {
        self.facets.contains(&facet)
    }

    pub fn get(&self, name: &str) -> Option<PropValue> {
        self.props.lock().get(name).cloned()
    }

    /// Write a property, declaring it if needed, and emit `<name>Changed` when
    /// the value differs
    pub fn set(&self, name: &str, value: impl Into<PropValue>) {
        let value = value.into();
        let changed = {
            let mut props = self.props.lock();
            match props.insert(name.to_string(), value.clone()) {
                Some(old) => old != value,
                None => true,
            }
        };
        if changed {
            self.emit(&format!("{name}Changed"));
        }
    }

    /// Connect a reaction to a signal; it runs on the next pump flush after the
    /// signal fires
    pub fn connect<F>(&self, signal: &str, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.slots
            .lock()
            .entry(signal.to_string())
            .or_default()
            .push(Arc::new(f));
    }

    /// Queue every reaction connected to `signal`
    pub fn emit(&self, signal: &str) {
        let slots = self.slots.lock().get(signal).cloned().unwrap_or_default();
        for slot in slots {
            self.queue.post(slot);
        }
    }

    fn sync_row_props(&self) {
        let (selected, checked): (Vec<PropValue>, Vec<PropValue>) = {
            let rows = self.rows.lock();
            (
                rows.iter()
                    .filter(|r| r.selected)
                    .map(|r| PropValue::from(r.label.as_str()))
                    .collect(),
                rows.iter()
                    .filter(|r| r.checked)
                    .map(|r| PropValue::from(r.label.as_str()))
                    .collect(),
            )
        };
        if self.has_facet(Facet::Listable) {
            self.set("selectedItems", PropValue::List(selected));
        }
        if self.has_facet(Facet::Tabular) {
            self.set("checkedItems", PropValue::List(checked));
        }
    }
}

impl UiObject for MemoryObject {
    fn object_name(&self) -> String {
        self.name.clone()
    }

    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn children(&self) -> Vec<ObjectRef> {
        self.children
            .lock()
            .iter()
            .map(|c| c.clone() as ObjectRef)
            .collect()
    }

    fn property(&self, name: &str) -> Option<PropValue> {
        self.get(name)
    }

    fn set_property(&self, name: &str, value: PropValue) -> bool {
        if !self.props.lock().contains_key(name) {
            return false;
        }
        if let Some(accept) = self.guards.get(name) {
            if !accept(self, &value) {
                return false;
            }
        }
        self.set(name, value);
        true
    }

    fn invoke(&self, method: &str, arg: Option<PropValue>) -> bool {
        let Some(m) = self.methods.get(method) else {
            return false;
        };
        if m.arity != usize::from(arg.is_some()) {
            return false;
        }
        (m.f)(self, arg.as_ref())
    }

    fn as_clickable(&self) -> Option<&dyn Clickable> {
        self.has_facet(Facet::Clickable).then_some(self as &dyn Clickable)
    }

    fn as_checkable(&self) -> Option<&dyn Checkable> {
        self.has_facet(Facet::Checkable).then_some(self as &dyn Checkable)
    }

    fn as_text_entry(&self) -> Option<&dyn TextEntry> {
        self.has_facet(Facet::TextEntry).then_some(self as &dyn TextEntry)
    }

    fn as_selectable(&self) -> Option<&dyn Selectable> {
        self.has_facet(Facet::Selectable).then_some(self as &dyn Selectable)
    }

    fn as_slider(&self) -> Option<&dyn Slider> {
        self.has_facet(Facet::Slider).then_some(self as &dyn Slider)
    }

    fn as_listable(&self) -> Option<&dyn Listable> {
        self.has_facet(Facet::Listable).then_some(self as &dyn Listable)
    }

    fn as_tabular(&self) -> Option<&dyn Tabular> {
        self.has_facet(Facet::Tabular).then_some(self as &dyn Tabular)
    }

    fn as_closable(&self) -> Option<&dyn Closable> {
        self.has_facet(Facet::Closable).then_some(self as &dyn Closable)
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        self.has_facet(Facet::Renderable).then_some(self as &dyn Renderable)
    }
}

impl Clickable for MemoryObject {
    fn click(&self) {
        if self.has_facet(Facet::Checkable) {
            let checked = self
                .get("checked")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            self.set("checked", !checked);
        }
        self.set(
            "clickCount",
            self.get("clickCount").and_then(|v| v.as_i64()).unwrap_or(0) + 1,
        );
        self.emit("clicked");
    }
}

impl Checkable for MemoryObject {
    fn set_checked(&self, checked: bool) {
        self.set("checked", checked);
    }
}

impl TextEntry for MemoryObject {
    fn set_text(&self, text: &str) {
        self.set("text", text);
    }
}

impl Selectable for MemoryObject {
    fn find_text(&self, text: &str) -> Option<usize> {
        self.rows.lock().iter().position(|r| r.label == text)
    }

    fn set_current_index(&self, index: i64) {
        let label = usize::try_from(index)
            .ok()
            .and_then(|i| self.rows.lock().get(i).map(|r| r.label.clone()));
        match label {
            Some(label) => {
                self.set("currentIndex", index);
                self.set("currentText", label);
            }
            None => {
                self.set("currentIndex", -1i64);
                self.set("currentText", "");
            }
        }
    }

    fn set_current_text(&self, text: &str) {
        match self.find_text(text) {
            Some(i) => self.set_current_index(i as i64),
            None => self.set("currentText", text),
        }
    }
}

impl Slider for MemoryObject {
    fn set_value(&self, value: i64) {
        let min = self.get("minimum").and_then(|v| v.as_i64()).unwrap_or(i64::MIN);
        let max = self.get("maximum").and_then(|v| v.as_i64()).unwrap_or(i64::MAX);
        self.set("value", value.clamp(min, max.max(min)));
    }
}

impl Listable for MemoryObject {
    fn item_count(&self) -> usize {
        self.rows.lock().len()
    }

    fn item_text(&self, index: usize) -> Option<String> {
        self.rows.lock().get(index).map(|r| r.label.clone())
    }

    fn set_item_selected(&self, index: usize, selected: bool) {
        if let Some(row) = self.rows.lock().get_mut(index) {
            row.selected = selected;
        }
        self.sync_row_props();
    }
}

impl Tabular for MemoryObject {
    fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    fn row_label(&self, row: usize) -> Option<String> {
        self.rows.lock().get(row).map(|r| r.label.clone())
    }

    fn set_row_checked(&self, row: usize, checked: bool) -> bool {
        let applied = match self.rows.lock().get_mut(row) {
            Some(r) => {
                r.checked = checked;
                true
            }
            None => false,
        };
        self.sync_row_props();
        applied
    }
}

impl Closable for MemoryObject {
    fn close(&self) {
        self.set("visible", false);
        self.emit("closed");
    }
}

impl Renderable for MemoryObject {
    fn render(&self) -> anyhow::Result<RgbaImage> {
        let dim = |name: &str, default: u32| {
            self.get(name)
                .and_then(|v| v.as_i64())
                .map(|v| u32::try_from(v).unwrap_or(0))
                .unwrap_or(default)
        };
        let (width, height) = (dim("width", 64), dim("height", 48));
        if width == 0 || height == 0 {
            anyhow::bail!("surface of {} has zero size", self.name);
        }
        Ok(RgbaImage::from_pixel(width, height, Rgba(self.fill)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_undeclared_property_is_rejected() {
        let host = MemoryHost::new();
        let obj = host.object("label", "Label").prop("text", "hi").build();
        assert!(obj.set_property("text", PropValue::from("bye")));
        assert!(!obj.set_property("checked", PropValue::Bool(true)));
        assert_eq!(obj.get("checked"), None);
    }

    #[test]
    fn test_reactions_wait_for_flush() {
        let host = MemoryHost::new();
        let button = host
            .object("ok", "PushButton")
            .facet(Facet::Clickable)
            .build();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        button.connect("clicked", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        button.click();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(host.pending(), 1);

        host.flush();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(host.pending(), 0);
    }

    #[test]
    fn test_flush_drains_chained_reactions() {
        let host = MemoryHost::new();
        let source = host.object("src", "PushButton").facet(Facet::Clickable).build();
        let label = host.object("lbl", "Label").prop("text", "").build();
        let echo = host.object("echo", "Label").prop("text", "").build();

        let l = Arc::downgrade(&label);
        source.connect("clicked", move || {
            if let Some(l) = l.upgrade() {
                l.set("text", "clicked");
            }
        });
        let e = Arc::downgrade(&echo);
        label.connect("textChanged", move || {
            if let Some(e) = e.upgrade() {
                e.set("text", "echoed");
            }
        });

        source.click();
        host.flush();
        assert_eq!(echo.get("text"), Some(PropValue::from("echoed")));
    }

    #[test]
    fn test_guard_rejects_external_writes() {
        let host = MemoryHost::new();
        let obj = host
            .object("volume", "Slider")
            .prop("value", 0)
            .guard("value", |_, v| v.as_i64().is_some_and(|i| (0..=10).contains(&i)))
            .build();

        assert!(obj.set_property("value", PropValue::Int(4)));
        assert!(!obj.set_property("value", PropValue::Int(11)));
        assert_eq!(obj.get("value"), Some(PropValue::Int(4)));

        obj.set("value", 11i64);
        assert_eq!(obj.get("value"), Some(PropValue::Int(11)));
    }

    #[test]
    fn test_invoke_checks_arity() {
        let host = MemoryHost::new();
        let obj = host
            .object("pages", "StackedWidget")
            .prop("currentIndex", 0)
            .method1("setCurrentIndex", |o, arg| match arg.as_i64() {
                Some(i) => {
                    o.set("currentIndex", i);
                    true
                }
                None => false,
            })
            .build();

        assert!(!obj.invoke("setCurrentIndex", None));
        assert!(!obj.invoke("missing", Some(PropValue::Int(1))));
        assert!(obj.invoke("setCurrentIndex", Some(PropValue::Int(2))));
        assert_eq!(obj.get("currentIndex"), Some(PropValue::Int(2)));
    }

    #[test]
    fn test_facets_follow_declaration() {
        let host = MemoryHost::new();
        let check = host
            .object("notify", "CheckBox")
            .facets(&[Facet::Clickable, Facet::Checkable])
            .build();
        assert!(check.as_checkable().is_some());
        assert!(check.as_text_entry().is_none());

        check.click();
        assert_eq!(check.get("checked"), Some(PropValue::Bool(true)));
    }

    #[test]
    fn test_combo_selection() {
        let host = MemoryHost::new();
        let combo = host
            .object("role", "ComboBox")
            .facet(Facet::Selectable)
            .rows(["viewer", "editor", "admin"])
            .build();

        assert_eq!(combo.find_text("admin"), Some(2));
        combo.set_current_index(1);
        assert_eq!(combo.get("currentText"), Some(PropValue::from("editor")));
        combo.set_current_index(9);
        assert_eq!(combo.get("currentIndex"), Some(PropValue::Int(-1)));
    }

    #[test]
    fn test_slider_clamps_to_range() {
        let host = MemoryHost::new();
        let slider = host
            .object("volume", "Slider")
            .facet(Facet::Slider)
            .prop("minimum", 0)
            .prop("maximum", 100)
            .build();
        slider.set_value(250);
        assert_eq!(slider.get("value"), Some(PropValue::Int(100)));
    }

    #[test]
    fn test_list_selection_syncs_property() {
        let host = MemoryHost::new();
        let list = host
            .object("roles", "ListWidget")
            .facet(Facet::Listable)
            .rows(["a", "b", "c"])
            .build();
        list.set_item_selected(0, true);
        list.set_item_selected(2, true);
        assert_eq!(
            list.get("selectedItems"),
            Some(PropValue::from(vec!["a", "c"]))
        );
    }

    #[test]
    fn test_render_uses_declared_size() {
        let host = MemoryHost::new();
        let win = host
            .object("main", "MainWindow")
            .facet(Facet::Renderable)
            .prop("width", 10)
            .prop("height", 5)
            .build();
        let img = win.render().unwrap();
        assert_eq!((img.width(), img.height()), (10, 5));

        let empty = host
            .object("empty", "Frame")
            .facet(Facet::Renderable)
            .prop("width", 0)
            .build();
        assert!(empty.render().is_err());
    }
}
