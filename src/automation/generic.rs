use image::{DynamicImage, ImageFormat};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use super::actions;
use super::resolve::{require_root, resolve};
use super::target::{ObjectDescriptor, TargetDescriptor};
use super::AutomationHandler;
use crate::error::{AutomationError, Result};
use crate::object::{descendants, EventPump, NoopPump, ObjectRef};

/// Default handler driving any tree through the capability model
pub struct GenericHandler {
    root: Option<ObjectRef>,
    pump: Arc<dyn EventPump>,
}

impl Default for GenericHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl GenericHandler {
    /// Handler without a root; every operation fails until one is set
    pub fn new() -> Self {
        Self {
            root: None,
            pump: Arc::new(NoopPump),
        }
    }

    pub fn with_root(root: ObjectRef) -> Self {
        Self {
            root: Some(root),
            ..Self::new()
        }
    }

    /// Install the host primitive run after every successful action
    pub fn with_event_pump(mut self, pump: Arc<dyn EventPump>) -> Self {
        self.pump = pump;
        self
    }

    pub fn set_root(&mut self, root: Option<ObjectRef>) {
        self.root = root;
    }

    pub fn root(&self) -> Option<&ObjectRef> {
        self.root.as_ref()
    }
}

impl AutomationHandler for GenericHandler {
    fn resolve(&mut self, target: &TargetDescriptor) -> Result<ObjectDescriptor> {
        let obj = resolve(self.root(), target)?;
        Ok(ObjectDescriptor::snapshot(obj.as_ref()))
    }

    fn execute_action(
        &mut self,
        action: &str,
        target: Option<&TargetDescriptor>,
        value: &Value,
    ) -> Result<()> {
        actions::execute(self.root(), action, target, value)?;
        self.pump.flush();
        Ok(())
    }

    fn read_property(&mut self, target: &TargetDescriptor, property: &str) -> Result<Value> {
        let obj = resolve(self.root(), target)?;
        obj.property(property)
            .map(|v| v.to_json())
            .ok_or_else(|| AutomationError::PropertyNotFound(property.to_string()))
    }

    fn screenshot(&mut self, path: &str) -> Result<String> {
        let root = require_root(self.root())?;
        let capture_failed = |reason: String| AutomationError::CaptureFailed(reason);

        let surface = std::iter::once(root.clone())
            .chain(descendants(root))
            .find(|obj| obj.as_renderable().is_some())
            .ok_or_else(|| capture_failed("no renderable surface".to_string()))?;
        let image = surface
            .as_renderable()
            .ok_or_else(|| capture_failed("no renderable surface".to_string()))?
            .render()
            .map_err(|e| capture_failed(e.to_string()))?;

        let absolute =
            std::path::absolute(Path::new(path)).map_err(|e| capture_failed(e.to_string()))?;
        let format = ImageFormat::from_path(&absolute).map_err(|e| capture_failed(e.to_string()))?;
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent).map_err(|e| capture_failed(e.to_string()))?;
        }
        let saved = match format {
            // JPEG has no alpha channel
            ImageFormat::Jpeg => DynamicImage::ImageRgba8(image)
                .into_rgb8()
                .save_with_format(&absolute, format),
            _ => image.save_with_format(&absolute, format),
        };
        saved.map_err(|e| capture_failed(e.to_string()))?;

        tracing::debug!(
            "Screenshot of {} saved to {}",
            surface.object_name(),
            absolute.display()
        );
        Ok(absolute.display().to_string())
    }

    fn dump_tree(&mut self) -> Result<Vec<ObjectDescriptor>> {
        let root = require_root(self.root())?;
        Ok(descendants(root)
            .iter()
            .map(|obj| ObjectDescriptor::tree_entry(obj.as_ref()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::build_demo;
    use crate::host::memory::{Facet, MemoryHost};
    use crate::object::PropValue;
    use serde_json::json;

    fn demo_handler() -> (GenericHandler, crate::host::DemoApp) {
        let app = build_demo();
        let handler = GenericHandler::with_root(app.window.clone())
            .with_event_pump(Arc::new(app.host.clone()));
        (handler, app)
    }

    fn name(value: &str) -> TargetDescriptor {
        TargetDescriptor::object_name(value)
    }

    #[test]
    fn test_resolve_returns_descriptor() {
        let (mut handler, _app) = demo_handler();
        let desc = handler.resolve(&name("loginButton")).unwrap();
        assert_eq!(desc.object_name, "loginButton");
        assert_eq!(desc.type_name, "PushButton");
        assert_eq!(desc.text, Some(json!("Login")));
    }

    #[test]
    fn test_action_flushes_reactions() {
        let (mut handler, app) = demo_handler();
        handler
            .execute_action("input", Some(&name("loginNameInput")), &json!("alice"))
            .unwrap();
        handler
            .execute_action("input", Some(&name("loginPasswordInput")), &json!("pw"))
            .unwrap();
        handler
            .execute_action("click", Some(&name("loginButton")), &Value::Null)
            .unwrap();

        assert_eq!(app.host.pending(), 0);
        assert_eq!(
            handler.read_property(&name("loginStatusLabel"), "text").unwrap(),
            json!("Login succeeded")
        );
        assert_eq!(
            handler.read_property(&name("pageStack"), "currentIndex").unwrap(),
            json!(1)
        );
    }

    #[test]
    fn test_failed_multi_select_does_not_flush() {
        let (mut handler, app) = demo_handler();
        let err = handler
            .execute_action("multi_select", None, &json!(["permReadCheck", "editor-x"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "multi_select option not found: editor-x");
        assert!(app.host.pending() > 0);
        assert_eq!(
            handler.read_property(&name("permReadCheck"), "checked").unwrap(),
            json!(true)
        );
        assert_eq!(
            handler.read_property(&name("selectedPermsLabel"), "text").unwrap(),
            json!("Permissions: none")
        );
    }

    #[test]
    fn test_read_missing_property() {
        let (mut handler, _app) = demo_handler();
        let err = handler
            .read_property(&name("loginButton"), "nonexistent")
            .unwrap_err();
        assert_eq!(err.to_string(), "property not found: nonexistent");
    }

    #[test]
    fn test_dump_tree_round_trips_through_resolve() {
        let (mut handler, _app) = demo_handler();
        let entries = handler.dump_tree().unwrap();
        assert_eq!(entries[0].object_name, "pageStack");
        assert!(entries.iter().all(|e| e.title.is_none() && e.visible.is_none()));

        for entry in entries.iter().filter(|e| !e.object_name.is_empty()) {
            let desc = handler.resolve(&name(&entry.object_name)).unwrap();
            assert_eq!(desc.type_name, entry.type_name);
        }
    }

    #[test]
    fn test_operations_require_root() {
        let mut handler = GenericHandler::new();
        assert_eq!(handler.dump_tree().unwrap_err(), AutomationError::RootNotConfigured);
        assert_eq!(
            handler.screenshot("out.png").unwrap_err(),
            AutomationError::RootNotConfigured
        );
        assert_eq!(
            handler
                .execute_action("click", Some(&name("x")), &Value::Null)
                .unwrap_err(),
            AutomationError::RootNotConfigured
        );
    }

    #[test]
    fn test_set_root_rebinds() {
        let host = MemoryHost::new();
        let mut handler = GenericHandler::new();
        handler.set_root(Some(host.object("solo", "Widget").build()));
        assert_eq!(handler.root().map(|r| r.object_name()), Some("solo".to_string()));
        assert!(handler.dump_tree().unwrap().is_empty());
    }

    #[test]
    fn test_screenshot_writes_png() {
        let (mut handler, _app) = demo_handler();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/shots/window.png");

        let saved = handler.screenshot(path.to_str().unwrap()).unwrap();
        assert!(Path::new(&saved).is_absolute());
        let image = image::open(&saved).unwrap();
        assert_eq!((image.width(), image.height()), (720, 520));
    }

    #[test]
    fn test_screenshot_writes_jpeg() {
        let (mut handler, _app) = demo_handler();
        let dir = tempfile::tempdir().unwrap();

        for file in ["window.jpg", "window.jpeg"] {
            let saved = handler
                .screenshot(dir.path().join(file).to_str().unwrap())
                .unwrap();
            let format = image::ImageFormat::from_path(&saved).unwrap();
            assert_eq!(format, image::ImageFormat::Jpeg);
            let image = image::open(&saved).unwrap();
            assert_eq!((image.width(), image.height()), (720, 520));
        }
    }

    #[test]
    fn test_screenshot_unknown_extension_fails() {
        let (mut handler, _app) = demo_handler();
        let dir = tempfile::tempdir().unwrap();
        let err = handler
            .screenshot(dir.path().join("window.unknownext").to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, AutomationError::CaptureFailed(_)));
    }

    #[test]
    fn test_screenshot_uses_first_renderable_descendant() {
        let host = MemoryHost::new();
        let root = host.object("root", "Widget").build();
        let canvas = host
            .object("canvas", "Canvas")
            .facet(Facet::Renderable)
            .prop("width", 8)
            .prop("height", 4)
            .fill([0x10, 0x20, 0x30, 0xff])
            .build();
        root.add_child(canvas);
        let mut handler = GenericHandler::with_root(root);

        let dir = tempfile::tempdir().unwrap();
        let saved = handler
            .screenshot(dir.path().join("c.png").to_str().unwrap())
            .unwrap();
        let image = image::open(saved).unwrap().to_rgba8();
        assert_eq!(image.width(), 8);
        assert_eq!(image.get_pixel(0, 0).0, [0x10, 0x20, 0x30, 0xff]);
    }

    #[test]
    fn test_screenshot_without_surface_fails() {
        let host = MemoryHost::new();
        let mut handler = GenericHandler::with_root(host.object("root", "Widget").build());
        let dir = tempfile::tempdir().unwrap();
        let err = handler
            .screenshot(dir.path().join("x.png").to_str().unwrap())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to capture screenshot: no renderable surface"
        );
    }

    #[test]
    fn test_toggle_reaction_reflects_state() {
        let (mut handler, _app) = demo_handler();
        handler
            .execute_action("toggle", Some(&name("notifyToggle")), &json!(true))
            .unwrap();
        assert_eq!(
            handler.read_property(&name("toggleStatusLabel"), "text").unwrap(),
            json!("Notifications: on")
        );
        assert_eq!(
            handler.read_property(&name("notifyToggle"), "checked").unwrap(),
            PropValue::Bool(true).to_json()
        );
    }
}
