//! Widgets-style demo window served by the `uiproxy` binary
//!
//! A login page and a settings page inside a page stack. Reactions are wired
//! through signals, so every state change only becomes visible after the
//! host's event pump runs.

use std::sync::{Arc, Weak};

use super::memory::{Facet, MemoryHost, MemoryObject};
use crate::object::{PropValue, Selectable, UiObject};

/// Demo application: the host (event pump) plus its top-level window
pub struct DemoApp {
    pub host: MemoryHost,
    pub window: Arc<MemoryObject>,
}

fn text_of(obj: &MemoryObject) -> String {
    obj.get("text").map(|v| v.to_text()).unwrap_or_default()
}

fn is_checked(obj: &MemoryObject) -> bool {
    obj.get("checked").and_then(|v| v.as_bool()).unwrap_or(false)
}

fn label(host: &MemoryHost, name: &str, text: &str) -> Arc<MemoryObject> {
    host.object(name, "Label").prop("text", text).build()
}

fn line_edit(host: &MemoryHost, name: &str) -> Arc<MemoryObject> {
    host.object(name, "LineEdit").facet(Facet::TextEntry).build()
}

fn push_button(host: &MemoryHost, name: &str, text: &str) -> Arc<MemoryObject> {
    host.object(name, "PushButton")
        .facet(Facet::Clickable)
        .prop("text", text)
        .build()
}

fn check_box(host: &MemoryHost, name: &str, type_name: &str, text: &str) -> Arc<MemoryObject> {
    host.object(name, type_name)
        .facets(&[Facet::Clickable, Facet::Checkable])
        .prop("text", text)
        .build()
}

fn combo(host: &MemoryHost, name: &str) -> Arc<MemoryObject> {
    let combo = host
        .object(name, "ComboBox")
        .facet(Facet::Selectable)
        .rows(["admin", "editor", "viewer"])
        .build();
    combo.set_current_index(0);
    combo
}

fn is_page_index(obj: &MemoryObject, index: &PropValue) -> bool {
    index
        .as_i64()
        .and_then(|i| usize::try_from(i).ok())
        .is_some_and(|i| i < obj.children().len())
}

/// Container whose visible child is chosen by `currentIndex`
///
/// Indices outside the current pages are rejected both as an attribute write
/// and through `setCurrentIndex`.
pub fn page_container(host: &MemoryHost, name: &str, type_name: &str) -> Arc<MemoryObject> {
    host.object(name, type_name)
        .prop("currentIndex", 0)
        .guard("currentIndex", is_page_index)
        .method1("setCurrentIndex", |obj, arg| match arg.as_i64() {
            Some(index) if is_page_index(obj, arg) => {
                obj.set("currentIndex", index);
                true
            }
            _ => false,
        })
        .build()
}

/// Run `f` with the upgraded object if it is still alive
fn on<F>(source: &MemoryObject, signal: &str, target: &Arc<MemoryObject>, f: F)
where
    F: Fn(&MemoryObject) + Send + Sync + 'static,
{
    let target: Weak<MemoryObject> = Arc::downgrade(target);
    source.connect(signal, move || {
        if let Some(target) = target.upgrade() {
            f(&target);
        }
    });
}

pub fn build_demo() -> DemoApp {
    let host = MemoryHost::new();

    let window = host
        .object("widgetsMainWindow", "MainWindow")
        .facets(&[Facet::Renderable, Facet::Closable])
        .prop("windowTitle", "Widgets Demo")
        .prop("width", 720)
        .prop("height", 520)
        .fill([0x2b, 0x2d, 0x42, 0xff])
        .build();
    let page_stack = page_container(&host, "pageStack", "StackedWidget");

    // Login page
    let login_page = host.object("loginPage", "Widget").build();
    let name_input = line_edit(&host, "loginNameInput");
    let password_input = line_edit(&host, "loginPasswordInput");
    let role_combo = combo(&host, "loginRoleCombo");
    let login_button = push_button(&host, "loginButton", "Login");
    let login_status = label(&host, "loginStatusLabel", "");
    for child in [&name_input, &password_input, &role_combo, &login_button, &login_status] {
        login_page.add_child(child.clone());
    }

    // Main page
    let main_page = host.object("mainPage", "Widget").build();
    let user_info = label(&host, "mainUserInfoLabel", "Not logged in");
    let tabs = page_container(&host, "settingsTabs", "TabWidget");

    let user_page = host.object("userConfigPage", "Widget").build();
    let nickname_input = line_edit(&host, "userNicknameInput");
    let avatar_input = line_edit(&host, "userAvatarPathInput");
    let volume = host
        .object("userVolumeSlider", "Slider")
        .facet(Facet::Slider)
        .prop("minimum", 0)
        .prop("maximum", 100)
        .build();
    for child in [&nickname_input, &avatar_input, &volume] {
        user_page.add_child(child.clone());
    }

    let permission_page = host.object("permissionConfigPage", "Widget").build();
    let permission_combo = combo(&host, "permissionRoleCombo");
    let permission_value = label(&host, "permissionValueLabel", "Permission: viewer");
    let notify_toggle = check_box(&host, "notifyToggle", "CheckBox", "Enable notifications");
    let toggle_status = label(&host, "toggleStatusLabel", "Notifications: off");
    let radios = [
        check_box(&host, "modeAdminRadio", "RadioButton", "Admin mode"),
        check_box(&host, "modeEditorRadio", "RadioButton", "Editor mode"),
        check_box(&host, "modeViewerRadio", "RadioButton", "Viewer mode"),
    ];
    radios[2].set("checked", true);
    let mode_label = label(&host, "selectedModeLabel", "Mode: viewer");
    let perms = [
        check_box(&host, "permReadCheck", "CheckBox", "read"),
        check_box(&host, "permWriteCheck", "CheckBox", "write"),
        check_box(&host, "permDeleteCheck", "CheckBox", "delete"),
    ];
    let perms_label = label(&host, "selectedPermsLabel", "Permissions: none");
    let role_list = host
        .object("roleMultiCombo", "ListWidget")
        .facet(Facet::Listable)
        .rows(["admin", "editor", "viewer"])
        .build();
    let role_list_label = label(&host, "dropdownSelectedLabel", "Roles: none");
    let save_permission = push_button(&host, "savePermissionButton", "Save permissions");

    permission_page.add_child(permission_combo.clone());
    permission_page.add_child(permission_value.clone());
    permission_page.add_child(notify_toggle.clone());
    permission_page.add_child(toggle_status.clone());
    for radio in &radios {
        permission_page.add_child(radio.clone());
    }
    permission_page.add_child(mode_label.clone());
    for check in &perms {
        permission_page.add_child(check.clone());
    }
    permission_page.add_child(perms_label.clone());
    permission_page.add_child(role_list.clone());
    permission_page.add_child(role_list_label.clone());
    permission_page.add_child(save_permission.clone());

    tabs.add_child(user_page);
    tabs.add_child(permission_page);

    let save_user = push_button(&host, "saveUserButton", "Save user");
    let global_message = label(&host, "globalMessageLabel", "");
    main_page.add_child(user_info.clone());
    main_page.add_child(tabs);
    main_page.add_child(save_user.clone());
    main_page.add_child(global_message.clone());

    page_stack.add_child(login_page);
    page_stack.add_child(main_page);
    window.add_child(page_stack.clone());

    // Reactions
    {
        let (name_input, password_input, role_combo) = (
            Arc::downgrade(&name_input),
            Arc::downgrade(&password_input),
            Arc::downgrade(&role_combo),
        );
        let (user_info, page_stack) = (Arc::downgrade(&user_info), Arc::downgrade(&page_stack));
        on(&login_button, "clicked", &login_status, move |status: &MemoryObject| {
            let (Some(name), Some(password), Some(role)) = (
                name_input.upgrade(),
                password_input.upgrade(),
                role_combo.upgrade(),
            ) else {
                return;
            };
            let name = text_of(&name).trim().to_string();
            let role = role
                .get("currentText")
                .map(|v| v.to_text())
                .unwrap_or_default();
            if name.is_empty() || text_of(&password).trim().is_empty() {
                status.set("text", "Login failed: incomplete credentials");
                return;
            }
            status.set("text", "Login succeeded");
            if let Some(info) = user_info.upgrade() {
                info.set("text", format!("Current user: {name} ({role})"));
            }
            if let Some(stack) = page_stack.upgrade() {
                stack.set("currentIndex", 1i64);
            }
        });
    }

    on(&notify_toggle, "checkedChanged", &toggle_status, {
        let toggle = Arc::downgrade(&notify_toggle);
        move |status: &MemoryObject| {
            let enabled = toggle.upgrade().is_some_and(|t| is_checked(&t));
            status.set(
                "text",
                if enabled { "Notifications: on" } else { "Notifications: off" },
            );
        }
    });

    let radio_refs: Vec<Weak<MemoryObject>> = radios.iter().map(Arc::downgrade).collect();
    for (i, radio) in radios.iter().enumerate() {
        let group = radio_refs.clone();
        on(radio, "checkedChanged", &mode_label, move |mode_label: &MemoryObject| {
            let members: Vec<Arc<MemoryObject>> =
                group.iter().filter_map(Weak::upgrade).collect();
            if members.get(i).is_some_and(|r| is_checked(r)) {
                for (j, other) in members.iter().enumerate() {
                    if j != i {
                        other.set("checked", false);
                    }
                }
            }
            let mode = ["admin", "editor", "viewer"]
                .iter()
                .zip(&members)
                .find(|(_, r)| is_checked(r))
                .map(|(m, _)| *m)
                .unwrap_or("viewer");
            mode_label.set("text", format!("Mode: {mode}"));
        });
    }

    let perm_refs: Vec<Weak<MemoryObject>> = perms.iter().map(Arc::downgrade).collect();
    for check in &perms {
        let group = perm_refs.clone();
        on(check, "checkedChanged", &perms_label, move |perms_label: &MemoryObject| {
            let selected: Vec<String> = group
                .iter()
                .filter_map(Weak::upgrade)
                .filter(|c| is_checked(c))
                .map(|c| text_of(&c))
                .collect();
            let text = if selected.is_empty() {
                "none".to_string()
            } else {
                selected.join(",")
            };
            perms_label.set("text", format!("Permissions: {text}"));
        });
    }

    on(&role_list, "selectedItemsChanged", &role_list_label, {
        let list = Arc::downgrade(&role_list);
        move |target: &MemoryObject| {
            let selected: Vec<String> = list
                .upgrade()
                .and_then(|l| l.get("selectedItems"))
                .and_then(|v| {
                    v.as_list()
                        .map(|items| items.iter().map(PropValue::to_text).collect())
                })
                .unwrap_or_default();
            let text = if selected.is_empty() {
                "none".to_string()
            } else {
                selected.join(",")
            };
            target.set("text", format!("Roles: {text}"));
        }
    });

    on(&save_permission, "clicked", &permission_value, {
        let combo = Arc::downgrade(&permission_combo);
        let message = Arc::downgrade(&global_message);
        move |value: &MemoryObject| {
            let role = combo
                .upgrade()
                .and_then(|c| c.get("currentText"))
                .map(|v| v.to_text())
                .unwrap_or_default();
            value.set("text", format!("Permission: {role}"));
            if let Some(message) = message.upgrade() {
                message.set("text", "Permissions saved");
            }
        }
    });

    on(&save_user, "clicked", &global_message, {
        let nickname = Arc::downgrade(&nickname_input);
        move |message: &MemoryObject| {
            let mut name = nickname
                .upgrade()
                .map(|n| text_of(&n).trim().to_string())
                .unwrap_or_default();
            if name.is_empty() {
                name = "unset".to_string();
            }
            message.set("text", format!("Saved: {name}"));
        }
    });

    DemoApp { host, window }
}
