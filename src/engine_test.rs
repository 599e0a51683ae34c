#![allow(clippy::float_cmp)]

use super::*;
use crate::connections::ConnectionId;
use crate::doc::PropertiesPatch;

// =============================================================
// Helpers
// =============================================================

#[derive(Default)]
struct RecordingConnections {
    removed: Vec<ConnectionId>,
    updated: Vec<DeviceId>,
}

impl ConnectionManager for RecordingConnections {
    fn remove_connection(&mut self, id: &ConnectionId, _device: &Device) {
        self.removed.push(id.clone());
    }

    fn update_device_connections(&mut self, device: &DeviceId) {
        self.updated.push(device.clone());
    }
}

type Controller = CanvasController<RecordingConnections>;

fn controller() -> Controller {
    let mut c = CanvasController::new(DeviceCatalog::builtin(), RecordingConnections::default(), CanvasConfig::default());
    c.dispatch(InputEvent::Resize { left: 0.0, top: 0.0, width: 800.0, height: 600.0 });
    c
}

fn place(c: &mut Controller, type_key: &str, x: f64, y: f64) -> DeviceId {
    c.create_device(type_key, x, y, DeviceOverrides::default())
        .into_iter()
        .find_map(|a| match a {
            Action::DeviceCreated { device } => Some(device.id),
            _ => None,
        })
        .unwrap()
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Modifiers::default() }
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Modifiers::default() }
}

fn down(c: &mut Controller, x: f64, y: f64, button: Button, modifiers: Modifiers) -> Vec<Action> {
    c.dispatch(InputEvent::PointerDown { at: pt(x, y), button, modifiers })
}

fn move_to(c: &mut Controller, x: f64, y: f64) -> Vec<Action> {
    c.dispatch(InputEvent::PointerMove { at: pt(x, y), modifiers: Modifiers::default() })
}

fn up(c: &mut Controller, x: f64, y: f64) -> Vec<Action> {
    c.dispatch(InputEvent::PointerUp { at: pt(x, y), button: Button::Primary })
}

fn click(c: &mut Controller, x: f64, y: f64, modifiers: Modifiers) {
    down(c, x, y, Button::Primary, modifiers);
    up(c, x, y);
}

fn key(c: &mut Controller, k: &str, modifiers: Modifiers) -> Vec<Action> {
    c.dispatch(InputEvent::KeyDown { key: Key(k.to_string()), modifiers })
}

fn selected(c: &Controller) -> Vec<DeviceId> {
    c.registry.get_selected_devices().into_iter().map(|d| d.id.clone()).collect()
}

fn position(c: &Controller, id: &DeviceId) -> (f64, f64) {
    let d = c.registry.get(id).unwrap();
    (d.x, d.y)
}

fn has_frame_request(actions: &[Action]) -> bool {
    actions.contains(&Action::FrameRequested)
}

// =============================================================
// Entity requests
// =============================================================

#[test]
fn create_device_reports_creation_and_render() {
    let mut c = controller();
    let actions = c.create_device("router", 10.0, 20.0, DeviceOverrides::default());
    assert!(matches!(actions.first(), Some(Action::DeviceCreated { device }) if device.device_type == "router"));
    assert_eq!(actions.last(), Some(&Action::RenderNeeded));
    assert_eq!(c.state.device_count, 1);
}

#[test]
fn create_device_unknown_type_is_rejected() {
    let mut c = controller();
    let actions = c.create_device("toaster", 0.0, 0.0, DeviceOverrides::default());
    assert_eq!(actions.len(), 1);
    assert!(matches!(&actions[0], Action::Rejected { reason } if reason.contains("toaster")));
    assert!(c.registry.is_empty());
}

#[test]
fn create_device_with_malformed_property_is_rejected() {
    let mut c = controller();
    let mut overrides = DeviceOverrides::default();
    overrides.properties.insert("ip".into(), "999.1.1.1".into());
    let actions = c.create_device("server", 0.0, 0.0, overrides);
    assert!(matches!(&actions[0], Action::Rejected { .. }));
    assert!(c.registry.is_empty());
}

#[test]
fn drop_device_centers_body_under_pointer() {
    let mut c = controller();
    c.dispatch(InputEvent::Wheel { at: pt(0.0, 0.0), delta: WheelDelta { dx: 100.0, dy: 0.0 }, modifiers: Modifiers::default() });
    let actions = c.drop_device("server", pt(400.0, 300.0), DeviceOverrides::default());
    let Some(Action::DeviceCreated { device }) = actions.first() else {
        panic!("expected creation, got {actions:?}");
    };
    assert_eq!((device.x, device.y), (460.0, 260.0));
}

#[test]
fn drop_device_without_display_area_is_rejected() {
    let mut c = CanvasController::new(DeviceCatalog::builtin(), RecordingConnections::default(), CanvasConfig::default());
    let actions = c.drop_device("server", pt(10.0, 10.0), DeviceOverrides::default());
    assert!(matches!(&actions[0], Action::Rejected { .. }));
    assert!(c.registry.is_empty());
}

#[test]
fn update_device_validates_then_applies() {
    let mut c = controller();
    let id = place(&mut c, "switch", 0.0, 0.0);

    let mut bad = DeviceUpdate::default();
    let mut patch = PropertiesPatch::default();
    patch.values.insert("vlan".into(), Some("5000".into()));
    bad.properties = Some(patch);
    let actions = c.update_device(&id, &bad);
    assert!(matches!(&actions[0], Action::Rejected { .. }));
    assert_eq!(c.registry.get(&id).unwrap().properties.vlan(), None);

    let good = DeviceUpdate { name: Some("core-sw".into()), ..DeviceUpdate::default() };
    let actions = c.update_device(&id, &good);
    assert!(matches!(&actions[0], Action::DeviceUpdated { device } if device.name == "core-sw"));
}

#[test]
fn remove_unknown_device_is_rejected() {
    let mut c = controller();
    let actions = c.remove_device(&DeviceId::new("ghost"));
    assert!(matches!(&actions[0], Action::Rejected { .. }));
}

#[test]
fn export_then_import_into_fresh_controller() {
    let mut a = controller();
    place(&mut a, "router", 0.0, 0.0);
    place(&mut a, "switch", 200.0, 0.0);
    let exported = a.export();

    let mut b = controller();
    let actions = b.import(exported.clone());
    assert!(actions.contains(&Action::DevicesImported { count: 2 }));
    assert_eq!(b.state.device_count, 2);
    assert_eq!(b.state.loading_progress, 1.0);
    assert_eq!(b.export(), exported);
}

#[test]
fn import_skips_records_with_malformed_properties() {
    let mut a = controller();
    let good = place(&mut a, "router", 0.0, 0.0);
    place(&mut a, "switch", 200.0, 0.0);
    place(&mut a, "server", 400.0, 0.0);
    let mut records = a.export();
    records[1].properties.values.insert("vlan".into(), "99999".into());
    records[2].properties.ports = 5000;

    let mut b = controller();
    let actions = b.import(records);
    assert!(actions.contains(&Action::DevicesImported { count: 1 }));
    assert_eq!(b.state.device_count, 1);
    assert!(b.registry.contains(&good));
}

#[test]
fn clear_empties_registry() {
    let mut c = controller();
    place(&mut c, "router", 0.0, 0.0);
    let actions = c.clear();
    assert!(actions.contains(&Action::Cleared));
    assert_eq!(c.state.device_count, 0);
}

// =============================================================
// Pointer: selection and drag
// =============================================================

#[test]
fn click_on_device_selects_it_alone() {
    let mut c = controller();
    let a = place(&mut c, "router", 100.0, 100.0);
    let b = place(&mut c, "switch", 300.0, 100.0);
    c.select_device(&b, false);

    let actions = down(&mut c, 120.0, 120.0, Button::Primary, Modifiers::default());
    assert!(actions.iter().any(|x| matches!(x, Action::DeviceSelected { device } if device.id == a)));
    up(&mut c, 120.0, 120.0);
    assert_eq!(selected(&c), vec![a]);
    assert_eq!(c.state.selected_count, 1);
}

#[test]
fn shift_click_toggles_membership() {
    let mut c = controller();
    let a = place(&mut c, "router", 100.0, 100.0);
    let b = place(&mut c, "switch", 300.0, 100.0);

    click(&mut c, 120.0, 120.0, Modifiers::default());
    click(&mut c, 320.0, 120.0, shift());
    assert_eq!(selected(&c), vec![a.clone(), b.clone()]);

    let actions = down(&mut c, 120.0, 120.0, Button::Primary, shift());
    assert!(actions.contains(&Action::DeviceDeselected { id: a }));
    assert!(!actions.contains(&Action::SelectionCleared));
    up(&mut c, 120.0, 120.0);
    assert_eq!(selected(&c), vec![b]);
}

#[test]
fn dragging_a_device_moves_it_with_the_pointer() {
    let mut c = controller();
    let id = place(&mut c, "router", 100.0, 100.0);

    down(&mut c, 120.0, 120.0, Button::Primary, Modifiers::default());
    assert!(matches!(c.input, InputState::DraggingDevices { .. }));
    let actions = move_to(&mut c, 150.0, 130.0);
    assert!(actions.contains(&Action::DeviceMoved { id: id.clone(), x: 130.0, y: 110.0 }));
    assert_eq!(actions.last(), Some(&Action::RenderNeeded));
    up(&mut c, 150.0, 130.0);

    assert_eq!(c.input, InputState::Idle);
    assert_eq!(position(&c, &id), (130.0, 110.0));
    assert!(c.connections.updated.contains(&id));
}

#[test]
fn dragging_moves_every_selected_device() {
    let mut c = controller();
    let a = place(&mut c, "router", 100.0, 100.0);
    let b = place(&mut c, "switch", 300.0, 100.0);
    key(&mut c, "a", ctrl());
    assert_eq!(c.state.selected_count, 2);

    down(&mut c, 120.0, 120.0, Button::Primary, Modifiers::default());
    move_to(&mut c, 140.0, 150.0);
    up(&mut c, 140.0, 150.0);

    assert_eq!(position(&c, &a), (120.0, 130.0));
    assert_eq!(position(&c, &b), (320.0, 130.0));
    assert_eq!(c.state.selected_count, 2);
}

#[test]
fn drag_respects_zoom() {
    let mut c = controller();
    let id = place(&mut c, "router", 100.0, 100.0);
    c.transform.set_zoom(2.0);

    // Canvas (110, 110) is at client (220, 220) at 200%.
    down(&mut c, 220.0, 220.0, Button::Primary, Modifiers::default());
    move_to(&mut c, 240.0, 260.0);
    assert_eq!(position(&c, &id), (110.0, 120.0));
}

#[test]
fn pointer_leave_ends_drag() {
    let mut c = controller();
    let id = place(&mut c, "router", 100.0, 100.0);
    down(&mut c, 120.0, 120.0, Button::Primary, Modifiers::default());
    move_to(&mut c, 130.0, 120.0);
    let actions = c.dispatch(InputEvent::PointerLeave);
    assert!(actions.contains(&Action::SetCursor { cursor: "default" }));
    assert_eq!(c.input, InputState::Idle);

    move_to(&mut c, 300.0, 300.0);
    assert_eq!(position(&c, &id), (110.0, 100.0));
}

#[test]
fn click_on_empty_canvas_clears_selection() {
    let mut c = controller();
    let id = place(&mut c, "router", 100.0, 100.0);
    c.select_device(&id, false);

    down(&mut c, 700.0, 500.0, Button::Primary, Modifiers::default());
    let actions = up(&mut c, 701.0, 500.0);
    assert!(actions.contains(&Action::SelectionCleared));
    assert_eq!(c.state.selected_count, 0);
}

#[test]
fn rubber_band_selects_devices_by_position() {
    let mut c = controller();
    let a = place(&mut c, "router", 100.0, 100.0);
    let b = place(&mut c, "switch", 300.0, 100.0);
    place(&mut c, "server", 600.0, 400.0);

    down(&mut c, 50.0, 50.0, Button::Primary, Modifiers::default());
    let actions = move_to(&mut c, 400.0, 150.0);
    assert_eq!(actions, vec![Action::SelectionBand { rect: Rect::new(50.0, 50.0, 350.0, 100.0) }]);
    up(&mut c, 400.0, 150.0);

    assert_eq!(selected(&c), vec![a, b]);
    assert_eq!(c.input, InputState::Idle);
}

// =============================================================
// Pointer: pan and wheel
// =============================================================

#[test]
fn middle_drag_pans_the_viewport() {
    let mut c = controller();
    let actions = down(&mut c, 100.0, 100.0, Button::Middle, Modifiers::default());
    assert_eq!(actions, vec![Action::SetCursor { cursor: "grabbing" }]);
    assert_eq!(c.input, InputState::Panning);

    let actions = move_to(&mut c, 50.0, 100.0);
    assert!(actions.contains(&Action::ScrollChanged { scroll: pt(50.0, 0.0) }));
    assert_eq!(actions.last(), Some(&Action::RenderNeeded));

    up(&mut c, 50.0, 100.0);
    assert_eq!(c.input, InputState::Idle);
    assert!(!c.transform.is_panning());
}

#[test]
fn alt_drag_over_a_device_pans_instead_of_moving_it() {
    let mut c = controller();
    let id = place(&mut c, "router", 100.0, 100.0);
    let alt = Modifiers { alt: true, ..Modifiers::default() };
    down(&mut c, 120.0, 120.0, Button::Primary, alt);
    move_to(&mut c, 100.0, 120.0);
    assert_eq!(position(&c, &id), (100.0, 100.0));
    assert_eq!(c.transform.scroll(), pt(20.0, 0.0));
}

#[test]
fn ctrl_wheel_zooms_at_cursor() {
    let mut c = controller();
    let anchor = pt(100.0, 100.0);
    let before = c.transform.screen_to_canvas(anchor).unwrap();
    let actions = c.dispatch(InputEvent::Wheel { at: anchor, delta: WheelDelta { dx: 0.0, dy: -120.0 }, modifiers: ctrl() });

    assert!((c.transform.zoom() - 1.1).abs() < 1e-9);
    assert!(actions.iter().any(|a| matches!(a, Action::ZoomChanged { percent: 110, .. })));
    let after = c.transform.screen_to_canvas(anchor).unwrap();
    assert!((before.x - after.x).abs() < 1e-6 && (before.y - after.y).abs() < 1e-6);
    assert!((c.state.current_zoom - 1.1).abs() < 1e-9);

    c.dispatch(InputEvent::Wheel { at: anchor, delta: WheelDelta { dx: 0.0, dy: 120.0 }, modifiers: ctrl() });
    assert!((c.transform.zoom() - 1.0).abs() < 1e-9);
}

#[test]
fn plain_wheel_scrolls() {
    let mut c = controller();
    c.dispatch(InputEvent::Wheel { at: pt(0.0, 0.0), delta: WheelDelta { dx: 0.0, dy: 50.0 }, modifiers: Modifiers::default() });
    assert_eq!(c.transform.scroll(), pt(0.0, 50.0));
    assert_eq!(c.transform.zoom(), 1.0);
}

// =============================================================
// Keyboard
// =============================================================

#[test]
fn zoom_keys_step_and_reset() {
    let mut c = controller();
    key(&mut c, "+", Modifiers::default());
    assert!((c.transform.zoom() - 1.2).abs() < 1e-9);
    key(&mut c, "=", Modifiers::default());
    assert!((c.transform.zoom() - 1.44).abs() < 1e-9);
    key(&mut c, "-", Modifiers::default());
    assert!((c.transform.zoom() - 1.2).abs() < 1e-9);
    let actions = key(&mut c, "0", Modifiers::default());
    assert_eq!(c.transform.zoom(), 1.0);
    assert!(actions.contains(&Action::ZoomChanged { zoom: 1.0, percent: 100 }));
}

#[test]
fn delete_key_removes_selection_and_cascades_connections() {
    let mut c = controller();
    let a = place(&mut c, "router", 0.0, 0.0);
    let b = place(&mut c, "switch", 200.0, 0.0);
    c.registry.link_connection(&a, ConnectionId::new("a-b")).unwrap();
    c.registry.link_connection(&b, ConnectionId::new("a-b")).unwrap();
    c.select_device(&a, false);

    let actions = key(&mut c, "Delete", Modifiers::default());
    assert!(actions.contains(&Action::DeviceRemoved { id: a.clone() }));
    assert_eq!(c.connections.removed, vec![ConnectionId::new("a-b")]);
    assert!(c.registry.get(&b).unwrap().connections.is_empty());
    assert_eq!(c.state.device_count, 1);
}

#[test]
fn backspace_with_empty_selection_changes_nothing() {
    let mut c = controller();
    place(&mut c, "router", 0.0, 0.0);
    let actions = key(&mut c, "Backspace", Modifiers::default());
    assert!(actions.is_empty());
    assert_eq!(c.state.device_count, 1);
}

#[test]
fn escape_clears_and_ctrl_a_selects_all() {
    let mut c = controller();
    place(&mut c, "router", 0.0, 0.0);
    place(&mut c, "switch", 200.0, 0.0);
    key(&mut c, "a", ctrl());
    assert_eq!(c.state.selected_count, 2);
    let actions = key(&mut c, "Escape", Modifiers::default());
    assert!(actions.contains(&Action::SelectionCleared));
    assert_eq!(c.state.selected_count, 0);

    // Plain "a" is not bound.
    assert!(key(&mut c, "a", Modifiers::default()).is_empty());
}

#[test]
fn arrow_keys_nudge_selection() {
    let mut c = controller();
    let id = place(&mut c, "router", 100.0, 100.0);
    let other = place(&mut c, "switch", 300.0, 100.0);
    c.select_device(&id, false);

    key(&mut c, "ArrowRight", Modifiers::default());
    key(&mut c, "ArrowDown", shift());
    key(&mut c, "ArrowUp", Modifiers::default());
    assert_eq!(position(&c, &id), (110.0, 91.0));
    assert_eq!(position(&c, &other), (300.0, 100.0));
}

// =============================================================
// Navigation and frames
// =============================================================

#[test]
fn fit_key_zooms_now_and_centers_next_frame() {
    let mut c = controller();
    place(&mut c, "router", 0.0, 0.0);
    place(&mut c, "switch", 920.0, 0.0);

    let actions = key(&mut c, "f", Modifiers::default());
    assert!(actions.iter().any(|a| matches!(a, Action::ZoomChanged { .. })));
    assert!(has_frame_request(&actions));
    assert!((c.transform.zoom() - 800.0 / 1100.0).abs() < 1e-9);

    let actions = c.dispatch(InputEvent::Frame { now_ms: 16.0 });
    assert!(actions.iter().any(|a| matches!(a, Action::ScrollChanged { .. })));
    assert!(!has_frame_request(&actions));
    let center = c.transform.screen_to_canvas(pt(400.0, 300.0)).unwrap();
    assert!((center.x - 500.0).abs() < 1e-6 && (center.y - 40.0).abs() < 1e-6);
}

#[test]
fn fit_with_no_devices_changes_nothing() {
    let mut c = controller();
    assert!(c.fit_to_content().is_empty());
    assert_eq!(c.transform.zoom(), 1.0);
}

#[test]
fn minimap_reports_indicator_and_click_animates() {
    let mut c = controller();
    let actions = c.dispatch(InputEvent::MinimapResize { width: 200.0, height: 200.0 });
    let Some(Action::MinimapUpdated { indicator }) = actions.first() else {
        panic!("expected indicator, got {actions:?}");
    };
    assert!((indicator.width - 32.0).abs() < 1e-9);

    let actions = c.dispatch(InputEvent::MinimapClick { at: pt(100.0, 100.0) });
    assert!(has_frame_request(&actions));

    c.dispatch(InputEvent::Frame { now_ms: 16.0 });
    c.dispatch(InputEvent::Frame { now_ms: 266.0 });
    let actions = c.dispatch(InputEvent::Frame { now_ms: 516.0 });
    assert!(!has_frame_request(&actions));
    let scroll = c.transform.scroll();
    assert!((scroll.x - 2100.0).abs() < 1e-6 && (scroll.y - 2200.0).abs() < 1e-6);
}

#[test]
fn focus_device_animates_device_to_center() {
    let mut c = controller();
    let id = place(&mut c, "server", 1000.0, 1000.0);
    let actions = c.focus_device(&id);
    assert!(has_frame_request(&actions));

    c.dispatch(InputEvent::Frame { now_ms: 16.0 });
    c.dispatch(InputEvent::Frame { now_ms: 16.0 + c.config().animation_ms });
    assert_eq!(c.transform.scroll(), pt(640.0, 740.0));
    assert!(matches!(&c.focus_device(&DeviceId::new("ghost"))[0], Action::Rejected { .. }));
}

#[test]
fn focus_after_a_long_idle_gap_still_animates() {
    let mut c = controller();
    let id = place(&mut c, "server", 2000.0, 2000.0);
    c.dispatch(InputEvent::Frame { now_ms: 1_000.0 });
    c.focus_device(&id);

    // The host sends no frames while idle; the next one arrives a minute later.
    let actions = c.dispatch(InputEvent::Frame { now_ms: 61_016.0 });
    assert!(has_frame_request(&actions));
    assert_eq!(c.transform.scroll(), pt(0.0, 0.0));

    let actions = c.dispatch(InputEvent::Frame { now_ms: 61_266.0 });
    assert!(has_frame_request(&actions));
    let mid = c.transform.scroll();
    assert!(mid.x > 820.0 && mid.x < 1640.0, "eased past halfway: {mid:?}");

    let actions = c.dispatch(InputEvent::Frame { now_ms: 61_516.0 });
    assert!(!has_frame_request(&actions));
    assert_eq!(c.transform.scroll(), pt(1640.0, 1740.0));
}

#[test]
fn idle_frame_produces_no_actions() {
    let mut c = controller();
    assert!(c.dispatch(InputEvent::Frame { now_ms: 16.0 }).is_empty());
    assert_eq!(c.clock_ms(), 16.0);
}

#[test]
fn reset_view_returns_to_identity() {
    let mut c = controller();
    c.center_on(pt(1000.0, 1000.0));
    key(&mut c, "+", Modifiers::default());
    let actions = c.reset_view();
    assert!(actions.contains(&Action::ScrollChanged { scroll: pt(0.0, 0.0) }));
    assert_eq!(c.state.current_zoom, 1.0);
}

#[test]
fn resize_to_zero_detaches_display_area() {
    let mut c = controller();
    c.dispatch(InputEvent::Resize { left: 0.0, top: 0.0, width: 0.0, height: 0.0 });
    assert_eq!(c.transform.host(), None);
    assert!(!c.transform.zoom_in());
}
