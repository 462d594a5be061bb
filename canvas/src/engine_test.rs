#![allow(clippy::float_cmp)]

use super::*;
use crate::io::InMemoryFile;
use crate::render::FrameCapture;
use crate::scene::Rgba;

// =============================================================
// Helpers
// =============================================================

const DOC: &str = r##"<svg viewBox="0 0 100 100"><line x1="10" y1="10" x2="90" y2="90" stroke="#ff0000"/></svg>"##;

const EPSILON: f64 = 1e-9;

/// A core whose surface is 100px so that screen and document coordinates
/// coincide until the view moves.
fn loaded_core() -> EngineCore {
    let mut core = EngineCore::new(ViewerConfig { surface_size: 100.0, ..ViewerConfig::default() });
    core.load_document(DOC).unwrap();
    core
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn has_action<F>(actions: &[Action], pred: F) -> bool
where
    F: Fn(&Action) -> bool,
{
    actions.iter().any(pred)
}

fn has_render_needed(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::RenderNeeded))
}

fn has_cursor(actions: &[Action], cursor: &str) -> bool {
    has_action(actions, |a| matches!(a, Action::SetCursor(c) if c == cursor))
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn viewbox_approx_eq(a: Viewbox, b: Viewbox) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.size, b.size)
}

fn viewbox(core: &EngineCore) -> Viewbox {
    core.viewbox().unwrap()
}

// =============================================================
// EngineCore: construction and loading
// =============================================================

#[test]
fn core_default_has_nothing_loaded() {
    let core = EngineCore::default();
    assert!(!core.export_enabled());
    assert!(core.viewbox().is_none());
    assert!(core.scene().is_none());
    assert!(core.input.is_idle());
}

#[test]
fn load_initializes_viewbox_and_scene() {
    let core = loaded_core();
    assert_eq!(core.original_viewbox(), Some(Viewbox::new(0.0, 0.0, 100.0)));
    assert_eq!(core.viewbox(), core.original_viewbox());
    assert_eq!(core.scene().unwrap().len(), 1);
    assert!(core.export_enabled());
}

#[test]
fn load_raises_export_enabled_and_requests_render() {
    let mut core = EngineCore::default();
    let actions = core.load_document(DOC).unwrap();
    assert!(has_action(&actions, |a| matches!(a, Action::ExportEnabled(true))));
    assert!(has_render_needed(&actions));
}

#[test]
fn load_without_geometry_uses_canonical_square() {
    let mut core = EngineCore::default();
    core.load_document("<svg/>").unwrap();
    assert_eq!(core.viewbox(), Some(Viewbox::canonical(512.0)));
    assert_eq!(core.scene().unwrap().renderable_count(), 0);
}

#[test]
fn failed_load_keeps_previous_document() {
    let mut core = loaded_core();
    core.on_wheel(pt(50.0, 50.0), WheelDelta { dx: 0.0, dy: -100.0 });
    let before = viewbox(&core);
    let err = core.load_document("<svg><line></svg>").unwrap_err();
    assert!(matches!(err, ViewerError::ParseFailure(_)));
    assert_eq!(viewbox(&core), before);
    assert_eq!(core.scene().unwrap().len(), 1);
}

#[test]
fn failed_first_load_leaves_export_disabled() {
    let mut core = EngineCore::default();
    assert!(core.load_document("not markup <").is_err());
    assert!(!core.export_enabled());
}

#[test]
fn reload_replaces_scene_and_drops_gesture() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(10.0, 10.0), Button::Secondary);
    core.add_user_segment(pt(0.0, 0.0), pt(1.0, 1.0));
    let actions = core.load_document(r#"<svg viewBox="0 0 10 20"/>"#).unwrap();
    assert!(core.input.is_idle());
    assert!(has_cursor(&actions, "default"));
    assert_eq!(core.original_viewbox(), Some(Viewbox::new(0.0, 0.0, 20.0)));
    assert!(core.scene().unwrap().is_empty());
}

#[test]
fn open_reads_through_io() {
    let mut core = EngineCore::default();
    let mut io = InMemoryFile::with_content(DOC);
    core.open(&mut io).unwrap();
    assert!(core.export_enabled());
}

#[test]
fn open_read_failure_keeps_state() {
    let mut core = loaded_core();
    let mut io = InMemoryFile::default();
    assert!(matches!(core.open(&mut io), Err(ViewerError::ReadFailure(_))));
    assert_eq!(core.scene().unwrap().len(), 1);
}

// =============================================================
// No document loaded
// =============================================================

#[test]
fn handlers_are_noops_without_document() {
    let mut core = EngineCore::default();
    assert!(core.on_pointer_down(pt(1.0, 1.0), Button::Primary).is_empty());
    assert!(core.on_pointer_move(pt(2.0, 2.0)).is_empty());
    assert!(core.on_pointer_up(pt(2.0, 2.0), Button::Primary).is_empty());
    assert!(core.on_pointer_down(pt(1.0, 1.0), Button::Secondary).is_empty());
    assert!(core.on_wheel(pt(1.0, 1.0), WheelDelta { dx: 0.0, dy: -50.0 }).is_empty());
    assert!(core.on_key_down(&Key("r".into())).is_empty());
    assert!(core.reset_view().is_empty());
    assert!(core.input.is_idle());
}

#[test]
fn add_user_segment_without_document_is_none() {
    let mut core = EngineCore::default();
    assert!(core.add_user_segment(pt(0.0, 0.0), pt(1.0, 1.0)).is_none());
}

#[test]
fn export_without_document_declines() {
    let core = EngineCore::default();
    let mut io = InMemoryFile::default();
    assert_eq!(core.export(&mut io).unwrap(), SaveOutcome::Declined);
    assert!(io.written.is_empty());
    assert!(core.export_text().unwrap().is_none());
}

#[test]
fn render_without_document_draws_nothing() {
    let core = EngineCore::default();
    let mut capture = FrameCapture::new();
    assert_eq!(core.render(&mut capture).unwrap(), 0);
    assert_eq!(capture.draw_calls, 0);
}

// =============================================================
// Dragging
// =============================================================

#[test]
fn primary_down_starts_drag() {
    let mut core = loaded_core();
    let actions = core.on_pointer_down(pt(20.0, 30.0), Button::Primary);
    assert!(core.input.is_dragging());
    assert_eq!(core.input.drag_anchor(), Some(pt(20.0, 30.0)));
    assert!(has_cursor(&actions, "grabbing"));
}

#[test]
fn drag_move_pans_from_anchor() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(20.0, 30.0), Button::Primary);
    let actions = core.on_pointer_move(pt(25.0, 20.0));
    assert!(has_render_needed(&actions));
    // delta = anchor - current = (-5, 10); pan subtracts it.
    assert!(viewbox_approx_eq(viewbox(&core), Viewbox::new(5.0, -10.0, 100.0)));
}

#[test]
fn drag_result_is_independent_of_intermediate_moves() {
    let mut direct = loaded_core();
    direct.on_pointer_down(pt(10.0, 10.0), Button::Primary);
    direct.on_pointer_up(pt(60.0, 35.0), Button::Primary);

    let mut stepped = loaded_core();
    stepped.on_pointer_down(pt(10.0, 10.0), Button::Primary);
    for i in 0..37 {
        let f = f64::from(i);
        stepped.on_pointer_move(pt(10.0 + f * 3.3, 10.0 - f * 1.7));
    }
    stepped.on_pointer_up(pt(60.0, 35.0), Button::Primary);

    assert!(viewbox_approx_eq(viewbox(&direct), viewbox(&stepped)));
}

#[test]
fn drag_then_release_equals_single_pan() {
    let mut core = loaded_core();
    let start = viewbox(&core);
    let a = core.screen_to_doc(pt(10.0, 80.0)).unwrap();
    let b = start.screen_to_doc(pt(70.0, 5.0), 100.0);
    core.on_pointer_down(pt(10.0, 80.0), Button::Primary);
    core.on_pointer_move(pt(40.0, 40.0));
    core.on_pointer_move(pt(90.0, 0.0));
    core.on_pointer_up(pt(70.0, 5.0), Button::Primary);
    assert!(viewbox_approx_eq(viewbox(&core), start.pan_by(a.minus(b))));
}

#[test]
fn primary_up_ends_drag() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(20.0, 30.0), Button::Primary);
    let actions = core.on_pointer_up(pt(20.0, 30.0), Button::Primary);
    assert!(core.input.is_idle());
    assert!(has_cursor(&actions, "default"));
    assert_eq!(viewbox(&core), Viewbox::new(0.0, 0.0, 100.0));
}

#[test]
fn secondary_up_does_not_end_drag() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(20.0, 30.0), Button::Primary);
    assert!(core.on_pointer_up(pt(20.0, 30.0), Button::Secondary).is_empty());
    assert!(core.input.is_dragging());
}

#[test]
fn secondary_click_while_dragging_is_ignored() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(20.0, 30.0), Button::Primary);
    assert!(core.on_pointer_down(pt(40.0, 40.0), Button::Secondary).is_empty());
    assert!(core.input.is_dragging());
    assert!(core.scene().unwrap().user_segments().is_empty());
}

#[test]
fn move_while_idle_does_nothing() {
    let mut core = loaded_core();
    assert!(core.on_pointer_move(pt(5.0, 5.0)).is_empty());
    assert_eq!(viewbox(&core), Viewbox::new(0.0, 0.0, 100.0));
}

#[test]
fn middle_button_is_ignored() {
    let mut core = loaded_core();
    assert!(core.on_pointer_down(pt(5.0, 5.0), Button::Middle).is_empty());
    assert!(core.input.is_idle());
}

// =============================================================
// Placing segments
// =============================================================

#[test]
fn secondary_click_starts_segment() {
    let mut core = loaded_core();
    let actions = core.on_pointer_down(pt(12.0, 34.0), Button::Secondary);
    assert_eq!(core.input.pending_point(), Some(pt(12.0, 34.0)));
    assert!(has_cursor(&actions, "crosshair"));
}

#[test]
fn move_while_placing_updates_preview() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(12.0, 34.0), Button::Secondary);
    let actions = core.on_pointer_move(pt(50.0, 60.0));
    assert!(has_render_needed(&actions));
    assert_eq!(core.input.preview(), Some((pt(12.0, 34.0), pt(50.0, 60.0))));
    assert!(core.scene().unwrap().user_segments().is_empty());
}

#[test]
fn second_secondary_click_commits_segment() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(0.0, 0.0), Button::Secondary);
    core.on_pointer_move(pt(10.0, 10.0));
    let actions = core.on_pointer_down(pt(20.0, 20.0), Button::Secondary);
    assert!(core.input.is_idle());
    assert!(has_render_needed(&actions));
    assert!(has_cursor(&actions, "default"));
    let expected = LineSegment::new(pt(0.0, 0.0), pt(20.0, 20.0), Rgba::from_array([1.0, 0.0, 0.0, 1.0]));
    assert!(has_action(&actions, |a| *a == Action::SegmentAdded(expected)));
    assert_eq!(core.scene().unwrap().user_segments(), &[expected]);
}

#[test]
fn primary_down_while_placing_is_ignored() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(0.0, 0.0), Button::Secondary);
    assert!(core.on_pointer_down(pt(5.0, 5.0), Button::Primary).is_empty());
    assert!(core.input.is_placing());
}

#[test]
fn segment_endpoints_follow_live_viewbox() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(0.0, 0.0), Button::Primary);
    core.on_pointer_up(pt(-10.0, -10.0), Button::Primary);
    // Viewbox is now at (-10, -10).
    core.on_pointer_down(pt(10.0, 10.0), Button::Secondary);
    core.on_pointer_down(pt(30.0, 30.0), Button::Secondary);
    let seg = core.scene().unwrap().user_segments()[0];
    assert!(approx_eq(seg.a.x, 0.0) && approx_eq(seg.a.y, 0.0));
    assert!(approx_eq(seg.b.x, 20.0) && approx_eq(seg.b.y, 20.0));
}

// =============================================================
// Wheel
// =============================================================

#[test]
fn wheel_zooms_and_suppresses_default() {
    let mut core = loaded_core();
    let actions = core.on_wheel(pt(50.0, 50.0), WheelDelta { dx: 0.0, dy: -100.0 });
    assert!(has_action(&actions, |a| matches!(a, Action::SuppressDefault)));
    assert!(has_render_needed(&actions));
    assert!(viewbox(&core).size < 100.0);
}

#[test]
fn wheel_keeps_point_under_cursor() {
    let mut core = loaded_core();
    let screen = pt(20.0, 70.0);
    let doc = core.screen_to_doc(screen).unwrap();
    core.on_wheel(screen, WheelDelta { dx: 0.0, dy: -250.0 });
    let back = core.doc_to_screen(doc).unwrap();
    assert!(approx_eq(back.x, screen.x) && approx_eq(back.y, screen.y));
}

#[test]
fn zero_wheel_suppresses_without_render() {
    let mut core = loaded_core();
    let actions = core.on_wheel(pt(50.0, 50.0), WheelDelta { dx: 40.0, dy: 0.0 });
    assert_eq!(actions, vec![Action::SuppressDefault]);
}

#[test]
fn wheel_while_placing_keeps_gesture() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(10.0, 10.0), Button::Secondary);
    core.on_wheel(pt(50.0, 50.0), WheelDelta { dx: 0.0, dy: -100.0 });
    assert_eq!(core.input.pending_point(), Some(pt(10.0, 10.0)));
}

#[test]
fn wheel_while_dragging_rebases_drag() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(20.0, 20.0), Button::Primary);
    core.on_wheel(pt(20.0, 20.0), WheelDelta { dx: 0.0, dy: -100.0 });
    let zoomed = viewbox(&core);
    assert!(core.input.is_dragging());
    // Releasing where the wheel happened leaves the zoomed window in place.
    core.on_pointer_up(pt(20.0, 20.0), Button::Primary);
    assert!(viewbox_approx_eq(viewbox(&core), zoomed));
}

// =============================================================
// Reset
// =============================================================

#[test]
fn reset_key_restores_original_viewbox() {
    let mut core = loaded_core();
    core.on_wheel(pt(30.0, 30.0), WheelDelta { dx: 0.0, dy: -300.0 });
    core.on_pointer_down(pt(0.0, 0.0), Button::Primary);
    core.on_pointer_up(pt(40.0, 10.0), Button::Primary);
    let actions = core.on_key_down(&Key("r".into()));
    assert!(has_render_needed(&actions));
    assert_eq!(core.viewbox(), core.original_viewbox());
}

#[test]
fn reset_key_discards_gesture() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(10.0, 10.0), Button::Secondary);
    let actions = core.on_key_down(&Key("R".into()));
    assert!(core.input.is_idle());
    assert!(has_cursor(&actions, "default"));
}

#[test]
fn other_keys_are_ignored() {
    let mut core = loaded_core();
    core.on_wheel(pt(30.0, 30.0), WheelDelta { dx: 0.0, dy: -300.0 });
    assert!(core.on_key_down(&Key("x".into())).is_empty());
    assert_ne!(core.viewbox(), core.original_viewbox());
}

#[test]
fn custom_reset_keys_are_honored() {
    let mut core = EngineCore::new(ViewerConfig { reset_keys: vec!["Home".into()], ..ViewerConfig::default() });
    core.load_document(DOC).unwrap();
    assert!(core.on_key_down(&Key("r".into())).is_empty());
    assert!(has_render_needed(&core.on_key_down(&Key("Home".into()))));
}

// =============================================================
// handle_event
// =============================================================

#[test]
fn handle_event_dispatches_each_kind() {
    let mut core = loaded_core();
    core.handle_event(&InputEvent::PointerDown { x: 0.0, y: 0.0, button: Button::Secondary });
    core.handle_event(&InputEvent::PointerMove { x: 5.0, y: 5.0 });
    core.handle_event(&InputEvent::PointerDown { x: 20.0, y: 20.0, button: Button::Secondary });
    assert_eq!(core.scene().unwrap().user_segments().len(), 1);

    core.handle_event(&InputEvent::Wheel { x: 50.0, y: 50.0, dy: -100.0 });
    assert!(viewbox(&core).size < 100.0);

    core.handle_event(&InputEvent::KeyDown { key: Key("r".into()) });
    assert_eq!(core.viewbox(), core.original_viewbox());

    core.handle_event(&InputEvent::PointerDown { x: 0.0, y: 0.0, button: Button::Primary });
    core.handle_event(&InputEvent::PointerUp { x: 10.0, y: 0.0, button: Button::Primary });
    assert!(core.input.is_idle());
    assert_eq!(viewbox(&core).x, 10.0);
}

// =============================================================
// Export and render
// =============================================================

#[test]
fn export_writes_source_plus_user_lines() {
    let mut core = loaded_core();
    core.add_user_segment(pt(0.0, 0.0), pt(20.0, 20.0));
    let mut io = InMemoryFile::default();
    assert_eq!(core.export(&mut io).unwrap(), SaveOutcome::Saved);
    let doc = markup::parse(&io.written[0]).unwrap();
    let lines = doc.find_elements_by_tag("line");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].get_attribute("x2"), Some("20"));
}

#[test]
fn declined_export_is_not_an_error() {
    let core = loaded_core();
    let mut io = InMemoryFile { decline_writes: true, ..InMemoryFile::default() };
    assert_eq!(core.export(&mut io).unwrap(), SaveOutcome::Declined);
}

#[test]
fn render_includes_preview_last() {
    let mut core = loaded_core();
    core.on_pointer_down(pt(1.0, 2.0), Button::Secondary);
    core.on_pointer_move(pt(3.0, 4.0));
    let mut capture = FrameCapture::new();
    assert_eq!(core.render(&mut capture).unwrap(), 2);
    let points = &capture.last_frame.points;
    assert_eq!(points[3], glam::Vec4::new(3.0, 4.0, 0.0, 1.0));
}

#[test]
fn render_pushes_live_transform() {
    let mut core = loaded_core();
    core.on_wheel(pt(50.0, 50.0), WheelDelta { dx: 0.0, dy: -100.0 });
    let mut capture = FrameCapture::new();
    core.render(&mut capture).unwrap();
    assert_eq!(capture.uniform(crate::consts::TRANSFORM_UNIFORM), Some(viewbox(&core).transform()));
}
