use genogram::commands::{Command, ConnectionUpdate, DeselectAll};
use genogram::model::{
    ConnectionEntity, ParentChildAttribute, ParentChildStatus, PersonAttribute, RelationAttribute, RelationStatus,
};
use genogram::{
    ChangeReason, Editor, EditorConfig, EditorEvent, ManualClock, Modifiers, Point, Selection, ToolMode,
    ViewSettings,
};
use std::cell::RefCell;
use std::rc::Rc;

fn editor() -> (Rc<ManualClock>, Editor) {
    let clock = Rc::new(ManualClock::new(1_000));
    let ed = Editor::with_clock(EditorConfig::default(), clock.clone());
    (clock, ed)
}

fn person(ed: &mut Editor, x: f64, y: f64) -> String {
    ed.add_person(Point::new(x, y), PersonAttribute::default()).unwrap()
}

fn position(ed: &Editor, id: &str) -> Point {
    ed.layout().nodes[id].position
}

fn record_events(ed: &mut Editor) -> Rc<RefCell<Vec<EditorEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    ed.on(move |e| s.borrow_mut().push(e.clone()));
    seen
}

#[test]
fn second_person_on_same_spot_is_offset_by_a_grid_step() {
    let (_, mut ed) = editor();
    let p1 = person(&mut ed, 0.0, 0.0);
    let p2 = person(&mut ed, 0.0, 0.0);
    assert_eq!(position(&ed, &p1), Point::new(0.0, 0.0));
    assert_eq!(position(&ed, &p2), Point::new(20.0, 0.0));
    assert_eq!(ed.genogram().subjects[&p2].layout.center, Point::new(20.0, 0.0));
}

#[test]
fn couple_children_are_found_and_removed_with_the_partner_link() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 200.0, 0.0);
    let c = person(&mut ed, 100.0, 200.0);
    let couple = ed.add_partner_relationship(&a, &b).unwrap();
    let child = ed.add_child_relationship(&couple, &c).unwrap();

    let dependents = ed.state().index.get_by_parent_ref(&couple).cloned().unwrap_or_default();
    assert!(dependents.contains(&child));
    assert_eq!(ed.children_of(&couple), vec![child.clone()]);

    let before = ed.state().clone();
    assert!(ed.delete_relationship(&couple));
    assert!(ed.genogram().connections.is_empty());
    assert!(ed.children_of(&couple).is_empty());

    assert!(ed.undo());
    assert_eq!(ed.state(), &before);
    assert!(ed.genogram().connections.contains_key(&child));
}

#[test]
fn additive_selection_and_deselect_undo() {
    let (_, mut ed) = editor();
    let p1 = person(&mut ed, 0.0, 0.0);
    let p2 = person(&mut ed, 100.0, 0.0);
    ed.select(Selection::nodes([p1.clone()]), true);
    ed.select(Selection::nodes([p2.clone()]), false);
    let mut both = vec![p1, p2];
    both.sort();
    assert_eq!(ed.selected_items().nodes, both);

    // Selection commands never enter history but still undo themselves.
    let steps = ed.history().undo_count();
    let mut state = ed.state().clone();
    let mut deselect = Command::from(DeselectAll::new());
    deselect.execute(&mut state);
    assert!(state.layout.selection().is_empty());
    deselect.undo(&mut state);
    assert_eq!(state.layout.selection().nodes, both);

    ed.deselect_all();
    assert!(ed.selected_items().is_empty());
    assert_eq!(ed.history().undo_count(), steps);
}

#[test]
fn rapid_text_edits_collapse_into_one_step() {
    let (clock, mut ed) = editor();
    let note = ed.add_annotation("", Point::new(0.0, 0.0)).unwrap();
    clock.advance(1_000);
    for text in ["h", "he", "hel", "hell", "hello"] {
        assert!(ed.update_annotation_text(&note, text));
        clock.advance(50);
    }
    assert_eq!(ed.history().undo_count(), 2);
    assert!(ed.undo());
    assert_eq!(ed.genogram().annotations[&note].text, "");
}

#[test]
fn spaced_text_edits_stay_separate() {
    let (clock, mut ed) = editor();
    let note = ed.add_annotation("", Point::new(0.0, 0.0)).unwrap();
    for text in ["h", "he", "hel", "hell", "hello"] {
        clock.advance(500);
        assert!(ed.update_annotation_text(&note, text));
    }
    assert_eq!(ed.history().undo_count(), 6);
    assert!(ed.undo());
    assert_eq!(ed.genogram().annotations[&note].text, "hell");
}

#[test]
fn delete_person_cascades_and_undoes_in_one_step() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 200.0, 0.0);
    let c = person(&mut ed, 100.0, 200.0);
    let couple = ed.add_partner_relationship(&a, &b).unwrap();
    ed.add_child_relationship(&couple, &c).unwrap();
    ed.add_emotional_relationship(&a, &c, RelationStatus::Close).unwrap();
    let before = ed.state().clone();

    assert!(ed.delete_person(&a));
    assert!(ed.genogram().connections.is_empty());
    assert!(!ed.layout().nodes.contains_key(&a));

    assert!(ed.undo());
    assert_eq!(ed.state(), &before);
    assert!(ed.redo());
    assert!(ed.genogram().connections.is_empty());
}

#[test]
fn invalid_relationships_are_rejected() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 100.0, 0.0);
    assert!(ed.add_partner_relationship(&a, &a).is_none());
    assert!(ed.add_partner_relationship(&a, "missing").is_none());
    assert!(ed.add_child_relationship("missing", &b).is_none());
    let couple = ed.add_partner_relationship(&a, &b).unwrap();
    assert!(ed.add_child_relationship(&couple, &a).is_none());
    assert!(ed.add_group(vec![a.clone()]).is_none());
    assert!(ed.add_group(vec![a, b]).is_some());
}

fn relation(a: &str, b: &str) -> ConnectionUpdate {
    let attribute = RelationAttribute { status: RelationStatus::default(), subjects: [a.to_string(), b.to_string()] };
    ConnectionUpdate { entity: Some(ConnectionEntity::Relation { attribute, memo: None }), layout: None }
}

fn children(parent: &str, kids: &[&str]) -> ConnectionUpdate {
    let attribute = ParentChildAttribute {
        status: ParentChildStatus::Biological,
        parent_ref: parent.to_string(),
        child_refs: kids.iter().map(|k| k.to_string()).collect(),
    };
    ConnectionUpdate { entity: Some(ConnectionEntity::ParentChild { attribute, memo: None }), layout: None }
}

#[test]
fn twins_must_be_two_different_children() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 100.0, 0.0);
    let c = person(&mut ed, 0.0, 200.0);
    let d = person(&mut ed, 100.0, 200.0);
    let couple = ed.add_partner_relationship(&a, &b).unwrap();
    assert!(ed.add_twin_relationship(&couple, &c, &c, false).is_none());
    assert!(ed.children_of(&couple).is_empty());
    assert!(ed.add_twin_relationship(&couple, &c, &d, true).is_some());
}

#[test]
fn connection_updates_follow_the_add_rules() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 100.0, 0.0);
    let c = person(&mut ed, 50.0, 200.0);
    let couple = ed.add_partner_relationship(&a, &b).unwrap();
    let link = ed.add_child_relationship(&couple, &c).unwrap();
    let emotional = ed.add_emotional_relationship(&a, &c, RelationStatus::default()).unwrap();
    let steps = ed.history().undo_count();

    // A couple with children stays a partner link.
    assert!(!ed.update_connection(&couple, relation(&a, &b)));
    assert_eq!(ed.genogram().resolve_parents(&couple).len(), 2);

    assert!(!ed.update_connection(&emotional, relation(&a, &couple)));
    assert!(!ed.update_connection(&emotional, relation(&a, &a)));
    assert!(!ed.update_connection(&link, children(&a, &[&c, &c])));
    assert!(!ed.update_connection(&link, children(&link, &[&c])));
    assert!(!ed.update_connection(&link, children(&c, &[&c])));
    assert_eq!(ed.history().undo_count(), steps);

    assert!(ed.update_connection(&emotional, relation(&b, &c)));
    assert!(ed.update_connection(&link, children(&a, &[&c])));
    assert!(ed.children_of(&couple).is_empty());
    // Without children the couple can be retyped.
    assert!(ed.update_connection(&couple, relation(&a, &b)));
    assert!(ed.genogram().resolve_parents(&couple).is_empty());
}

#[test]
fn history_cap_evicts_oldest_steps_first() {
    let config = EditorConfig { max_history_size: 3, ..EditorConfig::default() };
    let mut ed = Editor::with_clock(config, Rc::new(ManualClock::new(1_000)));
    for i in 0..5 {
        person(&mut ed, i as f64 * 100.0, 0.0);
    }
    assert_eq!(ed.history().undo_count(), 3);
    while ed.undo() {}
    assert_eq!(ed.genogram().subjects.len(), 2);
}

#[test]
fn new_edit_after_undo_discards_redo() {
    let (_, mut ed) = editor();
    person(&mut ed, 0.0, 0.0);
    let p2 = person(&mut ed, 100.0, 0.0);
    assert!(ed.undo());
    assert!(ed.can_redo());
    let p3 = person(&mut ed, 200.0, 0.0);
    assert!(!ed.can_redo());
    assert!(!ed.redo());
    assert!(!ed.genogram().subjects.contains_key(&p2));
    assert!(ed.genogram().subjects.contains_key(&p3));
}

#[test]
fn spaced_moves_stay_separate() {
    let (clock, mut ed) = editor();
    let p = person(&mut ed, 0.0, 0.0);
    clock.advance(500);
    assert!(ed.move_person(&p, Point::new(40.0, 0.0)));
    clock.advance(500);
    assert!(ed.move_person(&p, Point::new(80.0, 0.0)));
    assert_eq!(ed.history().undo_count(), 3);
    assert!(ed.undo());
    assert_eq!(position(&ed, &p), Point::new(40.0, 0.0));
}

#[test]
fn delete_selected_is_one_transaction() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 200.0, 0.0);
    ed.add_partner_relationship(&a, &b).unwrap();
    ed.add_annotation("note", Point::new(0.0, 300.0)).unwrap();
    ed.select_all();
    let before = ed.state().clone();
    let steps = ed.history().undo_count();

    assert!(ed.delete_selected());
    assert!(ed.genogram().subjects.is_empty());
    assert!(ed.genogram().connections.is_empty());
    assert!(ed.genogram().annotations.is_empty());
    assert_eq!(ed.history().undo_count(), steps + 1);

    assert!(ed.undo());
    assert_eq!(ed.state(), &before);
}

#[test]
fn drag_commits_only_on_mouse_up() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let steps = ed.history().undo_count();

    ed.handle_mouse_down(Point::new(2.0, 2.0), Modifiers::default());
    assert_eq!(ed.selected_items().nodes, vec![a.clone()]);
    ed.handle_mouse_move(Point::new(30.0, 2.0));
    ed.handle_mouse_move(Point::new(45.0, 3.0));
    assert_eq!(position(&ed, &a), Point::new(0.0, 0.0));
    assert_eq!(ed.history().undo_count(), steps);

    ed.handle_mouse_up(Point::new(45.0, 3.0));
    assert_eq!(position(&ed, &a), Point::new(40.0, 0.0));
    assert_eq!(ed.history().undo_count(), steps + 1);
    assert!(ed.interaction().is_idle());

    assert!(ed.undo());
    assert_eq!(position(&ed, &a), Point::new(0.0, 0.0));
}

#[test]
fn box_selection_picks_enclosed_nodes() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    person(&mut ed, 300.0, 0.0);
    ed.handle_mouse_down(Point::new(-100.0, -100.0), Modifiers::default());
    ed.handle_mouse_move(Point::new(100.0, 100.0));
    assert_eq!(ed.interaction().selection_box.as_ref().map(|b| b.preview_ids.clone()), Some(vec![a.clone()]));
    ed.handle_mouse_up(Point::new(100.0, 100.0));
    assert_eq!(ed.selected_items().nodes, vec![a]);
}

#[test]
fn connect_tool_draws_partner_link() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 200.0, 0.0);
    ed.set_tool_mode(ToolMode::Connect);
    ed.set_connection_kind(genogram::model::ConnectionKind::Partner);

    ed.handle_mouse_down(Point::new(0.0, 0.0), Modifiers::default());
    ed.handle_mouse_move(Point::new(200.0, 0.0));
    assert_eq!(ed.interaction().connection.as_ref().and_then(|c| c.target_id.clone()), Some(b.clone()));
    ed.handle_mouse_up(Point::new(200.0, 0.0));

    let ids = ed.connections_of(&a);
    assert_eq!(ids.len(), 1);
    assert_eq!(ed.genogram().connections[&ids[0]].entity.partner_subjects(), Some(&[a, b]));

    // Releasing over empty canvas creates nothing.
    ed.handle_mouse_down(Point::new(0.0, 0.0), Modifiers::default());
    ed.handle_mouse_up(Point::new(500.0, 500.0));
    assert_eq!(ed.genogram().connections.len(), 1);
}

#[test]
fn create_node_tool_places_snapped_person() {
    let (_, mut ed) = editor();
    ed.set_tool_mode(ToolMode::CreateNode);
    ed.handle_mouse_down(Point::new(41.0, 39.0), Modifiers::default());
    assert!(ed.interaction().node_preview.is_some());
    ed.handle_mouse_up(Point::new(41.0, 39.0));
    let positions: Vec<Point> = ed.layout().nodes.values().map(|n| n.position).collect();
    assert_eq!(positions, vec![Point::new(40.0, 40.0)]);
}

#[test]
fn pan_tool_moves_view_without_history() {
    let (_, mut ed) = editor();
    ed.set_tool_mode(ToolMode::Pan);
    ed.handle_mouse_down(Point::new(0.0, 0.0), Modifiers::default());
    ed.handle_mouse_move(Point::new(10.0, 5.0));
    ed.handle_mouse_up(Point::new(10.0, 5.0));
    assert_eq!(ed.layout().canvas.offset, Point::new(10.0, 5.0));
    assert!(!ed.can_undo());
}

#[test]
fn switching_tools_resets_gestures() {
    let (_, mut ed) = editor();
    ed.handle_mouse_down(Point::new(-50.0, -50.0), Modifiers::default());
    assert!(ed.interaction().selection_box.is_some());
    ed.set_tool_mode(ToolMode::Pan);
    assert!(ed.interaction().is_idle());
    assert_eq!(ed.interaction().mode, ToolMode::Pan);
}

#[test]
fn wheel_zoom_keeps_anchor_fixed() {
    let (_, mut ed) = editor();
    let anchor = Point::new(100.0, 50.0);
    let under = ed.layout().canvas.screen_to_canvas(anchor);
    ed.handle_wheel(-1.0, anchor);
    let canvas = &ed.layout().canvas;
    assert!((canvas.zoom - 1.1).abs() < 1e-9);
    let after = canvas.screen_to_canvas(anchor);
    assert!((after.x - under.x).abs() < 1e-9 && (after.y - under.y).abs() < 1e-9);

    ed.set_zoom(100.0);
    assert_eq!(ed.layout().canvas.zoom, ed.config().max_zoom);
}

#[test]
fn read_only_blocks_structure_but_not_view() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    ed.set_view_settings(ViewSettings { read_only: true, ..ViewSettings::default() });
    assert!(ed.add_person(Point::new(100.0, 0.0), PersonAttribute::default()).is_none());
    assert!(!ed.delete_person(&a));
    assert!(!ed.undo());
    ed.select(Selection::nodes([a.clone()]), true);
    assert_eq!(ed.selected_items().nodes, vec![a]);
    ed.pan(5.0, 5.0);
    assert_eq!(ed.layout().canvas.offset, Point::new(5.0, 5.0));
}

#[test]
fn events_follow_change_scope() {
    let (_, mut ed) = editor();
    let seen = record_events(&mut ed);
    let a = person(&mut ed, 0.0, 0.0);
    ed.select(Selection::nodes([a]), true);
    ed.pan(1.0, 0.0);
    ed.set_tool_mode(ToolMode::Connect);
    ed.undo();
    let names: Vec<&str> = seen.borrow().iter().map(EditorEvent::name).collect();
    assert_eq!(
        names,
        vec!["state-change", "selection-change", "view-change", "tool-change", "state-change", "selection-change"]
    );
    assert_eq!(seen.borrow()[4], EditorEvent::StateChange { reason: ChangeReason::Undo });
}

#[test]
fn off_stops_notifications() {
    let (_, mut ed) = editor();
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    let id = ed.on(move |_| *c.borrow_mut() += 1);
    person(&mut ed, 0.0, 0.0);
    assert!(ed.off(id));
    person(&mut ed, 100.0, 0.0);
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn loading_clears_history_and_counts_as_saved() {
    let (clock, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 200.0, 0.0);
    ed.add_partner_relationship(&a, &b).unwrap();
    let json = ed.to_json().unwrap();

    let mut other = Editor::with_clock(EditorConfig::default(), clock.clone());
    let seen = record_events(&mut other);
    other.from_json(&json).unwrap();
    assert_eq!(other.genogram(), ed.genogram());
    assert_eq!(other.layout(), ed.layout());
    assert!(!other.can_undo());
    assert!(!other.has_unsaved_changes());
    assert_eq!(seen.borrow()[0], EditorEvent::StateChange { reason: ChangeReason::Load });
    assert_eq!(other.connections_of(&a).len(), 1);

    assert!(other.from_json("not json").is_err());
    assert_eq!(other.genogram(), ed.genogram());
}

#[test]
fn dirty_flag_tracks_saved_point() {
    let (_, mut ed) = editor();
    assert!(!ed.has_unsaved_changes());
    person(&mut ed, 0.0, 0.0);
    assert!(ed.has_unsaved_changes());
    ed.mark_saved();
    assert!(!ed.has_unsaved_changes());
    ed.undo();
    assert!(ed.has_unsaved_changes());
    ed.redo();
    assert!(!ed.has_unsaved_changes());
}

#[test]
fn auto_save_fires_after_interval_when_dirty() {
    let clock = Rc::new(ManualClock::new(0));
    let config = EditorConfig { auto_save_interval_ms: Some(1_000), ..EditorConfig::default() };
    let mut ed = Editor::with_clock(config, clock.clone());
    let seen = record_events(&mut ed);

    clock.advance(2_000);
    assert!(!ed.poll_auto_save());
    person(&mut ed, 0.0, 0.0);
    clock.advance(500);
    assert!(!ed.poll_auto_save());
    clock.advance(600);
    assert!(ed.poll_auto_save());
    assert!(seen.borrow().contains(&EditorEvent::StateChange { reason: ChangeReason::AutoSave }));
}

#[test]
fn auto_layout_stacks_generations() {
    let (_, mut ed) = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 40.0, 0.0);
    let c = person(&mut ed, 80.0, 0.0);
    let couple = ed.add_partner_relationship(&a, &b).unwrap();
    ed.add_child_relationship(&couple, &c).unwrap();

    assert!(ed.auto_layout());
    assert_eq!(position(&ed, &a).y, position(&ed, &b).y);
    assert!(position(&ed, &c).y > position(&ed, &a).y);
    assert!(ed.undo());
    assert_eq!(position(&ed, &c), Point::new(80.0, 0.0));
}

#[test]
fn new_document_resets_everything() {
    let (_, mut ed) = editor();
    person(&mut ed, 0.0, 0.0);
    ed.new_document("Family");
    assert!(ed.genogram().subjects.is_empty());
    assert_eq!(ed.genogram().metadata.title, "Family");
    assert!(!ed.can_undo());
}
