use genogram::algorithms::auto_layout::{compute_generations, GENERATION_SPACING, SIBLING_SPACING};
use genogram::model::{NodeSize, PersonAttribute, SubjectStyle};
use genogram::commands::SubjectUpdate;
use genogram::{Editor, EditorConfig, LayoutEngine, ManualClock, Point};
use std::rc::Rc;

fn editor() -> Editor {
    Editor::with_clock(EditorConfig::default(), Rc::new(ManualClock::new(0)))
}

fn person(ed: &mut Editor, x: f64, y: f64) -> String {
    ed.add_person(Point::new(x, y), PersonAttribute::default()).unwrap()
}

#[test]
fn placement_walks_toward_the_click() {
    let mut ed = editor();
    person(&mut ed, 0.0, 0.0);
    // Raw click below the snapped spot pushes the new node downward.
    let p = ed.engine().place_new_node(ed.layout(), Point::new(2.0, 8.0));
    assert_eq!(p, Point::new(0.0, 20.0));
    let q = ed.engine().place_new_node(ed.layout(), Point::new(-8.0, 1.0));
    assert_eq!(q, Point::new(-20.0, 0.0));
}

#[test]
fn placement_without_snap_keeps_raw_click() {
    let mut ed = editor();
    ed.set_grid_snap(false);
    let id = person(&mut ed, 13.0, 7.0);
    assert_eq!(ed.layout().nodes[&id].position, Point::new(13.0, 7.0));
}

#[test]
fn node_picking_respects_size_and_z_order() {
    let mut ed = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 40.0, 0.0);
    let engine = ed.engine();
    // Between the two discs the later node wins.
    assert_eq!(engine.find_node_at_point(ed.layout(), ed.genogram(), Point::new(20.0, 0.0)), Some(b.clone()));
    assert_eq!(engine.find_node_at_point(ed.layout(), ed.genogram(), Point::new(-10.0, 0.0)), Some(a.clone()));
    assert_eq!(engine.find_node_at_point(ed.layout(), ed.genogram(), Point::new(0.0, 100.0)), None);

    assert!(ed.update_subject(
        &a,
        SubjectUpdate { entity: None, style: Some(SubjectStyle { size: NodeSize::Large, ..SubjectStyle::default() }) }
    ));
    let engine = ed.engine();
    assert_eq!(engine.find_node_at_point(ed.layout(), ed.genogram(), Point::new(0.0, 34.0)), Some(a));
}

#[test]
fn connection_picking_follows_partner_midpoint() {
    let mut ed = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 200.0, 0.0);
    let c = person(&mut ed, 100.0, 200.0);
    let couple = ed.add_partner_relationship(&a, &b).unwrap();
    let link = ed.add_child_relationship(&couple, &c).unwrap();
    let engine = ed.engine();
    assert_eq!(engine.find_connection_at_point(ed.layout(), ed.genogram(), Point::new(60.0, 3.0)), Some(couple));
    assert_eq!(engine.find_connection_at_point(ed.layout(), ed.genogram(), Point::new(101.0, 120.0)), Some(link));
    assert_eq!(engine.find_connection_at_point(ed.layout(), ed.genogram(), Point::new(160.0, 120.0)), None);
}

#[test]
fn rect_query_is_order_independent() {
    let mut ed = editor();
    let a = person(&mut ed, 0.0, 0.0);
    let b = person(&mut ed, 100.0, 100.0);
    person(&mut ed, 400.0, 400.0);
    let engine = ed.engine();
    let mut expected = vec![a, b];
    expected.sort();
    let down = engine.find_nodes_in_rect(ed.layout(), ed.genogram(), Point::new(-10.0, -10.0), Point::new(110.0, 110.0));
    let up = engine.find_nodes_in_rect(ed.layout(), ed.genogram(), Point::new(110.0, 110.0), Point::new(-10.0, -10.0));
    assert_eq!(down, expected);
    assert_eq!(up, expected);
}

#[test]
fn generations_follow_parent_links() {
    let mut ed = editor();
    let gp = person(&mut ed, 0.0, 0.0);
    let parent = person(&mut ed, 0.0, 100.0);
    let spouse = person(&mut ed, 100.0, 100.0);
    let kid = person(&mut ed, 0.0, 200.0);
    ed.add_child_relationship(&gp, &parent).unwrap();
    let couple = ed.add_partner_relationship(&parent, &spouse).unwrap();
    ed.add_child_relationship(&couple, &kid).unwrap();

    let gens = compute_generations(ed.genogram());
    assert_eq!(gens[&gp], 0);
    assert_eq!(gens[&parent], 1);
    assert_eq!(gens[&spouse], 1);
    assert_eq!(gens[&kid], 2);

    let placed = LayoutEngine::default().auto_layout_by_generation(ed.genogram(), ed.layout(), Point::default());
    let at = |id: &str| placed.iter().find(|(pid, _)| pid == id).map(|(_, p)| *p);
    assert_eq!(at(&kid), Some(Point::new(0.0, 2.0 * GENERATION_SPACING)));
    assert_eq!(at(&spouse), Some(Point::new(SIBLING_SPACING, GENERATION_SPACING)));
}
