use crate::geometry::math::{midpoint, seg_distance_sq, Rect};
use crate::layout::LayoutState;
use crate::model::{Connection, ConnectionEntity, Genogram, NodeSize, Point};

fn node_radius(g: &Genogram, id: &str) -> f64 {
    g.subjects.get(id).map_or(NodeSize::Default.radius(), |s| s.layout.style.size.radius())
}

/// Half extents of an annotation box.
pub fn text_half_extents(size: NodeSize) -> (f64, f64) {
    match size {
        NodeSize::Small => (40.0, 15.0),
        NodeSize::Default => (60.0, 20.0),
        NodeSize::Large => (80.0, 30.0),
    }
}

/// Top-most visible node whose disc (radius + `tol`) contains `p`.
pub fn find_node_at_point(layout: &LayoutState, g: &Genogram, p: Point, tol: f64) -> Option<String> {
    let mut best: Option<(&String, i32, f64)> = None;
    for (id, n) in layout.nodes.iter() {
        if !n.visible {
            continue;
        }
        let r = node_radius(g, id) + tol;
        let d2 = n.position.distance_sq(p);
        if d2 > r * r {
            continue;
        }
        let better = match best {
            None => true,
            Some((bid, bz, bd)) => n.z_index > bz || (n.z_index == bz && (d2 < bd || (d2 == bd && id < bid))),
        };
        if better {
            best = Some((id, n.z_index, d2));
        }
    }
    best.map(|(id, _, _)| id.clone())
}

/// Visible nodes whose bounds intersect the rectangle spanned by `a` and `b`, sorted.
pub fn find_nodes_in_rect(layout: &LayoutState, g: &Genogram, a: Point, b: Point) -> Vec<String> {
    let rect = Rect::from_corners(a, b);
    let mut ids: Vec<String> = layout
        .nodes
        .iter()
        .filter(|(_, n)| n.visible)
        .filter(|(id, n)| {
            let r = node_radius(g, id);
            rect.intersects(&Rect::around(n.position, r, r))
        })
        .map(|(id, _)| id.clone())
        .collect();
    ids.sort();
    ids
}

/// Top-most visible annotation whose box contains `p`.
pub fn find_text_at_point(layout: &LayoutState, g: &Genogram, p: Point) -> Option<String> {
    layout
        .texts
        .iter()
        .filter(|(_, t)| t.visible)
        .filter(|(id, t)| {
            let size = g.annotations.get(id.as_str()).map_or(NodeSize::Default, |a| a.layout.style.size);
            let (hw, hh) = text_half_extents(size);
            Rect::around(t.position, hw, hh).contains(p)
        })
        .max_by(|(ia, ta), (ib, tb)| ta.z_index.cmp(&tb.z_index).then_with(|| ib.cmp(ia)))
        .map(|(id, _)| id.clone())
}

/// Where a connection endpoint sits: a node's position, or the midpoint of a
/// partner line when the ref names a couple.
pub fn anchor_point(layout: &LayoutState, g: &Genogram, id: &str) -> Option<Point> {
    if let Some(n) = layout.nodes.get(id) {
        return Some(n.position);
    }
    let [a, b] = g.connections.get(id)?.entity.partner_subjects()?;
    Some(midpoint(layout.nodes.get(a)?.position, layout.nodes.get(b)?.position))
}

/// Straight segments a renderer would draw for `c`.
pub fn connection_segments(layout: &LayoutState, g: &Genogram, c: &Connection) -> Vec<(Point, Point)> {
    let anchor = |id: &str| anchor_point(layout, g, id);
    let pair = |a: &str, b: &str| match (anchor(a), anchor(b)) {
        (Some(pa), Some(pb)) => vec![(pa, pb)],
        _ => Vec::new(),
    };
    match &c.entity {
        ConnectionEntity::Relation { attribute, .. } => pair(&attribute.subjects[0], &attribute.subjects[1]),
        ConnectionEntity::Partner { attribute, .. } => pair(&attribute.subjects[0], &attribute.subjects[1]),
        ConnectionEntity::Influence { attribute, .. } => pair(&attribute.start_ref, &attribute.end_ref),
        ConnectionEntity::ParentChild { attribute, .. } => {
            let Some(parent) = anchor(&attribute.parent_ref) else {
                return Vec::new();
            };
            attribute.child_refs.iter().filter_map(|k| anchor(k)).map(|pk| (parent, pk)).collect()
        }
        ConnectionEntity::Group { attribute, .. } => {
            let pts: Vec<Point> = attribute.member_ids.iter().filter_map(|m| anchor(m)).collect();
            match pts.len() {
                0 | 1 => Vec::new(),
                2 => vec![(pts[0], pts[1])],
                n => (0..n).map(|i| (pts[i], pts[(i + 1) % n])).collect(),
            }
        }
    }
}

/// Nearest visible connection within `tol` of `p`.
pub fn find_connection_at_point(layout: &LayoutState, g: &Genogram, p: Point, tol: f64) -> Option<String> {
    let tol2 = tol * tol;
    let mut best: Option<(&String, f64)> = None;
    for (id, c) in g.connections.iter() {
        if layout.edges.get(id).is_some_and(|e| !e.visible) {
            continue;
        }
        for (a, b) in connection_segments(layout, g, c) {
            let (d2, _) = seg_distance_sq(p, a, b);
            if d2 <= tol2 && best.map_or(true, |(bid, bd)| d2 < bd || (d2 == bd && id < bid)) {
                best = Some((id, d2));
            }
        }
    }
    best.map(|(id, _)| id.clone())
}
