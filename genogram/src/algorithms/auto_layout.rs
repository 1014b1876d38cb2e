use crate::layout::LayoutState;
use crate::model::{ConnectionEntity, Genogram, Point};
use std::collections::{BTreeMap, HashMap};

pub const GENERATION_SPACING: f64 = 160.0;
pub const SIBLING_SPACING: f64 = 120.0;

/// Generation number per subject: parentless subjects start at 0, children
/// sit one below their lowest parent, partners share a generation.
/// Reference cycles stop after one pass per subject.
pub fn compute_generations(g: &Genogram) -> HashMap<String, i32> {
    let mut gen: HashMap<String, i32> = g.subjects.keys().map(|id| (id.clone(), 0)).collect();
    let mut ids: Vec<&String> = g.connections.keys().collect();
    ids.sort();
    for _ in 0..=g.subjects.len() {
        let mut changed = false;
        for cid in &ids {
            match &g.connections[*cid].entity {
                ConnectionEntity::ParentChild { attribute, .. } => {
                    let parent_gen = g
                        .resolve_parents(&attribute.parent_ref)
                        .into_iter()
                        .filter_map(|p| gen.get(p).copied())
                        .max();
                    let Some(pg) = parent_gen else { continue };
                    for child in &attribute.child_refs {
                        if let Some(cg) = gen.get_mut(child) {
                            if *cg < pg + 1 {
                                *cg = pg + 1;
                                changed = true;
                            }
                        }
                    }
                }
                ConnectionEntity::Partner { attribute, .. } => {
                    let [a, b] = &attribute.subjects;
                    if let (Some(&ga), Some(&gb)) = (gen.get(a), gen.get(b)) {
                        if ga != gb {
                            let m = ga.max(gb);
                            gen.insert(a.clone(), m);
                            gen.insert(b.clone(), m);
                            changed = true;
                        }
                    }
                }
                _ => {}
            }
        }
        if !changed {
            break;
        }
    }
    gen
}

/// Target positions that place subjects in horizontal bands by generation,
/// left to right in creation (z-index) order, starting at `origin`.
pub fn auto_layout_by_generation(g: &Genogram, layout: &LayoutState, origin: Point) -> Vec<(String, Point)> {
    let gens = compute_generations(g);
    let mut bands: BTreeMap<i32, Vec<(i32, &String)>> = BTreeMap::new();
    for (id, gnum) in gens.iter() {
        let z = layout.nodes.get(id).map_or(i32::MAX, |n| n.z_index);
        bands.entry(*gnum).or_default().push((z, id));
    }
    let mut out = Vec::with_capacity(gens.len());
    for (gnum, mut members) in bands {
        members.sort();
        for (i, (_, id)) in members.into_iter().enumerate() {
            let p = Point {
                x: origin.x + i as f64 * SIBLING_SPACING,
                y: origin.y + gnum as f64 * GENERATION_SPACING,
            };
            out.push((id.clone(), p));
        }
    }
    out
}
