use crate::model::Connection;
use std::collections::{HashMap, HashSet};

/// Reverse lookups over the connection map.
///
/// `by_subject` maps every id a connection references (subject ids, and the
/// partner-connection id used as a couple's parent ref) to the connections
/// referencing it. `by_parent_ref` maps a parent-child `parentRef` to the
/// parent-child connections using it, which is how a couple's child links are
/// found before the couple is deleted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionIndex {
    by_subject: HashMap<String, HashSet<String>>,
    by_parent_ref: HashMap<String, HashSet<String>>,
}

impl ConnectionIndex {
    pub fn new() -> Self {
        ConnectionIndex::default()
    }

    pub fn add(&mut self, c: &Connection) {
        for r in c.entity.referenced_ids() {
            self.by_subject.entry(r.to_string()).or_default().insert(c.id.clone());
        }
        if let Some(parent) = c.entity.parent_ref() {
            self.by_parent_ref.entry(parent.to_string()).or_default().insert(c.id.clone());
        }
    }

    pub fn remove(&mut self, c: &Connection) {
        for r in c.entity.referenced_ids() {
            detach(&mut self.by_subject, r, &c.id);
        }
        if let Some(parent) = c.entity.parent_ref() {
            detach(&mut self.by_parent_ref, parent, &c.id);
        }
    }

    pub fn get_by_subject(&self, id: &str) -> Option<&HashSet<String>> {
        self.by_subject.get(id)
    }

    pub fn get_by_parent_ref(&self, id: &str) -> Option<&HashSet<String>> {
        self.by_parent_ref.get(id)
    }

    /// Sorted connection ids touching `id`; empty when none.
    pub fn connections_of(&self, id: &str) -> Vec<String> {
        sorted(self.by_subject.get(id))
    }

    /// Sorted parent-child connection ids whose parent ref is `id`.
    pub fn children_of(&self, id: &str) -> Vec<String> {
        sorted(self.by_parent_ref.get(id))
    }

    pub fn rebuild<'a>(&mut self, connections: impl IntoIterator<Item = &'a Connection>) {
        self.by_subject.clear();
        self.by_parent_ref.clear();
        for c in connections {
            self.add(c);
        }
    }

    /// Distinct connections present in the index.
    pub fn connection_count(&self) -> usize {
        let ids: HashSet<&String> = self.by_subject.values().chain(self.by_parent_ref.values()).flatten().collect();
        ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_subject.is_empty() && self.by_parent_ref.is_empty()
    }
}

fn detach(map: &mut HashMap<String, HashSet<String>>, key: &str, conn: &str) {
    if let Some(set) = map.get_mut(key) {
        set.remove(conn);
        if set.is_empty() {
            map.remove(key);
        }
    }
}

fn sorted(set: Option<&HashSet<String>>) -> Vec<String> {
    let mut ids: Vec<String> = set.map(|s| s.iter().cloned().collect()).unwrap_or_default();
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectionEntity, ParentChildAttribute, PartnerAttribute, PartnerDetail, PartnerStatus, ParentChildStatus};

    fn partner(id: &str, a: &str, b: &str) -> Connection {
        Connection {
            id: id.to_string(),
            entity: ConnectionEntity::Partner {
                attribute: PartnerAttribute {
                    status: PartnerStatus::Married,
                    subjects: [a.to_string(), b.to_string()],
                    detail: PartnerDetail::default(),
                },
                memo: None,
            },
            layout: Default::default(),
        }
    }

    fn child(id: &str, parent: &str, kid: &str) -> Connection {
        Connection {
            id: id.to_string(),
            entity: ConnectionEntity::ParentChild {
                attribute: ParentChildAttribute {
                    status: ParentChildStatus::Biological,
                    parent_ref: parent.to_string(),
                    child_refs: vec![kid.to_string()],
                },
                memo: None,
            },
            layout: Default::default(),
        }
    }

    #[test]
    fn add_and_remove_keep_both_maps_in_sync() {
        let mut idx = ConnectionIndex::new();
        let p = partner("p", "a", "b");
        let c = child("c", "p", "k");
        idx.add(&p);
        idx.add(&c);
        assert_eq!(idx.connections_of("a"), vec!["p".to_string()]);
        assert_eq!(idx.connections_of("k"), vec!["c".to_string()]);
        assert_eq!(idx.children_of("p"), vec!["c".to_string()]);
        idx.remove(&c);
        assert!(idx.get_by_parent_ref("p").is_none());
        assert!(idx.get_by_subject("k").is_none());
        idx.remove(&p);
        assert!(idx.is_empty());
    }

    #[test]
    fn rebuild_matches_incremental() {
        let conns = vec![partner("p", "a", "b"), child("c", "p", "k"), child("d", "a", "j")];
        let mut inc = ConnectionIndex::new();
        for c in &conns {
            inc.add(c);
        }
        let mut rebuilt = ConnectionIndex::new();
        rebuilt.add(&partner("stale", "x", "y"));
        rebuilt.rebuild(conns.iter());
        assert_eq!(inc, rebuilt);
    }
}
