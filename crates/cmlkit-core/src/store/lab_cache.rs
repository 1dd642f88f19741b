// ── Lab cache ──
//
// Lab id -> shared lab handle. Shallow reads are served from here; every
// cacheable fetch or write reconciles into the existing handle so callers
// holding it observe the refresh.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Interface, Lab, LabHandle};

/// Optional in-memory lab cache. When disabled every method is a
/// pass-through.
pub struct LabCache {
    enabled: bool,
    labs: DashMap<String, LabHandle>,
}

impl LabCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            labs: DashMap::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.labs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labs.is_empty()
    }

    /// Cached handle for shallow reads. Deep reads always miss.
    pub fn get_if_cached(&self, id: &str, deep: bool) -> Option<LabHandle> {
        if !self.enabled || deep {
            return None;
        }
        self.labs.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Store a freshly fetched lab.
    ///
    /// A lab seen for the first time is inserted as-is. Otherwise only
    /// `title`, `description`, `nodes` and `state` are copied into the
    /// existing handle; `id`, `owner` and `groups` keep their first value.
    pub fn reconcile(&self, lab: Lab) -> LabHandle {
        self.store(lab, false)
    }

    /// Store a fully assembled lab. Besides the fields [`Self::reconcile`]
    /// copies, the resolved `owner` and `links` replace the cached ones
    /// under the same write lock.
    pub fn reconcile_deep(&self, lab: Lab) -> LabHandle {
        self.store(lab, true)
    }

    fn store(&self, lab: Lab, deep: bool) -> LabHandle {
        if !self.enabled {
            return Arc::new(RwLock::new(lab));
        }

        let existing = self.labs.get(&lab.id).map(|entry| Arc::clone(entry.value()));
        let Some(handle) = existing else {
            debug!(lab = %lab.id, "caching lab");
            let id = lab.id.clone();
            let handle = Arc::new(RwLock::new(lab));
            // A concurrent insert for the same id wins; reconcile into it.
            let winner = Arc::clone(
                self.labs
                    .entry(id)
                    .or_insert_with(|| Arc::clone(&handle))
                    .value(),
            );
            if Arc::ptr_eq(&winner, &handle) {
                return handle;
            }
            let fresh = std::mem::take(&mut *handle.write());
            return Self::update_in_place(winner, fresh, deep);
        };
        Self::update_in_place(handle, lab, deep)
    }

    fn update_in_place(handle: LabHandle, lab: Lab, deep: bool) -> LabHandle {
        debug!(lab = %lab.id, deep, "refreshing cached lab");
        {
            let mut cached = handle.write();
            cached.title = lab.title;
            cached.description = lab.description;
            cached.nodes = lab.nodes;
            cached.state = lab.state;
            if deep {
                cached.owner = lab.owner;
                cached.links = lab.links;
            }
        }
        handle
    }

    /// Drop the entry for `id` unless `prior` already failed, in which
    /// case that error is returned untouched. A missing entry is fine.
    pub fn evict(&self, id: &str, prior: Result<(), CoreError>) -> Result<(), CoreError> {
        prior?;
        if self.enabled && self.labs.remove(id).is_some() {
            debug!(lab = id, "evicted lab from cache");
        }
        Ok(())
    }

    /// Remove a deleted interface from its cached node.
    pub fn remove_interface(
        &self,
        iface: &Interface,
        prior: Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        prior?;
        self.with_node_interfaces(iface, |interfaces| {
            interfaces.retain(|cached| cached.id != iface.id);
        });
        Ok(())
    }

    /// Add (or replace) a created interface on its cached node, keeping
    /// slot order.
    pub fn insert_interface(
        &self,
        iface: &Interface,
        prior: Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        prior?;
        self.with_node_interfaces(iface, |interfaces| {
            match interfaces.iter_mut().find(|cached| cached.id == iface.id) {
                Some(cached) => *cached = iface.clone(),
                None => interfaces.push(iface.clone()),
            }
            interfaces.sort_by_key(|i| i.slot);
        });
        Ok(())
    }

    /// Lab -> node -> interfaces lookup; a missing lab or node is a no-op.
    fn with_node_interfaces(&self, iface: &Interface, f: impl FnOnce(&mut Vec<Interface>)) {
        if !self.enabled {
            return;
        }
        let Some(handle) = self.labs.get(&iface.lab_id).map(|entry| Arc::clone(entry.value()))
        else {
            return;
        };
        let mut lab = handle.write();
        if let Some(node) = lab.nodes.get_mut(&iface.node_id) {
            f(&mut node.interfaces);
        }
    }
}

impl Default for LabCache {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementState, Link, Node, User};
    use pretty_assertions::assert_eq;

    fn lab(title: &str) -> Lab {
        let node = Node {
            id: "node1".into(),
            lab_id: "lab1".into(),
            interfaces: vec![iface("n1i0", 0)],
            ..Node::default()
        };
        Lab {
            id: "lab1".into(),
            title: title.into(),
            owner: User::with_id("u1"),
            nodes: [(node.id.clone(), node)].into(),
            ..Lab::default()
        }
    }

    fn iface(id: &str, slot: u32) -> Interface {
        Interface {
            id: id.into(),
            lab_id: "lab1".into(),
            node_id: "node1".into(),
            slot: Some(slot),
            ..Interface::default()
        }
    }

    fn slots(cache: &LabCache) -> Vec<String> {
        let handle = cache.get_if_cached("lab1", false);
        handle
            .map(|h| {
                h.read().nodes["node1"]
                    .interfaces
                    .iter()
                    .map(|i| i.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn reconcile_preserves_identity_and_first_owner() {
        let cache = LabCache::new(true);
        let first = cache.reconcile(lab("one"));

        let mut second = lab("two");
        second.owner = User::with_id("u2");
        second.state = ElementState::Started;
        second.nodes.clear();
        let again = cache.reconcile(second);

        assert!(Arc::ptr_eq(&first, &again));
        let cached = first.read();
        assert_eq!(cached.title, "two");
        assert_eq!(cached.state, ElementState::Started);
        assert_eq!(cached.owner.id, "u1");
        assert!(cached.nodes.is_empty());
    }

    #[test]
    fn deep_reconcile_replaces_links_and_owner() {
        let cache = LabCache::new(true);
        let shallow = cache.reconcile(lab("one"));

        let mut deep = lab("one");
        deep.owner = User {
            username: "admin".into(),
            ..User::with_id("u1")
        };
        deep.links = vec![Link {
            id: "l0".into(),
            lab_id: "lab1".into(),
            ..Link::default()
        }];
        let again = cache.reconcile_deep(deep);

        assert!(Arc::ptr_eq(&shallow, &again));
        let cached = shallow.read();
        assert_eq!(cached.owner.username, "admin");
        assert_eq!(cached.links.len(), 1);
        drop(cached);

        // A plain write leaves the resolved links alone.
        cache.reconcile(lab("renamed"));
        assert_eq!(shallow.read().links.len(), 1);
    }

    #[test]
    fn shallow_reads_hit_deep_reads_miss() {
        let cache = LabCache::new(true);
        cache.reconcile(lab("one"));
        assert!(cache.get_if_cached("lab1", false).is_some());
        assert!(cache.get_if_cached("lab1", true).is_none());
        assert!(cache.get_if_cached("lab2", false).is_none());
    }

    #[test]
    fn disabled_cache_hands_out_fresh_handles() {
        let cache = LabCache::new(false);
        let a = cache.reconcile(lab("one"));
        let b = cache.reconcile(lab("one"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(cache.is_empty());
        assert!(cache.get_if_cached("lab1", false).is_none());
    }

    #[test]
    fn evict_short_circuits_on_prior_error() {
        let cache = LabCache::new(true);
        cache.reconcile(lab("one"));

        let prior = Err(CoreError::Api {
            status: 500,
            message: "boom".into(),
        });
        let err = cache.evict("lab1", prior).err();
        assert!(matches!(err, Some(CoreError::Api { status: 500, .. })));
        assert_eq!(cache.len(), 1);

        assert!(cache.evict("lab1", Ok(())).is_ok());
        assert!(cache.is_empty());
        assert!(cache.evict("lab1", Ok(())).is_ok());
    }

    #[test]
    fn interface_insert_and_remove() {
        let cache = LabCache::new(true);
        cache.reconcile(lab("one"));

        assert!(cache.insert_interface(&iface("n1i2", 2), Ok(())).is_ok());
        assert!(cache.insert_interface(&iface("n1i1", 1), Ok(())).is_ok());
        assert_eq!(slots(&cache), ["n1i0", "n1i1", "n1i2"]);

        assert!(cache.remove_interface(&iface("n1i1", 1), Ok(())).is_ok());
        assert_eq!(slots(&cache), ["n1i0", "n1i2"]);
    }

    #[test]
    fn interface_ops_on_unknown_chain_are_noops() {
        let cache = LabCache::new(true);
        cache.reconcile(lab("one"));

        let mut stray = iface("x", 0);
        stray.node_id = "node9".into();
        assert!(cache.remove_interface(&stray, Ok(())).is_ok());
        stray.lab_id = "lab9".into();
        assert!(cache.insert_interface(&stray, Ok(())).is_ok());
        assert_eq!(slots(&cache), ["n1i0"]);

        let prior = Err(CoreError::not_found("interface", "x"));
        assert!(cache.remove_interface(&stray, prior).is_err());
    }
}
