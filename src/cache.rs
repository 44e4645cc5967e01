//! Read access to the local object cache behind the listers
//!
//! The cache is a `kube::runtime::reflector::Store`. Population belongs to
//! whoever owns the matching [`Writer`]: a reflector in production, or
//! `Writer::apply_watcher_event` in tests.

use crate::label_selector;
use crate::{Error, Result};
use kube::core::Selector;
use kube::Resource;
use std::sync::Arc;

pub use kube::runtime::reflector::{store, store::Writer, ObjectRef, Store};

/// Read access to a keyed object cache
///
/// Keys are `namespace/name` for namespaced objects and `name` otherwise.
/// Enumeration order is defined by the implementation and must be stable.
pub trait Indexer<K>: Send + Sync {
    /// Every cached object
    fn list(&self) -> Vec<Arc<K>>;

    fn list_keys(&self) -> Vec<String>;

    /// Every cached object in `namespace`
    fn by_namespace(&self, namespace: &str) -> Vec<Arc<K>>;

    /// Exact-key lookup; `Ok(None)` when the key is absent
    fn get_by_key(&self, key: &str) -> Result<Option<Arc<K>>>;
}

/// Identity key of an object: `namespace/name`, or `name` when cluster scoped
pub fn object_key<K: Resource>(obj: &K) -> Result<String> {
    let meta = obj.meta();
    let name = meta
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::InvalidRequest("object has no name".to_string()))?;

    Ok(match meta.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    })
}

fn namespace_of<K: Resource>(obj: &K) -> &str {
    obj.meta().namespace.as_deref().unwrap_or_default()
}

/// The reflector store hashes its objects; sort so listers enumerate in key order.
fn in_key_order<K: Resource>(mut objects: Vec<Arc<K>>) -> Vec<Arc<K>> {
    objects.sort_by(|a, b| {
        let a_key = (namespace_of(a.as_ref()), a.meta().name.as_deref());
        let b_key = (namespace_of(b.as_ref()), b.meta().name.as_deref());
        a_key.cmp(&b_key)
    });
    objects
}

impl<K> Indexer<K> for Store<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    fn list(&self) -> Vec<Arc<K>> {
        in_key_order(self.state())
    }

    fn list_keys(&self) -> Vec<String> {
        Indexer::list(self)
            .iter()
            .filter_map(|obj| object_key(obj.as_ref()).ok())
            .collect()
    }

    fn by_namespace(&self, namespace: &str) -> Vec<Arc<K>> {
        let objects = self
            .state()
            .into_iter()
            .filter(|obj| namespace_of(obj.as_ref()) == namespace)
            .collect();
        in_key_order(objects)
    }

    fn get_by_key(&self, key: &str) -> Result<Option<Arc<K>>> {
        let obj_ref = match key.split_once('/') {
            Some((namespace, name)) => ObjectRef::new(name).within(namespace),
            None => ObjectRef::new(key),
        };
        Ok(self.get(&obj_ref))
    }
}

/// Visit every cached object whose labels match `selector`, in indexer order
pub fn list_all<K, F>(indexer: &dyn Indexer<K>, selector: &Selector, mut f: F)
where
    K: Resource,
    F: FnMut(Arc<K>),
{
    let objects = indexer.list();
    if selector.selects_all() {
        objects.into_iter().for_each(f);
        return;
    }

    for obj in objects {
        if label_selector::matches_labels(selector, obj.meta().labels.as_ref()) {
            f(obj);
        }
    }
}

/// Visit every cached object in `namespace` whose labels match `selector`, in indexer order
///
/// An empty namespace visits all namespaces.
pub fn list_all_by_namespace<K, F>(
    indexer: &dyn Indexer<K>,
    namespace: &str,
    selector: &Selector,
    mut f: F,
) where
    K: Resource,
    F: FnMut(Arc<K>),
{
    if namespace.is_empty() {
        return list_all(indexer, selector, f);
    }

    let objects = indexer.by_namespace(namespace);
    if selector.selects_all() {
        objects.into_iter().for_each(f);
        return;
    }

    for obj in objects {
        if label_selector::matches_labels(selector, obj.meta().labels.as_ref()) {
            f(obj);
        }
    }
}
