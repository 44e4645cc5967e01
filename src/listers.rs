//! Read-only listers over the local cache
//!
//! Listers never talk to an API server: they enumerate and look up objects in
//! an [`Indexer`] populated elsewhere.

use crate::apis::{Builder, Image};
use crate::cache::{list_all, list_all_by_namespace, Indexer};
use crate::client_utils::GroupResource;
use crate::{Error, Result};
use kube::core::Selector;
use kube::Resource;
use std::sync::Arc;

pub type BuilderLister = Lister<Builder>;
pub type BuilderNamespaceLister = NamespaceLister<Builder>;
pub type ImageLister = Lister<Image>;
pub type ImageNamespaceLister = NamespaceLister<Image>;

/// Lists objects of one kind across all namespaces
pub struct Lister<K> {
    indexer: Arc<dyn Indexer<K>>,
}

impl<K> Clone for Lister<K> {
    fn clone(&self) -> Self {
        Self {
            indexer: Arc::clone(&self.indexer),
        }
    }
}

impl<K> Lister<K>
where
    K: Resource<DynamicType = ()> + 'static,
{
    pub fn new(indexer: Arc<dyn Indexer<K>>) -> Self {
        Self { indexer }
    }

    /// All cached objects whose labels match `selector`
    pub fn list(&self, selector: &Selector) -> Vec<Arc<K>> {
        let mut ret = Vec::new();
        list_all(self.indexer.as_ref(), selector, |obj| ret.push(obj));
        ret
    }

    /// A lister restricted to `namespace`
    pub fn namespaced(&self, namespace: &str) -> NamespaceLister<K> {
        NamespaceLister {
            indexer: Arc::clone(&self.indexer),
            namespace: namespace.to_string(),
        }
    }
}

impl Lister<Builder> {
    pub fn builders(&self, namespace: &str) -> BuilderNamespaceLister {
        self.namespaced(namespace)
    }
}

impl Lister<Image> {
    pub fn images(&self, namespace: &str) -> ImageNamespaceLister {
        self.namespaced(namespace)
    }
}

/// Lists and gets objects of one kind in one namespace
pub struct NamespaceLister<K> {
    indexer: Arc<dyn Indexer<K>>,
    namespace: String,
}

impl<K> Clone for NamespaceLister<K> {
    fn clone(&self) -> Self {
        Self {
            indexer: Arc::clone(&self.indexer),
            namespace: self.namespace.clone(),
        }
    }
}

impl<K> NamespaceLister<K>
where
    K: Resource<DynamicType = ()> + 'static,
{
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Cached objects in the namespace whose labels match `selector`
    pub fn list(&self, selector: &Selector) -> Vec<Arc<K>> {
        let mut ret = Vec::new();
        list_all_by_namespace(self.indexer.as_ref(), &self.namespace, selector, |obj| {
            ret.push(obj)
        });
        ret
    }

    /// The cached object `namespace/name`
    ///
    /// # Errors
    ///
    /// `Error::NotFound` naming the group resource when the key is absent;
    /// indexer errors are returned unchanged.
    pub fn get(&self, name: &str) -> Result<Arc<K>> {
        let key = format!("{}/{}", self.namespace, name);
        self.indexer
            .get_by_key(&key)?
            .ok_or_else(|| Error::NotFound {
                kind: GroupResource::of::<K>().to_string(),
                name: name.to_string(),
                namespace: self.namespace.clone(),
            })
    }
}
