use crate::client_utils::extract_gvk;
use crate::utils::{
    default_metadata, is_marked_for_removal, next_resource_version, same_deletion_timestamp,
};
use crate::watch::{self, WatchEvent, WatchSender, Watcher};
use crate::{Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, RwLock};
use tracing::{debug, trace};

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GVR {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GVR {
    /// `resource.group`, or just `resource` for the core group
    pub fn qualified(&self) -> String {
        if self.group.is_empty() {
            self.resource.clone()
        } else {
            format!("{}.{}", self.resource, self.group)
        }
    }

    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GVK {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GVK {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

// Ordered maps keep list results stable across calls.
type ObjectsByName = BTreeMap<String, Value>;
type ObjectsByNamespace = BTreeMap<String, ObjectsByName>;
type ObjectStorage = HashMap<GVR, ObjectsByNamespace>;

type WatchersByNamespace = HashMap<String, Vec<WatchSender>>;

/// In-memory object store backing the fake recorder's default reactions
///
/// Objects are kept as JSON, keyed by resource, namespace and name. Every
/// write is fanned out to watchers of the object's namespace and to watchers
/// of all namespaces (registered with an empty namespace).
pub struct ObjectTracker {
    objects: RwLock<ObjectStorage>,
    with_status_subresource: RwLock<HashSet<GVK>>,
    watchers: Mutex<HashMap<GVR, WatchersByNamespace>>,
}

impl ObjectTracker {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            with_status_subresource: RwLock::new(HashSet::new()),
            watchers: Mutex::new(HashMap::new()),
        }
    }

    pub fn add_status_subresource(&self, gvk: GVK) {
        let mut subresources = self.with_status_subresource.write().unwrap();
        subresources.insert(gvk);
    }

    pub fn has_status_subresource(&self, gvk: &GVK) -> bool {
        let subresources = self.with_status_subresource.read().unwrap();
        subresources.contains(gvk)
    }

    /// Seed an object, replacing any object with the same name.
    pub fn add(&self, gvr: &GVR, object: Value, namespace: &str) -> Result<Value> {
        trace!("Adding object: {:?} in namespace: {}", gvr, namespace);

        let mut object = object;
        let mut meta = extract_metadata(&object)?;
        let name = required_name(&meta)?;

        if is_marked_for_removal(&meta) {
            return Err(Error::InvalidRequest(format!(
                "refusing to add object {} with metadata.deletionTimestamp but no finalizers",
                name
            )));
        }

        if meta.resource_version.as_deref().is_none_or(str::is_empty) {
            meta.resource_version = Some(next_resource_version(None)?);
        }
        default_metadata(&mut meta, namespace);
        object["metadata"] = serde_json::to_value(&meta)?;

        let mut objects = self.objects.write().unwrap();
        let event = match insert_stored(&mut objects, gvr, namespace, &name, object.clone()) {
            Some(_) => WatchEvent::Modified(object.clone()),
            None => WatchEvent::Added(object.clone()),
        };
        self.notify(gvr, namespace, event);

        debug!("Added object: {}/{}", namespace, name);
        Ok(object)
    }

    pub fn create(&self, gvr: &GVR, gvk: &GVK, object: Value, namespace: &str) -> Result<Value> {
        trace!("Creating object: {:?} in namespace: {}", gvr, namespace);

        let mut object = object;
        let mut meta = extract_metadata(&object)?;
        let name = required_name(&meta)?;

        if meta.resource_version.as_deref().is_some_and(|rv| !rv.is_empty()) {
            return Err(Error::InvalidRequest(
                "resourceVersion can not be set for Create requests".to_string(),
            ));
        }

        meta.resource_version = Some(next_resource_version(None)?);
        meta.deletion_timestamp = None;
        default_metadata(&mut meta, namespace);
        object["metadata"] = serde_json::to_value(&meta)?;
        if object.get("apiVersion").is_none() {
            object["apiVersion"] = Value::String(gvk.api_version());
        }
        if object.get("kind").is_none() {
            object["kind"] = Value::String(gvk.kind.clone());
        }

        let mut objects = self.objects.write().unwrap();
        if stored(&objects, gvr, namespace, &name).is_ok() {
            return Err(Error::AlreadyExists {
                kind: gvr.qualified(),
                name,
                namespace: namespace.to_string(),
            });
        }
        insert_stored(&mut objects, gvr, namespace, &name, object.clone());
        self.notify(gvr, namespace, WatchEvent::Added(object.clone()));

        debug!("Created object: {}/{}", namespace, name);
        Ok(object)
    }

    pub fn get(&self, gvr: &GVR, namespace: &str, name: &str) -> Result<Value> {
        trace!("Getting object: {:?} {}/{}", gvr, namespace, name);

        let objects = self.objects.read().unwrap();
        stored(&objects, gvr, namespace, name)
    }

    /// Replace a stored object.
    ///
    /// A stale resourceVersion is a conflict. When the kind has a status
    /// subresource, plain updates keep the stored status and status updates
    /// keep the stored spec.
    pub fn update(
        &self,
        gvr: &GVR,
        gvk: &GVK,
        object: Value,
        namespace: &str,
        is_status: bool,
    ) -> Result<Value> {
        trace!("Updating object: {:?} in namespace: {}", gvr, namespace);

        let name = required_name(&extract_metadata(&object)?)?;

        // The resourceVersion check and the write share one guard.
        let mut objects = self.objects.write().unwrap();
        let existing = stored(&objects, gvr, namespace, &name)?;
        self.replace_locked(
            &mut objects,
            gvr,
            gvk,
            namespace,
            &name,
            existing,
            object,
            is_status,
        )
    }

    /// Compute a new version of a stored object from the current one and store it.
    ///
    /// `apply` sees the object as stored at the time of the write, so
    /// concurrent patches never overwrite each other.
    pub fn patch<F>(
        &self,
        gvr: &GVR,
        namespace: &str,
        name: &str,
        is_status: bool,
        apply: F,
    ) -> Result<Value>
    where
        F: FnOnce(&Value) -> Result<Value>,
    {
        trace!("Patching object: {:?} {}/{}", gvr, namespace, name);

        let mut objects = self.objects.write().unwrap();
        let existing = stored(&objects, gvr, namespace, name)?;
        let gvk = extract_gvk(&existing)?;
        let patched = apply(&existing)?;
        self.replace_locked(
            &mut objects,
            gvr,
            &gvk,
            namespace,
            name,
            existing,
            patched,
            is_status,
        )
    }

    pub fn delete(&self, gvr: &GVR, namespace: &str, name: &str) -> Result<Value> {
        trace!("Deleting object: {:?} {}/{}", gvr, namespace, name);

        let mut objects = self.objects.write().unwrap();
        let removed = remove_stored(&mut objects, gvr, namespace, name)?;
        self.notify(gvr, namespace, WatchEvent::Deleted(removed.clone()));

        debug!("Deleted object: {}/{}", namespace, name);
        Ok(removed)
    }

    /// Objects of a resource in one namespace, or in every namespace when `None`.
    ///
    /// A resource with no stored objects lists as empty.
    pub fn list(&self, gvr: &GVR, namespace: Option<&str>) -> Result<Vec<Value>> {
        trace!("Listing objects: {:?} in namespace: {:?}", gvr, namespace);

        let objects = self.objects.read().unwrap();
        let Some(by_ns) = objects.get(gvr) else {
            return Ok(Vec::new());
        };

        let result = match namespace {
            Some(ns) => by_ns
                .get(ns)
                .map(|by_name| by_name.values().cloned().collect())
                .unwrap_or_default(),
            None => by_ns
                .values()
                .flat_map(|by_name| by_name.values().cloned())
                .collect(),
        };

        Ok(result)
    }

    /// Watch a resource in one namespace; an empty namespace watches all of them.
    pub fn watch(&self, gvr: &GVR, namespace: &str) -> Result<Watcher> {
        trace!("Watching objects: {:?} in namespace: {}", gvr, namespace);

        let (tx, watcher) = watch::channel();
        let mut watchers = self.watchers.lock().unwrap();
        watchers
            .entry(gvr.clone())
            .or_default()
            .entry(namespace.to_string())
            .or_default()
            .push(tx);
        Ok(watcher)
    }

    /// Shared tail of `update` and `patch`; the caller holds the objects guard.
    #[allow(clippy::too_many_arguments)]
    fn replace_locked(
        &self,
        objects: &mut ObjectStorage,
        gvr: &GVR,
        gvk: &GVK,
        namespace: &str,
        name: &str,
        existing: Value,
        object: Value,
        is_status: bool,
    ) -> Result<Value> {
        let mut object = object;
        let meta = extract_metadata(&object)?;
        let existing_meta = extract_metadata(&existing)?;

        if let (Some(provided), Some(current)) =
            (&meta.resource_version, &existing_meta.resource_version)
        {
            if !provided.is_empty() && provided != current {
                return Err(Error::Conflict(format!(
                    "Resource version mismatch: expected {}, got {}",
                    current, provided
                )));
            }
        }

        if self.has_status_subresource(gvk) {
            if is_status {
                if let Some(spec) = existing.get("spec") {
                    object["spec"] = spec.clone();
                }
            } else if let Some(status) = existing.get("status") {
                object["status"] = status.clone();
            }
        }

        let mut new_meta = meta;
        new_meta.resource_version = Some(next_resource_version(
            existing_meta.resource_version.as_deref(),
        )?);
        new_meta.uid = existing_meta.uid;
        new_meta.creation_timestamp = existing_meta.creation_timestamp;
        default_metadata(&mut new_meta, namespace);

        if !same_deletion_timestamp(
            &new_meta.deletion_timestamp,
            &existing_meta.deletion_timestamp,
        ) {
            return Err(Error::InvalidRequest(
                "metadata.deletionTimestamp field is immutable".to_string(),
            ));
        }

        object["metadata"] = serde_json::to_value(&new_meta)?;

        if is_marked_for_removal(&new_meta) {
            let removed = remove_stored(objects, gvr, namespace, name)?;
            self.notify(gvr, namespace, WatchEvent::Deleted(removed.clone()));
            debug!("Deleted object marked for removal: {}/{}", namespace, name);
            return Ok(removed);
        }

        insert_stored(objects, gvr, namespace, name, object.clone());
        self.notify(gvr, namespace, WatchEvent::Modified(object.clone()));

        debug!("Updated object: {}/{}", namespace, name);
        Ok(object)
    }

    /// Fan an event out to watchers. Writers call this while holding the
    /// objects guard, so events arrive in resourceVersion order.
    fn notify(&self, gvr: &GVR, namespace: &str, event: WatchEvent<Value>) {
        let mut watchers = self.watchers.lock().unwrap();
        let Some(by_ns) = watchers.get_mut(gvr) else {
            return;
        };

        let mut targets = vec![namespace];
        if !namespace.is_empty() {
            targets.push("");
        }

        for ns in targets {
            if let Some(senders) = by_ns.get_mut(ns) {
                // Watchers that were dropped or stopped are pruned here.
                senders.retain(|tx| tx.send(event.clone()).is_ok());
            }
        }
    }
}

impl Default for ObjectTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn stored(objects: &ObjectStorage, gvr: &GVR, namespace: &str, name: &str) -> Result<Value> {
    objects
        .get(gvr)
        .and_then(|by_ns| by_ns.get(namespace))
        .and_then(|by_name| by_name.get(name))
        .cloned()
        .ok_or_else(|| not_found(gvr, namespace, name))
}

fn insert_stored(
    objects: &mut ObjectStorage,
    gvr: &GVR,
    namespace: &str,
    name: &str,
    object: Value,
) -> Option<Value> {
    objects
        .entry(gvr.clone())
        .or_default()
        .entry(namespace.to_string())
        .or_default()
        .insert(name.to_string(), object)
}

fn remove_stored(
    objects: &mut ObjectStorage,
    gvr: &GVR,
    namespace: &str,
    name: &str,
) -> Result<Value> {
    objects
        .get_mut(gvr)
        .and_then(|by_ns| by_ns.get_mut(namespace))
        .and_then(|by_name| by_name.remove(name))
        .ok_or_else(|| not_found(gvr, namespace, name))
}

fn not_found(gvr: &GVR, namespace: &str, name: &str) -> Error {
    Error::NotFound {
        kind: gvr.qualified(),
        name: name.to_string(),
        namespace: namespace.to_string(),
    }
}

fn required_name(meta: &ObjectMeta) -> Result<String> {
    meta.name
        .clone()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::InvalidRequest("Object name is required".to_string()))
}

pub(crate) fn extract_metadata(object: &Value) -> Result<ObjectMeta> {
    let meta_value = object
        .get("metadata")
        .ok_or_else(|| Error::MetadataError("Object missing metadata field".to_string()))?;

    serde_json::from_value(meta_value.clone())
        .map_err(|e| Error::MetadataError(format!("Failed to parse metadata: {}", e)))
}
