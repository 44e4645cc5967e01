//! Reactors decide how the fake recorder answers an action
//!
//! A reaction returns `Ok(Some(value))` to answer, `Ok(None)` to pass the action to
//! the next reactor in the chain, or `Err(e)` to fail the call with `e`.
//!
//! # Example
//! ```
//! use build_service_client::{ClientsetBuilder, Error};
//!
//! let clientset = ClientsetBuilder::new()
//!     .with_reactor("create", "builders", |action| {
//!         if action.name() == Some("broken") {
//!             return Err(Error::Internal("injected error".into()));
//!         }
//!         Ok(None)
//!     })
//!     .build()
//!     .unwrap();
//! # let _ = clientset;
//! ```

use crate::action::{Action, ActionKind, PatchType};
use crate::client_utils::{extract_gvk, extract_namespace, list_object};
use crate::label_selector;
use crate::tracker::{extract_metadata, ObjectTracker};
use crate::utils::labels_of;
use crate::watch::Watcher;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

pub type ReactionFunc = Arc<dyn Fn(&Action) -> Result<Option<Value>> + Send + Sync>;

pub type WatchReactionFunc = Arc<dyn Fn(&Action) -> Result<Option<Watcher>> + Send + Sync>;

/// A reaction bound to the verb and resource it handles
#[derive(Clone)]
pub struct Reactor {
    verb: String,
    resource: String,
    reaction: ReactionFunc,
}

impl Reactor {
    pub fn new<F>(verb: impl Into<String>, resource: impl Into<String>, reaction: F) -> Self
    where
        F: Fn(&Action) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        Self {
            verb: verb.into(),
            resource: resource.into(),
            reaction: Arc::new(reaction),
        }
    }

    pub fn handles(&self, action: &Action) -> bool {
        action.matches(&self.verb, &self.resource)
    }

    pub fn react(&self, action: &Action) -> Result<Option<Value>> {
        (self.reaction)(action)
    }
}

/// A watch reaction bound to the resource it handles
#[derive(Clone)]
pub struct WatchReactor {
    resource: String,
    reaction: WatchReactionFunc,
}

impl WatchReactor {
    pub fn new<F>(resource: impl Into<String>, reaction: F) -> Self
    where
        F: Fn(&Action) -> Result<Option<Watcher>> + Send + Sync + 'static,
    {
        Self {
            resource: resource.into(),
            reaction: Arc::new(reaction),
        }
    }

    pub fn handles(&self, action: &Action) -> bool {
        action.matches("watch", &self.resource)
    }

    pub fn react(&self, action: &Action) -> Result<Option<Watcher>> {
        (self.reaction)(action)
    }
}

/// Reactor answering every CRUD verb from the object tracker
pub fn object_reactor(tracker: Arc<ObjectTracker>) -> Reactor {
    Reactor::new("*", "*", move |action| object_reaction(&tracker, action))
}

/// Reactor serving watches from the tracker's event fan-out
pub fn watch_reactor(tracker: Arc<ObjectTracker>) -> WatchReactor {
    WatchReactor::new("*", move |action| {
        tracker
            .watch(action.resource(), action.namespace())
            .map(Some)
    })
}

fn object_reaction(tracker: &ObjectTracker, action: &Action) -> Result<Option<Value>> {
    let gvr = action.resource();
    let ns = action.namespace();
    let is_status = action.subresource() == Some("status");

    match &action.kind {
        ActionKind::Get { name } => tracker.get(gvr, ns, name).map(Some),
        ActionKind::List { kind, .. } => {
            // Label filtering is left to the typed client.
            let items = tracker.list(gvr, non_empty(ns))?;
            Ok(Some(list_object(kind, items)))
        }
        ActionKind::Create { object } => {
            check_namespace(action, object)?;
            let gvk = extract_gvk(object)?;
            tracker.create(gvr, &gvk, object.clone(), ns).map(Some)
        }
        ActionKind::Update { object } => {
            check_namespace(action, object)?;
            let gvk = extract_gvk(object)?;
            tracker
                .update(gvr, &gvk, object.clone(), ns, is_status)
                .map(Some)
        }
        ActionKind::Delete { name } => tracker.delete(gvr, ns, name).map(Some),
        ActionKind::DeleteCollection { .. } => {
            let selector = action.label_selector()?;
            let mut deleted = Vec::new();
            for item in tracker.list(gvr, non_empty(ns))? {
                if !label_selector::matches_labels(&selector, Some(&labels_of(&item))) {
                    continue;
                }
                let meta = extract_metadata(&item)?;
                let item_ns = meta.namespace.unwrap_or_default();
                let name = meta.name.unwrap_or_default();
                deleted.push(tracker.delete(gvr, &item_ns, &name)?);
            }
            Ok(Some(Value::Array(deleted)))
        }
        ActionKind::Patch {
            name,
            patch_type,
            patch,
        } => tracker
            .patch(gvr, ns, name, is_status, |existing| {
                apply_patch(existing, *patch_type, patch)
            })
            .map(Some),
        ActionKind::Watch { .. } => Ok(None),
    }
}

fn apply_patch(existing: &Value, patch_type: PatchType, patch: &Value) -> Result<Value> {
    let mut patched = existing.clone();
    match patch_type {
        PatchType::Json => {
            let operations: json_patch::Patch = serde_json::from_value(patch.clone())?;
            json_patch::patch(&mut patched, &operations.0)?;
        }
        // Strategic and apply patches are approximated with merge semantics.
        PatchType::Merge | PatchType::Strategic | PatchType::Apply => {
            json_patch::merge(&mut patched, patch);
        }
    }
    Ok(patched)
}

fn check_namespace(action: &Action, object: &Value) -> Result<()> {
    match extract_namespace(object) {
        Some(obj_ns) if obj_ns != action.namespace() => Err(Error::InvalidRequest(format!(
            "request namespace {} does not match object namespace {}",
            action.namespace(),
            obj_ns
        ))),
        _ => Ok(()),
    }
}

fn non_empty(namespace: &str) -> Option<&str> {
    (!namespace.is_empty()).then_some(namespace)
}
