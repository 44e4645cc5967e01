//! Action records handed to the fake recorder

use crate::label_selector;
use crate::tracker::{GVK, GVR};
use crate::Result;
use kube::api::ListParams;
use kube::core::Selector;
use serde_json::Value;
use std::fmt;

/// How a patch body is to be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchType {
    /// RFC 6902 JSON Patch
    Json,
    /// RFC 7386 JSON Merge Patch
    Merge,
    /// Kubernetes Strategic Merge Patch
    Strategic,
    /// Server-Side Apply
    Apply,
}

/// Verb-specific payload of an [`Action`]
#[derive(Debug, Clone)]
pub enum ActionKind {
    Get { name: String },
    List { kind: GVK, params: ListParams },
    Watch { params: ListParams },
    Create { object: Value },
    Update { object: Value },
    Delete { name: String },
    DeleteCollection { params: ListParams },
    Patch {
        name: String,
        patch_type: PatchType,
        patch: Value,
    },
}

/// One call made through a fake typed client
#[derive(Debug, Clone)]
pub struct Action {
    pub namespace: String,
    pub resource: GVR,
    pub subresource: Option<String>,
    pub kind: ActionKind,
}

impl Action {
    fn new(resource: GVR, namespace: &str, kind: ActionKind) -> Self {
        Self {
            namespace: namespace.to_string(),
            resource,
            subresource: None,
            kind,
        }
    }

    fn with_subresource(mut self, subresource: &str) -> Self {
        if !subresource.is_empty() {
            self.subresource = Some(subresource.to_string());
        }
        self
    }

    pub fn get(resource: GVR, namespace: &str, name: &str) -> Self {
        Self::new(
            resource,
            namespace,
            ActionKind::Get {
                name: name.to_string(),
            },
        )
    }

    pub fn list(resource: GVR, kind: GVK, namespace: &str, params: ListParams) -> Self {
        Self::new(resource, namespace, ActionKind::List { kind, params })
    }

    pub fn watch(resource: GVR, namespace: &str, params: ListParams) -> Self {
        Self::new(resource, namespace, ActionKind::Watch { params })
    }

    pub fn create(resource: GVR, namespace: &str, object: Value) -> Self {
        Self::new(resource, namespace, ActionKind::Create { object })
    }

    pub fn update(resource: GVR, namespace: &str, object: Value) -> Self {
        Self::new(resource, namespace, ActionKind::Update { object })
    }

    pub fn update_subresource(
        resource: GVR,
        subresource: &str,
        namespace: &str,
        object: Value,
    ) -> Self {
        Self::update(resource, namespace, object).with_subresource(subresource)
    }

    pub fn delete(resource: GVR, namespace: &str, name: &str) -> Self {
        Self::new(
            resource,
            namespace,
            ActionKind::Delete {
                name: name.to_string(),
            },
        )
    }

    pub fn delete_collection(resource: GVR, namespace: &str, params: ListParams) -> Self {
        Self::new(resource, namespace, ActionKind::DeleteCollection { params })
    }

    /// Subresources are joined with `/`, so `["status"]` patches the status.
    pub fn patch_subresource(
        resource: GVR,
        namespace: &str,
        name: &str,
        patch_type: PatchType,
        patch: Value,
        subresources: &[&str],
    ) -> Self {
        Self::new(
            resource,
            namespace,
            ActionKind::Patch {
                name: name.to_string(),
                patch_type,
                patch,
            },
        )
        .with_subresource(&subresources.join("/"))
    }

    pub fn verb(&self) -> &'static str {
        match self.kind {
            ActionKind::Get { .. } => "get",
            ActionKind::List { .. } => "list",
            ActionKind::Watch { .. } => "watch",
            ActionKind::Create { .. } => "create",
            ActionKind::Update { .. } => "update",
            ActionKind::Delete { .. } => "delete",
            ActionKind::DeleteCollection { .. } => "deletecollection",
            ActionKind::Patch { .. } => "patch",
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn resource(&self) -> &GVR {
        &self.resource
    }

    pub fn subresource(&self) -> Option<&str> {
        self.subresource.as_deref()
    }

    /// `"*"` matches any verb or resource.
    pub fn matches(&self, verb: &str, resource: &str) -> bool {
        (verb == "*" || verb.eq_ignore_ascii_case(self.verb()))
            && (resource == "*" || resource == self.resource.resource)
    }

    /// Name targeted by the action, for verbs that address a single object.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Get { name } | ActionKind::Delete { name } => Some(name.as_str()),
            ActionKind::Patch { name, .. } => Some(name.as_str()),
            ActionKind::Create { object } | ActionKind::Update { object } => object
                .get("metadata")
                .and_then(|m| m.get("name"))
                .and_then(|n| n.as_str()),
            _ => None,
        }
    }

    pub fn object(&self) -> Option<&Value> {
        match &self.kind {
            ActionKind::Create { object } | ActionKind::Update { object } => Some(object),
            _ => None,
        }
    }

    pub fn list_params(&self) -> Option<&ListParams> {
        match &self.kind {
            ActionKind::List { params, .. }
            | ActionKind::Watch { params }
            | ActionKind::DeleteCollection { params } => Some(params),
            _ => None,
        }
    }

    /// Label selector of list-style actions; everything otherwise.
    pub fn label_selector(&self) -> Result<Selector> {
        match self.list_params() {
            Some(params) => label_selector::from_list_params(params),
            None => Ok(Selector::default()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.resource.resource)?;
        if let Some(sub) = &self.subresource {
            write!(f, "/{}", sub)?;
        }
        if !self.namespace.is_empty() {
            write!(f, " in {}", self.namespace)?;
        }
        if let Some(name) = self.name() {
            write!(f, " ({})", name)?;
        }
        Ok(())
    }
}
