use crate::tracker::{GVK, GVR};
use crate::{Error, Result};
use kube::Resource;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// Pluralize a Kind name to its resource plural form.
///
/// Follows the kube-rs rules (kube-core/src/discovery.rs, Apache-2.0):
/// - Words ending in s, x, z, ch, sh get -es suffix
/// - Words ending in consonant+y get -ies suffix
/// - All other words get -s suffix
pub fn pluralize(kind: &str) -> String {
    let word = kind.to_ascii_lowercase();

    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{word}es");
    }

    if let Some(stem) = word.strip_suffix('y') {
        if stem
            .chars()
            .last()
            .is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
        {
            return format!("{stem}ies");
        }
    }

    format!("{word}s")
}

pub fn extract_gvk(value: &Value) -> Result<GVK> {
    let api_version = value
        .get("apiVersion")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::InvalidRequest("Missing apiVersion".to_string()))?;

    let kind = value
        .get("kind")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::InvalidRequest("Missing kind".to_string()))?;

    let (group, version) = match api_version.split_once('/') {
        Some((g, v)) => (g.to_string(), v.to_string()),
        None => ("".to_string(), api_version.to_string()),
    };

    Ok(GVK::new(group, version, kind))
}

pub fn extract_namespace(value: &Value) -> Option<&str> {
    value
        .get("metadata")
        .and_then(|m| m.get("namespace"))
        .and_then(|n| n.as_str())
        .filter(|n| !n.is_empty())
}

pub fn gvk_to_gvr(gvk: &GVK) -> GVR {
    GVR::new(gvk.group.clone(), gvk.version.clone(), pluralize(&gvk.kind))
}

pub fn gvk_of<K: Resource<DynamicType = ()>>() -> GVK {
    GVK::new(K::group(&()), K::version(&()), K::kind(&()))
}

pub fn gvr_of<K: Resource<DynamicType = ()>>() -> GVR {
    GVR::new(K::group(&()), K::version(&()), K::plural(&()))
}

/// A resource qualified by its API group, as used in not-found errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupResource {
    pub group: String,
    pub resource: String,
}

impl GroupResource {
    pub fn of<K: Resource<DynamicType = ()>>() -> Self {
        Self {
            group: K::group(&()).into_owned(),
            resource: K::kind(&()).to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// The zero object handed to the recorder as the fallback reply.
pub fn default_object<K>() -> Result<Value>
where
    K: Resource<DynamicType = ()> + Serialize + Default,
{
    Ok(serde_json::to_value(K::default())?)
}

/// A list object of the given kind wrapping `items`.
pub fn list_object(gvk: &GVK, items: Vec<Value>) -> Value {
    json!({
        "apiVersion": gvk.api_version(),
        "kind": format!("{}List", gvk.kind),
        "metadata": {},
        "items": items,
    })
}
