//! Fake typed clients for the build.pivotal.io/v1alpha1 resources

use crate::action::{Action, PatchType};
use crate::apis::{Builder, Image};
use crate::client_utils::{default_object, gvk_of, gvr_of, list_object};
use crate::label_selector;
use crate::recorder::Fake;
use crate::watch::Watcher;
use crate::{Error, Result};
use kube::api::{DeleteParams, GetParams, ListParams, Patch, PatchParams, PostParams};
use kube::core::ObjectList;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Fake client for the build.pivotal.io/v1alpha1 API group
#[derive(Clone)]
pub struct FakeBuildV1alpha1 {
    fake: Arc<Fake>,
}

impl FakeBuildV1alpha1 {
    pub fn new(fake: Arc<Fake>) -> Self {
        Self { fake }
    }

    pub fn builders(&self, namespace: &str) -> FakeBuilders {
        FakeResourceClient::new(Arc::clone(&self.fake), namespace)
    }

    pub fn images(&self, namespace: &str) -> FakeImages {
        FakeResourceClient::new(Arc::clone(&self.fake), namespace)
    }

    pub fn fake(&self) -> &Arc<Fake> {
        &self.fake
    }
}

pub type FakeBuilders = FakeResourceClient<Builder>;
pub type FakeImages = FakeResourceClient<Image>;

/// Typed client for one resource kind in one namespace
///
/// Each call records exactly one action on the shared [`Fake`] and decodes
/// whatever the recorder answers into `K`. Errors from the recorder are
/// returned unchanged.
pub struct FakeResourceClient<K> {
    fake: Arc<Fake>,
    namespace: String,
    _marker: PhantomData<fn() -> K>,
}

impl<K> Clone for FakeResourceClient<K> {
    fn clone(&self) -> Self {
        Self {
            fake: Arc::clone(&self.fake),
            namespace: self.namespace.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K> FakeResourceClient<K>
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned + Clone + Default,
{
    pub fn new(fake: Arc<Fake>, namespace: &str) -> Self {
        Self {
            fake,
            namespace: namespace.to_string(),
            _marker: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get an object by name
    pub fn get(&self, name: &str, _params: &GetParams) -> Result<K> {
        let obj = self.fake.invokes(
            Action::get(gvr_of::<K>(), &self.namespace, name),
            default_object::<K>()?,
        )?;
        decode(obj)
    }

    /// List objects matching the label selector in `params`
    ///
    /// Items the recorder returns are filtered again by the label selector,
    /// so reactors that ignore selectors still produce a filtered list.
    pub fn list(&self, params: &ListParams) -> Result<ObjectList<K>> {
        let gvk = gvk_of::<K>();
        let default = list_object(&gvk, Vec::new());
        let obj = self.fake.invokes(
            Action::list(gvr_of::<K>(), gvk, &self.namespace, params.clone()),
            default,
        )?;

        let mut list: ObjectList<K> = decode(obj)?;
        let selector = label_selector::from_list_params(params)?;
        list.items
            .retain(|item| label_selector::matches_labels(&selector, item.meta().labels.as_ref()));
        Ok(list)
    }

    /// Watch objects in the namespace
    pub fn watch(&self, params: &ListParams) -> Result<Watcher<K>> {
        let watcher = self.fake.invokes_watch(Action::watch(
            gvr_of::<K>(),
            &self.namespace,
            params.clone(),
        ))?;
        Ok(watcher.into_typed())
    }

    /// Create an object, returning the recorder's representation of it
    pub fn create(&self, obj: &K, _params: &PostParams) -> Result<K> {
        let obj = self.fake.invokes(
            Action::create(gvr_of::<K>(), &self.namespace, serde_json::to_value(obj)?),
            default_object::<K>()?,
        )?;
        decode(obj)
    }

    /// Replace an object, returning the recorder's representation of it
    pub fn update(&self, obj: &K, _params: &PostParams) -> Result<K> {
        let obj = self.fake.invokes(
            Action::update(gvr_of::<K>(), &self.namespace, serde_json::to_value(obj)?),
            default_object::<K>()?,
        )?;
        decode(obj)
    }

    /// Replace the status subresource of an object
    pub fn update_status(&self, obj: &K, _params: &PostParams) -> Result<K> {
        let obj = self.fake.invokes(
            Action::update_subresource(
                gvr_of::<K>(),
                "status",
                &self.namespace,
                serde_json::to_value(obj)?,
            ),
            default_object::<K>()?,
        )?;
        decode(obj)
    }

    /// Delete an object by name
    pub fn delete(&self, name: &str, _params: &DeleteParams) -> Result<()> {
        self.fake.invokes(
            Action::delete(gvr_of::<K>(), &self.namespace, name),
            default_object::<K>()?,
        )?;
        Ok(())
    }

    /// Delete every object matching the label selector in `list_params`
    pub fn delete_collection(
        &self,
        _params: &DeleteParams,
        list_params: &ListParams,
    ) -> Result<()> {
        let default = list_object(&gvk_of::<K>(), Vec::new());
        self.fake.invokes(
            Action::delete_collection(gvr_of::<K>(), &self.namespace, list_params.clone()),
            default,
        )?;
        Ok(())
    }

    /// Patch an object, or one of its subresources, and return the result
    pub fn patch<P: Serialize>(
        &self,
        name: &str,
        patch: &Patch<P>,
        _params: &PatchParams,
        subresources: &[&str],
    ) -> Result<K> {
        let (patch_type, body) = patch_body(patch)?;
        let obj = self.fake.invokes(
            Action::patch_subresource(
                gvr_of::<K>(),
                &self.namespace,
                name,
                patch_type,
                body,
                subresources,
            ),
            default_object::<K>()?,
        )?;
        decode(obj)
    }
}

fn decode<T: DeserializeOwned>(obj: Value) -> Result<T> {
    Ok(serde_json::from_value(obj)?)
}

fn patch_body<P: Serialize>(patch: &Patch<P>) -> Result<(PatchType, Value)> {
    match patch {
        Patch::Apply(p) => Ok((PatchType::Apply, serde_json::to_value(p)?)),
        Patch::Json(p) => Ok((PatchType::Json, serde_json::to_value(p)?)),
        Patch::Merge(p) => Ok((PatchType::Merge, serde_json::to_value(p)?)),
        Patch::Strategic(p) => Ok((PatchType::Strategic, serde_json::to_value(p)?)),
        #[allow(unreachable_patterns)]
        _ => Err(Error::InvalidRequest("unsupported patch type".to_string())),
    }
}
